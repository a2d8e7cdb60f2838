//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::entities::{
    CommentRecord, FollowRecord, GroupRecord, PostRecord, UserRecord,
};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("integrity error: {message}")]
    Integrity { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

/// Row filter shared by every feed variant.
///
/// At most one of the fields is set per query; an empty filter selects the
/// global feed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PostFilter {
    pub group_id: Option<Uuid>,
    pub author_id: Option<Uuid>,
    /// Restrict to posts whose author is followed by this user.
    pub followed_by: Option<Uuid>,
}

impl PostFilter {
    pub fn by_group(group_id: Uuid) -> Self {
        Self {
            group_id: Some(group_id),
            ..Self::default()
        }
    }

    pub fn by_author(author_id: Uuid) -> Self {
        Self {
            author_id: Some(author_id),
            ..Self::default()
        }
    }

    pub fn followed_by(user_id: Uuid) -> Self {
        Self {
            followed_by: Some(user_id),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone)]
pub struct CreatePostParams {
    pub text: String,
    pub author_id: Uuid,
    pub group_id: Option<Uuid>,
    pub image: Option<String>,
}

#[derive(Debug, Clone)]
pub struct UpdatePostParams {
    pub id: Uuid,
    pub text: String,
    pub group_id: Option<Uuid>,
    pub image: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CreateCommentParams {
    pub text: String,
    pub author_id: Uuid,
    pub post_id: Uuid,
}

#[derive(Debug, Clone)]
pub struct CreateGroupParams {
    pub slug: String,
    pub title: String,
    pub description: String,
}

#[async_trait]
pub trait UsersRepo: Send + Sync {
    async fn find_user_by_username(&self, username: &str)
    -> Result<Option<UserRecord>, RepoError>;
}

#[async_trait]
pub trait GroupsRepo: Send + Sync {
    async fn create_group(&self, params: CreateGroupParams) -> Result<GroupRecord, RepoError>;
    async fn find_group_by_id(&self, id: Uuid) -> Result<Option<GroupRecord>, RepoError>;
    async fn find_group_by_slug(&self, slug: &str) -> Result<Option<GroupRecord>, RepoError>;
    async fn list_groups(&self) -> Result<Vec<GroupRecord>, RepoError>;
}

#[async_trait]
pub trait PostsRepo: Send + Sync {
    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError>;
    /// Updates text, group, and image; author and creation time are immutable.
    async fn update_post(&self, params: UpdatePostParams) -> Result<PostRecord, RepoError>;
    async fn delete_post(&self, id: Uuid) -> Result<(), RepoError>;
    async fn find_post_by_id(&self, id: Uuid) -> Result<Option<PostRecord>, RepoError>;
    /// Newest-first window of posts matching `filter`.
    async fn list_posts(
        &self,
        filter: PostFilter,
        limit: u32,
        offset: u64,
    ) -> Result<Vec<PostRecord>, RepoError>;
    async fn count_posts(&self, filter: PostFilter) -> Result<u64, RepoError>;
}

#[async_trait]
pub trait CommentsRepo: Send + Sync {
    async fn create_comment(&self, params: CreateCommentParams)
    -> Result<CommentRecord, RepoError>;
    /// All comments attached to a post, newest first.
    async fn list_comments_for_post(&self, post_id: Uuid)
    -> Result<Vec<CommentRecord>, RepoError>;
}

#[async_trait]
pub trait FollowsRepo: Send + Sync {
    /// Idempotent get-or-create of the (user, author) edge.
    async fn upsert_follow(&self, user_id: Uuid, author_id: Uuid)
    -> Result<FollowRecord, RepoError>;
    /// Returns whether an edge was actually removed.
    async fn delete_follow(&self, user_id: Uuid, author_id: Uuid) -> Result<bool, RepoError>;
    async fn follow_exists(&self, user_id: Uuid, author_id: Uuid) -> Result<bool, RepoError>;
}
