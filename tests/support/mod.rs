//! In-memory repository fakes backing the application-layer tests.
//!
//! The fakes keep insertion order, hand out strictly increasing creation
//! timestamps, and honor the same nullify/cascade rules the schema declares,
//! so feed ordering and orphaning behave like the real store.

// Each test binary uses its own subset of these helpers.
#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use time::{Duration, OffsetDateTime, macros::datetime};
use uuid::Uuid;

use brusio::application::content::ContentService;
use brusio::application::feed::FeedService;
use brusio::application::repos::{
    CommentsRepo, CreateCommentParams, CreateGroupParams, CreatePostParams, FollowsRepo,
    GroupsRepo, PostFilter, PostsRepo, RepoError, UpdatePostParams, UsersRepo,
};
use brusio::domain::entities::{
    CommentRecord, FollowRecord, GroupRecord, PostRecord, UserRecord,
};

const CLOCK_BASE: OffsetDateTime = datetime!(2025-06-01 12:00 UTC);

#[derive(Default)]
struct Inner {
    users: Vec<UserRecord>,
    groups: Vec<GroupRecord>,
    posts: Vec<PostRecord>,
    comments: Vec<CommentRecord>,
    follows: Vec<FollowRecord>,
    ticks: i64,
}

impl Inner {
    fn next_timestamp(&mut self) -> OffsetDateTime {
        self.ticks += 1;
        CLOCK_BASE + Duration::seconds(self.ticks)
    }
}

/// One struct implementing every repository trait, like the Postgres adapter.
#[derive(Clone, Default)]
pub struct MemoryRepos {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryRepos {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_user(&self, username: &str) -> UserRecord {
        let mut inner = self.inner.lock().unwrap();
        let created_at = inner.next_timestamp();
        let user = UserRecord {
            id: Uuid::new_v4(),
            username: username.to_string(),
            display_name: String::new(),
            created_at,
        };
        inner.users.push(user.clone());
        user
    }

    pub fn add_group(&self, slug: &str, title: &str) -> GroupRecord {
        let mut inner = self.inner.lock().unwrap();
        let created_at = inner.next_timestamp();
        let group = GroupRecord {
            id: Uuid::new_v4(),
            slug: slug.to_string(),
            title: title.to_string(),
            description: String::new(),
            created_at,
        };
        inner.groups.push(group.clone());
        group
    }

    pub fn follow_edge_count(&self) -> usize {
        self.inner.lock().unwrap().follows.len()
    }

    pub fn post_count(&self) -> usize {
        self.inner.lock().unwrap().posts.len()
    }

    pub fn comment_count(&self) -> usize {
        self.inner.lock().unwrap().comments.len()
    }

    fn matches(post: &PostRecord, filter: PostFilter, follows: &[FollowRecord]) -> bool {
        if let Some(group_id) = filter.group_id {
            if post.group_id != Some(group_id) {
                return false;
            }
        }
        if let Some(author_id) = filter.author_id {
            if post.author_id != author_id {
                return false;
            }
        }
        if let Some(user_id) = filter.followed_by {
            let followed = follows
                .iter()
                .any(|edge| edge.user_id == user_id && edge.author_id == post.author_id);
            if !followed {
                return false;
            }
        }
        true
    }

    fn filtered_newest_first(&self, filter: PostFilter) -> Vec<PostRecord> {
        let inner = self.inner.lock().unwrap();
        inner
            .posts
            .iter()
            .rev()
            .filter(|post| Self::matches(post, filter, &inner.follows))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl UsersRepo for MemoryRepos {
    async fn find_user_by_username(
        &self,
        username: &str,
    ) -> Result<Option<UserRecord>, RepoError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .users
            .iter()
            .find(|user| user.username == username)
            .cloned())
    }
}

#[async_trait]
impl GroupsRepo for MemoryRepos {
    async fn create_group(&self, params: CreateGroupParams) -> Result<GroupRecord, RepoError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.groups.iter().any(|group| group.slug == params.slug) {
            return Err(RepoError::Duplicate {
                constraint: "groups_slug_key".to_string(),
            });
        }
        let created_at = inner.next_timestamp();
        let group = GroupRecord {
            id: Uuid::new_v4(),
            slug: params.slug,
            title: params.title,
            description: params.description,
            created_at,
        };
        inner.groups.push(group.clone());
        Ok(group)
    }

    async fn find_group_by_id(&self, id: Uuid) -> Result<Option<GroupRecord>, RepoError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.groups.iter().find(|group| group.id == id).cloned())
    }

    async fn find_group_by_slug(&self, slug: &str) -> Result<Option<GroupRecord>, RepoError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.groups.iter().find(|group| group.slug == slug).cloned())
    }

    async fn list_groups(&self) -> Result<Vec<GroupRecord>, RepoError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.groups.clone())
    }
}

#[async_trait]
impl PostsRepo for MemoryRepos {
    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError> {
        let mut inner = self.inner.lock().unwrap();
        let created_at = inner.next_timestamp();
        let post = PostRecord {
            id: Uuid::new_v4(),
            text: params.text,
            author_id: params.author_id,
            group_id: params.group_id,
            image: params.image,
            created_at,
        };
        inner.posts.push(post.clone());
        Ok(post)
    }

    async fn update_post(&self, params: UpdatePostParams) -> Result<PostRecord, RepoError> {
        let mut inner = self.inner.lock().unwrap();
        let post = inner
            .posts
            .iter_mut()
            .find(|post| post.id == params.id)
            .ok_or(RepoError::NotFound)?;
        post.text = params.text;
        post.group_id = params.group_id;
        post.image = params.image;
        Ok(post.clone())
    }

    async fn delete_post(&self, id: Uuid) -> Result<(), RepoError> {
        let mut inner = self.inner.lock().unwrap();
        let before = inner.posts.len();
        inner.posts.retain(|post| post.id != id);
        if inner.posts.len() == before {
            return Err(RepoError::NotFound);
        }
        for comment in &mut inner.comments {
            if comment.post_id == Some(id) {
                comment.post_id = None;
            }
        }
        Ok(())
    }

    async fn find_post_by_id(&self, id: Uuid) -> Result<Option<PostRecord>, RepoError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.posts.iter().find(|post| post.id == id).cloned())
    }

    async fn list_posts(
        &self,
        filter: PostFilter,
        limit: u32,
        offset: u64,
    ) -> Result<Vec<PostRecord>, RepoError> {
        let all = self.filtered_newest_first(filter);
        Ok(all
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    async fn count_posts(&self, filter: PostFilter) -> Result<u64, RepoError> {
        Ok(self.filtered_newest_first(filter).len() as u64)
    }
}

#[async_trait]
impl CommentsRepo for MemoryRepos {
    async fn create_comment(
        &self,
        params: CreateCommentParams,
    ) -> Result<CommentRecord, RepoError> {
        let mut inner = self.inner.lock().unwrap();
        let created_at = inner.next_timestamp();
        let comment = CommentRecord {
            id: Uuid::new_v4(),
            text: params.text,
            author_id: params.author_id,
            post_id: Some(params.post_id),
            created_at,
        };
        inner.comments.push(comment.clone());
        Ok(comment)
    }

    async fn list_comments_for_post(
        &self,
        post_id: Uuid,
    ) -> Result<Vec<CommentRecord>, RepoError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .comments
            .iter()
            .rev()
            .filter(|comment| comment.post_id == Some(post_id))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl FollowsRepo for MemoryRepos {
    async fn upsert_follow(
        &self,
        user_id: Uuid,
        author_id: Uuid,
    ) -> Result<FollowRecord, RepoError> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(existing) = inner
            .follows
            .iter()
            .find(|edge| edge.user_id == user_id && edge.author_id == author_id)
        {
            return Ok(existing.clone());
        }
        let created_at = inner.next_timestamp();
        let edge = FollowRecord {
            id: Uuid::new_v4(),
            user_id,
            author_id,
            created_at,
        };
        inner.follows.push(edge.clone());
        Ok(edge)
    }

    async fn delete_follow(&self, user_id: Uuid, author_id: Uuid) -> Result<bool, RepoError> {
        let mut inner = self.inner.lock().unwrap();
        let before = inner.follows.len();
        inner
            .follows
            .retain(|edge| !(edge.user_id == user_id && edge.author_id == author_id));
        Ok(inner.follows.len() < before)
    }

    async fn follow_exists(&self, user_id: Uuid, author_id: Uuid) -> Result<bool, RepoError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .follows
            .iter()
            .any(|edge| edge.user_id == user_id && edge.author_id == author_id))
    }
}

pub const TEST_PAGE_SIZE: u32 = 10;

/// Wire both services over one shared fake store.
pub fn services(repos: &MemoryRepos) -> (Arc<FeedService>, Arc<ContentService>) {
    let posts: Arc<dyn PostsRepo> = Arc::new(repos.clone());
    let groups: Arc<dyn GroupsRepo> = Arc::new(repos.clone());
    let users: Arc<dyn UsersRepo> = Arc::new(repos.clone());
    let comments: Arc<dyn CommentsRepo> = Arc::new(repos.clone());
    let follows: Arc<dyn FollowsRepo> = Arc::new(repos.clone());

    let feed = Arc::new(FeedService::new(
        posts.clone(),
        groups.clone(),
        users.clone(),
        comments.clone(),
        follows.clone(),
        TEST_PAGE_SIZE,
    ));
    let content = Arc::new(ContentService::new(posts, groups, users, comments, follows));
    (feed, content)
}
