//! Feed composition: ordered, paginated views over the post store.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::application::pagination::{Page, resolve_page};
use crate::application::policy::Actor;
use crate::application::repos::{
    CommentsRepo, FollowsRepo, GroupsRepo, PostFilter, PostsRepo, RepoError, UsersRepo,
};
use crate::domain::entities::{CommentRecord, GroupRecord, PostRecord, UserRecord};

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("unknown group slug")]
    UnknownGroup,
    #[error("unknown username")]
    UnknownAuthor,
    #[error("unknown post")]
    UnknownPost,
    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// A group feed page together with the group's descriptive fields.
#[derive(Debug, Clone, Serialize)]
pub struct GroupFeed {
    pub group: GroupRecord,
    pub page: Page<PostRecord>,
}

/// An author feed page with profile context for rendering.
#[derive(Debug, Clone, Serialize)]
pub struct AuthorFeed {
    pub author: UserRecord,
    pub page: Page<PostRecord>,
    pub post_count: u64,
    /// Whether the requesting actor already follows this author. Always
    /// false for anonymous readers.
    pub following: bool,
}

/// A single post with the context its detail view needs.
#[derive(Debug, Clone, Serialize)]
pub struct PostDetail {
    pub post: PostRecord,
    pub author_post_count: u64,
    /// Newest first.
    pub comments: Vec<CommentRecord>,
}

#[derive(Clone)]
pub struct FeedService {
    posts: Arc<dyn PostsRepo>,
    groups: Arc<dyn GroupsRepo>,
    users: Arc<dyn UsersRepo>,
    comments: Arc<dyn CommentsRepo>,
    follows: Arc<dyn FollowsRepo>,
    page_size: u32,
}

impl FeedService {
    pub fn new(
        posts: Arc<dyn PostsRepo>,
        groups: Arc<dyn GroupsRepo>,
        users: Arc<dyn UsersRepo>,
        comments: Arc<dyn CommentsRepo>,
        follows: Arc<dyn FollowsRepo>,
        page_size: u32,
    ) -> Self {
        Self {
            posts,
            groups,
            users,
            comments,
            follows,
            page_size,
        }
    }

    async fn page_for(
        &self,
        filter: PostFilter,
        requested_page: u32,
    ) -> Result<Page<PostRecord>, FeedError> {
        let total = self.posts.count_posts(filter).await?;
        let window = resolve_page(total, self.page_size, requested_page);
        let items = self
            .posts
            .list_posts(filter, window.limit, window.offset)
            .await?;
        Ok(Page::new(items, window))
    }

    /// Global feed: every post, newest first.
    pub async fn global_page(&self, requested_page: u32) -> Result<Page<PostRecord>, FeedError> {
        self.page_for(PostFilter::default(), requested_page).await
    }

    /// Posts of one community, newest first.
    pub async fn group_page(
        &self,
        slug: &str,
        requested_page: u32,
    ) -> Result<GroupFeed, FeedError> {
        let group = self
            .groups
            .find_group_by_slug(slug)
            .await?
            .ok_or(FeedError::UnknownGroup)?;
        let page = self
            .page_for(PostFilter::by_group(group.id), requested_page)
            .await?;
        Ok(GroupFeed { group, page })
    }

    /// One author's posts plus the profile context the view needs.
    pub async fn author_page(
        &self,
        username: &str,
        actor: Option<&Actor>,
        requested_page: u32,
    ) -> Result<AuthorFeed, FeedError> {
        let author = self
            .users
            .find_user_by_username(username)
            .await?
            .ok_or(FeedError::UnknownAuthor)?;

        let filter = PostFilter::by_author(author.id);
        let post_count = self.posts.count_posts(filter).await?;
        let window = resolve_page(post_count, self.page_size, requested_page);
        let items = self
            .posts
            .list_posts(filter, window.limit, window.offset)
            .await?;

        let following = match actor {
            Some(actor) => self.follows.follow_exists(actor.id, author.id).await?,
            None => false,
        };

        Ok(AuthorFeed {
            author,
            page: Page::new(items, window),
            post_count,
            following,
        })
    }

    /// Posts by every author the actor follows, newest first.
    pub async fn following_page(
        &self,
        actor: &Actor,
        requested_page: u32,
    ) -> Result<Page<PostRecord>, FeedError> {
        self.page_for(PostFilter::followed_by(actor.id), requested_page)
            .await
    }

    pub async fn post_detail(&self, post_id: Uuid) -> Result<PostDetail, FeedError> {
        let post = self
            .posts
            .find_post_by_id(post_id)
            .await?
            .ok_or(FeedError::UnknownPost)?;
        let author_post_count = self
            .posts
            .count_posts(PostFilter::by_author(post.author_id))
            .await?;
        let comments = self.comments.list_comments_for_post(post.id).await?;

        Ok(PostDetail {
            post,
            author_post_count,
            comments,
        })
    }
}
