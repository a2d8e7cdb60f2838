//! Content mutations: posts, comments, and follow edges.
//!
//! All writes funnel through here so the access policy is applied before any
//! repository call. Permission failures on edits are soft by design: the
//! caller receives a redirect target instead of an error.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use crate::application::policy::{self, Actor, FollowDecision};
use crate::application::repos::{
    CommentsRepo, CreateCommentParams, CreatePostParams, FollowsRepo, GroupsRepo, PostsRepo,
    RepoError, UpdatePostParams, UsersRepo,
};
use crate::domain::entities::{CommentRecord, PostRecord};

/// One field-level validation message, propagated back to the submission
/// view without any write having occurred.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: &'static str,
}

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("validation failed")]
    Validation(Vec<FieldError>),
    #[error("unknown post")]
    UnknownPost,
    #[error("unknown username")]
    UnknownAuthor,
    #[error("unknown group")]
    UnknownGroup,
    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// Submitted post form data: body text, optional community, optional image
/// reference produced by the external upload layer.
#[derive(Debug, Clone, Deserialize)]
pub struct PostInput {
    pub text: String,
    pub group_id: Option<Uuid>,
    pub image: Option<String>,
}

impl PostInput {
    fn validate(&self) -> Result<(), ContentError> {
        let mut errors = Vec::new();
        if self.text.trim().is_empty() {
            errors.push(FieldError {
                field: "text",
                message: "post text must not be empty",
            });
        }
        if matches!(&self.image, Some(image) if image.trim().is_empty()) {
            errors.push(FieldError {
                field: "image",
                message: "image reference must not be blank",
            });
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ContentError::Validation(errors))
        }
    }
}

/// Result of an edit attempt. A non-author attempt is not an error: the
/// caller redirects to the post's detail view and nothing is written.
#[derive(Debug, Clone, PartialEq)]
pub enum EditOutcome {
    Updated(PostRecord),
    NotAuthor { post_id: Uuid },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowOutcome {
    Following,
    /// Actor tried to follow themself; nothing was stored.
    SelfFollow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnfollowOutcome {
    Removed,
    NotFollowing,
}

#[derive(Clone)]
pub struct ContentService {
    posts: Arc<dyn PostsRepo>,
    groups: Arc<dyn GroupsRepo>,
    users: Arc<dyn UsersRepo>,
    comments: Arc<dyn CommentsRepo>,
    follows: Arc<dyn FollowsRepo>,
}

impl ContentService {
    pub fn new(
        posts: Arc<dyn PostsRepo>,
        groups: Arc<dyn GroupsRepo>,
        users: Arc<dyn UsersRepo>,
        comments: Arc<dyn CommentsRepo>,
        follows: Arc<dyn FollowsRepo>,
    ) -> Self {
        Self {
            posts,
            groups,
            users,
            comments,
            follows,
        }
    }

    async fn require_group(&self, group_id: Option<Uuid>) -> Result<(), ContentError> {
        if let Some(group_id) = group_id {
            self.groups
                .find_group_by_id(group_id)
                .await?
                .ok_or(ContentError::UnknownGroup)?;
        }
        Ok(())
    }

    pub async fn create_post(
        &self,
        actor: &Actor,
        input: PostInput,
    ) -> Result<PostRecord, ContentError> {
        input.validate()?;
        self.require_group(input.group_id).await?;

        let post = self
            .posts
            .create_post(CreatePostParams {
                text: input.text,
                author_id: actor.id,
                group_id: input.group_id,
                image: input.image,
            })
            .await?;

        info!(post_id = %post.id, author = %actor.username, "post created");
        Ok(post)
    }

    /// Edit text, group, and image of an existing post. The author and
    /// creation timestamp never change.
    pub async fn edit_post(
        &self,
        actor: &Actor,
        post_id: Uuid,
        input: PostInput,
    ) -> Result<EditOutcome, ContentError> {
        let post = self
            .posts
            .find_post_by_id(post_id)
            .await?
            .ok_or(ContentError::UnknownPost)?;

        if !policy::can_edit_post(actor, &post) {
            debug!(post_id = %post_id, actor = %actor.username, "edit denied, redirecting");
            return Ok(EditOutcome::NotAuthor { post_id });
        }

        input.validate()?;
        self.require_group(input.group_id).await?;

        let updated = self
            .posts
            .update_post(UpdatePostParams {
                id: post.id,
                text: input.text,
                group_id: input.group_id,
                image: input.image,
            })
            .await?;

        info!(post_id = %post_id, author = %actor.username, "post updated");
        Ok(EditOutcome::Updated(updated))
    }

    /// Author-only deletion.
    pub async fn delete_post(&self, actor: &Actor, post_id: Uuid) -> Result<bool, ContentError> {
        let post = self
            .posts
            .find_post_by_id(post_id)
            .await?
            .ok_or(ContentError::UnknownPost)?;

        if !policy::can_edit_post(actor, &post) {
            return Ok(false);
        }

        self.posts.delete_post(post.id).await?;
        info!(post_id = %post_id, author = %actor.username, "post deleted");
        Ok(true)
    }

    pub async fn add_comment(
        &self,
        actor: &Actor,
        post_id: Uuid,
        text: String,
    ) -> Result<CommentRecord, ContentError> {
        if text.trim().is_empty() {
            return Err(ContentError::Validation(vec![FieldError {
                field: "text",
                message: "comment text must not be empty",
            }]));
        }

        let post = self
            .posts
            .find_post_by_id(post_id)
            .await?
            .ok_or(ContentError::UnknownPost)?;

        let comment = self
            .comments
            .create_comment(CreateCommentParams {
                text,
                author_id: actor.id,
                post_id: post.id,
            })
            .await?;

        debug!(post_id = %post_id, comment_id = %comment.id, "comment added");
        Ok(comment)
    }

    /// Idempotent follow. A repeat follow and a self-follow both leave the
    /// store unchanged.
    pub async fn follow(
        &self,
        actor: &Actor,
        username: &str,
    ) -> Result<FollowOutcome, ContentError> {
        let target = self
            .users
            .find_user_by_username(username)
            .await?
            .ok_or(ContentError::UnknownAuthor)?;

        match policy::follow_decision(actor, &target) {
            FollowDecision::SelfFollow => Ok(FollowOutcome::SelfFollow),
            FollowDecision::Allowed => {
                self.follows.upsert_follow(actor.id, target.id).await?;
                debug!(follower = %actor.username, author = %target.username, "follow ensured");
                Ok(FollowOutcome::Following)
            }
        }
    }

    /// Idempotent unfollow.
    pub async fn unfollow(
        &self,
        actor: &Actor,
        username: &str,
    ) -> Result<UnfollowOutcome, ContentError> {
        let target = self
            .users
            .find_user_by_username(username)
            .await?
            .ok_or(ContentError::UnknownAuthor)?;

        let removed = self.follows.delete_follow(actor.id, target.id).await?;
        Ok(if removed {
            UnfollowOutcome::Removed
        } else {
            UnfollowOutcome::NotFollowing
        })
    }
}
