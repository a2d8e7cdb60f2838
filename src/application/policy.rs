//! Access policy: which actor may do what to which entity.
//!
//! Every decision takes the actor explicitly; there is no ambient
//! "current user" state anywhere in the application layer.

use serde::Serialize;
use uuid::Uuid;

use crate::domain::entities::{PostRecord, UserRecord};

/// An authenticated principal, resolved by the HTTP layer before any
/// mutation reaches the services.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Actor {
    pub id: Uuid,
    pub username: String,
}

impl Actor {
    pub fn from_user(user: &UserRecord) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
        }
    }
}

/// Only the author may mutate a post.
pub fn can_edit_post(actor: &Actor, post: &PostRecord) -> bool {
    actor.id == post.author_id
}

/// Any authenticated actor may comment; anonymous actors are redirected to
/// the authentication flow by the HTTP layer before this is consulted.
pub fn can_create_comment(actor: Option<&Actor>) -> bool {
    actor.is_some()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowDecision {
    Allowed,
    /// Following yourself is a policy-level no-op, not an error.
    SelfFollow,
}

pub fn follow_decision(actor: &Actor, target: &UserRecord) -> FollowDecision {
    if actor.id == target.id {
        FollowDecision::SelfFollow
    } else {
        FollowDecision::Allowed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn user(username: &str) -> UserRecord {
        UserRecord {
            id: Uuid::new_v4(),
            username: username.to_string(),
            display_name: String::new(),
            created_at: datetime!(2025-01-01 00:00 UTC),
        }
    }

    fn post_by(author_id: Uuid) -> PostRecord {
        PostRecord {
            id: Uuid::new_v4(),
            text: "body".to_string(),
            author_id,
            group_id: None,
            image: None,
            created_at: datetime!(2025-01-02 00:00 UTC),
        }
    }

    #[test]
    fn author_may_edit_own_post() {
        let author = user("lena");
        let actor = Actor::from_user(&author);
        assert!(can_edit_post(&actor, &post_by(author.id)));
    }

    #[test]
    fn non_author_may_not_edit() {
        let actor = Actor::from_user(&user("lena"));
        assert!(!can_edit_post(&actor, &post_by(Uuid::new_v4())));
    }

    #[test]
    fn commenting_requires_authentication() {
        let actor = Actor::from_user(&user("lena"));
        assert!(can_create_comment(Some(&actor)));
        assert!(!can_create_comment(None));
    }

    #[test]
    fn self_follow_is_rejected_by_policy() {
        let target = user("lena");
        let actor = Actor::from_user(&target);
        assert_eq!(follow_decision(&actor, &target), FollowDecision::SelfFollow);

        let other = Actor::from_user(&user("max"));
        assert_eq!(follow_decision(&other, &target), FollowDecision::Allowed);
    }
}
