//! Domain entities mirrored from persistent storage.

use std::fmt;

use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

/// Number of characters shown in a post's short display form.
pub const POST_PREVIEW_CHARS: usize = 15;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserRecord {
    pub id: Uuid,
    pub username: String,
    pub display_name: String,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupRecord {
    pub id: Uuid,
    pub slug: String,
    pub title: String,
    pub description: String,
    pub created_at: OffsetDateTime,
}

impl fmt::Display for GroupRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.title)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostRecord {
    pub id: Uuid,
    pub text: String,
    pub author_id: Uuid,
    /// Cleared by the database when the referenced group is deleted.
    pub group_id: Option<Uuid>,
    /// Opaque reference into the external image store.
    pub image: Option<String>,
    pub created_at: OffsetDateTime,
}

impl fmt::Display for PostRecord {
    /// Short display form: the first [`POST_PREVIEW_CHARS`] characters of the text.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for c in self.text.chars().take(POST_PREVIEW_CHARS) {
            f.write_fmt(format_args!("{c}"))?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommentRecord {
    pub id: Uuid,
    pub text: String,
    pub author_id: Uuid,
    /// Cleared by the database when the parent post is deleted; the comment
    /// itself is retained as an orphan.
    pub post_id: Option<Uuid>,
    pub created_at: OffsetDateTime,
}

impl fmt::Display for CommentRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FollowRecord {
    pub id: Uuid,
    /// The follower.
    pub user_id: Uuid,
    /// The followed author.
    pub author_id: Uuid,
    pub created_at: OffsetDateTime,
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn post_with_text(text: &str) -> PostRecord {
        PostRecord {
            id: Uuid::new_v4(),
            text: text.to_string(),
            author_id: Uuid::new_v4(),
            group_id: None,
            image: None,
            created_at: datetime!(2025-06-01 12:00 UTC),
        }
    }

    #[test]
    fn post_display_truncates_to_preview_length() {
        let post = post_with_text("a very long post body that keeps going");
        assert_eq!(post.to_string(), "a very long pos");
        assert_eq!(post.to_string().chars().count(), POST_PREVIEW_CHARS);
    }

    #[test]
    fn post_display_keeps_short_text_whole() {
        let post = post_with_text("short");
        assert_eq!(post.to_string(), "short");
    }

    #[test]
    fn post_display_counts_characters_not_bytes() {
        let post = post_with_text("привет из ленты новостей");
        assert_eq!(post.to_string(), "привет из ленты");
    }
}
