use async_trait::async_trait;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::repos::{FollowsRepo, RepoError};
use crate::domain::entities::FollowRecord;

use super::PostgresRepositories;
use super::util::map_sqlx_error;

#[derive(Debug, FromRow)]
struct FollowRow {
    id: Uuid,
    user_id: Uuid,
    author_id: Uuid,
    created_at: OffsetDateTime,
}

impl From<FollowRow> for FollowRecord {
    fn from(row: FollowRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            author_id: row.author_id,
            created_at: row.created_at,
        }
    }
}

const SELECT_FOLLOW: &str = "SELECT id, user_id, author_id, created_at FROM follows";

#[async_trait]
impl FollowsRepo for PostgresRepositories {
    async fn upsert_follow(
        &self,
        user_id: Uuid,
        author_id: Uuid,
    ) -> Result<FollowRecord, RepoError> {
        // Get-or-create: ON CONFLICT DO NOTHING returns no row for the
        // duplicate case, so fall back to reading the existing edge.
        let inserted = sqlx::query_as::<_, FollowRow>(
            "INSERT INTO follows (user_id, author_id) VALUES ($1, $2) \
             ON CONFLICT (user_id, author_id) DO NOTHING \
             RETURNING id, user_id, author_id, created_at",
        )
        .bind(user_id)
        .bind(author_id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        if let Some(row) = inserted {
            return Ok(FollowRecord::from(row));
        }

        let existing = sqlx::query_as::<_, FollowRow>(&format!(
            "{SELECT_FOLLOW} WHERE user_id = $1 AND author_id = $2"
        ))
        .bind(user_id)
        .bind(author_id)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;
        Ok(FollowRecord::from(existing))
    }

    async fn delete_follow(&self, user_id: Uuid, author_id: Uuid) -> Result<bool, RepoError> {
        let result = sqlx::query("DELETE FROM follows WHERE user_id = $1 AND author_id = $2")
            .bind(user_id)
            .bind(author_id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(result.rows_affected() > 0)
    }

    async fn follow_exists(&self, user_id: Uuid, author_id: Uuid) -> Result<bool, RepoError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM follows WHERE user_id = $1 AND author_id = $2)",
        )
        .bind(user_id)
        .bind(author_id)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;
        Ok(exists)
    }
}
