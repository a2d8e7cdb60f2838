use async_trait::async_trait;
use sqlx::{FromRow, Postgres, QueryBuilder};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::repos::{
    CreatePostParams, PostFilter, PostsRepo, RepoError, UpdatePostParams,
};
use crate::domain::entities::PostRecord;

use super::PostgresRepositories;
use super::util::map_sqlx_error;

#[derive(Debug, FromRow)]
struct PostRow {
    id: Uuid,
    text: String,
    author_id: Uuid,
    group_id: Option<Uuid>,
    image: Option<String>,
    created_at: OffsetDateTime,
}

impl From<PostRow> for PostRecord {
    fn from(row: PostRow) -> Self {
        Self {
            id: row.id,
            text: row.text,
            author_id: row.author_id,
            group_id: row.group_id,
            image: row.image,
            created_at: row.created_at,
        }
    }
}

const POST_COLUMNS: &str = "p.id, p.text, p.author_id, p.group_id, p.image, p.created_at";

fn apply_filter<'q>(qb: &mut QueryBuilder<'q, Postgres>, filter: PostFilter) {
    if let Some(group_id) = filter.group_id {
        qb.push(" AND p.group_id = ");
        qb.push_bind(group_id);
    }
    if let Some(author_id) = filter.author_id {
        qb.push(" AND p.author_id = ");
        qb.push_bind(author_id);
    }
    if let Some(user_id) = filter.followed_by {
        qb.push(
            " AND EXISTS (SELECT 1 FROM follows f \
             WHERE f.author_id = p.author_id AND f.user_id = ",
        );
        qb.push_bind(user_id);
        qb.push(")");
    }
}

#[async_trait]
impl PostsRepo for PostgresRepositories {
    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError> {
        let row = sqlx::query_as::<_, PostRow>(
            "INSERT INTO posts (text, author_id, group_id, image) VALUES ($1, $2, $3, $4) \
             RETURNING id, text, author_id, group_id, image, created_at",
        )
        .bind(&params.text)
        .bind(params.author_id)
        .bind(params.group_id)
        .bind(&params.image)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;
        Ok(PostRecord::from(row))
    }

    async fn update_post(&self, params: UpdatePostParams) -> Result<PostRecord, RepoError> {
        // author_id and created_at are intentionally absent from the SET list.
        let row = sqlx::query_as::<_, PostRow>(
            "UPDATE posts SET text = $2, group_id = $3, image = $4 WHERE id = $1 \
             RETURNING id, text, author_id, group_id, image, created_at",
        )
        .bind(params.id)
        .bind(&params.text)
        .bind(params.group_id)
        .bind(&params.image)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;
        Ok(PostRecord::from(row))
    }

    async fn delete_post(&self, id: Uuid) -> Result<(), RepoError> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    async fn find_post_by_id(&self, id: Uuid) -> Result<Option<PostRecord>, RepoError> {
        let row = sqlx::query_as::<_, PostRow>(&format!(
            "SELECT {POST_COLUMNS} FROM posts p WHERE p.id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;
        Ok(row.map(PostRecord::from))
    }

    async fn list_posts(
        &self,
        filter: PostFilter,
        limit: u32,
        offset: u64,
    ) -> Result<Vec<PostRecord>, RepoError> {
        let mut qb = QueryBuilder::new(format!(
            "SELECT {POST_COLUMNS} FROM posts p WHERE 1=1 "
        ));
        apply_filter(&mut qb, filter);
        qb.push(" ORDER BY p.created_at DESC, p.id DESC LIMIT ");
        qb.push_bind(limit as i64);
        qb.push(" OFFSET ");
        qb.push_bind(offset as i64);

        let rows = qb
            .build_query_as::<PostRow>()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(rows.into_iter().map(PostRecord::from).collect())
    }

    async fn count_posts(&self, filter: PostFilter) -> Result<u64, RepoError> {
        let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM posts p WHERE 1=1 ");
        apply_filter(&mut qb, filter);

        let count: i64 = qb
            .build_query_scalar()
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        u64::try_from(count)
            .map_err(|_| RepoError::from_persistence("negative row count from COUNT(*)"))
    }
}
