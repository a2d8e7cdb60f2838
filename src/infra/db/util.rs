//! sqlx error classification.
//!
//! Postgres reports constraint failures through SQLSTATE codes; the schema
//! raises `23505` from `unique_user_author_follow` and the groups slug key,
//! and `23503` when a post or comment references a missing row.

use crate::application::repos::RepoError;

const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";
const QUERY_CANCELED: &str = "57014";
const DATA_EXCEPTION_CLASS: &str = "22";
const INTEGRITY_CLASS: &str = "23";

pub fn map_sqlx_error(err: sqlx::Error) -> RepoError {
    match err {
        sqlx::Error::RowNotFound => RepoError::NotFound,
        sqlx::Error::Database(db) => {
            classify(db.code().as_deref(), db.constraint(), db.message())
        }
        other => RepoError::from_persistence(other),
    }
}

fn classify(code: Option<&str>, constraint: Option<&str>, message: &str) -> RepoError {
    match code {
        Some(UNIQUE_VIOLATION) => RepoError::Duplicate {
            constraint: constraint.unwrap_or("unknown").to_string(),
        },
        Some(FOREIGN_KEY_VIOLATION) => RepoError::InvalidInput {
            message: message.to_string(),
        },
        Some(QUERY_CANCELED) => RepoError::Timeout,
        Some(code) if code.starts_with(DATA_EXCEPTION_CLASS) => RepoError::InvalidInput {
            message: message.to_string(),
        },
        Some(code) if code.starts_with(INTEGRITY_CLASS) => RepoError::Integrity {
            message: message.to_string(),
        },
        _ => RepoError::from_persistence(message),
    }
}
