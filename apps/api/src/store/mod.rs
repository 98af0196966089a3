//! Document storage for the profile.
//!
//! Handlers only see `ProfileStore`; `PgProfileStore` keeps each profile as a
//! JSONB document keyed by slug. Uniqueness of the slug is the store's job.

pub mod postgres;

#[cfg(test)]
pub mod memory;

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;
use uuid::Uuid;

use crate::models::profile::{Profile, ProfileFields};

pub use postgres::PgProfileStore;

const PERMISSION_DENIED_SQLSTATE: &str = "42501";
const UNIQUE_VIOLATION_SQLSTATE: &str = "23505";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0}")]
    PermissionDenied(String),

    #[error("Duplicate key: {0}")]
    Duplicate(String),

    #[error("Stored document is malformed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &err {
            let message = db.message().to_string();
            if db.code().as_deref() == Some(PERMISSION_DENIED_SQLSTATE)
                || is_permission_message(&message)
            {
                return StoreError::PermissionDenied(message);
            }
            if db.code().as_deref() == Some(UNIQUE_VIOLATION_SQLSTATE) {
                return StoreError::Duplicate(message);
            }
        }
        StoreError::Database(err)
    }
}

/// Case-insensitive match on the messages stores use for authorization failures.
pub fn is_permission_message(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("not authorized") || lower.contains("permission denied")
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Keyed access to profile documents.
///
/// Every operation is a single atomic store call; nothing here spans
/// multiple documents transactionally.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn find_by_slug(&self, slug: &str) -> StoreResult<Option<Profile>>;

    /// Inserts a new document. Fails with `Duplicate` if the slug is taken.
    async fn insert(&self, slug: &str, fields: &ProfileFields) -> StoreResult<Profile>;

    /// Overwrites the whole document body, creating it if absent.
    async fn replace(&self, slug: &str, fields: &ProfileFields) -> StoreResult<Profile>;

    /// Shallow merge of top-level fields. `None` if no document has the slug.
    async fn merge(&self, slug: &str, patch: &Map<String, Value>)
        -> StoreResult<Option<Profile>>;

    async fn delete_by_slug(&self, slug: &str) -> StoreResult<u64>;

    /// Removes every document in the collection, keyed or not.
    async fn delete_all(&self) -> StoreResult<u64>;

    async fn find_ids_by_slug(&self, slug: &str) -> StoreResult<Vec<Uuid>>;

    /// Moves one document to a new slug. Returns whether it was modified.
    async fn rename_slug(&self, id: Uuid, new_slug: &str) -> StoreResult<bool>;
}
