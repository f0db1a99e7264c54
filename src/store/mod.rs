//! Data collaborator for the user and post services.
//!
//! # Responsibilities
//! - Define the records both services serve
//! - Abstract lookups behind `RecordStore` so handlers never see storage
//!
//! # Design Decisions
//! - "Not found" is `Ok(None)`, not an error; only real failures are `Err`
//! - `posts_by_user` returns newest first
//! - A partial result is reported as an error, never returned silently

pub mod memory;

use futures_util::future::BoxFuture;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use memory::InMemoryStore;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub content: String,
    pub created_at: String,
}

/// Failures of the data collaborator.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing store could not be reached.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// A query failed part way; the rows read so far are discarded.
    #[error("query failed after {rows_read} rows: {message}")]
    Partial { rows_read: usize, message: String },
}

impl StoreError {
    /// Short machine-readable category, used as the span's `error.type`.
    pub fn kind(&self) -> &'static str {
        match self {
            StoreError::Unavailable(_) => "store_unavailable",
            StoreError::Partial { .. } => "store_partial_result",
        }
    }
}

/// Record lookups used by the handlers.
pub trait RecordStore: Send + Sync + 'static {
    fn user_by_id(&self, id: i64) -> BoxFuture<'_, Result<Option<User>, StoreError>>;

    fn post_by_id(&self, id: i64) -> BoxFuture<'_, Result<Option<Post>, StoreError>>;

    /// Posts written by `user_id`, ordered by `created_at` descending.
    fn posts_by_user(&self, user_id: i64) -> BoxFuture<'_, Result<Vec<Post>, StoreError>>;
}
