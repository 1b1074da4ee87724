//! Data access layer.
//!
//! Handlers talk to a [`Store`] and never know which backend is behind it.
//! The backend is chosen once at startup from the configuration.

pub mod fallback;
pub mod memory;
pub mod mysql;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::post::{NewPost, Post, PostChanges, PostWithAuthor};
use crate::models::user::{NewUser, User, UserChanges};

pub use fallback::FallbackStore;
pub use memory::MemoryStore;
pub use mysql::MySqlStore;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique field already holds this value.
    #[error("duplicate value for {field}")]
    Duplicate { field: &'static str },

    /// A value could not be coerced into the type the store expects.
    #[error("invalid {field}: {value}")]
    Cast { field: &'static str, value: String },

    #[error("database error: {0}")]
    Database(#[source] sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                StoreError::Duplicate { field: "email" }
            }
            _ => StoreError::Database(err),
        }
    }
}

/// Which posts a listing should return.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PostFilter {
    All,
    Author(String),
    Tag(String),
}

impl PostFilter {
    pub fn matches(&self, post: &Post) -> bool {
        match self {
            PostFilter::All => true,
            PostFilter::Author(author) => post.author.to_string() == *author,
            PostFilter::Tag(tag) => post.tags.iter().any(|t| t == tag),
        }
    }
}

#[async_trait]
pub trait Store: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// All users, newest first.
    async fn list_users(&self) -> StoreResult<Vec<User>>;
    async fn get_user(&self, id: &str) -> StoreResult<Option<User>>;
    /// Fails with [`StoreError::Duplicate`] when the email is taken.
    async fn create_user(&self, user: NewUser) -> StoreResult<User>;
    async fn update_user(&self, id: &str, changes: UserChanges) -> StoreResult<Option<User>>;
    async fn delete_user(&self, id: &str) -> StoreResult<bool>;

    /// Posts matching `filter`, newest first, with authors resolved.
    async fn list_posts(&self, filter: PostFilter) -> StoreResult<Vec<PostWithAuthor>>;
    async fn get_post(&self, id: &str) -> StoreResult<Option<PostWithAuthor>>;
    async fn create_post(&self, post: NewPost) -> StoreResult<Post>;
    async fn update_post(&self, id: &str, changes: PostChanges) -> StoreResult<Option<Post>>;
    async fn delete_post(&self, id: &str) -> StoreResult<bool>;
}

/// Checks that `raw` is an identifier a persistent backend could have issued.
pub(crate) fn parse_key(field: &'static str, raw: &str) -> StoreResult<String> {
    Uuid::parse_str(raw)
        .map(|id| id.to_string())
        .map_err(|_| StoreError::Cast {
            field,
            value: raw.to_string(),
        })
}
