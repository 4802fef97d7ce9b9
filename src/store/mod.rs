//! Persistence gateway consumed by the relay and the HTTP handlers.

mod sqlite;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{BlogPost, Comment, Group, GroupMessageRecord, PrivateMessageRecord, User};

pub use sqlite::SqliteStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{entity} {key} not found")]
    NotFound { entity: &'static str, key: String },

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl StoreError {
    pub(crate) fn not_found(entity: &'static str, key: impl ToString) -> Self {
        Self::NotFound { entity, key: key.to_string() }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Clone)]
pub struct NewBlog<'a> {
    pub username: &'a str,
    pub content: &'a str,
    pub image: Option<&'a str>,
}

#[async_trait]
pub trait Store: Send + Sync {
    /// Fails with `Conflict` when the username is taken.
    async fn create_user(&self, username: &str, password_hash: &str) -> StoreResult<User>;

    async fn password_hash(&self, username: &str) -> StoreResult<Option<String>>;

    async fn create_blog(&self, blog: NewBlog<'_>) -> StoreResult<BlogPost>;

    /// Newest first.
    async fn list_blogs(&self) -> StoreResult<Vec<BlogPost>>;

    /// Adds the (blog, user) like if absent, removes it if present, then
    /// rewrites the blog's like counter from the like records. Returns the
    /// updated blog.
    async fn toggle_like(&self, blog_id: i64, username: &str) -> StoreResult<BlogPost>;

    async fn add_comment(&self, blog_id: i64, username: &str, comment: &str) -> StoreResult<Comment>;

    /// Oldest first.
    async fn list_comments(&self, blog_id: i64) -> StoreResult<Vec<Comment>>;

    async fn create_group(&self, group_name: &str, created_by: &str) -> StoreResult<Group>;

    async fn list_groups(&self) -> StoreResult<Vec<Group>>;

    async fn append_private_message(
        &self,
        sender: &str,
        recipient: &str,
        message: &str,
    ) -> StoreResult<PrivateMessageRecord>;

    /// Both directions of the conversation between `a` and `b`, oldest first.
    async fn private_history(&self, a: &str, b: &str) -> StoreResult<Vec<PrivateMessageRecord>>;

    async fn append_group_message(
        &self,
        group_id: i64,
        username: &str,
        message: &str,
    ) -> StoreResult<GroupMessageRecord>;

    async fn group_history(&self, group_id: i64) -> StoreResult<Vec<GroupMessageRecord>>;
}
