use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use super::models::{
    Comment, NewComment, NewPost, NewUser, Post, PostChanges, User, UserChanges,
};

/// Errors surfaced by any [`Store`] backend
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    /// A unique column (email, username) already holds the value.
    #[error("Conflict on {0}")]
    Conflict(String),

    /// The referenced parent row does not exist (e.g. a comment's post).
    #[error("Missing parent record: {0}")]
    MissingParent(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error(transparent)]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

/// Result of redeeming a refresh-token fingerprint against a user's valid set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenConsumption {
    /// The fingerprint was present and has been removed (and the replacement, if any, appended).
    Consumed,
    /// The fingerprint was absent. Every outstanding fingerprint for the user has been cleared.
    Reused,
    /// No such user.
    UserMissing,
}

/// Persistence boundary for users, posts and comments.
///
/// Every method is a single logical operation against the backend. In
/// particular [`Store::consume_refresh_token`] must check and mutate the
/// user's refresh set without a window for a concurrent caller to observe
/// the same fingerprint as present, and [`Store::delete_post`] removes the
/// post's comments in the same operation.
#[async_trait]
pub trait Store: Send + Sync {
    async fn health_check(&self) -> Result<(), StoreError>;

    async fn create_user(&self, user: NewUser) -> Result<User, StoreError>;
    async fn find_user(&self, id: Uuid) -> Result<Option<User>, StoreError>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    async fn update_user(&self, id: Uuid, changes: UserChanges) -> Result<Option<User>, StoreError>;
    /// Removes the account only; posts and comments it owns are kept.
    async fn delete_user(&self, id: Uuid) -> Result<bool, StoreError>;

    /// Appends a fingerprint to the user's valid set. Returns `false` when the user is gone.
    async fn push_refresh_token(&self, user_id: Uuid, fingerprint: &str) -> Result<bool, StoreError>;
    async fn consume_refresh_token(
        &self,
        user_id: Uuid,
        presented: &str,
        replacement: Option<&str>,
    ) -> Result<TokenConsumption, StoreError>;

    async fn create_post(&self, post: NewPost) -> Result<Post, StoreError>;
    async fn list_posts(&self, sender: Option<Uuid>) -> Result<Vec<Post>, StoreError>;
    async fn find_post(&self, id: Uuid) -> Result<Option<Post>, StoreError>;
    async fn update_post(&self, id: Uuid, changes: PostChanges) -> Result<Option<Post>, StoreError>;
    async fn delete_post(&self, id: Uuid) -> Result<bool, StoreError>;

    /// Fails with [`StoreError::MissingParent`] when the post does not exist.
    async fn create_comment(&self, comment: NewComment) -> Result<Comment, StoreError>;
    async fn list_comments(&self, post_id: Option<Uuid>) -> Result<Vec<Comment>, StoreError>;
    async fn find_comment(&self, id: Uuid) -> Result<Option<Comment>, StoreError>;
    async fn update_comment(&self, id: Uuid, message: String) -> Result<Option<Comment>, StoreError>;
    async fn delete_comment(&self, id: Uuid) -> Result<bool, StoreError>;
}
