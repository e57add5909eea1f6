use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::models::{
    Comment, NewComment, NewPost, NewUser, Post, PostChanges, User, UserChanges,
};
use super::store::{Store, StoreError, TokenConsumption};

#[derive(Debug, Default)]
struct Tables {
    users: Vec<User>,
    posts: Vec<Post>,
    comments: Vec<Comment>,
}

impl Tables {
    fn user_mut(&mut self, id: Uuid) -> Option<&mut User> {
        self.users.iter_mut().find(|u| u.id == id)
    }

    fn check_unique(&self, skip: Option<Uuid>, email: Option<&str>, username: Option<&str>) -> Result<(), StoreError> {
        for user in self.users.iter().filter(|u| Some(u.id) != skip) {
            if email == Some(user.email.as_str()) {
                return Err(StoreError::Conflict("email".to_string()));
            }
            if username == Some(user.username.as_str()) {
                return Err(StoreError::Conflict("username".to_string()));
            }
        }
        Ok(())
    }
}

/// Process-local store used when no database is configured, and in tests.
///
/// All tables sit behind one lock so multi-row operations (refresh rotation,
/// post deletion with its comments) happen under a single write guard.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn create_user(&self, user: NewUser) -> Result<User, StoreError> {
        let mut tables = self.tables.write().await;
        tables.check_unique(None, Some(&user.email), Some(&user.username))?;

        let record = User {
            id: Uuid::new_v4(),
            email: user.email,
            username: user.username,
            password_hash: user.password_hash,
            refresh_tokens: Vec::new(),
            created_at: Utc::now(),
        };
        tables.users.push(record.clone());
        Ok(record)
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.email == email).cloned())
    }

    async fn update_user(&self, id: Uuid, changes: UserChanges) -> Result<Option<User>, StoreError> {
        let mut tables = self.tables.write().await;
        if tables.users.iter().all(|u| u.id != id) {
            return Ok(None);
        }
        tables.check_unique(Some(id), changes.email.as_deref(), changes.username.as_deref())?;

        let Some(user) = tables.user_mut(id) else {
            return Ok(None);
        };
        if let Some(email) = changes.email {
            user.email = email;
        }
        if let Some(username) = changes.username {
            user.username = username;
        }
        if let Some(hash) = changes.password_hash {
            user.password_hash = hash;
        }
        Ok(Some(user.clone()))
    }

    async fn delete_user(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;
        let before = tables.users.len();
        tables.users.retain(|u| u.id != id);
        Ok(tables.users.len() != before)
    }

    async fn push_refresh_token(&self, user_id: Uuid, fingerprint: &str) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;
        match tables.user_mut(user_id) {
            Some(user) => {
                user.refresh_tokens.push(fingerprint.to_string());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn consume_refresh_token(
        &self,
        user_id: Uuid,
        presented: &str,
        replacement: Option<&str>,
    ) -> Result<TokenConsumption, StoreError> {
        let mut tables = self.tables.write().await;
        let Some(user) = tables.user_mut(user_id) else {
            return Ok(TokenConsumption::UserMissing);
        };

        if !user.refresh_tokens.iter().any(|t| t == presented) {
            user.refresh_tokens.clear();
            return Ok(TokenConsumption::Reused);
        }

        user.refresh_tokens.retain(|t| t != presented);
        if let Some(next) = replacement {
            user.refresh_tokens.push(next.to_string());
        }
        Ok(TokenConsumption::Consumed)
    }

    async fn create_post(&self, post: NewPost) -> Result<Post, StoreError> {
        let record = Post {
            id: Uuid::new_v4(),
            sender: post.sender,
            title: post.title,
            message: post.message,
            created_at: Utc::now(),
        };
        self.tables.write().await.posts.push(record.clone());
        Ok(record)
    }

    async fn list_posts(&self, sender: Option<Uuid>) -> Result<Vec<Post>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .posts
            .iter()
            .filter(|p| sender.map_or(true, |s| p.sender == s))
            .cloned()
            .collect())
    }

    async fn find_post(&self, id: Uuid) -> Result<Option<Post>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.posts.iter().find(|p| p.id == id).cloned())
    }

    async fn update_post(&self, id: Uuid, changes: PostChanges) -> Result<Option<Post>, StoreError> {
        let mut tables = self.tables.write().await;
        let Some(post) = tables.posts.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        if let Some(title) = changes.title {
            post.title = Some(title);
        }
        if let Some(message) = changes.message {
            post.message = message;
        }
        Ok(Some(post.clone()))
    }

    async fn delete_post(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;
        let before = tables.posts.len();
        tables.posts.retain(|p| p.id != id);
        if tables.posts.len() == before {
            return Ok(false);
        }
        tables.comments.retain(|c| c.post_id != id);
        Ok(true)
    }

    async fn create_comment(&self, comment: NewComment) -> Result<Comment, StoreError> {
        let mut tables = self.tables.write().await;
        if tables.posts.iter().all(|p| p.id != comment.post_id) {
            return Err(StoreError::MissingParent("post".to_string()));
        }

        let record = Comment {
            id: Uuid::new_v4(),
            post_id: comment.post_id,
            sender: comment.sender,
            message: comment.message,
            created_at: Utc::now(),
        };
        tables.comments.push(record.clone());
        Ok(record)
    }

    async fn list_comments(&self, post_id: Option<Uuid>) -> Result<Vec<Comment>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .comments
            .iter()
            .filter(|c| post_id.map_or(true, |p| c.post_id == p))
            .cloned()
            .collect())
    }

    async fn find_comment(&self, id: Uuid) -> Result<Option<Comment>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.comments.iter().find(|c| c.id == id).cloned())
    }

    async fn update_comment(&self, id: Uuid, message: String) -> Result<Option<Comment>, StoreError> {
        let mut tables = self.tables.write().await;
        let Some(comment) = tables.comments.iter_mut().find(|c| c.id == id) else {
            return Ok(None);
        };
        comment.message = message;
        Ok(Some(comment.clone()))
    }

    async fn delete_comment(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;
        let before = tables.comments.len();
        tables.comments.retain(|c| c.id != id);
        Ok(tables.comments.len() != before)
    }
}
