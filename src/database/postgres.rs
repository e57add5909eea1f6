use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::models::{
    Comment, NewComment, NewPost, NewUser, Post, PostChanges, User, UserChanges,
};
use super::store::{Store, StoreError, TokenConsumption};

const USER_COLUMNS: &str = "id, email, username, password_hash, refresh_tokens, created_at";
const POST_COLUMNS: &str = "id, sender, title, message, created_at";
const COMMENT_COLUMNS: &str = "id, post_id, sender, message, created_at";

/// Postgres-backed [`Store`]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Translate constraint violations into store-level errors; everything else stays opaque.
fn map_write_error(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return StoreError::Conflict(conflict_field(db_err.constraint()).to_string());
        }
        if db_err.is_foreign_key_violation() {
            return StoreError::MissingParent(parent_entity(db_err.constraint()).to_string());
        }
    }
    StoreError::Sqlx(err)
}

/// Field named by a unique constraint, in the same terms `MemoryStore` reports
fn conflict_field(constraint: Option<&str>) -> &'static str {
    match constraint {
        Some("users_email_key") => "email",
        Some("users_username_key") => "username",
        _ => "value",
    }
}

fn parent_entity(constraint: Option<&str>) -> &'static str {
    match constraint {
        Some("comments_post_id_fkey") => "post",
        _ => "parent",
    }
}

#[async_trait]
impl Store for PgStore {
    async fn health_check(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn create_user(&self, user: NewUser) -> Result<User, StoreError> {
        let sql = format!(
            "INSERT INTO users (id, email, username, password_hash) VALUES ($1, $2, $3, $4) RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(Uuid::new_v4())
            .bind(&user.email)
            .bind(&user.username)
            .bind(&user.password_hash)
            .fetch_one(&self.pool)
            .await
            .map_err(map_write_error)
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn update_user(&self, id: Uuid, changes: UserChanges) -> Result<Option<User>, StoreError> {
        let sql = format!(
            r#"
            UPDATE users SET
                email = COALESCE($2, email),
                username = COALESCE($3, username),
                password_hash = COALESCE($4, password_hash)
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(changes.email)
            .bind(changes.username)
            .bind(changes.password_hash)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_write_error)
    }

    async fn delete_user(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn push_refresh_token(&self, user_id: Uuid, fingerprint: &str) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "UPDATE users SET refresh_tokens = array_append(refresh_tokens, $2) WHERE id = $1",
        )
        .bind(user_id)
        .bind(fingerprint)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn consume_refresh_token(
        &self,
        user_id: Uuid,
        presented: &str,
        replacement: Option<&str>,
    ) -> Result<TokenConsumption, StoreError> {
        // The membership test and the removal are one statement, so two callers
        // presenting the same fingerprint cannot both match.
        let consumed = match replacement {
            Some(next) => sqlx::query(
                r#"
                UPDATE users
                SET refresh_tokens = array_append(array_remove(refresh_tokens, $2), $3)
                WHERE id = $1 AND $2 = ANY(refresh_tokens)
                "#,
            )
            .bind(user_id)
            .bind(presented)
            .bind(next)
            .execute(&self.pool)
            .await?,
            None => sqlx::query(
                r#"
                UPDATE users
                SET refresh_tokens = array_remove(refresh_tokens, $2)
                WHERE id = $1 AND $2 = ANY(refresh_tokens)
                "#,
            )
            .bind(user_id)
            .bind(presented)
            .execute(&self.pool)
            .await?,
        };

        if consumed.rows_affected() > 0 {
            return Ok(TokenConsumption::Consumed);
        }

        let revoked = sqlx::query("UPDATE users SET refresh_tokens = '{}' WHERE id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        if revoked.rows_affected() > 0 {
            Ok(TokenConsumption::Reused)
        } else {
            Ok(TokenConsumption::UserMissing)
        }
    }

    async fn create_post(&self, post: NewPost) -> Result<Post, StoreError> {
        let sql = format!(
            "INSERT INTO posts (id, sender, title, message) VALUES ($1, $2, $3, $4) RETURNING {POST_COLUMNS}"
        );
        sqlx::query_as::<_, Post>(&sql)
            .bind(Uuid::new_v4())
            .bind(post.sender)
            .bind(post.title)
            .bind(post.message)
            .fetch_one(&self.pool)
            .await
            .map_err(map_write_error)
    }

    async fn list_posts(&self, sender: Option<Uuid>) -> Result<Vec<Post>, StoreError> {
        let sql = format!(
            "SELECT {POST_COLUMNS} FROM posts WHERE ($1::uuid IS NULL OR sender = $1) ORDER BY created_at, id"
        );
        Ok(sqlx::query_as::<_, Post>(&sql)
            .bind(sender)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn find_post(&self, id: Uuid) -> Result<Option<Post>, StoreError> {
        let sql = format!("SELECT {POST_COLUMNS} FROM posts WHERE id = $1");
        Ok(sqlx::query_as::<_, Post>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn update_post(&self, id: Uuid, changes: PostChanges) -> Result<Option<Post>, StoreError> {
        let sql = format!(
            r#"
            UPDATE posts SET
                title = COALESCE($2, title),
                message = COALESCE($3, message)
            WHERE id = $1
            RETURNING {POST_COLUMNS}
            "#
        );
        sqlx::query_as::<_, Post>(&sql)
            .bind(id)
            .bind(changes.title)
            .bind(changes.message)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_write_error)
    }

    async fn delete_post(&self, id: Uuid) -> Result<bool, StoreError> {
        // comments.post_id is ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn create_comment(&self, comment: NewComment) -> Result<Comment, StoreError> {
        let sql = format!(
            "INSERT INTO comments (id, post_id, sender, message) VALUES ($1, $2, $3, $4) RETURNING {COMMENT_COLUMNS}"
        );
        sqlx::query_as::<_, Comment>(&sql)
            .bind(Uuid::new_v4())
            .bind(comment.post_id)
            .bind(comment.sender)
            .bind(comment.message)
            .fetch_one(&self.pool)
            .await
            .map_err(map_write_error)
    }

    async fn list_comments(&self, post_id: Option<Uuid>) -> Result<Vec<Comment>, StoreError> {
        let sql = format!(
            "SELECT {COMMENT_COLUMNS} FROM comments WHERE ($1::uuid IS NULL OR post_id = $1) ORDER BY created_at, id"
        );
        Ok(sqlx::query_as::<_, Comment>(&sql)
            .bind(post_id)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn find_comment(&self, id: Uuid) -> Result<Option<Comment>, StoreError> {
        let sql = format!("SELECT {COMMENT_COLUMNS} FROM comments WHERE id = $1");
        Ok(sqlx::query_as::<_, Comment>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn update_comment(&self, id: Uuid, message: String) -> Result<Option<Comment>, StoreError> {
        let sql = format!("UPDATE comments SET message = $2 WHERE id = $1 RETURNING {COMMENT_COLUMNS}");
        Ok(sqlx::query_as::<_, Comment>(&sql)
            .bind(id)
            .bind(message)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn delete_comment(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
