#![allow(dead_code)]

use std::sync::Arc;

use anyhow::{Context, Result};
use reqwest::{Method, StatusCode};
use serde_json::{json, Value};
use uuid::Uuid;

use postboard_api::auth::TokenService;
use postboard_api::config::AppConfig;
use postboard_api::database::{manager, MemoryStore, PgStore};
use postboard_api::state::AppState;

pub const TEST_SECRET: &str = "test_secret_key_123";

pub struct TestServer {
    pub base_url: String,
    client: reqwest::Client,
}

/// Credentials returned by /auth/register
#[derive(Debug, Clone)]
pub struct Session {
    pub user_id: String,
    pub token: String,
    pub refresh_token: String,
}

pub fn test_config() -> AppConfig {
    let mut config = AppConfig::development();
    config.security.jwt_secret = TEST_SECRET.to_string();
    config
}

/// Migrated Postgres store, or `None` when DATABASE_URL is not configured
pub async fn pg_store() -> Result<Option<PgStore>> {
    let _ = dotenvy::dotenv();
    let Ok(url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set; skipping Postgres store test");
        return Ok(None);
    };

    let mut config = test_config();
    config.database.url = Some(url);
    let pool = manager::connect(&config.database).await?;
    manager::migrate(&pool).await?;
    Ok(Some(PgStore::new(pool)))
}

/// An access token that verifies but belongs to no registered user
pub fn stranger_token() -> String {
    TokenService::new(&test_config().security)
        .issue(Uuid::new_v4())
        .expect("token issue")
        .access_token
}

impl TestServer {
    /// Serve a fresh app (own in-memory store) on an unused local port
    pub async fn spawn() -> Result<Self> {
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
            .await
            .context("failed to bind test listener")?;

        let state = AppState::new(test_config(), Arc::new(MemoryStore::new()));
        let app = postboard_api::app(state);
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Ok(Self {
            base_url: format!("http://127.0.0.1:{}", port),
            client: reqwest::Client::new(),
        })
    }

    pub async fn send(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Result<(StatusCode, Value)> {
        let mut req = self.client.request(method, format!("{}{}", self.base_url, path));
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }
        if let Some(body) = body {
            req = req.json(&body);
        }

        let res = req.send().await?;
        let status = res.status();
        let text = res.text().await?;
        let value = if text.is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).with_context(|| format!("non-JSON body: {}", text))?
        };
        Ok((status, value))
    }

    pub async fn get(&self, path: &str, token: Option<&str>) -> Result<(StatusCode, Value)> {
        self.send(Method::GET, path, token, None).await
    }

    pub async fn post(&self, path: &str, token: Option<&str>, body: Value) -> Result<(StatusCode, Value)> {
        self.send(Method::POST, path, token, Some(body)).await
    }

    pub async fn put(&self, path: &str, token: Option<&str>, body: Value) -> Result<(StatusCode, Value)> {
        self.send(Method::PUT, path, token, Some(body)).await
    }

    pub async fn delete(&self, path: &str, token: Option<&str>) -> Result<(StatusCode, Value)> {
        self.send(Method::DELETE, path, token, None).await
    }

    pub async fn register(&self, email: &str, password: &str) -> Result<Session> {
        let (status, body) = self
            .post("/auth/register", None, json!({ "email": email, "password": password }))
            .await?;
        anyhow::ensure!(status == StatusCode::CREATED, "register failed: {} {}", status, body);

        Ok(Session {
            user_id: field(&body, "userId")?,
            token: field(&body, "token")?,
            refresh_token: field(&body, "refreshToken")?,
        })
    }

    /// Create a post as `token` and return its id
    pub async fn create_post(&self, token: &str, title: &str, message: &str) -> Result<String> {
        let (status, body) = self
            .post("/post", Some(token), json!({ "title": title, "message": message }))
            .await?;
        anyhow::ensure!(status == StatusCode::CREATED, "create post failed: {} {}", status, body);
        field(&body, "_id")
    }
}

pub fn field(body: &Value, key: &str) -> Result<String> {
    body[key]
        .as_str()
        .map(str::to_string)
        .with_context(|| format!("missing '{}' in {}", key, body))
}
