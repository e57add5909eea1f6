mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::json;

use common::TestServer;

/// Register, post, contest ownership, then rotate and replay the refresh token
#[tokio::test]
async fn ownership_and_rotation_end_to_end() -> Result<()> {
    let server = TestServer::spawn().await?;

    let owner = server.register("owner@example.com", "secret").await?;
    let other = server.register("other@example.com", "secret").await?;

    let post_id = server.create_post(&owner.token, "Title", "Body").await?;
    let (_, post) = server.get(&format!("/post/{}", post_id), None).await?;
    assert_eq!(post["sender"], owner.user_id.as_str());

    let path = format!("/post/{}", post_id);
    let (status, _) = server.put(&path, Some(&other.token), json!({ "message": "hijack" })).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = server.put(&path, Some(&owner.token), json!({ "message": "updated" })).await?;
    assert_eq!(status, StatusCode::OK);

    let (status, rotated) = server
        .post("/auth/refresh-token", None, json!({ "refreshToken": owner.refresh_token }))
        .await?;
    assert_eq!(status, StatusCode::OK);
    let new_access = common::field(&rotated, "token")?;
    let new_refresh = common::field(&rotated, "refreshToken")?;

    // The new access token works until the refresh token is replayed
    let (status, _) = server
        .get(&format!("/user/{}", owner.user_id), Some(&new_access))
        .await?;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = server
        .post("/auth/refresh-token", None, json!({ "refreshToken": owner.refresh_token }))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = server
        .post("/auth/refresh-token", None, json!({ "refreshToken": new_refresh }))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // A fresh login starts a new session family
    let (status, _) = server
        .post("/auth/login", None, json!({ "email": "owner@example.com", "password": "secret" }))
        .await?;
    assert_eq!(status, StatusCode::OK);
    Ok(())
}
