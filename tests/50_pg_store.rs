mod common;

use std::sync::Arc;

use anyhow::Result;
use uuid::Uuid;

use postboard_api::database::models::{NewComment, NewPost, NewUser, User, UserChanges};
use postboard_api::database::{PgStore, Store, StoreError, TokenConsumption};
use postboard_api::error::ApiError;

/// Unique per call so repeated runs against one database never collide
fn new_user() -> NewUser {
    let tag = Uuid::new_v4().simple().to_string();
    NewUser {
        email: format!("{}@example.com", tag),
        username: tag,
        password_hash: "hash".to_string(),
    }
}

async fn user_with_tokens(store: &PgStore, fingerprints: &[&str]) -> Result<User> {
    let user = store.create_user(new_user()).await?;
    for fp in fingerprints {
        assert!(store.push_refresh_token(user.id, fp).await?);
    }
    Ok(user)
}

async fn stored_tokens(store: &PgStore, id: Uuid) -> Result<Vec<String>> {
    let user = store.find_user(id).await?;
    Ok(user.map(|u| u.refresh_tokens).unwrap_or_default())
}

#[tokio::test]
async fn consume_rotates_presented_fingerprint() -> Result<()> {
    let Some(store) = common::pg_store().await? else {
        return Ok(());
    };
    let user = user_with_tokens(&store, &["f1", "f2"]).await?;

    let outcome = store.consume_refresh_token(user.id, "f1", Some("f3")).await?;
    assert_eq!(outcome, TokenConsumption::Consumed);
    assert_eq!(stored_tokens(&store, user.id).await?, vec!["f2", "f3"]);

    let outcome = store.consume_refresh_token(user.id, "f2", None).await?;
    assert_eq!(outcome, TokenConsumption::Consumed);
    assert_eq!(stored_tokens(&store, user.id).await?, vec!["f3"]);
    Ok(())
}

#[tokio::test]
async fn replayed_fingerprint_clears_the_set() -> Result<()> {
    let Some(store) = common::pg_store().await? else {
        return Ok(());
    };
    let user = user_with_tokens(&store, &["f1", "f2"]).await?;

    store.consume_refresh_token(user.id, "f1", Some("f3")).await?;
    let outcome = store.consume_refresh_token(user.id, "f1", Some("f4")).await?;
    assert_eq!(outcome, TokenConsumption::Reused);
    assert!(stored_tokens(&store, user.id).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn consume_for_unknown_user_reports_missing() -> Result<()> {
    let Some(store) = common::pg_store().await? else {
        return Ok(());
    };

    let outcome = store.consume_refresh_token(Uuid::new_v4(), "f1", None).await?;
    assert_eq!(outcome, TokenConsumption::UserMissing);
    assert!(!store.push_refresh_token(Uuid::new_v4(), "f1").await?);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_rotation_consumes_once() -> Result<()> {
    let Some(store) = common::pg_store().await? else {
        return Ok(());
    };
    let store = Arc::new(store);
    let user_id = user_with_tokens(&store, &["shared"]).await?.id;

    let mut handles = Vec::new();
    for i in 0..8 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            let next = format!("next-{}", i);
            store.consume_refresh_token(user_id, "shared", Some(&next)).await
        }));
    }

    let mut consumed = 0;
    for handle in handles {
        if handle.await?? == TokenConsumption::Consumed {
            consumed += 1;
        }
    }
    assert_eq!(consumed, 1);

    // Losers saw the fingerprint already spent and revoked the set
    assert!(stored_tokens(&store, user_id).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn deleting_a_post_cascades_to_comments() -> Result<()> {
    let Some(store) = common::pg_store().await? else {
        return Ok(());
    };
    let sender = Uuid::new_v4();
    let post = store
        .create_post(NewPost { sender, title: None, message: "doomed".into() })
        .await?;
    for _ in 0..2 {
        store
            .create_comment(NewComment { post_id: post.id, sender, message: "hi".into() })
            .await?;
    }

    assert!(store.delete_post(post.id).await?);
    assert!(store.list_comments(Some(post.id)).await?.is_empty());
    assert!(!store.delete_post(post.id).await?);

    let orphan = store
        .create_comment(NewComment { post_id: post.id, sender, message: "late".into() })
        .await;
    assert!(matches!(orphan, Err(StoreError::MissingParent(entity)) if entity == "post"));
    Ok(())
}

#[tokio::test]
async fn unique_violations_name_the_field() -> Result<()> {
    let Some(store) = common::pg_store().await? else {
        return Ok(());
    };
    let first = store.create_user(new_user()).await?;
    let second = store.create_user(new_user()).await?;

    let mut dup = new_user();
    dup.email = first.email.clone();
    let err = match store.create_user(dup).await {
        Err(err) => err,
        Ok(user) => anyhow::bail!("duplicate email accepted: {}", user.id),
    };
    assert!(matches!(&err, StoreError::Conflict(field) if field == "email"));
    assert_eq!(ApiError::from(err).message(), "Value for email is already taken");

    let clash = store
        .update_user(
            second.id,
            UserChanges { username: Some(first.username.clone()), ..Default::default() },
        )
        .await;
    assert!(matches!(clash, Err(StoreError::Conflict(field)) if field == "username"));
    Ok(())
}
