//! Token endpoint integration tests.
//!
//! Drives `/token` and `/api/token` over real HTTP and verifies the issued
//! tokens with the configured secret.

use common::jwt::verify_access_token;
use token_service::config::{API_KEY_VAR, API_SECRET_VAR, SERVER_URL_VAR};
use ts_test_utils::{TestTokenServer, TEST_API_KEY, TEST_API_SECRET, TEST_SERVER_URL};

async fn fetch_json(url: String) -> Result<(u16, serde_json::Value), anyhow::Error> {
    let response = reqwest::get(url).await?;
    let status = response.status().as_u16();
    let body: serde_json::Value = response.json().await?;
    Ok((status, body))
}

#[tokio::test]
async fn test_token_for_named_room_and_identity() -> Result<(), anyhow::Error> {
    let server = TestTokenServer::spawn_configured().await?;

    let (status, body) =
        fetch_json(format!("{}/token?room=room-07&username=alice", server.url())).await?;

    assert_eq!(status, 200);
    assert_eq!(body["url"], TEST_SERVER_URL);

    let token = body["accessToken"]
        .as_str()
        .ok_or_else(|| anyhow::anyhow!("accessToken missing"))?;
    let claims = verify_access_token(token, TEST_API_KEY, &TestTokenServer::test_secret())?;

    assert_eq!(claims.sub, "alice");
    assert_eq!(claims.video.room.as_deref(), Some("room-07"));
    assert_eq!(claims.video.room_join, Some(true));
    assert_eq!(claims.video.can_publish, Some(true));
    assert_eq!(claims.video.can_subscribe, Some(true));
    assert!(!claims.video.has_admin_grants());

    Ok(())
}

#[tokio::test]
async fn test_token_without_username_gets_guest_identity() -> Result<(), anyhow::Error> {
    let server = TestTokenServer::spawn_configured().await?;

    let (status, body) = fetch_json(format!("{}/api/token?room=room-01", server.url())).await?;

    assert_eq!(status, 200);
    let token = body["accessToken"]
        .as_str()
        .ok_or_else(|| anyhow::anyhow!("accessToken missing"))?;
    let claims = verify_access_token(token, TEST_API_KEY, &TestTokenServer::test_secret())?;

    let suffix = claims
        .sub
        .strip_prefix("user-")
        .ok_or_else(|| anyhow::anyhow!("unexpected identity {}", claims.sub))?;
    let number: u32 = suffix.parse()?;
    assert!(number < 10_000);
    assert_eq!(claims.video.room.as_deref(), Some("room-01"));

    Ok(())
}

#[tokio::test]
async fn test_token_without_room_uses_default_room() -> Result<(), anyhow::Error> {
    let server = TestTokenServer::spawn_configured().await?;

    let (status, body) = fetch_json(format!("{}/token", server.url())).await?;

    assert_eq!(status, 200);
    let token = body["accessToken"]
        .as_str()
        .ok_or_else(|| anyhow::anyhow!("accessToken missing"))?;
    let claims = verify_access_token(token, TEST_API_KEY, &TestTokenServer::test_secret())?;
    assert_eq!(claims.video.room.as_deref(), Some("room-01"));

    Ok(())
}

#[tokio::test]
async fn test_repeated_requests_get_fresh_tokens() -> Result<(), anyhow::Error> {
    let server = TestTokenServer::spawn_configured().await?;
    let url = format!("{}/token?room=room-01&username=bob", server.url());

    let (_, first) = fetch_json(url.clone()).await?;
    let (_, second) = fetch_json(url).await?;

    assert_ne!(first["accessToken"], second["accessToken"]);

    Ok(())
}

#[tokio::test]
async fn test_each_missing_secret_fails_closed() -> Result<(), anyhow::Error> {
    let all = [
        (API_KEY_VAR, TEST_API_KEY),
        (API_SECRET_VAR, TEST_API_SECRET),
        (SERVER_URL_VAR, TEST_SERVER_URL),
    ];

    for skip in 0..all.len() {
        let vars: Vec<(&str, &str)> = all
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != skip)
            .map(|(_, kv)| *kv)
            .collect();
        let server = TestTokenServer::spawn(&vars).await?;

        let (status, body) =
            fetch_json(format!("{}/token?room=room-01&username=carol", server.url())).await?;

        assert_eq!(status, 500, "skipped var index {skip}");
        assert_eq!(body["error"], "Missing environment variables");
        assert!(body.get("accessToken").is_none());
        assert!(body.get("url").is_none());
    }

    Ok(())
}

#[tokio::test]
async fn test_empty_secret_counts_as_missing() -> Result<(), anyhow::Error> {
    let server = TestTokenServer::spawn(&[
        (API_KEY_VAR, TEST_API_KEY),
        (API_SECRET_VAR, "   "),
        (SERVER_URL_VAR, TEST_SERVER_URL),
    ])
    .await?;

    let (status, body) = fetch_json(format!("{}/token", server.url())).await?;

    assert_eq!(status, 500);
    assert_eq!(body["error"], "Missing environment variables");

    Ok(())
}

#[tokio::test]
async fn test_token_signed_with_other_secret_is_rejected() -> Result<(), anyhow::Error> {
    let server = TestTokenServer::spawn_configured().await?;

    let (_, body) = fetch_json(format!("{}/token?username=dave", server.url())).await?;
    let token = body["accessToken"]
        .as_str()
        .ok_or_else(|| anyhow::anyhow!("accessToken missing"))?;

    let wrong = common::secret::SecretString::from("a-different-secret-0123456789");
    assert!(verify_access_token(token, TEST_API_KEY, &wrong).is_err());

    Ok(())
}
