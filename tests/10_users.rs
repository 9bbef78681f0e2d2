mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::json;

#[tokio::test]
async fn register_login_and_profile_never_expose_password() -> Result<()> {
    if !common::database_configured() {
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let (username, register_token) = common::register_user(server, "crew", "s3cret-pass").await?;
    let token = common::login(server, &username, "s3cret-pass").await?;
    assert_ne!(register_token, token);

    let res = client
        .get(server.url("/api/users/me"))
        .bearer_auth(&token)
        .send()
        .await?;
    let text = res.text().await?;
    assert!(!text.contains("s3cret-pass"), "plaintext password leaked: {}", text);
    assert!(!text.to_lowercase().contains("password"), "password field leaked: {}", text);

    let body: serde_json::Value = serde_json::from_str(&text)?;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["username"], username.as_str());
    assert_eq!(body["data"]["isAdmin"], false);
    assert!(body["data"]["lastLogin"].is_string());

    Ok(())
}

#[tokio::test]
async fn duplicate_username_and_bad_credentials() -> Result<()> {
    if !common::database_configured() {
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let (username, _) = common::register_user(server, "dup", "first-pass").await?;

    let res = client
        .post(server.url("/api/users/register"))
        .json(&json!({
            "username": username,
            "password": "second-pass",
            "firstName": "Second",
            "lastName": "Person"
        }))
        .send()
        .await?;
    let (status, body) = common::read(res).await?;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "Username already exists");

    let res = client
        .post(server.url("/api/users/login"))
        .json(&json!({ "username": username, "password": "wrong-pass" }))
        .send()
        .await?;
    let (status, body) = common::read(res).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid username or password");

    let res = client
        .post(server.url("/api/users/register"))
        .json(&json!({ "username": "x", "password": "abcdef", "firstName": "A", "lastName": "B" }))
        .send()
        .await?;
    let (status, body) = common::read(res).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["field_errors"]["username"].is_string());

    Ok(())
}

#[tokio::test]
async fn logout_revokes_only_the_presented_token() -> Result<()> {
    if !common::database_configured() {
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let (username, first) = common::register_user(server, "logout", "logout-pass").await?;
    let second = common::login(server, &username, "logout-pass").await?;

    let res = client
        .post(server.url("/api/users/logout"))
        .bearer_auth(&first)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let res = client.get(server.url("/api/users/me")).bearer_auth(&first).send().await?;
    let (status, body) = common::read(res).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "INVALID_TOKEN");

    let res = client.get(server.url("/api/users/me")).bearer_auth(&second).send().await?;
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .post(server.url("/api/users/logout-all"))
        .bearer_auth(&second)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let res = client.get(server.url("/api/users/me")).bearer_auth(&second).send().await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    Ok(())
}

#[tokio::test]
async fn admin_routes_are_gated() -> Result<()> {
    if !common::database_configured() {
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client.get(server.url("/api/users")).send().await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let (_, token) = common::register_user(server, "plain", "plain-pass").await?;
    let res = client.get(server.url("/api/users")).bearer_auth(&token).send().await?;
    let (status, body) = common::read(res).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "FORBIDDEN");

    let admin = common::admin_token(server).await?;
    let res = client.get(server.url("/api/users")).bearer_auth(&admin).send().await?;
    let (status, body) = common::read(res).await?;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"].as_array().is_some_and(|users| !users.is_empty()));

    Ok(())
}

#[tokio::test]
async fn admin_cannot_delete_self() -> Result<()> {
    if !common::database_configured() {
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let admin = common::admin_token(server).await?;
    let res = client.get(server.url("/api/users/me")).bearer_auth(&admin).send().await?;
    let (_, me) = common::read(res).await?;
    let id = me["data"]["id"].as_str().unwrap_or_default().to_string();

    let res = client
        .delete(server.url(&format!("/api/users/{}", id)))
        .bearer_auth(&admin)
        .send()
        .await?;
    let (status, body) = common::read(res).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Cannot delete your own account");

    Ok(())
}

#[tokio::test]
async fn password_change_requires_current_password() -> Result<()> {
    if !common::database_configured() {
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let (username, token) = common::register_user(server, "pwchange", "old-password").await?;

    let res = client
        .put(server.url("/api/users/me"))
        .bearer_auth(&token)
        .json(&json!({ "password": "new-password" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = client
        .put(server.url("/api/users/me"))
        .bearer_auth(&token)
        .json(&json!({ "password": "new-password", "currentPassword": "old-password", "location": "Heliport" }))
        .send()
        .await?;
    let (status, body) = common::read(res).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["location"], "Heliport");

    common::login(server, &username, "new-password").await?;
    Ok(())
}

#[tokio::test]
async fn password_reset_flow() -> Result<()> {
    if !common::database_configured() {
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let (username, old_token) = common::register_user(server, "reset", "before-reset").await?;

    let res = client
        .post(server.url("/api/users/password/forgot"))
        .json(&json!({ "username": username }))
        .send()
        .await?;
    let (status, body) = common::read(res).await?;
    assert_eq!(status, StatusCode::OK);
    // Development mode echoes the token back
    let reset_token = body["data"]["resetToken"].as_str().unwrap_or_default().to_string();
    assert!(!reset_token.is_empty(), "no reset token in {}", body);

    let res = client
        .post(server.url("/api/users/password/reset"))
        .json(&json!({ "token": reset_token, "password": "after-reset" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    // Tokens are single use and old sessions are revoked
    let res = client
        .post(server.url("/api/users/password/reset"))
        .json(&json!({ "token": reset_token, "password": "again-reset" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = client.get(server.url("/api/users/me")).bearer_auth(&old_token).send().await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    common::login(server, &username, "after-reset").await?;
    Ok(())
}
