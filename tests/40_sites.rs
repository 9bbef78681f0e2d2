mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

async fn initialize(client: &reqwest::Client, server: &common::TestServer) -> Result<Value> {
    let res = client.post(server.url("/api/sites/initialize")).send().await?;
    let (status, body) = common::read(res).await?;
    anyhow::ensure!(status == StatusCode::OK, "initialize failed: {} {}", status, body);
    Ok(body["data"].clone())
}

#[tokio::test]
async fn initialization_is_idempotent() -> Result<()> {
    if !common::database_configured() {
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    initialize(&client, server).await?;

    let res = client
        .put(server.url("/api/sites/Heliport/pob"))
        .json(&json!({ "currentPOB": 7 }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let second = initialize(&client, server).await?;
    assert_eq!(second["created"], 0);

    let res = client.get(server.url("/api/sites/Heliport")).send().await?;
    let (_, body) = common::read(res).await?;
    assert_eq!(body["data"]["currentPOB"], 7);

    Ok(())
}

#[tokio::test]
async fn pob_upsert_inserts_then_updates() -> Result<()> {
    if !common::database_configured() {
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();
    let site = common::unique_username("rig");

    let res = client.get(server.url(&format!("/api/sites/{}", site))).send().await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = client
        .put(server.url(&format!("/api/sites/{}/pob", site)))
        .json(&json!({ "currentPOB": "12" }))
        .send()
        .await?;
    let (status, body) = common::read(res).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["currentPOB"], 12);
    assert_eq!(body["data"]["maximumPOB"], 150);
    let first_update = body["data"]["lastPOBUpdate"].clone();
    assert!(first_update.is_string());

    // Only the maximum: current and its timestamp are kept
    let res = client
        .put(server.url(&format!("/api/sites/{}", site)))
        .json(&json!({ "maximumPOB": 40 }))
        .send()
        .await?;
    let (_, body) = common::read(res).await?;
    assert_eq!(body["data"]["currentPOB"], 12);
    assert_eq!(body["data"]["maximumPOB"], 40);
    assert_eq!(body["data"]["lastPOBUpdate"], first_update);

    let res = client
        .put(server.url(&format!("/api/sites/{}/pob", site)))
        .json(&json!({ "maximumPOB": 50 }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = client
        .put(server.url(&format!("/api/sites/{}/pob", site)))
        .json(&json!({ "currentPOB": -3 }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    Ok(())
}
