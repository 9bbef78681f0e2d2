mod common;

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde_json::json;

#[tokio::test]
async fn deleting_a_passenger_removes_its_trips() -> Result<()> {
    if !common::database_configured() {
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();
    let admin = common::admin_token(server).await?;

    let res = client
        .post(server.url("/api/passengers"))
        .bearer_auth(&admin)
        .json(&json!({ "firstName": "Ana", "lastName": "Silva", "jobRole": "Medic" }))
        .send()
        .await?;
    let (status, body) = common::read(res).await?;
    assert_eq!(status, StatusCode::CREATED);
    let passenger_id = body["data"]["id"].as_str().context("passenger id")?.to_string();

    for day in ["2024-05-01", "2024-05-02", "2024-05-03"] {
        let res = client
            .post(server.url("/api/trips"))
            .json(&json!({
                "passengerId": passenger_id,
                "origin": "Heliport",
                "destination": "Platform Bravo",
                "tripDate": day
            }))
            .send()
            .await?;
        assert_eq!(res.status(), StatusCode::CREATED);
    }

    let res = client
        .delete(server.url(&format!("/api/passengers/{}", passenger_id)))
        .bearer_auth(&admin)
        .send()
        .await?;
    let (status, body) = common::read(res).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["deletedTrips"], 3);

    let res = client
        .get(server.url(&format!("/api/trips/passenger/{}", passenger_id)))
        .send()
        .await?;
    let (_, body) = common::read(res).await?;
    assert_eq!(body["data"].as_array().map(Vec::len), Some(0));

    // Second delete finds nothing and changes nothing
    let res = client
        .delete(server.url(&format!("/api/passengers/{}", passenger_id)))
        .bearer_auth(&admin)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    Ok(())
}

#[tokio::test]
async fn passenger_reads_need_a_token_and_writes_need_admin() -> Result<()> {
    if !common::database_configured() {
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client.get(server.url("/api/passengers")).send().await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let (_, token) = common::register_user(server, "reader", "reader-pass").await?;
    let res = client.get(server.url("/api/passengers")).bearer_auth(&token).send().await?;
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .post(server.url("/api/passengers"))
        .bearer_auth(&token)
        .json(&json!({ "firstName": "Not", "lastName": "Allowed" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = client
        .get(server.url("/api/passengers/not-a-uuid"))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    Ok(())
}

#[tokio::test]
async fn passenger_update_is_partial() -> Result<()> {
    if !common::database_configured() {
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();
    let admin = common::admin_token(server).await?;

    let res = client
        .post(server.url("/api/passengers"))
        .bearer_auth(&admin)
        .json(&json!({ "firstName": "Kim", "lastName": "Osei" }))
        .send()
        .await?;
    let (_, body) = common::read(res).await?;
    let id = body["data"]["id"].as_str().context("passenger id")?.to_string();

    let res = client
        .put(server.url(&format!("/api/passengers/{}", id)))
        .bearer_auth(&admin)
        .json(&json!({ "jobRole": "Crane Operator" }))
        .send()
        .await?;
    let (status, body) = common::read(res).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["firstName"], "Kim");
    assert_eq!(body["data"]["jobRole"], "Crane Operator");

    Ok(())
}
