#![allow(dead_code)]

use std::process::{Child, Command, Stdio};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde_json::{json, Value};

pub const ADMIN_USERNAME: &str = "itest-admin";
pub const ADMIN_PASSWORD: &str = "itest-admin-password";
pub const JWT_SECRET: &str = "integration-test-secret";

static SERVER: OnceLock<TestServer> = OnceLock::new();

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    child: Child,
}

impl TestServer {
    fn spawn() -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let mut cmd = Command::new(env!("CARGO_BIN_EXE_pob-tracker"));
        cmd.env("PORT", port.to_string())
            .env("HOST", "127.0.0.1")
            .env("APP_ENV", "development")
            .env("JWT_SECRET", JWT_SECRET)
            .env("BOOTSTRAP_ADMIN_USERNAME", ADMIN_USERNAME)
            .env("BOOTSTRAP_ADMIN_PASSWORD", ADMIN_PASSWORD)
            .env("SECURITY_BCRYPT_COST", "4")
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        // DATABASE_URL is inherited from the environment
        let child = cmd.spawn().context("failed to spawn server binary")?;

        Ok(Self { port, base_url, child })
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            if let Ok(resp) = client.get(self.url("/api/health")).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Integration tests need a reachable PostgreSQL; without DATABASE_URL they
/// return early
pub fn database_configured() -> bool {
    let _ = dotenvy::dotenv();
    let configured = std::env::var("DATABASE_URL").is_ok();
    if !configured {
        eprintln!("DATABASE_URL not set; skipping integration test");
    }
    configured
}

pub async fn ensure_server() -> Result<&'static TestServer> {
    let server = SERVER.get_or_init(|| TestServer::spawn().expect("failed to spawn server binary"));
    server.wait_ready(Duration::from_secs(20)).await?;
    Ok(server)
}

/// Username that will not collide across test runs
pub fn unique_username(prefix: &str) -> String {
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!("{}-{}", prefix, &suffix[..10])
}

/// Parse a response body and hand back `(status, body)`
pub async fn read(res: reqwest::Response) -> Result<(StatusCode, Value)> {
    let status = res.status();
    let body = res.json::<Value>().await.context("response was not JSON")?;
    Ok((status, body))
}

pub async fn login(server: &TestServer, username: &str, password: &str) -> Result<String> {
    let res = reqwest::Client::new()
        .post(server.url("/api/users/login"))
        .json(&json!({ "username": username, "password": password }))
        .send()
        .await?;
    let (status, body) = read(res).await?;
    anyhow::ensure!(status == StatusCode::OK, "login failed: {} {}", status, body);
    body["data"]["token"]
        .as_str()
        .map(str::to_string)
        .context("login response had no token")
}

pub async fn admin_token(server: &TestServer) -> Result<String> {
    login(server, ADMIN_USERNAME, ADMIN_PASSWORD).await
}

/// Register a fresh non-admin account, returning `(username, token)`
pub async fn register_user(server: &TestServer, prefix: &str, password: &str) -> Result<(String, String)> {
    let username = unique_username(prefix);
    let res = reqwest::Client::new()
        .post(server.url("/api/users/register"))
        .json(&json!({
            "username": username,
            "password": password,
            "firstName": "Test",
            "lastName": "Crew",
            "location": "Main Base"
        }))
        .send()
        .await?;
    let (status, body) = read(res).await?;
    anyhow::ensure!(status == StatusCode::CREATED, "register failed: {} {}", status, body);
    let token = body["data"]["token"]
        .as_str()
        .map(str::to_string)
        .context("register response had no token")?;
    Ok((username, token))
}
