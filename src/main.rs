use std::net::SocketAddr;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use pob_tracker::auth;
use pob_tracker::config;
use pob_tracker::database::DatabaseManager;
use pob_tracker::services::{NewUser, UserService};

#[derive(Debug, Parser)]
#[command(name = "pob-tracker", version, about = "Personnel transport and POB tracking API")]
struct Args {
    /// Port to listen on (defaults to the configured API port)
    #[arg(short, long, env = "PORT")]
    port: Option<u16>,

    /// Interface to bind
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    host: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so DATABASE_URL and JWT_SECRET are picked up locally
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let config = config::config();
    info!("Starting pob-tracker in {:?} mode", config.environment);

    if config.security.jwt_secret.is_empty() {
        warn!("JWT_SECRET is not set; logins and authenticated routes will fail");
    }
    if pob_tracker::is_production!() && config.security.cors_origins.is_empty() {
        warn!("SECURITY_CORS_ORIGINS is empty; browser clients will be rejected");
    }

    // The pool is also created lazily; connecting here just surfaces problems early
    match DatabaseManager::pool().await {
        Ok(_) => {
            if let Err(e) = ensure_bootstrap_admin().await {
                error!("Failed to provision bootstrap admin: {:#}", e);
            }
        }
        Err(e) => warn!("Database not reachable at startup, will retry on first request: {}", e),
    }

    let port = args.port.unwrap_or(config.api.port);
    let addr: SocketAddr = format!("{}:{}", args.host, port)
        .parse()
        .with_context(|| format!("invalid bind address {}:{}", args.host, port))?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, pob_tracker::app())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    DatabaseManager::close().await;
    info!("Shutdown complete");
    Ok(())
}

/// Make sure the configured bootstrap account exists and is an admin
async fn ensure_bootstrap_admin() -> anyhow::Result<()> {
    let security = &config::config().security;
    let (Some(username), Some(password)) = (
        security.bootstrap_admin_username.as_deref(),
        security.bootstrap_admin_password.as_deref(),
    ) else {
        return Ok(());
    };

    let username = pob_tracker::validation::username(Some(username))?;
    let password = pob_tracker::validation::password("BOOTSTRAP_ADMIN_PASSWORD", Some(password))?;

    let user = UserService::new()
        .await?
        .ensure_admin(NewUser {
            username,
            password_hash: auth::hash_password(&password).await?,
            first_name: "System".to_string(),
            last_name: "Administrator".to_string(),
            location: None,
            is_admin: true,
        })
        .await?;

    info!("Bootstrap admin {} is ready", user.username);
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
