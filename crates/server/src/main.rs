use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::info;

use campusdocs_ledger::{CreditProtocol, DownloadGate, ModerationGate};
use campusdocs_server::api::{AppState, UploadPolicy, router};
use campusdocs_server::auth::JwtManager;
use campusdocs_server::config::AppConfig;
use campusdocs_server::error::ServerError;
use campusdocs_server::{blob_factory, state_factory};

/// CampusDocs HTTP server.
#[derive(Parser, Debug)]
#[command(name = "campusdocs-server", about = "HTTP server for the CampusDocs platform")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "campusdocs.toml")]
    config: String,

    /// Override the bind host.
    #[arg(long)]
    host: Option<String>,

    /// Override the bind port.
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing subscriber from RUST_LOG or default to info.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    // Load configuration from TOML file, or use defaults if the file does not exist.
    let config: AppConfig = if Path::new(&cli.config).exists() {
        let contents = std::fs::read_to_string(&cli.config)?;
        toml::from_str(&contents)?
    } else {
        info!(path = %cli.config, "config file not found, using defaults");
        AppConfig::default()
    };

    // The signing secret is required; the environment wins over the file.
    let jwt_secret = std::env::var("CAMPUSDOCS_JWT_SECRET")
        .ok()
        .or_else(|| config.auth.jwt_secret.clone())
        .ok_or_else(|| {
            ServerError::Config(
                "JWT secret required: set CAMPUSDOCS_JWT_SECRET or [auth] jwt_secret".to_owned(),
            )
        })?;
    let jwt = Arc::new(JwtManager::new(
        &jwt_secret,
        config.auth.token_expiry_seconds,
    ));

    let store = state_factory::create_record_store(&config.state)?;
    info!(backend = %config.state.backend, "record store initialized");

    let blobs = blob_factory::create_blob_store(&config.blob)?;
    info!(backend = %config.blob.backend, "blob store initialized");

    let protocol = Arc::new(CreditProtocol::new(
        store,
        config.credits.to_protocol_config(),
    ));
    let moderation = Arc::new(ModerationGate::new(
        Arc::clone(&protocol),
        Arc::clone(&blobs),
    ));
    let downloads = Arc::new(DownloadGate::new(
        Arc::clone(&protocol),
        Arc::clone(&blobs),
        Duration::from_secs(config.blob.url_ttl_seconds),
    ));

    let state = AppState {
        protocol,
        moderation,
        downloads,
        blobs,
        upload: Arc::new(UploadPolicy {
            max_bytes: config.blob.max_upload_bytes,
            allowed_content_types: config.blob.allowed_content_types.clone(),
        }),
        jwt,
    };

    let host = cli.host.unwrap_or(config.server.host);
    let port = cli.port.unwrap_or(config.server.port);
    let addr = format!("{host}:{port}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, "campusdocs server listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to install shutdown handler");
        return;
    }
    info!("shutdown signal received");
}
