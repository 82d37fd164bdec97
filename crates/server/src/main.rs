//! SGX collateral gateway binary.

use anyhow::{Context, Result};
use clap::Parser;
use figment::Figment;
use figment::providers::{Env, Format, Toml};
use pccs_core::config::AppConfig;
use pccs_metadata::MetadataStore;
use pccs_server::services::{CachingCollateralService, PcsClient};
use pccs_server::{AppState, StartupGate, create_router};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// pccsd - a caching gateway for SGX certification collateral
#[derive(Parser, Debug)]
#[command(name = "pccsd")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, env = "PCCS_CONFIG", default_value = "config/pccs.toml")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("pccsd v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config(&args)?;
    config
        .validate()
        .map_err(anyhow::Error::msg)
        .context("invalid configuration")?;

    // Open the cache database
    let store = pccs_metadata::open(&config.metadata)
        .await
        .context("failed to open cache database")?;
    tracing::info!(path = %config.metadata.path.display(), "Cache database opened");

    // Nothing is served until the gate passes.
    let startup = StartupGate::new(&config, &store)
        .check_and_initialize()
        .await
        .context("startup check failed")?;
    tracing::info!(
        api_version = %startup.api_version,
        upstream = %startup.server_addr,
        "Startup check passed"
    );

    let metadata: Arc<dyn MetadataStore> = Arc::new(store);
    let pcs = PcsClient::new(&config.upstream).context("failed to create PCS client")?;
    let collateral = Arc::new(CachingCollateralService::new(metadata.clone(), pcs));

    let state = AppState::new(config.clone(), metadata, collateral.clone(), collateral);
    let app = create_router(state);

    // Parse bind address
    let addr: SocketAddr = config.server.bind.parse().context("invalid bind address")?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {}", addr))?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Load configuration (file is optional, env vars can provide/override everything).
fn load_config(args: &Args) -> Result<AppConfig> {
    let config_path = std::path::Path::new(&args.config);
    let mut figment = Figment::new();
    let has_config_file = config_path.exists();

    if has_config_file {
        tracing::info!(config_path = %args.config, "Loading configuration from file");
        figment = figment.merge(Toml::file(&args.config));
    } else {
        tracing::debug!("No config file found at {}", args.config);
    }

    // PCCS_CONFIG only names the file
    let has_env_config =
        std::env::vars().any(|(key, _)| key.starts_with("PCCS_") && key != "PCCS_CONFIG");

    if !has_config_file && !has_env_config {
        anyhow::bail!(
            "No configuration provided.\n\n\
             Provide configuration via one of:\n  \
             1. Config file: pccsd --config /path/to/pccs.toml\n  \
             2. Environment variables: PCCS_UPSTREAM__URI=https://api.trustedservices.intel.com/sgx/certification/v4/ \
             PCCS_UPSTREAM__API_KEY=YOUR_KEY pccsd\n\n\
             See config/pccs.example.toml for example configuration.\n\
             Set PCCS_CONFIG env var to specify a default config file path."
        );
    }

    if !has_config_file {
        tracing::info!("Using environment variables for configuration");
    }

    figment
        .merge(Env::prefixed("PCCS_").split("__"))
        .extract()
        .context("failed to load configuration")
}
