//! MCP identity bridge
//!
//! Main entry point: initializes tracing, loads configuration, and serves
//! the bridge until the process is stopped.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use mcp_identity_bridge::cli::Cli;
use mcp_identity_bridge::config::Config;
use mcp_identity_bridge::identity::http::HttpIdentityClient;
use mcp_identity_bridge::identity::IdentityService;
use mcp_identity_bridge::server::{build_router, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments first so --verbose can shape tracing.
    let cli = Cli::parse_args();

    init_tracing(cli.verbose);

    // Load and validate configuration.
    let config_path = cli.config.as_deref().unwrap_or("config/config.yaml");
    let config = Config::load(config_path, &cli)?;
    config.validate()?;

    let identity_base = url::Url::parse(&config.identity.base_url)?;
    let identity: Arc<dyn IdentityService> = Arc::new(HttpIdentityClient::new(
        identity_base,
        Duration::from_secs(config.identity.timeout_seconds),
    ));

    let app = build_router(AppState::new(identity), &config.server.endpoint);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(
        "listening on {} (endpoint {}, identity {})",
        addr,
        config.server.endpoint,
        config.identity.base_url
    );

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize tracing subscriber with environment filter
fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "mcp_identity_bridge=debug"
    } else {
        "mcp_identity_bridge=info"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
