//! CampaignBrain API server binary.
//!
//! Usage:
//!   campaign-brain --config config.toml
//!   campaign-brain --port 8000 --bind 0.0.0.0
//!   campaign-brain --bind ::1
//!
//! # Environment Variables
//!
//! - `BRAIN_API_KEY` - Bearer key required on every route except `/health`
//! - `BRAIN_BIND_ADDR` - Server bind address (default: 127.0.0.1)
//! - `BRAIN_CORS_ORIGINS` - CORS allowed origins (comma-separated)
//! - `OPENAI_API_KEY` / `ANTHROPIC_API_KEY` - Provider key when not in the config file

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;

use brain_api::{ApiKeyConfig, AppState, serve};
use brain_coordinator::CoordinatorConfig;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "campaign-brain")]
#[command(version, about = "Multi-agent business Q&A server")]
struct Cli {
    /// Path to config.toml
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Port to listen on
    #[arg(short, long, default_value_t = 8000)]
    port: u16,

    /// Bind address (IPv4 or IPv6)
    #[arg(short, long, env = "BRAIN_BIND_ADDR", default_value = "127.0.0.1")]
    bind: String,

    /// Bearer key for API authentication
    #[arg(long, env = "BRAIN_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Allowed CORS origins; permissive when empty
    #[arg(long, env = "BRAIN_CORS_ORIGINS", value_delimiter = ',')]
    cors_origins: Vec<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,brain_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let addr = bind_address(&cli.bind, cli.port)?;
    if addr.ip().is_unspecified() {
        tracing::warn!(
            %addr,
            "Server binding to an unspecified address exposes the API on all interfaces. \
             Set BRAIN_API_KEY and put a firewall in front of it."
        );
    }

    let config = match &cli.config {
        Some(path) => {
            tracing::info!(path = %path.display(), "Loading configuration");
            CoordinatorConfig::from_file(path)?
        }
        None => {
            tracing::info!("Using default configuration");
            CoordinatorConfig::default()
        }
    };

    let mut state = AppState::from_config(config)?;
    match cli.api_key.filter(|k| !k.trim().is_empty()) {
        Some(key) => {
            state = state.with_api_key(ApiKeyConfig::new(key));
            tracing::info!("API key authentication enabled");
        }
        None => tracing::warn!(
            "BRAIN_API_KEY not set; the API runs without authentication. \
             Fine for local development, not for production."
        ),
    }

    let cors_origins: Vec<String> = cli
        .cors_origins
        .into_iter()
        .map(|o| o.trim().to_string())
        .filter(|o| !o.is_empty())
        .collect();
    let cors_origins = (!cors_origins.is_empty()).then_some(cors_origins);

    serve(Arc::new(state), addr, cors_origins).await?;

    Ok(())
}

fn bind_address(bind: &str, port: u16) -> anyhow::Result<SocketAddr> {
    let ip: IpAddr = bind
        .trim()
        .trim_start_matches('[')
        .trim_end_matches(']')
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid bind address '{bind}': {e}"))?;
    Ok(SocketAddr::new(ip, port))
}
