use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use postboard_api::config::{AppConfig, Environment};
use postboard_api::database::open_store;
use postboard_api::state::AppState;

#[derive(Parser, Debug)]
#[command(name = "postboard-api")]
#[command(about = "Social posting REST backend")]
#[command(version)]
struct Cli {
    #[arg(long, help = "Port to listen on (overrides PORT)")]
    port: Option<u16>,

    #[arg(long, help = "Use the in-memory store even if DATABASE_URL is set")]
    in_memory: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let mut config = AppConfig::from_env();
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    tracing::info!("Starting postboard-api in {:?} mode", config.environment);

    if config.uses_default_secret() {
        if config.environment == Environment::Production {
            tracing::error!("JWT_SECRET not set in production; tokens are signed with the built-in fallback");
        } else {
            tracing::warn!("JWT_SECRET not set; using the built-in fallback secret");
        }
    }

    let store = open_store(&config.database, cli.in_memory)
        .await
        .context("failed to open store")?;

    let bind_addr = config.bind_addr();
    let app = postboard_api::app(AppState::new(config, store));

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Listening on http://{}", bind_addr);
    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}
