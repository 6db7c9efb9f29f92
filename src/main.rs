use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use voice_session::relay::{create_router, EchoExecutor, RelayState};
use voice_session::Config;

#[derive(Debug, Parser)]
#[command(name = "voice-session", about = "Voice session relay service")]
struct Args {
    /// Config file base path (without extension)
    #[arg(long, default_value = "config/voice-session")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let cfg = Config::load(&args.config)?;

    info!("{} v{}", cfg.service.name, env!("CARGO_PKG_VERSION"));
    info!("Voice endpoint: {}", cfg.connection.url);

    let state = RelayState::new(Arc::new(EchoExecutor));
    let app = create_router(state);

    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    info!("Relay listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await.context("HTTP server error")?;

    Ok(())
}
