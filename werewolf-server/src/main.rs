//! src/main.rs
use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use werewolf_server::config::ServerConfig;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cfg = ServerConfig::parse();
    let server = werewolf_server::run_on(&cfg.bind)
        .await
        .with_context(|| format!("bind {}", cfg.bind))?;
    server.await.context("server exited")?;
    Ok(())
}
