//! src/main.rs
use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use werewolf_server::config::Config;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env();
    info!(bind = %config.bind_addr, provider = %config.llm.provider, "starting werewolf server");

    werewolf_server::run_on(&config.bind_addr, &config)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?
        .await
        .context("server stopped with an error")?;
    Ok(())
}
