use anyhow::{Context, Result};
use draft_assistant::web::{router, AppState};
use draft_assistant::{AppConfig, CachedFeed, DataFeed, Database, LiveFeed};
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt::init();

    let config = AppConfig::load()?;
    let db = Database::open(&config.db_path)?;
    db.seed_team_slots(config.league_size)?;

    let live = LiveFeed::new()?;
    let feed: Arc<dyn DataFeed> = if config.use_cache {
        info!("Reusing cached source data from {}", config.cache_dir.display());
        Arc::new(CachedFeed::new(
            live,
            &config.cache_dir,
            config.data_ttl,
            config.news_ttl,
        ))
    } else {
        Arc::new(live)
    };

    let addr = config.socket_addr()?;
    let app = router(AppState::new(Arc::new(db), feed, config));

    println!("Starting draft assistant at http://{}", addr);
    println!("Press Ctrl+C to stop\n");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
