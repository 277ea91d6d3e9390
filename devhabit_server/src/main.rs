use anyhow::{Context, Result};
use clap::Parser;
use devhabit_lib::Db;
use devhabit_server::{router, AppState, Config};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::parse();

    let filter = config.log_filter().context("invalid log filter")?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let db = Db::open(&config.database)
        .with_context(|| format!("opening database {}", config.database.display()))?;
    db.init().context("initializing schema")?;

    let state = AppState::new(db, config.public_url.clone())?;
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("binding {}", config.bind))?;
    tracing::info!(
        "DevHabit listening on {} (links under {})",
        config.bind,
        config.public_url
    );
    axum::serve(listener, app).await?;

    Ok(())
}
