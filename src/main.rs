use dotenvy::dotenv;
use elog_book::{
    api::{self, AppState},
    config::{database, settings},
    errors::Result,
    notify::LogMailer,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; variables may also come from the environment
    dotenv().ok();

    // 3. Settings: config.toml plus environment overrides
    let settings = settings::load_settings()
        .inspect_err(|e| error!("Failed to load settings: {}", e))?;

    // 4. Database
    let db = database::create_connection()
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    database::create_tables(&db).await?;

    // 5. Serve
    let listener = TcpListener::bind(&settings.server.bind_addr).await?;
    info!("Listening on {}", listener.local_addr()?);

    let mailer = Arc::new(LogMailer::new(settings.email.from.clone()));
    let app = api::router(AppState::new(db, settings, mailer));
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
    }
}
