use anyhow::Result;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use gallery_api::{AppState, Settings, create_router};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging, RUST_LOG overrides the default level
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting gallery API service");

    let settings = Settings::from_env()?;
    let app_state = AppState::from_settings(&settings).await?;

    info!("Gallery API service initialized successfully");

    // Start the web server
    let app = create_router(app_state);

    let address = settings.address();
    let listener = TcpListener::bind(&address).await?;
    info!("Gallery API service listening on {}", address);

    axum::serve(listener, app).await?;

    Ok(())
}
