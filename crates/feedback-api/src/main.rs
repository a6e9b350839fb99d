mod config;
mod error;
mod routes;

use std::error::Error;

use config::{AppConfig, ConfigError, StoreBackend, CONNECTION_STRING_VAR};
use feedback_core::{EntityStore, FeedbackIntake, MemoryStore, TableServiceClient};
use routes::{app_router, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Only load .env in development; production uses platform-native env injection.
    #[cfg(debug_assertions)]
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("feedback_api=info".parse().expect("valid directive")),
        )
        .init();

    let config = AppConfig::from_env()?;
    tracing::info!("Starting feedback-api with config: {:?}", config);

    match config.store {
        StoreBackend::Table => {
            let connection_string = config
                .storage_connection_string
                .as_deref()
                .ok_or(ConfigError::MissingVar(CONNECTION_STRING_VAR))?;
            let client = TableServiceClient::from_connection_string(
                connection_string,
                config.store_timeout,
            )?;
            tracing::info!(
                table_endpoint = client.connection().table_endpoint(),
                "Using table storage"
            );
            serve(&config, client).await
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store; feedback is lost on restart");
            serve(&config, MemoryStore::new()).await
        }
    }
}

async fn serve<S: EntityStore>(config: &AppConfig, store: S) -> Result<(), Box<dyn Error>> {
    let router = app_router(AppState::new(FeedbackIntake::new(store)));

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("feedback-api listening on {}", config.bind_addr);
    axum::serve(listener, router).await?;
    Ok(())
}
