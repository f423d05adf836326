use item_service::{
    AppState,
    config::{AppConfig, Env},
    create_router,
    credentials::FileCredentialStore,
    repository::ItemRepository,
    storage::{self, JsonFileStorage},
    token::TokenService,
};
use std::process::ExitCode;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// Loads configuration, sets up logging, prepares the data directory, wires the core
/// components into the shared state and serves HTTP.
#[tokio::main]
async fn main() -> ExitCode {
    // 1. Configuration & Environment Loading (Fail-Fast)
    dotenv::dotenv().ok();
    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("FATAL: invalid configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    // 2. Logging Filter Setup
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "item_service=debug,tower_http=info,axum=trace".into());

    // 3. Pretty output locally, JSON for log aggregation in production.
    match config.env {
        Env::Local => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("Application starting in {:?} mode", config.env);

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "server stopped");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    // 4. Data Directory (seed files are only written when missing)
    let items_path = config.items_path();
    let users_path = config.users_path();
    storage::init_data_dir(&config.data_dir, &items_path, &users_path).await?;

    // 5. Core Components
    let items = ItemRepository::open(Arc::new(JsonFileStorage::new(items_path))).await?;
    tracing::info!(count = items.list().await.len(), "item collection loaded");

    let app_state = AppState {
        items: Arc::new(items),
        credentials: Arc::new(FileCredentialStore::new(users_path)),
        tokens: Arc::new(TokenService::from_secret(&config.jwt_secret)),
        config: config.clone(),
    };

    // 6. Router and Server Startup
    let app = create_router(app_state);
    let listener = TcpListener::bind(&config.bind_addr).await?;

    tracing::info!("Listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}
