//! Hainan Weather Service - Backend Server
//!
//! Keeps weather snapshots and weather alerts for Hainan locations in sync
//! with QWeather on a schedule, with a manual trigger over HTTP.

use std::{sync::Arc, time::Duration};

use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hws_backend::{
    create_app,
    external::QWeatherClient,
    scheduler,
    services::{
        AlertNormalizer, DeduplicationGate, PgAlertStore, PgLocationStore, PgWeatherStore,
        SyncService,
    },
    AppState, Config,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "hws_server=debug,hws_backend=debug,tower_http=debug,sqlx=warn".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::load()?;

    tracing::info!("Starting Hainan Weather Service");
    tracing::info!("Environment: {}", config.environment);

    // Create database connection pool
    tracing::info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .acquire_timeout(Duration::from_secs(30))
        .connect(&config.database.url)
        .await?;

    tracing::info!("Database connection established");

    // Run migrations in development
    if config.environment == "development" {
        tracing::info!("Running database migrations...");
        sqlx::migrate!("./migrations").run(&db_pool).await?;
        tracing::info!("Migrations completed");
    }

    let provider = QWeatherClient::new(&config.qweather)?;
    let sync = Arc::new(SyncService::new(
        Arc::new(provider),
        AlertNormalizer::new(),
        DeduplicationGate::new(),
        Arc::new(PgLocationStore::new(db_pool.clone())),
        Arc::new(PgWeatherStore::new(db_pool.clone())),
        Arc::new(PgAlertStore::new(db_pool.clone())),
    ));

    let jobs = if config.scheduler.enabled {
        Some(scheduler::start_background_jobs(Arc::clone(&sync), &config.scheduler).await?)
    } else {
        tracing::warn!("Background jobs disabled; weather sync runs only on manual trigger");
        None
    };

    let state = AppState {
        db: db_pool,
        config: Arc::new(config.clone()),
        sync,
    };

    let app = create_app(state);

    let addr = config.bind_address();
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(jobs) = jobs {
        jobs.shutdown().await?;
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown signal received");
}
