use simple_twitter_api::{
    AppState,
    config::{AppConfig, Env},
    create_router,
    repository::{PostgresRepository, RepositoryState},
    uploads::{LocalUploadService, UploadService, UploadState},
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// Loads configuration, sets up logging, connects to Postgres, prepares the upload
/// directory and serves the API until Ctrl-C.
#[tokio::main]
async fn main() {
    // .env files are a development convenience; production reads the real environment only.
    if std::env::var("APP_ENV").as_deref() != Ok("production") {
        dotenv::dotenv().ok();
    }

    // Fail fast: logging is not up yet, so report straight to stderr.
    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("FATAL: invalid configuration: {e}");
            std::process::exit(1);
        }
    };

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "simple_twitter_api=debug,tower_http=info".into());

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

    tracing::info!(
        env = ?config.env,
        denial_status = ?config.denial_status,
        "application starting"
    );
    if config.destroyer_refused() {
        tracing::warn!("ENABLE_DESTROYER_ROUTES is ignored in production");
    }

    let pool = match PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.db_url)
        .await
    {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!(error = %e, "failed to connect to Postgres, check DATABASE_URL");
            std::process::exit(1);
        }
    };
    let repo = Arc::new(PostgresRepository::new(pool)) as RepositoryState;

    let local_uploads = LocalUploadService::new(config.upload_dir.clone());
    if let Err(e) = local_uploads.prepare().await {
        tracing::error!(
            error = %e,
            dir = %config.upload_dir.display(),
            "cannot prepare upload directory"
        );
        std::process::exit(1);
    }
    let uploads = Arc::new(local_uploads) as UploadState;

    let bind_addr = config.bind_addr.clone();
    let app = create_router(AppState {
        repo,
        uploads,
        config,
    });

    let listener = match TcpListener::bind(&bind_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(error = %e, addr = %bind_addr, "failed to bind");
            std::process::exit(1);
        }
    };

    tracing::info!("Listening on {bind_addr}");
    tracing::info!("API Documentation (Swagger UI) available at /swagger-ui");

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!(error = %e, "server terminated");
        std::process::exit(1);
    }
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("shutdown signal received"),
        Err(e) => {
            // Without a signal handler the server runs until killed.
            tracing::warn!(error = %e, "cannot listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    }
}
