use std::process::ExitCode;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bookmarket::infrastructure::auth::TokenService;
use bookmarket::infrastructure::{AppState, LocalMediaStorage};
use bookmarket::{config, db, server};

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bookmarket=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = config::Config::from_env();

    let Some(secret) = config.resolved_jwt_secret() else {
        tracing::error!("JWT_SECRET must be set");
        return ExitCode::FAILURE;
    };
    let tokens = TokenService::new(
        secret,
        chrono::Duration::minutes(config.access_token_ttl_minutes),
        chrono::Duration::hours(config.refresh_token_ttl_hours),
    );

    // Initialize database
    let db = match db::init_db(&config.database_url).await {
        Ok(db) => db,
        Err(e) => {
            tracing::error!("Failed to initialize database: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = tokio::fs::create_dir_all(&config.media_root).await {
        tracing::error!(
            "Failed to create media root {}: {}",
            config.media_root.display(),
            e
        );
        return ExitCode::FAILURE;
    }
    let media = Arc::new(LocalMediaStorage::new(config.media_root.clone()));

    let state = AppState::new(db, tokens, media);
    let app = server::build_router(state, &config);

    match server::serve(app, config.port).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
