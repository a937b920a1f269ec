use std::sync::Arc;

use axum::http::{HeaderValue, Method};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use rentacar::config::AppConfig;
use rentacar::db;
use rentacar::routes;
use rentacar::services::session::AdminCredentials;
use rentacar::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let conn = db::init_db(&config.database_url)?;

    let credentials = AdminCredentials::new(
        &config.admin_username,
        &config.admin_password_hash,
        bcrypt::DEFAULT_COST,
    )?;
    if !credentials.is_configured() {
        tracing::warn!("ADMIN_USERNAME or ADMIN_PASSWORD_HASH not set; admin login disabled");
    }
    if config.session_secret.is_empty() {
        tracing::warn!("SESSION_SECRET not set; admin sessions cannot be issued");
    }

    let cors = match &config.cors_origin {
        Some(origin) => CorsLayer::new()
            .allow_origin(origin.parse::<HeaderValue>()?)
            .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
            .allow_headers(Any),
        None => CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
    };

    let state = Arc::new(AppState::new(conn, config.clone(), credentials));

    let app = routes::router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
