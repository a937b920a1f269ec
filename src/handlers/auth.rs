use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::services::rate_limit::client_key;
use crate::services::session::{self, Session};
use crate::state::AppState;

/// Resolves the bearer token on an admin request.
pub(crate) fn check_auth(headers: &HeaderMap, secret: &str) -> Result<Session, AppError> {
    let token = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .unwrap_or("");

    if token.is_empty() || secret.is_empty() {
        return Err(AppError::Unauthorized);
    }
    session::verify_token(secret, token, Utc::now()).ok_or(AppError::Unauthorized)
}

// POST /api/auth/login
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    #[serde(flatten)]
    pub session: Session,
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, AppError> {
    let client = client_key(&headers);
    state.login_throttle.check(&client).await?;

    let Json(request) = body?;
    if request.username.trim().is_empty() || request.password.is_empty() {
        return Err(AppError::validation(
            "credentials",
            "username and password are required",
        ));
    }

    let LoginRequest { username, password } = request;
    let credentials = Arc::clone(&state.credentials);
    let checked_username = username.clone();
    let valid = tokio::task::spawn_blocking(move || credentials.verify(&checked_username, &password))
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    if !valid || state.config.session_secret.is_empty() {
        tracing::warn!(client = %client, username = %username, "failed admin login");
        return Err(AppError::Unauthorized);
    }

    let now = Utc::now();
    let ttl = Duration::hours(state.config.session_ttl_hours);
    let token = session::issue_token(&state.config.session_secret, &username, ttl, now)
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("could not sign session token")))?;
    let session = session::verify_token(&state.config.session_secret, &token, now)
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("freshly issued token did not verify")))?;

    tracing::info!(username = %session.username, "admin logged in");
    Ok(Json(LoginResponse { token, session }))
}

// GET /api/auth/me
pub async fn me(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Session>, AppError> {
    let session = check_auth(&headers, &state.config.session_secret)?;
    Ok(Json(session))
}
