//! Dejavu HTTP REST API
//!
//! Axum-based HTTP server exposing accounts, question submission, and
//! history over HTTP. Runs alongside the Unix socket IPC server on port
//! 8767 (configurable).
//!
//! Architecture: each endpoint has a thin axum handler that delegates to a
//! pure inner function. The inner functions are directly testable without
//! axum dispatch machinery.
//!
//! Endpoints:
//! - GET  /health   — health check with DB status
//! - GET  /version  — server version info
//! - POST /register — create an account
//! - POST /login    — open a session, returns a token
//! - POST /ask      — submit a question (scan + resolve + persist)
//! - POST /history  — the calling user's question history

use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::state::AppState;
use crate::subsystems::{accounts, accounts::AccountError, ask, history};

/// Build the Axum router with all endpoints
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/version", get(version_handler))
        .route("/register", post(register_handler))
        .route("/login", post(login_handler))
        .route("/ask", post(ask_handler))
        .route("/history", post(history_handler))
        .with_state(state)
}

/// Start the HTTP server on the configured address.
/// Gracefully shuts down when the broadcast shutdown signal fires.
pub async fn start_http_server(
    state: Arc<AppState>,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<()> {
    let addr = format!("{}:{}", state.config.http.host, state.config.http.port);

    let app = build_router(Arc::clone(&state));
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Dejavu HTTP API listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown.recv().await;
            tracing::info!("HTTP server shutting down...");
        })
        .await?;

    Ok(())
}

// ============================================================================
// Request DTOs
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub token: Uuid,
    pub question: String,
}

#[derive(Debug, Deserialize)]
pub struct HistoryRequest {
    pub token: Uuid,
}

// ============================================================================
// Inner (directly testable) business logic functions
// ============================================================================

/// Map an account error to its HTTP status.
pub fn account_error_status(e: &AccountError) -> StatusCode {
    match e {
        AccountError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        AccountError::Conflict => StatusCode::CONFLICT,
        AccountError::InvalidCredentials | AccountError::UnknownToken => StatusCode::UNAUTHORIZED,
        AccountError::Auth(_) | AccountError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_body(msg: impl Into<String>) -> serde_json::Value {
    serde_json::json!({
        "error": msg.into(),
        "status": "error",
    })
}

/// Inner health check — queries DB and returns (status_code, json_body).
pub async fn health_inner(state: &AppState) -> (StatusCode, serde_json::Value) {
    let pg_ver = match dejavu_core::db::health_check(&state.pool).await {
        Ok(v) => v,
        Err(e) => {
            return (
                StatusCode::SERVICE_UNAVAILABLE,
                serde_json::json!({
                    "status": "unhealthy",
                    "error": e.to_string(),
                }),
            );
        }
    };

    (
        StatusCode::OK,
        serde_json::json!({
            "status": "healthy",
            "version": env!("CARGO_PKG_VERSION"),
            "postgresql": pg_ver,
            "classifier": state.classifier.name(),
            "generator": state.generator.name(),
            "socket": state.config.service.socket_path,
        }),
    )
}

/// Inner version — returns version info (pure, no IO).
pub fn version_inner() -> serde_json::Value {
    serde_json::json!({
        "version": env!("CARGO_PKG_VERSION"),
        "protocol": "dejavu/1",
    })
}

/// Inner register — validates and creates the account.
pub async fn register_inner(
    state: &AppState,
    req: RegisterRequest,
) -> (StatusCode, serde_json::Value) {
    match accounts::register(&state.pool, &req.username, &req.email, &req.password).await {
        Ok(user) => (
            StatusCode::CREATED,
            serde_json::json!({
                "id": user.id,
                "username": user.username,
                "email": user.email,
            }),
        ),
        Err(e) => (account_error_status(&e), error_body(e.to_string())),
    }
}

/// Inner login — verifies credentials and opens a session.
pub async fn login_inner(state: &AppState, req: LoginRequest) -> (StatusCode, serde_json::Value) {
    match accounts::login(&state.pool, &req.email, &req.password).await {
        Ok(session) => (
            StatusCode::OK,
            serde_json::json!({
                "token": session.token,
                "user_id": session.user_id,
                "username": session.username,
            }),
        ),
        Err(e) => (account_error_status(&e), error_body(e.to_string())),
    }
}

/// Inner ask — authenticates, then runs the submission pipeline.
pub async fn ask_inner(state: &AppState, req: AskRequest) -> (StatusCode, serde_json::Value) {
    if req.question.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            error_body("question field is required"),
        );
    }

    let session = match accounts::authenticate(&state.pool, req.token).await {
        Ok(s) => s,
        Err(e) => return (account_error_status(&e), error_body(e.to_string())),
    };

    let start = Instant::now();

    let outcome = match ask::submit_question(
        &state.pool,
        &session,
        &req.question,
        state.classifier.as_ref(),
        state.generator.as_ref(),
        state.config.generation.max_tokens,
    )
    .await
    {
        Ok(o) => o,
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_body(e.to_string()),
            );
        }
    };

    let took_ms = start.elapsed().as_millis() as u64;

    let mut data = match serde_json::to_value(&outcome) {
        Ok(v) => v,
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_body(e.to_string()),
            );
        }
    };
    if let Some(obj) = data.as_object_mut() {
        obj.insert("took_ms".to_string(), serde_json::json!(took_ms));
    }

    (StatusCode::OK, data)
}

/// Inner history — authenticates, then lists the user's questions.
pub async fn history_inner(
    state: &AppState,
    req: HistoryRequest,
) -> (StatusCode, serde_json::Value) {
    let session = match accounts::authenticate(&state.pool, req.token).await {
        Ok(s) => s,
        Err(e) => return (account_error_status(&e), error_body(e.to_string())),
    };

    match history::list_questions(&state.pool, session.user_id).await {
        Ok(questions) => {
            let count = questions.len();
            (
                StatusCode::OK,
                serde_json::json!({
                    "questions": questions,
                    "count": count,
                }),
            )
        }
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            error_body(e.to_string()),
        ),
    }
}

// ============================================================================
// Axum handler wrappers (thin — delegate to inner functions)
// ============================================================================

pub async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let (status, body) = health_inner(&state).await;
    (status, Json(body))
}

pub async fn version_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(version_inner()))
}

pub async fn register_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> impl IntoResponse {
    let (status, body) = register_inner(&state, req).await;
    (status, Json(body))
}

pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> impl IntoResponse {
    let (status, body) = login_inner(&state, req).await;
    (status, Json(body))
}

pub async fn ask_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AskRequest>,
) -> impl IntoResponse {
    let (status, body) = ask_inner(&state, req).await;
    (status, Json(body))
}

pub async fn history_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<HistoryRequest>,
) -> impl IntoResponse {
    let (status, body) = history_inner(&state, req).await;
    (status, Json(body))
}

// ============================================================================
// Unit Tests — pure pieces only; DB paths live in the integration tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_inner_pure() {
        let v = version_inner();
        assert!(v["version"].is_string(), "version must be string");
        assert_eq!(v["protocol"], "dejavu/1", "protocol must be dejavu/1");
    }

    #[test]
    fn test_account_error_status_mapping() {
        assert_eq!(
            account_error_status(&AccountError::InvalidInput("x".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            account_error_status(&AccountError::Conflict),
            StatusCode::CONFLICT
        );
        assert_eq!(
            account_error_status(&AccountError::InvalidCredentials),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            account_error_status(&AccountError::UnknownToken),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            account_error_status(&AccountError::Database(sqlx::Error::PoolClosed)),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_error_body_shape() {
        let body = error_body("boom");
        assert_eq!(body["error"], "boom");
        assert_eq!(body["status"], "error");
    }
}
