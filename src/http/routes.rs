use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::extract::{Query, State};
use axum::http::header::{HeaderName, AUTHORIZATION};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use serde::{Deserialize, Serialize};

use crate::dashboard::DashboardView;
use crate::engine::core::{InspectionHandle, RunTrigger};
use crate::error::{ErrorCode, InspectionError};
use crate::inspection::RunResult;
use crate::telemetry::TelemetrySnapshot;

use super::sse;

/// Shared application state for HTTP handlers.
#[derive(Clone)]
pub struct DebugHttpState {
    pub handle: Arc<InspectionHandle>,
    token: Arc<String>,
}

impl DebugHttpState {
    pub fn new(handle: Arc<InspectionHandle>, token: String) -> Self {
        Self {
            handle,
            token: Arc::new(token),
        }
    }

    fn authorize(
        &self,
        headers: &HeaderMap,
        query_token: Option<&str>,
    ) -> Result<(), HttpServerError> {
        let provided = extract_token(headers, query_token);
        match provided {
            Some(value) if value == *self.token => Ok(()),
            _ => Err(HttpServerError::Unauthorized),
        }
    }
}

/// Query payload for extracting token from URL.
#[derive(Debug, Default, Deserialize)]
pub struct AuthQuery {
    pub token: Option<String>,
}

/// HTTP error variants mapped to JSON responses.
#[derive(Debug)]
pub enum HttpServerError {
    Unauthorized,
    Conflict(InspectionError),
    Internal(String),
}

impl IntoResponse for HttpServerError {
    fn into_response(self) -> Response {
        let (status, message, code) = match self {
            Self::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "missing or invalid token".to_string(),
                None,
            ),
            Self::Conflict(err) => (StatusCode::CONFLICT, err.message(), Some(err.code())),
            Self::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg, None),
        };

        (
            status,
            Json(serde_json::json!({ "error": message, "code": code })),
        )
            .into_response()
    }
}

impl From<InspectionError> for HttpServerError {
    fn from(err: InspectionError) -> Self {
        match err {
            InspectionError::AlreadyRunning | InspectionError::NotRunning => Self::Conflict(err),
            other => Self::Internal(other.message()),
        }
    }
}

/// Health endpoint response payload.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub running: bool,
    pub uptime_ms: u64,
    pub model_url: String,
}

/// Status endpoint response payload.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub running: bool,
    pub view: DashboardView,
    pub last_updated: String,
    pub result: Option<RunResult>,
    pub diagnostics: TelemetrySnapshot,
}

/// Trigger acknowledgement payload.
#[derive(Debug, Serialize)]
pub struct TriggerAck {
    pub accepted: bool,
    pub trigger: Option<RunTrigger>,
}

/// Build the Axum router with all handlers.
pub fn build_router(state: DebugHttpState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/status", get(status))
        .route("/inspect", post(inspect))
        .route("/recheck", post(recheck))
        .route("/cancel", post(cancel))
        .route("/events", get(events))
        .with_state(state)
}

/// Run the HTTP server loop.
pub async fn run_http_server(state: DebugHttpState, addr: SocketAddr) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("binding debug HTTP listener")?;
    log::info!("[HTTP] Debug server listening on {}", addr);
    let router = build_router(state);
    axum::serve(listener, router)
        .await
        .context("serving debug HTTP router")?;
    Ok(())
}

pub async fn health(
    State(state): State<DebugHttpState>,
    Query(query): Query<AuthQuery>,
    headers: HeaderMap,
) -> Result<Json<HealthResponse>, HttpServerError> {
    state.authorize(&headers, query.token.as_deref())?;

    Ok(Json(HealthResponse {
        status: "ok",
        running: state.handle.is_running(),
        uptime_ms: state.handle.uptime_ms(),
        model_url: state.handle.config().model.model_url.clone(),
    }))
}

pub async fn status(
    State(state): State<DebugHttpState>,
    Query(query): Query<AuthQuery>,
    headers: HeaderMap,
) -> Result<Json<StatusResponse>, HttpServerError> {
    state.authorize(&headers, query.token.as_deref())?;

    let view = state.handle.latest_view();
    Ok(Json(StatusResponse {
        running: state.handle.is_running(),
        last_updated: view.last_updated_label(),
        view,
        result: state.handle.latest_result(),
        diagnostics: state.handle.telemetry_snapshot(),
    }))
}

pub async fn inspect(
    State(state): State<DebugHttpState>,
    Query(query): Query<AuthQuery>,
    headers: HeaderMap,
) -> Result<(StatusCode, Json<TriggerAck>), HttpServerError> {
    state.authorize(&headers, query.token.as_deref())?;
    trigger(&state, RunTrigger::Start)
}

pub async fn recheck(
    State(state): State<DebugHttpState>,
    Query(query): Query<AuthQuery>,
    headers: HeaderMap,
) -> Result<(StatusCode, Json<TriggerAck>), HttpServerError> {
    state.authorize(&headers, query.token.as_deref())?;
    trigger(&state, RunTrigger::Recheck)
}

pub async fn cancel(
    State(state): State<DebugHttpState>,
    Query(query): Query<AuthQuery>,
    headers: HeaderMap,
) -> Result<Json<TriggerAck>, HttpServerError> {
    state.authorize(&headers, query.token.as_deref())?;
    state.handle.cancel()?;
    Ok(Json(TriggerAck {
        accepted: true,
        trigger: None,
    }))
}

pub async fn events(
    State(state): State<DebugHttpState>,
    Query(query): Query<AuthQuery>,
    headers: HeaderMap,
) -> Result<sse::EventStream, HttpServerError> {
    state.authorize(&headers, query.token.as_deref())?;
    Ok(sse::inspection_events(&state.handle))
}

fn trigger(
    state: &DebugHttpState,
    trigger: RunTrigger,
) -> Result<(StatusCode, Json<TriggerAck>), HttpServerError> {
    // The run outcome is observable through /status and /events.
    let _join = state.handle.spawn_run(trigger)?;
    Ok((
        StatusCode::ACCEPTED,
        Json(TriggerAck {
            accepted: true,
            trigger: Some(trigger),
        }),
    ))
}

fn extract_token(headers: &HeaderMap, query_token: Option<&str>) -> Option<String> {
    if let Some(token) = query_token {
        return Some(token.to_string());
    }

    static X_DEBUG_TOKEN: HeaderName = HeaderName::from_static("x-debug-token");

    headers
        .get(&X_DEBUG_TOKEN)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_string())
        .or_else(|| {
            headers
                .get(AUTHORIZATION)
                .and_then(|value| value.to_str().ok())
                .and_then(|raw| raw.strip_prefix("Bearer ").map(|v| v.to_string()))
        })
}
