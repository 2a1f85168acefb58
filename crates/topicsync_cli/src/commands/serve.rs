//! `serve` command: the sync action endpoint and the Discourse webhook.
//!
//! `POST /sync` takes `{action, license?, batchSize?}` and requires the
//! service token as a bearer credential. `POST /webhook` verifies the
//! Discourse signature itself, so it carries no bearer check.

use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::json;
use subtle::ConstantTimeEq;
use tower_http::trace::TraceLayer;

use topicsync::forum::ForumApi;
use topicsync::repository::QuestionStore;
use topicsync::sync::{SyncContext, SyncRequest, SyncRequestBody};
use topicsync::webhook::{
    EVENT_HEADER, EVENT_TYPE_HEADER, SIGNATURE_HEADER, WebhookHeaders, handle_webhook,
};

use crate::commands::shared::build_context;
use crate::config::Config;
use crate::progress::ProgressReporter;

/// Shared state for both routes.
pub(crate) struct AppState<F, S> {
    pub ctx: SyncContext<F, S>,
    pub service_token: String,
    pub webhook_secret: String,
}

/// Build the HTTP router.
pub(crate) fn router<F, S>(state: AppState<F, S>) -> Router
where
    F: ForumApi + 'static,
    S: QuestionStore + 'static,
{
    Router::new()
        .route("/health", get(health))
        .route("/sync", post(sync_action::<F, S>))
        .route("/webhook", post(webhook::<F, S>))
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}

fn error_response(status: u16, message: impl Into<String>) -> Response {
    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(json!({ "error": message.into() }))).into_response()
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn sync_action<F, S>(
    State(state): State<Arc<AppState<F, S>>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response
where
    F: ForumApi + 'static,
    S: QuestionStore + 'static,
{
    let authorized = bearer_token(&headers).is_some_and(|token| {
        bool::from(token.as_bytes().ct_eq(state.service_token.as_bytes()))
    });
    if !authorized {
        return error_response(401, "Unauthorized");
    }

    let request = match serde_json::from_slice::<SyncRequestBody>(&body)
        .map_err(|e| format!("Invalid request body: {e}"))
        .and_then(|body| SyncRequest::try_from(body).map_err(|e| e.to_string()))
    {
        Ok(request) => request,
        Err(message) => return error_response(400, message),
    };

    match state.ctx.handle(request).await {
        Ok(outcome) => (StatusCode::OK, Json(outcome)).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Sync request failed");
            error_response(e.status_code(), e.to_string())
        }
    }
}

async fn webhook<F, S>(
    State(state): State<Arc<AppState<F, S>>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response
where
    F: ForumApi + 'static,
    S: QuestionStore + 'static,
{
    let webhook_headers = WebhookHeaders {
        event_type: header(&headers, EVENT_TYPE_HEADER),
        event: header(&headers, EVENT_HEADER),
        signature: header(&headers, SIGNATURE_HEADER),
    };

    match handle_webhook(
        state.ctx.store(),
        &state.webhook_secret,
        webhook_headers,
        &body,
    )
    .await
    {
        Ok(outcome) => (StatusCode::OK, Json(outcome)).into_response(),
        Err(e) => error_response(e.status_code(), e.to_string()),
    }
}

/// Handle `topicsync serve`.
pub(crate) async fn handle_serve(
    bind: Option<String>,
    config: &Config,
    database_url: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let service_token = config
        .server
        .service_token
        .clone()
        .filter(|t| !t.is_empty())
        .ok_or("Service token not configured. Set TOPICSYNC_SERVER__SERVICE_TOKEN")?;
    let webhook_secret = config.discourse.webhook_secret.clone().unwrap_or_default();
    if webhook_secret.is_empty() {
        tracing::warn!("No webhook secret configured; every webhook will be rejected");
    }

    let reporter = Arc::new(ProgressReporter::logging());
    let ctx = build_context(config, database_url, false, Some(reporter.as_callback())).await?;

    let app = router(AppState {
        ctx,
        service_token,
        webhook_secret,
    });

    let bind = bind.unwrap_or_else(|| config.server.bind.clone());
    let listener = tokio::net::TcpListener::bind(&bind).await?;
    tracing::info!(address = %bind, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Shutting down");
            }
        })
        .await?;
    Ok(())
}
