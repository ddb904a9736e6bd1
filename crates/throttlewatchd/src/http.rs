//! HTTP/JSON surface of the daemon
//!
//! # API Endpoints
//!
//! ## GET|POST `<webhook_path>?ipv4IP=<ip>`
//!
//! Look up the cached throttle state of one IPv4 address. The address is
//! always read from the query string, for POST as well.
//!
//! ```json
//! { "ipv4IP": "10.0.0.1", "trafficThrottled": false }
//! ```
//!
//! | status | when                                  |
//! |--------|---------------------------------------|
//! | 200    | the address is in the current cache   |
//! | 400    | `ipv4IP` is missing or empty          |
//! | 404    | the address is not in the cache       |
//! | 500    | any other fault                       |
//!
//! Errors carry `{"error": "<message>"}`.
//!
//! ## GET /health
//!
//! ```json
//! {
//!   "status": "ok",
//!   "timestamp": "2026-10-19T12:00:00Z",
//!   "total_servers": 3,
//!   "last_refresh": "2026-10-19T11:58:12Z"
//! }
//! ```

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::get;
use axum::Router;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use throttlewatch_core::{Error, HealthReport, QueryService, ServerInterfaceRecord};

/// Name of the lookup query parameter
pub const IP_PARAMETER: &str = "ipv4IP";

/// Error response format
#[derive(Debug, Serialize)]
pub struct HttpErrorResponse {
    /// Error message
    pub error: String,
}

type HttpError = (StatusCode, Json<HttpErrorResponse>);

struct AppState {
    query: QueryService,
}

/// Build the router serving the lookup path and `/health`
///
/// `webhook_path` must start with `/` and must not be `/health`;
/// `ServiceConfig::normalized` guarantees both.
pub fn router(webhook_path: &str, query: QueryService) -> Router {
    let state = Arc::new(AppState { query });

    Router::new()
        .route(webhook_path, get(handle_lookup).post(handle_lookup))
        .route("/health", get(handle_health))
        .with_state(state)
}

async fn handle_lookup(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<ServerInterfaceRecord>, HttpError> {
    let ip = params.get(IP_PARAMETER).map(String::as_str);

    match state.query.lookup(ip).await {
        Ok(record) => Ok(Json(record)),
        Err(e) => Err(error_response(e)),
    }
}

async fn handle_health(State(state): State<Arc<AppState>>) -> Json<HealthReport> {
    Json(state.query.health().await)
}

fn error_response(err: Error) -> HttpError {
    let (status, message) = match err {
        Error::InvalidInput(_) => (
            StatusCode::BAD_REQUEST,
            format!("missing {} parameter", IP_PARAMETER),
        ),
        Error::NotFound(message) => (StatusCode::NOT_FOUND, message),
        other => {
            tracing::error!("Lookup failed: {}", other);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            )
        }
    };

    (status, Json(HttpErrorResponse { error: message }))
}
