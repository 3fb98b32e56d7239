//! REST endpoints of the checker service

use axum::{
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::api::schemas::ErrorResponse;
use crate::dispatcher::TaskDispatcher;
use crate::error::EnoError;

pub mod checker;

/// Application state shared by all handlers
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: TaskDispatcher,
}

/// Create the checker router
pub fn create_api_router(dispatcher: TaskDispatcher) -> Router {
    let app_state = AppState { dispatcher };

    Router::new()
        .route("/", get(checker::index_page).post(checker::submit_task))
        .route("/service", get(checker::service_info))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

/// Helper function to create JSON error responses
pub fn json_error(
    status: StatusCode,
    message: impl Into<String>,
) -> (StatusCode, Json<ErrorResponse>) {
    let error = ErrorResponse::new(
        status.as_u16(),
        status.canonical_reason().unwrap_or("Unknown"),
        message,
    );
    (status, Json(error))
}

/// Convert an error into an HTTP response
pub fn handle_eno_error(error: EnoError) -> (StatusCode, Json<ErrorResponse>) {
    let body = ErrorResponse::from(&error);
    let status = StatusCode::from_u16(body.code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    if status.is_server_error() {
        warn!(error = %error, "Request failed");
    }
    (status, Json(body))
}
