pub mod calendar;
pub mod pages;

use axum::{
    Router,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tower_http::trace::TraceLayer;

use episode_calendar_core::CalendarError;

use crate::state::AppState;

/// Build the application router.
pub fn router(state: AppState, enable_request_logging: bool) -> Router {
    let app = Router::new()
        .merge(pages::router())
        .merge(calendar::router())
        .with_state(state);

    if enable_request_logging {
        app.layer(TraceLayer::new_for_http())
    } else {
        app
    }
}

/// Convert pipeline errors to HTTP responses
pub struct AppError(CalendarError);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = if self.0.is_not_found() {
            StatusCode::NOT_FOUND
        } else {
            tracing::error!(error = %self.0, "failed to build calendar");
            StatusCode::INTERNAL_SERVER_ERROR
        };
        status_response(status)
    }
}

impl From<CalendarError> for AppError {
    fn from(err: CalendarError) -> Self {
        Self(err)
    }
}

/// Plain-text response carrying the status' canonical reason.
pub fn status_response(status: StatusCode) -> Response {
    (status, status.canonical_reason().unwrap_or_default()).into_response()
}
