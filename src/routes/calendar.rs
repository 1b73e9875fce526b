//! Episode feed endpoints

use axum::{
    Router,
    extract::{Path, Query, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::get,
};
use serde::Deserialize;

use crate::routes::pages::CALENDAR_HTML;
use crate::routes::{AppError, status_response};
use crate::state::AppState;

const CALENDAR_CONTENT_TYPE: &str = "text/calendar; charset=utf-8";
const BROWSER_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/episode-calendar", get(feed_by_query))
        .route("/episode-calendar/{file}", get(feed_by_path))
}

#[derive(Deserialize)]
pub struct FeedQuery {
    pub username: Option<String>,
}

/// GET /episode-calendar?username= - Feed, or the link generator page without a username
async fn feed_by_query(
    State(state): State<AppState>,
    Query(query): Query<FeedQuery>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    match query.username {
        Some(username) if !username.is_empty() => feed(&state, &username, &headers).await,
        _ => Ok(Html(CALENDAR_HTML).into_response()),
    }
}

/// GET /episode-calendar/{username}.ics - Feed
async fn feed_by_path(
    State(state): State<AppState>,
    Path(file): Path<String>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let Some(username) = file.strip_suffix(".ics") else {
        return Ok(status_response(StatusCode::NOT_FOUND));
    };

    if username.is_empty() {
        return Ok((StatusCode::BAD_REQUEST, "username is required").into_response());
    }

    feed(&state, username, &headers).await
}

async fn feed(state: &AppState, username: &str, headers: &HeaderMap) -> Result<Response, AppError> {
    let ics = state.service.build_ics(username).await?;

    let content_type = if is_browser(headers) {
        BROWSER_CONTENT_TYPE
    } else {
        CALENDAR_CONTENT_TYPE
    };

    Ok((
        [(header::CONTENT_TYPE, HeaderValue::from_static(content_type))],
        ics,
    )
        .into_response())
}

/// Browsers get text/plain so the feed renders instead of downloading.
fn is_browser(headers: &HeaderMap) -> bool {
    let header_contains = |name: header::HeaderName, needle: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.to_ascii_lowercase().contains(needle))
    };

    header_contains(header::USER_AGENT, "mozilla") || header_contains(header::ACCEPT, "text/html")
}
