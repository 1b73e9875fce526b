use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use chrono::{Duration, Utc};
use mockito::{Matcher, ServerGuard};
use tower::ServiceExt;

use episode_calendar::{AppState, routes};
use episode_calendar_core::bangumi::Client;
use episode_calendar_core::cache::MemoryCache;
use episode_calendar_core::{CalendarService, ServiceOptions};

fn airdate_in_days(days: i64) -> String {
    (Utc::now().date_naive() + Duration::days(days))
        .format("%Y-%m-%d")
        .to_string()
}

fn app(server: &ServerGuard) -> Router {
    let service = CalendarService::new(
        Client::new(&server.url()).unwrap(),
        Arc::new(MemoryCache::new()),
        ServiceOptions::default(),
    );
    routes::router(AppState::new(service), false)
}

async fn mock_user(server: &mut ServerGuard, username: &str) {
    let path = format!("/v0/users/{username}/collections");
    server
        .mock("GET", path.as_str())
        .match_query(Matcher::UrlEncoded("type".into(), "1".into()))
        .with_status(200)
        .with_body(r#"{"data": [], "total": 0, "limit": 50, "offset": 0}"#)
        .create_async()
        .await;
    server
        .mock("GET", path.as_str())
        .match_query(Matcher::UrlEncoded("type".into(), "3".into()))
        .with_status(200)
        .with_body(r#"{"data": [{"subject_id": 5, "subject_type": 2, "type": 3}], "total": 1, "limit": 50, "offset": 0}"#)
        .create_async()
        .await;
    server
        .mock("GET", "/v0/subjects/5")
        .with_status(200)
        .with_body(r#"{"id": 5, "name": "Show", "name_cn": "", "total_episodes": 1}"#)
        .create_async()
        .await;
    server
        .mock("GET", "/v0/episodes")
        .match_query(Matcher::UrlEncoded("subject_id".into(), "5".into()))
        .with_status(200)
        .with_body(format!(
            r#"{{"data": [{{"id": 50, "sort": 3, "name": "Third", "airdate": "{}", "duration": "24m"}}], "total": 1, "limit": 200, "offset": 0}}"#,
            airdate_in_days(2)
        ))
        .create_async()
        .await;
}

async fn get(app: Router, uri: &str, user_agent: Option<&str>) -> (StatusCode, String, String) {
    let mut request = Request::builder().uri(uri);
    if let Some(ua) = user_agent {
        request = request.header(header::USER_AGENT, ua);
    }

    let res = app
        .oneshot(request.body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = res.status();
    let content_type = res
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();
    let body = to_bytes(res.into_body(), usize::MAX).await.unwrap();

    (status, content_type, String::from_utf8_lossy(&body).into_owned())
}

#[tokio::test]
async fn test_home_page() {
    let server = mockito::Server::new_async().await;
    let (status, content_type, _) = get(app(&server), "/", None).await;

    assert_eq!(status, StatusCode::OK);
    assert!(content_type.starts_with("text/html"));
}

#[tokio::test]
async fn test_index_page_without_username() {
    let server = mockito::Server::new_async().await;

    for uri in ["/episode-calendar", "/episode-calendar?username="] {
        let (status, content_type, body) = get(app(&server), uri, None).await;
        assert_eq!(status, StatusCode::OK, "{uri}");
        assert!(content_type.starts_with("text/html"), "{uri}");
        assert!(body.contains("<form"), "{uri}");
    }
}

#[tokio::test]
async fn test_calendar_by_path() {
    let mut server = mockito::Server::new_async().await;
    mock_user(&mut server, "alice").await;

    let (status, content_type, body) =
        get(app(&server), "/episode-calendar/alice.ics", Some("Thunderbird")).await;

    assert_eq!(status, StatusCode::OK);
    assert!(content_type.starts_with("text/calendar"), "{content_type}");
    assert!(body.contains("X-WR-CALNAME:Bangumi Episode Air Calendar"));
    assert!(body.contains("SUMMARY:Show 3"));
}

#[tokio::test]
async fn test_calendar_by_query_in_browser_is_plain_text() {
    let mut server = mockito::Server::new_async().await;
    mock_user(&mut server, "alice").await;

    let (status, content_type, body) = get(
        app(&server),
        "/episode-calendar?username=alice",
        Some("Mozilla/5.0"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(content_type.starts_with("text/plain"), "{content_type}");
    assert!(body.starts_with("BEGIN:VCALENDAR"));
}

#[tokio::test]
async fn test_path_without_ics_suffix_is_not_found() {
    let server = mockito::Server::new_async().await;
    let (status, _, _) = get(app(&server), "/episode-calendar/alice", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_empty_username_is_bad_request() {
    let server = mockito::Server::new_async().await;
    let (status, _, _) = get(app(&server), "/episode-calendar/.ics", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_user_is_not_found() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/v0/users/bob/collections")
        .match_query(Matcher::Any)
        .with_status(404)
        .create_async()
        .await;

    let (status, _, body) = get(app(&server), "/episode-calendar/bob.ics", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, "Not Found");
}

#[tokio::test]
async fn test_upstream_failure_is_internal_error() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/v0/users/carol/collections")
        .match_query(Matcher::Any)
        .with_status(502)
        .with_body("bad gateway")
        .create_async()
        .await;

    let (status, _, _) = get(app(&server), "/episode-calendar/carol.ics", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}
