//! HTTP client for the Bangumi `/v0` API.

use std::time::Duration;

use reqwest::StatusCode;
use serde::de::DeserializeOwned;

use super::types::{Episode, Paged, Subject, UserCollection};
use crate::constants::{COLLECTION_PAGE_SIZE, EPISODE_PAGE_SIZE};
use crate::error::{CalendarError, CalendarResult};

pub const DEFAULT_BASE_URL: &str = "https://api.bgm.tv";

/// Sent with every upstream request so the API operators can identify us.
const USER_AGENT: &str = "episode-calendar/0.1 (https://github.com/trim21/bangumi-episode-calendar)";

const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Raw upstream response: status code plus the untouched body.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: String,
}

impl ApiResponse {
    /// Decode a 200 body, mapping 404 to `NotFound` and anything else to `Upstream`.
    pub fn json<T: DeserializeOwned>(self, what: &str) -> CalendarResult<T> {
        if self.status == StatusCode::NOT_FOUND {
            return Err(CalendarError::NotFound(what.to_string()));
        }
        if self.status != StatusCode::OK {
            return Err(CalendarError::Upstream {
                status: self.status.as_u16(),
                body: self.body,
            });
        }
        Ok(serde_json::from_str(&self.body)?)
    }
}

/// Bangumi API client
#[derive(Clone)]
pub struct Client {
    http: reqwest::Client,
    base_url: String,
}

impl Client {
    pub fn new(base_url: &str) -> CalendarResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()?;

        let base_url = base_url.trim_end_matches('/');
        if base_url.is_empty() {
            return Err(CalendarError::Config("Bangumi base URL is empty".into()));
        }

        Ok(Self {
            http,
            base_url: base_url.to_string(),
        })
    }

    /// GET `path` with `query`, returning status and body without interpreting them.
    pub async fn get(&self, path: &str, query: &[(&str, String)]) -> CalendarResult<ApiResponse> {
        tracing::debug!(path, ?query, "bangumi request");

        let resp = self
            .http
            .get(format!("{}{}", self.base_url, path))
            .query(query)
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;

        Ok(ApiResponse { status, body })
    }

    /// Page through a listing endpoint until `offset >= total`.
    ///
    /// The first page is always requested, so an empty listing costs one call.
    pub async fn fetch_all<T: DeserializeOwned>(
        &self,
        path: &str,
        page_size: u32,
        extra_query: &[(&str, String)],
        what: &str,
    ) -> CalendarResult<Vec<T>> {
        let mut data = Vec::new();
        let mut offset: u64 = 0;

        loop {
            let mut query = extra_query.to_vec();
            query.push(("offset", offset.to_string()));
            query.push(("limit", page_size.to_string()));

            let page: Paged<T> = self.get(path, &query).await?.json(what)?;
            data.extend(page.data);

            offset += u64::from(page_size);
            if offset >= page.total {
                break;
            }
        }

        Ok(data)
    }

    /// All collection rows of one status for `username`.
    pub async fn user_collections(
        &self,
        username: &str,
        collection_type: u8,
    ) -> CalendarResult<Vec<UserCollection>> {
        let path = format!("/v0/users/{}/collections", urlencoding::encode(username));
        self.fetch_all(
            &path,
            COLLECTION_PAGE_SIZE,
            &[("type", collection_type.to_string())],
            &format!("user {username}"),
        )
        .await
    }

    pub async fn subject(&self, subject_id: u64) -> CalendarResult<Subject> {
        self.get(&format!("/v0/subjects/{subject_id}"), &[])
            .await?
            .json(&format!("subject {subject_id}"))
    }

    pub async fn episodes(&self, subject_id: u64) -> CalendarResult<Vec<Episode>> {
        self.fetch_all(
            "/v0/episodes",
            EPISODE_PAGE_SIZE,
            &[("subject_id", subject_id.to_string())],
            &format!("episodes of subject {subject_id}"),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn page_query(extra: (&str, &str), offset: u32, limit: u32) -> Matcher {
        Matcher::AllOf(vec![
            Matcher::UrlEncoded(extra.0.into(), extra.1.into()),
            Matcher::UrlEncoded("offset".into(), offset.to_string()),
            Matcher::UrlEncoded("limit".into(), limit.to_string()),
        ])
    }

    #[test]
    fn test_new_rejects_empty_base_url() {
        assert!(matches!(Client::new("/"), Err(CalendarError::Config(_))));
    }

    #[tokio::test]
    async fn test_fetch_all_pages_until_total() {
        let mut server = mockito::Server::new_async().await;
        let first = server
            .mock("GET", "/v0/episodes")
            .match_query(page_query(("subject_id", "7"), 0, 200))
            .with_status(200)
            .with_body(format!(
                r#"{{"data": [{}], "total": 201, "limit": 200, "offset": 0}}"#,
                r#"{"id": 1, "sort": 1, "airdate": "2024-01-01"}"#
            ))
            .expect(1)
            .create_async()
            .await;
        let second = server
            .mock("GET", "/v0/episodes")
            .match_query(page_query(("subject_id", "7"), 200, 200))
            .with_status(200)
            .with_body(r#"{"data": [{"id": 2, "sort": 2, "airdate": ""}], "total": 201, "limit": 200, "offset": 200}"#)
            .expect(1)
            .create_async()
            .await;

        let client = Client::new(&server.url()).unwrap();
        let episodes = client.episodes(7).await.unwrap();

        assert_eq!(episodes.iter().map(|e| e.id).collect::<Vec<_>>(), vec![1, 2]);
        first.assert_async().await;
        second.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_all_empty_listing_makes_one_request() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/v0/episodes")
            .match_query(page_query(("subject_id", "3"), 0, 200))
            .with_status(200)
            .with_body(r#"{"data": [], "total": 0, "limit": 200, "offset": 0}"#)
            .expect(1)
            .create_async()
            .await;

        let client = Client::new(&server.url()).unwrap();
        assert!(client.episodes(3).await.unwrap().is_empty());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_missing_user_is_not_found() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/v0/users/bob/collections")
            .match_query(Matcher::Any)
            .with_status(404)
            .with_body(r#"{"title": "Not Found"}"#)
            .create_async()
            .await;

        let client = Client::new(&server.url()).unwrap();
        let err = client.user_collections("bob", 3).await.unwrap_err();
        assert!(err.is_not_found(), "expected NotFound, got {err:?}");
    }

    #[tokio::test]
    async fn test_username_is_encoded_as_one_path_segment() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/v0/users/a%20b%2Fc/collections")
            .match_query(page_query(("type", "3"), 0, 50))
            .with_status(200)
            .with_body(r#"{"data": [], "total": 0, "limit": 50, "offset": 0}"#)
            .expect(1)
            .create_async()
            .await;

        let client = Client::new(&server.url()).unwrap();
        assert!(client.user_collections("a b/c", 3).await.unwrap().is_empty());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_server_error_keeps_status_and_body() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/v0/subjects/5")
            .with_status(503)
            .with_body("upstream down")
            .create_async()
            .await;

        let client = Client::new(&server.url()).unwrap();
        match client.subject(5).await {
            Err(CalendarError::Upstream { status, body }) => {
                assert_eq!(status, 503);
                assert_eq!(body, "upstream down");
            }
            other => panic!("expected Upstream error, got {other:?}"),
        }
    }
}
