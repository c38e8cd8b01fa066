//! HTTP JSON 요청 소스.
//!
//! 상태 코드를 `CoreError`로 분류하여 페치 훅의 재시도 정책이
//! 일시적 장애(연결 실패, 5xx)에만 적용되도록 한다.

use futures::future::{BoxFuture, FutureExt};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use evalboard_core::error::CoreError;

/// JSON GET 클라이언트
#[derive(Clone)]
pub struct HttpJsonClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpJsonClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, CoreError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CoreError::Network(format!("HTTP 클라이언트 빌드 실패: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// 경로의 JSON 응답을 역직렬화
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, CoreError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {url}");
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| CoreError::Network(format!("요청 실패: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_else(|e| {
                warn!("응답 본문 읽기 실패: {e}");
                String::new()
            });
            return Err(match status.as_u16() {
                404 => CoreError::NotFound {
                    resource_type: "API".to_string(),
                    id: path.to_string(),
                },
                503 => CoreError::ServiceUnavailable(text),
                code if status.is_server_error() => {
                    CoreError::Network(format!("서버 에러 ({code}): {text}"))
                }
                _ => CoreError::Internal(format!("API 에러 ({status}): {text}")),
            });
        }

        let body = resp
            .bytes()
            .await
            .map_err(|e| CoreError::Network(format!("응답 수신 실패: {e}")))?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// `ResourceFetcher::mount`에 넘길 요청 함수
    pub fn fetch_fn<T>(
        self: &Arc<Self>,
        path: impl Into<String>,
    ) -> impl Fn() -> BoxFuture<'static, Result<T, CoreError>> + Send + Sync + 'static
    where
        T: DeserializeOwned + Send + 'static,
    {
        let client = Arc::clone(self);
        let path: Arc<str> = Arc::from(path.into());
        move || {
            let client = Arc::clone(&client);
            let path = Arc::clone(&path);
            async move { client.get_json::<T>(&path).await }.boxed()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::{FetchOptions, FetchStatus, ResourceFetcher};
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Deserialize)]
    struct Quarter {
        id: String,
        name: String,
    }

    fn client(url: &str) -> Arc<HttpJsonClient> {
        Arc::new(HttpJsonClient::new(url, Duration::from_secs(5)).unwrap())
    }

    #[tokio::test]
    async fn decodes_success_body() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/quarters/q3")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"id":"q3","name":"Q3 2026"}"#)
            .create_async()
            .await;

        let quarter: Quarter = client(&server.url()).get_json("/api/quarters/q3").await.unwrap();
        assert_eq!(quarter.name, "Q3 2026");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn classifies_status_codes() {
        let mut server = mockito::Server::new_async().await;
        let _missing = server
            .mock("GET", "/missing")
            .with_status(404)
            .create_async()
            .await;
        let _busy = server
            .mock("GET", "/busy")
            .with_status(503)
            .with_body("maintenance")
            .create_async()
            .await;
        let _broken = server
            .mock("GET", "/broken")
            .with_status(500)
            .create_async()
            .await;
        let _bad = server
            .mock("GET", "/bad")
            .with_status(400)
            .create_async()
            .await;

        let client = client(&server.url());
        let missing = client.get_json::<Quarter>("/missing").await.unwrap_err();
        assert!(matches!(missing, CoreError::NotFound { .. }));
        assert!(!missing.is_retryable());

        let busy = client.get_json::<Quarter>("/busy").await.unwrap_err();
        assert!(matches!(busy, CoreError::ServiceUnavailable(ref t) if t == "maintenance"));

        let broken = client.get_json::<Quarter>("/broken").await.unwrap_err();
        assert!(broken.is_retryable());

        let bad = client.get_json::<Quarter>("/bad").await.unwrap_err();
        assert!(!bad.is_retryable());
    }

    #[tokio::test]
    async fn not_found_is_not_retried_by_fetcher() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/employees/e-404")
            .with_status(404)
            .expect(1)
            .create_async()
            .await;

        let fetcher = ResourceFetcher::<Quarter>::mount(
            client(&server.url()).fetch_fn("/api/employees/e-404"),
            FetchOptions {
                retry_delay: Duration::from_millis(10),
                ..FetchOptions::default()
            },
        );
        let state = fetcher.settled().await;
        assert_eq!(state.status(), FetchStatus::Error);
        mock.assert_async().await;
    }
}
