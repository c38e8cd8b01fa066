//! HTTP 텔레메트리 리포터.
//!
//! `MetricsReporter` 포트 구현. 봉투를 JSON으로 POST한다.

use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

use evalboard_core::error::CoreError;
use evalboard_core::models::telemetry::TelemetryEnvelope;
use evalboard_core::ports::reporter::MetricsReporter;

/// reqwest 기반 리포터
pub struct HttpMetricsReporter {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpMetricsReporter {
    /// 새 리포터 생성
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, CoreError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CoreError::Network(format!("HTTP 클라이언트 빌드 실패: {e}")))?;

        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl MetricsReporter for HttpMetricsReporter {
    async fn report(&self, envelope: &TelemetryEnvelope) -> Result<(), CoreError> {
        let resp = self
            .client
            .post(&self.endpoint)
            .json(envelope)
            .send()
            .await
            .map_err(|e| CoreError::Network(format!("텔레메트리 전송 실패: {e}")))?;

        let status = resp.status();
        if status.is_success() {
            debug!("텔레메트리 전송 완료: {}", envelope.kind);
            return Ok(());
        }
        match status.as_u16() {
            503 => Err(CoreError::ServiceUnavailable(format!(
                "텔레메트리 엔드포인트 응답: {status}"
            ))),
            _ => Err(CoreError::Network(format!(
                "텔레메트리 엔드포인트 응답: {status}"
            ))),
        }
    }
}
