//! 텔레메트리 리포팅 포트.
//!
//! 구현: `evalboard-telemetry` crate (reqwest)

use async_trait::async_trait;

use crate::error::CoreError;
use crate::models::telemetry::TelemetryEnvelope;

/// 지표 전송 인터페이스
///
/// 호출자는 실패를 로그로만 남기고 재시도하지 않는다.
#[async_trait]
pub trait MetricsReporter: Send + Sync {
    /// `{"type": ..., "data": ...}` 봉투 1건 전송
    async fn report(&self, envelope: &TelemetryEnvelope) -> Result<(), CoreError>;
}
