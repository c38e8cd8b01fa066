//! 차트 로더 에러.

use evalboard_core::error::CoreError;
use evalboard_core::models::chart::ChartType;
use thiserror::Error;

/// 차트 로드 에러.
///
/// 공유 로드 핸들에 캐시되므로 `Clone`이어야 한다.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChartError {
    /// 알 수 없는 차트 식별자
    #[error("알 수 없는 차트 타입: {0}")]
    UnknownType(String),

    /// 모듈 로드 실패
    #[error("차트 모듈 로드 실패 ({chart_type}): {message}")]
    LoadFailed {
        chart_type: ChartType,
        message: String,
    },
}

impl From<ChartError> for CoreError {
    fn from(err: ChartError) -> Self {
        match err {
            ChartError::UnknownType(id) => CoreError::UnknownChartType(id),
            other @ ChartError::LoadFailed { .. } => CoreError::Internal(other.to_string()),
        }
    }
}
