//! 내보내기 에러.
//!
//! 단계 실행 중 발생한 구체 원인은 `source()`로 보존하고,
//! 사용자에게는 일반 메시지만 노출한다.

use thiserror::Error;

use evalboard_core::error::CoreError;
use evalboard_core::models::export::ExportStage;

/// 내보내기 에러
#[derive(Debug, Error)]
pub enum ExportError {
    /// 시작 전 동기 검증 실패 (표면 호출 없음)
    #[error("내보내기 요청 거부: {0}")]
    Rejected(#[source] CoreError),

    /// 같은 대상에 대한 내보내기가 이미 진행 중
    #[error("이미 진행 중인 내보내기: {0}")]
    AlreadyRunning(String),

    /// 단계 실행 실패 (원인은 로그와 `source()`로만 확인)
    #[error("리포트 생성에 실패했습니다")]
    GenerationFailed {
        stage: ExportStage,
        #[source]
        cause: CoreError,
    },

    /// 호출자가 취소
    #[error("내보내기가 취소되었습니다")]
    Cancelled,
}

impl ExportError {
    pub(crate) fn at(stage: ExportStage) -> impl FnOnce(CoreError) -> ExportError {
        move |cause| ExportError::GenerationFailed { stage, cause }
    }

    /// 실패한 단계 (단계 실행 실패인 경우)
    pub fn stage(&self) -> Option<ExportStage> {
        match self {
            ExportError::GenerationFailed { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    /// 사용자 표시용 메시지
    pub fn user_message(&self) -> &'static str {
        match self {
            ExportError::Rejected(e) => e.user_message(),
            ExportError::AlreadyRunning(_) => {
                "같은 리포트를 이미 내보내는 중입니다. 잠시 후 다시 시도하세요."
            }
            ExportError::GenerationFailed { .. } => "리포트 생성에 실패했습니다. 다시 시도하세요.",
            ExportError::Cancelled => "내보내기가 취소되었습니다.",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn generation_failure_hides_cause_in_display() {
        let err = ExportError::at(ExportStage::Capturing)(CoreError::ElementNotFound(
            "analytics-report".into(),
        ));
        assert_eq!(err.to_string(), "리포트 생성에 실패했습니다");
        assert_eq!(err.stage(), Some(ExportStage::Capturing));
        let source = err.source().map(|s| s.to_string()).unwrap_or_default();
        assert!(source.contains("analytics-report"));
    }
}
