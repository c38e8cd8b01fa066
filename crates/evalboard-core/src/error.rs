//! EVALBOARD 핵심 에러 타입.
//!
//! 모든 어댑터 crate는 자체 에러 타입에서 `CoreError`로 변환하거나 래핑한다.

use thiserror::Error;

/// 코어 레이어 에러.
/// 직렬화, 설정, 유효성 검증, 렌더링 표면 등 도메인 공통 에러를 정의한다.
#[derive(Debug, Error)]
pub enum CoreError {
    /// JSON 직렬화/역직렬화 실패
    #[error("직렬화 에러: {0}")]
    Serialization(#[from] serde_json::Error),

    /// 설정값 오류
    #[error("설정 에러: {0}")]
    Config(String),

    /// 필드 유효성 검증 실패
    #[error("유효성 검증 실패: {field}: {message}")]
    Validation {
        /// 검증 실패한 필드명
        field: String,
        /// 실패 사유
        message: String,
    },

    /// 리소스를 찾을 수 없음
    #[error("{resource_type} 미발견: {id}")]
    NotFound {
        /// 리소스 종류 (예: "Employee", "Quarter")
        resource_type: String,
        /// 리소스 식별자
        id: String,
    },

    /// 문서 서브트리를 찾을 수 없음
    #[error("요소 미발견: {0}")]
    ElementNotFound(String),

    /// 지원하지 않는 내보내기 형식
    #[error("지원하지 않는 형식: {0}")]
    UnsupportedFormat(String),

    /// 알 수 없는 차트 타입
    #[error("알 수 없는 차트 타입: {0}")]
    UnknownChartType(String),

    /// 네트워크 에러 (연결 실패, 일시적 장애)
    #[error("네트워크 에러: {0}")]
    Network(String),

    /// 서비스 일시 불가 (503)
    #[error("서비스 일시 불가: {0}")]
    ServiceUnavailable(String),

    /// 실행 타임아웃
    #[error("실행 타임아웃: {timeout_ms}ms 초과")]
    ExecutionTimeout {
        /// 초과된 타임아웃 시간 (밀리초)
        timeout_ms: u64,
    },

    /// 요청이 취소됨 (새 요청으로 대체되었거나 언마운트됨)
    #[error("요청 취소됨")]
    Cancelled,

    /// 캡처/래스터화/문서 조립 실패
    #[error("렌더링 에러: {0}")]
    Render(String),

    /// 내부 에러 (예상치 못한 상황)
    #[error("내부 에러: {0}")]
    Internal(String),

    /// I/O 에러
    #[error("I/O 에러: {0}")]
    Io(#[from] std::io::Error),
}

impl CoreError {
    /// 필드 유효성 에러 생성 헬퍼
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// 로컬 재시도 대상인 일시적 에러인지 판별
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CoreError::Network(_)
                | CoreError::ServiceUnavailable(_)
                | CoreError::ExecutionTimeout { .. }
        )
    }

    /// 최종 사용자에게 보여줄 일반화된 메시지.
    ///
    /// 내부 원인은 로그로만 남기고 화면에는 노출하지 않는다.
    pub fn user_message(&self) -> &'static str {
        match self {
            CoreError::Validation { .. } => "입력값을 확인해 주세요.",
            CoreError::NotFound { .. } | CoreError::ElementNotFound(_) => {
                "요청한 항목을 찾을 수 없습니다."
            }
            CoreError::UnsupportedFormat(_) | CoreError::UnknownChartType(_) => {
                "지원하지 않는 형식입니다."
            }
            CoreError::Network(_)
            | CoreError::ServiceUnavailable(_)
            | CoreError::ExecutionTimeout { .. } => {
                "서버와 통신할 수 없습니다. 잠시 후 다시 시도해 주세요."
            }
            _ => "예기치 않은 오류가 발생했습니다.",
        }
    }
}
