//! EVALBOARD 도메인 모델.
//!
//! 차트, 텔레메트리, 내보내기, 리포트 페이로드 구조체를 정의한다.
//! 모든 모델은 `serde` Serialize/Deserialize를 구현한다.

pub mod chart;
pub mod export;
pub mod report;
pub mod telemetry;
