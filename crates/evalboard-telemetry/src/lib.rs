//! # evalboard-telemetry
//!
//! 성능 텔레메트리 수집.
//!
//! - [`collector`]: 샘플링 수집기 (지표 이력, Web Vitals, 임계값 점검, 리포팅)
//! - [`component`]: 컴포넌트 단위 측정 모니터
//! - [`history`]: 고정 용량 FIFO 이력
//! - [`thresholds`]: 고정 임계값과 권장 사항
//! - [`reporter`]: HTTP 리포터 (`MetricsReporter` 구현)
//! - [`observer`]: 기록된 신호 재생 소스 (`SignalSource` 구현)
//! - [`slot`]: 1회 초기화 슬롯

pub mod collector;
pub mod component;
pub mod history;
pub mod observer;
pub mod reporter;
pub mod slot;
pub mod thresholds;

pub use collector::TelemetryCollector;
pub use component::ComponentMonitor;
pub use observer::ReplaySignalSource;
pub use reporter::HttpMetricsReporter;
pub use slot::TelemetrySlot;
