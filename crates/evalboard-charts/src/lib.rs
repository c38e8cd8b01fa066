//! # evalboard-charts
//!
//! 평가 대시보드 차트 컴포넌트와 지연 로더.
//!
//! - [`components`]: 레이더/묶음 막대/추세선/과거 막대 SVG 렌더러
//! - [`loader`]: 식별자별 단일 비행 로드 캐시
//! - [`source`]: 내장 차트 모듈 소스

pub mod components;
pub mod error;
pub mod loader;
pub mod source;
mod svg;

pub use error::ChartError;
pub use loader::{CacheInfo, ChartLoader};
pub use source::BuiltinChartSource;
