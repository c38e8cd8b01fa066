//! 성능 신호 관측 포트.
//!
//! 페인트, 레이아웃 이동, 첫 입력, LCP 같은 수동 관측 신호를 카테고리별로 구독한다.
//! 지원하지 않는 카테고리는 `subscribe`가 에러를 돌려주며, 수집기는 이를 로그로 남기고
//! 나머지 카테고리로 계속 동작한다.
//!
//! 구현: `evalboard-telemetry` crate (`ReplaySignalSource`)

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::mpsc;

use crate::error::CoreError;

/// 관측 카테고리
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SignalCategory {
    /// 페인트 타이밍 (FCP)
    Paint,
    /// 레이아웃 이동 (CLS)
    LayoutShift,
    /// 첫 입력 (FID)
    FirstInput,
    /// 최대 콘텐츠 페인트 (LCP)
    LargestContentfulPaint,
    /// 내비게이션 타이밍 (TTFB)
    Navigation,
}

impl SignalCategory {
    pub const ALL: [SignalCategory; 5] = [
        SignalCategory::Paint,
        SignalCategory::LayoutShift,
        SignalCategory::FirstInput,
        SignalCategory::LargestContentfulPaint,
        SignalCategory::Navigation,
    ];
}

impl fmt::Display for SignalCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SignalCategory::Paint => "paint",
            SignalCategory::LayoutShift => "layout-shift",
            SignalCategory::FirstInput => "first-input",
            SignalCategory::LargestContentfulPaint => "largest-contentful-paint",
            SignalCategory::Navigation => "navigation",
        };
        f.write_str(s)
    }
}

/// 관측된 성능 신호
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum PerformanceSignal {
    /// 페인트 항목 (`name`이 "first-contentful-paint"일 때만 FCP)
    Paint { name: String, start_time: f64 },
    /// 레이아웃 이동
    LayoutShift { value: f64, had_recent_input: bool },
    /// 첫 입력 (지연 = processing_start - start_time)
    FirstInput { start_time: f64, processing_start: f64 },
    /// 최대 콘텐츠 페인트 후보
    LargestContentfulPaint { start_time: f64 },
    /// 내비게이션 타이밍
    Navigation { response_start: f64, request_start: f64 },
}

impl PerformanceSignal {
    /// 신호가 속한 카테고리
    pub fn category(&self) -> SignalCategory {
        match self {
            PerformanceSignal::Paint { .. } => SignalCategory::Paint,
            PerformanceSignal::LayoutShift { .. } => SignalCategory::LayoutShift,
            PerformanceSignal::FirstInput { .. } => SignalCategory::FirstInput,
            PerformanceSignal::LargestContentfulPaint { .. } => {
                SignalCategory::LargestContentfulPaint
            }
            PerformanceSignal::Navigation { .. } => SignalCategory::Navigation,
        }
    }
}

/// 신호 소스 인터페이스
pub trait SignalSource: Send + Sync {
    /// 카테고리 구독. 신호는 `tx`로 전달된다.
    ///
    /// 지원하지 않는 카테고리면 `UnsupportedFormat` 에러.
    fn subscribe(
        &self,
        category: SignalCategory,
        tx: mpsc::UnboundedSender<PerformanceSignal>,
    ) -> Result<(), CoreError>;
}
