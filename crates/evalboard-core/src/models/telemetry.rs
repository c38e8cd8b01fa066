//! 텔레메트리 모델.
//!
//! 페이지 성능 지표(Core Web Vitals), 애플리케이션 지표, 컴포넌트 단위 측정값,
//! 임계값 점검 결과를 정의.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// 단일 성능 지표
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetric {
    /// 지표 이름 (예: "LCP", "chart_render:radar")
    pub name: String,
    /// 측정값
    pub value: f64,
    /// 측정 시각
    pub timestamp: DateTime<Utc>,
    /// 측정 시점의 페이지 URL
    pub url: String,
    /// 사용자 ID (로그인 상태일 때)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

/// Core Web Vitals (각 필드는 페이지 수명 동안 한 번만 기록, CLS만 누적)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoreWebVitals {
    /// Largest Contentful Paint (ms)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lcp: Option<f64>,
    /// First Input Delay (ms)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fid: Option<f64>,
    /// Cumulative Layout Shift (단위 없음)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cls: Option<f64>,
    /// First Contentful Paint (ms)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fcp: Option<f64>,
    /// Time To First Byte (ms)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttfb: Option<f64>,
}

/// 애플리케이션 지표 (매 관측마다 덮어씀)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomMetrics {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chart_render_time: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bundle_load_time: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_load_time: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interaction_delay: Option<f64>,
}

/// 애플리케이션 지표 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CustomMetricKind {
    ChartRenderTime,
    BundleLoadTime,
    PageLoadTime,
    InteractionDelay,
}

impl CustomMetricKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CustomMetricKind::ChartRenderTime => "chart_render_time",
            CustomMetricKind::BundleLoadTime => "bundle_load_time",
            CustomMetricKind::PageLoadTime => "page_load_time",
            CustomMetricKind::InteractionDelay => "interaction_delay",
        }
    }
}

impl CustomMetrics {
    /// 해당 종류의 값을 덮어씀 (last-write-wins)
    pub fn set(&mut self, kind: CustomMetricKind, value: f64) {
        let slot = match kind {
            CustomMetricKind::ChartRenderTime => &mut self.chart_render_time,
            CustomMetricKind::BundleLoadTime => &mut self.bundle_load_time,
            CustomMetricKind::PageLoadTime => &mut self.page_load_time,
            CustomMetricKind::InteractionDelay => &mut self.interaction_delay,
        };
        *slot = Some(value);
    }
}

/// 컴포넌트 측정 작업 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Render,
    DataFetch,
    UserInteraction,
    ChartRender,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OperationKind::Render => "render",
            OperationKind::DataFetch => "data_fetch",
            OperationKind::UserInteraction => "user_interaction",
            OperationKind::ChartRender => "chart_render",
        };
        f.write_str(s)
    }
}

/// 컴포넌트 측정 메타데이터 값
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl From<bool> for MetadataValue {
    fn from(v: bool) -> Self {
        MetadataValue::Bool(v)
    }
}

impl From<f64> for MetadataValue {
    fn from(v: f64) -> Self {
        MetadataValue::Number(v)
    }
}

impl From<&str> for MetadataValue {
    fn from(v: &str) -> Self {
        MetadataValue::Text(v.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(v: String) -> Self {
        MetadataValue::Text(v)
    }
}

/// 컴포넌트 측정 메타데이터
pub type Metadata = BTreeMap<String, MetadataValue>;

/// 컴포넌트 단위 성능 측정값
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentPerformanceMetric {
    /// 측정 ID
    pub id: String,
    /// 소속 컴포넌트 이름
    pub component_name: String,
    /// 작업 종류
    pub operation: OperationKind,
    /// 소요 시간 (ms)
    pub duration_ms: f64,
    /// 측정 시각
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

/// 임계값 점검 결과
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceReport {
    pub alerts: Vec<String>,
    pub recommendations: Vec<String>,
}

impl PerformanceReport {
    pub fn is_healthy(&self) -> bool {
        self.alerts.is_empty()
    }
}

/// 지표 이름별 집계 통계
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSummary {
    pub name: String,
    pub count: usize,
    pub avg: f64,
    pub min: f64,
    pub max: f64,
    pub p95: f64,
}

/// 리포팅 엔드포인트로 전송되는 봉투 (`{"type": ..., "data": ...}`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryEnvelope {
    #[serde(rename = "type")]
    pub kind: String,
    pub data: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn custom_metrics_overwrite() {
        let mut custom = CustomMetrics::default();
        custom.set(CustomMetricKind::ChartRenderTime, 120.0);
        custom.set(CustomMetricKind::ChartRenderTime, 80.0);
        assert_eq!(custom.chart_render_time, Some(80.0));
        assert_eq!(custom.page_load_time, None);
    }

    #[test]
    fn envelope_wire_shape() {
        let env = TelemetryEnvelope {
            kind: "metric".to_string(),
            data: serde_json::json!({ "name": "LCP", "value": 1200.0 }),
        };
        let json = serde_json::to_value(&env).unwrap();
        assert_eq!(json["type"], "metric");
        assert_eq!(json["data"]["name"], "LCP");
    }

    #[test]
    fn operation_kind_snake_case() {
        let json = serde_json::to_string(&OperationKind::DataFetch).unwrap();
        assert_eq!(json, "\"data_fetch\"");
        assert_eq!(OperationKind::ChartRender.to_string(), "chart_render");
    }
}
