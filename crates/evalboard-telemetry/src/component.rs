//! 컴포넌트 단위 성능 측정.
//!
//! 컴포넌트 이름별 모니터가 렌더링, 데이터 로드, 상호작용, 차트 렌더링 시간을 재서
//! 수집기의 컴포넌트 이력에 기록한다. 로컬 평균용으로 최근 측정값 일부를 따로 보관한다.

use chrono::Utc;
use parking_lot::Mutex;
use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

use evalboard_core::models::telemetry::{ComponentPerformanceMetric, Metadata, OperationKind};

use crate::collector::{mean, TelemetryCollector};
use crate::history::BoundedHistory;

/// 로컬 평균 계산용 최근 측정값 개수
const LOCAL_WINDOW: usize = 50;

/// 컴포넌트 성능 모니터
pub struct ComponentMonitor {
    component_name: String,
    collector: Arc<TelemetryCollector>,
    enabled: bool,
    window: Mutex<BoundedHistory<(OperationKind, f64)>>,
}

impl ComponentMonitor {
    /// 새 모니터 생성 (`component_monitoring` 설정과 샘플링 여부를 따름)
    pub fn new(component_name: impl Into<String>, collector: Arc<TelemetryCollector>) -> Self {
        let enabled = collector.config().component_monitoring && collector.is_sampled();
        Self {
            component_name: component_name.into(),
            collector,
            enabled,
            window: Mutex::new(BoundedHistory::new(LOCAL_WINDOW)),
        }
    }

    pub fn component_name(&self) -> &str {
        &self.component_name
    }

    /// 렌더링 측정
    pub fn measure_render<T>(&self, op: impl FnOnce() -> T) -> T {
        if !self.enabled {
            return op();
        }
        let start = Instant::now();
        let result = op();
        self.record(OperationKind::Render, elapsed_ms(start), None);
        result
    }

    /// 데이터 로드 측정.
    ///
    /// 메타데이터에 `success` 플래그를, 실패 시 `error` 문자열을 추가하고
    /// 원래 결과를 그대로 돌려준다.
    pub async fn measure_data_fetch<T, E, F>(
        &self,
        fut: F,
        metadata: Option<Metadata>,
    ) -> Result<T, E>
    where
        F: Future<Output = Result<T, E>>,
        E: Display,
    {
        if !self.enabled {
            return fut.await;
        }
        let start = tokio::time::Instant::now();
        let result = fut.await;
        let duration_ms = start.elapsed().as_secs_f64() * 1_000.0;

        let mut metadata = metadata.unwrap_or_default();
        match &result {
            Ok(_) => {
                metadata.insert("success".into(), true.into());
            }
            Err(e) => {
                metadata.insert("success".into(), false.into());
                metadata.insert("error".into(), e.to_string().into());
            }
        }
        self.record(OperationKind::DataFetch, duration_ms, Some(metadata));
        result
    }

    /// 사용자 상호작용 측정
    pub fn measure_interaction<T>(&self, action: &str, op: impl FnOnce() -> T) -> T {
        if !self.enabled {
            return op();
        }
        let start = Instant::now();
        let result = op();
        let duration_ms = elapsed_ms(start);

        let mut metadata = Metadata::new();
        metadata.insert("action".into(), action.into());
        self.record(OperationKind::UserInteraction, duration_ms, Some(metadata));
        self.collector.record_interaction(
            action,
            serde_json::json!({
                "component": self.component_name,
                "duration_ms": duration_ms,
            }),
        );
        result
    }

    /// 차트 렌더링 측정 (수집기의 차트 지표도 함께 갱신)
    pub fn measure_chart_render<T>(&self, chart_name: &str, op: impl FnOnce() -> T) -> T {
        if !self.enabled {
            return op();
        }
        let start = Instant::now();
        let result = op();
        let duration_ms = elapsed_ms(start);

        let mut metadata = Metadata::new();
        metadata.insert("chart".into(), chart_name.into());
        self.record(OperationKind::ChartRender, duration_ms, Some(metadata));
        self.collector.record_chart_render(chart_name, duration_ms);
        result
    }

    /// 이 컴포넌트의 측정 이력
    pub fn metrics(&self) -> Vec<ComponentPerformanceMetric> {
        self.collector.metrics_by_component(&self.component_name)
    }

    /// 이 컴포넌트의 렌더링 평균 시간
    pub fn average_render_time(&self) -> f64 {
        self.collector
            .average_render_time(Some(&self.component_name))
    }

    /// 최근 측정값 기준 작업별 평균 (없으면 0)
    pub fn local_average(&self, operation: OperationKind) -> f64 {
        let durations: Vec<f64> = self
            .window
            .lock()
            .iter()
            .filter(|(op, _)| *op == operation)
            .map(|(_, d)| *d)
            .collect();
        mean(&durations)
    }

    fn record(&self, operation: OperationKind, duration_ms: f64, metadata: Option<Metadata>) {
        self.window.lock().push((operation, duration_ms));
        self.collector
            .record_component_metric(ComponentPerformanceMetric {
                id: Uuid::new_v4().to_string(),
                component_name: self.component_name.clone(),
                operation,
                duration_ms,
                timestamp: Utc::now(),
                metadata,
            });
    }
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1_000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use evalboard_core::config::TelemetryConfig;
    use evalboard_core::models::telemetry::MetadataValue;
    use std::time::Duration;

    fn collector(monitoring: bool) -> Arc<TelemetryCollector> {
        let config = TelemetryConfig {
            component_monitoring: monitoring,
            ..TelemetryConfig::default()
        };
        Arc::new(TelemetryCollector::with_draw(config, None, 0.0))
    }

    #[test]
    fn render_is_recorded_per_component() {
        let collector = collector(true);
        let radar = ComponentMonitor::new("RadarPanel", Arc::clone(&collector));
        let trend = ComponentMonitor::new("TrendPanel", Arc::clone(&collector));

        assert_eq!(radar.measure_render(|| 7), 7);
        radar.measure_render(|| ());
        trend.measure_render(|| ());

        assert_eq!(radar.metrics().len(), 2);
        assert_eq!(trend.metrics().len(), 1);
        assert_eq!(collector.component_metrics().len(), 3);
        assert!(radar.metrics().iter().all(|m| m.operation == OperationKind::Render));
    }

    #[tokio::test(start_paused = true)]
    async fn data_fetch_failure_keeps_original_error() {
        let collector = collector(true);
        let monitor = ComponentMonitor::new("ScoreTable", collector);

        let mut metadata = Metadata::new();
        metadata.insert("endpoint".into(), "/scores".into());
        let result: Result<u32, String> = monitor
            .measure_data_fetch(
                async {
                    tokio::time::sleep(Duration::from_millis(80)).await;
                    Err("timeout".to_string())
                },
                Some(metadata),
            )
            .await;
        assert_eq!(result, Err("timeout".to_string()));

        let metrics = monitor.metrics();
        assert_eq!(metrics.len(), 1);
        let recorded = metrics[0].metadata.as_ref().unwrap();
        assert_eq!(recorded["success"], MetadataValue::Bool(false));
        assert_eq!(recorded["error"], MetadataValue::Text("timeout".into()));
        assert_eq!(recorded["endpoint"], MetadataValue::Text("/scores".into()));
        assert!(metrics[0].duration_ms >= 80.0);
        assert!(monitor.local_average(OperationKind::DataFetch) >= 80.0);
    }

    #[test]
    fn disabled_monitoring_is_noop() {
        let collector = collector(false);
        let monitor = ComponentMonitor::new("RadarPanel", Arc::clone(&collector));
        assert_eq!(monitor.measure_render(|| "ok"), "ok");
        monitor.measure_chart_render("radar", || ());
        assert!(monitor.metrics().is_empty());
        assert_eq!(monitor.average_render_time(), 0.0);
        assert!(collector.metrics().is_empty());
    }

    #[test]
    fn chart_render_feeds_collector() {
        let collector = collector(true);
        let monitor = ComponentMonitor::new("AnalyticsPage", Arc::clone(&collector));
        monitor.measure_chart_render("clustered-bar", || ());

        assert_eq!(monitor.metrics()[0].operation, OperationKind::ChartRender);
        assert_eq!(collector.metrics()[0].name, "chart_render:clustered-bar");
    }

    #[test]
    fn average_ignores_non_render_operations() {
        let collector = collector(true);
        let monitor = ComponentMonitor::new("Toolbar", collector);
        monitor.measure_interaction("export_click", || ());
        assert_eq!(monitor.average_render_time(), 0.0);
        assert_eq!(monitor.local_average(OperationKind::Render), 0.0);
    }
}
