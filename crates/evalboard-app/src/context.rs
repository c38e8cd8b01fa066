//! 애플리케이션 컨텍스트.
//!
//! 텔레메트리 수집기와 차트 로더를 명시적으로 만들어 소유하고,
//! 소비자에게는 참조(`Arc`)로 넘긴다. 전역 상태는 두지 않는다.

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

use evalboard_charts::{BuiltinChartSource, ChartLoader};
use evalboard_core::config::AppConfig;
use evalboard_core::ports::file_saver::FileSaver;
use evalboard_core::ports::render_surface::RenderSurface;
use evalboard_core::ports::reporter::MetricsReporter;
use evalboard_export::ReportExporter;
use evalboard_telemetry::{ComponentMonitor, HttpMetricsReporter, TelemetryCollector, TelemetrySlot};

/// 앱 전역 의존성 묶음
pub struct AppContext {
    config: AppConfig,
    telemetry_slot: TelemetrySlot,
    telemetry: Arc<TelemetryCollector>,
    charts: Arc<ChartLoader>,
}

impl AppContext {
    /// 설정 검증 후 의존성 생성
    pub fn init(config: AppConfig) -> Result<Self> {
        config.validate().context("설정 검증 실패")?;

        let reporter: Option<Arc<dyn MetricsReporter>> = match &config.telemetry.reporting_endpoint {
            Some(endpoint) => Some(Arc::new(
                HttpMetricsReporter::new(endpoint, config.report_timeout())
                    .context("텔레메트리 리포터 생성 실패")?,
            )),
            None => None,
        };

        let telemetry_slot = TelemetrySlot::new();
        let telemetry = telemetry_slot.init(config.telemetry.clone(), reporter);
        let charts = Arc::new(ChartLoader::new(Arc::new(BuiltinChartSource::new())));

        info!(
            "앱 컨텍스트 초기화: 샘플링={}, 리포팅={}",
            telemetry.is_sampled(),
            config.telemetry.reporting_endpoint.as_deref().unwrap_or("없음")
        );
        Ok(Self {
            config,
            telemetry_slot,
            telemetry,
            charts,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn telemetry(&self) -> &Arc<TelemetryCollector> {
        &self.telemetry
    }

    pub fn telemetry_slot(&self) -> &TelemetrySlot {
        &self.telemetry_slot
    }

    pub fn charts(&self) -> &Arc<ChartLoader> {
        &self.charts
    }

    /// 컴포넌트 모니터 생성
    pub fn monitor(&self, component_name: &str) -> ComponentMonitor {
        ComponentMonitor::new(component_name, Arc::clone(&self.telemetry))
    }

    /// 설정된 차트 타입 미리 로드
    pub async fn warm_up(&self) -> usize {
        self.charts.preload(&self.config.charts.preload).await
    }

    /// 내보내기 실행기 생성
    pub fn exporter(
        &self,
        surface: Arc<dyn RenderSurface>,
        saver: Arc<dyn FileSaver>,
    ) -> ReportExporter {
        ReportExporter::new(surface, saver, self.config.export.clone())
    }

    /// 관측 태스크 정리, 수집기 종료, 차트 캐시 비움
    pub async fn shutdown(self) {
        self.telemetry.drain_observers().await;
        self.telemetry.shutdown();
        self.charts.clear();
        info!("앱 컨텍스트 종료");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use evalboard_core::models::chart::ChartType;

    #[tokio::test]
    async fn init_wires_shared_instances() {
        let ctx = AppContext::init(AppConfig::default_config()).unwrap();
        // 슬롯 재초기화는 같은 인스턴스를 돌려줌
        let again = ctx
            .telemetry_slot()
            .init(ctx.config().telemetry.clone(), None);
        assert!(Arc::ptr_eq(ctx.telemetry(), &again));

        let monitor = ctx.monitor("Dashboard");
        monitor.measure_render(|| ());
        assert_eq!(ctx.telemetry().metrics_by_component("Dashboard").len(), 1);

        ctx.shutdown().await;
    }

    #[tokio::test]
    async fn warm_up_preloads_configured_types() {
        let mut config = AppConfig::default_config();
        config.charts.preload = vec![ChartType::Radar, ChartType::TrendLine];
        let ctx = AppContext::init(config).unwrap();

        assert_eq!(ctx.warm_up().await, 2);
        assert_eq!(ctx.charts().info().size, 2);

        let charts = Arc::clone(ctx.charts());
        ctx.shutdown().await;
        assert_eq!(charts.info().size, 0);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut config = AppConfig::default_config();
        config.telemetry.sample_rate = 1.5;
        assert!(AppContext::init(config).is_err());
    }
}
