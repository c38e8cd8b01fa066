//! 내장 차트 모듈 소스.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use evalboard_core::error::CoreError;
use evalboard_core::models::chart::ChartType;
use evalboard_core::ports::chart::{ChartComponent, ChartModuleSource};

use crate::components::{ClusteredBarChart, HistoricalBarChart, RadarChart, TrendLineChart};

/// 컴파일 타임에 포함된 차트 구현을 돌려주는 소스
#[derive(Debug, Default)]
pub struct BuiltinChartSource;

impl BuiltinChartSource {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ChartModuleSource for BuiltinChartSource {
    async fn load(&self, chart_type: ChartType) -> Result<Arc<dyn ChartComponent>, CoreError> {
        debug!("차트 모듈 로드: {chart_type}");
        let component: Arc<dyn ChartComponent> = match chart_type {
            ChartType::Radar => Arc::new(RadarChart),
            ChartType::ClusteredBar => Arc::new(ClusteredBarChart),
            ChartType::TrendLine => Arc::new(TrendLineChart),
            ChartType::HistoricalBar => Arc::new(HistoricalBarChart),
        };
        Ok(component)
    }
}
