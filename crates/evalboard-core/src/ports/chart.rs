//! 차트 컴포넌트 포트.
//!
//! 구현: `evalboard-charts` crate (SVG 렌더러, 모듈 소스)

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::CoreError;
use crate::models::chart::{ChartData, ChartSize, ChartType};

/// 렌더링 가능한 차트 구현
pub trait ChartComponent: Send + Sync {
    /// 담당 차트 타입
    fn chart_type(&self) -> ChartType;

    /// 데이터를 주어진 크기의 SVG 마크업으로 렌더링
    ///
    /// 데이터 형태가 차트 타입과 맞지 않으면 `Validation` 에러.
    fn render_svg(&self, data: &ChartData, size: ChartSize) -> Result<String, CoreError>;
}

/// 차트 모듈 로더 (지연 로드 단위)
#[async_trait]
pub trait ChartModuleSource: Send + Sync {
    /// 차트 타입에 해당하는 구현을 로드
    async fn load(&self, chart_type: ChartType) -> Result<Arc<dyn ChartComponent>, CoreError>;
}
