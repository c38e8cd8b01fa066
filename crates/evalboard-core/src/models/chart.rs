//! 차트 모델.
//!
//! 차트 타입 식별자와 차트별 데이터 형태(태그드 유니온)를 정의.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// 차트 타입 (컴파일 타임에 고정된 닫힌 열거형)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChartType {
    /// 역량 레이더 차트
    Radar,
    /// 자기/관리자/동료 평가 묶음 막대 차트
    ClusteredBar,
    /// 분기별 추세선
    TrendLine,
    /// 과거 분기 점수 막대 차트
    HistoricalBar,
}

impl ChartType {
    /// 모든 차트 타입
    pub const ALL: [ChartType; 4] = [
        ChartType::Radar,
        ChartType::ClusteredBar,
        ChartType::TrendLine,
        ChartType::HistoricalBar,
    ];

    /// 식별자 문자열
    pub fn as_str(&self) -> &'static str {
        match self {
            ChartType::Radar => "radar",
            ChartType::ClusteredBar => "clustered-bar",
            ChartType::TrendLine => "trend-line",
            ChartType::HistoricalBar => "historical-bar",
        }
    }
}

impl fmt::Display for ChartType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChartType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ChartType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| CoreError::UnknownChartType(s.to_string()))
    }
}

/// 렌더링 크기 (논리 픽셀)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChartSize {
    pub width: u32,
    pub height: u32,
}

impl ChartSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// 레이더 차트 축 (역량 1개)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RadarAxis {
    /// 역량 이름
    pub label: String,
    /// 점수
    pub score: f64,
    /// 만점
    pub max: f64,
}

/// 묶음 막대 차트의 시리즈 (예: 자기평가, 관리자평가)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarSeries {
    pub name: String,
    /// 카테고리 순서와 같은 순서의 값
    pub values: Vec<f64>,
}

/// 기간별 점수
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodScore {
    /// 기간 이름 (예: "Q3 2026")
    pub period: String,
    pub score: f64,
}

/// 차트별 데이터 형태
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "chart", rename_all = "kebab-case")]
pub enum ChartData {
    Radar {
        axes: Vec<RadarAxis>,
    },
    ClusteredBar {
        categories: Vec<String>,
        series: Vec<BarSeries>,
    },
    TrendLine {
        points: Vec<PeriodScore>,
    },
    HistoricalBar {
        bars: Vec<PeriodScore>,
    },
}

impl ChartData {
    /// 이 데이터가 속하는 차트 타입
    pub fn chart_type(&self) -> ChartType {
        match self {
            ChartData::Radar { .. } => ChartType::Radar,
            ChartData::ClusteredBar { .. } => ChartType::ClusteredBar,
            ChartData::TrendLine { .. } => ChartType::TrendLine,
            ChartData::HistoricalBar { .. } => ChartType::HistoricalBar,
        }
    }
}
