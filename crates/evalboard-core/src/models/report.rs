//! 리포트 페이로드 모델.
//!
//! 백엔드에서 받은 평가 데이터를 내보내기/차트 렌더링에 쓰는 형태로 정리한 구조체.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::chart::ChartData;

/// 직원 요약
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeeSummary {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

/// 역량별 평가 점수
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompetencyScore {
    pub competency: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub self_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manager_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub peer_score: Option<f64>,
}

impl CompetencyScore {
    /// 존재하는 점수들의 평균 (없으면 None)
    pub fn average(&self) -> Option<f64> {
        let scores: Vec<f64> = [self.self_score, self.manager_score, self.peer_score]
            .into_iter()
            .flatten()
            .collect();
        if scores.is_empty() {
            None
        } else {
            Some(scores.iter().sum::<f64>() / scores.len() as f64)
        }
    }
}

/// 내보내기용 구조화 페이로드
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportPayload {
    pub employee: EmployeeSummary,
    /// 평가 기간 이름
    pub period: String,
    #[serde(default)]
    pub scores: Vec<CompetencyScore>,
    #[serde(default)]
    pub charts: Vec<ChartData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overall_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<DateTime<Utc>>,
}

impl ReportPayload {
    /// 역량 평균들의 평균 (overall_score가 없을 때 사용)
    pub fn computed_overall(&self) -> Option<f64> {
        if let Some(score) = self.overall_score {
            return Some(score);
        }
        let averages: Vec<f64> = self.scores.iter().filter_map(|s| s.average()).collect();
        if averages.is_empty() {
            None
        } else {
            Some(averages.iter().sum::<f64>() / averages.len() as f64)
        }
    }
}
