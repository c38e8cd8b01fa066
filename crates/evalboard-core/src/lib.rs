//! # evalboard-core
//!
//! EVALBOARD 도메인 모델, 포트(trait) 정의, 에러 타입.
//! 모든 크레이트가 공유하는 핵심 타입과 인터페이스를 제공한다.
//!
//! ## 구조
//!
//! - [`models`]: 도메인 데이터 구조체 (serde Serialize/Deserialize)
//! - [`ports`]: Hexagonal Architecture 포트 인터페이스 (async_trait)
//! - [`error`]: 핵심 에러 타입 (thiserror)
//! - [`config`]: 애플리케이션 설정 구조체
//! - [`config_manager`]: 설정 파일 관리 (로드/저장)

pub mod config;
pub mod config_manager;
pub mod error;
pub mod models;
pub mod ports;

#[cfg(test)]
mod tests {
    use crate::models::chart::{ChartData, ChartType, RadarAxis};
    use crate::models::report::{EmployeeSummary, ReportPayload};

    #[test]
    fn payload_serde_roundtrip() {
        let payload = ReportPayload {
            employee: EmployeeSummary {
                id: "emp_001".to_string(),
                name: "Jane Doe".to_string(),
                department: Some("Platform".to_string()),
                role: None,
            },
            period: "Q3 2026".to_string(),
            scores: Vec::new(),
            charts: vec![ChartData::Radar {
                axes: vec![RadarAxis {
                    label: "Ownership".to_string(),
                    score: 4.0,
                    max: 5.0,
                }],
            }],
            overall_score: Some(4.2),
            generated_at: Some(chrono::Utc::now()),
        };

        let json = serde_json::to_string(&payload).unwrap();
        let deserialized: ReportPayload = serde_json::from_str(&json).unwrap();

        assert_eq!(deserialized.employee.name, "Jane Doe");
        assert_eq!(deserialized.charts[0].chart_type(), ChartType::Radar);
        assert!(json.contains("\"chart\":\"radar\""));
    }

    #[test]
    fn config_defaults() {
        let config = crate::config::AppConfig::default_config();
        assert_eq!(config.telemetry.history_capacity, 100);
        assert_eq!(config.telemetry.component_history_capacity, 1_000);
        assert_eq!(config.fetch.retry_count, 3);
        assert_eq!(config.export.settle_ms, 500);
        assert_eq!(config.export.chart_settle_ms, 3_000);
        assert!(config.charts.preload.is_empty());
    }
}
