//! 애플리케이션 설정 구조체.
//!
//! 텔레메트리 수집, 리포트 내보내기, 데이터 페치 재시도, 차트 사전 로드 설정을 정의한다.
//! `ConfigManager`가 JSON 파일에서 로드하며, 누락된 필드는 기본값으로 채운다.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::CoreError;
use crate::models::chart::ChartType;

/// 최상위 애플리케이션 설정
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// 텔레메트리 설정
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    /// 내보내기 설정
    #[serde(default)]
    pub export: ExportConfig,
    /// 데이터 페치 설정
    #[serde(default)]
    pub fetch: FetchConfig,
    /// 차트 설정
    #[serde(default)]
    pub charts: ChartConfig,
}

// ============================================================
// 텔레메트리 설정
// ============================================================

/// 텔레메트리 설정. 생성 시점에 고정되며 이후 변경되지 않는다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Core Web Vitals 관측 활성화
    #[serde(default = "default_true")]
    pub enable_core_vitals: bool,
    /// 애플리케이션 지표 기록 활성화
    #[serde(default = "default_true")]
    pub enable_custom_metrics: bool,
    /// 샘플링 비율 (0.0 ~ 1.0)
    #[serde(default = "default_sample_rate")]
    pub sample_rate: f64,
    /// 디버그 모드 (모든 측정값을 info 레벨로 로그)
    #[serde(default)]
    pub debug: bool,
    /// 리포팅 엔드포인트 (없으면 전송하지 않음)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reporting_endpoint: Option<String>,
    /// 지표 이력 최대 개수
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,
    /// 컴포넌트 측정 이력 최대 개수
    #[serde(default = "default_component_history_capacity")]
    pub component_history_capacity: usize,
    /// 컴포넌트 단위 측정 활성화
    #[serde(default = "default_true")]
    pub component_monitoring: bool,
    /// 리포팅 요청 타임아웃 (밀리초)
    #[serde(default = "default_report_timeout_ms")]
    pub report_timeout_ms: u64,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enable_core_vitals: true,
            enable_custom_metrics: true,
            sample_rate: default_sample_rate(),
            debug: false,
            reporting_endpoint: None,
            history_capacity: default_history_capacity(),
            component_history_capacity: default_component_history_capacity(),
            component_monitoring: true,
            report_timeout_ms: default_report_timeout_ms(),
        }
    }
}

// ============================================================
// 내보내기 설정
// ============================================================

/// 리포트 내보내기 설정
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportConfig {
    /// 기본 안정화 대기 (밀리초)
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,
    /// 차트 컨테이너가 있을 때 안정화 대기 (밀리초)
    #[serde(default = "default_chart_settle_ms")]
    pub chart_settle_ms: u64,
    /// 래스터화 픽셀 배율
    #[serde(default = "default_pixel_ratio")]
    pub pixel_ratio: f32,
    /// 래스터화 논리 뷰포트 너비
    #[serde(default = "default_window_width")]
    pub window_width: u32,
    /// 래스터화 제한 시간 (밀리초)
    #[serde(default = "default_raster_timeout_ms")]
    pub raster_timeout_ms: u64,
    /// 캡처 시 강제할 차트 너비
    #[serde(default = "default_chart_width")]
    pub chart_width: u32,
    /// 캡처 시 강제할 차트 높이
    #[serde(default = "default_chart_height")]
    pub chart_height: u32,
    /// 인쇄 대화상자 호출 전 대기 (밀리초)
    #[serde(default = "default_print_settle_ms")]
    pub print_settle_ms: u64,
    /// 저장 디렉토리 (없으면 플랫폼 다운로드 디렉토리)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            settle_ms: default_settle_ms(),
            chart_settle_ms: default_chart_settle_ms(),
            pixel_ratio: default_pixel_ratio(),
            window_width: default_window_width(),
            raster_timeout_ms: default_raster_timeout_ms(),
            chart_width: default_chart_width(),
            chart_height: default_chart_height(),
            print_settle_ms: default_print_settle_ms(),
            output_dir: None,
        }
    }
}

impl ExportConfig {
    /// 차트 유무에 따른 안정화 대기 시간
    pub fn settle_delay(&self, has_charts: bool) -> Duration {
        if has_charts {
            Duration::from_millis(self.chart_settle_ms)
        } else {
            Duration::from_millis(self.settle_ms)
        }
    }

    /// 래스터화 제한 시간
    pub fn raster_timeout(&self) -> Duration {
        Duration::from_millis(self.raster_timeout_ms)
    }

    /// 인쇄 대기 시간
    pub fn print_settle(&self) -> Duration {
        Duration::from_millis(self.print_settle_ms)
    }
}

// ============================================================
// 데이터 페치 설정
// ============================================================

/// 데이터 페치 재시도/캐시 설정
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchConfig {
    /// 최대 시도 횟수 (첫 시도 포함)
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,
    /// 재시도 기본 지연 (밀리초, 시도 번호만큼 선형 증가)
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    /// 포커스 복귀 시 재요청
    #[serde(default)]
    pub refetch_on_focus: bool,
    /// 응답 캐시 TTL (초)
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    /// 응답 캐시 최대 항목 수
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            retry_count: default_retry_count(),
            retry_delay_ms: default_retry_delay_ms(),
            refetch_on_focus: false,
            cache_ttl_secs: default_cache_ttl_secs(),
            cache_capacity: default_cache_capacity(),
        }
    }
}

impl FetchConfig {
    /// 재시도 기본 지연
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    /// 캐시 TTL
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

// ============================================================
// 차트 설정
// ============================================================

/// 차트 로더 설정
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartConfig {
    /// 시작 시 미리 로드할 차트 타입
    #[serde(default)]
    pub preload: Vec<ChartType>,
}

impl AppConfig {
    /// 기본 설정 생성
    pub fn default_config() -> Self {
        Self::default()
    }

    /// 값 범위 검증
    pub fn validate(&self) -> Result<(), CoreError> {
        let rate = self.telemetry.sample_rate;
        if !(0.0..=1.0).contains(&rate) {
            return Err(CoreError::validation(
                "telemetry.sample_rate",
                format!("0.0 ~ 1.0 범위여야 합니다: {rate}"),
            ));
        }
        if self.telemetry.history_capacity == 0 {
            return Err(CoreError::validation(
                "telemetry.history_capacity",
                "0보다 커야 합니다",
            ));
        }
        if self.export.pixel_ratio <= 0.0 {
            return Err(CoreError::validation(
                "export.pixel_ratio",
                "0보다 커야 합니다",
            ));
        }
        if self.fetch.retry_count == 0 {
            return Err(CoreError::validation(
                "fetch.retry_count",
                "최소 1회 이상이어야 합니다",
            ));
        }
        Ok(())
    }

    /// 리포팅 요청 타임아웃을 Duration으로 반환
    pub fn report_timeout(&self) -> Duration {
        Duration::from_millis(self.telemetry.report_timeout_ms)
    }
}

// ============================================================
// 기본값 함수
// ============================================================

fn default_true() -> bool {
    true
}
fn default_sample_rate() -> f64 {
    1.0
}
fn default_history_capacity() -> usize {
    100
}
fn default_component_history_capacity() -> usize {
    1_000
}
fn default_report_timeout_ms() -> u64 {
    5_000
}
fn default_settle_ms() -> u64 {
    500
}
fn default_chart_settle_ms() -> u64 {
    3_000
}
fn default_pixel_ratio() -> f32 {
    3.0
}
fn default_window_width() -> u32 {
    1_600
}
fn default_raster_timeout_ms() -> u64 {
    30_000
}
fn default_chart_width() -> u32 {
    800
}
fn default_chart_height() -> u32 {
    500
}
fn default_print_settle_ms() -> u64 {
    500
}
fn default_retry_count() -> u32 {
    3
}
fn default_retry_delay_ms() -> u64 {
    1_000
}
fn default_cache_ttl_secs() -> u64 {
    300
}
fn default_cache_capacity() -> usize {
    128
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_fills_defaults() {
        let json = r#"{ "telemetry": { "sample_rate": 0.25 }, "fetch": { "retry_count": 5 } }"#;
        let config: AppConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.telemetry.sample_rate, 0.25);
        assert!(config.telemetry.enable_core_vitals);
        assert_eq!(config.telemetry.history_capacity, 100);
        assert_eq!(config.fetch.retry_count, 5);
        assert_eq!(config.fetch.retry_delay_ms, 1_000);
        assert_eq!(config.export.chart_width, 800);
    }

    #[test]
    fn settle_delay_depends_on_charts() {
        let export = ExportConfig::default();
        assert_eq!(export.settle_delay(false), Duration::from_millis(500));
        assert_eq!(export.settle_delay(true), Duration::from_millis(3_000));
    }

    #[test]
    fn validate_rejects_out_of_range_sample_rate() {
        let mut config = AppConfig::default_config();
        assert!(config.validate().is_ok());
        config.telemetry.sample_rate = 1.5;
        assert!(config.validate().is_err());
    }
}
