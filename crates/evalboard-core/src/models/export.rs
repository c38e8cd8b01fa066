//! 리포트 내보내기 모델.
//!
//! 내보내기 형식, 파이프라인 단계, 작업 요청, 진행 이벤트, 결과를 정의.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;
use crate::models::report::ReportPayload;

/// 내보내기 형식
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// 커버 페이지 + 래스터 캡처 페이지로 구성된 PDF
    Pdf,
    /// 플랫폼 인쇄 대화상자
    Print,
    /// 스타일 포함 단독 HTML 문서
    Html,
    /// 구조화 페이로드 JSON
    Json,
}

impl ExportFormat {
    /// 파일 확장자 (인쇄는 파일을 만들지 않음)
    pub fn extension(&self) -> Option<&'static str> {
        match self {
            ExportFormat::Pdf => Some("pdf"),
            ExportFormat::Html => Some("html"),
            ExportFormat::Json => Some("json"),
            ExportFormat::Print => None,
        }
    }

    /// 저장 시 MIME 타입
    pub fn mime(&self) -> &'static str {
        match self {
            ExportFormat::Pdf => "application/pdf",
            ExportFormat::Html => "text/html;charset=utf-8",
            ExportFormat::Json => "application/json",
            ExportFormat::Print => "text/html;charset=utf-8",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ExportFormat::Pdf => "pdf",
            ExportFormat::Print => "print",
            ExportFormat::Html => "html",
            ExportFormat::Json => "json",
        };
        f.write_str(s)
    }
}

impl FromStr for ExportFormat {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pdf" => Ok(ExportFormat::Pdf),
            "print" => Ok(ExportFormat::Print),
            "html" => Ok(ExportFormat::Html),
            "json" => Ok(ExportFormat::Json),
            other => Err(CoreError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// 내보내기 파이프라인 단계
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportStage {
    Idle,
    Preparing,
    Capturing,
    Rendering,
    Finalizing,
    Complete,
    Failed,
}

impl ExportStage {
    /// 진행 표시용 라벨
    pub fn label(&self) -> &'static str {
        match self {
            ExportStage::Idle => "대기 중",
            ExportStage::Preparing => "리포트 준비 중",
            ExportStage::Capturing => "화면 캡처 중",
            ExportStage::Rendering => "문서 생성 중",
            ExportStage::Finalizing => "파일 저장 중",
            ExportStage::Complete => "완료",
            ExportStage::Failed => "실패",
        }
    }

    /// 종료 상태 여부
    pub fn is_terminal(&self) -> bool {
        matches!(self, ExportStage::Complete | ExportStage::Failed)
    }
}

/// 진행 이벤트 (호출자가 채널로 수신)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportProgress {
    pub stage: ExportStage,
    pub label: String,
}

impl ExportProgress {
    pub fn stage(stage: ExportStage) -> Self {
        Self {
            stage,
            label: stage.label().to_string(),
        }
    }

    pub fn with_label(stage: ExportStage, label: impl Into<String>) -> Self {
        Self {
            stage,
            label: label.into(),
        }
    }
}

/// 내보내기 작업 (영속화하지 않음)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportJob {
    /// 캡처 대상 서브트리 ID
    pub target_id: String,
    pub format: ExportFormat,
    pub employee_name: String,
    /// 평가 기간 이름 (예: "Q3 2026")
    pub period_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<ReportPayload>,
}

impl ExportJob {
    pub fn new(
        target_id: impl Into<String>,
        format: ExportFormat,
        employee_name: impl Into<String>,
        period_name: impl Into<String>,
    ) -> Self {
        Self {
            target_id: target_id.into(),
            format,
            employee_name: employee_name.into(),
            period_name: period_name.into(),
            payload: None,
        }
    }

    pub fn with_payload(mut self, payload: ReportPayload) -> Self {
        self.payload = Some(payload);
        self
    }

    /// 작업 시작 전 동기 검증.
    ///
    /// JSON 내보내기는 페이로드가 필수다.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.format == ExportFormat::Json && self.payload.is_none() {
            return Err(CoreError::validation(
                "payload",
                "JSON 내보내기에는 데이터가 필요합니다",
            ));
        }
        if self.format != ExportFormat::Json && self.target_id.trim().is_empty() {
            return Err(CoreError::validation("target_id", "대상 요소 ID가 비어 있습니다"));
        }
        Ok(())
    }
}

/// 내보내기 결과
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportOutcome {
    pub format: ExportFormat,
    /// 저장 파일 이름 (인쇄는 None)
    pub filename: Option<String>,
    /// 저장된 바이트 수
    pub bytes: usize,
    /// PDF 페이지 수 (커버 포함)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_count: Option<usize>,
    /// 저장 위치 (플랫폼이 알려주는 경우)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl ExportOutcome {
    /// 저장된 콘텐츠의 MIME 타입
    pub fn mime(&self) -> &'static str {
        self.format.mime()
    }
}
