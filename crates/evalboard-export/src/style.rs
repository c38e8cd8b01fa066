//! 내보내기 전용 스타일.
//!
//! 캡처용 임시 오버라이드와 인쇄용 스타일시트를 생성한다.
//! 오버라이드는 `EXPORT_MARKER` 클래스가 붙은 서브트리에만 적용된다.

use uuid::Uuid;

use evalboard_core::config::ExportConfig;
use evalboard_core::ports::render_surface::StyleOverride;

/// 캡처 중 서브트리에 붙이는 임시 마커 클래스
pub const EXPORT_MARKER: &str = "pdf-export-mode";

/// 캡처용 임시 스타일 오버라이드 (호출마다 고유 ID)
pub fn capture_override(config: &ExportConfig) -> StyleOverride {
    let id = format!("evalboard-export-style-{}", Uuid::new_v4());
    StyleOverride {
        css: capture_css(config.chart_width, config.chart_height),
        id,
    }
}

fn capture_css(chart_width: u32, chart_height: u32) -> String {
    format!(
        r#".{m} button,
.{m} .export-controls,
.{m} .filter-bar,
.{m} .tooltip,
.{m} [data-export-hide] {{
  display: none !important;
}}
.{m} .chart-container {{
  width: {w}px !important;
  height: {h}px !important;
  min-width: {w}px !important;
  min-height: {h}px !important;
  max-width: none !important;
}}
.{m} .chart-container svg {{
  width: 100% !important;
  height: 100% !important;
}}
.{m} {{
  color: #1f2937 !important;
  background: #ffffff !important;
  font-size: 14px !important;
  line-height: 1.5 !important;
}}
.{m} h1 {{ font-size: 28px !important; color: #111827 !important; }}
.{m} h2 {{ font-size: 22px !important; color: #111827 !important; }}
.{m} h3 {{ font-size: 18px !important; color: #1f2937 !important; }}
.{m} section,
.{m} .report-section,
.{m} .chart-container {{
  page-break-inside: avoid !important;
  break-inside: avoid !important;
}}
"#,
        m = EXPORT_MARKER,
        w = chart_width,
        h = chart_height,
    )
}

/// 인쇄 전용 스타일시트
pub fn print_stylesheet() -> String {
    r#"@page { size: A4; margin: 15mm; }
body { background: #ffffff; color: #111827; font-size: 12pt; }
button, nav, .export-controls, .filter-bar, .tooltip, [data-export-hide] {
  display: none !important;
}
.grid, .columns, .dashboard-grid {
  display: block !important;
  column-count: 1 !important;
}
.report-section, section { page-break-before: always; break-before: page; }
.report-section:first-of-type, section:first-of-type { page-break-before: auto; break-before: auto; }
.chart-container { page-break-inside: avoid; break-inside: avoid; }
.embed-placeholder {
  border: 1px dashed #9ca3af;
  padding: 12pt;
  color: #6b7280;
  text-align: center;
}
"#
    .to_string()
}
