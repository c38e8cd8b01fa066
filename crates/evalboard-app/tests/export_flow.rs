//! 내보내기 흐름 통합 테스트.
//!
//! 스냅샷 번들 → SnapshotSurface → ReportExporter → DirectorySaver.

use assert_matches::assert_matches;
use evalboard_core::config::{AppConfig, ExportConfig};
use evalboard_core::error::CoreError;
use evalboard_core::models::export::{ExportFormat, ExportJob, ExportStage};
use evalboard_core::models::report::ReportPayload;
use evalboard_export::{DirectorySaver, ExportError, ReportExporter, SnapshotSurface};
use evalboard_fetch::{FetchOptions, HttpJsonClient, ResourceFetcher};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

const TARGET: &str = "analytics-report";

/// 600x400 캡처와 마크업/스타일을 가진 번들 생성
fn write_bundle(dir: &Path) {
    let capture = image::RgbaImage::from_pixel(600, 400, image::Rgba([30, 90, 160, 255]));
    capture.save(dir.join("report.png")).unwrap();
    std::fs::write(
        dir.join("report.html"),
        r#"<section id="analytics-report"><h1>Analytics</h1><iframe src="x"></iframe></section>"#,
    )
    .unwrap();
    std::fs::write(dir.join("styles.css"), ".chart-container { color: #333; }").unwrap();
    std::fs::write(
        dir.join("manifest.json"),
        r#"{
            "title": "Analytics",
            "subtrees": [
                { "id": "analytics-report", "chart_containers": 2, "width": 600, "height": 400,
                  "markup": "report.html", "capture": "report.png" }
            ],
            "stylesheets": ["styles.css"]
        }"#,
    )
    .unwrap();
}

/// 안정화 대기를 없앤 설정
fn fast_config() -> ExportConfig {
    ExportConfig {
        settle_ms: 0,
        chart_settle_ms: 0,
        print_settle_ms: 0,
        ..ExportConfig::default()
    }
}

struct Fixture {
    _bundle: tempfile::TempDir,
    output: tempfile::TempDir,
    surface: Arc<SnapshotSurface>,
    exporter: ReportExporter,
}

fn fixture() -> Fixture {
    let bundle = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    write_bundle(bundle.path());
    let surface = Arc::new(
        SnapshotSurface::open(bundle.path())
            .unwrap()
            .with_print_dir(output.path().join("print")),
    );
    let saver = Arc::new(DirectorySaver::new(output.path()));
    let exporter = ReportExporter::new(surface.clone(), saver, fast_config());
    Fixture {
        _bundle: bundle,
        output,
        surface,
        exporter,
    }
}

fn job(format: ExportFormat) -> ExportJob {
    ExportJob::new(TARGET, format, "Jane Doe", "Q3 2026")
}

fn sample_payload() -> ReportPayload {
    serde_json::from_str(
        r#"{
            "employee": { "id": "emp_001", "name": "Jane Doe", "department": "Engineering" },
            "period": "Q3 2026",
            "scores": [
                { "competency": "Communication", "self_score": 4.0, "manager_score": 3.5 }
            ],
            "overall_score": 3.75
        }"#,
    )
    .unwrap()
}

fn saved_files(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_file())
        .map(|e| e.file_name().to_string_lossy().to_string())
        .collect();
    names.sort();
    names
}

#[tokio::test]
async fn pdf_export_writes_cover_and_content() {
    let fx = fixture();
    let mut stages = Vec::new();
    let outcome = fx
        .exporter
        .start(job(ExportFormat::Pdf))
        .unwrap()
        .wait_with_progress(|p| stages.push(p.stage))
        .await
        .unwrap();

    // 1200x800 비트맵은 한 페이지에 들어감
    assert_eq!(outcome.page_count, Some(2));
    assert_eq!(stages.first(), Some(&ExportStage::Preparing));
    assert_eq!(stages.last(), Some(&ExportStage::Complete));

    let filename = outcome.filename.unwrap();
    assert!(filename.starts_with("Jane_Doe_Analytics_Q3_2026_"));
    assert!(filename.ends_with(".pdf"));
    let bytes = std::fs::read(fx.output.path().join(&filename)).unwrap();
    assert!(bytes.starts_with(b"%PDF"));
    assert_eq!(bytes.len(), outcome.bytes);

    // 임시 상태는 모두 정리됨
    assert_eq!(fx.surface.active_style_count(), 0);
    assert_eq!(fx.surface.clone_count(), 0);
    assert!(!fx.surface.has_marker(TARGET, evalboard_export::style::EXPORT_MARKER));
    assert!(!fx.exporter.is_busy(TARGET));
}

#[tokio::test]
async fn repeated_exports_do_not_clobber() {
    let fx = fixture();
    fx.exporter.export(job(ExportFormat::Html)).await.unwrap();
    fx.exporter.export(job(ExportFormat::Html)).await.unwrap();

    let files = saved_files(fx.output.path());
    assert_eq!(files.len(), 2);
    assert!(files.iter().any(|f| f.contains(" (1)")));
}

#[tokio::test]
async fn html_export_inlines_bundle_styles() {
    let fx = fixture();
    let outcome = fx.exporter.export(job(ExportFormat::Html)).await.unwrap();

    let html =
        std::fs::read_to_string(fx.output.path().join(outcome.filename.unwrap())).unwrap();
    assert!(html.contains("<h1>Analytics</h1>"));
    assert!(html.contains(".chart-container { color: #333; }"));
}

#[tokio::test]
async fn print_export_writes_preview_without_embeds() {
    let fx = fixture();
    let outcome = fx.exporter.export(job(ExportFormat::Print)).await.unwrap();
    assert_eq!(outcome.filename, None);

    let previews = saved_files(&fx.output.path().join("print"));
    assert_eq!(previews.len(), 1);
    let preview =
        std::fs::read_to_string(fx.output.path().join("print").join(&previews[0])).unwrap();
    assert!(!preview.contains("<iframe"));
    assert!(preview.contains("@page"));
}

#[tokio::test]
async fn json_export_requires_payload() {
    let fx = fixture();
    let err = fx.exporter.start(job(ExportFormat::Json)).unwrap_err();
    assert_matches!(err, ExportError::Rejected(CoreError::Validation { .. }));

    let outcome = fx
        .exporter
        .export(job(ExportFormat::Json).with_payload(sample_payload()))
        .await
        .unwrap();
    let text =
        std::fs::read_to_string(fx.output.path().join(outcome.filename.unwrap())).unwrap();
    let parsed: ReportPayload = serde_json::from_str(&text).unwrap();
    assert_eq!(parsed, sample_payload());
}

#[tokio::test]
async fn unknown_target_fails_at_preparing() {
    let fx = fixture();
    let err = fx
        .exporter
        .export(ExportJob::new("missing", ExportFormat::Pdf, "Jane Doe", "Q3 2026"))
        .await
        .unwrap_err();
    assert_eq!(err.stage(), Some(ExportStage::Preparing));
    assert!(saved_files(fx.output.path()).is_empty());
}

#[tokio::test]
async fn payload_fetched_over_http_feeds_json_export() {
    let mut server = mockito::Server::new_async().await;
    let body = serde_json::to_string(&sample_payload()).unwrap();
    let mock = server
        .mock("GET", "/api/reports/emp_001")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(body)
        .expect(1)
        .create_async()
        .await;

    let config = AppConfig::default_config();
    let client = Arc::new(HttpJsonClient::new(&server.url(), Duration::from_secs(5)).unwrap());
    let fetcher = ResourceFetcher::<ReportPayload>::mount(
        client.fetch_fn("/api/reports/emp_001"),
        FetchOptions::from_config(&config.fetch),
    );
    let state = fetcher.settled().await;
    mock.assert_async().await;
    assert!(state.error.is_none());

    let payload = state.data.unwrap();
    let fx = fixture();
    let outcome = fx
        .exporter
        .export(job(ExportFormat::Json).with_payload(payload))
        .await
        .unwrap();
    assert!(outcome.filename.unwrap().ends_with(".json"));
}
