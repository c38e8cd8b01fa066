//! 하위 명령 구현.

use anyhow::{anyhow, Context, Result};
use clap::Args;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use evalboard_core::config::AppConfig;
use evalboard_core::config_manager::ConfigManager;
use evalboard_core::error::CoreError;
use evalboard_core::models::chart::{ChartData, ChartSize, ChartType};
use evalboard_core::models::export::{ExportFormat, ExportJob};
use evalboard_core::models::report::ReportPayload;
use evalboard_core::models::telemetry::OperationKind;
use evalboard_core::ports::render_surface::RenderSurface;
use evalboard_export::{DirectorySaver, SnapshotSurface};
use evalboard_fetch::{FetchOptions, HttpJsonClient, ResourceFetcher};
use evalboard_telemetry::ReplaySignalSource;

use crate::context::AppContext;
use crate::lifecycle::LifecycleManager;

/// 페이로드 API 요청 타임아웃
const PAYLOAD_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Args, Debug)]
pub struct ExportArgs {
    /// 내보내기 형식 (pdf, html, json, print)
    #[arg(long, short = 'f', default_value = "pdf")]
    pub format: ExportFormat,

    /// 스냅샷 번들 디렉토리 (manifest.json 포함)
    #[arg(long, short = 'b')]
    pub bundle: Option<PathBuf>,

    /// 캡처 대상 서브트리 ID
    #[arg(long, short = 't', default_value = "analytics-report")]
    pub target: String,

    /// 직원 이름
    #[arg(long)]
    pub employee: String,

    /// 평가 기간 이름 (예: "Q3 2026")
    #[arg(long)]
    pub period: String,

    /// 리포트 페이로드 JSON 파일 (json 형식에 필요)
    #[arg(long, conflicts_with = "api_base")]
    pub payload: Option<PathBuf>,

    /// 페이로드를 받아올 API 주소
    #[arg(long, requires = "payload_path")]
    pub api_base: Option<String>,

    /// 페이로드 API 경로 (예: /api/reports/emp_001)
    #[arg(long, requires = "api_base")]
    pub payload_path: Option<String>,

    /// 저장 디렉토리 (기본: 설정값 또는 데이터 디렉토리)
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct ChartsArgs {
    /// 설정과 관계없이 모든 차트 타입 미리 로드
    #[arg(long)]
    pub all: bool,

    /// 렌더링할 차트 식별자 (radar, clustered-bar, trend-line, historical-bar)
    #[arg(long, requires = "data")]
    pub render: Option<String>,

    /// 차트 데이터 JSON 파일
    #[arg(long)]
    pub data: Option<PathBuf>,

    #[arg(long)]
    pub width: Option<u32>,

    #[arg(long)]
    pub height: Option<u32>,

    /// SVG 출력 파일 (기본: 표준 출력)
    #[arg(long, short = 'o')]
    pub out: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct VitalsArgs {
    /// 성능 신호 JSON 파일
    #[arg(long, short = 's')]
    pub signals: PathBuf,

    /// 결과를 JSON으로 출력
    #[arg(long)]
    pub json: bool,
}

/// 저장 디렉토리 결정 (CLI 인자 > 설정 > 플랫폼 데이터 디렉토리)
pub fn resolve_output_dir(cli: Option<PathBuf>, config: &AppConfig) -> Result<PathBuf> {
    if let Some(dir) = cli.or_else(|| config.export.output_dir.clone()) {
        return Ok(dir);
    }
    ConfigManager::data_dir().context("저장 디렉토리를 결정할 수 없습니다")
}

pub async fn export(ctx: &AppContext, args: ExportArgs) -> Result<()> {
    let format = args.format;
    let surface: Arc<dyn RenderSurface> = match &args.bundle {
        Some(dir) => Arc::new(
            SnapshotSurface::open(dir)
                .with_context(|| format!("스냅샷 번들 열기 실패: {}", dir.display()))?,
        ),
        None => {
            if format != ExportFormat::Json {
                warn!("스냅샷 번들 없이 {format} 내보내기 요청");
            }
            Arc::new(SnapshotSurface::empty())
        }
    };
    let output_dir = resolve_output_dir(args.output.clone(), ctx.config())?;
    let saver = Arc::new(DirectorySaver::new(output_dir));

    let payload = ctx
        .monitor("ReportPayload")
        .measure_data_fetch(load_payload(ctx, &args), None)
        .await?;

    let mut job = ExportJob::new(args.target, format, args.employee, args.period);
    if let Some(payload) = payload {
        job = job.with_payload(payload);
    }

    let exporter = ctx.exporter(surface, saver);
    let task = exporter.start(job)?;

    // Ctrl+C / SIGTERM 시 협조적 취소
    let cancel = task.cancel_handle();
    let lifecycle = Arc::new(LifecycleManager::new());
    let mut shutdown_rx = lifecycle.subscribe();
    let signals = {
        let lifecycle = Arc::clone(&lifecycle);
        tokio::spawn(async move { lifecycle.wait_for_signal().await })
    };
    let canceller = tokio::spawn(async move {
        if shutdown_rx.wait_for(|stop| *stop).await.is_ok() {
            warn!("종료 요청, 내보내기 취소");
            cancel.cancel();
        }
    });

    let result = ctx
        .telemetry()
        .measure_async_operation(
            &format!("export_{format}"),
            task.wait_with_progress(|progress| println!("  ⏳ {}", progress.label)),
        )
        .await;
    signals.abort();
    canceller.abort();
    if lifecycle.is_shutting_down() {
        info!("종료 요청으로 내보내기 중단");
    }
    let outcome = result?;

    match &outcome.filename {
        Some(filename) => {
            let pages = outcome
                .page_count
                .map(|n| format!(", {n}페이지"))
                .unwrap_or_default();
            println!(
                "✅ 내보내기 완료: {filename} ({}, {}바이트{pages})",
                outcome.mime(),
                outcome.bytes
            );
            if let Some(location) = &outcome.location {
                println!("   저장 위치: {location}");
            }
        }
        None => println!("✅ 인쇄 요청 완료"),
    }
    Ok(())
}

/// 페이로드 로드 (파일 또는 API, 둘 다 없으면 None)
async fn load_payload(ctx: &AppContext, args: &ExportArgs) -> Result<Option<ReportPayload>> {
    if let Some(path) = &args.payload {
        return read_json(path).await.map(Some);
    }
    let (Some(base), Some(path)) = (&args.api_base, &args.payload_path) else {
        return Ok(None);
    };

    let client = Arc::new(HttpJsonClient::new(base, PAYLOAD_REQUEST_TIMEOUT)?);
    let fetcher = ResourceFetcher::<ReportPayload>::mount(
        client.fetch_fn(path.as_str()),
        FetchOptions::from_config(&ctx.config().fetch),
    );
    let state = fetcher.settled().await;
    match (state.data, state.error) {
        (Some(payload), _) => {
            info!("리포트 페이로드 수신: {}", payload.employee.name);
            Ok(Some(payload))
        }
        (None, Some(error)) => Err(anyhow!("리포트 데이터 로드 실패: {error}")),
        (None, None) => Err(anyhow!("리포트 데이터 로드가 완료되지 않았습니다")),
    }
}

async fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("파일 읽기 실패: {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("JSON 파싱 실패: {}", path.display()))
}

pub async fn charts(ctx: &AppContext, args: ChartsArgs) -> Result<()> {
    let loaded = if args.all {
        ctx.charts().preload(&ChartType::ALL).await
    } else {
        ctx.warm_up().await
    };
    info!("차트 미리 로드: {loaded}개");

    let Some(id) = &args.render else {
        let info = ctx.charts().info();
        println!(
            "📊 차트 캐시: {}개 (로드 {:?}, 실패 {:?}, 진행 중 {:?})",
            info.size, info.resolved, info.failed, info.pending
        );
        return Ok(());
    };

    let data_path = args
        .data
        .as_deref()
        .ok_or_else(|| anyhow!("--data 파일이 필요합니다"))?;
    let data: ChartData = read_json(data_path).await?;
    let component = ctx.charts().resolve(id).await.map_err(CoreError::from)?;

    let export = &ctx.config().export;
    let size = ChartSize::new(
        args.width.unwrap_or(export.chart_width),
        args.height.unwrap_or(export.chart_height),
    );
    let monitor = ctx.monitor("ChartRenderer");
    let svg = monitor.measure_chart_render(id, || component.render_svg(&data, size))?;

    match &args.out {
        Some(path) => {
            tokio::fs::write(path, &svg)
                .await
                .with_context(|| format!("SVG 저장 실패: {}", path.display()))?;
            println!(
                "✅ {id} 차트 저장: {} ({}ms)",
                path.display(),
                monitor.local_average(OperationKind::ChartRender).round()
            );
        }
        None => println!("{svg}"),
    }
    Ok(())
}

pub async fn vitals(ctx: &AppContext, args: VitalsArgs) -> Result<()> {
    let source = ReplaySignalSource::from_file(&args.signals)?;
    let telemetry = ctx.telemetry();
    if !telemetry.is_sampled() {
        warn!("샘플링에서 제외된 세션입니다. 지표가 기록되지 않습니다");
    }

    let categories = telemetry.observe(&source);
    telemetry.drain_observers().await;
    info!("신호 {}건 재생 ({categories}개 카테고리)", source.len());

    let vitals = telemetry.vitals();
    let report = telemetry.check_performance_thresholds();

    if args.json {
        let body = serde_json::json!({
            "vitals": vitals,
            "summaries": telemetry.metric_summaries(),
            "report": report,
        });
        println!("{}", serde_json::to_string_pretty(&body)?);
        return Ok(());
    }

    println!("📈 Core Web Vitals");
    let fields = [
        ("LCP", vitals.lcp, "ms"),
        ("FID", vitals.fid, "ms"),
        ("CLS", vitals.cls, ""),
        ("FCP", vitals.fcp, "ms"),
        ("TTFB", vitals.ttfb, "ms"),
    ];
    for (name, value, unit) in fields {
        match value {
            Some(v) => println!("   {name:<5} {v:.3}{unit}"),
            None => println!("   {name:<5} -"),
        }
    }

    if report.is_healthy() {
        println!("✅ 모든 임계값 이내");
    } else {
        println!("⚠️  경고");
        for alert in &report.alerts {
            println!("   - {alert}");
        }
        println!("💡 권장 사항");
        for recommendation in &report.recommendations {
            println!("   - {recommendation}");
        }
    }
    Ok(())
}
