//! # evalboard-app
//!
//! EVALBOARD 바이너리 진입점.
//! 설정 로드, 로깅 초기화, DI(`AppContext`), 하위 명령 실행.

mod commands;
mod context;
mod lifecycle;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use evalboard_core::config_manager::ConfigManager;
use evalboard_core::error::CoreError;
use evalboard_export::ExportError;

use crate::commands::{ChartsArgs, ExportArgs, VitalsArgs};
use crate::context::AppContext;

/// 설정 디렉토리를 쓸 수 없을 때 사용하는 설정 파일
const FALLBACK_CONFIG_FILE: &str = "evalboard-config.json";

/// EVALBOARD 성과 평가 대시보드 도구
///
/// 리포트 내보내기, 차트 렌더링, 성능 신호 점검
#[derive(Parser, Debug)]
#[command(name = "evalboard")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// 로그 레벨 (trace, debug, info, warn, error)
    #[arg(long, short = 'l', default_value = "info", global = true)]
    log_level: String,

    /// 설정 파일 경로 (기본: 플랫폼 설정 디렉토리)
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,

    /// 텔레메트리 리포팅 엔드포인트 (설정값 대신 사용)
    #[arg(long, global = true)]
    reporting_endpoint: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 리포트 내보내기 (pdf, html, json, print)
    Export(ExportArgs),
    /// 차트 미리 로드 및 SVG 렌더링
    Charts(ChartsArgs),
    /// 성능 신호 파일 재생 및 임계값 점검
    Vitals(VitalsArgs),
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let log_filter = format!(
        "evalboard={lvl},evalboard_app={lvl},evalboard_core={lvl},evalboard_charts={lvl},evalboard_telemetry={lvl},evalboard_fetch={lvl},evalboard_export={lvl}",
        lvl = args.log_level
    );
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_filter)),
        )
        .init();

    let verbose = matches!(args.log_level.as_str(), "debug" | "trace");
    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report_error(&e, verbose);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<()> {
    let config_manager = match args.config {
        Some(path) => ConfigManager::with_path(path)?,
        None => match ConfigManager::new() {
            Ok(manager) => manager,
            Err(e) => {
                warn!("설정 관리자 초기화 실패, 현재 디렉토리 설정 사용: {e}");
                ConfigManager::with_path(PathBuf::from(FALLBACK_CONFIG_FILE))?
            }
        },
    };
    info!("설정 파일: {}", config_manager.config_path().display());

    // CLI 인자로 설정 오버라이드 (파일에는 저장하지 않음)
    let mut config = config_manager.get();
    if let Some(endpoint) = args.reporting_endpoint {
        config.telemetry.reporting_endpoint = Some(endpoint);
    }

    let ctx = AppContext::init(config)?;
    let result = match args.command {
        Command::Export(export) => commands::export(&ctx, export).await,
        Command::Charts(charts) => commands::charts(&ctx, charts).await,
        Command::Vitals(vitals) => commands::vitals(&ctx, vitals).await,
    };
    ctx.shutdown().await;
    result
}

/// 사용자에게는 일반 메시지만, 상세는 로그와 디버그 출력으로
fn report_error(err: &anyhow::Error, verbose: bool) {
    error!("명령 실패: {err}");
    debug!("에러 상세: {err:?}");

    let message = err
        .chain()
        .find_map(|cause| {
            cause
                .downcast_ref::<ExportError>()
                .map(ExportError::user_message)
                .or_else(|| cause.downcast_ref::<CoreError>().map(CoreError::user_message))
        })
        .unwrap_or("예기치 않은 오류가 발생했습니다.");

    eprintln!("❌ {message}");
    if verbose {
        eprintln!("{err:?}");
    }
}
