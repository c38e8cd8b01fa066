//! 리포트 내보내기 파이프라인.
//!
//! 단계: idle → preparing → capturing → rendering → finalizing → (complete | failed).
//! 각 단계 전이는 `ExportTask`의 진행 채널로 전달된다.
//!
//! PDF는 임시 스타일과 마커를 붙인 뒤 오프스크린 복제본을 래스터화하고
//! 커버 + 캡처 페이지로 조립한다. 스타일/마커 제거는 성공, 실패, 취소
//! 모든 경로에서 실행된다. HTML/JSON/인쇄는 래스터화를 거치지 않는다.
//!
//! 취소는 협조적이다. 정착 대기 중에는 즉시, 그 외에는 다음 단계 경계에서 반영된다.

use chrono::{Local, NaiveDate};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use evalboard_core::config::ExportConfig;
use evalboard_core::error::CoreError;
use evalboard_core::models::export::{
    ExportFormat, ExportJob, ExportOutcome, ExportProgress, ExportStage,
};
use evalboard_core::ports::file_saver::FileSaver;
use evalboard_core::ports::render_surface::{
    Bitmap, PrintRequest, RasterOptions, RenderSurface, StyleHandle, StyleOverride, SubtreeInfo,
};

use crate::error::ExportError;
use crate::filename::report_filename;
use crate::html::{print_markup, standalone_document};
use crate::layout::PageGeometry;
use crate::pdf::{render_pdf, CoverPage, RenderedPdf};
use crate::style::{capture_override, print_stylesheet, EXPORT_MARKER};

/// 래스터화 배경색
const RASTER_BACKGROUND: &str = "#ffffff";

/// 리포트 내보내기 실행기
#[derive(Clone)]
pub struct ReportExporter {
    surface: Arc<dyn RenderSurface>,
    saver: Arc<dyn FileSaver>,
    config: ExportConfig,
    page: PageGeometry,
    busy: Arc<Mutex<HashSet<String>>>,
    report_date: Option<NaiveDate>,
}

impl ReportExporter {
    pub fn new(
        surface: Arc<dyn RenderSurface>,
        saver: Arc<dyn FileSaver>,
        config: ExportConfig,
    ) -> Self {
        Self {
            surface,
            saver,
            config,
            page: PageGeometry::A4,
            busy: Arc::new(Mutex::new(HashSet::new())),
            report_date: None,
        }
    }

    /// 파일 이름/커버에 쓰는 날짜 고정 (기본: 오늘)
    pub fn with_report_date(mut self, date: NaiveDate) -> Self {
        self.report_date = Some(date);
        self
    }

    pub fn with_page(mut self, page: PageGeometry) -> Self {
        self.page = page;
        self
    }

    /// 대상 서브트리에 진행 중인 작업이 있는지
    pub fn is_busy(&self, target_id: &str) -> bool {
        self.busy.lock().contains(target_id)
    }

    /// 작업 시작.
    ///
    /// 검증 실패와 중복 실행은 표면을 건드리기 전에 동기적으로 거부한다.
    pub fn start(&self, job: ExportJob) -> Result<ExportTask, ExportError> {
        job.validate().map_err(ExportError::Rejected)?;
        let runtime = Handle::try_current().map_err(|_| {
            ExportError::Rejected(CoreError::Internal(
                "tokio 런타임 밖에서 내보내기를 시작할 수 없습니다".to_string(),
            ))
        })?;

        // JSON은 서브트리를 건드리지 않으므로 점유하지 않음
        let guard = if job.format == ExportFormat::Json {
            None
        } else {
            Some(BusyGuard::acquire(&self.busy, &job.target_id)?)
        };

        let (progress_tx, progress_rx) = mpsc::unbounded_channel();
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let date = self
            .report_date
            .unwrap_or_else(|| Local::now().date_naive());

        info!("내보내기 시작: {} → {}", job.format, job.target_id);
        let run = JobRun {
            exporter: self.clone(),
            job,
            date,
            progress: progress_tx,
            cancel: cancel_rx,
            _guard: guard,
        };
        let handle = runtime.spawn(run.run());

        Ok(ExportTask {
            progress: progress_rx,
            cancel: CancelHandle(Arc::new(cancel_tx)),
            handle,
        })
    }

    /// 작업을 끝까지 실행 (진행 이벤트는 버림)
    pub async fn export(&self, job: ExportJob) -> Result<ExportOutcome, ExportError> {
        self.start(job)?.wait().await
    }
}

/// 취소 요청 핸들 (작업과 별도로 보관 가능)
#[derive(Debug, Clone)]
pub struct CancelHandle(Arc<watch::Sender<bool>>);

impl CancelHandle {
    /// 협조적 취소 요청
    pub fn cancel(&self) {
        self.0.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.0.borrow()
    }
}

/// 실행 중인 내보내기 작업
pub struct ExportTask {
    progress: mpsc::UnboundedReceiver<ExportProgress>,
    cancel: CancelHandle,
    handle: JoinHandle<Result<ExportOutcome, ExportError>>,
}

impl ExportTask {
    /// 다음 진행 이벤트 (작업 종료 후 `None`)
    pub async fn next_progress(&mut self) -> Option<ExportProgress> {
        self.progress.recv().await
    }

    /// 협조적 취소 요청
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// 완료 대기
    pub async fn wait(self) -> Result<ExportOutcome, ExportError> {
        match self.handle.await {
            Ok(result) => result,
            Err(e) if e.is_cancelled() => Err(ExportError::Cancelled),
            Err(e) => Err(ExportError::GenerationFailed {
                stage: ExportStage::Failed,
                cause: CoreError::Internal(format!("내보내기 태스크 비정상 종료: {e}")),
            }),
        }
    }

    /// 진행 이벤트를 콜백으로 흘리며 완료 대기
    pub async fn wait_with_progress(
        mut self,
        mut on_progress: impl FnMut(&ExportProgress),
    ) -> Result<ExportOutcome, ExportError> {
        while let Some(progress) = self.progress.recv().await {
            on_progress(&progress);
        }
        self.wait().await
    }
}

impl std::fmt::Debug for ExportTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExportTask")
            .field("finished", &self.handle.is_finished())
            .field("cancelled", &self.cancel.is_cancelled())
            .finish()
    }
}

/// 대상 서브트리 점유 (drop 시 해제)
struct BusyGuard {
    busy: Arc<Mutex<HashSet<String>>>,
    target_id: String,
}

impl BusyGuard {
    fn acquire(busy: &Arc<Mutex<HashSet<String>>>, target_id: &str) -> Result<Self, ExportError> {
        if !busy.lock().insert(target_id.to_string()) {
            return Err(ExportError::AlreadyRunning(target_id.to_string()));
        }
        Ok(Self {
            busy: Arc::clone(busy),
            target_id: target_id.to_string(),
        })
    }
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.busy.lock().remove(&self.target_id);
    }
}

/// 작업 1건의 실행 상태
struct JobRun {
    exporter: ReportExporter,
    job: ExportJob,
    date: NaiveDate,
    progress: mpsc::UnboundedSender<ExportProgress>,
    cancel: watch::Receiver<bool>,
    _guard: Option<BusyGuard>,
}

impl JobRun {
    async fn run(self) -> Result<ExportOutcome, ExportError> {
        let started = tokio::time::Instant::now();
        let result = match self.job.format {
            ExportFormat::Pdf => self.export_pdf().await,
            ExportFormat::Html => self.export_html().await,
            ExportFormat::Json => self.export_json().await,
            ExportFormat::Print => self.export_print().await,
        };

        match &result {
            Ok(outcome) => {
                self.emit(ExportStage::Complete);
                info!(
                    "내보내기 완료: {} ({}바이트, {}ms)",
                    outcome.filename.as_deref().unwrap_or("인쇄"),
                    outcome.bytes,
                    started.elapsed().as_millis()
                );
            }
            Err(ExportError::Cancelled) => {
                self.emit_label(ExportStage::Failed, "취소됨");
                info!("내보내기 취소: {}", self.job.target_id);
            }
            Err(ExportError::GenerationFailed { stage, cause }) => {
                self.emit(ExportStage::Failed);
                error!(
                    "리포트 생성 실패: target={}, format={}, stage={:?}, cause={}",
                    self.job.target_id, self.job.format, stage, cause
                );
            }
            Err(e) => {
                self.emit(ExportStage::Failed);
                error!("내보내기 실패: {e}");
            }
        }
        result
    }

    fn emit(&self, stage: ExportStage) {
        debug!("내보내기 단계: {:?}", stage);
        // 호출자가 수신을 그만둬도 작업은 계속
        let _ = self.progress.send(ExportProgress::stage(stage));
    }

    fn emit_label(&self, stage: ExportStage, label: &str) {
        let _ = self.progress.send(ExportProgress::with_label(stage, label));
    }

    fn check_cancelled(&self) -> Result<(), ExportError> {
        if *self.cancel.borrow() {
            return Err(ExportError::Cancelled);
        }
        Ok(())
    }

    /// 정착 대기 (취소 시 즉시 중단)
    async fn settle(&self, delay: Duration) -> Result<(), ExportError> {
        tokio::select! {
            _ = tokio::time::sleep(delay) => Ok(()),
            _ = cancelled(self.cancel.clone()) => Err(ExportError::Cancelled),
        }
    }

    async fn locate(&self) -> Result<SubtreeInfo, ExportError> {
        self.exporter
            .surface
            .locate_subtree(&self.job.target_id)
            .await
            .map_err(ExportError::at(ExportStage::Preparing))?
            .ok_or_else(|| {
                ExportError::at(ExportStage::Preparing)(CoreError::ElementNotFound(
                    self.job.target_id.clone(),
                ))
            })
    }

    fn document_title(&self) -> String {
        format!(
            "{} {} Performance Analytics",
            self.job.employee_name, self.job.period_name
        )
    }

    async fn save(
        &self,
        format: ExportFormat,
        bytes: Vec<u8>,
        page_count: Option<usize>,
    ) -> Result<ExportOutcome, ExportError> {
        let extension = format.extension().ok_or_else(|| {
            ExportError::at(ExportStage::Finalizing)(CoreError::UnsupportedFormat(
                format.to_string(),
            ))
        })?;
        let filename = report_filename(
            &self.job.employee_name,
            &self.job.period_name,
            self.date,
            extension,
        );
        let saved = self
            .exporter
            .saver
            .save(&filename, format.mime(), &bytes)
            .await
            .map_err(ExportError::at(ExportStage::Finalizing))?;
        Ok(ExportOutcome {
            format,
            filename: Some(filename),
            bytes: bytes.len(),
            page_count,
            location: saved.location,
        })
    }

    async fn export_pdf(&self) -> Result<ExportOutcome, ExportError> {
        self.emit(ExportStage::Preparing);
        let subtree = self.locate().await?;
        let style = capture_override(&self.exporter.config);
        let handle = self
            .exporter
            .surface
            .apply_temporary_style(&style)
            .await
            .map_err(ExportError::at(ExportStage::Preparing))?;

        let rendered = self.capture_and_render(&subtree, &style).await;
        self.cleanup_capture(&subtree, &handle).await;
        let pdf = rendered?;

        self.emit(ExportStage::Finalizing);
        self.save(ExportFormat::Pdf, pdf.bytes, Some(pdf.page_count))
            .await
    }

    async fn capture_and_render(
        &self,
        subtree: &SubtreeInfo,
        style: &StyleOverride,
    ) -> Result<RenderedPdf, ExportError> {
        self.exporter
            .surface
            .set_marker(&subtree.id, EXPORT_MARKER)
            .await
            .map_err(ExportError::at(ExportStage::Preparing))?;
        self.check_cancelled()?;

        self.emit(ExportStage::Capturing);
        let delay = self.exporter.config.settle_delay(subtree.has_charts());
        debug!(
            "캡처 전 대기: {}ms (차트 {}개)",
            delay.as_millis(),
            subtree.chart_containers
        );
        self.settle(delay).await?;
        let bitmap = self.rasterize(subtree, style).await?;
        self.check_cancelled()?;

        self.emit(ExportStage::Rendering);
        let cover = CoverPage::new(&self.job.employee_name, &self.job.period_name, self.date);
        let page = self.exporter.page;
        tokio::task::spawn_blocking(move || render_pdf(&cover, &bitmap, &page))
            .await
            .map_err(|e| {
                ExportError::at(ExportStage::Rendering)(CoreError::Internal(format!(
                    "PDF 조립 태스크 실패: {e}"
                )))
            })?
            .map_err(ExportError::at(ExportStage::Rendering))
    }

    /// 오프스크린 복제본을 래스터화하고 복제본은 항상 폐기
    async fn rasterize(
        &self,
        subtree: &SubtreeInfo,
        style: &StyleOverride,
    ) -> Result<Bitmap, ExportError> {
        let surface = &self.exporter.surface;
        let config = &self.exporter.config;
        let clone = surface
            .clone_for_offscreen_render(subtree, style)
            .await
            .map_err(ExportError::at(ExportStage::Capturing))?;

        let options = RasterOptions {
            pixel_ratio: config.pixel_ratio,
            window_width: config.window_width,
            background: RASTER_BACKGROUND.to_string(),
            timeout: config.raster_timeout(),
        };
        let result = match tokio::time::timeout(options.timeout, surface.rasterize(&clone, &options))
            .await
        {
            Ok(result) => result,
            Err(_) => Err(CoreError::ExecutionTimeout {
                timeout_ms: config.raster_timeout_ms,
            }),
        };

        if let Err(e) = surface.discard_clone(&clone).await {
            warn!("오프스크린 복제본 폐기 실패: {e}");
        }
        result.map_err(ExportError::at(ExportStage::Capturing))
    }

    async fn cleanup_capture(&self, subtree: &SubtreeInfo, handle: &StyleHandle) {
        let surface = &self.exporter.surface;
        if let Err(e) = surface.remove_temporary_style(handle).await {
            warn!("임시 스타일 제거 실패: {e}");
        }
        if let Err(e) = surface.clear_marker(&subtree.id, EXPORT_MARKER).await {
            warn!("임시 마커 제거 실패: {e}");
        }
    }

    async fn export_html(&self) -> Result<ExportOutcome, ExportError> {
        self.emit(ExportStage::Preparing);
        let subtree = self.locate().await?;

        self.emit(ExportStage::Capturing);
        let surface = &self.exporter.surface;
        let markup = surface
            .serialize_markup(&subtree)
            .await
            .map_err(ExportError::at(ExportStage::Capturing))?;
        let stylesheets = surface
            .active_stylesheets()
            .await
            .map_err(ExportError::at(ExportStage::Capturing))?;
        self.check_cancelled()?;

        self.emit(ExportStage::Rendering);
        let document = standalone_document(&self.document_title(), &markup, &stylesheets);

        self.emit(ExportStage::Finalizing);
        self.save(ExportFormat::Html, document.into_bytes(), None)
            .await
    }

    async fn export_json(&self) -> Result<ExportOutcome, ExportError> {
        let Some(payload) = self.job.payload.as_ref() else {
            return Err(ExportError::Rejected(CoreError::validation(
                "payload",
                "JSON 내보내기에는 데이터가 필요합니다",
            )));
        };

        self.emit(ExportStage::Rendering);
        let json = serde_json::to_vec_pretty(payload)
            .map_err(|e| ExportError::at(ExportStage::Rendering)(e.into()))?;

        self.emit(ExportStage::Finalizing);
        self.save(ExportFormat::Json, json, None).await
    }

    async fn export_print(&self) -> Result<ExportOutcome, ExportError> {
        self.emit(ExportStage::Preparing);
        let subtree = self.locate().await?;
        let surface = &self.exporter.surface;
        let markup = surface
            .serialize_markup(&subtree)
            .await
            .map_err(ExportError::at(ExportStage::Preparing))?;

        self.emit(ExportStage::Rendering);
        let request = PrintRequest {
            title: self.document_title(),
            markup: print_markup(&markup),
            stylesheet: print_stylesheet(),
        };
        let handle = surface
            .open_print_context(&request)
            .await
            .map_err(ExportError::at(ExportStage::Rendering))?;

        self.emit(ExportStage::Finalizing);
        let printed = match self.settle(self.exporter.config.print_settle()).await {
            Ok(()) => surface
                .print(&handle)
                .await
                .map_err(ExportError::at(ExportStage::Finalizing)),
            Err(e) => Err(e),
        };
        if let Err(e) = surface.close_print_context(&handle).await {
            warn!("인쇄 컨텍스트 닫기 실패: {e}");
        }
        printed?;

        Ok(ExportOutcome {
            format: ExportFormat::Print,
            filename: None,
            bytes: request.markup.len(),
            page_count: None,
            location: None,
        })
    }
}

/// 취소 신호 대기 (송신측이 사라지면 영원히 대기)
async fn cancelled(mut rx: watch::Receiver<bool>) {
    loop {
        if *rx.borrow_and_update() {
            return;
        }
        if rx.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
