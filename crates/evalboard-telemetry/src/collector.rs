//! 성능 텔레메트리 수집기.
//!
//! 생성 시 한 번의 난수 추첨으로 샘플링 여부를 정한다. 샘플링되지 않은 수집기도
//! 존재하지만 모든 기록 호출은 아무 일도 하지 않는다 (측정 대상 작업은 그대로 실행).
//!
//! 지표 이력과 컴포넌트 측정 이력은 고정 용량 FIFO로 보관하며,
//! 리포팅 엔드포인트가 설정되어 있으면 각 기록을 `{type, data}` 봉투로
//! 비동기 전송한다 (실패는 로그만 남기고 재시도하지 않음).

use chrono::Utc;
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use evalboard_core::config::TelemetryConfig;
use evalboard_core::models::telemetry::{
    ComponentPerformanceMetric, CoreWebVitals, CustomMetricKind, CustomMetrics, MetricSummary,
    OperationKind, PerformanceMetric, PerformanceReport, TelemetryEnvelope,
};
use evalboard_core::ports::reporter::MetricsReporter;
use evalboard_core::ports::signals::{PerformanceSignal, SignalCategory, SignalSource};

use crate::history::BoundedHistory;
use crate::thresholds;

/// 페인트 항목 중 FCP로 취급하는 이름
const FIRST_CONTENTFUL_PAINT: &str = "first-contentful-paint";

/// 세션 단위 가변 상태
struct CollectorState {
    metrics: BoundedHistory<PerformanceMetric>,
    components: BoundedHistory<ComponentPerformanceMetric>,
    vitals: CoreWebVitals,
    custom: CustomMetrics,
    url: String,
    user_id: Option<String>,
}

/// 텔레메트리 수집기
pub struct TelemetryCollector {
    config: TelemetryConfig,
    sampled: bool,
    state: Mutex<CollectorState>,
    reporter: Option<Arc<dyn MetricsReporter>>,
    observers: Mutex<Vec<JoinHandle<()>>>,
}

impl TelemetryCollector {
    /// 새 수집기 생성 (샘플링 추첨 포함)
    pub fn new(config: TelemetryConfig, reporter: Option<Arc<dyn MetricsReporter>>) -> Self {
        Self::with_draw(config, reporter, rand::random::<f64>())
    }

    /// 추첨값을 지정하여 생성 (`draw < sample_rate`이면 샘플링)
    pub fn with_draw(
        config: TelemetryConfig,
        reporter: Option<Arc<dyn MetricsReporter>>,
        draw: f64,
    ) -> Self {
        let sampled = draw < config.sample_rate;
        info!(
            "텔레메트리 수집기 생성: sampled={sampled}, rate={}, reporting={}",
            config.sample_rate,
            reporter.is_some()
        );
        let state = CollectorState {
            metrics: BoundedHistory::new(config.history_capacity),
            components: BoundedHistory::new(config.component_history_capacity),
            vitals: CoreWebVitals::default(),
            custom: CustomMetrics::default(),
            url: String::new(),
            user_id: None,
        };
        Self {
            config,
            sampled,
            state: Mutex::new(state),
            reporter,
            observers: Mutex::new(Vec::new()),
        }
    }

    /// 샘플링 여부
    pub fn is_sampled(&self) -> bool {
        self.sampled
    }

    /// 생성 시 고정된 설정
    pub fn config(&self) -> &TelemetryConfig {
        &self.config
    }

    /// 이후 기록에 붙을 페이지 URL과 사용자 ID 설정
    pub fn set_context(&self, url: impl Into<String>, user_id: Option<String>) {
        let mut state = self.state.lock();
        state.url = url.into();
        state.user_id = user_id;
    }

    // ============================================================
    // 기록
    // ============================================================

    /// 지표 1건 기록
    pub fn record_metric(&self, name: impl Into<String>, value: f64) {
        if !self.sampled {
            return;
        }
        let metric = {
            let mut state = self.state.lock();
            let metric = PerformanceMetric {
                name: name.into(),
                value,
                timestamp: Utc::now(),
                url: state.url.clone(),
                user_id: state.user_id.clone(),
            };
            state.metrics.push(metric.clone());
            metric
        };

        if self.config.debug {
            info!("[perf] {} = {:.2}", metric.name, metric.value);
        } else {
            debug!("지표 기록: {} = {:.2}", metric.name, metric.value);
        }
        self.dispatch("metric", &metric);
    }

    /// 애플리케이션 지표 덮어쓰기
    pub fn record_custom_metric(&self, kind: CustomMetricKind, value: f64) {
        if !self.sampled || !self.config.enable_custom_metrics {
            return;
        }
        self.state.lock().custom.set(kind, value);
        debug!("애플리케이션 지표 갱신: {} = {value:.2}", kind.as_str());
    }

    /// 사용자 상호작용 기록
    pub fn record_interaction(&self, action: &str, details: serde_json::Value) {
        if !self.sampled {
            return;
        }
        let data = self.with_context(serde_json::json!({
            "action": action,
            "details": details,
        }));
        debug!("상호작용 기록: {action}");
        self.dispatch_value("interaction", data);
    }

    /// 애플리케이션 에러 기록
    pub fn record_error(&self, message: &str, context: serde_json::Value) {
        if !self.sampled {
            return;
        }
        warn!("애플리케이션 에러 기록: {message}");
        let data = self.with_context(serde_json::json!({
            "message": message,
            "context": context,
        }));
        self.dispatch_value("error", data);
    }

    /// 차트 렌더링 시간 기록 (지표 + 애플리케이션 지표)
    pub fn record_chart_render(&self, chart_name: &str, duration_ms: f64) {
        self.record_metric(format!("chart_render:{chart_name}"), duration_ms);
        self.record_custom_metric(CustomMetricKind::ChartRenderTime, duration_ms);
    }

    /// 동기 차트 렌더링 측정. `op`의 결과(및 패닉)는 그대로 전달된다.
    pub fn measure_chart_render<T>(&self, chart_name: &str, op: impl FnOnce() -> T) -> T {
        let start = Instant::now();
        let result = op();
        self.record_chart_render(chart_name, elapsed_ms(start));
        result
    }

    /// 비동기 작업 측정.
    ///
    /// 성공 시 `async:{name}`, 실패 시 `async_error:{name}` 지표를 기록하고
    /// 원래 결과를 그대로 돌려준다.
    pub async fn measure_async_operation<T, E, F>(&self, name: &str, fut: F) -> Result<T, E>
    where
        F: Future<Output = Result<T, E>>,
        E: Display,
    {
        let start = tokio::time::Instant::now();
        let result = fut.await;
        let duration_ms = start.elapsed().as_secs_f64() * 1_000.0;
        match &result {
            Ok(_) => self.record_metric(format!("async:{name}"), duration_ms),
            Err(e) => {
                debug!("비동기 작업 실패: {name}: {e}");
                self.record_metric(format!("async_error:{name}"), duration_ms);
            }
        }
        result
    }

    // ============================================================
    // 컴포넌트 측정 이력
    // ============================================================

    /// 컴포넌트 측정값 기록
    pub fn record_component_metric(&self, metric: ComponentPerformanceMetric) {
        if !self.sampled || !self.config.component_monitoring {
            return;
        }
        if self.config.debug {
            info!(
                "[perf] {}.{} = {:.2}ms",
                metric.component_name, metric.operation, metric.duration_ms
            );
        }
        self.state.lock().components.push(metric);
    }

    /// 전체 컴포넌트 측정 이력
    pub fn component_metrics(&self) -> Vec<ComponentPerformanceMetric> {
        self.state.lock().components.to_vec()
    }

    /// 특정 컴포넌트의 측정 이력
    pub fn metrics_by_component(&self, component_name: &str) -> Vec<ComponentPerformanceMetric> {
        self.state
            .lock()
            .components
            .iter()
            .filter(|m| m.component_name == component_name)
            .cloned()
            .collect()
    }

    /// 렌더링 평균 시간 (해당 측정이 없으면 0)
    pub fn average_render_time(&self, component_name: Option<&str>) -> f64 {
        let state = self.state.lock();
        let durations: Vec<f64> = state
            .components
            .iter()
            .filter(|m| m.operation == OperationKind::Render)
            .filter(|m| component_name.map_or(true, |name| m.component_name == name))
            .map(|m| m.duration_ms)
            .collect();
        mean(&durations)
    }

    // ============================================================
    // 수동 관측
    // ============================================================

    /// 관측 신호 1건 반영. 값이 갱신되었으면 true.
    pub fn apply_signal(&self, signal: &PerformanceSignal) -> bool {
        if !self.sampled || !self.config.enable_core_vitals {
            return false;
        }
        let update = {
            let mut state = self.state.lock();
            let vitals = &mut state.vitals;
            match signal {
                PerformanceSignal::Paint { name, start_time } => {
                    if name == FIRST_CONTENTFUL_PAINT {
                        set_once(&mut vitals.fcp, *start_time).map(|v| ("FCP", v))
                    } else {
                        None
                    }
                }
                PerformanceSignal::LargestContentfulPaint { start_time } => {
                    set_once(&mut vitals.lcp, *start_time).map(|v| ("LCP", v))
                }
                PerformanceSignal::FirstInput {
                    start_time,
                    processing_start,
                } => set_once(&mut vitals.fid, processing_start - start_time).map(|v| ("FID", v)),
                PerformanceSignal::Navigation {
                    response_start,
                    request_start,
                } => set_once(&mut vitals.ttfb, response_start - request_start)
                    .map(|v| ("TTFB", v)),
                PerformanceSignal::LayoutShift {
                    value,
                    had_recent_input,
                } => {
                    if *had_recent_input {
                        None
                    } else {
                        let total = vitals.cls.unwrap_or(0.0) + value;
                        vitals.cls = Some(total);
                        Some(("CLS", total))
                    }
                }
            }
        };

        match update {
            Some((name, value)) => {
                self.record_metric(name, value);
                true
            }
            None => false,
        }
    }

    /// 신호 소스 구독 시작. 구독에 성공한 카테고리 수를 반환한다.
    ///
    /// 지원하지 않는 카테고리는 로그만 남기고 건너뛴다.
    pub fn observe(self: &Arc<Self>, source: &dyn SignalSource) -> usize {
        if !self.sampled || !self.config.enable_core_vitals {
            return 0;
        }
        let handle = match Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                warn!("tokio 런타임 밖에서 호출됨, 성능 관측 생략");
                return 0;
            }
        };

        let (tx, mut rx) = mpsc::unbounded_channel::<PerformanceSignal>();
        let mut subscribed = 0;
        for category in SignalCategory::ALL {
            match source.subscribe(category, tx.clone()) {
                Ok(()) => subscribed += 1,
                Err(e) => warn!("성능 관측 등록 실패: {category}: {e}"),
            }
        }
        drop(tx);

        let weak = Arc::downgrade(self);
        let task = handle.spawn(async move {
            while let Some(signal) = rx.recv().await {
                let Some(collector) = weak.upgrade() else {
                    break;
                };
                collector.apply_signal(&signal);
            }
            debug!("성능 관측 채널 종료");
        });
        self.observers.lock().push(task);
        info!("성능 관측 시작: {subscribed}개 카테고리");
        subscribed
    }

    /// 관측 태스크가 모두 끝날 때까지 대기 (소스가 채널을 닫아야 반환)
    pub async fn drain_observers(&self) {
        let tasks: Vec<_> = std::mem::take(&mut *self.observers.lock());
        for task in tasks {
            if let Err(e) = task.await {
                if !e.is_cancelled() {
                    warn!("성능 관측 태스크 비정상 종료: {e}");
                }
            }
        }
    }

    // ============================================================
    // 조회
    // ============================================================

    /// 임계값 점검
    pub fn check_performance_thresholds(&self) -> PerformanceReport {
        let state = self.state.lock();
        thresholds::check(&state.vitals, &state.custom)
    }

    /// 지표 이력 (오래된 순)
    pub fn metrics(&self) -> Vec<PerformanceMetric> {
        self.state.lock().metrics.to_vec()
    }

    pub fn vitals(&self) -> CoreWebVitals {
        self.state.lock().vitals.clone()
    }

    pub fn custom_metrics(&self) -> CustomMetrics {
        self.state.lock().custom.clone()
    }

    /// 지표 이름별 통계 (이름 순)
    pub fn metric_summaries(&self) -> Vec<MetricSummary> {
        let mut grouped: BTreeMap<String, Vec<f64>> = BTreeMap::new();
        for metric in self.state.lock().metrics.iter() {
            grouped
                .entry(metric.name.clone())
                .or_default()
                .push(metric.value);
        }
        grouped
            .into_iter()
            .map(|(name, values)| summarize(name, values))
            .collect()
    }

    /// 모든 이력과 지표 초기화
    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.metrics.clear();
        state.components.clear();
        state.vitals = CoreWebVitals::default();
        state.custom = CustomMetrics::default();
        debug!("텔레메트리 이력 초기화");
    }

    /// 관측 태스크 중지
    pub fn shutdown(&self) {
        let tasks: Vec<_> = std::mem::take(&mut *self.observers.lock());
        let count = tasks.len();
        for task in tasks {
            task.abort();
        }
        info!(
            "텔레메트리 수집기 종료: 관측 태스크 {count}개 중지, 지표 {}건 보관",
            self.state.lock().metrics.len()
        );
    }

    // ============================================================
    // 리포팅
    // ============================================================

    fn with_context(&self, mut data: serde_json::Value) -> serde_json::Value {
        let state = self.state.lock();
        if let Some(obj) = data.as_object_mut() {
            obj.insert("timestamp".into(), serde_json::json!(Utc::now()));
            obj.insert("url".into(), serde_json::json!(state.url));
            if let Some(user_id) = &state.user_id {
                obj.insert("userId".into(), serde_json::json!(user_id));
            }
        }
        data
    }

    fn dispatch<S: Serialize>(&self, kind: &str, payload: &S) {
        if self.reporter.is_none() {
            return;
        }
        match serde_json::to_value(payload) {
            Ok(data) => self.dispatch_value(kind, data),
            Err(e) => warn!("텔레메트리 직렬화 실패: {e}"),
        }
    }

    fn dispatch_value(&self, kind: &str, data: serde_json::Value) {
        let Some(reporter) = self.reporter.clone() else {
            return;
        };
        let envelope = TelemetryEnvelope {
            kind: kind.to_string(),
            data,
        };
        match Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(e) = reporter.report(&envelope).await {
                        warn!("텔레메트리 전송 실패 ({}): {e}", envelope.kind);
                    }
                });
            }
            Err(_) => debug!("tokio 런타임 없음, 텔레메트리 전송 생략: {kind}"),
        }
    }
}

impl Drop for TelemetryCollector {
    fn drop(&mut self) {
        for task in self.observers.get_mut().drain(..) {
            task.abort();
        }
    }
}

fn set_once(slot: &mut Option<f64>, value: f64) -> Option<f64> {
    if slot.is_some() {
        return None;
    }
    *slot = Some(value);
    Some(value)
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1_000.0
}

pub(crate) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

fn summarize(name: String, mut values: Vec<f64>) -> MetricSummary {
    values.sort_by(f64::total_cmp);
    let count = values.len();
    // nearest-rank
    let rank = ((count as f64) * 0.95).ceil() as usize;
    let p95 = values[rank.clamp(1, count) - 1];
    MetricSummary {
        name,
        count,
        avg: mean(&values),
        min: values[0],
        max: values[count - 1],
        p95,
    }
}
