//! 성능 임계값 점검.
//!
//! 고정 임계값을 넘은 항목마다 경고 1건과 고정 권장 사항 1건을 만든다.

use evalboard_core::models::telemetry::{CoreWebVitals, CustomMetrics, PerformanceReport};

/// LCP 임계값 (ms)
pub const LCP_THRESHOLD_MS: f64 = 2_500.0;
/// FID 임계값 (ms)
pub const FID_THRESHOLD_MS: f64 = 100.0;
/// CLS 임계값
pub const CLS_THRESHOLD: f64 = 0.1;
/// 차트 렌더링 임계값 (ms)
pub const CHART_RENDER_THRESHOLD_MS: f64 = 500.0;

/// 현재 지표를 임계값과 비교
pub fn check(vitals: &CoreWebVitals, custom: &CustomMetrics) -> PerformanceReport {
    let mut report = PerformanceReport::default();

    if let Some(lcp) = vitals.lcp.filter(|v| *v > LCP_THRESHOLD_MS) {
        report
            .alerts
            .push(format!("LCP is too slow: {lcp:.0}ms (threshold {LCP_THRESHOLD_MS:.0}ms)"));
        report.recommendations.push(
            "Optimize the largest above-the-fold element: compress images and defer non-critical resources"
                .to_string(),
        );
    }

    if let Some(fid) = vitals.fid.filter(|v| *v > FID_THRESHOLD_MS) {
        report
            .alerts
            .push(format!("FID is too high: {fid:.0}ms (threshold {FID_THRESHOLD_MS:.0}ms)"));
        report.recommendations.push(
            "Break up long main-thread tasks and defer heavy script evaluation".to_string(),
        );
    }

    if let Some(cls) = vitals.cls.filter(|v| *v > CLS_THRESHOLD) {
        report
            .alerts
            .push(format!("CLS is too high: {cls:.3} (threshold {CLS_THRESHOLD})"));
        report.recommendations.push(
            "Reserve space for charts and images with explicit dimensions".to_string(),
        );
    }

    if let Some(render) = custom
        .chart_render_time
        .filter(|v| *v > CHART_RENDER_THRESHOLD_MS)
    {
        report.alerts.push(format!(
            "Chart rendering is slow: {render:.0}ms (threshold {CHART_RENDER_THRESHOLD_MS:.0}ms)"
        ));
        report.recommendations.push(
            "Reduce chart data points or memoize chart components".to_string(),
        );
    }

    report
}
