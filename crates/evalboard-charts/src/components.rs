//! 차트 컴포넌트 구현.
//!
//! 각 컴포넌트는 자신의 `ChartData` 변형만 받아 SVG로 렌더링한다.
//! 다른 변형이 들어오면 `Validation` 에러를 돌려준다.

use std::f64::consts::PI;

use evalboard_core::error::CoreError;
use evalboard_core::models::chart::{BarSeries, ChartData, ChartSize, ChartType, PeriodScore, RadarAxis};
use evalboard_core::ports::chart::ChartComponent;

use crate::svg::{SvgBuilder, GRID_COLOR, PALETTE};

/// 플롯 영역 여백 (px)
const PADDING: f64 = 40.0;
/// 점수 축 최소 상한 (5점 척도)
const MIN_SCALE: f64 = 5.0;

fn mismatch(expected: ChartType, data: &ChartData) -> CoreError {
    CoreError::validation(
        "chart",
        format!("{expected} 차트에 {} 데이터가 전달됨", data.chart_type()),
    )
}

fn plot_area(size: ChartSize) -> Result<(f64, f64), CoreError> {
    let w = size.width as f64 - PADDING * 2.0;
    let h = size.height as f64 - PADDING * 2.0;
    if w <= 0.0 || h <= 0.0 {
        return Err(CoreError::validation(
            "size",
            format!("렌더링 크기가 너무 작습니다: {}x{}", size.width, size.height),
        ));
    }
    Ok((w, h))
}

fn scale_max(values: impl Iterator<Item = f64>) -> f64 {
    values.fold(MIN_SCALE, f64::max)
}

// ============================================================
// 레이더 차트
// ============================================================

/// 역량 레이더 차트
#[derive(Debug, Default)]
pub struct RadarChart;

impl RadarChart {
    fn render(axes: &[RadarAxis], size: ChartSize) -> Result<String, CoreError> {
        if axes.len() < 3 {
            return Err(CoreError::validation(
                "axes",
                format!("레이더 차트는 축이 3개 이상 필요합니다: {}", axes.len()),
            ));
        }
        let (w, h) = plot_area(size)?;
        let cx = size.width as f64 / 2.0;
        let cy = size.height as f64 / 2.0;
        let radius = w.min(h) / 2.0;
        let n = axes.len() as f64;
        let point = |i: usize, ratio: f64| {
            let angle = 2.0 * PI * i as f64 / n - PI / 2.0;
            (cx + radius * ratio * angle.cos(), cy + radius * ratio * angle.sin())
        };

        let mut svg = SvgBuilder::new(size.width, size.height);
        // 동심 격자 (25% 단위)
        for ring in 1..=4 {
            let ratio = ring as f64 / 4.0;
            let ring_points: Vec<_> = (0..axes.len()).map(|i| point(i, ratio)).collect();
            svg.polygon(&ring_points, GRID_COLOR, 0.0);
        }
        for (i, axis) in axes.iter().enumerate() {
            let (x, y) = point(i, 1.0);
            svg.line(cx, cy, x, y, GRID_COLOR);
            let (lx, ly) = point(i, 1.12);
            svg.text(lx, ly, "middle", &axis.label);
        }

        let values: Vec<_> = axes
            .iter()
            .enumerate()
            .map(|(i, axis)| {
                let ratio = if axis.max > 0.0 {
                    (axis.score / axis.max).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                point(i, ratio)
            })
            .collect();
        svg.polygon(&values, PALETTE[0], 0.25);
        for &(x, y) in &values {
            svg.circle(x, y, 3.0, PALETTE[0]);
        }
        Ok(svg.finish())
    }
}

impl ChartComponent for RadarChart {
    fn chart_type(&self) -> ChartType {
        ChartType::Radar
    }

    fn render_svg(&self, data: &ChartData, size: ChartSize) -> Result<String, CoreError> {
        match data {
            ChartData::Radar { axes } => Self::render(axes, size),
            other => Err(mismatch(ChartType::Radar, other)),
        }
    }
}

// ============================================================
// 묶음 막대 차트
// ============================================================

/// 자기/관리자/동료 평가 묶음 막대 차트
#[derive(Debug, Default)]
pub struct ClusteredBarChart;

impl ClusteredBarChart {
    fn render(
        categories: &[String],
        series: &[BarSeries],
        size: ChartSize,
    ) -> Result<String, CoreError> {
        if categories.is_empty() || series.is_empty() {
            return Err(CoreError::validation("series", "카테고리와 시리즈가 비어 있습니다"));
        }
        if let Some(bad) = series.iter().find(|s| s.values.len() != categories.len()) {
            return Err(CoreError::validation(
                "series",
                format!(
                    "시리즈 '{}' 값 개수 불일치: expected={}, actual={}",
                    bad.name,
                    categories.len(),
                    bad.values.len()
                ),
            ));
        }
        let (w, h) = plot_area(size)?;
        let max = scale_max(series.iter().flat_map(|s| s.values.iter().copied()));
        let baseline = PADDING + h;
        let group_w = w / categories.len() as f64;
        let bar_w = group_w * 0.8 / series.len() as f64;

        let mut svg = SvgBuilder::new(size.width, size.height);
        svg.line(PADDING, baseline, PADDING + w, baseline, GRID_COLOR);
        for (ci, category) in categories.iter().enumerate() {
            let group_x = PADDING + group_w * ci as f64 + group_w * 0.1;
            for (si, s) in series.iter().enumerate() {
                let value = s.values[ci].max(0.0);
                let bar_h = h * value / max;
                svg.rect(
                    group_x + bar_w * si as f64,
                    baseline - bar_h,
                    bar_w,
                    bar_h,
                    PALETTE[si % PALETTE.len()],
                );
            }
            svg.text(group_x + group_w * 0.4, baseline + 16.0, "middle", category);
        }
        // 범례
        for (si, s) in series.iter().enumerate() {
            let x = PADDING + si as f64 * 120.0;
            svg.rect(x, 10.0, 10.0, 10.0, PALETTE[si % PALETTE.len()]);
            svg.text(x + 14.0, 19.0, "start", &s.name);
        }
        Ok(svg.finish())
    }
}

impl ChartComponent for ClusteredBarChart {
    fn chart_type(&self) -> ChartType {
        ChartType::ClusteredBar
    }

    fn render_svg(&self, data: &ChartData, size: ChartSize) -> Result<String, CoreError> {
        match data {
            ChartData::ClusteredBar { categories, series } => {
                Self::render(categories, series, size)
            }
            other => Err(mismatch(ChartType::ClusteredBar, other)),
        }
    }
}

// ============================================================
// 추세선 / 과거 막대 차트
// ============================================================

/// 분기별 추세선
#[derive(Debug, Default)]
pub struct TrendLineChart;

impl TrendLineChart {
    fn render(points: &[PeriodScore], size: ChartSize) -> Result<String, CoreError> {
        if points.is_empty() {
            return Err(CoreError::validation("points", "추세 데이터가 비어 있습니다"));
        }
        let (w, h) = plot_area(size)?;
        let max = scale_max(points.iter().map(|p| p.score));
        let baseline = PADDING + h;
        let step = if points.len() > 1 {
            w / (points.len() - 1) as f64
        } else {
            0.0
        };

        let coords: Vec<_> = points
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let x = if points.len() > 1 {
                    PADDING + step * i as f64
                } else {
                    PADDING + w / 2.0
                };
                (x, baseline - h * p.score.max(0.0) / max)
            })
            .collect();

        let mut svg = SvgBuilder::new(size.width, size.height);
        svg.line(PADDING, baseline, PADDING + w, baseline, GRID_COLOR);
        svg.polyline(&coords, PALETTE[0]);
        for (p, &(x, y)) in points.iter().zip(&coords) {
            svg.circle(x, y, 4.0, PALETTE[0]);
            svg.text(x, baseline + 16.0, "middle", &p.period);
        }
        Ok(svg.finish())
    }
}

impl ChartComponent for TrendLineChart {
    fn chart_type(&self) -> ChartType {
        ChartType::TrendLine
    }

    fn render_svg(&self, data: &ChartData, size: ChartSize) -> Result<String, CoreError> {
        match data {
            ChartData::TrendLine { points } => Self::render(points, size),
            other => Err(mismatch(ChartType::TrendLine, other)),
        }
    }
}

/// 과거 분기 점수 막대 차트
#[derive(Debug, Default)]
pub struct HistoricalBarChart;

impl HistoricalBarChart {
    fn render(bars: &[PeriodScore], size: ChartSize) -> Result<String, CoreError> {
        if bars.is_empty() {
            return Err(CoreError::validation("bars", "과거 점수 데이터가 비어 있습니다"));
        }
        let (w, h) = plot_area(size)?;
        let max = scale_max(bars.iter().map(|b| b.score));
        let baseline = PADDING + h;
        let slot = w / bars.len() as f64;

        let mut svg = SvgBuilder::new(size.width, size.height);
        svg.line(PADDING, baseline, PADDING + w, baseline, GRID_COLOR);
        for (i, bar) in bars.iter().enumerate() {
            let bar_h = h * bar.score.max(0.0) / max;
            let x = PADDING + slot * i as f64 + slot * 0.15;
            svg.rect(x, baseline - bar_h, slot * 0.7, bar_h, PALETTE[1]);
            svg.text(x + slot * 0.35, baseline + 16.0, "middle", &bar.period);
        }
        Ok(svg.finish())
    }
}

impl ChartComponent for HistoricalBarChart {
    fn chart_type(&self) -> ChartType {
        ChartType::HistoricalBar
    }

    fn render_svg(&self, data: &ChartData, size: ChartSize) -> Result<String, CoreError> {
        match data {
            ChartData::HistoricalBar { bars } => Self::render(bars, size),
            other => Err(mismatch(ChartType::HistoricalBar, other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    const SIZE: ChartSize = ChartSize::new(800, 500);

    fn axes(n: usize) -> Vec<RadarAxis> {
        (0..n)
            .map(|i| RadarAxis {
                label: format!("C{i}"),
                score: 3.0,
                max: 5.0,
            })
            .collect()
    }

    #[test]
    fn radar_renders_all_labels() {
        let svg = RadarChart
            .render_svg(&ChartData::Radar { axes: axes(5) }, SIZE)
            .unwrap();
        for i in 0..5 {
            assert!(svg.contains(&format!(">C{i}</text>")));
        }
        assert!(svg.contains(r#"width="800""#));
    }

    #[test]
    fn radar_needs_three_axes() {
        let result = RadarChart.render_svg(&ChartData::Radar { axes: axes(2) }, SIZE);
        assert_matches!(result, Err(CoreError::Validation { field, .. }) if field == "axes");
    }

    #[test]
    fn mismatched_data_is_rejected() {
        let data = ChartData::TrendLine { points: Vec::new() };
        assert_matches!(
            RadarChart.render_svg(&data, SIZE),
            Err(CoreError::Validation { field, .. }) if field == "chart"
        );
    }

    #[test]
    fn clustered_bar_checks_series_length() {
        let data = ChartData::ClusteredBar {
            categories: vec!["Delivery".into(), "Ownership".into()],
            series: vec![BarSeries {
                name: "Self".into(),
                values: vec![4.0],
            }],
        };
        assert!(ClusteredBarChart.render_svg(&data, SIZE).is_err());
    }

    #[test]
    fn clustered_bar_draws_one_rect_per_value() {
        let data = ChartData::ClusteredBar {
            categories: vec!["Delivery".into(), "Ownership".into()],
            series: vec![
                BarSeries {
                    name: "Self".into(),
                    values: vec![4.0, 3.0],
                },
                BarSeries {
                    name: "Manager".into(),
                    values: vec![3.5, 4.5],
                },
            ],
        };
        let svg = ClusteredBarChart.render_svg(&data, SIZE).unwrap();
        // 막대 4개 + 범례 2개
        assert_eq!(svg.matches("<rect").count(), 6);
    }

    #[test]
    fn trend_line_single_point_is_centered() {
        let data = ChartData::TrendLine {
            points: vec![PeriodScore {
                period: "Q1".into(),
                score: 2.5,
            }],
        };
        let svg = TrendLineChart.render_svg(&data, SIZE).unwrap();
        assert!(svg.contains(r#"cx="400.0""#));
    }

    #[test]
    fn tiny_size_is_rejected() {
        let data = ChartData::HistoricalBar {
            bars: vec![PeriodScore {
                period: "Q1".into(),
                score: 2.5,
            }],
        };
        assert!(HistoricalBarChart
            .render_svg(&data, ChartSize::new(60, 60))
            .is_err());
    }
}
