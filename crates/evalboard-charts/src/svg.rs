//! SVG 마크업 조립 헬퍼.

use std::fmt::Write;

/// 시리즈 색상 팔레트 (자기/관리자/동료 순)
pub(crate) const PALETTE: [&str; 6] = [
    "#4f46e5", "#10b981", "#f59e0b", "#ef4444", "#06b6d4", "#8b5cf6",
];

/// 축/격자 색상
pub(crate) const GRID_COLOR: &str = "#e5e7eb";
/// 라벨 색상
pub(crate) const LABEL_COLOR: &str = "#374151";

/// 텍스트 노드용 XML 이스케이프
pub(crate) fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

/// SVG 문서 빌더
pub(crate) struct SvgBuilder {
    body: String,
    width: u32,
    height: u32,
}

impl SvgBuilder {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            body: String::new(),
            width,
            height,
        }
    }

    pub fn line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, stroke: &str) {
        let _ = write!(
            self.body,
            r#"<line x1="{x1:.1}" y1="{y1:.1}" x2="{x2:.1}" y2="{y2:.1}" stroke="{stroke}" stroke-width="1"/>"#
        );
    }

    pub fn rect(&mut self, x: f64, y: f64, w: f64, h: f64, fill: &str) {
        let _ = write!(
            self.body,
            r#"<rect x="{x:.1}" y="{y:.1}" width="{w:.1}" height="{h:.1}" fill="{fill}"/>"#
        );
    }

    pub fn circle(&mut self, cx: f64, cy: f64, r: f64, fill: &str) {
        let _ = write!(
            self.body,
            r#"<circle cx="{cx:.1}" cy="{cy:.1}" r="{r:.1}" fill="{fill}"/>"#
        );
    }

    /// 닫힌 다각형 (fill_opacity로 반투명 채움)
    pub fn polygon(&mut self, points: &[(f64, f64)], stroke: &str, fill_opacity: f64) {
        let _ = write!(
            self.body,
            r#"<polygon points="{}" fill="{stroke}" fill-opacity="{fill_opacity:.2}" stroke="{stroke}" stroke-width="2"/>"#,
            Self::points(points)
        );
    }

    pub fn polyline(&mut self, points: &[(f64, f64)], stroke: &str) {
        let _ = write!(
            self.body,
            r#"<polyline points="{}" fill="none" stroke="{stroke}" stroke-width="2"/>"#,
            Self::points(points)
        );
    }

    pub fn text(&mut self, x: f64, y: f64, anchor: &str, content: &str) {
        let _ = write!(
            self.body,
            r#"<text x="{x:.1}" y="{y:.1}" text-anchor="{anchor}" font-size="12" fill="{LABEL_COLOR}">{}</text>"#,
            escape(content)
        );
    }

    pub fn finish(self) -> String {
        format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">{body}</svg>"#,
            w = self.width,
            h = self.height,
            body = self.body
        )
    }

    fn points(points: &[(f64, f64)]) -> String {
        points
            .iter()
            .map(|(x, y)| format!("{x:.1},{y:.1}"))
            .collect::<Vec<_>>()
            .join(" ")
    }
}
