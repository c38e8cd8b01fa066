//! PDF 조립.
//!
//! 1페이지는 벡터 텍스트로 그린 커버, 이후 페이지는 캡처 비트맵 조각이다.
//! 내장 Helvetica 폰트를 쓰므로 Latin-1 밖 문자는 `?`로 표시된다.

use chrono::NaiveDate;
use printpdf::image_crate::{DynamicImage, RgbImage};
use printpdf::{
    BuiltinFont, Color, Image, ImageTransform, IndirectFontRef, Line, Mm, PdfDocument,
    PdfLayerReference, Point, Rect, Rgb,
};
use tracing::debug;

use evalboard_core::error::CoreError;
use evalboard_core::ports::render_surface::Bitmap;

use crate::layout::{plan_content, ContentSlice, PageGeometry};

/// 이미지 배치 기준 DPI
const IMAGE_DPI: f32 = 300.0;
const MM_PER_INCH: f32 = 25.4;

/// 기본 목차
pub const DEFAULT_SECTIONS: [&str; 5] = [
    "Performance Overview",
    "Competency Radar",
    "Self vs Manager vs Peer Assessment",
    "Historical Trend",
    "Summary and Development Areas",
];

/// 커버 페이지 내용
#[derive(Debug, Clone, PartialEq)]
pub struct CoverPage {
    pub title: String,
    pub employee_name: String,
    pub period_name: String,
    pub generated_on: NaiveDate,
    pub sections: Vec<String>,
}

impl CoverPage {
    pub fn new(
        employee_name: impl Into<String>,
        period_name: impl Into<String>,
        generated_on: NaiveDate,
    ) -> Self {
        Self {
            title: "Performance Analytics Report".to_string(),
            employee_name: employee_name.into(),
            period_name: period_name.into(),
            generated_on,
            sections: DEFAULT_SECTIONS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// 조립된 PDF
#[derive(Clone, PartialEq)]
pub struct RenderedPdf {
    pub bytes: Vec<u8>,
    /// 커버 포함 페이지 수
    pub page_count: usize,
}

impl std::fmt::Debug for RenderedPdf {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderedPdf")
            .field("bytes", &self.bytes.len())
            .field("page_count", &self.page_count)
            .finish()
    }
}

fn render_err(e: impl std::fmt::Display) -> CoreError {
    CoreError::Render(format!("PDF 생성 실패: {e}"))
}

/// 커버 + 캡처 페이지로 PDF 조립
pub fn render_pdf(
    cover: &CoverPage,
    capture: &Bitmap,
    page: &PageGeometry,
) -> Result<RenderedPdf, CoreError> {
    let plan = plan_content(capture.width, capture.height, page);
    if plan.slices.is_empty() {
        return Err(CoreError::Render("배치할 캡처 내용이 없습니다".to_string()));
    }

    let (doc, cover_page, cover_layer) = PdfDocument::new(
        latin1(&cover.title),
        Mm(page.width_mm),
        Mm(page.height_mm),
        "Cover",
    );
    let regular = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(render_err)?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(render_err)?;

    let layer = doc.get_page(cover_page).get_layer(cover_layer);
    draw_cover(&layer, cover, page, &regular, &bold);

    for (index, slice) in plan.slices.iter().enumerate() {
        let (page_index, layer_index) = doc.add_page(
            Mm(page.width_mm),
            Mm(page.height_mm),
            format!("Content {}", index + 1),
        );
        let layer = doc.get_page(page_index).get_layer(layer_index);
        let image = slice_image(capture, slice)?;
        place_slice(image, &layer, slice, page);
    }

    let page_count = plan.page_count() + 1;
    let bytes = doc.save_to_bytes().map_err(render_err)?;
    debug!(
        "PDF 조립 완료: {}페이지, {}바이트, 캡처 {}x{}",
        page_count,
        bytes.len(),
        capture.width,
        capture.height
    );
    Ok(RenderedPdf { bytes, page_count })
}

fn draw_cover(
    layer: &PdfLayerReference,
    cover: &CoverPage,
    page: &PageGeometry,
    regular: &IndirectFontRef,
    bold: &IndirectFontRef,
) {
    let left = page.margin_mm + 5.0;
    let right = page.width_mm - page.margin_mm - 5.0;
    let top = page.height_mm;

    // 상단 띠
    layer.set_fill_color(rgb(30, 58, 138));
    layer.add_rect(Rect::new(Mm(0.0), Mm(top - 40.0), Mm(page.width_mm), Mm(top)));

    layer.set_fill_color(rgb(255, 255, 255));
    layer.use_text(latin1(&cover.title), 24.0, Mm(left), Mm(top - 25.0), bold);

    layer.set_fill_color(rgb(17, 24, 39));
    layer.use_text(
        latin1(&cover.employee_name),
        20.0,
        Mm(left),
        Mm(top - 70.0),
        bold,
    );
    layer.set_fill_color(rgb(55, 65, 81));
    layer.use_text(
        format!("Evaluation Period: {}", latin1(&cover.period_name)),
        13.0,
        Mm(left),
        Mm(top - 80.0),
        regular,
    );
    layer.use_text(
        format!("Generated: {}", cover.generated_on.format("%Y-%m-%d")),
        11.0,
        Mm(left),
        Mm(top - 88.0),
        regular,
    );

    // 구분선
    layer.set_outline_color(rgb(59, 130, 246));
    layer.set_outline_thickness(1.5);
    layer.add_line(Line {
        points: vec![
            (Point::new(Mm(left), Mm(top - 96.0)), false),
            (Point::new(Mm(right), Mm(top - 96.0)), false),
        ],
        is_closed: false,
    });

    layer.set_fill_color(rgb(17, 24, 39));
    layer.use_text("Contents", 15.0, Mm(left), Mm(top - 112.0), bold);
    layer.set_fill_color(rgb(55, 65, 81));
    for (i, section) in cover.sections.iter().enumerate() {
        let y = top - 124.0 - i as f32 * 9.0;
        layer.use_text(
            format!("-  {}", latin1(section)),
            12.0,
            Mm(left + 4.0),
            Mm(y),
            regular,
        );
    }

    layer.set_fill_color(rgb(107, 114, 128));
    layer.use_text(
        "Confidential - for internal performance review use only",
        9.0,
        Mm(left),
        Mm(page.margin_mm),
        regular,
    );
}

/// 조각 행을 잘라 흰 배경에 합성한 RGB 이미지로 변환
fn slice_image(capture: &Bitmap, slice: &ContentSlice) -> Result<Image, CoreError> {
    let row_bytes = capture.width as usize * 4;
    let start = slice.src_y as usize * row_bytes;
    let end = start + slice.src_height as usize * row_bytes;
    let rows = capture.rgba.get(start..end).ok_or_else(|| {
        CoreError::Render(format!(
            "캡처 범위 초과: rows {}..{} / {}",
            slice.src_y,
            slice.src_y + slice.src_height,
            capture.height
        ))
    })?;

    let rgb: Vec<u8> = rows
        .chunks_exact(4)
        .flat_map(|px| {
            let alpha = px[3] as u16;
            let blend = |c: u8| ((c as u16 * alpha + 255 * (255 - alpha)) / 255) as u8;
            [blend(px[0]), blend(px[1]), blend(px[2])]
        })
        .collect();

    let buffer = RgbImage::from_raw(capture.width, slice.src_height, rgb)
        .ok_or_else(|| CoreError::Render("캡처 조각 버퍼 생성 실패".to_string()))?;
    Ok(Image::from_dynamic_image(&DynamicImage::ImageRgb8(buffer)))
}

fn place_slice(image: Image, layer: &PdfLayerReference, slice: &ContentSlice, page: &PageGeometry) {
    let natural_width = image.image.width.0 as f32 / IMAGE_DPI * MM_PER_INCH;
    let natural_height = image.image.height.0 as f32 / IMAGE_DPI * MM_PER_INCH;
    let bottom = page.height_mm - slice.y_mm - slice.height_mm;

    image.add_to_layer(
        layer.clone(),
        ImageTransform {
            translate_x: Some(Mm(slice.x_mm)),
            translate_y: Some(Mm(bottom)),
            scale_x: Some(slice.width_mm / natural_width),
            scale_y: Some(slice.height_mm / natural_height),
            dpi: Some(IMAGE_DPI),
            ..Default::default()
        },
    );
}

fn rgb(r: u8, g: u8, b: u8) -> Color {
    Color::Rgb(Rgb::new(
        r as f32 / 255.0,
        g as f32 / 255.0,
        b as f32 / 255.0,
        None,
    ))
}

/// 내장 폰트가 표현할 수 없는 문자를 `?`로 치환
fn latin1(text: &str) -> String {
    text.chars()
        .map(|c| if (c as u32) < 0x100 { c } else { '?' })
        .collect()
}
