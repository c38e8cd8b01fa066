//! 캡처 이미지 페이지 배치.
//!
//! 래스터 캡처를 A4 본문 영역에 배치한다. 목표 너비는 가용 너비의 90%이며,
//! 한 페이지를 넘으면 가용 높이의 95%로 줄여 보고, 그래도 너무 좁아지면
//! 가용 너비의 85%로 고정한 뒤 높이 방향으로 여러 페이지에 나눈다.
//!
//! 좌표는 모두 mm 단위이며 `y_mm`은 페이지 위쪽 기준이다.

/// 목표 너비 비율 (가용 너비 대비)
pub const TARGET_WIDTH_RATIO: f32 = 0.9;
/// 한 페이지 맞춤 시 높이 비율 (가용 높이 대비)
pub const FIT_HEIGHT_RATIO: f32 = 0.95;
/// 분할 시 너비 비율 (가용 너비 대비)
pub const SPLIT_WIDTH_RATIO: f32 = 0.85;
/// 높이 맞춤 후 허용되는 최소 너비 비율
pub const MIN_FIT_WIDTH_RATIO: f32 = 0.6;
/// 한 페이지 배치 시 위쪽에 두는 여백 비율
pub const TOP_SLACK_RATIO: f32 = 0.1;

const EPSILON: f32 = 1e-4;

/// 페이지 크기와 여백 (mm)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub width_mm: f32,
    pub height_mm: f32,
    pub margin_mm: f32,
}

impl PageGeometry {
    /// A4 세로, 여백 15mm
    pub const A4: PageGeometry = PageGeometry {
        width_mm: 210.0,
        height_mm: 297.0,
        margin_mm: 15.0,
    };

    pub fn available_width(&self) -> f32 {
        self.width_mm - 2.0 * self.margin_mm
    }

    pub fn available_height(&self) -> f32 {
        self.height_mm - 2.0 * self.margin_mm
    }
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self::A4
    }
}

/// 한 페이지에 놓이는 캡처 조각
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContentSlice {
    /// 원본 비트맵에서의 시작 행
    pub src_y: u32,
    /// 원본 비트맵에서의 행 수
    pub src_height: u32,
    pub x_mm: f32,
    pub y_mm: f32,
    pub width_mm: f32,
    pub height_mm: f32,
}

/// 본문 배치 결과
#[derive(Debug, Clone, PartialEq)]
pub struct ContentPlan {
    /// 배율 적용 후 전체 너비
    pub width_mm: f32,
    /// 배율 적용 후 전체 높이
    pub height_mm: f32,
    /// 페이지별 조각 (페이지 순서)
    pub slices: Vec<ContentSlice>,
}

impl ContentPlan {
    /// 본문 페이지 수 (커버 제외)
    pub fn page_count(&self) -> usize {
        self.slices.len()
    }

    pub fn is_split(&self) -> bool {
        self.slices.len() > 1
    }
}

/// 캡처 크기(px)로 본문 배치 계산
pub fn plan_content(src_width: u32, src_height: u32, page: &PageGeometry) -> ContentPlan {
    let avail_w = page.available_width();
    let avail_h = page.available_height();
    let src_w = src_width.max(1) as f32;
    let src_h = src_height.max(1);
    let aspect = src_h as f32 / src_w;

    let mut width = avail_w * TARGET_WIDTH_RATIO;
    let mut height = width * aspect;

    if height > avail_h {
        let fit_height = avail_h * FIT_HEIGHT_RATIO;
        let fit_width = fit_height / aspect;
        if fit_width >= avail_w * MIN_FIT_WIDTH_RATIO {
            width = fit_width;
            height = fit_height;
        } else {
            width = avail_w * SPLIT_WIDTH_RATIO;
            height = width * aspect;
        }
    }

    let x = page.margin_mm + (avail_w - width) / 2.0;

    if height <= avail_h + EPSILON {
        let slack = (avail_h - height).max(0.0);
        return ContentPlan {
            width_mm: width,
            height_mm: height,
            slices: vec![ContentSlice {
                src_y: 0,
                src_height: src_h,
                x_mm: x,
                y_mm: page.margin_mm + slack * TOP_SLACK_RATIO,
                width_mm: width,
                height_mm: height,
            }],
        };
    }

    let pages = ((height / avail_h) - EPSILON).ceil().max(1.0) as usize;
    let to_src = |consumed: f32| -> u32 {
        (((consumed / height) * src_h as f32).round() as u32).min(src_h)
    };

    let mut slices = Vec::with_capacity(pages);
    for index in 0..pages {
        let consumed = index as f32 * avail_h;
        let dest_height = (height - consumed).min(avail_h);
        if dest_height <= EPSILON {
            break;
        }
        let src_y = to_src(consumed);
        let src_end = if index + 1 == pages {
            src_h
        } else {
            to_src(consumed + dest_height)
        };
        if src_end <= src_y {
            continue;
        }
        slices.push(ContentSlice {
            src_y,
            src_height: src_end - src_y,
            x_mm: x,
            y_mm: page.margin_mm,
            width_mm: width,
            height_mm: dest_height,
        });
    }

    ContentPlan {
        width_mm: width,
        height_mm: height,
        slices,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 0.01
    }

    #[test]
    fn wide_capture_fits_one_page() {
        let plan = plan_content(4800, 3600, &PageGeometry::A4);
        assert_eq!(plan.page_count(), 1);
        let slice = plan.slices[0];
        assert!(approx(slice.width_mm, 162.0));
        assert!(approx(slice.height_mm, 121.5));
        // 가로 중앙 정렬
        assert!(approx(slice.x_mm, 24.0));
        // 남는 높이의 10%만 위쪽에
        assert!(approx(slice.y_mm, 15.0 + (267.0 - 121.5) * 0.1));
        assert_eq!(slice.src_y, 0);
        assert_eq!(slice.src_height, 3600);
    }

    #[test]
    fn slightly_tall_capture_shrinks_to_fit() {
        // 90% 너비면 275mm로 넘치지만 95% 높이로 줄이면 한 페이지
        let plan = plan_content(1000, 1700, &PageGeometry::A4);
        assert_eq!(plan.page_count(), 1);
        assert!(approx(plan.height_mm, 267.0 * 0.95));
        assert!(approx(plan.width_mm, 267.0 * 0.95 / 1.7));
    }

    #[test]
    fn very_tall_capture_is_split() {
        let plan = plan_content(1000, 5000, &PageGeometry::A4);
        assert!(plan.is_split());
        assert!(approx(plan.width_mm, 180.0 * 0.85));
        assert!(approx(plan.height_mm, 153.0 * 5.0));
        assert_eq!(plan.page_count(), 3);

        // 마지막 페이지만 나머지 높이
        assert!(approx(plan.slices[0].height_mm, 267.0));
        assert!(approx(plan.slices[1].height_mm, 267.0));
        assert!(approx(plan.slices[2].height_mm, 765.0 - 534.0));
        for slice in &plan.slices {
            assert!(approx(slice.y_mm, 15.0));
            assert!(approx(slice.x_mm, 15.0 + (180.0 - 153.0) / 2.0));
        }
    }

    #[test]
    fn split_slices_cover_every_source_row() {
        for height in [2400u32, 5000, 9999, 20000] {
            let plan = plan_content(900, height, &PageGeometry::A4);
            let mut next = 0;
            for slice in &plan.slices {
                assert_eq!(slice.src_y, next);
                assert!(slice.src_height > 0);
                next = slice.src_y + slice.src_height;
            }
            assert_eq!(next, height);
        }
    }

    #[test]
    fn exact_page_multiple_has_no_empty_tail() {
        // 높이가 정확히 두 페이지인 경우 세 번째 빈 페이지가 생기지 않음
        let page = PageGeometry::A4;
        let width = 153.0_f32;
        let src_w = 1530;
        let src_h = ((2.0 * page.available_height()) / width * src_w as f32).round() as u32;
        let plan = plan_content(src_w, src_h, &page);
        assert_eq!(plan.page_count(), 2);
    }
}
