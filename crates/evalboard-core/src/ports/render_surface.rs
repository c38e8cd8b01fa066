//! 렌더링 표면 포트.
//!
//! 문서 서브트리 탐색, 임시 스타일 주입, 오프스크린 복제, 래스터화, 인쇄 컨텍스트를
//! 추상화한다. 내보내기 파이프라인의 페이지 분할 로직은 이 포트만 바라보므로
//! 실제 렌더링 엔진 없이 고정 크기 비트맵을 돌려주는 가짜 구현으로 테스트할 수 있다.
//!
//! 구현: `evalboard-export` crate (`SnapshotSurface`)

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::CoreError;

/// 탐색된 서브트리 정보
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubtreeInfo {
    /// 서브트리 ID (오프스크린 복제본은 별도 ID)
    pub id: String,
    /// 포함된 차트 컨테이너 수
    pub chart_containers: usize,
    /// 논리 너비
    pub width: u32,
    /// 논리 높이
    pub height: u32,
}

impl SubtreeInfo {
    pub fn has_charts(&self) -> bool {
        self.chart_containers > 0
    }
}

/// 임시 스타일 오버라이드 (고유 ID로 식별)
#[derive(Debug, Clone, PartialEq)]
pub struct StyleOverride {
    pub id: String,
    pub css: String,
}

/// 주입된 스타일 핸들 (제거 시 사용)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleHandle {
    pub id: String,
}

/// 래스터화 옵션
#[derive(Debug, Clone, PartialEq)]
pub struct RasterOptions {
    /// 픽셀 밀도 배율 (인쇄 품질용 1배 초과)
    pub pixel_ratio: f32,
    /// 논리 뷰포트 너비 (반응형 레이아웃을 데스크톱 배치로 고정)
    pub window_width: u32,
    /// 배경색 (CSS 색상)
    pub background: String,
    /// 래스터화 제한 시간
    pub timeout: Duration,
}

/// RGBA8 비트맵
#[derive(Clone, PartialEq)]
pub struct Bitmap {
    pub width: u32,
    pub height: u32,
    /// 행 우선 RGBA 픽셀 (width * height * 4 바이트)
    pub rgba: Vec<u8>,
}

impl Bitmap {
    /// 버퍼 길이를 검증하여 생성
    pub fn new(width: u32, height: u32, rgba: Vec<u8>) -> Result<Self, CoreError> {
        let expected = width as usize * height as usize * 4;
        if width == 0 || height == 0 {
            return Err(CoreError::Render(format!(
                "비트맵 크기 0: {width}x{height}"
            )));
        }
        if rgba.len() != expected {
            return Err(CoreError::Render(format!(
                "비트맵 버퍼 길이 불일치: expected={expected}, actual={}",
                rgba.len()
            )));
        }
        Ok(Self {
            width,
            height,
            rgba,
        })
    }

    /// 단색 비트맵
    pub fn filled(width: u32, height: u32, pixel: [u8; 4]) -> Self {
        let rgba = pixel
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * 4)
            .collect();
        Self {
            width,
            height,
            rgba,
        }
    }
}

impl std::fmt::Debug for Bitmap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bitmap")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.rgba.len())
            .finish()
    }
}

/// 인쇄 컨텍스트 요청
#[derive(Debug, Clone, PartialEq)]
pub struct PrintRequest {
    pub title: String,
    /// 인쇄용으로 가공된 마크업
    pub markup: String,
    /// 인쇄 전용 스타일시트
    pub stylesheet: String,
}

/// 열린 인쇄 컨텍스트 핸들
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrintHandle {
    pub id: String,
}

/// 렌더링 표면 (문서/DOM 능력 인터페이스)
#[async_trait]
pub trait RenderSurface: Send + Sync {
    /// ID로 서브트리 탐색 (없으면 `None`)
    async fn locate_subtree(&self, id: &str) -> Result<Option<SubtreeInfo>, CoreError>;

    /// 임시 스타일 주입
    async fn apply_temporary_style(&self, style: &StyleOverride)
        -> Result<StyleHandle, CoreError>;

    /// 임시 스타일 제거
    async fn remove_temporary_style(&self, handle: &StyleHandle) -> Result<(), CoreError>;

    /// 서브트리에 임시 마커(클래스) 부착
    async fn set_marker(&self, subtree_id: &str, marker: &str) -> Result<(), CoreError>;

    /// 임시 마커 제거
    async fn clear_marker(&self, subtree_id: &str, marker: &str) -> Result<(), CoreError>;

    /// 래스터화 전용 오프스크린 복제본 생성.
    ///
    /// 원본에 주입한 스타일이 복제본에 반영되지 않는 경우를 대비해
    /// `style`을 복제본에 다시 적용한다.
    async fn clone_for_offscreen_render(
        &self,
        subtree: &SubtreeInfo,
        style: &StyleOverride,
    ) -> Result<SubtreeInfo, CoreError>;

    /// 오프스크린 복제본 폐기
    async fn discard_clone(&self, clone: &SubtreeInfo) -> Result<(), CoreError>;

    /// 서브트리 래스터화
    async fn rasterize(
        &self,
        subtree: &SubtreeInfo,
        options: &RasterOptions,
    ) -> Result<Bitmap, CoreError>;

    /// 서브트리 마크업 직렬화
    async fn serialize_markup(&self, subtree: &SubtreeInfo) -> Result<String, CoreError>;

    /// 현재 활성화된 모든 스타일시트 규칙
    async fn active_stylesheets(&self) -> Result<Vec<String>, CoreError>;

    /// 보조 인쇄 컨텍스트 열기
    async fn open_print_context(&self, request: &PrintRequest) -> Result<PrintHandle, CoreError>;

    /// 플랫폼 인쇄 대화상자 호출
    async fn print(&self, handle: &PrintHandle) -> Result<(), CoreError>;

    /// 인쇄 컨텍스트 닫기
    async fn close_print_context(&self, handle: &PrintHandle) -> Result<(), CoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bitmap_rejects_bad_buffer() {
        assert!(Bitmap::new(2, 2, vec![0; 15]).is_err());
        assert!(Bitmap::new(0, 2, vec![]).is_err());
        assert!(Bitmap::new(2, 2, vec![0; 16]).is_ok());
    }

    #[test]
    fn bitmap_filled_len() {
        let bmp = Bitmap::filled(3, 2, [255, 0, 0, 255]);
        assert_eq!(bmp.rgba.len(), 24);
        assert_eq!(&bmp.rgba[4..8], &[255, 0, 0, 255]);
    }
}
