//! 스냅샷 번들 렌더링 표면.
//!
//! 브라우저에서 미리 떠 둔 번들(manifest.json + 서브트리 마크업 + PNG 캡처)을
//! `RenderSurface`로 노출한다. 스타일/마커/복제본은 메모리 상태로만 추적하고,
//! 인쇄는 인쇄용 HTML 파일을 쓰는 것으로 대신한다.
//!
//! ```json
//! {
//!   "title": "Analytics",
//!   "subtrees": [
//!     { "id": "analytics-report", "chart_containers": 2, "width": 1200, "height": 1800,
//!       "markup": "report.html", "capture": "report.png" }
//!   ],
//!   "stylesheets": ["styles.css"]
//! }
//! ```

use async_trait::async_trait;
use image::imageops::FilterType;
use parking_lot::Mutex;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use uuid::Uuid;

use evalboard_core::error::CoreError;
use evalboard_core::ports::render_surface::{
    Bitmap, PrintHandle, PrintRequest, RasterOptions, RenderSurface, StyleHandle, StyleOverride,
    SubtreeInfo,
};

use crate::filename::sanitize;
use crate::html::standalone_document;

/// 번들 매니페스트 파일 이름
pub const MANIFEST_FILE: &str = "manifest.json";

#[derive(Debug, Clone, Deserialize)]
struct BundleManifest {
    #[serde(default)]
    title: Option<String>,
    subtrees: Vec<SubtreeEntry>,
    #[serde(default)]
    stylesheets: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct SubtreeEntry {
    id: String,
    #[serde(default)]
    chart_containers: usize,
    width: u32,
    height: u32,
    markup: String,
    #[serde(default)]
    capture: Option<String>,
}

/// 오프스크린 복제본 기록
#[derive(Debug, Clone)]
struct OffscreenClone {
    source_id: String,
    /// 복제본 때문에 새로 주입한 스타일 (폐기 시 제거)
    reapplied_style: Option<String>,
}

/// 스냅샷 번들 표면
pub struct SnapshotSurface {
    root: PathBuf,
    manifest: BundleManifest,
    print_dir: PathBuf,
    styles: Mutex<Vec<StyleOverride>>,
    markers: Mutex<HashSet<(String, String)>>,
    clones: Mutex<HashMap<String, OffscreenClone>>,
    prints: Mutex<HashMap<String, PrintRequest>>,
}

impl SnapshotSurface {
    /// 번들 디렉토리 열기
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, CoreError> {
        let root = root.into();
        let manifest_path = root.join(MANIFEST_FILE);
        let content = std::fs::read_to_string(&manifest_path).map_err(|e| {
            CoreError::Config(format!(
                "스냅샷 매니페스트 읽기 실패: {}: {e}",
                manifest_path.display()
            ))
        })?;
        let manifest: BundleManifest = serde_json::from_str(&content)?;
        debug!(
            "스냅샷 번들 로드: {} (서브트리 {}개)",
            root.display(),
            manifest.subtrees.len()
        );
        Ok(Self {
            print_dir: root.join("print"),
            root,
            manifest,
            styles: Mutex::new(Vec::new()),
            markers: Mutex::new(HashSet::new()),
            clones: Mutex::new(HashMap::new()),
            prints: Mutex::new(HashMap::new()),
        })
    }

    /// 번들 없는 표면 (JSON 내보내기 전용, 모든 서브트리 탐색이 실패)
    pub fn empty() -> Self {
        Self {
            root: PathBuf::from("."),
            manifest: BundleManifest {
                title: None,
                subtrees: Vec::new(),
                stylesheets: Vec::new(),
            },
            print_dir: PathBuf::from("print"),
            styles: Mutex::new(Vec::new()),
            markers: Mutex::new(HashSet::new()),
            clones: Mutex::new(HashMap::new()),
            prints: Mutex::new(HashMap::new()),
        }
    }

    /// 인쇄 미리보기 파일 위치 변경
    pub fn with_print_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.print_dir = dir.into();
        self
    }

    pub fn title(&self) -> Option<&str> {
        self.manifest.title.as_deref()
    }

    /// 현재 주입된 임시 스타일 수
    pub fn active_style_count(&self) -> usize {
        self.styles.lock().len()
    }

    pub fn has_marker(&self, subtree_id: &str, marker: &str) -> bool {
        self.markers
            .lock()
            .contains(&(subtree_id.to_string(), marker.to_string()))
    }

    /// 남아 있는 오프스크린 복제본 수
    pub fn clone_count(&self) -> usize {
        self.clones.lock().len()
    }

    fn entry(&self, id: &str) -> Result<&SubtreeEntry, CoreError> {
        let original = self
            .clones
            .lock()
            .get(id)
            .map(|c| c.source_id.clone())
            .unwrap_or_else(|| id.to_string());
        self.manifest
            .subtrees
            .iter()
            .find(|s| s.id == original)
            .ok_or(CoreError::ElementNotFound(original))
    }

    fn resolve(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }
}

#[async_trait]
impl RenderSurface for SnapshotSurface {
    async fn locate_subtree(&self, id: &str) -> Result<Option<SubtreeInfo>, CoreError> {
        Ok(self
            .manifest
            .subtrees
            .iter()
            .find(|s| s.id == id)
            .map(|s| SubtreeInfo {
                id: s.id.clone(),
                chart_containers: s.chart_containers,
                width: s.width,
                height: s.height,
            }))
    }

    async fn apply_temporary_style(
        &self,
        style: &StyleOverride,
    ) -> Result<StyleHandle, CoreError> {
        let mut styles = self.styles.lock();
        if styles.iter().any(|s| s.id == style.id) {
            return Err(CoreError::validation("style.id", "이미 주입된 스타일 ID입니다"));
        }
        styles.push(style.clone());
        Ok(StyleHandle {
            id: style.id.clone(),
        })
    }

    async fn remove_temporary_style(&self, handle: &StyleHandle) -> Result<(), CoreError> {
        let mut styles = self.styles.lock();
        let before = styles.len();
        styles.retain(|s| s.id != handle.id);
        if styles.len() == before {
            return Err(CoreError::NotFound {
                resource_type: "Style".to_string(),
                id: handle.id.clone(),
            });
        }
        Ok(())
    }

    async fn set_marker(&self, subtree_id: &str, marker: &str) -> Result<(), CoreError> {
        self.entry(subtree_id)?;
        self.markers
            .lock()
            .insert((subtree_id.to_string(), marker.to_string()));
        Ok(())
    }

    async fn clear_marker(&self, subtree_id: &str, marker: &str) -> Result<(), CoreError> {
        self.markers
            .lock()
            .remove(&(subtree_id.to_string(), marker.to_string()));
        Ok(())
    }

    async fn clone_for_offscreen_render(
        &self,
        subtree: &SubtreeInfo,
        style: &StyleOverride,
    ) -> Result<SubtreeInfo, CoreError> {
        self.entry(&subtree.id)?;
        let reapplied_style = {
            let mut styles = self.styles.lock();
            if styles.iter().any(|s| s.id == style.id) {
                None
            } else {
                // 복제본에 스타일을 다시 적용
                styles.push(style.clone());
                Some(style.id.clone())
            }
        };
        let clone_id = format!("{}-offscreen-{}", subtree.id, Uuid::new_v4());
        self.clones.lock().insert(
            clone_id.clone(),
            OffscreenClone {
                source_id: subtree.id.clone(),
                reapplied_style,
            },
        );
        Ok(SubtreeInfo {
            id: clone_id,
            ..subtree.clone()
        })
    }

    async fn discard_clone(&self, clone: &SubtreeInfo) -> Result<(), CoreError> {
        let removed = self.clones.lock().remove(&clone.id);
        if let Some(style_id) = removed.and_then(|c| c.reapplied_style) {
            self.styles.lock().retain(|s| s.id != style_id);
        }
        Ok(())
    }

    async fn rasterize(
        &self,
        subtree: &SubtreeInfo,
        options: &RasterOptions,
    ) -> Result<Bitmap, CoreError> {
        let entry = self.entry(&subtree.id)?;
        let capture = entry.capture.as_deref().ok_or_else(|| {
            CoreError::Render(format!("캡처 이미지가 없는 서브트리: {}", entry.id))
        })?;
        let path = self.resolve(capture);
        let logical_width = entry.width;
        let pixel_ratio = options.pixel_ratio;

        let bitmap = tokio::task::spawn_blocking(move || decode_capture(&path, logical_width, pixel_ratio))
            .await
            .map_err(|e| CoreError::Internal(format!("캡처 디코딩 태스크 실패: {e}")))??;

        debug!(
            "래스터화 완료: {} → {}x{} (배율 {pixel_ratio})",
            subtree.id, bitmap.width, bitmap.height
        );
        Ok(bitmap)
    }

    async fn serialize_markup(&self, subtree: &SubtreeInfo) -> Result<String, CoreError> {
        let entry = self.entry(&subtree.id)?;
        Ok(tokio::fs::read_to_string(self.resolve(&entry.markup)).await?)
    }

    async fn active_stylesheets(&self) -> Result<Vec<String>, CoreError> {
        let mut sheets = Vec::with_capacity(self.manifest.stylesheets.len());
        for relative in &self.manifest.stylesheets {
            sheets.push(tokio::fs::read_to_string(self.resolve(relative)).await?);
        }
        sheets.extend(self.styles.lock().iter().map(|s| s.css.clone()));
        Ok(sheets)
    }

    async fn open_print_context(&self, request: &PrintRequest) -> Result<PrintHandle, CoreError> {
        let id = Uuid::new_v4().to_string();
        self.prints.lock().insert(id.clone(), request.clone());
        Ok(PrintHandle { id })
    }

    async fn print(&self, handle: &PrintHandle) -> Result<(), CoreError> {
        let request = self
            .prints
            .lock()
            .get(&handle.id)
            .cloned()
            .ok_or_else(|| CoreError::NotFound {
                resource_type: "PrintContext".to_string(),
                id: handle.id.clone(),
            })?;
        let document = standalone_document(
            &request.title,
            &request.markup,
            std::slice::from_ref(&request.stylesheet),
        );
        tokio::fs::create_dir_all(&self.print_dir).await?;
        let path = self.print_dir.join(format!("{}.html", sanitize(&request.title)));
        tokio::fs::write(&path, document).await?;
        info!("인쇄 미리보기 저장: {}", path.display());
        Ok(())
    }

    async fn close_print_context(&self, handle: &PrintHandle) -> Result<(), CoreError> {
        if self.prints.lock().remove(&handle.id).is_none() {
            warn!("이미 닫힌 인쇄 컨텍스트: {}", handle.id);
        }
        Ok(())
    }
}

/// PNG 캡처 디코딩. 1배율로 저장된 캡처는 요청 배율까지 확대한다.
fn decode_capture(path: &Path, logical_width: u32, pixel_ratio: f32) -> Result<Bitmap, CoreError> {
    let image = image::open(path)
        .map_err(|e| CoreError::Render(format!("캡처 디코딩 실패: {}: {e}", path.display())))?;
    let mut rgba = image.to_rgba8();

    if pixel_ratio > 1.0 && rgba.width() <= logical_width {
        let width = (rgba.width() as f32 * pixel_ratio).round() as u32;
        let height = (rgba.height() as f32 * pixel_ratio).round() as u32;
        rgba = image::imageops::resize(&rgba, width, height, FilterType::Triangle);
    }

    let (width, height) = rgba.dimensions();
    Bitmap::new(width, height, rgba.into_raw())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};
    use std::time::Duration;

    fn write_bundle(dir: &Path, capture_width: u32) {
        std::fs::write(
            dir.join(MANIFEST_FILE),
            r#"{
                "title": "Analytics",
                "subtrees": [
                    { "id": "analytics-report", "chart_containers": 1, "width": 400, "height": 300,
                      "markup": "report.html", "capture": "report.png" },
                    { "id": "no-capture", "width": 10, "height": 10, "markup": "report.html" }
                ],
                "stylesheets": ["styles.css"]
            }"#,
        )
        .unwrap();
        std::fs::write(dir.join("report.html"), "<section>report</section>").unwrap();
        std::fs::write(dir.join("styles.css"), "section { color: #111; }").unwrap();
        RgbaImage::from_pixel(capture_width, capture_width * 3 / 4, Rgba([10, 20, 30, 255]))
            .save(dir.join("report.png"))
            .unwrap();
    }

    fn options(pixel_ratio: f32) -> RasterOptions {
        RasterOptions {
            pixel_ratio,
            window_width: 1600,
            background: "#ffffff".to_string(),
            timeout: Duration::from_secs(30),
        }
    }

    #[tokio::test]
    async fn locates_and_rasterizes_clone() {
        let dir = tempfile::tempdir().unwrap();
        write_bundle(dir.path(), 1200);
        let surface = SnapshotSurface::open(dir.path()).unwrap();

        let subtree = surface.locate_subtree("analytics-report").await.unwrap().unwrap();
        assert!(subtree.has_charts());
        assert!(surface.locate_subtree("missing").await.unwrap().is_none());

        let style = StyleOverride {
            id: "s-1".into(),
            css: ".x{}".into(),
        };
        let clone = surface.clone_for_offscreen_render(&subtree, &style).await.unwrap();
        assert_ne!(clone.id, subtree.id);

        // 이미 고배율인 캡처는 그대로
        let bitmap = surface.rasterize(&clone, &options(3.0)).await.unwrap();
        assert_eq!((bitmap.width, bitmap.height), (1200, 900));

        surface.discard_clone(&clone).await.unwrap();
        assert_eq!(surface.clone_count(), 0);
    }

    #[tokio::test]
    async fn discarding_clone_drops_its_reapplied_style() {
        let dir = tempfile::tempdir().unwrap();
        write_bundle(dir.path(), 1200);
        let surface = SnapshotSurface::open(dir.path()).unwrap();
        let subtree = surface.locate_subtree("analytics-report").await.unwrap().unwrap();

        // 원본에 주입되지 않은 스타일은 복제본과 함께 사라짐
        let own = StyleOverride {
            id: "clone-only".into(),
            css: ".x{}".into(),
        };
        let clone = surface.clone_for_offscreen_render(&subtree, &own).await.unwrap();
        assert_eq!(surface.active_style_count(), 1);
        surface.discard_clone(&clone).await.unwrap();
        assert_eq!(surface.active_style_count(), 0);

        // 원본에 이미 주입된 스타일은 유지
        let shared = StyleOverride {
            id: "shared".into(),
            css: ".y{}".into(),
        };
        let handle = surface.apply_temporary_style(&shared).await.unwrap();
        let clone = surface.clone_for_offscreen_render(&subtree, &shared).await.unwrap();
        surface.discard_clone(&clone).await.unwrap();
        assert_eq!(surface.active_style_count(), 1);
        surface.remove_temporary_style(&handle).await.unwrap();
        assert_eq!(surface.active_style_count(), 0);
    }

    #[tokio::test]
    async fn low_resolution_capture_is_upscaled() {
        let dir = tempfile::tempdir().unwrap();
        write_bundle(dir.path(), 400);
        let surface = SnapshotSurface::open(dir.path()).unwrap();
        let subtree = surface.locate_subtree("analytics-report").await.unwrap().unwrap();
        let bitmap = surface.rasterize(&subtree, &options(2.0)).await.unwrap();
        assert_eq!((bitmap.width, bitmap.height), (800, 600));
    }

    #[tokio::test]
    async fn missing_capture_is_render_error() {
        let dir = tempfile::tempdir().unwrap();
        write_bundle(dir.path(), 400);
        let surface = SnapshotSurface::open(dir.path()).unwrap();
        let subtree = surface.locate_subtree("no-capture").await.unwrap().unwrap();
        let err = surface.rasterize(&subtree, &options(1.0)).await.unwrap_err();
        assert!(matches!(err, CoreError::Render(_)));
    }

    #[tokio::test]
    async fn styles_and_markers_are_tracked() {
        let dir = tempfile::tempdir().unwrap();
        write_bundle(dir.path(), 400);
        let surface = SnapshotSurface::open(dir.path()).unwrap();
        let style = StyleOverride {
            id: "s-1".into(),
            css: ".pdf-export-mode{}".into(),
        };
        let handle = surface.apply_temporary_style(&style).await.unwrap();
        surface.set_marker("analytics-report", "m").await.unwrap();
        assert_eq!(surface.active_stylesheets().await.unwrap().len(), 2);
        assert!(surface.has_marker("analytics-report", "m"));

        surface.remove_temporary_style(&handle).await.unwrap();
        surface.clear_marker("analytics-report", "m").await.unwrap();
        assert_eq!(surface.active_style_count(), 0);
        assert!(!surface.has_marker("analytics-report", "m"));
        assert!(surface.remove_temporary_style(&handle).await.is_err());
    }

    #[tokio::test]
    async fn print_writes_preview_file() {
        let dir = tempfile::tempdir().unwrap();
        write_bundle(dir.path(), 400);
        let out = tempfile::tempdir().unwrap();
        let surface = SnapshotSurface::open(dir.path())
            .unwrap()
            .with_print_dir(out.path());
        let handle = surface
            .open_print_context(&PrintRequest {
                title: "Jane Q3".into(),
                markup: "<section>report</section>".into(),
                stylesheet: "@page {}".into(),
            })
            .await
            .unwrap();
        surface.print(&handle).await.unwrap();
        surface.close_print_context(&handle).await.unwrap();
        let written = std::fs::read_to_string(out.path().join("Jane_Q3.html")).unwrap();
        assert!(written.contains("@page {}"));
        assert!(surface.print(&handle).await.is_err());
    }

    #[tokio::test]
    async fn empty_surface_has_no_subtrees() {
        let surface = SnapshotSurface::empty();
        assert!(surface.locate_subtree("analytics-report").await.unwrap().is_none());
        assert!(surface.active_stylesheets().await.unwrap().is_empty());
    }

    #[test]
    fn open_fails_without_manifest() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            SnapshotSurface::open(dir.path()),
            Err(CoreError::Config(_))
        ));
    }
}
