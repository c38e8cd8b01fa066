//! # evalboard-export
//!
//! 리포트 내보내기.
//!
//! - [`pipeline`]: 단계별 내보내기 실행기 (`ReportExporter`, `ExportTask`)
//! - [`layout`]: 캡처 이미지의 A4 페이지 배치와 분할
//! - [`pdf`]: 커버 + 캡처 페이지 PDF 조립 (printpdf)
//! - [`html`]: 단독 HTML 문서, 인쇄용 마크업
//! - [`style`]: 캡처용 임시 스타일, 인쇄 스타일시트
//! - [`filename`]: 파일 이름 규칙
//! - [`saver`]: 디렉토리 저장기 (`FileSaver` 구현)
//! - [`snapshot_surface`]: 스냅샷 번들 표면 (`RenderSurface` 구현)

pub mod error;
pub mod filename;
pub mod html;
pub mod layout;
pub mod pdf;
pub mod pipeline;
pub mod saver;
pub mod snapshot_surface;
pub mod style;

pub use error::ExportError;
pub use layout::{plan_content, ContentPlan, PageGeometry};
pub use pipeline::{CancelHandle, ExportTask, ReportExporter};
pub use saver::DirectorySaver;
pub use snapshot_surface::SnapshotSurface;
