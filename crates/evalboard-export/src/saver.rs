//! 디렉토리 파일 저장기.
//!
//! `FileSaver` 구현. 같은 이름의 파일이 있으면 덮어쓰지 않고
//! `이름 (n).확장자` 형태로 새 이름을 찾는다.

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use evalboard_core::error::CoreError;
use evalboard_core::ports::file_saver::{FileSaver, SavedFile};

/// 중복 이름 탐색 상한
const MAX_DUPLICATES: u32 = 999;

/// 지정 디렉토리에 저장
pub struct DirectorySaver {
    dir: PathBuf,
}

impl DirectorySaver {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// 후보 이름 목록 (원래 이름, `이름 (1)`, `이름 (2)` ...)
    fn candidates(filename: &str) -> impl Iterator<Item = String> + '_ {
        let (stem, ext) = match filename.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => (stem, Some(ext)),
            _ => (filename, None),
        };
        std::iter::once(filename.to_string()).chain((1..=MAX_DUPLICATES).map(move |n| {
            match ext {
                Some(ext) => format!("{stem} ({n}).{ext}"),
                None => format!("{stem} ({n})"),
            }
        }))
    }

    /// 존재하지 않는 이름으로 새 파일을 원자적으로 생성
    async fn create_unique(&self, filename: &str) -> Result<(PathBuf, File), CoreError> {
        for name in Self::candidates(filename) {
            let path = self.dir.join(name);
            match OpenOptions::new().write(true).create_new(true).open(&path).await {
                Ok(file) => return Ok((path, file)),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Err(CoreError::Internal(format!(
            "저장 가능한 파일 이름을 찾지 못했습니다: {filename}"
        )))
    }
}

#[async_trait]
impl FileSaver for DirectorySaver {
    async fn save(&self, filename: &str, mime: &str, bytes: &[u8]) -> Result<SavedFile, CoreError> {
        if filename.is_empty() || filename.contains(['/', '\\']) {
            return Err(CoreError::validation("filename", "잘못된 파일 이름입니다"));
        }
        tokio::fs::create_dir_all(&self.dir).await?;
        let (path, mut file) = self.create_unique(filename).await?;
        file.write_all(bytes).await?;
        file.flush().await?;

        debug!("파일 저장: {} ({mime}, {}바이트)", path.display(), bytes.len());
        info!("내보내기 파일 저장 완료: {}", path.display());
        Ok(SavedFile {
            location: Some(path.display().to_string()),
        })
    }
}
