//! 파일 저장 포트.
//!
//! 생성된 바이트를 서버 왕복 없이 로컬에 저장한다.
//!
//! 구현: `evalboard-export` crate (`DirectorySaver`)

use async_trait::async_trait;

use crate::error::CoreError;

/// 저장 결과
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedFile {
    /// 플랫폼이 알려준 저장 위치 (경로 등)
    pub location: Option<String>,
}

/// 파일 저장 인터페이스
#[async_trait]
pub trait FileSaver: Send + Sync {
    /// 바이트를 파일 이름과 MIME 타입으로 저장
    async fn save(&self, filename: &str, mime: &str, bytes: &[u8]) -> Result<SavedFile, CoreError>;
}
