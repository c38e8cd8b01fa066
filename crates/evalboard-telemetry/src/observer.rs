//! 기록된 성능 신호 재생 소스.
//!
//! 브라우저 밖에서 수집된 신호 파일(JSON 배열)을 `SignalSource`로 노출한다.
//! 구독 시점에 해당 카테고리의 신호를 모두 전송하고 채널을 놓는다.

use std::path::Path;
use tokio::sync::mpsc;
use tracing::debug;

use evalboard_core::error::CoreError;
use evalboard_core::ports::signals::{PerformanceSignal, SignalCategory, SignalSource};

/// 재생 신호 소스
#[derive(Debug, Clone)]
pub struct ReplaySignalSource {
    signals: Vec<PerformanceSignal>,
    supported: Vec<SignalCategory>,
}

impl ReplaySignalSource {
    /// 모든 카테고리를 지원하는 소스
    pub fn new(signals: Vec<PerformanceSignal>) -> Self {
        Self {
            signals,
            supported: SignalCategory::ALL.to_vec(),
        }
    }

    /// 지원 카테고리 제한
    pub fn with_supported(mut self, categories: &[SignalCategory]) -> Self {
        self.supported = categories.to_vec();
        self
    }

    /// JSON 배열에서 생성
    pub fn from_json(json: &str) -> Result<Self, CoreError> {
        let signals: Vec<PerformanceSignal> = serde_json::from_str(json)?;
        Ok(Self::new(signals))
    }

    /// 신호 파일에서 생성
    pub fn from_file(path: &Path) -> Result<Self, CoreError> {
        let content = std::fs::read_to_string(path)?;
        let source = Self::from_json(&content)?;
        debug!(
            "신호 파일 로드: {} ({}건)",
            path.display(),
            source.signals.len()
        );
        Ok(source)
    }

    pub fn len(&self) -> usize {
        self.signals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }
}

impl SignalSource for ReplaySignalSource {
    fn subscribe(
        &self,
        category: SignalCategory,
        tx: mpsc::UnboundedSender<PerformanceSignal>,
    ) -> Result<(), CoreError> {
        if !self.supported.contains(&category) {
            return Err(CoreError::UnsupportedFormat(format!(
                "관측 카테고리 미지원: {category}"
            )));
        }
        for signal in self.signals.iter().filter(|s| s.category() == category) {
            tx.send(signal.clone())
                .map_err(|_| CoreError::Internal("신호 수신 채널이 닫혔습니다".to_string()))?;
        }
        Ok(())
    }
}
