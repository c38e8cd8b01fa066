//! 수집기 1회 초기화 슬롯.
//!
//! 전역 변수 대신 애플리케이션 컨텍스트가 소유한다.
//! 첫 `init` 호출만 수집기를 만들고 이후 호출은 기존 인스턴스를 돌려준다.

use once_cell::sync::OnceCell;
use std::sync::Arc;
use tracing::debug;

use evalboard_core::config::TelemetryConfig;
use evalboard_core::ports::reporter::MetricsReporter;

use crate::collector::TelemetryCollector;

/// 수집기 슬롯
#[derive(Default)]
pub struct TelemetrySlot {
    cell: OnceCell<Arc<TelemetryCollector>>,
}

impl TelemetrySlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// 수집기 초기화 (이미 있으면 기존 인스턴스, 인자는 무시)
    pub fn init(
        &self,
        config: TelemetryConfig,
        reporter: Option<Arc<dyn MetricsReporter>>,
    ) -> Arc<TelemetryCollector> {
        if let Some(existing) = self.cell.get() {
            debug!("텔레메트리 수집기 이미 초기화됨, 기존 인스턴스 반환");
            return Arc::clone(existing);
        }
        Arc::clone(
            self.cell
                .get_or_init(|| Arc::new(TelemetryCollector::new(config, reporter))),
        )
    }

    /// 초기화된 수집기 (없으면 None)
    pub fn get(&self) -> Option<Arc<TelemetryCollector>> {
        self.cell.get().cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        let slot = TelemetrySlot::new();
        assert!(slot.get().is_none());

        let first = slot.init(TelemetryConfig::default(), None);
        let second = slot.init(
            TelemetryConfig {
                sample_rate: 0.0,
                ..TelemetryConfig::default()
            },
            None,
        );
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.config().sample_rate, 1.0);
    }
}
