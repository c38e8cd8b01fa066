//! 차트 지연 로더 + 단일 비행(single-flight) 캐시.
//!
//! 첫 `resolve` 호출이 로드를 시작하고 진행 중인 공유 핸들을 저장한다.
//! 동시에 들어온 호출과 이후 호출은 모두 같은 핸들을 기다리므로
//! 식별자 하나당 실제 로드는 한 번만 일어난다.
//! 거부(알 수 없는 식별자, 로드 실패)도 그대로 캐시되며
//! `invalidate` 또는 `clear`로만 지워진다.

use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use evalboard_core::models::chart::ChartType;
use evalboard_core::ports::chart::{ChartComponent, ChartModuleSource};

use crate::error::ChartError;

/// 로드 결과
pub type ChartResult = Result<Arc<dyn ChartComponent>, ChartError>;

type SharedLoad = Shared<BoxFuture<'static, ChartResult>>;

/// 캐시 상태 스냅샷
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheInfo {
    /// 항목 수
    pub size: usize,
    /// 로드 완료된 식별자 (정렬됨)
    pub resolved: Vec<String>,
    /// 거부가 캐시된 식별자 (정렬됨)
    pub failed: Vec<String>,
    /// 로드 진행 중인 식별자 (정렬됨)
    pub pending: Vec<String>,
}

/// 차트 로더
pub struct ChartLoader {
    source: Arc<dyn ChartModuleSource>,
    entries: Mutex<HashMap<String, SharedLoad>>,
}

impl ChartLoader {
    /// 새 로더 생성
    pub fn new(source: Arc<dyn ChartModuleSource>) -> Self {
        Self {
            source,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// 식별자로 차트 구현 조회 (필요 시 로드)
    pub async fn resolve(&self, id: &str) -> ChartResult {
        let load = {
            let mut entries = self.entries.lock();
            entries
                .entry(id.to_string())
                .or_insert_with(|| self.start_load(id))
                .clone()
        };
        load.await
    }

    /// 타입으로 차트 구현 조회
    pub async fn resolve_type(&self, chart_type: ChartType) -> ChartResult {
        self.resolve(chart_type.as_str()).await
    }

    /// 여러 타입을 미리 로드 (개별 실패는 로그만 남김)
    ///
    /// 성공한 타입 수를 반환한다.
    pub async fn preload(&self, types: &[ChartType]) -> usize {
        let results =
            futures::future::join_all(types.iter().map(|t| self.resolve_type(*t))).await;

        let mut loaded = 0;
        for (chart_type, result) in types.iter().zip(results) {
            match result {
                Ok(_) => loaded += 1,
                Err(e) => warn!("차트 사전 로드 실패: {chart_type}: {e}"),
            }
        }
        info!("차트 사전 로드 완료: {loaded}/{}", types.len());
        loaded
    }

    /// 단일 항목 제거 (캐시된 거부에서 복구할 때 사용)
    pub fn invalidate(&self, id: &str) -> bool {
        let removed = self.entries.lock().remove(id).is_some();
        if removed {
            debug!("차트 캐시 항목 제거: {id}");
        }
        removed
    }

    /// 전체 캐시 비우기
    pub fn clear(&self) {
        let mut entries = self.entries.lock();
        let count = entries.len();
        entries.clear();
        info!("차트 캐시 초기화: {count}개 항목 제거");
    }

    /// 캐시 상태 조회
    pub fn info(&self) -> CacheInfo {
        let entries = self.entries.lock();
        let mut info = CacheInfo {
            size: entries.len(),
            ..CacheInfo::default()
        };
        for (id, load) in entries.iter() {
            match load.peek() {
                Some(Ok(_)) => info.resolved.push(id.clone()),
                Some(Err(_)) => info.failed.push(id.clone()),
                None => info.pending.push(id.clone()),
            }
        }
        info.resolved.sort();
        info.failed.sort();
        info.pending.sort();
        info
    }

    fn start_load(&self, id: &str) -> SharedLoad {
        let source = Arc::clone(&self.source);
        let id = id.to_string();
        async move {
            let chart_type: ChartType = id
                .parse()
                .map_err(|_| ChartError::UnknownType(id.clone()))?;
            source
                .load(chart_type)
                .await
                .map_err(|e| ChartError::LoadFailed {
                    chart_type,
                    message: e.to_string(),
                })
        }
        .boxed()
        .shared()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use evalboard_core::error::CoreError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use crate::source::BuiltinChartSource;

    /// 로드 횟수를 세고 일부 타입은 실패시키는 소스
    struct CountingSource {
        loads: AtomicUsize,
        fail: Option<ChartType>,
    }

    impl CountingSource {
        fn new(fail: Option<ChartType>) -> Arc<Self> {
            Arc::new(Self {
                loads: AtomicUsize::new(0),
                fail,
            })
        }
    }

    #[async_trait]
    impl ChartModuleSource for CountingSource {
        async fn load(
            &self,
            chart_type: ChartType,
        ) -> Result<Arc<dyn ChartComponent>, CoreError> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(50)).await;
            if self.fail == Some(chart_type) {
                return Err(CoreError::Internal("bundle missing".into()));
            }
            BuiltinChartSource.load(chart_type).await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_resolves_share_one_load() {
        let source = CountingSource::new(None);
        let loader = ChartLoader::new(source.clone());

        let (a, b, c) = tokio::join!(
            loader.resolve("radar"),
            loader.resolve("radar"),
            loader.resolve_type(ChartType::Radar),
        );
        let (a, b, c) = (a.unwrap(), b.unwrap(), c.unwrap());

        assert_eq!(source.loads.load(Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(&a, &b));
        assert!(Arc::ptr_eq(&a, &c));

        // 이후 호출도 같은 참조
        let d = loader.resolve("radar").await.unwrap();
        assert!(Arc::ptr_eq(&a, &d));
        assert_eq!(source.loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn unknown_identifier_rejection_is_cached() {
        let source = CountingSource::new(None);
        let loader = ChartLoader::new(source.clone());

        let first = loader.resolve("pie").await;
        let second = loader.resolve("pie").await;
        assert_eq!(
            first.as_ref().err(),
            Some(&ChartError::UnknownType("pie".to_string()))
        );
        assert_eq!(first.err(), second.err());
        assert_eq!(source.loads.load(Ordering::SeqCst), 0);

        let info = loader.info();
        assert_eq!(info.size, 1);
        assert_eq!(info.failed, vec!["pie".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn invalidate_allows_reload_after_failure() {
        let source = CountingSource::new(Some(ChartType::TrendLine));
        let loader = ChartLoader::new(source.clone());

        assert!(loader.resolve_type(ChartType::TrendLine).await.is_err());
        assert!(loader.resolve_type(ChartType::TrendLine).await.is_err());
        assert_eq!(source.loads.load(Ordering::SeqCst), 1);

        assert!(loader.invalidate("trend-line"));
        assert!(loader.resolve_type(ChartType::TrendLine).await.is_err());
        assert_eq!(source.loads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn preload_swallows_individual_failures() {
        let source = CountingSource::new(Some(ChartType::ClusteredBar));
        let loader = ChartLoader::new(source.clone());

        let loaded = loader.preload(&ChartType::ALL).await;
        assert_eq!(loaded, 3);

        let info = loader.info();
        assert_eq!(info.size, 4);
        assert_eq!(info.resolved.len(), 3);
        assert_eq!(info.failed, vec!["clustered-bar".to_string()]);
        assert!(info.pending.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn clear_empties_cache() {
        let loader = ChartLoader::new(Arc::new(BuiltinChartSource::new()));
        loader.preload(&[ChartType::Radar, ChartType::HistoricalBar]).await;
        assert_eq!(loader.info().size, 2);

        loader.clear();
        let info = loader.info();
        assert_eq!(info.size, 0);
        assert!(info.resolved.is_empty());
        assert!(info.pending.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn pending_entry_visible_in_info() {
        let source = CountingSource::new(None);
        let loader = Arc::new(ChartLoader::new(source));

        let bg = Arc::clone(&loader);
        let handle = tokio::spawn(async move { bg.resolve("historical-bar").await });
        tokio::task::yield_now().await;

        assert_eq!(loader.info().pending, vec!["historical-bar".to_string()]);
        handle.await.unwrap().unwrap();
        assert_eq!(loader.info().resolved, vec!["historical-bar".to_string()]);
    }
}
