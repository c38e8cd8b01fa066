//! 재시도/취소를 지원하는 데이터 페치 훅.
//!
//! 상태 전이: idle → loading → (success | error).
//! 새 요청은 항상 이전 요청을 먼저 취소한다. 취소는 세대 번호로 판별하며
//! (세대가 바뀐 요청의 결과는 상태에 반영하지 않음) 이전 태스크도 abort하여
//! 대기 중인 재시도 타이머까지 정리한다.
//!
//! 재시도는 일시적 에러(`CoreError::is_retryable`)에만 적용하며
//! 지연은 기본 지연 × 시도 번호로 선형 증가한다.

use chrono::{DateTime, Utc};
use futures::future::{BoxFuture, FutureExt};
use parking_lot::Mutex;
use std::collections::hash_map::DefaultHasher;
use std::future::Future;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use evalboard_core::config::FetchConfig;
use evalboard_core::error::CoreError;

use crate::cache::ResponseCache;

/// 페치 상태 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStatus {
    Idle,
    Loading,
    Success,
    Error,
}

/// 페치 상태
#[derive(Debug, Clone, PartialEq)]
pub struct FetchState<T> {
    pub data: Option<T>,
    pub loading: bool,
    pub error: Option<String>,
    pub last_fetched: Option<DateTime<Utc>>,
}

impl<T> Default for FetchState<T> {
    fn default() -> Self {
        Self {
            data: None,
            loading: false,
            error: None,
            last_fetched: None,
        }
    }
}

impl<T> FetchState<T> {
    /// 현재 상태 종류
    pub fn status(&self) -> FetchStatus {
        if self.loading {
            FetchStatus::Loading
        } else if self.error.is_some() {
            FetchStatus::Error
        } else if self.last_fetched.is_some() {
            FetchStatus::Success
        } else {
            FetchStatus::Idle
        }
    }
}

type FetchFn<T> = Arc<dyn Fn() -> BoxFuture<'static, Result<T, CoreError>> + Send + Sync>;
type SuccessCallback<T> = Arc<dyn Fn(&T) + Send + Sync>;
type ErrorCallback = Arc<dyn Fn(&CoreError) + Send + Sync>;

/// 페치 옵션
pub struct FetchOptions<T> {
    /// 마운트 즉시 요청
    pub immediate: bool,
    /// 최대 시도 횟수 (첫 시도 포함)
    pub retry_count: u32,
    /// 재시도 기본 지연
    pub retry_delay: Duration,
    /// 포커스 복귀 시 재요청
    pub refetch_on_focus: bool,
    /// 외부 캐시와 키 (성공 시 기록, 마운트 시 조회)
    pub cache: Option<(Arc<ResponseCache<T>>, String)>,
    pub on_success: Option<SuccessCallback<T>>,
    pub on_error: Option<ErrorCallback>,
}

impl<T> Default for FetchOptions<T> {
    fn default() -> Self {
        Self::from_config(&FetchConfig::default())
    }
}

impl<T> FetchOptions<T> {
    /// 설정값으로 옵션 생성
    pub fn from_config(config: &FetchConfig) -> Self {
        Self {
            immediate: true,
            retry_count: config.retry_count.max(1),
            retry_delay: config.retry_delay(),
            refetch_on_focus: config.refetch_on_focus,
            cache: None,
            on_success: None,
            on_error: None,
        }
    }

    pub fn immediate(mut self, immediate: bool) -> Self {
        self.immediate = immediate;
        self
    }

    pub fn with_cache(mut self, cache: Arc<ResponseCache<T>>, key: impl Into<String>) -> Self {
        self.cache = Some((cache, key.into()));
        self
    }

    pub fn on_success(mut self, callback: impl Fn(&T) + Send + Sync + 'static) -> Self {
        self.on_success = Some(Arc::new(callback));
        self
    }

    pub fn on_error(mut self, callback: impl Fn(&CoreError) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Arc::new(callback));
        self
    }
}

struct Inner<T> {
    fetch: FetchFn<T>,
    options: FetchOptions<T>,
    state: watch::Sender<FetchState<T>>,
    generation: AtomicU64,
    task: Mutex<Option<JoinHandle<()>>>,
    deps: Mutex<Option<u64>>,
}

/// 리소스 페처 (인스턴스당 진행 중 요청 최대 1개)
pub struct ResourceFetcher<T: Clone + Send + Sync + 'static> {
    inner: Arc<Inner<T>>,
}

impl<T: Clone + Send + Sync + 'static> ResourceFetcher<T> {
    /// 페처 마운트. `immediate`이면 즉시 요청을 시작한다.
    ///
    /// 캐시가 설정되어 있고 유효한 값이 있으면 네트워크 요청 없이 성공 상태로 시작한다.
    pub fn mount<F, Fut>(fetch: F, options: FetchOptions<T>) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, CoreError>> + Send + 'static,
    {
        let (state, _) = watch::channel(FetchState::default());
        let immediate = options.immediate;
        let fetcher = Self {
            inner: Arc::new(Inner {
                fetch: Arc::new(move || fetch().boxed()),
                options,
                state,
                generation: AtomicU64::new(0),
                task: Mutex::new(None),
                deps: Mutex::new(None),
            }),
        };

        if immediate && !fetcher.serve_from_cache() {
            fetcher.refetch();
        }
        fetcher
    }

    /// 새 요청 시작 (이전 요청 취소)
    pub fn refetch(&self) {
        let handle = match Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                warn!("tokio 런타임 밖에서 호출됨, 요청 생략");
                return;
            }
        };

        let generation = self.cancel_in_flight();
        self.inner.state.send_modify(|s| {
            s.loading = true;
            s.error = None;
        });

        let inner = Arc::clone(&self.inner);
        let task = handle.spawn(run(inner, generation));
        *self.inner.task.lock() = Some(task);
    }

    /// 로컬 데이터만 덮어씀 (서버 요청 없음)
    pub fn mutate(&self, value: T) {
        self.inner.state.send_modify(|s| s.data = Some(value));
        debug!("페치 데이터 로컬 갱신");
    }

    /// 포커스 복귀 이벤트. 설정이 켜져 있고 로딩 중이 아니면 재요청한다.
    pub fn on_focus(&self) -> bool {
        if !self.inner.options.refetch_on_focus || self.inner.state.borrow().loading {
            return false;
        }
        self.refetch();
        true
    }

    /// 의존성 값 갱신. 이전 값과 달라지면 재요청하고 true를 반환한다.
    ///
    /// 첫 호출은 값만 기록한다.
    pub fn set_dependencies<D: Hash>(&self, deps: &D) -> bool {
        let mut hasher = DefaultHasher::new();
        deps.hash(&mut hasher);
        let hash = hasher.finish();

        let changed = {
            let mut current = self.inner.deps.lock();
            let changed = matches!(*current, Some(prev) if prev != hash);
            *current = Some(hash);
            changed
        };
        if changed {
            debug!("의존성 변경, 재요청");
            self.refetch();
        }
        changed
    }

    /// 진행 중 요청과 재시도 타이머 취소
    pub fn unmount(&self) {
        self.cancel_in_flight();
        self.inner.state.send_if_modified(|s| {
            let was_loading = s.loading;
            s.loading = false;
            was_loading
        });
    }

    /// 현재 상태 (복제본)
    pub fn state(&self) -> FetchState<T> {
        self.inner.state.borrow().clone()
    }

    pub fn status(&self) -> FetchStatus {
        self.inner.state.borrow().status()
    }

    /// 상태 변경 구독
    pub fn subscribe(&self) -> watch::Receiver<FetchState<T>> {
        self.inner.state.subscribe()
    }

    /// 진행 중 요청(재시도 포함)이 끝날 때까지 대기한 뒤 상태 반환
    pub async fn settled(&self) -> FetchState<T> {
        let mut rx = self.subscribe();
        let settled = match rx.wait_for(|s| !s.loading).await {
            Ok(state) => state.clone(),
            Err(_) => self.state(),
        };
        settled
    }

    /// 세대를 올리고 이전 태스크를 중지. 새 세대 번호를 반환한다.
    fn cancel_in_flight(&self) -> u64 {
        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(task) = self.inner.task.lock().take() {
            task.abort();
        }
        generation
    }

    fn serve_from_cache(&self) -> bool {
        let Some((cache, key)) = &self.inner.options.cache else {
            return false;
        };
        let Some(value) = cache.get(key) else {
            return false;
        };
        debug!("캐시 적중: {key}");
        self.inner.state.send_modify(|s| {
            s.data = Some(value);
            s.loading = false;
            s.error = None;
            s.last_fetched = Some(Utc::now());
        });
        true
    }
}

impl<T: Clone + Send + Sync + 'static> Drop for ResourceFetcher<T> {
    fn drop(&mut self) {
        self.unmount();
    }
}

async fn run<T: Clone + Send + Sync + 'static>(inner: Arc<Inner<T>>, generation: u64) {
    let is_current = || inner.generation.load(Ordering::SeqCst) == generation;
    let max_attempts = inner.options.retry_count.max(1);

    for attempt in 1..=max_attempts {
        let result = (inner.fetch)().await;
        if !is_current() {
            debug!("대체된 요청 결과 무시 (세대 {generation})");
            return;
        }

        match result {
            Ok(value) => {
                if let Some((cache, key)) = &inner.options.cache {
                    cache.insert(key.clone(), value.clone());
                }
                if let Some(callback) = &inner.options.on_success {
                    callback(&value);
                }
                inner.state.send_modify(|s| {
                    s.data = Some(value);
                    s.loading = false;
                    s.error = None;
                    s.last_fetched = Some(Utc::now());
                });
                return;
            }
            Err(e) if e.is_retryable() && attempt < max_attempts => {
                let delay = inner.options.retry_delay * attempt;
                warn!("요청 실패 (시도 {attempt}/{max_attempts}): {e}, {delay:?} 후 재시도");
                tokio::time::sleep(delay).await;
                if !is_current() {
                    return;
                }
            }
            Err(e) => {
                warn!("요청 최종 실패 (시도 {attempt}/{max_attempts}): {e}");
                if let Some(callback) = &inner.options.on_error {
                    callback(&e);
                }
                inner.state.send_modify(|s| {
                    s.loading = false;
                    s.error = Some(e.to_string());
                });
                return;
            }
        }
    }
}
