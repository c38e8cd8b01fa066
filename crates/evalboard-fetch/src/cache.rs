//! TTL 응답 캐시.
//!
//! LRU로 최대 항목 수를 제한하고, 조회 시 만료된 항목은 제거한다.

use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

struct Entry<T> {
    value: T,
    stored_at: Instant,
}

/// 키별 응답 캐시
pub struct ResponseCache<T> {
    entries: Mutex<LruCache<String, Entry<T>>>,
    ttl: Duration,
}

impl<T: Clone> ResponseCache<T> {
    /// 새 캐시 생성 (용량 0은 1로 보정)
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            ttl,
        }
    }

    /// 만료되지 않은 값 조회
    pub fn get(&self, key: &str) -> Option<T> {
        let mut entries = self.entries.lock();
        let expired = match entries.get(key) {
            Some(entry) if entry.stored_at.elapsed() < self.ttl => {
                return Some(entry.value.clone());
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            entries.pop(key);
            debug!("캐시 항목 만료: {key}");
        }
        None
    }

    /// 값 저장 (기존 값은 교체)
    pub fn insert(&self, key: impl Into<String>, value: T) {
        self.entries.lock().put(
            key.into(),
            Entry {
                value,
                stored_at: Instant::now(),
            },
        );
    }

    /// 항목 제거
    pub fn invalidate(&self, key: &str) -> bool {
        self.entries.lock().pop(key).is_some()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    /// 저장된 항목 수 (만료 여부 무관)
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn entries_expire_after_ttl() {
        let cache = ResponseCache::new(8, Duration::from_secs(300));
        cache.insert("employees", vec!["e-1".to_string()]);
        assert_eq!(cache.get("employees"), Some(vec!["e-1".to_string()]));

        tokio::time::advance(Duration::from_secs(301)).await;
        assert_eq!(cache.get("employees"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn lru_evicts_oldest() {
        let cache = ResponseCache::new(2, Duration::from_secs(60));
        cache.insert("a", 1);
        cache.insert("b", 2);
        cache.get("a");
        cache.insert("c", 3);
        assert_eq!(cache.get("b"), None);
        assert_eq!(cache.get("a"), Some(1));
        assert_eq!(cache.get("c"), Some(3));
    }

    #[test]
    fn invalidate_removes_entry() {
        let cache = ResponseCache::new(2, Duration::from_secs(60));
        cache.insert("quarters", 4);
        assert!(cache.invalidate("quarters"));
        assert!(!cache.invalidate("quarters"));
    }
}
