//! 고정 용량 FIFO 이력.

use std::collections::VecDeque;

/// 최대 크기를 넘으면 가장 오래된 항목부터 버리는 이력 버퍼
#[derive(Debug, Clone)]
pub struct BoundedHistory<T> {
    entries: VecDeque<T>,
    capacity: usize,
}

impl<T> BoundedHistory<T> {
    /// 새 이력 버퍼 생성 (용량 0은 1로 보정)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity.min(1_024)),
            capacity,
        }
    }

    /// 항목 추가. 용량 초과로 밀려난 항목을 반환한다.
    pub fn push(&mut self, item: T) -> Option<T> {
        let evicted = if self.entries.len() >= self.capacity {
            self.entries.pop_front()
        } else {
            None
        };
        self.entries.push_back(item);
        evicted
    }

    /// 오래된 순 반복자
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + ExactSizeIterator {
        self.entries.iter()
    }

    /// 가장 최근 항목
    pub fn latest(&self) -> Option<&T> {
        self.entries.back()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl<T: Clone> BoundedHistory<T> {
    /// 오래된 순 복제본
    pub fn to_vec(&self) -> Vec<T> {
        self.entries.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_newest_entries() {
        let mut history = BoundedHistory::new(100);
        for i in 0..130 {
            history.push(i);
        }
        assert_eq!(history.len(), 100);
        assert_eq!(history.iter().next(), Some(&30));
        assert_eq!(history.latest(), Some(&129));
    }

    #[test]
    fn push_returns_evicted() {
        let mut history = BoundedHistory::new(2);
        assert_eq!(history.push("a"), None);
        assert_eq!(history.push("b"), None);
        assert_eq!(history.push("c"), Some("a"));
        assert_eq!(history.to_vec(), vec!["b", "c"]);
    }

    #[test]
    fn zero_capacity_is_clamped() {
        let mut history = BoundedHistory::new(0);
        history.push(1);
        history.push(2);
        assert_eq!(history.capacity(), 1);
        assert_eq!(history.to_vec(), vec![2]);
    }
}
