//! # evalboard-fetch
//!
//! 백엔드 요청을 감싸는 재시도/취소/캐시 훅.
//!
//! - [`fetcher`]: `ResourceFetcher` (상태 구독, 선형 재시도, 세대 기반 취소)
//! - [`cache`]: 키별 TTL + LRU 응답 캐시
//! - [`http`]: 상태 코드 분류를 포함한 JSON GET 클라이언트

pub mod cache;
pub mod fetcher;
pub mod http;

pub use cache::ResponseCache;
pub use fetcher::{FetchOptions, FetchState, FetchStatus, ResourceFetcher};
pub use http::HttpJsonClient;
