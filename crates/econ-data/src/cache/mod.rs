//! 시계열 캐시 모듈.
//!
//! - `series`: TTL + single-flight 메모리 캐시
//! - `retry`: 일시적 제공자 실패 재시도

pub mod retry;
pub mod series;

pub use retry::{fetch_with_retry, RetryExhausted};
pub use series::{CacheEntry, CacheKey, CacheStats, SeriesCache};
