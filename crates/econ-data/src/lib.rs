//! 경제 시계열 조회, 캐싱, 정렬 및 파생 지표.
//!
//! 이 crate는 다음을 제공합니다:
//! - 제공자 어댑터 (FRED, Yahoo Finance)
//! - TTL + single-flight 시계열 캐시 (재시도 포함)
//! - 주기 정렬 엔진
//! - 전년 동기 대비(YoY) 파생 지표
//! - 대시보드 조회 파사드

pub mod align;
pub mod cache;
pub mod dashboard;
pub mod derive;
pub mod error;
pub mod provider;

pub use error::{DataError, FetchError, Result};

pub use align::align;
pub use derive::{derive_yoy, percent_change};

// 캐시 재내보내기
pub use cache::{CacheEntry, CacheKey, CacheStats, SeriesCache};

// 제공자 어댑터 재내보내기
pub use provider::{FetcherRegistry, FredFetcher, SeriesFetcher, YahooFetcher};

// 대시보드 파사드 재내보내기
pub use dashboard::{Clock, Dashboard, FixedClock, MetricOutcome, MetricView, SystemClock};
