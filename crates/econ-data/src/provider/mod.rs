//! 시계열 제공자 어댑터.
//!
//! 제공자마다 [`SeriesFetcher`] 구현체가 하나씩 있고, 지표의 제공자 바인딩으로
//! [`FetcherRegistry`]에서 선택됩니다.
//!
//! ## FRED
//! - `FredFetcher`: FRED observations API (API 키 필요)
//!
//! ## Yahoo Finance
//! - `YahooFetcher`: 일봉 종가 (선물, 지수)

pub mod combine;
pub mod fred;
pub mod yahoo;

pub use combine::combine;
pub use fred::FredFetcher;
pub use yahoo::YahooFetcher;

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

use econ_core::{AppConfig, Credentials, DateRange, ObservationPoint, Provider};

use crate::error::{FetchError, Result};

/// 제공자 어댑터 트레잇.
///
/// 반환하는 관측치는 `range` 안(경계 포함)에 있고, 날짜 오름차순이며 날짜가 중복되지 않습니다.
/// 결측 값은 버리지 않고 `value: None`으로 전달합니다.
#[async_trait]
pub trait SeriesFetcher: Send + Sync {
    /// 이 어댑터가 담당하는 제공자.
    fn provider(&self) -> Provider;

    /// 제공자 고유 식별자와 구간으로 관측치를 가져옵니다.
    async fn fetch(
        &self,
        native_id: &str,
        range: DateRange,
    ) -> std::result::Result<Vec<ObservationPoint>, FetchError>;
}

/// 제공자별 어댑터 레지스트리.
#[derive(Clone, Default)]
pub struct FetcherRegistry {
    fetchers: HashMap<Provider, Arc<dyn SeriesFetcher>>,
}

impl FetcherRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 어댑터를 등록합니다. 같은 제공자의 기존 어댑터는 교체됩니다.
    pub fn with_fetcher(mut self, fetcher: Arc<dyn SeriesFetcher>) -> Self {
        self.register(fetcher);
        self
    }

    pub fn register(&mut self, fetcher: Arc<dyn SeriesFetcher>) {
        self.fetchers.insert(fetcher.provider(), fetcher);
    }

    pub fn get(&self, provider: Provider) -> Option<Arc<dyn SeriesFetcher>> {
        self.fetchers.get(&provider).cloned()
    }

    pub fn providers(&self) -> Vec<Provider> {
        self.fetchers.keys().copied().collect()
    }

    /// 설정과 자격증명으로 실제 어댑터를 구성합니다.
    ///
    /// FRED API 키가 없으면 FRED 어댑터 없이 구성되며, FRED 지표 조회는
    /// `ProviderNotConfigured`로 실패합니다.
    pub fn from_config(config: &AppConfig, credentials: &Credentials) -> Result<Self> {
        let mut registry = Self::new();

        match &credentials.fred_api_key {
            Some(api_key) => {
                registry.register(Arc::new(FredFetcher::new(&config.fred, api_key)?));
                info!(base_url = %config.fred.base_url, "FRED 어댑터 등록");
            }
            None => warn!("FRED_API_KEY가 설정되지 않아 FRED 지표를 조회할 수 없습니다"),
        }

        if config.yahoo.enabled {
            registry.register(Arc::new(YahooFetcher::new(&config.yahoo)?));
            info!(base_url = %config.yahoo.base_url, "Yahoo Finance 어댑터 등록");
        }

        Ok(registry)
    }
}

impl std::fmt::Debug for FetcherRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetcherRegistry")
            .field("providers", &self.providers())
            .finish()
    }
}

/// 어댑터 공통 후처리: 구간 밖 제거, 날짜 정렬, 중복 날짜 제거(유효 값 우선).
pub(crate) fn clip_to_range(mut points: Vec<ObservationPoint>, range: DateRange) -> Vec<ObservationPoint> {
    points.retain(|p| range.contains(p.date));
    points.sort_by_key(|p| p.date);

    let mut out: Vec<ObservationPoint> = Vec::with_capacity(points.len());
    for point in points {
        match out.last_mut() {
            Some(last) if last.date == point.date => {
                if point.value.is_some() {
                    *last = point;
                }
            }
            _ => out.push(point),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_clip_to_range() {
        let range = DateRange::new(date(2024, 1, 2), date(2024, 1, 4)).unwrap();
        let points = vec![
            ObservationPoint::new(date(2024, 1, 4), 4.0),
            ObservationPoint::new(date(2024, 1, 1), 1.0),
            ObservationPoint::missing(date(2024, 1, 3)),
            ObservationPoint::new(date(2024, 1, 2), 2.0),
            ObservationPoint::missing(date(2024, 1, 2)),
            ObservationPoint::new(date(2024, 1, 5), 5.0),
        ];

        let clipped = clip_to_range(points, range);
        assert_eq!(
            clipped,
            vec![
                ObservationPoint::new(date(2024, 1, 2), 2.0),
                ObservationPoint::missing(date(2024, 1, 3)),
                ObservationPoint::new(date(2024, 1, 4), 4.0),
            ]
        );
    }
}
