//! 대시보드 조회 파사드.
//!
//! 표시 계층이 호출하는 단일 진입점입니다. 지표 ID와 조회 창으로 레벨 시계열과
//! YoY 파생 시계열을 함께 반환합니다.
//!
//! ```text
//! query(metric_id, window)
//!   → 카탈로그 조회 → 캐시 (미스 시 어댑터 + 재시도) → 정렬 → YoY 계산 → 창 구간으로 자르기
//! ```

use chrono::{NaiveDate, Utc};
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use econ_core::{
    AppConfig, Category, Credentials, DashboardConfig, DateRange, DerivedSeries, Frequency,
    MetricCatalog, MetricDescriptor, TimeSeries, TimeWindow,
};

use crate::cache::{CacheStats, SeriesCache};
use crate::derive::{derive_yoy, percent_change};
use crate::error::Result;
use crate::provider::FetcherRegistry;

/// "오늘" 날짜 공급원. 테스트에서 고정 날짜로 교체합니다.
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// 시스템 시계 (UTC 기준 날짜).
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Utc::now().date_naive()
    }
}

/// 고정 날짜 시계.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

/// 지표 하나의 조회 결과.
#[derive(Debug, Clone)]
pub struct MetricView {
    pub descriptor: Arc<MetricDescriptor>,
    pub window: TimeWindow,
    /// 조회 창의 실제 날짜 구간
    pub range: DateRange,
    /// 표시 주기
    pub resolution: Frequency,
    /// 레벨 시계열 (창 구간으로 잘림)
    pub level: Arc<TimeSeries>,
    /// YoY 증감률 시계열 (창 구간으로 잘림)
    pub derived: DerivedSeries,
    /// 창 구간의 처음 대비 마지막 값 변화율 (%)
    pub change_pct: Option<f64>,
}

impl MetricView {
    /// 가장 최근 유효 레벨 값.
    pub fn latest(&self) -> Option<(NaiveDate, f64)> {
        self.level.present().last()
    }

    /// 가장 최근 YoY 값.
    pub fn latest_yoy(&self) -> Option<(NaiveDate, f64)> {
        self.derived.present().last()
    }
}

/// 일괄 조회의 지표별 결과.
#[derive(Debug)]
pub struct MetricOutcome {
    pub metric_id: String,
    pub result: Result<MetricView>,
}

impl MetricOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// 대시보드 조회 파사드.
#[derive(Clone)]
pub struct Dashboard {
    catalog: Arc<MetricCatalog>,
    cache: SeriesCache,
    config: DashboardConfig,
    clock: Arc<dyn Clock>,
}

impl Dashboard {
    pub fn new(catalog: Arc<MetricCatalog>, cache: SeriesCache, config: DashboardConfig) -> Self {
        Self {
            catalog,
            cache,
            config,
            clock: Arc::new(SystemClock),
        }
    }

    /// 시계를 교체합니다.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// 설정과 자격증명으로 표준 카탈로그 기반 대시보드를 구성합니다.
    pub fn from_config(config: &AppConfig, credentials: &Credentials) -> Result<Self> {
        let registry = FetcherRegistry::from_config(config, credentials)?;
        let cache = SeriesCache::new(registry, config.cache.clone(), config.retry.clone());
        let catalog = Arc::new(MetricCatalog::standard());

        info!(
            metrics = catalog.len(),
            lookback_months = config.dashboard.lookback_months,
            "대시보드 초기화"
        );

        Ok(Self::new(catalog, cache, config.dashboard.clone()))
    }

    pub fn catalog(&self) -> &MetricCatalog {
        &self.catalog
    }

    pub fn cache(&self) -> &SeriesCache {
        &self.cache
    }

    /// 지표를 표시 주기로 조회합니다.
    pub async fn query(&self, metric_id: &str, window: TimeWindow) -> Result<MetricView> {
        self.query_at(metric_id, window, None).await
    }

    /// 지표를 조회합니다. `resolution`이 없으면 설정된 표시 주기를 사용합니다.
    ///
    /// 상류 이력이 부족하면 창보다 짧은 시계열이 반환됩니다 (오류 아님).
    #[instrument(skip(self))]
    pub async fn query_at(
        &self,
        metric_id: &str,
        window: TimeWindow,
        resolution: Option<Frequency>,
    ) -> Result<MetricView> {
        let descriptor = self.catalog.resolve(metric_id)?;
        let resolution = resolution.unwrap_or_else(|| {
            self.config
                .display_frequency_for(descriptor.category, descriptor.frequency)
        });

        let range = window.range_ending(self.clock.today());
        let fetch_range = self.fetch_range(range, descriptor.frequency, resolution);

        let full = self
            .cache
            .get_or_fetch(&descriptor, fetch_range, resolution)
            .await?;

        let derived = derive_yoy(&full).trimmed(range);
        let level = Arc::new(full.trimmed(range));
        let change_pct = percent_change(&level);

        debug!(
            metric = metric_id,
            window = %window,
            resolution = %resolution,
            level_points = level.len(),
            yoy_points = derived.len(),
            "지표 조회 완료"
        );

        Ok(MetricView {
            descriptor,
            window,
            range,
            resolution,
            level,
            derived,
            change_pct,
        })
    }

    /// 창 구간에 YoY 비교 시점을 더한 조회 구간.
    ///
    /// 창 시작일이 걸친 첫 기간의 전년 동기 기간이 통째로 포함되도록 시작일을
    /// 원본 주기의 기간 시작일까지 당깁니다.
    fn fetch_range(&self, range: DateRange, native: Frequency, resolution: Frequency) -> DateRange {
        let extended = range.extend_back_months(self.config.lookback_months);
        if self.config.lookback_months == 0 {
            return extended;
        }

        let first_label = resolution.period_start(range.start());
        let start = resolution
            .year_ago(first_label)
            .map(|d| native.period_start(resolution.period_start(d)))
            .map_or(extended.start(), |d| d.min(extended.start()));

        DateRange::new(start, range.end()).unwrap_or(extended)
    }

    /// 여러 지표를 동시에 조회합니다.
    ///
    /// 지표별 실패는 해당 결과에만 기록되며 나머지 지표에 영향을 주지 않습니다.
    /// 결과 순서는 입력 순서와 같습니다.
    pub async fn query_many<I, S>(&self, metric_ids: I, window: TimeWindow) -> Vec<MetricOutcome>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let ids: Vec<String> = metric_ids.into_iter().map(Into::into).collect();
        let concurrency = self.config.max_concurrent_queries.max(1);

        let outcomes: Vec<MetricOutcome> = stream::iter(ids)
            .map(|metric_id| async move {
                let result = self.query(&metric_id, window).await;
                if let Err(e) = &result {
                    warn!(metric = %metric_id, error = %e, "지표 조회 실패");
                }
                MetricOutcome { metric_id, result }
            })
            .buffered(concurrency)
            .collect()
            .await;

        let failed = outcomes.iter().filter(|o| !o.is_ok()).count();
        info!(
            total = outcomes.len(),
            failed = failed,
            window = %window,
            "일괄 조회 완료"
        );

        outcomes
    }

    /// 분류에 속한 모든 지표를 카탈로그 순서대로 조회합니다.
    pub async fn query_category(&self, category: Category, window: TimeWindow) -> Vec<MetricOutcome> {
        let ids: Vec<String> = self
            .catalog
            .by_category(category)
            .iter()
            .map(|d| d.id.clone())
            .collect();
        self.query_many(ids, window).await
    }

    /// 카탈로그의 모든 지표를 조회합니다.
    pub async fn query_all(&self, window: TimeWindow) -> Vec<MetricOutcome> {
        let ids: Vec<String> = self.catalog.all().iter().map(|d| d.id.clone()).collect();
        self.query_many(ids, window).await
    }

    /// "데이터 새로고침": 캐시를 비워 다음 조회가 제공자에서 다시 가져오도록 합니다.
    pub async fn refresh_all(&self) {
        self.cache.clear().await;
    }

    pub async fn cache_stats(&self) -> CacheStats {
        self.cache.stats().await
    }
}

impl std::fmt::Debug for Dashboard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dashboard")
            .field("metrics", &self.catalog.len())
            .field("cache", &self.cache)
            .field("config", &self.config)
            .field("today", &self.clock.today())
            .finish()
    }
}
