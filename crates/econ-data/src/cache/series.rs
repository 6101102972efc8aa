//! 메모리 시계열 캐시.
//!
//! 키는 `(지표 ID, 조회 구간, 해상도)`이며 각 구간은 독립적으로 캐시됩니다.
//!
//! # 동작 흐름
//!
//! ```text
//! get_or_fetch(descriptor, range, resolution)
//!         │
//!         ▼
//! ┌─────────────────────┐
//! │ 1. 키별 슬롯 Lock    │ ← 같은 키는 하나의 조회만 진행 (single-flight)
//! └─────────┬───────────┘
//!           │
//!     ┌─────┴──────┐
//!     │ TTL 유효?   │── YES ──▶ 캐시된 시계열 반환
//!     └─────┬──────┘
//!           │ NO
//!           ▼
//! ┌─────────────────────┐
//! │ 2. 어댑터 호출 + 재시도│ ← 별도 태스크 (요청 취소와 무관하게 완료)
//! └─────────┬───────────┘
//!           │
//! ┌─────────▼───────────┐
//! │ 3. 해상도 정렬 후 저장 │
//! └─────────────────────┘
//! ```
//!
//! 슬롯 맵 Lock은 슬롯 조회/생성에만 잡으며, 조회 중에는 해당 키의 슬롯 Lock만 유지됩니다.
//!
//! 무효화는 슬롯을 지우지 않고 슬롯의 epoch만 올립니다. 진행 중인 조회가 있으면
//! 이후 요청도 같은 슬롯에서 그 조회를 기다리므로 키당 조회는 하나뿐입니다.
//! 아무도 쓰지 않는 만료/실패 슬롯은 새 키를 추가할 때 정리됩니다.

use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

use econ_core::{
    CacheConfig, DateRange, Frequency, MetricDescriptor, ObservationPoint, RetryConfig, TimeSeries,
};

use super::retry::fetch_with_retry;
use crate::align::align;
use crate::error::{DataError, Result};
use crate::provider::{combine, FetcherRegistry, SeriesFetcher};

/// 캐시 키.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub metric_id: String,
    pub range: DateRange,
    pub resolution: Frequency,
}

impl CacheKey {
    pub fn new(metric_id: impl Into<String>, range: DateRange, resolution: Frequency) -> Self {
        Self {
            metric_id: metric_id.into(),
            range,
            resolution,
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}/{}", self.metric_id, self.range, self.resolution)
    }
}

/// 캐시 항목. 부분 갱신 없이 통째로 교체됩니다.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub key: CacheKey,
    pub series: Arc<TimeSeries>,
    pub fetched_at: Instant,
    pub ttl: Duration,
}

impl CacheEntry {
    /// TTL이 남아 있는지 확인.
    pub fn is_fresh(&self) -> bool {
        self.fetched_at.elapsed() < self.ttl
    }

    pub fn age(&self) -> Duration {
        self.fetched_at.elapsed()
    }
}

/// 캐시 통계.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// TTL 안에서 반환된 요청 수
    pub hits: u64,
    /// 조회를 시작한 요청 수
    pub misses: u64,
    /// 어댑터 호출 수 (재시도 포함)
    pub upstream_fetches: u64,
    /// 대기 중 완료된 실패를 공유받은 요청 수
    pub shared_failures: u64,
    /// 유효한 항목 수
    pub entries: usize,
    /// 추적 중인 키 수 (만료/실패/조회 중 포함)
    pub tracked_keys: usize,
}

#[derive(Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    upstream_fetches: AtomicU64,
    shared_failures: AtomicU64,
}

#[derive(Default)]
struct SlotState {
    entry: Option<CacheEntry>,
    /// `entry`를 만든 조회가 시작될 때의 슬롯 epoch
    entry_epoch: u64,
    last_failure: Option<DataError>,
}

/// 키별 슬롯.
///
/// `generation`은 조회가 끝날 때마다(성공/실패 모두) 슬롯 Lock을 놓기 전에 증가합니다.
/// 대기하던 요청은 Lock 획득 후 이 값이 바뀌었는지로 자신이 기다린 조회의 결과인지 판단합니다.
///
/// `epoch`는 무효화마다 증가하며, 이전 epoch에 시작된 조회의 항목은 만료로 취급합니다.
#[derive(Default)]
struct Slot {
    generation: AtomicU64,
    epoch: AtomicU64,
    state: Arc<Mutex<SlotState>>,
}

impl Slot {
    /// TTL 안이고 무효화 이후에 시작된 조회의 항목.
    fn current_entry<'a>(&self, state: &'a SlotState) -> Option<&'a CacheEntry> {
        let epoch = self.epoch.load(Ordering::Acquire);
        state
            .entry
            .as_ref()
            .filter(|e| state.entry_epoch == epoch && e.is_fresh())
    }

    /// 슬롯 Lock을 잡고 있지 않을 때만 판단합니다. 조회 중인 슬롯은 유효로 봅니다.
    fn is_current(&self) -> bool {
        match self.state.try_lock() {
            Ok(state) => self.current_entry(&state).is_some(),
            Err(_) => true,
        }
    }

    /// epoch를 올려 현재 항목을 만료시킵니다. 무효화 전 유효했는지 반환합니다.
    fn invalidate(&self) -> bool {
        let was_current = self.is_current();
        self.epoch.fetch_add(1, Ordering::AcqRel);
        was_current
    }
}

/// 맵 외에 참조가 없으면(대기/조회 중인 요청 없음) 유휴 슬롯.
fn is_idle(slot: &Arc<Slot>) -> bool {
    Arc::strong_count(slot) == 1
}

/// 유휴 상태이면서 유효한 항목이 없는 슬롯 제거. 맵 쓰기 Lock 안에서 호출합니다.
fn prune_idle(slots: &mut HashMap<CacheKey, Arc<Slot>>) -> usize {
    let before = slots.len();
    slots.retain(|_, slot| !is_idle(slot) || slot.is_current());
    before - slots.len()
}

struct CacheInner {
    registry: FetcherRegistry,
    config: CacheConfig,
    retry: RetryConfig,
    slots: RwLock<HashMap<CacheKey, Arc<Slot>>>,
    counters: Counters,
}

/// TTL + single-flight 시계열 캐시.
///
/// 복제 비용이 낮으며 복제본은 같은 저장소를 공유합니다.
#[derive(Clone)]
pub struct SeriesCache {
    inner: Arc<CacheInner>,
}

impl SeriesCache {
    pub fn new(registry: FetcherRegistry, config: CacheConfig, retry: RetryConfig) -> Self {
        Self {
            inner: Arc::new(CacheInner {
                registry,
                config,
                retry,
                slots: RwLock::new(HashMap::new()),
                counters: Counters::default(),
            }),
        }
    }

    /// 캐시된 시계열을 반환하거나, 없거나 만료되었으면 가져와서 저장합니다.
    ///
    /// 같은 키로 동시에 들어온 요청은 하나의 어댑터 조회를 공유합니다.
    #[instrument(skip(self, descriptor), fields(metric = %descriptor.id))]
    pub async fn get_or_fetch(
        &self,
        descriptor: &Arc<MetricDescriptor>,
        range: DateRange,
        resolution: Frequency,
    ) -> Result<Arc<TimeSeries>> {
        let key = CacheKey::new(descriptor.id.clone(), range, resolution);
        let slot = self.inner.get_or_create_slot(&key).await;

        let observed = slot.generation.load(Ordering::Acquire);
        let guard = slot.state.clone().lock_owned().await;

        // 기다리는 동안 끝난 조회가 있으면 그 결과를 공유 (이후 무효화되었더라도)
        if slot.generation.load(Ordering::Acquire) != observed {
            if let Some(err) = &guard.last_failure {
                self.inner
                    .counters
                    .shared_failures
                    .fetch_add(1, Ordering::Relaxed);
                debug!(key = %key, error = %err, "대기 중 완료된 조회 실패 공유");
                return Err(err.clone());
            }
            if let Some(entry) = &guard.entry {
                self.inner.counters.hits.fetch_add(1, Ordering::Relaxed);
                debug!(key = %key, "대기 중 완료된 조회 결과 공유");
                return Ok(entry.series.clone());
            }
        }

        if let Some(entry) = slot.current_entry(&guard) {
            self.inner.counters.hits.fetch_add(1, Ordering::Relaxed);
            debug!(key = %key, age_secs = entry.age().as_secs(), "캐시 히트");
            return Ok(entry.series.clone());
        }

        self.inner.counters.misses.fetch_add(1, Ordering::Relaxed);
        self.spawn_load(guard, slot, key, descriptor.clone()).await
    }

    /// TTL과 무관하게 다시 가져와 교체합니다.
    #[instrument(skip(self, descriptor), fields(metric = %descriptor.id))]
    pub async fn refresh(
        &self,
        descriptor: &Arc<MetricDescriptor>,
        range: DateRange,
        resolution: Frequency,
    ) -> Result<Arc<TimeSeries>> {
        let key = CacheKey::new(descriptor.id.clone(), range, resolution);
        let slot = self.inner.get_or_create_slot(&key).await;
        let guard = slot.state.clone().lock_owned().await;

        self.inner.counters.misses.fetch_add(1, Ordering::Relaxed);
        self.spawn_load(guard, slot, key, descriptor.clone()).await
    }

    /// 캐시된 항목 조회 (만료 여부와 무관, 어댑터 호출 없음).
    pub async fn peek(&self, key: &CacheKey) -> Option<CacheEntry> {
        let slot = self.inner.slots.read().await.get(key).cloned()?;
        let state = slot.state.lock().await;
        state.entry.clone()
    }

    /// 단일 키 무효화. 유효한 항목(또는 진행 중인 조회)이 있었으면 `true`.
    ///
    /// 진행 중인 조회는 끝까지 실행되어 기다리던 요청에 결과를 주지만,
    /// 그 결과는 이후 요청에 캐시 히트로 쓰이지 않습니다.
    pub async fn invalidate(&self, key: &CacheKey) -> bool {
        let mut slots = self.inner.slots.write().await;
        let Some(slot) = slots.get(key) else {
            return false;
        };
        let was_current = slot.invalidate();
        if is_idle(slot) {
            slots.remove(key);
        }
        if was_current {
            debug!(key = %key, "캐시 항목 무효화");
        }
        was_current
    }

    /// 지표의 모든 구간/해상도 항목 무효화.
    pub async fn invalidate_metric(&self, metric_id: &str) -> usize {
        let mut slots = self.inner.slots.write().await;
        let invalidated = slots
            .iter()
            .filter(|(key, _)| key.metric_id == metric_id)
            .filter(|(_, slot)| slot.invalidate())
            .count();
        prune_idle(&mut slots);
        debug!(metric = metric_id, invalidated = invalidated, "지표 캐시 무효화");
        invalidated
    }

    /// 전체 캐시 비우기. 진행 중인 조회의 슬롯은 만료 상태로 남습니다.
    pub async fn clear(&self) {
        let mut slots = self.inner.slots.write().await;
        let invalidated = slots.values().filter(|slot| slot.invalidate()).count();
        prune_idle(&mut slots);
        info!(
            invalidated = invalidated,
            in_flight = slots.len(),
            "시계열 캐시 초기화"
        );
    }

    /// 만료/실패 슬롯 제거. 요청이 대기 중이거나 조회가 진행 중인 슬롯은 건드리지 않습니다.
    pub async fn purge_expired(&self) -> usize {
        let mut slots = self.inner.slots.write().await;
        let removed = prune_idle(&mut slots);
        if removed > 0 {
            debug!(removed = removed, "만료된 캐시 항목 제거");
        }
        removed
    }

    /// 캐시 통계. 조회가 진행 중인 슬롯은 `entries`에서 제외됩니다.
    pub async fn stats(&self) -> CacheStats {
        let slots: Vec<Arc<Slot>> = self.inner.slots.read().await.values().cloned().collect();
        let entries = slots
            .iter()
            .filter(|slot| {
                slot.state
                    .try_lock()
                    .map(|state| slot.current_entry(&state).is_some())
                    .unwrap_or(false)
            })
            .count();

        let counters = &self.inner.counters;
        CacheStats {
            hits: counters.hits.load(Ordering::Relaxed),
            misses: counters.misses.load(Ordering::Relaxed),
            upstream_fetches: counters.upstream_fetches.load(Ordering::Relaxed),
            shared_failures: counters.shared_failures.load(Ordering::Relaxed),
            entries,
            tracked_keys: slots.len(),
        }
    }

    /// 슬롯 Lock을 쥔 채로 별도 태스크에서 조회합니다.
    ///
    /// 요청한 쪽이 취소되어도 태스크는 끝까지 실행되어 결과를 저장합니다.
    async fn spawn_load(
        &self,
        mut guard: OwnedMutexGuard<SlotState>,
        slot: Arc<Slot>,
        key: CacheKey,
        descriptor: Arc<MetricDescriptor>,
    ) -> Result<Arc<TimeSeries>> {
        let inner = self.inner.clone();
        let epoch = slot.epoch.load(Ordering::Acquire);

        let handle = tokio::spawn(async move {
            let result = inner.load(&descriptor, key.range, key.resolution).await;

            match &result {
                Ok(series) => {
                    guard.entry = Some(CacheEntry {
                        key: key.clone(),
                        series: series.clone(),
                        fetched_at: Instant::now(),
                        ttl: inner.config.ttl_for(key.resolution),
                    });
                    guard.entry_epoch = epoch;
                    guard.last_failure = None;
                }
                Err(e) => {
                    warn!(key = %key, error = %e, "시계열 조회 실패");
                    guard.last_failure = Some(e.clone());
                }
            }

            slot.generation.fetch_add(1, Ordering::Release);
            drop(guard);
            result
        });

        handle
            .await
            .map_err(|e| DataError::Internal(format!("캐시 적재 태스크 실패: {}", e)))?
    }
}

impl fmt::Debug for SeriesCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SeriesCache")
            .field("registry", &self.inner.registry)
            .field("config", &self.inner.config)
            .finish()
    }
}

impl CacheInner {
    /// 키별 슬롯 획득 또는 생성.
    ///
    /// 새 키를 추가할 때 유휴 만료/실패 슬롯을 함께 정리하므로, 조회 구간이 날마다
    /// 바뀌어도 슬롯 수가 계속 늘지 않습니다.
    async fn get_or_create_slot(&self, key: &CacheKey) -> Arc<Slot> {
        let slots = self.slots.read().await;
        if let Some(slot) = slots.get(key) {
            return slot.clone();
        }
        drop(slots);

        let mut slots = self.slots.write().await;
        if let Some(slot) = slots.get(key) {
            return slot.clone();
        }

        let pruned = prune_idle(&mut slots);
        if pruned > 0 {
            debug!(pruned = pruned, remaining = slots.len(), "유휴 캐시 슬롯 정리");
        }

        let slot = Arc::new(Slot::default());
        slots.insert(key.clone(), slot.clone());
        slot
    }

    /// 어댑터 조회 → (결합) → 해상도 정렬.
    async fn load(
        &self,
        descriptor: &Arc<MetricDescriptor>,
        range: DateRange,
        resolution: Frequency,
    ) -> Result<Arc<TimeSeries>> {
        let fetcher = self
            .registry
            .get(descriptor.provider)
            .ok_or(DataError::ProviderNotConfigured(descriptor.provider))?;

        let points = match &descriptor.combination {
            None => {
                self.fetch_leg(fetcher.as_ref(), descriptor, &descriptor.native_id, range)
                    .await?
            }
            Some(combination) => {
                let (left, right) = tokio::join!(
                    self.fetch_leg(fetcher.as_ref(), descriptor, &descriptor.native_id, range),
                    self.fetch_leg(fetcher.as_ref(), descriptor, &combination.other_native_id, range),
                );
                combine(combination.op, &left?, &right?)
            }
        };

        let raw = TimeSeries::new(descriptor.clone(), range, descriptor.frequency, points);
        let aligned = align(&raw, resolution);

        info!(
            metric = %descriptor.id,
            source = %descriptor.source_label(),
            range = %range,
            resolution = %resolution,
            points = aligned.len(),
            missing = aligned.missing_count(),
            "시계열 캐시 완료"
        );

        Ok(Arc::new(aligned))
    }

    async fn fetch_leg(
        &self,
        fetcher: &dyn SeriesFetcher,
        descriptor: &MetricDescriptor,
        native_id: &str,
        range: DateRange,
    ) -> Result<Vec<ObservationPoint>> {
        fetch_with_retry(fetcher, native_id, range, &self.retry, &self.counters.upstream_fetches)
            .await
            .map_err(|e| DataError::DataUnavailable {
                metric_id: descriptor.id.clone(),
                range,
                attempts: e.attempts,
                last_error: e.last_error,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use econ_core::{Category, Provider};
    use std::sync::atomic::AtomicU32;

    /// 호출 수를 세고, 지정된 만큼 지연 후 고정 값을 돌려주는 어댑터.
    struct CountingFetcher {
        calls: AtomicU32,
        delay: Duration,
        fail: bool,
    }

    impl CountingFetcher {
        fn new(delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicU32::new(0),
                delay,
                fail: false,
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicU32::new(0),
                delay: Duration::from_millis(10),
                fail: true,
            })
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl SeriesFetcher for CountingFetcher {
        fn provider(&self) -> Provider {
            Provider::Fred
        }

        async fn fetch(
            &self,
            _native_id: &str,
            range: DateRange,
        ) -> std::result::Result<Vec<ObservationPoint>, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            if self.fail {
                return Err(FetchError::InvalidRequest {
                    provider: Provider::Fred,
                    message: "series does not exist".to_string(),
                });
            }
            Ok(vec![ObservationPoint::new(range.start(), 5.33)])
        }
    }

    fn descriptor() -> Arc<MetricDescriptor> {
        Arc::new(MetricDescriptor::new(
            "fed_funds_rate",
            "Fed Funds Rate",
            Category::InterestRate,
            Provider::Fred,
            "DFF",
            Frequency::Daily,
        ))
    }

    fn range(year: i32) -> DateRange {
        DateRange::new(
            NaiveDate::from_ymd_opt(year, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(year, 12, 31).unwrap(),
        )
        .unwrap()
    }

    fn cache_with(fetcher: Arc<CountingFetcher>) -> SeriesCache {
        let registry = FetcherRegistry::new().with_fetcher(fetcher);
        SeriesCache::new(registry, CacheConfig::default(), RetryConfig::no_retry())
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_flight() {
        let fetcher = CountingFetcher::new(Duration::from_millis(200));
        let cache = cache_with(fetcher.clone());
        let descriptor = descriptor();

        let tasks: Vec<_> = (0..10)
            .map(|_| {
                let cache = cache.clone();
                let descriptor = descriptor.clone();
                tokio::spawn(async move {
                    cache
                        .get_or_fetch(&descriptor, range(2024), Frequency::Daily)
                        .await
                })
            })
            .collect();

        let results = futures::future::join_all(tasks).await;
        let first = results[0].as_ref().unwrap().as_ref().unwrap().clone();
        for result in &results {
            let series = result.as_ref().unwrap().as_ref().unwrap();
            assert!(Arc::ptr_eq(series, &first));
        }

        assert_eq!(fetcher.calls(), 1);
        let stats = cache.stats().await;
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, 9);
        assert_eq!(stats.upstream_fetches, 1);
        assert_eq!(stats.entries, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_distinct_ranges_cached_independently() {
        let fetcher = CountingFetcher::new(Duration::from_millis(10));
        let cache = cache_with(fetcher.clone());
        let descriptor = descriptor();

        let a = cache.get_or_fetch(&descriptor, range(2023), Frequency::Daily).await.unwrap();
        let b = cache.get_or_fetch(&descriptor, range(2024), Frequency::Daily).await.unwrap();

        assert_eq!(fetcher.calls(), 2);
        assert_eq!(a.range(), range(2023));
        assert_eq!(b.range(), range(2024));
        assert_ne!(a.first().unwrap().date, b.first().unwrap().date);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ttl_expiry_refetches() {
        let fetcher = CountingFetcher::new(Duration::from_millis(10));
        let cache = cache_with(fetcher.clone());
        let descriptor = descriptor();

        cache.get_or_fetch(&descriptor, range(2024), Frequency::Daily).await.unwrap();
        tokio::time::advance(Duration::from_secs(30 * 60)).await;
        cache.get_or_fetch(&descriptor, range(2024), Frequency::Daily).await.unwrap();
        assert_eq!(fetcher.calls(), 1);

        tokio::time::advance(Duration::from_secs(31 * 60)).await;
        cache.get_or_fetch(&descriptor, range(2024), Frequency::Daily).await.unwrap();
        assert_eq!(fetcher.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_ignores_ttl() {
        let fetcher = CountingFetcher::new(Duration::from_millis(10));
        let cache = cache_with(fetcher.clone());
        let descriptor = descriptor();

        cache.get_or_fetch(&descriptor, range(2024), Frequency::Daily).await.unwrap();
        cache.refresh(&descriptor, range(2024), Frequency::Daily).await.unwrap();
        assert_eq!(fetcher.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_waiters_share_failure() {
        let fetcher = CountingFetcher::failing();
        let cache = cache_with(fetcher.clone());
        let descriptor = descriptor();

        let (a, b) = tokio::join!(
            cache.get_or_fetch(&descriptor, range(2024), Frequency::Daily),
            cache.get_or_fetch(&descriptor, range(2024), Frequency::Daily),
        );

        assert!(matches!(a, Err(DataError::DataUnavailable { .. })));
        assert!(matches!(b, Err(DataError::DataUnavailable { .. })));
        assert_eq!(fetcher.calls(), 1);
        assert_eq!(cache.stats().await.shared_failures, 1);

        // 실패는 캐시되지 않으므로 다음 요청은 다시 조회
        let _ = cache.get_or_fetch(&descriptor, range(2024), Frequency::Daily).await;
        assert_eq!(fetcher.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_request_still_caches() {
        let fetcher = CountingFetcher::new(Duration::from_millis(500));
        let cache = cache_with(fetcher.clone());
        let descriptor = descriptor();

        let request = {
            let cache = cache.clone();
            let descriptor = descriptor.clone();
            tokio::spawn(async move {
                cache.get_or_fetch(&descriptor, range(2024), Frequency::Daily).await
            })
        };
        tokio::time::sleep(Duration::from_millis(100)).await;
        request.abort();

        tokio::time::sleep(Duration::from_secs(1)).await;
        let key = CacheKey::new("fed_funds_rate", range(2024), Frequency::Daily);
        assert!(cache.peek(&key).await.is_some());

        cache.get_or_fetch(&descriptor, range(2024), Frequency::Daily).await.unwrap();
        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalidate() {
        let fetcher = CountingFetcher::new(Duration::from_millis(10));
        let cache = cache_with(fetcher.clone());
        let descriptor = descriptor();

        cache.get_or_fetch(&descriptor, range(2023), Frequency::Daily).await.unwrap();
        cache.get_or_fetch(&descriptor, range(2024), Frequency::Daily).await.unwrap();
        cache.get_or_fetch(&descriptor, range(2024), Frequency::Monthly).await.unwrap();

        let key = CacheKey::new("fed_funds_rate", range(2023), Frequency::Daily);
        assert!(cache.invalidate(&key).await);
        assert!(!cache.invalidate(&key).await);
        assert_eq!(cache.stats().await.entries, 2);

        assert_eq!(cache.invalidate_metric("fed_funds_rate").await, 2);
        assert_eq!(cache.stats().await.entries, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_purge_expired() {
        let fetcher = CountingFetcher::new(Duration::from_millis(10));
        let cache = cache_with(fetcher.clone());
        let descriptor = descriptor();

        cache.get_or_fetch(&descriptor, range(2024), Frequency::Daily).await.unwrap();
        cache.get_or_fetch(&descriptor, range(2024), Frequency::Quarterly).await.unwrap();

        tokio::time::advance(Duration::from_secs(2 * 3_600)).await;
        assert_eq!(cache.purge_expired().await, 1);
        assert_eq!(cache.stats().await.entries, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_during_load_keeps_single_flight() {
        let fetcher = CountingFetcher::new(Duration::from_millis(200));
        let cache = cache_with(fetcher.clone());
        let descriptor = descriptor();

        let first = {
            let cache = cache.clone();
            let descriptor = descriptor.clone();
            tokio::spawn(async move {
                cache.get_or_fetch(&descriptor, range(2024), Frequency::Daily).await
            })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;

        cache.clear().await;
        assert_eq!(cache.stats().await.tracked_keys, 1);

        // 진행 중인 조회를 기다렸다가 결과를 공유
        let second = cache
            .get_or_fetch(&descriptor, range(2024), Frequency::Daily)
            .await
            .unwrap();
        let first = first.await.unwrap().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(fetcher.calls(), 1);

        // 초기화 전에 시작된 조회의 결과는 이후 요청의 히트로 쓰이지 않음
        assert_eq!(cache.stats().await.entries, 0);
        cache.get_or_fetch(&descriptor, range(2024), Frequency::Daily).await.unwrap();
        assert_eq!(fetcher.calls(), 2);
        assert_eq!(cache.stats().await.entries, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalidate_during_load_does_not_start_second_fetch() {
        let fetcher = CountingFetcher::new(Duration::from_millis(200));
        let cache = cache_with(fetcher.clone());
        let descriptor = descriptor();
        let key = CacheKey::new("fed_funds_rate", range(2024), Frequency::Daily);

        let (a, b) = tokio::join!(
            cache.get_or_fetch(&descriptor, range(2024), Frequency::Daily),
            async {
                tokio::time::sleep(Duration::from_millis(50)).await;
                assert!(cache.invalidate(&key).await);
                cache.get_or_fetch(&descriptor, range(2024), Frequency::Daily).await
            },
        );

        assert!(Arc::ptr_eq(&a.unwrap(), &b.unwrap()));
        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_slots_pruned_on_new_key() {
        let fetcher = CountingFetcher::failing();
        let cache = cache_with(fetcher.clone());
        let descriptor = descriptor();

        for year in 2015..2025 {
            let _ = cache.get_or_fetch(&descriptor, range(year), Frequency::Daily).await;
            assert_eq!(cache.stats().await.tracked_keys, 1);
        }
        assert_eq!(fetcher.calls(), 10);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_slots_pruned_on_new_key() {
        let fetcher = CountingFetcher::new(Duration::from_millis(10));
        let cache = cache_with(fetcher.clone());
        let descriptor = descriptor();

        cache.get_or_fetch(&descriptor, range(2023), Frequency::Daily).await.unwrap();
        cache.get_or_fetch(&descriptor, range(2023), Frequency::Quarterly).await.unwrap();
        tokio::time::advance(Duration::from_secs(2 * 3_600)).await;

        // 만료된 일간 항목만 정리되고 분기 항목은 유지
        cache.get_or_fetch(&descriptor, range(2024), Frequency::Daily).await.unwrap();
        let stats = cache.stats().await;
        assert_eq!(stats.tracked_keys, 2);
        assert_eq!(stats.entries, 2);
    }

    #[tokio::test]
    async fn test_provider_not_configured() {
        let cache = SeriesCache::new(
            FetcherRegistry::new(),
            CacheConfig::default(),
            RetryConfig::default(),
        );
        let err = cache
            .get_or_fetch(&descriptor(), range(2024), Frequency::Daily)
            .await
            .unwrap_err();
        assert!(matches!(err, DataError::ProviderNotConfigured(Provider::Fred)));
        assert!(err.is_configuration());
    }
}
