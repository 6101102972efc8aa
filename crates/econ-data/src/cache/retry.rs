//! 제공자 호출 재시도 (지수 백오프).

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tracing::{debug, warn};

use econ_core::{DateRange, ObservationPoint, RetryConfig};

use crate::error::FetchError;
use crate::provider::SeriesFetcher;

/// 재시도를 모두 소진했거나 재시도할 수 없는 오류.
#[derive(Debug, Clone)]
pub struct RetryExhausted {
    /// 실제 시도 횟수
    pub attempts: u32,
    /// 마지막 제공자 오류
    pub last_error: FetchError,
}

/// 재시도 정책에 따라 관측치를 가져옵니다.
///
/// - `ProviderUnavailable`, `ProviderRateLimited`만 재시도합니다.
/// - 대기 시간은 `max(백오프, Retry-After)`이며 `max_backoff_ms`를 넘지 않습니다.
/// - `NoDataInRange`는 오류가 아니라 빈 결과입니다.
///
/// `upstream_calls`는 어댑터 호출마다 1씩 증가합니다.
pub async fn fetch_with_retry(
    fetcher: &dyn SeriesFetcher,
    native_id: &str,
    range: DateRange,
    policy: &RetryConfig,
    upstream_calls: &AtomicU64,
) -> Result<Vec<ObservationPoint>, RetryExhausted> {
    let max_attempts = policy.max_attempts.max(1);
    let max_backoff = Duration::from_millis(policy.max_backoff_ms);
    let mut attempt = 0;

    loop {
        attempt += 1;
        upstream_calls.fetch_add(1, Ordering::Relaxed);

        let err = match fetcher.fetch(native_id, range).await {
            Ok(points) => return Ok(points),
            Err(FetchError::NoDataInRange { .. }) => {
                debug!(native_id = native_id, range = %range, "구간에 데이터 없음, 빈 시계열 반환");
                return Ok(Vec::new());
            }
            Err(e) => e,
        };

        if !err.is_retryable() || attempt >= max_attempts {
            warn!(
                provider = %fetcher.provider(),
                native_id = native_id,
                attempts = attempt,
                error = %err,
                "시계열 조회 최종 실패"
            );
            return Err(RetryExhausted {
                attempts: attempt,
                last_error: err,
            });
        }

        let delay = policy
            .backoff_for(attempt)
            .max(err.retry_after().unwrap_or_default())
            .min(max_backoff);

        debug!(
            provider = %fetcher.provider(),
            native_id = native_id,
            attempt = attempt,
            max_attempts = max_attempts,
            delay_ms = delay.as_millis() as u64,
            error = %err,
            "시계열 조회 재시도 예정"
        );
        tokio::time::sleep(delay).await;
    }
}
