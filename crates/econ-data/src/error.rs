//! 데이터 모듈 오류 타입.

use std::time::Duration;

use econ_core::{CoreError, DateRange, Provider};
use thiserror::Error;

/// 제공자 어댑터 오류.
///
/// 어댑터는 재시도하지 않습니다. 재시도 여부는 [`FetchError::is_retryable`]로 캐시 레이어가 판단합니다.
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    /// 전송 실패 (연결 오류, 타임아웃, 5xx)
    #[error("Provider unavailable ({provider}): {message}")]
    ProviderUnavailable { provider: Provider, message: String },

    /// 요청 한도 초과
    #[error("Provider rate limited ({provider})")]
    ProviderRateLimited {
        provider: Provider,
        /// 제공자가 알려준 대기 시간
        retry_after: Option<Duration>,
    },

    /// 구간에 데이터 없음 (오류가 아니라 빈 시계열로 처리)
    #[error("No data in range for {native_id}: {range}")]
    NoDataInRange { native_id: String, range: DateRange },

    /// 제공자가 요청 자체를 거부 (존재하지 않는 시리즈 등)
    #[error("Invalid request ({provider}): {message}")]
    InvalidRequest { provider: Provider, message: String },

    /// 응답 형식 오류
    #[error("Malformed payload ({provider}): {message}")]
    MalformedPayload { provider: Provider, message: String },
}

impl FetchError {
    /// 일시적인 오류인지 확인.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            FetchError::ProviderUnavailable { .. } | FetchError::ProviderRateLimited { .. }
        )
    }

    /// 제공자가 요청한 최소 대기 시간.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            FetchError::ProviderRateLimited { retry_after, .. } => *retry_after,
            _ => None,
        }
    }
}

/// 데이터 조회 오류.
#[derive(Debug, Clone, Error)]
pub enum DataError {
    /// 카탈로그에 없는 지표
    #[error("Unknown metric: {0}")]
    UnknownMetric(String),

    /// 재시도 후에도 데이터를 가져오지 못함
    #[error("Data unavailable for {metric_id} ({range}) after {attempts} attempt(s): {last_error}")]
    DataUnavailable {
        metric_id: String,
        range: DateRange,
        attempts: u32,
        #[source]
        last_error: FetchError,
    },

    /// 제공자 어댑터가 등록되지 않음 (예: FRED API 키 없음)
    #[error("Provider not configured: {0}")]
    ProviderNotConfigured(Provider),

    /// 설정 오류
    #[error("Configuration error: {0}")]
    Config(String),

    /// 내부 오류
    #[error("Internal error: {0}")]
    Internal(String),
}

impl DataError {
    /// 호출자에게 즉시 노출해야 하는 설정/프로그래머 오류인지 확인.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            DataError::UnknownMetric(_) | DataError::ProviderNotConfigured(_) | DataError::Config(_)
        )
    }
}

impl From<CoreError> for DataError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::UnknownMetric(id) => DataError::UnknownMetric(id),
            other => DataError::Config(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, DataError>;
