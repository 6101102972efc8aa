//! 핵심 에러 타입.

use thiserror::Error;

/// 카탈로그/설정 에러.
#[derive(Debug, Clone, Error)]
pub enum CoreError {
    /// 등록되지 않은 지표 (재시도 대상 아님)
    #[error("알 수 없는 지표: {0}")]
    UnknownMetric(String),

    /// 카탈로그 구성 에러
    #[error("카탈로그 에러: {0}")]
    Catalog(String),

    /// 설정 에러
    #[error("설정 에러: {0}")]
    Config(String),
}

/// 핵심 작업을 위한 Result 타입.
pub type CoreResult<T> = Result<T, CoreError>;

impl From<config::ConfigError> for CoreError {
    fn from(err: config::ConfigError) -> Self {
        CoreError::Config(err.to_string())
    }
}
