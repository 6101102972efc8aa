//! 설정 관리.
//!
//! 기본값 → 설정 파일(TOML, 선택) → 환경 변수(`ECON__SECTION__KEY`) 순으로 덮어씁니다.
//! API 키 같은 자격증명은 `AppConfig`에 두지 않고 [`Credentials`]로 따로 로드합니다.

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use crate::domain::Category;
use crate::error::{CoreError, CoreResult};
use crate::types::Frequency;

/// 애플리케이션 설정.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    /// FRED 설정
    pub fred: FredConfig,
    /// Yahoo Finance 설정
    pub yahoo: YahooConfig,
    /// 시계열 캐시 설정
    pub cache: CacheConfig,
    /// 재시도 설정
    pub retry: RetryConfig,
    /// 대시보드 조회 설정
    pub dashboard: DashboardConfig,
    /// 로깅 설정
    pub logging: LoggingConfig,
}

/// FRED API 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FredConfig {
    /// API 기본 URL (테스트에서 목 서버로 교체)
    pub base_url: String,
    /// 요청 타임아웃 (초)
    pub timeout_secs: u64,
}

impl Default for FredConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.stlouisfed.org".to_string(),
            timeout_secs: 30,
        }
    }
}

impl FredConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Yahoo Finance 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct YahooConfig {
    /// Yahoo Finance 어댑터 활성화 여부
    pub enabled: bool,
    /// chart API 기본 URL (테스트에서 목 서버로 교체)
    pub base_url: String,
    /// 요청 타임아웃 (초)
    pub timeout_secs: u64,
}

impl Default for YahooConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: "https://query1.finance.yahoo.com".to_string(),
            timeout_secs: 30,
        }
    }
}

impl YahooConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// 시계열 캐시 설정.
///
/// 분기 데이터는 거의 바뀌지 않으므로 일간 데이터보다 TTL이 깁니다.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    /// 일간 해상도 TTL (초)
    pub daily_ttl_secs: u64,
    /// 주간 해상도 TTL (초)
    pub weekly_ttl_secs: u64,
    /// 월간 해상도 TTL (초)
    pub monthly_ttl_secs: u64,
    /// 분기 해상도 TTL (초)
    pub quarterly_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            daily_ttl_secs: 3_600,
            weekly_ttl_secs: 6 * 3_600,
            monthly_ttl_secs: 12 * 3_600,
            quarterly_ttl_secs: 24 * 3_600,
        }
    }
}

impl CacheConfig {
    /// 해상도별 TTL.
    pub fn ttl_for(&self, resolution: Frequency) -> Duration {
        let secs = match resolution {
            Frequency::Daily => self.daily_ttl_secs,
            Frequency::Weekly => self.weekly_ttl_secs,
            Frequency::Monthly => self.monthly_ttl_secs,
            Frequency::Quarterly => self.quarterly_ttl_secs,
        };
        Duration::from_secs(secs)
    }
}

/// 일시적 제공자 실패에 대한 재시도 설정 (지수 백오프).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// 최대 시도 횟수 (첫 시도 포함)
    pub max_attempts: u32,
    /// 첫 재시도 전 대기 (밀리초)
    pub initial_backoff_ms: u64,
    /// 대기 상한 (밀리초)
    pub max_backoff_ms: u64,
    /// 재시도마다 곱하는 배수
    pub multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff_ms: 500,
            max_backoff_ms: 8_000,
            multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    /// `attempt`번째 시도가 실패한 뒤의 대기 시간 (1부터 시작).
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1) as i32;
        let delay = self.initial_backoff_ms as f64 * self.multiplier.powi(exponent);
        let capped = delay.min(self.max_backoff_ms as f64);
        Duration::from_millis(capped as u64)
    }

    /// 재시도 없이 한 번만 시도.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Default::default()
        }
    }
}

/// 대시보드 조회 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// 분류별 표시 주기 (키: consumption, supply, interest_rate, market).
    /// 없으면 지표의 원본 주기를 사용합니다.
    pub display_frequency: HashMap<String, Frequency>,
    /// YoY 비교용으로 추가로 가져올 개월 수
    pub lookback_months: u32,
    /// 일괄 조회 동시 실행 수
    pub max_concurrent_queries: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            display_frequency: HashMap::new(),
            lookback_months: 12,
            max_concurrent_queries: 8,
        }
    }
}

impl DashboardConfig {
    /// 지표를 표시할 주기.
    pub fn display_frequency_for(&self, category: Category, native: Frequency) -> Frequency {
        self.display_frequency
            .get(category.as_key())
            .copied()
            .unwrap_or(native)
    }
}

/// 로깅 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 로그 레벨
    pub level: String,
    /// 로그 형식 (pretty, json, compact)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl AppConfig {
    /// 파일과 환경 변수에서 설정을 로드합니다.
    pub fn load<P: AsRef<Path>>(path: P) -> CoreResult<Self> {
        Self::build(Some(path.as_ref()))
    }

    /// 환경 변수만으로 설정을 로드합니다 (파일 없음).
    pub fn from_env() -> CoreResult<Self> {
        Self::build(None)
    }

    fn build(path: Option<&Path>) -> CoreResult<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        }
        let builder = builder.add_source(
            config::Environment::with_prefix("ECON")
                .separator("__")
                .try_parsing(true),
        );

        let config: AppConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// 설정 값 검증.
    pub fn validate(&self) -> CoreResult<()> {
        if self.retry.max_attempts == 0 {
            return Err(CoreError::Config(
                "retry.max_attempts는 1 이상이어야 합니다".to_string(),
            ));
        }
        if !(self.retry.multiplier.is_finite() && self.retry.multiplier >= 1.0) {
            return Err(CoreError::Config(
                "retry.multiplier는 1.0 이상의 유한한 값이어야 합니다".to_string(),
            ));
        }
        if self.dashboard.max_concurrent_queries == 0 {
            return Err(CoreError::Config(
                "dashboard.max_concurrent_queries는 1 이상이어야 합니다".to_string(),
            ));
        }
        for key in self.dashboard.display_frequency.keys() {
            if key.parse::<Category>().is_err() {
                return Err(CoreError::Config(format!(
                    "dashboard.display_frequency: 알 수 없는 분류 '{}'",
                    key
                )));
            }
        }
        Ok(())
    }
}

/// 외부 제공자 자격증명.
///
/// 로그나 설정 덤프에 노출되지 않도록 `SecretString`으로 보관합니다.
#[derive(Debug, Default)]
pub struct Credentials {
    /// FRED API 키
    pub fred_api_key: Option<SecretString>,
}

impl Credentials {
    /// `.env` 파일과 환경 변수에서 자격증명을 로드합니다.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let fred_api_key = std::env::var("FRED_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())
            .map(|key| SecretString::new(key.into()));

        Self { fred_api_key }
    }
}
