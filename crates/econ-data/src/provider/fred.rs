//! FRED (Federal Reserve Economic Data) 어댑터.
//!
//! `GET {base_url}/fred/series/observations` 로 관측치를 조회합니다.
//! FRED는 결측 값을 `"."`로 표기하며, 이 어댑터는 이를 `None`으로 전달합니다.

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument};

use econ_core::{DateRange, FredConfig, ObservationPoint, Provider};

use super::{clip_to_range, SeriesFetcher};
use crate::error::{DataError, FetchError, Result};

const OBSERVATIONS_PATH: &str = "/fred/series/observations";

/// FRED observations API 클라이언트.
pub struct FredFetcher {
    client: Client,
    base_url: String,
    api_key: SecretString,
}

impl FredFetcher {
    /// 새 FRED 어댑터 생성.
    pub fn new(config: &FredConfig, api_key: &SecretString) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| DataError::Config(format!("FRED HTTP 클라이언트 생성 실패: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: SecretString::new(api_key.expose_secret().into()),
        })
    }

    fn transport_error(&self, err: reqwest::Error) -> FetchError {
        // 요청 URL에 api_key가 들어 있으므로 메시지에서 URL을 제거
        let err = err.without_url();
        if err.is_decode() {
            FetchError::MalformedPayload {
                provider: Provider::Fred,
                message: err.to_string(),
            }
        } else {
            FetchError::ProviderUnavailable {
                provider: Provider::Fred,
                message: err.to_string(),
            }
        }
    }
}

#[async_trait]
impl SeriesFetcher for FredFetcher {
    fn provider(&self) -> Provider {
        Provider::Fred
    }

    #[instrument(skip(self), fields(provider = "fred"))]
    async fn fetch(
        &self,
        native_id: &str,
        range: DateRange,
    ) -> std::result::Result<Vec<ObservationPoint>, FetchError> {
        let url = format!("{}{}", self.base_url, OBSERVATIONS_PATH);
        let start = range.start().to_string();
        let end = range.end().to_string();

        let response = self
            .client
            .get(&url)
            .query(&[
                ("series_id", native_id),
                ("api_key", self.api_key.expose_secret()),
                ("file_type", "json"),
                ("observation_start", start.as_str()),
                ("observation_end", end.as_str()),
                ("sort_order", "asc"),
            ])
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map(Duration::from_secs);
            return Err(FetchError::ProviderRateLimited {
                provider: Provider::Fred,
                retry_after,
            });
        }
        if status.is_server_error() {
            return Err(FetchError::ProviderUnavailable {
                provider: Provider::Fred,
                message: format!("HTTP {}", status),
            });
        }
        if !status.is_success() {
            let message = response
                .json::<ErrorResponse>()
                .await
                .map(|body| body.error_message)
                .unwrap_or_else(|_| format!("HTTP {}", status));
            return Err(FetchError::InvalidRequest {
                provider: Provider::Fred,
                message: format!("{} ({})", message, native_id),
            });
        }

        let body: ObservationsResponse = response.json().await.map_err(|e| self.transport_error(e))?;
        let points = parse_observations(body.observations)?;
        let points = clip_to_range(points, range);

        debug!(
            series_id = native_id,
            count = points.len(),
            "FRED 관측치 수신"
        );

        if points.is_empty() {
            return Err(FetchError::NoDataInRange {
                native_id: native_id.to_string(),
                range,
            });
        }

        Ok(points)
    }
}

#[derive(Debug, Deserialize)]
struct ObservationsResponse {
    #[serde(default)]
    observations: Vec<Observation>,
}

#[derive(Debug, Deserialize)]
struct Observation {
    date: String,
    value: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error_message: String,
}

fn parse_observations(
    observations: Vec<Observation>,
) -> std::result::Result<Vec<ObservationPoint>, FetchError> {
    observations
        .into_iter()
        .map(|obs| {
            let date = NaiveDate::parse_from_str(&obs.date, "%Y-%m-%d").map_err(|e| {
                FetchError::MalformedPayload {
                    provider: Provider::Fred,
                    message: format!("Invalid FRED date '{}': {}", obs.date, e),
                }
            })?;
            Ok(ObservationPoint {
                date,
                value: parse_value(&obs.value),
            })
        })
        .collect()
}

/// FRED 값 파싱. `"."`, 빈 문자열, 비유한 값은 결측.
fn parse_value(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed == "." || trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}
