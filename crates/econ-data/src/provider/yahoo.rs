//! Yahoo Finance 어댑터.
//!
//! `GET {base_url}/v8/finance/chart/{symbol}` 일봉 응답에서 종가를 읽습니다.
//! 선물(HG=F, GC=F, CL=F)과 지수(^VIX, ^GSPC) 티커를 사용합니다.
//!
//! 종가가 `null`인 봉도 날짜를 유지한 채 `None`으로 전달합니다.

use async_trait::async_trait;
use chrono::{DateTime, Days, NaiveDate, NaiveTime};
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument};

use econ_core::{DateRange, ObservationPoint, Provider, YahooConfig};

use super::{clip_to_range, SeriesFetcher};
use crate::error::{DataError, FetchError, Result};

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Yahoo Finance 일봉 종가 어댑터.
pub struct YahooFetcher {
    client: Client,
    base_url: Url,
}

impl YahooFetcher {
    pub fn new(config: &YahooConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| DataError::Config(format!("Yahoo Finance HTTP 클라이언트 생성 실패: {}", e)))?;

        let base_url = Url::parse(&config.base_url)
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .ok_or_else(|| {
                DataError::Config(format!("잘못된 Yahoo Finance base_url: {}", config.base_url))
            })?;

        Ok(Self { client, base_url })
    }

    fn chart_url(&self, symbol: &str) -> std::result::Result<Url, FetchError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| FetchError::InvalidRequest {
                provider: Provider::YahooFinance,
                message: format!("chart URL 생성 실패 ({})", symbol),
            })?
            .pop_if_empty()
            .extend(["v8", "finance", "chart", symbol]);
        Ok(url)
    }
}

fn transport_error(err: reqwest::Error) -> FetchError {
    if err.is_decode() {
        FetchError::MalformedPayload {
            provider: Provider::YahooFinance,
            message: err.to_string(),
        }
    } else {
        FetchError::ProviderUnavailable {
            provider: Provider::YahooFinance,
            message: err.without_url().to_string(),
        }
    }
}

#[async_trait]
impl SeriesFetcher for YahooFetcher {
    fn provider(&self) -> Provider {
        Provider::YahooFinance
    }

    #[instrument(skip(self), fields(provider = "yahoo"))]
    async fn fetch(
        &self,
        native_id: &str,
        range: DateRange,
    ) -> std::result::Result<Vec<ObservationPoint>, FetchError> {
        // period2는 배타적이므로 하루를 더해 마지막 날을 포함
        let end_date = range
            .end()
            .checked_add_days(Days::new(1))
            .unwrap_or(range.end());
        let period1 = unix_midnight(range.start()).to_string();
        let period2 = unix_midnight(end_date).to_string();

        debug!(symbol = native_id, start = %range.start(), end = %range.end(), "Yahoo Finance API 호출");

        let response = self
            .client
            .get(self.chart_url(native_id)?)
            .query(&[
                ("period1", period1.as_str()),
                ("period2", period2.as_str()),
                ("interval", "1d"),
                ("events", "history"),
            ])
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map(Duration::from_secs);
            return Err(FetchError::ProviderRateLimited {
                provider: Provider::YahooFinance,
                retry_after,
            });
        }
        if status.is_server_error() {
            return Err(FetchError::ProviderUnavailable {
                provider: Provider::YahooFinance,
                message: format!("HTTP {}", status),
            });
        }
        if !status.is_success() {
            let message = response
                .json::<ChartResponse>()
                .await
                .ok()
                .and_then(|body| body.chart.error)
                .map(|e| format!("{}: {}", e.code, e.description))
                .unwrap_or_else(|| format!("HTTP {}", status));
            return Err(FetchError::InvalidRequest {
                provider: Provider::YahooFinance,
                message: format!("{} ({})", message, native_id),
            });
        }

        let body: ChartResponse = response.json().await.map_err(transport_error)?;
        let points = clip_to_range(chart_points(body, native_id, range)?, range);

        debug!(symbol = native_id, count = points.len(), "Yahoo Finance 종가 수신");

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
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: Option<ChartMeta>,
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct ChartMeta {
    /// 거래소 현지 시각의 UTC 오프셋 (초)
    gmtoffset: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<QuoteColumns>,
}

#[derive(Debug, Deserialize)]
struct QuoteColumns {
    close: Option<Vec<Option<f64>>>,
}

/// chart 응답을 관측치로 변환합니다.
///
/// 타임스탬프마다 관측치를 하나씩 만들며, 종가가 `null`이거나 비유한 값이면 결측입니다.
/// 날짜는 거래소 현지 날짜(`gmtoffset` 반영)입니다.
fn chart_points(
    body: ChartResponse,
    native_id: &str,
    range: DateRange,
) -> std::result::Result<Vec<ObservationPoint>, FetchError> {
    if let Some(error) = body.chart.error {
        return Err(if error.code.eq_ignore_ascii_case("not found") {
            FetchError::InvalidRequest {
                provider: Provider::YahooFinance,
                message: format!("{} ({})", error.description, native_id),
            }
        } else {
            FetchError::MalformedPayload {
                provider: Provider::YahooFinance,
                message: format!("{}: {}", error.code, error.description),
            }
        });
    }

    let result = body
        .chart
        .result
        .and_then(|results| results.into_iter().next())
        .ok_or_else(|| FetchError::NoDataInRange {
            native_id: native_id.to_string(),
            range,
        })?;

    let offset = result.meta.and_then(|m| m.gmtoffset).unwrap_or(0);
    let timestamps = result.timestamp.unwrap_or_default();
    let closes = result
        .indicators
        .quote
        .into_iter()
        .next()
        .and_then(|q| q.close)
        .unwrap_or_default();

    timestamps
        .iter()
        .enumerate()
        .map(|(i, &ts)| {
            let date = ts
                .checked_add(offset)
                .and_then(|local| DateTime::from_timestamp(local, 0))
                .map(|dt| dt.date_naive())
                .ok_or_else(|| FetchError::MalformedPayload {
                    provider: Provider::YahooFinance,
                    message: format!("Invalid Yahoo timestamp: {}", ts),
                })?;
            let value = closes.get(i).copied().flatten().filter(|v| v.is_finite());
            Ok(ObservationPoint { date, value })
        })
        .collect()
}

/// 날짜의 UTC 자정 Unix 타임스탬프.
fn unix_midnight(date: NaiveDate) -> i64 {
    date.and_time(NaiveTime::default()).and_utc().timestamp()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn range() -> DateRange {
        DateRange::new(date(2024, 1, 1), date(2024, 12, 31)).unwrap()
    }

    fn parse(json: &str) -> ChartResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_null_close_kept_as_missing() {
        // 2024-03-04, 03-05, 03-06 14:30 UTC (뉴욕 09:30)
        let body = parse(
            r#"{"chart":{"result":[{
                "meta":{"gmtoffset":-18000},
                "timestamp":[1709562600,1709649000,1709735400],
                "indicators":{"quote":[{"close":[14.5,null,13.9]}]}
            }],"error":null}}"#,
        );

        let points = chart_points(body, "^VIX", range()).unwrap();
        assert_eq!(
            points,
            vec![
                ObservationPoint::new(date(2024, 3, 4), 14.5),
                ObservationPoint::missing(date(2024, 3, 5)),
                ObservationPoint::new(date(2024, 3, 6), 13.9),
            ]
        );
    }

    #[test]
    fn test_short_close_column_is_missing() {
        let body = parse(
            r#"{"chart":{"result":[{
                "timestamp":[1709562600,1709649000],
                "indicators":{"quote":[{"close":[4.1]}]}
            }],"error":null}}"#,
        );

        let points = chart_points(body, "HG=F", range()).unwrap();
        assert_eq!(points.len(), 2);
        assert!(points[1].is_missing());
    }

    #[test]
    fn test_gmtoffset_shifts_date() {
        // 2024-03-05 03:00 UTC는 뉴욕 기준 3월 4일 22:00
        let body = parse(
            r#"{"chart":{"result":[{
                "meta":{"gmtoffset":-18000},
                "timestamp":[1709607600],
                "indicators":{"quote":[{"close":[80.1]}]}
            }],"error":null}}"#,
        );

        let points = chart_points(body, "CL=F", range()).unwrap();
        assert_eq!(points[0].date, date(2024, 3, 4));
    }

    #[test]
    fn test_chart_error_not_found() {
        let body = parse(
            r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#,
        );

        let err = chart_points(body, "NOPE", range()).unwrap_err();
        assert!(matches!(err, FetchError::InvalidRequest { .. }));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_empty_result_is_no_data() {
        let body = parse(r#"{"chart":{"result":[],"error":null}}"#);
        let err = chart_points(body, "^GSPC", range()).unwrap_err();
        assert!(matches!(err, FetchError::NoDataInRange { .. }));
    }

    #[test]
    fn test_chart_url_appends_symbol_segment() {
        let config = YahooConfig {
            base_url: "http://127.0.0.1:1234/".to_string(),
            ..YahooConfig::default()
        };
        let fetcher = YahooFetcher::new(&config).unwrap();
        let url = fetcher.chart_url("GC=F").unwrap();
        assert_eq!(url.path(), "/v8/finance/chart/GC=F");
    }

    #[test]
    fn test_unix_midnight() {
        assert_eq!(unix_midnight(date(2024, 3, 4)), 1_709_510_400);
    }
}
