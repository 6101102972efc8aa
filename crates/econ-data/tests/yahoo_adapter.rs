//! Yahoo Finance 어댑터 통합 테스트 (mockito 목 서버).

use chrono::NaiveDate;
use mockito::{Matcher, Server};
use std::time::Duration;

use econ_core::{DateRange, ObservationPoint, YahooConfig};
use econ_data::{FetchError, SeriesFetcher, YahooFetcher};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn range() -> DateRange {
    DateRange::new(date(2024, 3, 1), date(2024, 3, 31)).unwrap()
}

fn fetcher(server: &Server) -> YahooFetcher {
    let config = YahooConfig {
        enabled: true,
        base_url: server.url(),
        timeout_secs: 5,
    };
    YahooFetcher::new(&config).unwrap()
}

#[tokio::test]
async fn test_fetch_keeps_null_close_dates() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/v8/finance/chart/GC=F")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("period1".into(), "1709251200".into()),
            Matcher::UrlEncoded("period2".into(), "1711929600".into()),
            Matcher::UrlEncoded("interval".into(), "1d".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"chart":{"result":[{
                "meta":{"symbol":"GC=F","currency":"USD","gmtoffset":-18000},
                "timestamp":[1709562600,1709649000,1709735400],
                "indicators":{"quote":[{
                    "open":[2090.0,null,2130.0],
                    "close":[2126.3,null,2141.9],
                    "volume":[1200,null,1350]
                }]}
            }],"error":null}}"#,
        )
        .create_async()
        .await;

    let points = fetcher(&server).fetch("GC=F", range()).await.unwrap();
    mock.assert_async().await;

    assert_eq!(
        points,
        vec![
            ObservationPoint::new(date(2024, 3, 4), 2126.3),
            ObservationPoint::missing(date(2024, 3, 5)),
            ObservationPoint::new(date(2024, 3, 6), 2141.9),
        ]
    );
}

#[tokio::test]
async fn test_fetch_rate_limited() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/v8/finance/chart/CL=F")
        .match_query(Matcher::Any)
        .with_status(429)
        .with_header("retry-after", "3")
        .create_async()
        .await;

    let err = fetcher(&server).fetch("CL=F", range()).await.unwrap_err();
    assert!(err.is_retryable());
    assert_eq!(err.retry_after(), Some(Duration::from_secs(3)));
}

#[tokio::test]
async fn test_fetch_unknown_symbol() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/v8/finance/chart/NOPE")
        .match_query(Matcher::Any)
        .with_status(404)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#,
        )
        .create_async()
        .await;

    let err = fetcher(&server).fetch("NOPE", range()).await.unwrap_err();
    match &err {
        FetchError::InvalidRequest { message, .. } => {
            assert!(message.contains("symbol may be delisted"));
            assert!(message.contains("NOPE"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_fetch_server_error_is_retryable() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/v8/finance/chart/HG=F")
        .match_query(Matcher::Any)
        .with_status(502)
        .create_async()
        .await;

    let err = fetcher(&server).fetch("HG=F", range()).await.unwrap_err();
    assert!(matches!(err, FetchError::ProviderUnavailable { .. }));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_fetch_malformed_payload() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/v8/finance/chart/HG=F")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"chart": "#)
        .create_async()
        .await;

    let err = fetcher(&server).fetch("HG=F", range()).await.unwrap_err();
    assert!(matches!(err, FetchError::MalformedPayload { .. }));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_fetch_all_outside_range_is_no_data() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/v8/finance/chart/HG=F")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"chart":{"result":[{
                "timestamp":[1706797800],
                "indicators":{"quote":[{"close":[3.9]}]}
            }],"error":null}}"#,
        )
        .create_async()
        .await;

    let err = fetcher(&server).fetch("HG=F", range()).await.unwrap_err();
    assert!(matches!(err, FetchError::NoDataInRange { .. }));
}
