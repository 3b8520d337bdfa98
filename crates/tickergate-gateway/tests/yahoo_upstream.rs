//! Yahoo adapter against a local mock of the provider.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

use tickergate_core::market::{EarningsFrequency, Interval, Period, Symbol};
use tickergate_core::ErrorKind;
use tickergate_gateway::config::UpstreamSection;
use tickergate_gateway::upstream::{MarketDataProvider, YahooProvider};

const CHART: &str = r#"{"chart":{"result":[{"meta":{"symbol":"AAPL"},
    "timestamp":[1710509400],
    "indicators":{"quote":[{"open":[171.0],"high":[173.5],"low":[170.25],"close":[172.5],"volume":[121664700]}]}}],
    "error":null}}"#;

const EARNINGS: &str = r#"{"quoteSummary":{"result":[{"earnings":{"financialsChart":{
    "yearly":[{"date":2023,"revenue":{"raw":383285000000},"earnings":{"raw":96995000000}}],
    "quarterly":[]}}}],"error":null}}"#;

const INVALID_CRUMB: &str =
    r#"{"finance":{"result":null,"error":{"code":"Unauthorized","description":"Invalid Crumb"}}}"#;

fn provider(server: &MockServer) -> YahooProvider {
    let cfg = UpstreamSection {
        base_url: server.uri(),
        session_url: format!("{}/session", server.uri()),
        timeout_ms: 2_000,
        ..UpstreamSection::default()
    };
    YahooProvider::new(&cfg).unwrap()
}

async fn hits(server: &MockServer, prefix: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.url.path().starts_with(prefix))
        .count()
}

async fn mount_session(server: &MockServer, crumb: &str) {
    Mock::given(method("GET"))
        .and(path("/session"))
        .respond_with(ResponseTemplate::new(404))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/test/getcrumb"))
        .respond_with(ResponseTemplate::new(200).set_body_string(crumb))
        .mount(server)
        .await;
}

#[tokio::test]
async fn ticker_with_url_syntax_stays_in_one_segment() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path_regex("^/v8/finance/chart/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(CHART))
        .mount(&server)
        .await;
    let yahoo = provider(&server);

    let sym = Symbol::parse("AAPL?range=max&interval=1m#frag/../x").unwrap();
    let bars = yahoo.history(&sym, Period::OneDay, Interval::OneDay).await.unwrap();
    assert_eq!(bars.len(), 1);

    let reqs = server.received_requests().await.unwrap();
    assert_eq!(reqs.len(), 1);
    assert_eq!(
        reqs[0].url.path(),
        "/v8/finance/chart/AAPL%3Frange%3Dmax%26interval%3D1m%23frag%2F..%2Fx"
    );
    let query: Vec<(String, String)> = reqs[0].url.query_pairs().into_owned().collect();
    assert_eq!(
        query,
        vec![
            ("range".to_string(), "1d".to_string()),
            ("interval".to_string(), "1d".to_string()),
        ]
    );
}

#[tokio::test]
async fn dot_only_ticker_never_reaches_upstream() {
    let server = MockServer::start().await;
    let yahoo = provider(&server);

    let err = yahoo
        .history(&Symbol::parse("..").unwrap(), Period::OneDay, Interval::OneDay)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BadRequest);

    let err = yahoo.profile(&Symbol::parse(".").unwrap()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BadRequest);

    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn crumb_is_fetched_once_and_reused() {
    let server = MockServer::start().await;
    mount_session(&server, "crumb-1").await;
    Mock::given(method("GET"))
        .and(path_regex("^/v10/finance/quoteSummary/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(EARNINGS))
        .mount(&server)
        .await;
    let yahoo = provider(&server);
    let sym = Symbol::parse("AAPL").unwrap();

    for _ in 0..2 {
        let rows = yahoo.earnings(&sym, EarningsFrequency::Yearly).await.unwrap();
        assert_eq!(rows[0].period, "2023");
    }

    assert_eq!(hits(&server, "/v1/test/getcrumb").await, 1);
    assert_eq!(hits(&server, "/session").await, 1);

    let reqs = server.received_requests().await.unwrap();
    let summaries: Vec<_> = reqs
        .iter()
        .filter(|r| r.url.path().starts_with("/v10/"))
        .collect();
    assert_eq!(summaries.len(), 2);
    for r in summaries {
        assert!(r.url.query_pairs().any(|(k, v)| k == "crumb" && v == "crumb-1"));
    }
}

#[tokio::test]
async fn unauthorized_drops_crumb_without_retry() {
    let server = MockServer::start().await;
    mount_session(&server, "crumb-1").await;
    Mock::given(method("GET"))
        .and(path_regex("^/v10/finance/quoteSummary/"))
        .respond_with(ResponseTemplate::new(401).set_body_string(INVALID_CRUMB))
        .mount(&server)
        .await;
    let yahoo = provider(&server);
    let sym = Symbol::parse("AAPL").unwrap();

    let err = yahoo.profile(&sym).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Upstream);
    assert!(err.to_string().contains("401"));
    assert_eq!(hits(&server, "/v1/test/getcrumb").await, 1);
    assert_eq!(hits(&server, "/v10/").await, 1);

    // next request starts over with a fresh crumb
    yahoo.profile(&sym).await.unwrap_err();
    assert_eq!(hits(&server, "/v1/test/getcrumb").await, 2);
    assert_eq!(hits(&server, "/v10/").await, 2);
}
