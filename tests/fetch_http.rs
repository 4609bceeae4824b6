// tests/fetch_http.rs
use std::time::Duration;

use campus_feed_ingest::ingest::fetch::{HttpFetcher, SourceFetcher};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn returns_body_and_sends_user_agent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/calendar.ics"))
        .and(header("user-agent", "campus-test-agent"))
        .respond_with(ResponseTemplate::new(200).set_body_string("BEGIN:VCALENDAR"))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = HttpFetcher::new("campus-test-agent", Duration::from_secs(5)).unwrap();
    let body = fetcher
        .fetch_text(&format!("{}/calendar.ics", server.uri()))
        .await
        .unwrap();
    assert_eq!(body, "BEGIN:VCALENDAR");
}

#[tokio::test]
async fn non_success_status_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503).set_body_string("down"))
        .mount(&server)
        .await;

    let fetcher = HttpFetcher::new("campus-test-agent", Duration::from_secs(5)).unwrap();
    let err = fetcher.fetch_text(&server.uri()).await.unwrap_err();
    assert_eq!(err.to_string(), "HTTP 503");
}

#[tokio::test]
async fn slow_response_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("late")
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let fetcher = HttpFetcher::new("campus-test-agent", Duration::from_millis(200)).unwrap();
    let err = fetcher.fetch_text(&server.uri()).await.unwrap_err();
    assert!(err.to_string().contains("timed out"), "got: {err:#}");
}
