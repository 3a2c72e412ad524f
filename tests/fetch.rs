//! Feed fetching against a mock HTTP server.

use serde_json::json;
use url::Url;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use scholarpage::fetch::{FeedFetcher, FetchOptions, CACHE_BUST_PARAM};
use scholarpage::source::DataSource;
use scholarpage::ScholarPageError;

fn fetcher(server: &MockServer) -> FeedFetcher {
    let base = Url::parse(&server.uri()).expect("mock uri");
    FeedFetcher::new(base, FetchOptions::default()).expect("fetcher")
}

#[tokio::test]
async fn test_fetches_both_feeds() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/scopus/scopus.json"))
        .and(header("cache-control", "no-cache"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"title": "A", "cited_by": 3},
            {"title": "B"}
        ])))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/data/scopus/metrics.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total_documents": 2,
            "total_citations": 3,
            "h_index": 1
        })))
        .mount(&server)
        .await;

    let feeds = fetcher(&server).fetch_feeds(DataSource::Scopus).await;
    assert_eq!(feeds.publications.len(), 2);
    assert_eq!(feeds.metrics.and_then(|m| m.h_index), Some(1));
}

#[tokio::test]
async fn test_requests_carry_cache_bust_token() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    fetcher(&server).fetch_publications(DataSource::Serpapi).await;

    let requests = server.received_requests().await.expect("recording enabled");
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].url.path(), "/data/serpapi/serpapi.json");
    assert!(requests[0]
        .url
        .query_pairs()
        .any(|(k, v)| k == CACHE_BUST_PARAM && v.parse::<i64>().is_ok()));
}

#[tokio::test]
async fn test_non_success_status_is_api_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let f = fetcher(&server);
    let err = f
        .fetch_json("data/scopus/metrics.json")
        .await
        .expect_err("404 should fail");
    assert!(matches!(err, ScholarPageError::Api { code: 404, .. }));

    assert!(f.fetch_metrics(DataSource::Scopus).await.is_none());
    assert!(f.fetch_publications(DataSource::Scopus).await.is_empty());
}

#[tokio::test]
async fn test_malformed_body_degrades() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/scopus/scopus.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/data/scopus/metrics.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(["not", "an", "object"])))
        .mount(&server)
        .await;

    let f = fetcher(&server);
    assert!(matches!(
        f.fetch_json("data/scopus/scopus.json").await,
        Err(ScholarPageError::Json(_))
    ));

    let feeds = f.fetch_feeds(DataSource::Scopus).await;
    assert!(feeds.publications.is_empty());
    assert!(feeds.metrics.is_none());
}

#[tokio::test]
async fn test_one_feed_failing_does_not_affect_other() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/scopus/scopus.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"title": "Only"}])))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/data/scopus/metrics.json"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let feeds = fetcher(&server).fetch_feeds(DataSource::Scopus).await;
    assert_eq!(feeds.publications.len(), 1);
    assert!(feeds.metrics.is_none());
}

#[tokio::test]
async fn test_file_base_reads_from_disk() {
    let dir = tempfile::tempdir().expect("tempdir");
    let feed_dir = dir.path().join("data").join("serpapi");
    std::fs::create_dir_all(&feed_dir).expect("mkdir");
    std::fs::write(
        feed_dir.join("serpapi.json"),
        r#"[{"title": "Local", "year": "2020", "link": "https://scholar.google.com/x"}]"#,
    )
    .expect("write feed");

    let base = Url::from_directory_path(dir.path()).expect("dir url");
    let f = FeedFetcher::new(base, FetchOptions::default()).expect("fetcher");
    let feeds = f.fetch_feeds(DataSource::Serpapi).await;

    assert_eq!(feeds.publications.len(), 1);
    assert_eq!(feeds.publications[0].year, Some(2020));
    assert!(feeds.metrics.is_none());
}
