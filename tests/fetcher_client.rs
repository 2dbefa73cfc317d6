mod common;

use std::time::Duration;

use firma_scraper::fetcher::{FetchError, HeaderProfile, HtmlFetcher};
use firma_scraper::Config;
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

const TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::test]
async fn test_fetch_success() {
    let mock_server = MockServer::start().await;
    common::mount_page(&mock_server, "/test", "<html><body>Merhaba Dünya</body></html>").await;

    let fetcher = HtmlFetcher::new(&Config::default()).unwrap();
    let body = fetcher
        .fetch(&format!("{}/test", mock_server.uri()), TIMEOUT)
        .await
        .unwrap();

    assert!(body.contains("Merhaba Dünya"));
}

#[tokio::test]
async fn test_fetch_404() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/notfound"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let fetcher = HtmlFetcher::new(&Config::default()).unwrap();
    let result = fetcher
        .fetch(&format!("{}/notfound", mock_server.uri()), TIMEOUT)
        .await;

    match result {
        Err(err @ FetchError::Http { .. }) => assert_eq!(err.status_code(), Some(404)),
        other => panic!("Expected HTTP 404 error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_non_200_success_is_rejected() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/accepted"))
        .respond_with(ResponseTemplate::new(202).set_body_string("<html></html>"))
        .mount(&mock_server)
        .await;

    let fetcher = HtmlFetcher::new(&Config::default()).unwrap();
    let result = fetcher
        .fetch(&format!("{}/accepted", mock_server.uri()), TIMEOUT)
        .await;

    assert_eq!(result.unwrap_err().status_code(), Some(202));
}

#[tokio::test]
async fn test_fetch_follows_redirect() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(ResponseTemplate::new(301).insert_header("location", "/new"))
        .mount(&mock_server)
        .await;
    common::mount_page(&mock_server, "/new", "<html><body>Yeni sayfa</body></html>").await;

    let fetcher = HtmlFetcher::new(&Config::default()).unwrap();
    let body = fetcher
        .fetch(&format!("{}/old", mock_server.uri()), TIMEOUT)
        .await
        .unwrap();

    assert!(body.contains("Yeni sayfa"));
}

/// Headers of the only request `server` has seen.
async fn single_request_headers(server: &MockServer) -> Vec<(String, String)> {
    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    requests[0]
        .headers
        .iter()
        .map(|(name, value)| (name.to_string(), value.to_str().unwrap().to_string()))
        .collect()
}

fn header_value<'h>(headers: &'h [(String, String)], name: &str) -> Option<&'h str> {
    headers
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

#[tokio::test]
async fn test_search_profile_headers() {
    let mock_server = MockServer::start().await;
    common::mount_page(&mock_server, "/search", "<html>ok</html>").await;

    let fetcher = HtmlFetcher::new(&Config::default()).unwrap();
    let body = fetcher
        .fetch_with(
            &format!("{}/search", mock_server.uri()),
            TIMEOUT,
            HeaderProfile::Search,
        )
        .await
        .unwrap();
    assert_eq!(body, "<html>ok</html>");

    let headers = single_request_headers(&mock_server).await;
    assert_eq!(header_value(&headers, "referer"), Some("https://www.bing.com/"));
    assert_eq!(
        header_value(&headers, "accept-language"),
        Some("tr-TR,tr;q=0.9,en-US;q=0.8,en;q=0.7")
    );
    assert!(header_value(&headers, "user-agent").is_some());
    assert_eq!(header_value(&headers, "cache-control"), None);
}

#[tokio::test]
async fn test_browser_profile_headers() {
    let mock_server = MockServer::start().await;
    common::mount_page(&mock_server, "/", "<html>ok</html>").await;

    let fetcher = HtmlFetcher::new(&Config::default()).unwrap();
    fetcher.fetch(&mock_server.uri(), TIMEOUT).await.unwrap();

    let headers = single_request_headers(&mock_server).await;
    assert_eq!(header_value(&headers, "accept-language"), Some("en-US,en;q=0.5"));
    assert_eq!(header_value(&headers, "cache-control"), Some("max-age=0"));
    assert_eq!(header_value(&headers, "upgrade-insecure-requests"), Some("1"));
    assert_eq!(header_value(&headers, "referer"), None);
}

#[tokio::test]
async fn test_user_agent_comes_from_configured_pool() {
    let mock_server = MockServer::start().await;
    common::mount_page(&mock_server, "/", "<html>ok</html>").await;

    let mut config = Config::default();
    config.user_agents = vec!["FirmaBot/1.0 (+https://example.com/bot)".to_string()];
    let fetcher = HtmlFetcher::new(&config).unwrap();
    fetcher.fetch(&mock_server.uri(), TIMEOUT).await.unwrap();

    let headers = single_request_headers(&mock_server).await;
    assert_eq!(
        header_value(&headers, "user-agent"),
        Some("FirmaBot/1.0 (+https://example.com/bot)")
    );
}

#[tokio::test]
async fn test_connection_refused_is_network_error() {
    let fetcher = HtmlFetcher::new(&Config::default()).unwrap();
    let result = fetcher.fetch("http://127.0.0.1:1/", TIMEOUT).await;

    assert!(matches!(result, Err(FetchError::Network(_))));
}

#[tokio::test]
async fn test_invalid_url() {
    let fetcher = HtmlFetcher::new(&Config::default()).unwrap();
    let result = fetcher.fetch("not a url", TIMEOUT).await;

    assert!(matches!(result, Err(FetchError::InvalidUrl(_))));
}
