use scholar_web::{ContentFetcher, FetchError, PaperSearch, SearchError, SerpApiScholar, WebFetcher};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fetcher(timeout_ms: u64) -> WebFetcher {
    WebFetcher::new(Duration::from_millis(timeout_ms), "Mozilla/5.0").unwrap()
}

#[tokio::test]
async fn scholar_search_sends_engine_query_and_key() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search.json"))
        .and(query_param("engine", "google_scholar"))
        .and(query_param("q", "Integration in Calculus"))
        .and(query_param("api_key", "serp-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "organic_results": [
                {"title": "On integrals", "link": "https://papers.example/1", "snippet": "We study..."},
                {"title": "On sums", "link": "https://papers.example/2", "snippet": "Sums..."}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let search = SerpApiScholar::new(&server.uri(), "serp-key".into(), "google_scholar".into()).unwrap();
    let papers = search.search("Integration in Calculus").await.unwrap();

    let titles: Vec<_> = papers.iter().map(|p| p.title.as_str()).collect();
    assert_eq!(titles, ["On integrals", "On sums"]);
    assert_eq!(papers[0].link, "https://papers.example/1");
}

#[tokio::test]
async fn scholar_search_rejected_key_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"error": "Invalid API key."})))
        .mount(&server)
        .await;

    let search = SerpApiScholar::new(&server.uri(), "bad".into(), "google_scholar".into()).unwrap();
    let err = search.search("anything").await.unwrap_err();
    assert!(matches!(err, SearchError::Http(_)));
}

#[tokio::test]
async fn scholar_search_does_not_wait_out_long_rate_limits() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(429)
                .insert_header("retry-after", "86400")
                .set_body_json(json!({"error": "Your account has run out of searches."})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let search = SerpApiScholar::new(&server.uri(), "serp-key".into(), "google_scholar".into()).unwrap();
    let result = tokio::time::timeout(Duration::from_secs(5), search.search("x"))
        .await
        .expect("search gives up instead of sleeping");
    assert!(matches!(result, Err(SearchError::Http(_))));
}

#[tokio::test]
async fn fetch_extracts_paragraphs_with_user_agent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/paper/1"))
        .and(header("user-agent", "Mozilla/5.0"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(
                "<html><body><nav>menu</nav><p>Integrals measure area.</p><p>They undo derivatives.</p></body></html>",
                "text/html; charset=utf-8",
            ),
        )
        .mount(&server)
        .await;

    let text = fetcher(2_000)
        .fetch(&format!("{}/paper/1", server.uri()))
        .await
        .unwrap();
    assert_eq!(text, "Integrals measure area. They undo derivatives.");
}

#[tokio::test]
async fn fetch_rejects_pdf_content() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(b"%PDF-1.7".to_vec(), "application/pdf"),
        )
        .mount(&server)
        .await;

    let err = fetcher(2_000).fetch(&format!("{}/paper.pdf", server.uri())).await.unwrap_err();
    assert!(matches!(err, FetchError::NotHtml(ref kind) if kind == "application/pdf"));
}

#[tokio::test]
async fn fetch_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw("<p>late</p>", "text/html")
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let err = fetcher(50).fetch(&server.uri()).await.unwrap_err();
    assert!(matches!(err, FetchError::Http(scholar_http::HttpError::Timeout(_))), "got {err:?}");
}

#[tokio::test]
async fn fetch_rejects_non_http_links() {
    let err = fetcher(100).fetch("ftp://papers.example/x").await.unwrap_err();
    assert!(matches!(err, FetchError::InvalidUrl(_)));
    let err = fetcher(100).fetch("not a url").await.unwrap_err();
    assert!(matches!(err, FetchError::InvalidUrl(_)));
}
