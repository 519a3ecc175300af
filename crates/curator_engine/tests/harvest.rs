use std::collections::HashMap;
use std::time::Duration;

use curator_engine::{
    harvest_api_posts, harvest_catalogue_links, CatalogueSource, FailureKind, FetchError,
    FetchSettings, HttpFetcher, PageRenderer, WordPressSource,
};
use pretty_assertions::assert_eq;
use url::Url;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Renderer serving canned pages keyed by URL; unknown URLs fail.
struct FakeRenderer {
    pages: HashMap<String, String>,
}

impl FakeRenderer {
    fn new(pages: Vec<(String, String)>) -> Self {
        Self {
            pages: pages.into_iter().collect(),
        }
    }
}

#[async_trait::async_trait]
impl PageRenderer for FakeRenderer {
    async fn load(&self, url: &str) -> Result<String, FetchError> {
        self.pages.get(url).cloned().ok_or(FetchError {
            kind: FailureKind::Network,
            message: "connection refused".to_string(),
        })
    }
}

fn listing(items: &[u32]) -> String {
    let links = items
        .iter()
        .map(|id| format!(r#"<a href="/photographs/{id}/">Item {id}</a>"#))
        .collect::<Vec<_>>()
        .join("\n");
    format!("<html><body>Search returned results<div>{links}</div></body></html>")
}

fn catalogue_source(marker: Option<&str>) -> CatalogueSource {
    CatalogueSource {
        search_url: "https://museum.example/search".to_string(),
        item_path_segment: "/photographs/".to_string(),
        results_marker: marker.map(String::from),
    }
}

fn base() -> Url {
    Url::parse("https://museum.example/").unwrap()
}

#[tokio::test]
async fn catalogue_crawl_stops_when_a_page_adds_nothing_new() {
    // Five unique items at two per page: the crawl needs one extra page to
    // observe that the listing has been exhausted.
    let renderer = FakeRenderer::new(vec![
        ("https://museum.example/search".to_string(), listing(&[1, 2])),
        ("https://museum.example/search?page=2".to_string(), listing(&[3, 4])),
        ("https://museum.example/search?page=3".to_string(), listing(&[4, 5])),
        ("https://museum.example/search?page=4".to_string(), listing(&[1, 2])),
    ]);

    let outcome = harvest_catalogue_links(&renderer, &base(), &catalogue_source(None)).await;

    assert_eq!(outcome.pages_fetched, 4);
    assert_eq!(outcome.refs.len(), 5);
    let ids: Vec<&str> = outcome.refs.iter().map(|r| r.origin_id.as_str()).collect();
    assert_eq!(ids, vec!["1", "2", "3", "4", "5"]);
}

#[tokio::test]
async fn overlapping_pages_dedupe_by_url() {
    let renderer = FakeRenderer::new(vec![
        ("https://museum.example/search".to_string(), listing(&[1, 2])),
        ("https://museum.example/search?page=2".to_string(), listing(&[2, 3])),
        ("https://museum.example/search?page=3".to_string(), listing(&[3])),
    ]);

    let outcome = harvest_catalogue_links(&renderer, &base(), &catalogue_source(None)).await;

    assert_eq!(outcome.refs.len(), 3);
}

#[tokio::test]
async fn missing_results_marker_ends_the_crawl() {
    let renderer = FakeRenderer::new(vec![
        ("https://museum.example/search".to_string(), listing(&[1, 2])),
        ("https://museum.example/search?page=2".to_string(), listing(&[3, 4])),
        (
            "https://museum.example/search?page=3".to_string(),
            "<html><body>Nothing here</body></html>".to_string(),
        ),
    ]);

    let outcome =
        harvest_catalogue_links(&renderer, &base(), &catalogue_source(Some("Search returned")))
            .await;

    assert_eq!(outcome.pages_fetched, 3);
    assert_eq!(outcome.refs.len(), 4);
}

#[tokio::test]
async fn page_failure_keeps_partial_results() {
    // Page 2 is absent from the fake, so it fails to load.
    let renderer = FakeRenderer::new(vec![(
        "https://museum.example/search".to_string(),
        listing(&[1, 2]),
    )]);

    let outcome = harvest_catalogue_links(&renderer, &base(), &catalogue_source(None)).await;

    assert_eq!(outcome.pages_fetched, 1);
    assert_eq!(outcome.refs.len(), 2);
}

#[tokio::test]
async fn initial_page_failure_yields_zero_pages() {
    let renderer = FakeRenderer::new(vec![]);
    let outcome = harvest_catalogue_links(&renderer, &base(), &catalogue_source(None)).await;
    assert_eq!(outcome.pages_fetched, 0);
    assert!(outcome.refs.is_empty());
}

fn post(id: u64) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "link": format!("https://blog.example/post-{id}/"),
        "title": {"rendered": format!("Post {id}")},
        "content": {"rendered": "<p>text</p>"},
    })
}

#[tokio::test]
async fn api_harvest_pages_until_the_listing_is_empty() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/wp-json/wp/v2/posts"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vec![post(1), post(2)]))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/wp-json/wp/v2/posts"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vec![post(3)]))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/wp-json/wp/v2/posts"))
        .and(query_param("page", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(Vec::<serde_json::Value>::new()))
        .mount(&server)
        .await;

    let fetcher = HttpFetcher::new(FetchSettings::default()).expect("client builds");
    let source = WordPressSource {
        api_url: format!("{}/wp-json/wp/v2/posts", server.uri()),
        per_page: 2,
    };

    let harvest = harvest_api_posts(&fetcher, &source, Duration::ZERO).await;

    assert_eq!(harvest.pages_fetched, 3);
    assert_eq!(harvest.posts.len(), 3);
    assert!(!harvest.aborted);
}

#[tokio::test]
async fn api_harvest_aborts_after_two_consecutive_failures() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/wp-json/wp/v2/posts"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let fetcher = HttpFetcher::new(FetchSettings::default()).expect("client builds");
    let source = WordPressSource {
        api_url: format!("{}/wp-json/wp/v2/posts", server.uri()),
        per_page: 2,
    };

    let harvest = harvest_api_posts(&fetcher, &source, Duration::ZERO).await;

    assert!(harvest.aborted);
    assert!(harvest.posts.is_empty());
    assert_eq!(harvest.pages_fetched, 2);
}

#[tokio::test]
async fn non_json_api_body_counts_as_a_page_failure() {
    // A 200 with an HTML body (maintenance page) is not the end of the
    // listing; it fails the page like a transport error would.
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/wp-json/wp/v2/posts"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw("<html>maintenance page</html>", "text/html"),
        )
        .mount(&server)
        .await;

    let fetcher = HttpFetcher::new(FetchSettings::default()).expect("client builds");
    let source = WordPressSource {
        api_url: format!("{}/wp-json/wp/v2/posts", server.uri()),
        per_page: 2,
    };

    let harvest = harvest_api_posts(&fetcher, &source, Duration::ZERO).await;

    assert!(harvest.aborted);
    assert!(harvest.posts.is_empty());
    assert_eq!(harvest.pages_fetched, 2);
}

#[tokio::test]
async fn api_harvest_recovers_from_a_single_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/wp-json/wp/v2/posts"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/wp-json/wp/v2/posts"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vec![post(1)]))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/wp-json/wp/v2/posts"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(Vec::<serde_json::Value>::new()))
        .mount(&server)
        .await;

    let fetcher = HttpFetcher::new(FetchSettings::default()).expect("client builds");
    let source = WordPressSource {
        api_url: format!("{}/wp-json/wp/v2/posts", server.uri()),
        per_page: 2,
    };

    let harvest = harvest_api_posts(&fetcher, &source, Duration::ZERO).await;

    assert!(!harvest.aborted);
    assert_eq!(harvest.posts.len(), 1);
}
