use std::time::Duration;

use livetv_proto::catalog::{CatalogClient, CatalogError, CatalogSource, RetryPolicy};
use livetv_proto::query::{QueryClient, QueryOptions, QueryState};
use livetv_proto::tabs::TabController;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Match, Mock, MockServer, Request, ResponseTemplate};

/// Matches the raw query string, which the catalog uses as a bare value.
struct RawQuery(Option<&'static str>);

impl Match for RawQuery {
    fn matches(&self, request: &Request) -> bool {
        request.url.query() == self.0
    }
}

fn channel_json(name: &str, category: &str) -> serde_json::Value {
    json!({
        "channel_name": name,
        "logo": format!("https://img.example/{}.png", name),
        "catagory": category,
        "url": format!("https://cdn.example/{}/index.m3u8", name),
    })
}

fn query_client(server: &MockServer) -> QueryClient<CatalogClient> {
    let client = CatalogClient::new(&server.uri(), Duration::from_secs(5)).unwrap();
    QueryClient::new(
        client,
        QueryOptions {
            stale_after: Duration::from_secs(300),
            retry: RetryPolicy::immediate(2),
        },
    )
}

#[tokio::test]
async fn categories_then_sports_yields_one_card() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .and(RawQuery(None))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(["news", "sports"])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/"))
        .and(RawQuery(Some("sports")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([channel_json("Ch1", "sports")])))
        .expect(1)
        .mount(&server)
        .await;

    let queries = query_client(&server);
    let mut tabs = TabController::new("dangal");
    let mut channels: QueryState<String, std::sync::Arc<Vec<livetv_proto::Channel>>> =
        QueryState::new();

    let categories = queries.categories().await.unwrap();
    assert_eq!(*categories, vec!["news".to_string(), "sports".to_string()]);
    tabs.set_categories(categories.to_vec());

    assert!(tabs.select("sports"));
    assert!(channels.select(Some(tabs.active().to_string())));
    let result = queries.channels(tabs.active()).await;
    assert!(channels.accept(&"sports".to_string(), result));

    let list = channels.data().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0].channel_name, "Ch1");
    assert_eq!(list[0].category, "sports");
}

#[tokio::test]
async fn repeated_selection_within_window_hits_network_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(RawQuery(Some("news")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([channel_json("N1", "news")])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(RawQuery(Some("sports")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let queries = query_client(&server);
    for category in ["news", "sports", "news", "news", "sports"] {
        queries.channels(category).await.unwrap();
    }
    assert!(queries.cached_channels("news").await.is_some());
}

#[tokio::test]
async fn concurrent_requests_for_one_key_share_a_call() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(RawQuery(Some("news")))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([channel_json("N1", "news")]))
                .set_delay(Duration::from_millis(100)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let queries = query_client(&server);
    let (a, b) = tokio::join!(queries.channels("news"), queries.channels("news"));
    assert_eq!(a.unwrap().len(), 1);
    assert_eq!(b.unwrap().len(), 1);
}

#[tokio::test]
async fn category_is_percent_encoded() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(RawQuery(Some("kids%20%26%20family")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([channel_json("K1", "kids & family")])))
        .expect(1)
        .mount(&server)
        .await;

    let queries = query_client(&server);
    let list = queries.channels("kids & family").await.unwrap();
    assert_eq!(list[0].category, "kids & family");
}

#[tokio::test]
async fn transient_errors_are_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(RawQuery(Some("news")))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(RawQuery(Some("news")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([channel_json("N1", "news")])))
        .expect(1)
        .mount(&server)
        .await;

    let queries = query_client(&server);
    let list = queries.channels("news").await.unwrap();
    assert_eq!(list.len(), 1);
}

#[tokio::test]
async fn exhausted_retries_surface_stable_message_and_are_not_cached() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(RawQuery(Some("news")))
        .respond_with(ResponseTemplate::new(500))
        .expect(6)
        .mount(&server)
        .await;

    let queries = query_client(&server);
    let mut state: QueryState<String, _> = QueryState::new();
    state.select(Some("news".to_string()));

    let result = queries.channels("news").await;
    assert!(state.accept(&"news".to_string(), result));
    assert!(state.is_error());
    assert!(state.data().is_none());
    assert_eq!(state.error_message(), Some("Failed to load streams (HTTP 500)."));

    // Not cached: the next request goes out again (3 more attempts).
    assert!(queries.channels("news").await.is_err());
    assert!(queries.cached_channels("news").await.is_none());
}

#[tokio::test]
async fn malformed_body_fails_without_retry() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(RawQuery(None))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .expect(1)
        .mount(&server)
        .await;

    let client = CatalogClient::new(&server.uri(), Duration::from_secs(5)).unwrap();
    let err = client.categories().await.unwrap_err();
    assert!(matches!(err, CatalogError::Decode(_)));
    assert!(!err.is_transient());
}

#[tokio::test]
async fn refresh_after_invalidate_refetches() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(RawQuery(Some("news")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([channel_json("N1", "news")])))
        .expect(2)
        .mount(&server)
        .await;

    let queries = query_client(&server);
    queries.channels("news").await.unwrap();
    queries.invalidate_channels("news").await;
    queries.channels("news").await.unwrap();
}
