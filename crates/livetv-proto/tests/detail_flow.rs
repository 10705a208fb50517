use std::time::Duration;

use livetv_proto::catalog::{CatalogClient, RetryPolicy};
use livetv_proto::detail::{similar_channels, DetailResolver, Resolution, SeededSampler};
use livetv_proto::query::{QueryClient, QueryOptions};
use livetv_proto::route::Route;
use serde_json::json;
use wiremock::matchers::method;
use wiremock::{Match, Mock, MockServer, Request, ResponseTemplate};

struct RawQuery(Option<&'static str>);

impl Match for RawQuery {
    fn matches(&self, request: &Request) -> bool {
        request.url.query() == self.0
    }
}

fn channel_json(name: &str, category: &str) -> serde_json::Value {
    json!({
        "channel_name": name,
        "logo": "",
        "catagory": category,
        "url": format!("https://cdn.example/{}.m3u8", name.replace(' ', "-")),
    })
}

async fn catalog() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(RawQuery(None))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(["news", "sports"])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(RawQuery(Some("news")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            channel_json("N1", "news"),
            channel_json("N2", "news"),
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(RawQuery(Some("sports")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            channel_json("Star Sports 1", "sports"),
            channel_json("S2", "sports"),
            channel_json("S3", "sports"),
        ])))
        .mount(&server)
        .await;
    server
}

fn queries(server: &MockServer) -> QueryClient<CatalogClient> {
    QueryClient::new(
        CatalogClient::new(&server.uri(), Duration::from_secs(5)).unwrap(),
        QueryOptions {
            stale_after: Duration::from_secs(300),
            retry: RetryPolicy::immediate(0),
        },
    )
}

#[tokio::test]
async fn direct_link_resolves_from_working_set() {
    let server = catalog().await;
    let queries = queries(&server);

    let Route::Watch { id, state } = Route::parse("/watch/live/Star%20Sports%201").unwrap() else {
        panic!("expected a watch route");
    };
    let mut resolver = DetailResolver::from_navigation(id, state);
    assert_eq!(resolver.resolution(), &Resolution::Loading);

    resolver.apply_working_set(queries.all_channels().await);
    let channel = resolver.channel().cloned().unwrap();
    assert_eq!(channel.category, "sports");

    let similar = similar_channels(
        &channel,
        resolver.working_set().unwrap(),
        &mut SeededSampler::new(7),
    );
    let mut names: Vec<_> = similar.iter().map(|c| c.channel_name.as_str()).collect();
    names.sort_unstable();
    assert_eq!(names, vec!["S2", "S3"]);
}

#[tokio::test]
async fn unknown_direct_link_settles_not_found() {
    let server = catalog().await;
    let queries = queries(&server);

    let mut resolver = DetailResolver::from_navigation("Gone", None);
    resolver.apply_working_set(queries.all_channels().await);
    assert_eq!(resolver.resolution(), &Resolution::NotFound);
}

#[tokio::test]
async fn unreachable_catalog_settles_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    let queries = queries(&server);

    let mut resolver = DetailResolver::from_navigation("N1", None);
    let result = queries.all_channels().await;
    assert!(result.is_err());
    resolver.apply_working_set(result);
    assert_eq!(resolver.resolution(), &Resolution::NotFound);
}

#[tokio::test]
async fn working_set_reuses_cached_categories() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(RawQuery(None))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(["news"])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(RawQuery(Some("news")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([channel_json("N1", "news")])))
        .expect(1)
        .mount(&server)
        .await;
    let queries = queries(&server);

    // The listing already loaded "news"; opening a link must not refetch it.
    queries.channels("news").await.unwrap();
    let all = queries.all_channels().await.unwrap();
    assert_eq!(all.len(), 1);
}

#[tokio::test]
async fn one_failing_category_does_not_sink_the_working_set() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(RawQuery(None))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(["news", "broken"])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(RawQuery(Some("news")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([channel_json("N1", "news")])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(RawQuery(Some("broken")))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    let queries = queries(&server);

    let mut resolver = DetailResolver::from_navigation("N1", None);
    resolver.apply_working_set(queries.all_channels().await);
    assert!(resolver.channel().is_some());
}
