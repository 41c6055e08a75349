//! Routing-strategy behavior with scripted store and network doubles.

mod common;

use std::sync::Arc;
use std::time::Duration;

use url::Url;

use common::{basic_ok, snapshot, test_config, FakeNetwork};
use portico_cache::{BucketStore, MemoryStore, ResponseType};
use portico_sw::{FetchRequest, FetchRouter, RouteClass, SwConfig, SwError};

struct Harness {
    config: Arc<SwConfig>,
    store: Arc<MemoryStore>,
    network: Arc<FakeNetwork>,
    router: FetchRouter,
}

fn harness(config: SwConfig) -> Harness {
    let config = Arc::new(config);
    let store = Arc::new(MemoryStore::new());
    let network = Arc::new(FakeNetwork::new());
    let router = FetchRouter::new(
        Arc::clone(&config),
        Arc::clone(&store) as Arc<dyn BucketStore>,
        Arc::clone(&network) as _,
    );
    Harness {
        config,
        store,
        network,
        router,
    }
}

fn get(url: &str) -> FetchRequest {
    FetchRequest::get(Url::parse(url).unwrap())
}

#[tokio::test]
async fn cache_first_hit_makes_no_network_call() {
    let h = harness(test_config("v1"));
    let url = "https://portfolio.test/style.css";
    h.store
        .put_in_bucket(&h.config.cache_name, basic_ok(url, "body{}"))
        .await
        .unwrap();

    let outcome = h.router.route(&get(url)).await.unwrap();

    assert_eq!(outcome.response().unwrap().body_text(), Some("body{}"));
    assert_eq!(h.network.calls(), 0);
}

#[tokio::test]
async fn cache_first_miss_fetches_without_backfill() {
    let h = harness(test_config("v1"));
    let url = "https://portfolio.test/late-addition.css";
    h.network.respond_ok(url, "late{}");

    let outcome = h.router.route(&get(url)).await.unwrap();

    assert_eq!(outcome.response().unwrap().body_text(), Some("late{}"));
    assert_eq!(h.network.calls(), 1);
    // Deliberately not backfilled: install seeding owns cache-first assets.
    assert!(!h.store.contains_url(&h.config.cache_name, url).await);

    // Every subsequent request keeps hitting the network.
    h.router.route(&get(url)).await.unwrap();
    assert_eq!(h.network.calls(), 2);
}

#[tokio::test]
async fn network_first_returns_live_response_and_warms_cache() {
    let h = harness(test_config("v1"));
    let url = "https://portfolio.test/api/messages";
    h.network.respond_ok(url, "[1,2,3]");

    let outcome = h.router.route(&get(url)).await.unwrap();
    assert_eq!(outcome.response().unwrap().body_text(), Some("[1,2,3]"));
    assert_eq!(h.network.calls(), 1);

    // The cache fill is fire-and-forget; give the spawned task a beat.
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(h.store.contains_url(&h.config.cache_name, url).await);
}

#[tokio::test]
async fn network_first_falls_back_to_cached_snapshot() {
    let h = harness(test_config("v1"));
    let url = "https://portfolio.test/api/messages";
    h.store
        .put_in_bucket(&h.config.cache_name, basic_ok(url, "stale-but-served"))
        .await
        .unwrap();
    h.network.set_offline(true);

    let outcome = h.router.route(&get(url)).await.unwrap();

    assert_eq!(
        outcome.response().unwrap().body_text(),
        Some("stale-but-served")
    );
}

#[tokio::test]
async fn network_first_without_snapshot_surfaces_failure() {
    let h = harness(test_config("v1"));
    h.network.set_offline(true);

    let err = h
        .router
        .route(&get("https://portfolio.test/api/messages"))
        .await
        .unwrap_err();

    assert!(matches!(err, SwError::Network(_)));
}

#[tokio::test]
async fn default_route_backfills_exactly_once() {
    let h = harness(test_config("v1"));
    let url = "https://portfolio.test/blog";
    h.network.respond_ok(url, "<html>blog</html>");

    // Miss: one network call, one new entry.
    h.router.route(&get(url)).await.unwrap();
    assert_eq!(h.network.calls(), 1);
    assert!(h.store.contains_url(&h.config.cache_name, url).await);
    assert_eq!(h.store.bucket_len(&h.config.cache_name).await, Some(1));

    // Hit: zero further network calls.
    let outcome = h.router.route(&get(url)).await.unwrap();
    assert_eq!(h.network.calls(), 1);
    assert_eq!(
        outcome.response().unwrap().body_text(),
        Some("<html>blog</html>")
    );
}

#[tokio::test]
async fn default_route_caches_redirected_response_under_request_url() {
    let h = harness(test_config("v1"));
    let url = "https://portfolio.test/blog";
    // The server redirects to the trailing-slash form; the snapshot carries
    // the final URL, but the cache entry must answer the URL the page asked
    // for.
    h.network
        .respond_at(url, basic_ok("https://portfolio.test/blog/", "<html>blog</html>"));

    h.router.route(&get(url)).await.unwrap();
    assert_eq!(h.network.calls(), 1);
    assert!(h.store.contains_url(&h.config.cache_name, url).await);

    let outcome = h.router.route(&get(url)).await.unwrap();
    assert_eq!(h.network.calls(), 1);
    assert_eq!(
        outcome.response().unwrap().body_text(),
        Some("<html>blog</html>")
    );
}

#[tokio::test]
async fn network_first_warms_cache_under_request_url_after_redirect() {
    let h = harness(test_config("v1"));
    let url = "https://portfolio.test/api/messages";
    h.network
        .respond_at(url, basic_ok("https://portfolio.test/api/messages/", "[1]"));

    h.router.route(&get(url)).await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(h.store.contains_url(&h.config.cache_name, url).await);

    // Offline now: the warmed entry answers the original request URL.
    h.network.set_offline(true);
    let outcome = h.router.route(&get(url)).await.unwrap();
    assert_eq!(outcome.response().unwrap().body_text(), Some("[1]"));
}

#[tokio::test]
async fn default_route_never_stores_non_basic_responses() {
    let h = harness(test_config("v1"));
    let url = "https://cdn.example.net/widget";
    h.network
        .respond(snapshot(url, 200, ResponseType::Cors, "cross-origin"));

    let outcome = h.router.route(&get(url)).await.unwrap();

    assert_eq!(outcome.response().unwrap().body_text(), Some("cross-origin"));
    assert!(!h.store.contains_url(&h.config.cache_name, url).await);
}

#[tokio::test]
async fn default_route_never_stores_non_200_responses() {
    let h = harness(test_config("v1"));
    let url = "https://portfolio.test/gone";
    h.network
        .respond(snapshot(url, 404, ResponseType::Basic, "not found"));

    let outcome = h.router.route(&get(url)).await.unwrap();

    assert_eq!(outcome.response().unwrap().status, 404);
    assert!(!h.store.contains_url(&h.config.cache_name, url).await);
}

#[tokio::test]
async fn failed_navigation_gets_offline_fallback() {
    let h = harness(test_config("v1"));
    let fallback_url = h.config.offline_fallback_url().unwrap();
    h.store
        .put_in_bucket(
            &h.config.cache_name,
            basic_ok(fallback_url.as_str(), "<html>offline</html>"),
        )
        .await
        .unwrap();
    h.network.set_offline(true);

    let request = FetchRequest::navigate(Url::parse("https://portfolio.test/projects").unwrap());
    let outcome = h.router.route(&request).await.unwrap();

    assert_eq!(
        outcome.response().unwrap().body_text(),
        Some("<html>offline</html>")
    );
}

#[tokio::test]
async fn failed_subresource_propagates_the_error() {
    let h = harness(test_config("v1"));
    h.network.set_offline(true);

    let err = h
        .router
        .route(&get("https://portfolio.test/projects"))
        .await
        .unwrap_err();

    assert!(matches!(err, SwError::Network(_)));
}

#[tokio::test]
async fn post_requests_pass_through_untouched() {
    let h = harness(test_config("v1"));
    let request = FetchRequest::with_method(
        Url::parse("https://portfolio.test/api/contact").unwrap(),
        http::Method::POST,
    );

    let outcome = h.router.route(&request).await.unwrap();

    assert!(outcome.is_passthrough());
    assert_eq!(h.network.calls(), 0);
    assert_eq!(h.store.bucket_len(&h.config.cache_name).await, None);
}

#[tokio::test]
async fn excluded_requests_never_touch_store_or_network() {
    let h = harness(test_config("v1"));
    for url in [
        "chrome-extension://abc/inject.js",
        "https://www.google-analytics.com/collect",
        "https://portfolio.test/vendor/gtag.js",
    ] {
        let outcome = h.router.route(&get(url)).await.unwrap();
        assert!(outcome.is_passthrough(), "{url}");
    }
    assert_eq!(h.network.calls(), 0);
}

#[test]
fn classification_matrix_is_mutually_exclusive() {
    let config = test_config("v1");
    let matrix = [
        ("https://portfolio.test/api/messages", RouteClass::NetworkFirst),
        (
            "https://script.google.com/macros/s/form",
            RouteClass::NetworkFirst,
        ),
        ("https://portfolio.test/work-1.png", RouteClass::CacheFirst),
        (
            "https://unpkg.com/typed.js@2.1.0/dist/typed.umd.js",
            RouteClass::CacheFirst,
        ),
        ("https://portfolio.test/blog", RouteClass::Default),
        ("https://portfolio.test/", RouteClass::Default),
        (
            "https://www.google-analytics.com/collect",
            RouteClass::Excluded,
        ),
        ("chrome-extension://abc/inject.js", RouteClass::Excluded),
    ];

    for (url, expected) in matrix {
        assert_eq!(
            RouteClass::classify(&config, &get(url)),
            expected,
            "{url} must resolve via exactly one branch"
        );
    }
}
