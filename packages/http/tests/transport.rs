//! Store transport and resource fetcher against a mock server.
//!
//! The transport wraps a blocking client, so every use of it runs inside
//! `spawn_blocking`.

use std::sync::Arc;

use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use hearth_core::{ClassRegistry, Value};
use hearth_http::{HttpFetcher, ReqwestTransport};
use hearth_store::{
    DataType, Method, Store, StoreConfig, StoreError, StoreStatus, StoreUrl, Transport,
    TransportRequest,
};
use hearth_view::{Fetcher, ResourceKind};

#[tokio::test]
async fn get_parses_json_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/1"))
        .and(header("accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 1, "name": "Alice"})))
        .mount(&server)
        .await;

    let uri = server.uri();
    let response = tokio::task::spawn_blocking(move || {
        let transport = ReqwestTransport::with_default_timeout()
            .unwrap()
            .with_base_url(&uri)
            .unwrap();
        transport.request(&TransportRequest::get("/users/1"))
    })
    .await
    .unwrap()
    .unwrap();

    assert!(response.is_success());
    assert_eq!(response.body, json!({"id": 1, "name": "Alice"}));
}

#[tokio::test]
async fn text_body_is_kept_raw() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/motd"))
        .respond_with(ResponseTemplate::new(200).set_body_string("hello there"))
        .mount(&server)
        .await;

    let url = format!("{}/motd", server.uri());
    let response = tokio::task::spawn_blocking(move || {
        ReqwestTransport::with_default_timeout()
            .unwrap()
            .request(&TransportRequest::get(url).with_data_type(DataType::Text))
    })
    .await
    .unwrap()
    .unwrap();

    assert_eq!(response.body, serde_json::Value::Null);
    assert_eq!(response.payload(DataType::Text), Value::from("hello there"));
}

#[tokio::test]
async fn custom_headers_are_sent() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/items/9"))
        .and(header("authorization", "Bearer token"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let uri = server.uri();
    let response = tokio::task::spawn_blocking(move || {
        ReqwestTransport::with_default_timeout()
            .unwrap()
            .with_base_url(&uri)
            .unwrap()
            .with_header("Authorization", "Bearer token")
            .unwrap()
            .request(&TransportRequest::new(Method::DELETE, "/items/9"))
    })
    .await
    .unwrap()
    .unwrap();

    assert_eq!(response.status, 204);
}

#[tokio::test]
async fn unreachable_host_reports_error() {
    let result = tokio::task::spawn_blocking(|| {
        ReqwestTransport::with_default_timeout()
            .unwrap()
            .request(&TransportRequest::get("http://127.0.0.1:1/nothing"))
    })
    .await
    .unwrap();

    assert!(result.is_err());
}

#[tokio::test]
async fn store_loads_and_submits_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/profile"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "Alice"})))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/profile"))
        .and(body_json(json!({"data": r#"{"name":"Bob"}"#})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"saved": true})))
        .expect(1)
        .mount(&server)
        .await;

    let base = format!("{}/api/", server.uri());
    let (loaded, submitted, status) = tokio::task::spawn_blocking(move || {
        let transport = ReqwestTransport::with_default_timeout()
            .unwrap()
            .with_base_url(&base)
            .unwrap();
        let registry = ClassRegistry::new();
        registry.replace(hearth_store::store_base_definition());

        let config = StoreConfig {
            url: StoreUrl::get("profile").with_submit("profile"),
            protocol: Method::PUT,
            ..Default::default()
        };
        let store = Store::new(&registry, config, Some(Arc::new(transport))).unwrap();

        let loaded = store.load_sync().unwrap();
        store.set_data(Value::from(json!({"name": "Bob"}))).unwrap();
        let submitted = store.submit_sync().unwrap();
        (loaded, submitted, store.status())
    })
    .await
    .unwrap();

    assert_eq!(loaded.get("name"), Some(&Value::from("Alice")));
    assert_eq!(submitted.get("saved"), Some(&Value::Bool(true)));
    assert_eq!(status, StoreStatus::Done(200));
}

#[tokio::test]
async fn store_load_surfaces_server_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let url = format!("{}/broken", server.uri());
    let result = tokio::task::spawn_blocking(move || {
        let transport = ReqwestTransport::with_default_timeout().unwrap();
        let registry = ClassRegistry::new();
        registry.replace(hearth_store::store_base_definition());
        let config = StoreConfig {
            url: StoreUrl::get(url),
            ..Default::default()
        };
        let store = Store::new(&registry, config, Some(Arc::new(transport))).unwrap();
        store.load_sync()
    })
    .await
    .unwrap();

    assert!(matches!(
        result,
        Err(StoreError::UnexpectedStatus { status: 500, .. })
    ));
}

#[tokio::test]
async fn fetcher_joins_paths_onto_base() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/app/view/Index.html"))
        .and(query_param("hb", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<h1>Index</h1>"))
        .mount(&server)
        .await;

    let fetcher = HttpFetcher::with_default_timeout(&server.uri()).unwrap();
    let content = fetcher
        .fetch("/app/view/Index.html?hb=3", ResourceKind::Markup)
        .await
        .unwrap();
    assert_eq!(content, "<h1>Index</h1>");
}

#[tokio::test]
async fn fetcher_reports_missing_resources() {
    let server = MockServer::start().await;
    let fetcher = HttpFetcher::with_default_timeout(&server.uri()).unwrap();

    let err = fetcher
        .fetch("/app/view/Nope.html", ResourceKind::Markup)
        .await
        .unwrap_err();
    assert!(err.contains("404"), "unexpected error: {}", err);
}
