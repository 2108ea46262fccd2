use pretty_assertions::assert_eq;
use reqwest::StatusCode;
use serde_json::json;
use specbom_proxy::{serve_on, ProxyState};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct TestRelay {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestRelay {
    async fn spawn(upstream_base: &str) -> Self {
        let state = ProxyState::new(upstream_base, "server-secret", None).unwrap();
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let handle = tokio::spawn(async move {
            serve_on(listener, state, std::future::pending()).await.unwrap();
        });
        Self { base_url, handle }
    }
}

impl Drop for TestRelay {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[tokio::test]
async fn relay_injects_bearer_and_forwards_query() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/objects"))
        .and(query_param("properties.kind", "bom"))
        .and(query_param("limit", "50"))
        .and(header("authorization", "Bearer server-secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": "b1"}])))
        .expect(1)
        .mount(&upstream)
        .await;

    let relay = TestRelay::spawn(&format!("{}/api/v1", upstream.uri())).await;
    let response = reqwest::Client::new()
        .get(format!(
            "{}/api/vertesia/objects?properties.kind=bom&limit=50",
            relay.base_url
        ))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body, json!([{"id": "b1"}]));
}

#[tokio::test]
async fn relay_forwards_post_body_and_upstream_status() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/execute-async"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({"file": "up-1", "interaction": "SpecToBOM@1"})))
        .respond_with(ResponseTemplate::new(422).set_body_string("bad interaction"))
        .mount(&upstream)
        .await;

    let relay = TestRelay::spawn(&format!("{}/api/v1", upstream.uri())).await;
    let response = reqwest::Client::new()
        .post(format!("{}/api/vertesia/execute-async", relay.base_url))
        .body(r#"{"file":"up-1","interaction":"SpecToBOM@1"}"#)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.text().await.unwrap(), "bad interaction");
}

#[tokio::test]
async fn client_credentials_are_replaced() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/objects"))
        .and(header("authorization", "Bearer server-secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&upstream)
        .await;

    let relay = TestRelay::spawn(&format!("{}/api/v1", upstream.uri())).await;
    let response = reqwest::Client::new()
        .get(format!("{}/api/vertesia/objects", relay.base_url))
        .bearer_auth("client-guess")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn object_route_extracts_prefixed_id() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/objects/abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "abc123"})))
        .expect(1)
        .mount(&upstream)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/v1/objects/abc123"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&upstream)
        .await;

    let relay = TestRelay::spawn(&format!("{}/api/v1", upstream.uri())).await;
    let client = reqwest::Client::new();
    let url = format!("{}/api/vertesia/object/object-abc123", relay.base_url);

    let fetched = client.get(&url).send().await.unwrap();
    assert_eq!(fetched.status(), StatusCode::OK);
    let deleted = client.delete(&url).send().await.unwrap();
    assert_eq!(deleted.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn object_route_without_prefix_is_bad_request() {
    let upstream = MockServer::start().await;
    let relay = TestRelay::spawn(&format!("{}/api/v1", upstream.uri())).await;

    let response = reqwest::get(format!("{}/api/vertesia/object/abc123", relay.base_url))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(upstream.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn unreachable_upstream_is_bad_gateway() {
    let relay = TestRelay::spawn("http://127.0.0.1:9/api/v1").await;
    let response = reqwest::get(format!("{}/api/vertesia/objects", relay.base_url))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}
