use serde_json::json;
use specbom_engine::{launch, ClientSettings, HttpObjectStore, LaunchSettings};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn store_for(server: &MockServer) -> HttpObjectStore {
    HttpObjectStore::new(ClientSettings {
        base_url: format!("{}/api/v1", server.uri()),
        api_key: Some("k".into()),
        ..ClientSettings::default()
    })
    .unwrap()
}

#[tokio::test]
async fn launch_returns_platform_job_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/execute-async"))
        .and(body_json(json!({
            "file": "up-1",
            "interaction": "SpecToBOM@1",
            "config": {"environment": "env-1", "model": "model-x"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "run-42"})))
        .expect(1)
        .mount(&server)
        .await;

    let settings = LaunchSettings {
        environment: Some("env-1".into()),
        model: Some("model-x".into()),
        ..LaunchSettings::default()
    };
    let job_id = launch(&store_for(&server), "up-1", &settings).await.unwrap();
    assert_eq!(job_id.as_deref(), Some("run-42"));
}

#[tokio::test]
async fn launch_without_id_yields_none() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/execute-async"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "accepted"})))
        .mount(&server)
        .await;

    let job_id = launch(&store_for(&server), "up-1", &LaunchSettings::default())
        .await
        .unwrap();
    assert_eq!(job_id, None);
}

#[tokio::test]
async fn launch_with_empty_body_yields_none() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/execute-async"))
        .respond_with(ResponseTemplate::new(202))
        .mount(&server)
        .await;

    let job_id = launch(&store_for(&server), "up-1", &LaunchSettings::default())
        .await
        .unwrap();
    assert_eq!(job_id, None);
}

#[tokio::test]
async fn launch_rejection_is_upstream_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/execute-async"))
        .respond_with(ResponseTemplate::new(400).set_body_string("unknown interaction"))
        .expect(1)
        .mount(&server)
        .await;

    let settings = LaunchSettings {
        interaction: "Missing@1".into(),
        ..LaunchSettings::default()
    };
    let err = launch(&store_for(&server), "up-1", &settings)
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(400));
    assert!(err.to_string().contains("unknown interaction"));
}
