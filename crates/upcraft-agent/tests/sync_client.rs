//! SyncClient against a mock sync service.

use serde_json::json;
use upcraft_agent::{SyncClient, SyncConfig};
use upcraft_core::{ActionResult, UpcraftError};
use upcraft_skills::{ActionRegistry, ActionSpec, RemoteSkill};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(base_url: &str) -> SyncClient {
    SyncClient::new(&SyncConfig {
        enabled: true,
        base_url: base_url.to_string(),
        timeout_secs: 2,
    })
    .unwrap()
}

fn ok_spec(skill: &str, action: &str) -> ActionSpec {
    ActionSpec::new(skill, action)
        .handler_fn(|_input, _cancel| async move { Ok(ActionResult::success("ok")) })
}

#[tokio::test]
async fn test_fetch_skills() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/sync-skills"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"name": "music", "description": "Playback", "json_schema": "[]"},
            {"name": "screen"}
        ])))
        .mount(&server)
        .await;

    let skills = client_for(&server.uri()).fetch_skills().await.unwrap();
    assert_eq!(skills.len(), 2);
    assert_eq!(skills[0].name, "music");
    assert_eq!(skills[0].description, "Playback");
    assert_eq!(skills[1].description, "");
}

#[tokio::test]
async fn test_fetch_non_200_is_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/sync-skills"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = client_for(&server.uri()).fetch_skills().await.unwrap_err();
    assert!(matches!(err, UpcraftError::Sync(ref msg) if msg.contains("503")));
}

#[tokio::test]
async fn test_fetch_bad_body_is_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/sync-skills"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let err = client_for(&server.uri()).fetch_skills().await.unwrap_err();
    assert!(matches!(err, UpcraftError::Sync(ref msg) if msg.contains("decode")));
}

#[tokio::test]
async fn test_unreachable_service_is_error() {
    let err = client_for("http://127.0.0.1:1").fetch_skills().await.unwrap_err();
    assert!(matches!(err, UpcraftError::Sync(_)));
}

#[tokio::test]
async fn test_ingest_posts_record() {
    let server = MockServer::start().await;
    let skill = RemoteSkill {
        name: "music".into(),
        description: "Playback".into(),
        json_schema: "[]".into(),
    };
    Mock::given(method("POST"))
        .and(path("/admin/ingest"))
        .and(body_json(json!({"name": "music", "description": "Playback", "json_schema": "[]"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})))
        .expect(1)
        .mount(&server)
        .await;

    client_for(&server.uri()).ingest_skill(&skill).await.unwrap();
}

#[tokio::test]
async fn test_ingest_rejects_blank_name_locally() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let skill = RemoteSkill {
        name: "  ".into(),
        description: String::new(),
        json_schema: String::new(),
    };
    let err = client_for(&server.uri()).ingest_skill(&skill).await.unwrap_err();
    assert!(err.to_string().contains("name"));
}

#[tokio::test]
async fn test_ingest_server_error_carries_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/admin/ingest"))
        .respond_with(ResponseTemplate::new(400).set_body_string("bad schema\n"))
        .mount(&server)
        .await;

    let skill = RemoteSkill {
        name: "music".into(),
        description: String::new(),
        json_schema: String::new(),
    };
    let err = client_for(&server.uri()).ingest_skill(&skill).await.unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("400"));
    assert!(msg.contains("bad schema"));
}

#[tokio::test]
async fn test_publish_registry_ingests_each_skill() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/admin/ingest"))
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(&server)
        .await;

    let registry = ActionRegistry::new();
    registry.register(ok_spec("music", "play")).unwrap();
    registry.register(ok_spec("music", "pause")).unwrap();
    registry.register(ok_spec("screen", "click")).unwrap();

    let published = client_for(&server.uri())
        .publish_registry(&registry)
        .await
        .unwrap();
    assert_eq!(published, 2);
}

#[tokio::test]
async fn test_health_and_trailing_slash() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_string("OK"))
        .mount(&server)
        .await;

    let client = client_for(&format!("{}//", server.uri()));
    assert_eq!(client.base_url(), server.uri());
    assert!(client.health().await);
    assert!(!client_for("http://127.0.0.1:1").health().await);
}
