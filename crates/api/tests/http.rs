use std::sync::Arc;

use api::{app, AppState};
use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use brain_core::{Brain, ExampleDialogue, GenerationSettings, PromptConfig};
use mock_brain::{EchoBrain, FailingBrain};
use orchestrator::repository::MemoryBackend;
use orchestrator::{AgentDraft, AgentHub};
use serde_json::{json, Value};
use tower::ServiceExt;

fn hub(brain: Arc<dyn Brain>) -> AgentHub {
    AgentHub::new(Arc::new(MemoryBackend::new()), brain)
}

fn draft(name: &str) -> AgentDraft {
    AgentDraft {
        name: name.to_string(),
        category: "Copywriting".to_string(),
        description: "Punchy taglines".to_string(),
        price: 5.0,
        icon: "Bot".to_string(),
        prompt: PromptConfig {
            system: "You write taglines.".to_string(),
            welcome: String::new(),
            examples: vec![ExampleDialogue {
                user: "Coffee shop".to_string(),
                agent: "Brewed for you.".to_string(),
            }],
        },
        settings: GenerationSettings::default(),
    }
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    role: &str,
    body: Option<Value>,
) -> (StatusCode, Vec<u8>) {
    let mut request = Request::builder()
        .method(method)
        .uri(uri)
        .header("x-user-id", format!("{}-1", role))
        .header("x-user-role", role);
    let body = match body {
        Some(value) => {
            request = request.header("content-type", "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };

    let response = app.clone().oneshot(request.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, bytes.to_vec())
}

fn json_body(bytes: &[u8]) -> Value {
    serde_json::from_slice(bytes).unwrap()
}

#[tokio::test]
async fn test_health() {
    let app = app(AppState::new(hub(Arc::new(EchoBrain::new()))));
    let response = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_missing_identity_is_unauthorized() {
    let app = app(AppState::new(hub(Arc::new(EchoBrain::new()))));
    let response = app
        .oneshot(Request::get("/api/marketplace").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_malformed_email_header_is_rejected() {
    let app = app(AppState::new(hub(Arc::new(EchoBrain::new()))));
    let request = Request::get("/api/me/agents")
        .header("x-user-id", "user-1")
        .header("x-user-email", "not-an-email")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let request = Request::get("/api/me/agents")
        .header("x-user-id", "user-1")
        .header("x-user-email", "ada@example.com")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_chat_flow() {
    let hub = hub(Arc::new(EchoBrain::new()));
    let agent = hub.catalog().create(&draft("Tagline Pro")).await.unwrap();
    let app = app(AppState::new(hub));
    let messages = format!("/api/chat/{}/messages", agent.id);
    let subscription = format!("/api/me/agents/{}/subscription", agent.id);

    // Not subscribed yet
    let (status, body) = send(&app, Method::POST, &messages, "user", Some(json!({"content": "Hi"}))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(json_body(&body)["error"].as_str().unwrap().contains("not subscribed"));

    let (status, _) = send(&app, Method::POST, &subscription, "user", None).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = send(&app, Method::POST, &subscription, "user", None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = send(&app, Method::GET, "/api/me/agents", "user", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_body(&body)[0]["name"], "Tagline Pro");

    let (status, body) = send(
        &app,
        Method::POST,
        &messages,
        "user",
        Some(json!({"content": "Write a tagline"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let turn = json_body(&body);
    assert_eq!(turn["status"], "settled");
    assert_eq!(turn["agent_message"]["content"], "Write a tagline");

    let (status, _) = send(&app, Method::POST, &messages, "user", Some(json!({"content": "  "}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(&app, Method::GET, &messages, "user", None).await;
    assert_eq!(status, StatusCode::OK);
    let conversation = json_body(&body);
    assert_eq!(conversation["messages"].as_array().unwrap().len(), 2);
    assert_eq!(
        conversation["welcome"],
        "Hello! I'm Tagline Pro. How can I help you today?"
    );

    let export = format!("/api/chat/{}/export", agent.id);
    let (status, body) = send(&app, Method::GET, &export, "user", None).await;
    assert_eq!(status, StatusCode::OK);
    let text = String::from_utf8(body).unwrap();
    assert!(text.contains("] user: Write a tagline\n\n["));
    assert!(text.ends_with("] agent: Write a tagline"));

    let (status, _) = send(&app, Method::DELETE, &subscription, "user", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, Method::DELETE, &subscription, "user", None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_generator_failure_and_retry_endpoints() {
    let hub = hub(Arc::new(FailingBrain::rate_limited()));
    let agent = hub.catalog().create(&draft("Tagline Pro")).await.unwrap();
    hub.subscribe("user-1", agent.id).await.unwrap();
    let app = app(AppState::new(hub));

    let messages = format!("/api/chat/{}/messages", agent.id);
    let (status, body) = send(&app, Method::POST, &messages, "user", Some(json!({"content": "Hi"}))).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    let turn = json_body(&body);
    assert_eq!(turn["status"], "failed");
    assert_eq!(turn["reason"]["kind"], "rate_limited");
    assert!(turn["error"].is_string());

    let state = format!("/api/chat/{}/state", agent.id);
    let (_, body) = send(&app, Method::GET, &state, "user", None).await;
    assert_eq!(json_body(&body)["state"], "failed");

    let retry = format!("/api/chat/{}/retry", agent.id);
    let (status, _) = send(&app, Method::POST, &retry, "user", None).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);

    let cancel = format!("/api/chat/{}/cancel", agent.id);
    let (status, _) = send(&app, Method::POST, &cancel, "user", None).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_admin_routes_require_roles() {
    let hub = hub(Arc::new(EchoBrain::new()));
    let app = app(AppState::new(hub.clone()));
    let body = serde_json::to_value(draft("SEO Scout")).unwrap();

    let (status, _) = send(&app, Method::POST, "/api/admin/agents", "user", Some(body.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, created) = send(&app, Method::POST, "/api/admin/agents", "admin", Some(body)).await;
    assert_eq!(status, StatusCode::CREATED);
    let agent_id = json_body(&created)["id"].as_i64().unwrap();

    let (status, body) = send(&app, Method::GET, "/api/marketplace?q=seo", "user", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_body(&body).as_array().unwrap().len(), 1);

    let (status, _) = send(&app, Method::DELETE, &format!("/api/admin/agents/{}", agent_id), "admin", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, Method::GET, &format!("/api/agents/{}", agent_id), "user", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, Method::GET, "/api/admin/stats", "user", None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, body) = send(&app, Method::GET, "/api/admin/stats", "admin", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_body(&body)["active_agents"], 0);
}

#[tokio::test]
async fn test_agent_dry_run() {
    let app = app(AppState::new(hub(Arc::new(EchoBrain::new()))));
    let mut invalid = draft("AB");
    invalid.price = 0.0;
    let body = serde_json::to_value(invalid).unwrap();

    let (status, report) = send(&app, Method::POST, "/api/admin/agents/test", "admin", Some(body)).await;
    assert_eq!(status, StatusCode::OK);
    let report = json_body(&report);
    assert_eq!(report["success"], false);
    assert_eq!(report["issues"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_api_keys_are_superadmin_only_and_masked() {
    let app = app(AppState::new(hub(Arc::new(EchoBrain::new()))));
    let key = json!({"name": "Primary", "provider": "openai", "key": "sk-live-abcd1234"});

    let (status, _) = send(&app, Method::POST, "/api/admin/api-keys", "admin", Some(key.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&app, Method::POST, "/api/admin/api-keys", "superadmin", Some(key)).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(&app, Method::GET, "/api/admin/api-keys", "superadmin", None).await;
    assert_eq!(status, StatusCode::OK);
    let listed = json_body(&body);
    assert_eq!(listed[0]["masked"], "************1234");
    assert!(listed[0].get("secret").is_none());
}

#[tokio::test]
async fn test_user_management() {
    let hub = hub(Arc::new(EchoBrain::new()));
    hub.users().ensure("member", "Member", "m@example.com").await.unwrap();
    let app = app(AppState::new(hub));

    let (status, body) = send(&app, Method::GET, "/api/admin/users", "admin", None).await;
    assert_eq!(status, StatusCode::OK);
    // "member" plus the admin caller, registered on first request
    assert_eq!(json_body(&body).as_array().unwrap().len(), 2);

    let promote = json!({"role": "admin", "plan": "bundle"});
    let (status, _) = send(&app, Method::PATCH, "/api/admin/users/member", "admin", Some(promote.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, body) = send(&app, Method::PATCH, "/api/admin/users/member", "superadmin", Some(promote)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_body(&body)["role"], "admin");
}
