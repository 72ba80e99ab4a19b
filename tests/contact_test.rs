use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::routing::post;
use axum::{Json, Router};
use tokio::net::TcpListener;

use folio::config::ContactConfig;
use folio::contact::{handler, ContactMailer};

async fn spawn_app(mailer: ContactMailer) -> SocketAddr {
    let app = Router::new()
        .route("/v1/contact", post(handler::submit))
        .with_state(Arc::new(mailer));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

type Deliveries = Arc<Mutex<Vec<serde_json::Value>>>;

/// Spawn a stub email-delivery API that records every payload it receives.
async fn spawn_delivery_stub() -> (SocketAddr, Deliveries) {
    let received: Deliveries = Arc::new(Mutex::new(Vec::new()));
    let state = received.clone();

    let app = Router::new().route(
        "/emails",
        post(move |Json(body): Json<serde_json::Value>| {
            let state = state.clone();
            async move {
                state.lock().unwrap().push(body);
                Json(serde_json::json!({ "id": "email_1" }))
            }
        }),
    );

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (addr, received)
}

#[tokio::test]
async fn test_unconfigured_delivery_answers_503() {
    let addr = spawn_app(ContactMailer::new(&ContactConfig::default())).await;

    let resp = reqwest::Client::new()
        .post(format!("http://{addr}/v1/contact"))
        .json(&serde_json::json!({
            "name": "Ada",
            "email": "ada@example.com",
            "message": "hello"
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 503);
}

#[tokio::test]
async fn test_invalid_payload_answers_400_before_delivery() {
    let addr = spawn_app(ContactMailer::new(&ContactConfig::default())).await;

    let resp = reqwest::Client::new()
        .post(format!("http://{addr}/v1/contact"))
        .json(&serde_json::json!({
            "name": "",
            "email": "ada@example.com",
            "message": "hello"
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 400);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("name"));
}

#[tokio::test]
async fn test_submission_is_relayed_through_delivery_api() {
    let (stub_addr, received) = spawn_delivery_stub().await;
    let config = ContactConfig {
        to: "me@example.com".to_string(),
        api_url: Some(format!("http://{stub_addr}/emails")),
        api_key: Some("test-key".to_string()),
        ..Default::default()
    };
    let addr = spawn_app(ContactMailer::new(&config)).await;

    let resp = reqwest::Client::new()
        .post(format!("http://{addr}/v1/contact"))
        .json(&serde_json::json!({
            "name": "Ada",
            "email": "ada@example.com",
            "subject": "Project inquiry",
            "message": "I would like to work with you."
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "sent");
    assert!(!body["id"].as_str().unwrap().is_empty());

    let deliveries = received.lock().unwrap();
    assert_eq!(deliveries.len(), 1);
    assert_eq!(deliveries[0]["to"][0], "me@example.com");
    assert_eq!(deliveries[0]["reply_to"], "ada@example.com");
    assert_eq!(deliveries[0]["subject"], "Project inquiry");
}
