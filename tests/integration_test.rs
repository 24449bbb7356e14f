// Full-stack flows: router -> chat -> store -> ElevenLabs stub

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde_json::{json, Value};
use tower::ServiceExt;
use voxa_kb::RankerKind;
use voxa_server::{create_router, AppState, VoxaConfig};

async fn call(app: &Router, method: Method, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

fn config_for(server: &mockito::Server) -> VoxaConfig {
    let mut config = VoxaConfig::default();
    config.knowledge.ranker = RankerKind::First;
    config.speech.api.base_url = server.url();
    config.speech.api.api_key = Some("test-key".into());
    config.speech.api.timeout_secs = 5;
    config.chat.synthesis_timeout_secs = 5;
    config
}

#[tokio::test]
async fn test_reply_is_spoken_through_elevenlabs() {
    let mut server = mockito::Server::new_async().await;
    let tts = server
        .mock("POST", "/text-to-speech/21m00Tcm4TlvDq8ikWAM")
        .match_header("xi-api-key", "test-key")
        .with_status(200)
        .with_header("content-type", "audio/mpeg")
        .with_body(b"ID3reply".as_slice())
        .expect(1)
        .create_async()
        .await;

    let config = config_for(&server);
    assert!(config.validate().is_ok());
    let state = AppState::from_config(&config);
    assert!(state.synthesizer.is_some());
    let app = create_router(state);

    call(
        &app,
        Method::POST,
        "/api/v1/knowledge/files",
        json!({ "files": [{ "name": "faq.pdf", "mimeType": "application/pdf", "sizeBytes": 512 }] }),
    )
    .await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/v1/chat/messages",
        json!({ "text": "refund policy" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let assistant = &body["exchange"]["assistant"];
    assert!(assistant["content"].as_str().unwrap().contains("\"refund policy\""));
    assert!(assistant["content"].as_str().unwrap().ends_with("Source: faq.pdf"));

    let audio = BASE64
        .decode(body["exchange"]["audio"].as_str().unwrap())
        .unwrap();
    assert_eq!(audio, b"ID3reply");
    tts.assert_async().await;
}

#[tokio::test]
async fn test_upstream_rejection_degrades_to_text() {
    let mut server = mockito::Server::new_async().await;
    let tts = server
        .mock("POST", "/text-to-speech/21m00Tcm4TlvDq8ikWAM")
        .with_status(401)
        .with_body(r#"{"detail":"invalid key"}"#)
        .expect(1)
        .create_async()
        .await;

    let app = create_router(AppState::from_config(&config_for(&server)));
    let (status, body) = call(
        &app,
        Method::POST,
        "/api/v1/chat/messages",
        json!({ "text": "anyone there?" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"], "idle");
    assert_eq!(body["exchange"]["assistant"]["status"], "delivered");
    assert!(body["exchange"].get("audio").is_none());
    // no retry
    tts.assert_async().await;
}

#[tokio::test]
async fn test_speech_endpoint_surfaces_upstream_failure() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/text-to-speech/21m00Tcm4TlvDq8ikWAM")
        .with_status(500)
        .create_async()
        .await;

    let app = create_router(AppState::from_config(&config_for(&server)));
    let (status, body) = call(&app, Method::POST, "/api/v1/speech", json!({ "text": "hi" })).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["code"], "SYNTHESIS_ERROR");
}

#[tokio::test]
async fn test_without_api_key_chat_still_works() {
    let mut config = VoxaConfig::default();
    config.speech.api.api_key = None;
    std::env::remove_var("ELEVENLABS_API_KEY");

    let state = AppState::from_config(&config);
    assert!(state.synthesizer.is_none());

    let app = create_router(state);
    let (status, body) = call(&app, Method::POST, "/api/v1/chat/messages", json!({ "text": "hi" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["exchange"]["assistant"]["content"],
        voxa_widget::NO_MATCH_REPLY
    );
}
