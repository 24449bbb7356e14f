//! ElevenLabs engine against a local HTTP stub

use mockito::Matcher;
use serde_json::json;
use std::sync::Arc;
use voxa_spk::{ApiConfig, ElevenLabsEngine, SpeechConfig, SpeechError, SpeechSynthesizer, TtsEngine, VoiceSettings};

fn api_for(server: &mockito::Server) -> ApiConfig {
    ApiConfig {
        base_url: server.url(),
        timeout_secs: 5,
        ..Default::default()
    }
}

#[tokio::test]
async fn test_synthesize_posts_expected_request() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/text-to-speech/21m00Tcm4TlvDq8ikWAM")
        .match_header("xi-api-key", "test-key")
        .match_header("accept", "audio/mpeg")
        .match_body(Matcher::Json(json!({
            "text": "Hello there",
            "model_id": "eleven_monolingual_v1",
            "voice_settings": { "stability": 0.5, "similarity_boost": 0.5 }
        })))
        .with_status(200)
        .with_header("content-type", "audio/mpeg")
        .with_body(b"ID3fakeaudio".as_slice())
        .create_async()
        .await;

    let engine = ElevenLabsEngine::with_key(&api_for(&server), Some("test-key".into())).unwrap();
    let audio = engine
        .synthesize("Hello there", &VoiceSettings::default())
        .await
        .unwrap();

    assert_eq!(&audio[..], b"ID3fakeaudio");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_non_success_status_is_api_error() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/text-to-speech/21m00Tcm4TlvDq8ikWAM")
        .with_status(401)
        .with_body(r#"{"detail":"invalid api key"}"#)
        .expect(1)
        .create_async()
        .await;

    let engine = ElevenLabsEngine::with_key(&api_for(&server), Some("bad".into())).unwrap();
    let err = engine
        .synthesize("Hello", &VoiceSettings::default())
        .await
        .unwrap_err();

    match err {
        SpeechError::Api { status, body } => {
            assert_eq!(status, 401);
            assert!(body.contains("invalid api key"));
        }
        other => panic!("expected Api error, got {:?}", other),
    }
    // no retries
    mock.assert_async().await;
}

#[tokio::test]
async fn test_connection_refused_is_http_error() {
    let api = ApiConfig {
        base_url: "http://127.0.0.1:9".into(),
        timeout_secs: 2,
        ..Default::default()
    };
    let engine = ElevenLabsEngine::with_key(&api, Some("k".into())).unwrap();
    let err = engine
        .synthesize("Hello", &VoiceSettings::default())
        .await
        .unwrap_err();
    assert!(matches!(err, SpeechError::Http(_) | SpeechError::Timeout(_)));
}

#[tokio::test]
async fn test_list_voices() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/voices")
        .match_header("xi-api-key", "k")
        .with_status(200)
        .with_body(
            json!({
                "voices": [
                    { "voice_id": "21m00Tcm4TlvDq8ikWAM", "name": "Rachel", "category": "premade", "labels": {} },
                    { "voice_id": "AZnzlk1XvdvUeBnXmlld", "name": "Domi" }
                ]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let engine = ElevenLabsEngine::with_key(&api_for(&server), Some("k".into())).unwrap();
    let voices = engine.list_voices().await.unwrap();
    assert_eq!(voices.len(), 2);
    assert_eq!(voices[0].name, "Rachel");
    assert_eq!(voices[0].category.as_deref(), Some("premade"));
    assert_eq!(voices[1].voice_id, "AZnzlk1XvdvUeBnXmlld");
}

#[tokio::test]
async fn test_synthesizer_caches_remote_audio() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/text-to-speech/custom_voice")
        .with_status(200)
        .with_body("audio")
        .expect(1)
        .create_async()
        .await;

    let config = SpeechConfig {
        api: api_for(&server),
        ..Default::default()
    };
    let engine = ElevenLabsEngine::with_key(&config.api, Some("k".into())).unwrap();
    let synth = SpeechSynthesizer::with_engine(config, Arc::new(engine)).unwrap();

    for _ in 0..3 {
        let audio = synth.speak_with_voice("Cached reply", "custom_voice").await.unwrap();
        assert_eq!(&audio[..], b"audio");
    }
    mock.assert_async().await;
}
