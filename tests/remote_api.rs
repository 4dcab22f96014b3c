//! Integration tests for the remote API clients, using a mock HTTP server.

mod common;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use common::*;
use notecast::conversation::Turn;
use notecast::llm::{ChatClient, ChatError, ChatMessage};
use notecast::tts::{resolve_speaker_voices, SpeechClient, SynthesisError};
use notecast::wav;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn llm_config(endpoint: &str) -> LlmConfig {
    let mut config = LlmConfig::default();
    config.api_key = Some("test-key".to_string());
    config.endpoint = endpoint.to_string();
    config.model = "test-model".to_string();
    config
}

fn tts_config(endpoint: &str) -> TtsConfig {
    let mut config = TtsConfig::default();
    config.api_key = Some("test-key".to_string());
    config.endpoint = endpoint.to_string();
    config.model = "test-tts".to_string();
    config
}

#[tokio::test]
async fn test_chat_completion_success() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_partial_json(json!({ "model": "test-model" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [
                { "message": { "role": "assistant", "content": "# Photosynthesis\n\nNotes here." } }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = ChatClient::new(llm_config(&server.uri()));
    let content = client
        .complete(&[ChatMessage::user("Explain photosynthesis")])
        .await
        .unwrap();

    assert!(content.starts_with("# Photosynthesis"));
}

#[tokio::test]
async fn test_chat_error_includes_upstream_message() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(402).set_body_json(json!({
            "error": { "message": "Insufficient credits" }
        })))
        .mount(&server)
        .await;

    let client = ChatClient::new(llm_config(&server.uri()));
    let result = client.generate_note("anything").await;

    match result {
        Err(ChatError::RemoteCallFailed { status, message }) => {
            assert_eq!(status, 402);
            assert_eq!(message, "Insufficient credits");
        }
        other => panic!("Expected RemoteCallFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn test_chat_error_without_body_reports_unknown() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = ChatClient::new(llm_config(&server.uri()));
    let result = client.generate_note("anything").await;

    match result {
        Err(ChatError::RemoteCallFailed { status, message }) => {
            assert_eq!(status, 500);
            assert_eq!(message, "Unknown error");
        }
        other => panic!("Expected RemoteCallFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn test_chat_empty_choices_rejected() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
        .mount(&server)
        .await;

    let client = ChatClient::new(llm_config(&server.uri()));
    let result = client.generate_conversation("content").await;
    assert!(matches!(result, Err(ChatError::NoChoices)));
}

#[tokio::test]
async fn test_chat_missing_credential_never_hits_network() {
    let mut config = LlmConfig::default();
    config.api_key = None;
    config.endpoint = "http://127.0.0.1:1".to_string();

    let client = ChatClient::new(config);
    let result = client.generate_note("topic").await;
    assert!(matches!(result, Err(ChatError::MissingCredential)));
}

#[tokio::test]
async fn test_synthesize_returns_pcm_that_encodes_to_wav() {
    let server = MockServer::start().await;

    let pcm: Vec<u8> = (0i16..240).flat_map(|v| v.to_le_bytes()).collect();
    let base64_pcm = BASE64.encode(&pcm);

    Mock::given(method("POST"))
        .and(path("/models/test-tts:generateContent"))
        .and(query_param("key", "test-key"))
        .and(body_partial_json(json!({
            "generationConfig": {
                "responseModalities": ["AUDIO"],
                "speechConfig": {
                    "voiceConfig": { "prebuiltVoiceConfig": { "voiceName": "Kore" } }
                }
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{
                "content": {
                    "parts": [{
                        "inlineData": {
                            "data": base64_pcm,
                            "mimeType": "audio/L16;codec=pcm;rate=24000"
                        }
                    }]
                }
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = SpeechClient::new(tts_config(&server.uri()));
    let audio = client.synthesize("Have a wonderful day!", "Kore").await.unwrap();

    assert_eq!(audio.mime_type, "audio/L16;codec=pcm;rate=24000");

    // The full pipeline: response payload wraps into a valid container
    let encoded = wav::encode(&audio.data, &WavParams::default()).unwrap();
    assert_eq!(encoded.len(), 44 + pcm.len());
}

#[tokio::test]
async fn test_synthesize_dialogue_sends_two_speaker_config() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/models/test-tts:generateContent"))
        .and(body_partial_json(json!({
            "generationConfig": {
                "speechConfig": {
                    "multiSpeakerVoiceConfig": {
                        "speakerVoiceConfigs": [
                            {
                                "speaker": "Speaker 1",
                                "voiceConfig": { "prebuiltVoiceConfig": { "voiceName": "Kore" } }
                            },
                            {
                                "speaker": "Speaker 2",
                                "voiceConfig": { "prebuiltVoiceConfig": { "voiceName": "Puck" } }
                            }
                        ]
                    }
                }
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{
                "content": {
                    "parts": [{
                        "inlineData": { "data": "AAAA", "mimeType": "audio/L16" }
                    }]
                }
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let turns = vec![
        Turn::new("Speaker 1", "Welcome to the show."),
        Turn::new("Speaker 2", "Glad to be here."),
    ];
    let voices = vec!["Kore".to_string(), "Puck".to_string()];

    let client = SpeechClient::new(tts_config(&server.uri()));
    let audio = client.synthesize_dialogue(&turns, &voices).await.unwrap();
    assert_eq!(audio.data, "AAAA");
}

#[tokio::test]
async fn test_synthesize_error_includes_upstream_message() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/models/test-tts:generateContent"))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({
            "error": { "message": "Quota exceeded" }
        })))
        .mount(&server)
        .await;

    let client = SpeechClient::new(tts_config(&server.uri()));
    let result = client.synthesize("text", "Kore").await;

    match result {
        Err(SynthesisError::RemoteCallFailed { status, message }) => {
            assert_eq!(status, 429);
            assert_eq!(message, "Quota exceeded");
        }
        other => panic!("Expected RemoteCallFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn test_synthesize_without_audio_part_rejected() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/models/test-tts:generateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{ "content": { "parts": [{}] } }]
        })))
        .mount(&server)
        .await;

    let client = SpeechClient::new(tts_config(&server.uri()));
    let result = client.synthesize("text", "Kore").await;
    assert!(matches!(result, Err(SynthesisError::NoAudio)));
}

#[tokio::test]
async fn test_synthesize_missing_credential() {
    let mut config = TtsConfig::default();
    config.api_key = None;

    let client = SpeechClient::new(config);
    let result = client.synthesize("text", "Kore").await;
    assert!(matches!(result, Err(SynthesisError::MissingCredential)));
}

#[test]
fn test_speaker_voice_resolution_clamps_and_pads() {
    // More than two voices: extras dropped
    let many = vec![
        "Kore".to_string(),
        "Puck".to_string(),
        "Charon".to_string(),
    ];
    let resolved = resolve_speaker_voices(&many);
    assert_eq!(resolved[0], ("Speaker 1".to_string(), "Kore".to_string()));
    assert_eq!(resolved[1], ("Speaker 2".to_string(), "Puck".to_string()));

    // One voice: second slot padded with the default
    let one = vec!["Charon".to_string()];
    let resolved = resolve_speaker_voices(&one);
    assert_eq!(resolved[0].1, "Charon");
    assert_eq!(resolved[1].1, "Puck");

    // None: both defaults
    let resolved = resolve_speaker_voices(&[]);
    assert_eq!(resolved[0].1, "Kore");
    assert_eq!(resolved[1].1, "Puck");
}
