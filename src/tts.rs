//! Speech-synthesis client (Gemini TTS compatible API).
//!
//! Returns base64-encoded raw PCM (24kHz mono 16-bit by default) which the
//! wav module wraps into a playable container.

use crate::config::TtsConfig;
use crate::conversation::Turn;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Voices used to pad an underspecified speaker mapping
pub const DEFAULT_SPEAKER_VOICES: [&str; 2] = ["Kore", "Puck"];

/// Prebuilt voice catalog: (name, style)
pub const VOICES: &[(&str, &str)] = &[
    ("Kore", "Firm"),
    ("Puck", "Upbeat"),
    ("Charon", "Informative"),
    ("Zephyr", "Bright"),
    ("Fenrir", "Excitable"),
    ("Leda", "Youthful"),
    ("Orus", "Firm"),
    ("Aoede", "Breezy"),
    ("Callirrhoe", "Easy-going"),
    ("Autonoe", "Bright"),
    ("Enceladus", "Breathy"),
    ("Iapetus", "Clear"),
    ("Umbriel", "Easy-going"),
    ("Algieba", "Smooth"),
    ("Despina", "Smooth"),
    ("Erinome", "Clear"),
    ("Algenib", "Gravelly"),
    ("Rasalgethi", "Informative"),
    ("Laomedeia", "Upbeat"),
    ("Achernar", "Soft"),
    ("Alnilam", "Firm"),
    ("Schedar", "Even"),
    ("Gacrux", "Mature"),
    ("Pulcherrima", "Forward"),
    ("Achird", "Friendly"),
    ("Zubenelgenubi", "Casual"),
    ("Vindemiatrix", "Gentle"),
    ("Sadachbia", "Lively"),
    ("Sadaltager", "Knowledgeable"),
    ("Sulafat", "Warm"),
];

pub fn is_known_voice(name: &str) -> bool {
    VOICES.iter().any(|(voice, _)| *voice == name)
}

#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error(
        "no speech API key configured, set [tts].api_key in Config.toml or GEMINI_API_KEY"
    )]
    MissingCredential,

    #[error("speech API request failed with status {status}: {message}")]
    RemoteCallFailed { status: u16, message: String },

    #[error("no audio data received from speech API")]
    NoAudio,

    #[error("speech API transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Base64 PCM payload with its reported MIME type
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SynthesizedAudio {
    pub data: String,
    pub mime_type: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SynthesisRequest {
    contents: Vec<RequestContent>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct RequestContent {
    parts: Vec<RequestPart>,
}

#[derive(Serialize)]
struct RequestPart {
    text: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_modalities: Vec<&'static str>,
    speech_config: SpeechConfig,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SpeechConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    voice_config: Option<VoiceConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    multi_speaker_voice_config: Option<MultiSpeakerVoiceConfig>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VoiceConfig {
    prebuilt_voice_config: PrebuiltVoiceConfig,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PrebuiltVoiceConfig {
    voice_name: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MultiSpeakerVoiceConfig {
    speaker_voice_configs: Vec<SpeakerVoiceConfig>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SpeakerVoiceConfig {
    speaker: String,
    voice_config: VoiceConfig,
}

#[derive(Deserialize)]
struct SynthesisResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponsePart {
    inline_data: Option<SynthesizedAudio>,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: Option<ApiErrorDetail>,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// Resolves a requested voice list into the exactly-two speaker slots the
/// API accepts: extra entries are dropped, missing ones padded with the
/// defaults.
pub fn resolve_speaker_voices(voices: &[String]) -> [(String, String); 2] {
    let voice = |i: usize| {
        voices
            .get(i)
            .cloned()
            .unwrap_or_else(|| DEFAULT_SPEAKER_VOICES[i].to_string())
    };

    [
        ("Speaker 1".to_string(), voice(0)),
        ("Speaker 2".to_string(), voice(1)),
    ]
}

#[derive(Clone)]
pub struct SpeechClient {
    http: reqwest::Client,
    config: TtsConfig,
}

impl SpeechClient {
    pub fn new(config: TtsConfig) -> Self {
        SpeechClient {
            http: reqwest::Client::new(),
            config,
        }
    }

    fn api_key(&self) -> Result<&str, SynthesisError> {
        match self.config.api_key.as_deref() {
            Some(key) if !key.is_empty() => Ok(key),
            _ => Err(SynthesisError::MissingCredential),
        }
    }

    async fn generate(&self, request: &SynthesisRequest) -> Result<SynthesizedAudio, SynthesisError> {
        let api_key = self.api_key()?;
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.config.endpoint, self.config.model, api_key
        );

        debug!("Requesting speech synthesis from {}", self.config.model);

        let response = self.http.post(&url).json(request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ApiErrorBody>()
                .await
                .ok()
                .and_then(|body| body.error)
                .map(|e| e.message)
                .unwrap_or_else(|| "Unknown error".to_string());

            return Err(SynthesisError::RemoteCallFailed {
                status: status.as_u16(),
                message,
            });
        }

        let body: SynthesisResponse = response.json().await?;

        let audio = body
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .and_then(|content| content.parts.into_iter().next())
            .and_then(|part| part.inline_data)
            .ok_or(SynthesisError::NoAudio)?;

        debug!("Received audio, mime type: {}", audio.mime_type);
        Ok(audio)
    }

    /// Synthesizes text with a single voice
    pub async fn synthesize(
        &self,
        text: &str,
        voice: &str,
    ) -> Result<SynthesizedAudio, SynthesisError> {
        let request = SynthesisRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart {
                    text: text.to_string(),
                }],
            }],
            generation_config: GenerationConfig {
                response_modalities: vec!["AUDIO"],
                speech_config: SpeechConfig {
                    voice_config: Some(VoiceConfig {
                        prebuilt_voice_config: PrebuiltVoiceConfig {
                            voice_name: voice.to_string(),
                        },
                    }),
                    multi_speaker_voice_config: None,
                },
            },
        };

        self.generate(&request).await
    }

    /// Synthesizes a two-speaker dialogue. The API accepts exactly two
    /// speakers; the voice list is clamped/padded accordingly.
    pub async fn synthesize_dialogue(
        &self,
        turns: &[Turn],
        voices: &[String],
    ) -> Result<SynthesizedAudio, SynthesisError> {
        let mut prompt = String::from("TTS the following conversation:\n");
        for turn in turns {
            prompt.push_str(&format!("{}: {}\n", turn.speaker, turn.text));
        }

        let speaker_voice_configs = resolve_speaker_voices(voices)
            .into_iter()
            .map(|(speaker, voice_name)| SpeakerVoiceConfig {
                speaker,
                voice_config: VoiceConfig {
                    prebuilt_voice_config: PrebuiltVoiceConfig { voice_name },
                },
            })
            .collect();

        let request = SynthesisRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart { text: prompt }],
            }],
            generation_config: GenerationConfig {
                response_modalities: vec!["AUDIO"],
                speech_config: SpeechConfig {
                    voice_config: None,
                    multi_speaker_voice_config: Some(MultiSpeakerVoiceConfig {
                        speaker_voice_configs,
                    }),
                },
            },
        };

        self.generate(&request).await
    }
}
