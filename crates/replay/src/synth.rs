use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use pitchroom_config::SynthesisConfig;
use pitchroom_core::Speaker;
use serde::{Deserialize, Serialize};

/// Speaker → synthesis voice id mapping.
#[derive(Debug, Clone)]
pub struct VoiceMap {
    user_voice: String,
    prospect_voice: String,
}

impl VoiceMap {
    pub fn from_config(config: &SynthesisConfig) -> Self {
        Self {
            user_voice: config.user_voice.clone(),
            prospect_voice: config.prospect_voice.clone(),
        }
    }

    pub fn voice_for(&self, speaker: Speaker) -> &str {
        match speaker {
            Speaker::User => &self.user_voice,
            Speaker::Prospect => &self.prospect_voice,
        }
    }
}

/// Trait for pluggable text-to-speech backends.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync + 'static {
    /// Synthesizes one utterance, returning raw playable audio bytes.
    async fn synthesize(&self, text: &str, voice: &str) -> anyhow::Result<Vec<u8>>;

    /// Human-readable backend name.
    fn name(&self) -> &str;
}

#[derive(Serialize)]
struct SynthesizeRequest<'a> {
    text: &'a str,
    voice: &'a str,
}

#[derive(Deserialize)]
struct SynthesizeResponse {
    /// Base64-encoded audio payload.
    audio: String,
}

/// HTTP synthesis backend: posts `{text, voice}` as JSON, decodes the
/// base64 `audio` field of the response.
pub struct HttpSynthesizer {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpSynthesizer {
    pub fn new(config: &SynthesisConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
        })
    }
}

#[async_trait]
impl SpeechSynthesizer for HttpSynthesizer {
    async fn synthesize(&self, text: &str, voice: &str) -> anyhow::Result<Vec<u8>> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&SynthesizeRequest { text, voice })
            .send()
            .await?
            .error_for_status()?;

        let body: SynthesizeResponse = response.json().await?;
        let bytes = BASE64.decode(body.audio.as_bytes())?;
        Ok(bytes)
    }

    fn name(&self) -> &str {
        "http"
    }
}
