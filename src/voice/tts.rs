//! Remote text-to-speech

use std::str::FromStr;

use reqwest::RequestBuilder;
use serde::Serialize;

use crate::{Error, Result};

const OPENAI_SPEECH_URL: &str = "https://api.openai.com/v1/audio/speech";
const ELEVENLABS_URL: &str = "https://api.elevenlabs.io/v1/text-to-speech";

/// TTS provider backend
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TtsProvider {
    OpenAi,
    ElevenLabs,
}

impl TtsProvider {
    /// Model used when none is configured
    #[must_use]
    pub const fn default_model(self) -> &'static str {
        match self {
            Self::OpenAi => "tts-1",
            Self::ElevenLabs => "eleven_monolingual_v1",
        }
    }

    /// Voice used when none is configured
    #[must_use]
    pub const fn default_voice(self) -> &'static str {
        match self {
            Self::OpenAi => "alloy",
            Self::ElevenLabs => "21m00Tcm4TlvDq8ikWAM",
        }
    }

    const fn name(self) -> &'static str {
        match self {
            Self::OpenAi => "OpenAI",
            Self::ElevenLabs => "ElevenLabs",
        }
    }
}

impl FromStr for TtsProvider {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "elevenlabs" => Ok(Self::ElevenLabs),
            other => Err(Error::Config(format!("unknown TTS provider: {other}"))),
        }
    }
}

#[derive(Serialize)]
struct OpenAiSpeech<'a> {
    model: &'a str,
    input: &'a str,
    voice: &'a str,
    speed: f32,
    response_format: &'static str,
}

#[derive(Serialize)]
struct ElevenLabsSpeech<'a> {
    text: &'a str,
    model_id: &'a str,
}

/// Turns reply text into MP3 audio
pub struct TextToSpeech {
    client: reqwest::Client,
    api_key: String,
    voice: String,
    speed: f32,
    model: String,
    provider: TtsProvider,
}

impl TextToSpeech {
    /// `speed` only applies to `OpenAI`; ElevenLabs ignores it.
    ///
    /// # Errors
    ///
    /// Returns error if the API key is empty
    pub fn new(
        provider: TtsProvider,
        api_key: String,
        voice: String,
        speed: f32,
        model: String,
    ) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config(format!(
                "{} needs an API key for speech output",
                provider.name()
            )));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            voice,
            speed,
            model,
            provider,
        })
    }

    /// Synthesize `text`, returning MP3 bytes
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the service rejects it
    pub async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        let request = match self.provider {
            TtsProvider::OpenAi => self.openai_request(text),
            TtsProvider::ElevenLabs => self.elevenlabs_request(text),
        };

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Tts(format!(
                "{} returned {status}: {body}",
                self.provider.name()
            )));
        }

        let audio = response.bytes().await?;
        tracing::debug!(
            provider = self.provider.name(),
            chars = text.len(),
            bytes = audio.len(),
            "speech synthesized"
        );
        Ok(audio.to_vec())
    }

    fn openai_request(&self, text: &str) -> RequestBuilder {
        self.client
            .post(OPENAI_SPEECH_URL)
            .bearer_auth(&self.api_key)
            .json(&OpenAiSpeech {
                model: &self.model,
                input: text,
                voice: &self.voice,
                speed: self.speed,
                response_format: "mp3",
            })
    }

    fn elevenlabs_request(&self, text: &str) -> RequestBuilder {
        let url = format!("{ELEVENLABS_URL}/{}", urlencoding::encode(&self.voice));

        self.client
            .post(url)
            .header("xi-api-key", &self.api_key)
            .header("Accept", "audio/mpeg")
            .json(&ElevenLabsSpeech {
                text,
                model_id: &self.model,
            })
    }
}
