//! Remote speech-to-text

use std::str::FromStr;

use reqwest::{RequestBuilder, Response};
use serde::Deserialize;

use crate::{Error, Result};

const WHISPER_URL: &str = "https://api.openai.com/v1/audio/transcriptions";
const DEEPGRAM_URL: &str = "https://api.deepgram.com/v1/listen";

/// STT provider backend
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SttProvider {
    /// `OpenAI` Whisper, multipart WAV upload
    Whisper,
    /// Deepgram, raw WAV body
    Deepgram,
}

impl SttProvider {
    /// Model used when none is configured
    #[must_use]
    pub const fn default_model(self) -> &'static str {
        match self {
            Self::Whisper => "whisper-1",
            Self::Deepgram => "nova-2",
        }
    }

    const fn name(self) -> &'static str {
        match self {
            Self::Whisper => "Whisper",
            Self::Deepgram => "Deepgram",
        }
    }
}

impl FromStr for SttProvider {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "whisper" | "openai" => Ok(Self::Whisper),
            "deepgram" => Ok(Self::Deepgram),
            other => Err(Error::Config(format!("unknown STT provider: {other}"))),
        }
    }
}

#[derive(Deserialize)]
struct WhisperReply {
    text: String,
}

#[derive(Deserialize)]
struct DeepgramReply {
    results: DeepgramResults,
}

#[derive(Deserialize)]
struct DeepgramResults {
    channels: Vec<DeepgramChannel>,
}

#[derive(Deserialize)]
struct DeepgramChannel {
    alternatives: Vec<DeepgramAlternative>,
}

#[derive(Deserialize)]
struct DeepgramAlternative {
    transcript: String,
}

impl DeepgramReply {
    /// Best alternative of the first channel; empty when Deepgram heard nothing
    fn into_transcript(self) -> String {
        self.results
            .channels
            .into_iter()
            .next()
            .and_then(|c| c.alternatives.into_iter().next())
            .map(|a| a.transcript)
            .unwrap_or_default()
    }
}

/// Sends recorded utterances to a transcription service
pub struct SpeechToText {
    client: reqwest::Client,
    api_key: String,
    model: String,
    provider: SttProvider,
}

impl SpeechToText {
    /// # Errors
    ///
    /// Returns error if the API key is empty
    pub fn new(provider: SttProvider, api_key: String, model: String) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config(format!(
                "{} needs an API key for speech recognition",
                provider.name()
            )));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            model,
            provider,
        })
    }

    /// Transcribe a 16-bit PCM WAV recording
    ///
    /// An empty string means the service heard no words.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the service rejects it
    pub async fn transcribe(&self, wav: &[u8]) -> Result<String> {
        tracing::debug!(provider = self.provider.name(), bytes = wav.len(), "transcribing");

        let request = match self.provider {
            SttProvider::Whisper => self.whisper_request(wav)?,
            SttProvider::Deepgram => self.deepgram_request(wav),
        };
        let response = self.check(request.send().await?).await?;

        let transcript = match self.provider {
            SttProvider::Whisper => response.json::<WhisperReply>().await?.text,
            SttProvider::Deepgram => response.json::<DeepgramReply>().await?.into_transcript(),
        };

        tracing::debug!(transcript = %transcript, "transcription complete");
        Ok(transcript)
    }

    fn whisper_request(&self, wav: &[u8]) -> Result<RequestBuilder> {
        let file = reqwest::multipart::Part::bytes(wav.to_vec())
            .file_name("speech.wav")
            .mime_str("audio/wav")
            .map_err(|e| Error::Stt(e.to_string()))?;
        let form = reqwest::multipart::Form::new()
            .part("file", file)
            .text("model", self.model.clone());

        Ok(self
            .client
            .post(WHISPER_URL)
            .bearer_auth(&self.api_key)
            .multipart(form))
    }

    fn deepgram_request(&self, wav: &[u8]) -> RequestBuilder {
        let url = format!(
            "{DEEPGRAM_URL}?model={}&punctuate=true",
            urlencoding::encode(&self.model)
        );

        self.client
            .post(url)
            .header("Authorization", format!("Token {}", self.api_key))
            .header("Content-Type", "audio/wav")
            .body(wav.to_vec())
    }

    async fn check(&self, response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(Error::Stt(format!(
            "{} returned {status}: {body}",
            self.provider.name()
        )))
    }
}
