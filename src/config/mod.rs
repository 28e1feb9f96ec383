//! Configuration management for Hark
//!
//! Values are layered env > TOML file > defaults.

pub mod file;

use std::path::PathBuf;
use std::time::Duration;

use crate::actions::{AppTable, default_app_table};
use crate::voice::{CaptureBounds, SttProvider, TtsProvider};
use crate::{Error, Result};

use file::HarkConfigFile;

/// Default wake word
pub const DEFAULT_WAKE_WORD: &str = "assistant";

/// Default user name used in the greeting
pub const DEFAULT_USER_NAME: &str = "User";

/// Hark configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Identity of the assistant loop
    pub assistant: AssistantConfig,

    /// Capture bounds for the two listening phases
    pub listen: ListenConfig,

    /// Speech service configuration
    pub voice: VoiceConfig,

    /// API keys
    pub api_keys: ApiKeys,

    /// Folder scanned on "play music"
    pub music_dir: PathBuf,

    /// Spoken application name → launch descriptor
    pub applications: AppTable,
}

/// Immutable identity of the assistant: who it greets and what wakes it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssistantConfig {
    user_name: String,
    wake_word: String,
}

impl AssistantConfig {
    /// Create a new assistant config; the wake word is trimmed and lowercased
    ///
    /// # Errors
    ///
    /// Returns error if the wake word is empty
    pub fn new(user_name: impl Into<String>, wake_word: &str) -> Result<Self> {
        let wake_word = wake_word.trim().to_lowercase();
        if wake_word.is_empty() {
            return Err(Error::Config("wake word must not be empty".to_string()));
        }

        Ok(Self {
            user_name: user_name.into(),
            wake_word,
        })
    }

    #[must_use]
    pub fn user_name(&self) -> &str {
        &self.user_name
    }

    #[must_use]
    pub fn wake_word(&self) -> &str {
        &self.wake_word
    }

    /// Whether recognized (lowercased) text contains the wake word
    #[must_use]
    pub fn is_wake(&self, text: &str) -> bool {
        text.contains(&self.wake_word)
    }
}

/// Bounds for each listening phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenConfig {
    /// Listening for the wake word: short phrases, long patience
    pub wake: CaptureBounds,

    /// Listening for the command after the acknowledgement
    pub command: CaptureBounds,

    /// Ambient-noise calibration before each capture
    pub ambient: Duration,
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            wake: CaptureBounds::new(Duration::from_secs(8), Duration::from_secs(4)),
            command: CaptureBounds::new(Duration::from_secs(6), Duration::from_secs(8)),
            ambient: Duration::from_millis(800),
        }
    }
}

/// Speech service configuration
#[derive(Debug, Clone)]
pub struct VoiceConfig {
    /// STT backend
    pub stt_provider: SttProvider,

    /// STT model (e.g. "whisper-1", "nova-2")
    pub stt_model: String,

    /// TTS backend
    pub tts_provider: TtsProvider,

    /// TTS model (e.g. "tts-1")
    pub tts_model: String,

    /// TTS voice identifier
    pub tts_voice: String,

    /// TTS speed multiplier (0.25 to 4.0)
    pub tts_speed: f32,
}

/// API keys for external services
#[derive(Clone, Default)]
pub struct ApiKeys {
    /// `OpenAI` API key (Whisper and TTS)
    pub openai: Option<String>,

    /// `Deepgram` API key (optional STT)
    pub deepgram: Option<String>,

    /// `ElevenLabs` API key (optional TTS)
    pub elevenlabs: Option<String>,
}

impl std::fmt::Debug for ApiKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redact = |key: &Option<String>| key.as_ref().map(|_| "<redacted>");
        f.debug_struct("ApiKeys")
            .field("openai", &redact(&self.openai))
            .field("deepgram", &redact(&self.deepgram))
            .field("elevenlabs", &redact(&self.elevenlabs))
            .finish()
    }
}

impl ApiKeys {
    /// Key for the selected STT provider
    #[must_use]
    pub fn for_stt(&self, provider: SttProvider) -> Option<&str> {
        match provider {
            SttProvider::Whisper => self.openai.as_deref(),
            SttProvider::Deepgram => self.deepgram.as_deref(),
        }
    }

    /// Key for the selected TTS provider
    #[must_use]
    pub fn for_tts(&self, provider: TtsProvider) -> Option<&str> {
        match provider {
            TtsProvider::OpenAi => self.openai.as_deref(),
            TtsProvider::ElevenLabs => self.elevenlabs.as_deref(),
        }
    }
}

/// Values given on the command line, highest precedence
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub user_name: Option<String>,
    pub wake_word: Option<String>,
}

impl Config {
    /// Load configuration from the environment and the config file
    ///
    /// # Errors
    ///
    /// Returns error if any resulting value is invalid
    pub fn load(overrides: &Overrides) -> Result<Self> {
        let fc = file::load_config_file();
        Self::from_sources(fc, overrides, |key| std::env::var(key).ok())
    }

    /// Build configuration from explicit sources
    ///
    /// # Errors
    ///
    /// Returns error if any resulting value is invalid
    pub fn from_sources(
        fc: HarkConfigFile,
        overrides: &Overrides,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        // Assistant identity (cli > env > toml > default)
        let user_name = overrides
            .user_name
            .clone()
            .or_else(|| env("HARK_USER_NAME"))
            .or(fc.assistant.user_name)
            .unwrap_or_else(|| DEFAULT_USER_NAME.to_string());
        let wake_word = overrides
            .wake_word
            .clone()
            .or_else(|| env("HARK_WAKE_WORD"))
            .or(fc.assistant.wake_word)
            .unwrap_or_else(|| DEFAULT_WAKE_WORD.to_string());
        let assistant = AssistantConfig::new(user_name, &wake_word)?;

        // Capture bounds (toml > default)
        let defaults = ListenConfig::default();
        let lf = fc.listen;
        let listen = ListenConfig {
            wake: CaptureBounds::new(
                secs_or(lf.wake_timeout_secs, defaults.wake.timeout, "wake_timeout_secs")?,
                secs_or(
                    lf.wake_phrase_limit_secs,
                    defaults.wake.phrase_limit,
                    "wake_phrase_limit_secs",
                )?,
            ),
            command: CaptureBounds::new(
                secs_or(
                    lf.command_timeout_secs,
                    defaults.command.timeout,
                    "command_timeout_secs",
                )?,
                secs_or(
                    lf.command_phrase_limit_secs,
                    defaults.command.phrase_limit,
                    "command_phrase_limit_secs",
                )?,
            ),
            ambient: secs_or(lf.ambient_secs, defaults.ambient, "ambient_secs")?,
        };

        // Voice config (env > toml > default)
        let vf = fc.voice;
        let stt_provider: SttProvider = env("HARK_STT_PROVIDER")
            .or(vf.stt_provider)
            .map_or(Ok(SttProvider::Whisper), |s| s.parse())?;
        let tts_provider: TtsProvider = env("HARK_TTS_PROVIDER")
            .or(vf.tts_provider)
            .map_or(Ok(TtsProvider::OpenAi), |s| s.parse())?;
        let tts_speed = vf.tts_speed.unwrap_or(0.9);
        if !(0.25..=4.0).contains(&tts_speed) {
            return Err(Error::Config(format!(
                "tts_speed must be between 0.25 and 4.0, got {tts_speed}"
            )));
        }
        let voice = VoiceConfig {
            stt_provider,
            stt_model: env("HARK_STT_MODEL")
                .or(vf.stt_model)
                .unwrap_or_else(|| stt_provider.default_model().to_string()),
            tts_provider,
            tts_model: env("HARK_TTS_MODEL")
                .or(vf.tts_model)
                .unwrap_or_else(|| tts_provider.default_model().to_string()),
            tts_voice: vf
                .tts_voice
                .unwrap_or_else(|| tts_provider.default_voice().to_string()),
            tts_speed,
        };

        // API keys (env > toml > None)
        let api_keys = ApiKeys {
            openai: env("OPENAI_API_KEY").or(fc.api_keys.openai),
            deepgram: env("DEEPGRAM_API_KEY").or(fc.api_keys.deepgram),
            elevenlabs: env("ELEVENLABS_API_KEY").or(fc.api_keys.elevenlabs),
        };

        let music_dir = env("HARK_MUSIC_DIR")
            .or(fc.music.dir)
            .map_or_else(|| PathBuf::from("assets").join("music"), PathBuf::from);

        // Application table: platform defaults, overlaid by the file
        let mut applications = default_app_table();
        for (name, descriptor) in fc.applications {
            applications.insert(name.trim().to_lowercase(), descriptor);
        }

        Ok(Self {
            assistant,
            listen,
            voice,
            api_keys,
            music_dir,
            applications,
        })
    }
}

/// Convert optional seconds to a duration, falling back to a default
fn secs_or(value: Option<f64>, default: Duration, name: &str) -> Result<Duration> {
    value.map_or(Ok(default), |secs| {
        Duration::try_from_secs_f64(secs)
            .map_err(|_| Error::Config(format!("{name} must be a non-negative number of seconds")))
    })
}
