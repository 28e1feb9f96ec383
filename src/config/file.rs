//! TOML configuration file loading
//!
//! Supports `~/.config/hark/config.toml` as a persistent config source.
//! All fields are optional; the file is a partial overlay on top of defaults.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Deserialize;

use crate::actions::LaunchDescriptor;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct HarkConfigFile {
    /// Who the assistant talks to and what wakes it
    #[serde(default)]
    pub assistant: AssistantFileConfig,

    /// Capture bounds
    #[serde(default)]
    pub listen: ListenFileConfig,

    /// Speech service configuration
    #[serde(default)]
    pub voice: VoiceFileConfig,

    /// API keys for external services
    #[serde(default)]
    pub api_keys: ApiKeysFileConfig,

    /// Local music playback
    #[serde(default)]
    pub music: MusicFileConfig,

    /// Extra or overriding application launch entries, keyed by spoken name
    #[serde(default)]
    pub applications: BTreeMap<String, LaunchDescriptor>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AssistantFileConfig {
    /// Name used in the greeting
    pub user_name: Option<String>,

    /// Phrase that wakes the assistant (e.g. "assistant")
    pub wake_word: Option<String>,
}

/// Capture bounds, in seconds
#[derive(Debug, Default, Deserialize)]
pub struct ListenFileConfig {
    pub wake_timeout_secs: Option<f64>,
    pub wake_phrase_limit_secs: Option<f64>,
    pub command_timeout_secs: Option<f64>,
    pub command_phrase_limit_secs: Option<f64>,

    /// Ambient-noise calibration before each capture
    pub ambient_secs: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct VoiceFileConfig {
    /// "whisper" or "deepgram"
    pub stt_provider: Option<String>,

    /// STT model (e.g. "whisper-1")
    pub stt_model: Option<String>,

    /// "openai" or "elevenlabs"
    pub tts_provider: Option<String>,

    /// TTS model (e.g. "tts-1")
    pub tts_model: Option<String>,

    /// TTS voice identifier (e.g. "alloy")
    pub tts_voice: Option<String>,

    /// TTS speed multiplier
    pub tts_speed: Option<f32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ApiKeysFileConfig {
    pub openai: Option<String>,
    pub deepgram: Option<String>,
    pub elevenlabs: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct MusicFileConfig {
    /// Folder scanned on "play music"
    pub dir: Option<String>,
}

/// Load the TOML config file from the standard path
///
/// Returns `HarkConfigFile::default()` if the file doesn't exist or can't be parsed.
#[must_use]
pub fn load_config_file() -> HarkConfigFile {
    let Some(path) = config_file_path() else {
        return HarkConfigFile::default();
    };

    if !path.exists() {
        return HarkConfigFile::default();
    }

    match std::fs::read_to_string(&path) {
        Ok(content) => match parse(&content) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "loaded config file");
                config
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse config file, using defaults"
                );
                HarkConfigFile::default()
            }
        },
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to read config file"
            );
            HarkConfigFile::default()
        }
    }
}

/// Parse config file contents
///
/// # Errors
///
/// Returns error if the content is not valid TOML for this schema
pub fn parse(content: &str) -> crate::Result<HarkConfigFile> {
    Ok(toml::from_str(content)?)
}

/// Return the config file path: `~/.config/hark/config.toml`
#[must_use]
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("hark").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_is_default() {
        let fc = parse("").unwrap();
        assert!(fc.assistant.wake_word.is_none());
        assert!(fc.applications.is_empty());
    }

    #[test]
    fn test_applications_accept_both_forms() {
        let fc = parse(
            r#"
            [applications]
            editor = "/usr/bin/gedit"
            browser = { program = "firefox", args = ["--private-window"] }
            "#,
        )
        .unwrap();

        assert_eq!(fc.applications["editor"].program, "/usr/bin/gedit");
        assert!(fc.applications["editor"].args.is_empty());
        assert_eq!(fc.applications["browser"].program, "firefox");
        assert_eq!(fc.applications["browser"].args, vec!["--private-window"]);
    }

    #[test]
    fn test_rejects_wrong_types() {
        assert!(parse("[listen]\nwake_timeout_secs = \"soon\"").is_err());
    }
}
