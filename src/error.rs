//! Error types for Hark

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for Hark operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in Hark
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Audio device error
    #[error("audio error: {0}")]
    Audio(String),

    /// Speech-to-text error
    #[error("STT error: {0}")]
    Stt(String),

    /// Text-to-speech error
    #[error("TTS error: {0}")]
    Tts(String),

    /// Browser could not be opened
    #[error("browser error: {0}")]
    Browser(String),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Why a capture produced no usable text
///
/// The assistant loop collapses all of these into "no result"; only
/// [`RecognitionError::Service`] is worth a log line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecognitionError {
    /// Nobody started speaking before the capture timeout
    #[error("no speech before timeout")]
    Timeout,

    /// Speech was captured but nothing could be recognized
    #[error("speech was unintelligible")]
    Unintelligible,

    /// The recognition service failed
    #[error("recognition service error: {0}")]
    Service(String),

    /// The input source has ended (e.g. stdin reached EOF)
    #[error("input closed")]
    Closed,
}

/// Application launch failures
#[derive(Debug, Error)]
pub enum LaunchError {
    /// Program could not be resolved to anything runnable
    #[error("{0} was not found")]
    NotFound(String),

    /// Spawning the process failed
    #[error("could not start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// No launch mechanism for this platform
    #[error("launching applications is not supported on this platform")]
    Unsupported,
}

/// Music playback failures
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// No mixer on this host, or the music folder cannot be read
    #[error("music playback is not available")]
    Unavailable,

    /// `play` was called before a track was loaded
    #[error("no track loaded")]
    NothingLoaded,

    /// The track could not be read or decoded
    #[error("could not decode {path}: {reason}")]
    Decode { path: PathBuf, reason: String },

    /// The output device rejected the stream
    #[error("output device error: {0}")]
    Device(String),
}
