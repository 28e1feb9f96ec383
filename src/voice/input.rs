//! Speech input adapters
//!
//! A [`SpeechInput`] performs one bounded capture and returns the recognized
//! text. [`MicrophoneInput`] records from the default microphone and
//! transcribes remotely; [`TypedInput`] reads lines from stdin for hosts
//! without a microphone.

use std::io::{BufRead, Write};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::time::Instant;

use crate::error::RecognitionError;

use super::capture::{AudioSource, SAMPLE_RATE, samples_to_wav};
use super::stt::SpeechToText;
use super::vad::{SegmentState, UtteranceSegmenter};

/// How often captured audio is drained into the segmenter
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Bounds for one capture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureBounds {
    /// How long to wait for speech to start
    pub timeout: Duration,
    /// Longest phrase recorded once speech started
    pub phrase_limit: Duration,
}

impl CaptureBounds {
    #[must_use]
    pub const fn new(timeout: Duration, phrase_limit: Duration) -> Self {
        Self {
            timeout,
            phrase_limit,
        }
    }
}

/// One bounded listen-and-recognize operation
#[async_trait(?Send)]
pub trait SpeechInput {
    /// Capture a phrase within `bounds` and return what was said
    async fn recognize(&mut self, bounds: CaptureBounds) -> Result<String, RecognitionError>;
}

/// Microphone capture plus remote speech-to-text
pub struct MicrophoneInput {
    capture: Box<dyn AudioSource>,
    stt: SpeechToText,
    ambient: Duration,
}

impl MicrophoneInput {
    #[must_use]
    pub const fn new(
        capture: Box<dyn AudioSource>,
        stt: SpeechToText,
        ambient: Duration,
    ) -> Self {
        Self {
            capture,
            stt,
            ambient,
        }
    }

    /// Record one utterance, or time out
    ///
    /// The microphone is only open for the duration of the call.
    #[allow(clippy::future_not_send)]
    async fn record(&mut self, bounds: CaptureBounds) -> Result<Vec<f32>, RecognitionError> {
        self.capture.start().map_err(service_error)?;
        let speech = self.listen(bounds).await;
        self.capture.stop();
        speech
    }

    #[allow(clippy::future_not_send)]
    async fn listen(&mut self, bounds: CaptureBounds) -> Result<Vec<f32>, RecognitionError> {
        self.capture.clear_buffer();

        // Calibrate against the room before listening
        tokio::time::sleep(self.ambient).await;
        let ambient = self.capture.take_buffer().map_err(service_error)?;
        let threshold = UtteranceSegmenter::calibrated_threshold(&ambient);
        tracing::trace!(threshold, "ambient calibration done");

        let mut segmenter = UtteranceSegmenter::new(bounds, threshold);

        // A stalled device delivers no samples; bound the wall clock too
        let deadline =
            Instant::now() + bounds.timeout + bounds.phrase_limit + Duration::from_secs(1);

        loop {
            tokio::time::sleep(POLL_INTERVAL).await;
            let chunk = self.capture.take_buffer().map_err(service_error)?;
            match segmenter.push(&chunk) {
                SegmentState::Complete => return Ok(segmenter.take_speech()),
                SegmentState::TimedOut => return Err(RecognitionError::Timeout),
                SegmentState::Waiting | SegmentState::Speaking => {
                    if Instant::now() >= deadline {
                        tracing::warn!("no audio from input device before deadline");
                        return Err(RecognitionError::Timeout);
                    }
                }
            }
        }
    }
}

#[async_trait(?Send)]
impl SpeechInput for MicrophoneInput {
    async fn recognize(&mut self, bounds: CaptureBounds) -> Result<String, RecognitionError> {
        let speech = self.record(bounds).await?;

        let wav = samples_to_wav(&speech, SAMPLE_RATE).map_err(service_error)?;
        let text = self.stt.transcribe(&wav).await.map_err(service_error)?;

        if text.trim().is_empty() {
            return Err(RecognitionError::Unintelligible);
        }
        Ok(text)
    }
}

#[allow(clippy::needless_pass_by_value)]
fn service_error(e: crate::Error) -> RecognitionError {
    RecognitionError::Service(e.to_string())
}

/// Reads commands typed on stdin, one line per capture
pub struct TypedInput {
    lines: UnboundedReceiver<std::io::Result<String>>,
}

impl TypedInput {
    /// Start reading stdin
    ///
    /// Blocking stdin reads cannot be cancelled, so they run on a plain
    /// thread that is never joined and ends with the process.
    #[must_use]
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();

        let reader = std::thread::Builder::new()
            .name("hark-stdin".to_string())
            .spawn(move || {
                for line in std::io::stdin().lock().lines() {
                    let failed = line.is_err();
                    if tx.send(line).is_err() || failed {
                        break;
                    }
                }
                tracing::debug!("stdin reader finished");
            });
        if let Err(e) = reader {
            tracing::error!(error = %e, "could not start the stdin reader");
        }

        Self::from_lines(rx)
    }

    const fn from_lines(lines: UnboundedReceiver<std::io::Result<String>>) -> Self {
        Self { lines }
    }
}

impl Default for TypedInput {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait(?Send)]
impl SpeechInput for TypedInput {
    async fn recognize(&mut self, bounds: CaptureBounds) -> Result<String, RecognitionError> {
        print!("> ");
        let _ = std::io::stdout().flush();

        let wait = bounds.timeout + bounds.phrase_limit;
        match tokio::time::timeout(wait, self.lines.recv()).await {
            Err(_) => {
                println!();
                Err(RecognitionError::Timeout)
            }
            Ok(Some(Ok(line))) if line.trim().is_empty() => Err(RecognitionError::Unintelligible),
            Ok(Some(Ok(line))) => Ok(line),
            Ok(Some(Err(e))) => Err(RecognitionError::Service(e.to_string())),
            Ok(None) => Err(RecognitionError::Closed),
        }
    }
}
