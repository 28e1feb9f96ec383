//! Energy-based utterance segmentation
//!
//! Splits a stream of 16kHz samples into one utterance: wait for speech
//! onset, accumulate until trailing silence or the phrase limit.

use std::time::Duration;

use super::SAMPLE_RATE;
use super::input::CaptureBounds;

/// Minimum audio energy threshold to consider speech
pub const ENERGY_THRESHOLD: f32 = 0.03;

/// Calibrated threshold sits this far above the ambient level
const AMBIENT_FACTOR: f32 = 1.5;

/// Minimum voiced duration for an utterance (in samples at 16kHz)
const MIN_VOICED_SAMPLES: usize = 3200; // 0.2 seconds

/// Silence duration to consider end of utterance (in samples)
const SILENCE_SAMPLES: usize = 8000; // 0.5 seconds

/// Where the segmenter is in the current capture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentState {
    /// No speech yet
    Waiting,
    /// Speech started, accumulating
    Speaking,
    /// Utterance finished (trailing silence or phrase limit)
    Complete,
    /// Nobody spoke before the timeout
    TimedOut,
}

/// Segments a single utterance out of pushed audio chunks
pub struct UtteranceSegmenter {
    threshold: f32,
    timeout_samples: usize,
    phrase_limit_samples: usize,
    state: SegmentState,
    waited: usize,
    voiced: usize,
    silence: usize,
    speech: Vec<f32>,
}

impl UtteranceSegmenter {
    /// Create a segmenter for one capture
    #[must_use]
    pub fn new(bounds: CaptureBounds, threshold: f32) -> Self {
        Self {
            threshold,
            timeout_samples: duration_to_samples(bounds.timeout),
            phrase_limit_samples: duration_to_samples(bounds.phrase_limit),
            state: SegmentState::Waiting,
            waited: 0,
            voiced: 0,
            silence: 0,
            speech: Vec::new(),
        }
    }

    /// Speech threshold for a room whose background noise is `ambient`
    #[must_use]
    pub fn calibrated_threshold(ambient: &[f32]) -> f32 {
        (calculate_energy(ambient) * AMBIENT_FACTOR).max(ENERGY_THRESHOLD)
    }

    /// Feed a chunk of samples and return the resulting state
    pub fn push(&mut self, samples: &[f32]) -> SegmentState {
        let energy = calculate_energy(samples);
        let is_speech = energy > self.threshold;

        match self.state {
            SegmentState::Waiting => {
                if is_speech {
                    self.state = SegmentState::Speaking;
                    self.speech.clear();
                    self.speech.extend_from_slice(samples);
                    self.voiced = samples.len();
                    self.silence = 0;
                    tracing::trace!(energy, "speech onset");
                } else {
                    self.waited += samples.len();
                    if self.waited >= self.timeout_samples {
                        tracing::debug!(waited = self.waited, "capture timed out");
                        self.state = SegmentState::TimedOut;
                    }
                }
            }
            SegmentState::Speaking => {
                self.speech.extend_from_slice(samples);

                if is_speech {
                    self.voiced += samples.len();
                    self.silence = 0;
                } else {
                    self.silence += samples.len();
                }

                if self.silence > SILENCE_SAMPLES {
                    if self.voiced >= MIN_VOICED_SAMPLES {
                        tracing::debug!(samples = self.speech.len(), "speech segment complete");
                        self.state = SegmentState::Complete;
                    } else {
                        // A click or cough; keep waiting for real speech
                        tracing::trace!(voiced = self.voiced, "discarding short noise");
                        self.waited += self.speech.len();
                        self.speech.clear();
                        self.voiced = 0;
                        self.silence = 0;
                        self.state = if self.waited >= self.timeout_samples {
                            SegmentState::TimedOut
                        } else {
                            SegmentState::Waiting
                        };
                    }
                }
            }
            SegmentState::Complete | SegmentState::TimedOut => {}
        }

        if self.state == SegmentState::Speaking && self.speech.len() >= self.phrase_limit_samples {
            tracing::debug!(samples = self.speech.len(), "phrase limit reached");
            self.state = SegmentState::Complete;
        }

        self.state
    }

    /// Get current state
    #[must_use]
    pub const fn state(&self) -> SegmentState {
        self.state
    }

    /// Get the accumulated speech buffer
    #[must_use]
    pub fn speech(&self) -> &[f32] {
        &self.speech
    }

    /// Take the speech buffer, clearing it
    pub fn take_speech(&mut self) -> Vec<f32> {
        std::mem::take(&mut self.speech)
    }
}

/// Number of 16kHz samples covering `duration`
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
#[must_use]
pub fn duration_to_samples(duration: Duration) -> usize {
    (duration.as_secs_f64() * f64::from(SAMPLE_RATE)) as usize
}

/// Calculate RMS energy of audio samples
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn calculate_energy(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }

    let sum_squares: f32 = samples.iter().map(|s| s * s).sum();
    (sum_squares / samples.len() as f32).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_energy_calculation() {
        let silence = vec![0.0f32; 100];
        assert!(calculate_energy(&silence) < 0.001);

        let loud = vec![0.5f32; 100];
        assert!(calculate_energy(&loud) > 0.4);

        assert!(calculate_energy(&[]) < f32::EPSILON);
    }

    #[test]
    fn test_calibration_never_below_floor() {
        let quiet_room = vec![0.001f32; 1600];
        assert!((UtteranceSegmenter::calibrated_threshold(&quiet_room) - ENERGY_THRESHOLD).abs() < 1e-6);

        let noisy_room = vec![0.1f32; 1600];
        assert!(UtteranceSegmenter::calibrated_threshold(&noisy_room) > 0.14);
    }

    #[test]
    fn test_duration_to_samples() {
        assert_eq!(duration_to_samples(Duration::from_millis(500)), 8000);
        assert_eq!(duration_to_samples(Duration::from_secs(2)), 32000);
    }
}
