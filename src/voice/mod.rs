//! Voice processing module
//!
//! Handles audio capture, utterance segmentation, rate conversion, STT, TTS
//! and playback.

mod capture;
mod input;
mod mixer;
mod output;
mod playback;
mod resample;
mod stt;
mod tts;
mod vad;

pub use capture::{AudioCapture, AudioSource, SAMPLE_RATE, samples_to_wav};
pub use input::{CaptureBounds, MicrophoneInput, SpeechInput, TypedInput};
pub use mixer::{CpalMixer, decode_track, load_track};
pub use output::{CloudSpeaker, ConsoleOutput, SpeechOutput, Speaker};
pub use playback::{AudioPlayback, Pcm, decode_mp3, decode_wav};
pub use resample::{RateConverter, resample};
pub use stt::{SpeechToText, SttProvider};
pub use tts::{TextToSpeech, TtsProvider};
pub use vad::{ENERGY_THRESHOLD, SegmentState, UtteranceSegmenter, calculate_energy, duration_to_samples};
