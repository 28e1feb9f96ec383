//! Background music playback on the default output device

use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use cpal::traits::DeviceTrait;
use cpal::{Device, Stream, StreamConfig};

use crate::Result;
use crate::actions::Mixer;
use crate::error::PlaybackError;

use super::playback::{
    Pcm, decode_mp3, decode_wav, default_output_device, pick_output_config, start_output,
};
use super::resample::resample;

/// Rate asked of the device when the mixer opens it
const PREFERRED_RATE: u32 = 44_100;

/// Mixer backed by a cpal output stream
///
/// Constructed once at startup; dropping it stops anything still playing.
pub struct CpalMixer {
    device: Device,
    config: StreamConfig,
    track: Option<Arc<[f32]>>,
    stream: Option<Stream>,
}

impl CpalMixer {
    /// Open the output device for music
    ///
    /// # Errors
    ///
    /// Returns error if no output device is available
    pub fn init() -> Result<Self> {
        let device = default_output_device()?;
        let config = pick_output_config(&device, PREFERRED_RATE)?;

        tracing::debug!(
            device = device.name().unwrap_or_default(),
            rate = config.sample_rate.0,
            channels = config.channels,
            "music mixer initialized"
        );

        Ok(Self {
            device,
            config,
            track: None,
            stream: None,
        })
    }
}

#[async_trait(?Send)]
impl Mixer for CpalMixer {
    async fn load(&mut self, path: &Path) -> std::result::Result<(), PlaybackError> {
        let samples = load_track(path, self.config.sample_rate.0).await?;
        tracing::debug!(
            path = %path.display(),
            samples = samples.len(),
            "track loaded"
        );
        self.track = Some(samples);
        Ok(())
    }

    fn play(&mut self) -> std::result::Result<(), PlaybackError> {
        let samples = self.track.clone().ok_or(PlaybackError::NothingLoaded)?;
        self.stop();

        let (stream, _finished) = start_output(&self.device, &self.config, samples)
            .map_err(|e| PlaybackError::Device(e.to_string()))?;
        self.stream = Some(stream);

        tracing::debug!("music playing");
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(stream) = self.stream.take() {
            drop(stream);
            tracing::debug!("music stopped");
        }
    }
}

impl Drop for CpalMixer {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Decode `path` and convert it to `device_rate` on the blocking pool
///
/// # Errors
///
/// Returns [`PlaybackError::Decode`] if the file cannot be read, decoded or
/// resampled
pub async fn load_track(
    path: &Path,
    device_rate: u32,
) -> std::result::Result<Arc<[f32]>, PlaybackError> {
    let path = path.to_path_buf();

    tokio::task::spawn_blocking(move || prepare(&path, device_rate))
        .await
        .map_err(|e| PlaybackError::Device(format!("decoder task failed: {e}")))?
}

fn prepare(path: &Path, device_rate: u32) -> std::result::Result<Arc<[f32]>, PlaybackError> {
    let pcm = decode_track(path)?;
    let samples = resample(&pcm.samples, pcm.sample_rate, device_rate).map_err(|e| {
        PlaybackError::Decode {
            path: path.to_path_buf(),
            reason: e.to_string(),
        }
    })?;
    Ok(samples.into())
}

/// Read and decode an MP3 or WAV file, chosen by extension
///
/// # Errors
///
/// Returns [`PlaybackError::Decode`] if the file cannot be read or decoded
pub fn decode_track(path: &Path) -> std::result::Result<Pcm, PlaybackError> {
    let decode_err = |reason: String| PlaybackError::Decode {
        path: path.to_path_buf(),
        reason,
    };

    let bytes = std::fs::read(path).map_err(|e| decode_err(e.to_string()))?;
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();

    let pcm = match extension.as_str() {
        "mp3" => decode_mp3(&bytes),
        "wav" => decode_wav(Cursor::new(bytes)),
        other => return Err(decode_err(format!("unsupported format: {other:?}"))),
    };

    pcm.map_err(|e| decode_err(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::voice::samples_to_wav;

    #[test]
    fn test_decode_track_wav() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Tone.WAV");
        std::fs::write(&path, samples_to_wav(&[0.1; 800], 16000).unwrap()).unwrap();

        let pcm = decode_track(&path).unwrap();
        assert_eq!(pcm.sample_rate, 16000);
        assert_eq!(pcm.samples.len(), 800);
    }

    #[test]
    fn test_decode_track_missing_file() {
        let err = decode_track(Path::new("/nonexistent/track.mp3")).unwrap_err();
        assert!(matches!(err, PlaybackError::Decode { .. }));
    }

    #[test]
    fn test_decode_track_unsupported_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, b"la la la").unwrap();

        assert!(matches!(
            decode_track(&path),
            Err(PlaybackError::Decode { .. })
        ));
    }

    #[tokio::test]
    async fn test_load_track_converts_to_device_rate() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        std::fs::write(&path, samples_to_wav(&[0.1; 1600], 16000).unwrap()).unwrap();

        let samples = load_track(&path, 48_000).await.unwrap();
        assert_eq!(samples.len(), 4800);
    }

    #[tokio::test]
    async fn test_load_track_reports_decode_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.mp3");
        std::fs::write(&path, b"not really audio").unwrap();

        let err = load_track(&path, 44_100).await.unwrap_err();
        assert!(matches!(err, PlaybackError::Decode { path: p, .. } if p == path));
    }
}
