//! Audio playback to speakers

use std::io::{Cursor, Read};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleFormat, SampleRate, Stream, StreamConfig, SupportedStreamConfigRange};

use crate::{Error, Result};

use super::resample::resample;

/// Decoded mono audio
#[derive(Debug, Clone, PartialEq)]
pub struct Pcm {
    /// Mono samples in [-1.0, 1.0]
    pub samples: Vec<f32>,
    /// Samples per second
    pub sample_rate: u32,
}

impl Pcm {
    /// Playing time at the native rate
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.samples.len() as f64 / f64::from(self.sample_rate))
    }
}

/// Plays speech to the default output device, blocking until done
pub struct AudioPlayback {
    device: Device,
}

impl AudioPlayback {
    /// Create a new audio playback instance
    ///
    /// # Errors
    ///
    /// Returns error if audio device cannot be opened
    pub fn new() -> Result<Self> {
        let device = default_output_device()?;

        tracing::debug!(
            device = device.name().unwrap_or_default(),
            "audio playback initialized"
        );

        Ok(Self { device })
    }

    /// Play decoded audio and wait for it to finish
    ///
    /// # Errors
    ///
    /// Returns error if playback fails
    #[allow(clippy::future_not_send)]
    pub async fn play(&mut self, pcm: Pcm) -> Result<()> {
        if pcm.samples.is_empty() {
            return Ok(());
        }

        let timeout = pcm.duration() + Duration::from_millis(500);
        let config = pick_output_config(&self.device, pcm.sample_rate)?;
        let samples: Arc<[f32]> =
            resample(&pcm.samples, pcm.sample_rate, config.sample_rate.0)?.into();
        let sample_count = samples.len();
        let (stream, finished) = start_output(&self.device, &config, samples)?;

        // Poll for completion with timeout
        let start = Instant::now();
        while !finished.load(Ordering::Acquire) && start.elapsed() < timeout {
            tokio::time::sleep(Duration::from_millis(50)).await;
        }

        // Small delay to ensure audio finishes
        tokio::time::sleep(Duration::from_millis(100)).await;

        drop(stream);
        tracing::debug!(samples = sample_count, "playback complete");

        Ok(())
    }

    /// Play audio from MP3 bytes
    ///
    /// # Errors
    ///
    /// Returns error if decoding or playback fails
    #[allow(clippy::future_not_send)]
    pub async fn play_mp3(&mut self, mp3_data: &[u8]) -> Result<()> {
        let pcm = decode_mp3(mp3_data)?;
        self.play(pcm).await
    }
}

/// Open the default output device
pub(crate) fn default_output_device() -> Result<Device> {
    cpal::default_host()
        .default_output_device()
        .ok_or_else(|| Error::Audio("no output device available".to_string()))
}

/// Start a non-blocking output stream for mono `samples` already at the
/// config's rate
///
/// The returned flag flips once every sample has been handed to the device;
/// dropping the stream stops playback immediately.
pub(crate) fn start_output(
    device: &Device,
    config: &StreamConfig,
    samples: Arc<[f32]>,
) -> Result<(Stream, Arc<AtomicBool>)> {
    let channels = usize::from(config.channels.max(1));
    let finished = Arc::new(AtomicBool::new(false));
    let finished_clone = Arc::clone(&finished);
    let mut pos = 0;

    let stream = device
        .build_output_stream(
            config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                for frame in data.chunks_mut(channels) {
                    let sample = samples.get(pos).copied().unwrap_or_else(|| {
                        finished_clone.store(true, Ordering::Release);
                        0.0
                    });
                    pos += 1;
                    frame.fill(sample);
                }
            },
            |err| {
                tracing::error!(error = %err, "audio playback error");
            },
            None,
        )
        .map_err(|e| Error::Audio(e.to_string()))?;

    stream.play().map_err(|e| Error::Audio(e.to_string()))?;
    Ok((stream, finished))
}

/// Choose an f32 output config, preferring one that runs at `rate`
pub(crate) fn pick_output_config(device: &Device, rate: u32) -> Result<StreamConfig> {
    let configs: Vec<SupportedStreamConfigRange> = device
        .supported_output_configs()
        .map_err(|e| Error::Audio(e.to_string()))?
        .filter(|c| c.sample_format() == SampleFormat::F32)
        .collect();

    if let Some(c) = configs
        .iter()
        .filter(|c| c.min_sample_rate() <= SampleRate(rate) && c.max_sample_rate() >= SampleRate(rate))
        .min_by_key(|c| c.channels())
    {
        return Ok(c.clone().with_sample_rate(SampleRate(rate)).config());
    }

    // Fallback: the caller resamples to whatever rate this picks
    configs
        .iter()
        .min_by_key(|c| c.channels())
        .map(|c| c.clone().with_max_sample_rate().config())
        .ok_or_else(|| Error::Audio("no suitable output config found".to_string()))
}

/// Decode MP3 bytes to mono samples
///
/// # Errors
///
/// Returns error if the data holds no decodable frames
pub fn decode_mp3(mp3_data: &[u8]) -> Result<Pcm> {
    let mut decoder = minimp3::Decoder::new(Cursor::new(mp3_data));
    let mut samples = Vec::new();
    let mut sample_rate = 0;

    loop {
        match decoder.next_frame() {
            Ok(frame) => {
                if sample_rate == 0 {
                    sample_rate = u32::try_from(frame.sample_rate).unwrap_or(0);
                }
                let channels = frame.channels.max(1);
                samples.extend(frame.data.chunks(channels).map(|chunk| {
                    #[allow(clippy::cast_precision_loss)]
                    let sum: f32 = chunk.iter().map(|&s| f32::from(s) / 32768.0).sum::<f32>()
                        / chunk.len() as f32;
                    sum
                }));
            }
            Err(minimp3::Error::SkippedData) => {}
            Err(minimp3::Error::Eof) => break,
            Err(e) => return Err(Error::Audio(format!("MP3 decode error: {e}"))),
        }
    }

    if sample_rate == 0 {
        return Err(Error::Audio("MP3 decode error: no audio frames".to_string()));
    }

    Ok(Pcm {
        samples,
        sample_rate,
    })
}

/// Decode a WAV stream to mono samples
///
/// # Errors
///
/// Returns error if the stream is not a readable WAV file
pub fn decode_wav<R: Read>(reader: R) -> Result<Pcm> {
    let mut reader = hound::WavReader::new(reader).map_err(|e| Error::Audio(e.to_string()))?;
    let spec = reader.spec();
    let channels = usize::from(spec.channels.max(1));

    let interleaved: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<std::result::Result<_, _>>()
            .map_err(|e| Error::Audio(e.to_string()))?,
        hound::SampleFormat::Int => {
            #[allow(clippy::cast_precision_loss)]
            let scale = (1_i64 << (spec.bits_per_sample.saturating_sub(1))) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| {
                    #[allow(clippy::cast_precision_loss)]
                    let v = v as f32;
                    v / scale
                }))
                .collect::<std::result::Result<_, _>>()
                .map_err(|e| Error::Audio(e.to_string()))?
        }
    };

    #[allow(clippy::cast_precision_loss)]
    let samples = interleaved
        .chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
        .collect();

    Ok(Pcm {
        samples,
        sample_rate: spec.sample_rate,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::voice::samples_to_wav;

    #[test]
    fn test_decode_wav_from_capture_encoding() {
        let original = vec![0.0, 0.5, -0.5, 0.25];
        let wav = samples_to_wav(&original, 16000).unwrap();

        let pcm = decode_wav(Cursor::new(wav)).unwrap();
        assert_eq!(pcm.sample_rate, 16000);
        assert_eq!(pcm.samples.len(), 4);
        assert!((pcm.samples[1] - 0.5).abs() < 0.001);
        assert!((pcm.samples[2] + 0.5).abs() < 0.001);
    }

    #[test]
    fn test_decode_wav_downmixes_stereo() {
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 8000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
            for s in [16384_i16, 0, 16384, 16384] {
                writer.write_sample(s).unwrap();
            }
            writer.finalize().unwrap();
        }

        let pcm = decode_wav(Cursor::new(cursor.into_inner())).unwrap();
        assert_eq!(pcm.samples.len(), 2);
        assert!((pcm.samples[0] - 0.25).abs() < 0.001);
        assert!((pcm.samples[1] - 0.5).abs() < 0.001);
    }

    #[test]
    fn test_decode_mp3_rejects_garbage() {
        assert!(decode_mp3(b"definitely not an mp3 stream").is_err());
    }

    #[test]
    fn test_pcm_duration() {
        let pcm = Pcm {
            samples: vec![0.0; 24000],
            sample_rate: 24000,
        };
        assert_eq!(pcm.duration(), Duration::from_secs(1));
    }
}
