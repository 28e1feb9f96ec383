//! Audio capture from microphone

use std::sync::{Arc, Mutex};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleFormat, SampleRate, Stream, StreamConfig, SupportedStreamConfigRange};

use crate::{Error, Result};

use super::resample::RateConverter;

/// Sample rate for audio capture (16kHz for speech)
pub const SAMPLE_RATE: u32 = 16000;

/// A microphone the speech input can switch on and drain
pub trait AudioSource {
    /// Start delivering audio; a no-op while already running
    ///
    /// # Errors
    ///
    /// Returns error if the device refuses to start
    fn start(&mut self) -> Result<()>;

    /// Stop delivering audio and release the device
    fn stop(&mut self);

    /// Mono [`SAMPLE_RATE`] samples captured since the last call
    ///
    /// # Errors
    ///
    /// Returns error if the captured audio could not be converted
    fn take_buffer(&mut self) -> Result<Vec<f32>>;

    /// Discard anything captured so far
    fn clear_buffer(&mut self);
}

/// Captures mono 16kHz audio from the default input device
///
/// Devices that cannot record at 16kHz are opened at their own rate. The
/// callback only downmixes; rate conversion happens when the buffer is taken.
pub struct AudioCapture {
    device: Device,
    config: StreamConfig,
    buffer: Arc<Mutex<Vec<f32>>>,
    converter: Option<RateConverter>,
    stream: Option<Stream>,
}

impl AudioCapture {
    /// Create a new audio capture instance
    ///
    /// # Errors
    ///
    /// Returns error if audio device cannot be opened
    pub fn new() -> Result<Self> {
        let host = cpal::default_host();

        let device = host
            .default_input_device()
            .ok_or_else(|| Error::Audio("no input device available".to_string()))?;

        let config = pick_input_config(&device)?;
        let device_rate = config.sample_rate.0;
        let converter = if device_rate == SAMPLE_RATE {
            None
        } else {
            Some(RateConverter::new(device_rate, SAMPLE_RATE)?)
        };

        tracing::debug!(
            device = device.name().unwrap_or_default(),
            device_rate,
            channels = config.channels,
            "audio capture initialized"
        );

        Ok(Self {
            device,
            config,
            buffer: Arc::new(Mutex::new(Vec::new())),
            converter,
            stream: None,
        })
    }

    fn drain_raw(&self) -> Vec<f32> {
        self.buffer
            .lock()
            .map(|mut buf| std::mem::take(&mut *buf))
            .unwrap_or_default()
    }
}

impl AudioSource for AudioCapture {
    fn start(&mut self) -> Result<()> {
        if self.stream.is_some() {
            return Ok(());
        }

        let buffer = Arc::clone(&self.buffer);
        let channels = usize::from(self.config.channels.max(1));

        let stream = self
            .device
            .build_input_stream(
                &self.config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    if let Ok(mut buf) = buffer.lock() {
                        downmix(data, channels, &mut buf);
                    }
                },
                |err| {
                    tracing::error!(error = %err, "audio capture error");
                },
                None,
            )
            .map_err(|e| Error::Audio(e.to_string()))?;

        stream.play().map_err(|e| Error::Audio(e.to_string()))?;
        self.stream = Some(stream);

        tracing::debug!("audio capture started");
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(stream) = self.stream.take() {
            drop(stream);
            tracing::debug!("audio capture stopped");
        }
    }

    fn take_buffer(&mut self) -> Result<Vec<f32>> {
        let raw = self.drain_raw();
        match self.converter.as_mut() {
            Some(converter) => converter.push(&raw),
            None => Ok(raw),
        }
    }

    fn clear_buffer(&mut self) {
        drop(self.drain_raw());
        if let Some(converter) = self.converter.as_mut() {
            converter.reset();
        }
    }
}

/// Choose an f32 input config, preferring mono at 16kHz
fn pick_input_config(device: &Device) -> Result<StreamConfig> {
    let configs: Vec<SupportedStreamConfigRange> = device
        .supported_input_configs()
        .map_err(|e| Error::Audio(e.to_string()))?
        .filter(|c| c.sample_format() == SampleFormat::F32)
        .collect();

    let supports_rate = |c: &&SupportedStreamConfigRange| {
        c.min_sample_rate() <= SampleRate(SAMPLE_RATE)
            && c.max_sample_rate() >= SampleRate(SAMPLE_RATE)
    };

    if let Some(c) = configs
        .iter()
        .filter(supports_rate)
        .min_by_key(|c| c.channels())
    {
        return Ok(c.clone().with_sample_rate(SampleRate(SAMPLE_RATE)).config());
    }

    // Fallback: highest rate the device offers, converted on take
    configs
        .iter()
        .filter(|c| c.max_sample_rate() >= SampleRate(SAMPLE_RATE))
        .min_by_key(|c| c.channels())
        .map(|c| c.clone().with_max_sample_rate().config())
        .ok_or_else(|| Error::Audio("no suitable audio config found".to_string()))
}

/// Average interleaved frames into mono
#[allow(clippy::cast_precision_loss)]
fn downmix(data: &[f32], channels: usize, out: &mut Vec<f32>) {
    if channels == 1 {
        out.extend_from_slice(data);
        return;
    }
    out.extend(
        data.chunks(channels)
            .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32),
    );
}

/// Convert f32 samples to WAV bytes for STT APIs
///
/// # Errors
///
/// Returns error if WAV encoding fails
pub fn samples_to_wav(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = std::io::Cursor::new(Vec::new());
    {
        let mut writer =
            hound::WavWriter::new(&mut cursor, spec).map_err(|e| Error::Audio(e.to_string()))?;

        for &sample in samples {
            // Convert f32 [-1.0, 1.0] to i16
            #[allow(clippy::cast_possible_truncation)]
            let sample_i16 = (sample * 32767.0).clamp(-32768.0, 32767.0) as i16;
            writer
                .write_sample(sample_i16)
                .map_err(|e| Error::Audio(e.to_string()))?;
        }

        writer.finalize().map_err(|e| Error::Audio(e.to_string()))?;
    }

    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_downmix_stereo() {
        let mut out = Vec::new();
        downmix(&[0.2, 0.4, -1.0, 1.0], 2, &mut out);
        assert_eq!(out.len(), 2);
        assert!((out[0] - 0.3).abs() < 1e-6);
        assert!(out[1].abs() < 1e-6);
    }
}
