//! Sample rate conversion
//!
//! Wraps rubato's FFT resampler, which low-pass filters before changing rate
//! so content above the target Nyquist frequency is removed instead of
//! folding back into the audible band.

use rubato::{FftFixedIn, Resampler};

use crate::{Error, Result};

/// Input frames per resampler block
const CHUNK_SIZE: usize = 1024;

/// FFT sub-chunks per block
const SUB_CHUNKS: usize = 2;

/// Streaming mono rate converter
///
/// Input arrives in arbitrary slices; whole blocks are converted as soon as
/// they are available and the remainder waits for the next push.
pub struct RateConverter {
    inner: FftFixedIn<f32>,
    pending: Vec<f32>,
}

impl RateConverter {
    /// # Errors
    ///
    /// Returns error if rubato rejects the rate pair
    #[allow(clippy::cast_possible_truncation)]
    pub fn new(from_rate: u32, to_rate: u32) -> Result<Self> {
        let inner = FftFixedIn::<f32>::new(
            from_rate as usize,
            to_rate as usize,
            CHUNK_SIZE,
            SUB_CHUNKS,
            1,
        )
        .map_err(|e| Error::Audio(format!("resampler init failed: {e}")))?;

        Ok(Self {
            inner,
            pending: Vec::new(),
        })
    }

    /// Convert every complete block buffered so far
    ///
    /// # Errors
    ///
    /// Returns error if rubato fails on a block
    pub fn push(&mut self, input: &[f32]) -> Result<Vec<f32>> {
        self.pending.extend_from_slice(input);

        let block = self.inner.input_frames_next();
        let mut output = Vec::new();
        let mut consumed = 0;

        while self.pending.len() - consumed >= block {
            let chunk = &self.pending[consumed..consumed + block];
            let converted = self
                .inner
                .process(&[chunk], None)
                .map_err(|e| Error::Audio(format!("resample failed: {e}")))?;
            output.extend(converted.into_iter().next().unwrap_or_default());
            consumed += block;
        }

        self.pending.drain(..consumed);
        Ok(output)
    }

    /// Convert the buffered remainder, padded with silence to a full block
    ///
    /// # Errors
    ///
    /// Returns error if rubato fails on the block
    pub fn finish(&mut self) -> Result<Vec<f32>> {
        if self.pending.is_empty() {
            return Ok(Vec::new());
        }

        let block = self.inner.input_frames_next();
        let padding = block - self.pending.len() % block;
        self.pending.resize(self.pending.len() + padding, 0.0);
        self.push(&[])
    }

    /// Drop buffered input and filter state
    pub fn reset(&mut self) {
        self.pending.clear();
        self.inner.reset();
    }
}

/// Convert a whole clip from `from_rate` to `to_rate`
///
/// The output is trimmed to the clip's duration at the new rate.
///
/// # Errors
///
/// Returns error if resampling fails
pub fn resample(samples: &[f32], from_rate: u32, to_rate: u32) -> Result<Vec<f32>> {
    if from_rate == to_rate || samples.is_empty() {
        return Ok(samples.to_vec());
    }

    let mut converter = RateConverter::new(from_rate, to_rate)?;
    let mut output = converter.push(samples)?;
    output.extend(converter.finish()?);
    output.truncate(converted_len(samples.len(), from_rate, to_rate));

    tracing::trace!(
        from_rate,
        to_rate,
        input = samples.len(),
        output = output.len(),
        "resampled"
    );
    Ok(output)
}

/// Number of samples `len` input samples occupy at the new rate
fn converted_len(len: usize, from_rate: u32, to_rate: u32) -> usize {
    let len = len as u64 * u64::from(to_rate) / u64::from(from_rate.max(1));
    usize::try_from(len).unwrap_or(usize::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_converted_len() {
        assert_eq!(converted_len(48_000, 48_000, 16_000), 16_000);
        assert_eq!(converted_len(800, 16_000, 48_000), 2400);
        assert_eq!(converted_len(0, 44_100, 16_000), 0);
    }

    #[test]
    fn test_same_rate_is_untouched() {
        let samples = vec![0.1, -0.2, 0.3];
        assert_eq!(resample(&samples, 16_000, 16_000).unwrap(), samples);
    }

    #[test]
    fn test_resample_length_matches_duration() {
        let samples = vec![0.0; 22_050];
        let out = resample(&samples, 22_050, 48_000).unwrap();
        assert_eq!(out.len(), 48_000);
    }

    #[test]
    fn test_streaming_holds_back_partial_blocks() {
        let mut converter = RateConverter::new(48_000, 16_000).unwrap();

        // Too short for a block: nothing yet, but nothing lost either
        assert!(converter.push(&[0.0; 100]).unwrap().is_empty());

        let flushed = converter.finish().unwrap();
        assert!(!flushed.is_empty());
        assert!(converter.finish().unwrap().is_empty());
    }

    #[test]
    fn test_reset_discards_pending_input() {
        let mut converter = RateConverter::new(48_000, 16_000).unwrap();
        converter.push(&[0.5; 100]).unwrap();
        converter.reset();
        assert!(converter.finish().unwrap().is_empty());
    }
}
