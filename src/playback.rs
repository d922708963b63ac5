// src/playback.rs
//! Raw sample playback buffers
//!
//! The waveform player takes paired AC and DC sample arrays by address; the
//! vendor library never copies them, so the backing storage must stay alive
//! for the whole playback. The session retains the marshalled buffers until
//! `stop()` or `disconnect()` to keep that hazard out of the caller's hands.

use std::fs;
use std::path::Path;

use crate::error::{AecgError, AecgResult};

/// Paired AC/DC sample sequences for the waveform player.
#[derive(Debug, Clone, PartialEq)]
pub struct RawPlayback {
    /// Sampling frequency of the buffers in Hz.
    pub sample_rate: f64,
    /// AC samples in mV.
    pub ac: Vec<f64>,
    /// DC samples in mV; must match `ac` in length.
    pub dc: Vec<f64>,
}

impl RawPlayback {
    /// Build a playback buffer, rejecting mismatched sequence lengths before
    /// anything reaches the native call.
    pub fn new(sample_rate: f64, ac: Vec<f64>, dc: Vec<f64>) -> AecgResult<Self> {
        let playback = Self { sample_rate, ac, dc };
        playback.validate()?;
        Ok(playback)
    }

    /// Check internal consistency; called again by the facades right before
    /// marshalling.
    pub fn validate(&self) -> AecgResult<()> {
        if self.ac.len() != self.dc.len() {
            return Err(AecgError::InvalidArgument(format!(
                "the number of AC and DC samples is not equal ({} vs {})",
                self.ac.len(),
                self.dc.len()
            )));
        }
        if self.ac.is_empty() {
            return Err(AecgError::InvalidArgument(
                "playback buffer is empty".into(),
            ));
        }
        Ok(())
    }

    /// Number of sample points.
    pub fn len(&self) -> usize {
        self.ac.len()
    }

    /// Whether the buffer holds no samples.
    pub fn is_empty(&self) -> bool {
        self.ac.is_empty()
    }

    /// Load the vendor sample-data text format: line 0 is the sample rate,
    /// line 1 the point count, and AC samples start at line 4 (lines 2 and 3
    /// are header filler). DC samples are zeroed, matching the demo scripts.
    pub fn from_text_file(path: impl AsRef<Path>) -> AecgResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let mut lines = content.lines();

        let sample_rate: f64 = lines
            .next()
            .ok_or_else(|| bad_file(path, "missing sample rate line"))?
            .trim()
            .parse()
            .map_err(|_| bad_file(path, "sample rate is not a number"))?;
        let size: usize = lines
            .next()
            .ok_or_else(|| bad_file(path, "missing size line"))?
            .trim()
            .parse()
            .map_err(|_| bad_file(path, "size is not a number"))?;

        let ac: Vec<f64> = lines
            .skip(2)
            .take(size)
            .map(|line| {
                line.trim()
                    .parse()
                    .map_err(|_| bad_file(path, "sample is not a number"))
            })
            .collect::<AecgResult<_>>()?;
        if ac.len() != size {
            return Err(bad_file(
                path,
                &format!("expected {size} samples, found {}", ac.len()),
            ));
        }

        let dc = vec![0.0; size];
        Self::new(sample_rate, ac, dc)
    }
}

fn bad_file(path: &Path, reason: &str) -> AecgError {
    AecgError::InvalidArgument(format!("sample file {}: {reason}", path.display()))
}
