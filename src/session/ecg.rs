// src/session/ecg.rs
//! ECG module facade

use tracing::debug;

use crate::error::{AecgError, AecgResult};
use crate::playback::RawPlayback;
use crate::session::Session;
use crate::waveform::{EcgFrequencyScan, EcgWaveformConfig, SyncPulse};

/// ECG operations scoped to one connected session.
pub struct EcgCommands<'a> {
    session: &'a Session,
}

impl<'a> EcgCommands<'a> {
    pub(crate) fn new(session: &'a Session) -> Self {
        Self { session }
    }

    /// Output a synthesized ECG waveform. Runs until [`Session::stop`].
    pub fn play_waveform(&self, config: &EcgWaveformConfig) -> AecgResult<()> {
        let _inner = self.session.lock_connected()?;
        let raw = config.to_raw();
        debug!(frequency = config.frequency, "output ECG waveform");
        self.session.api().output_ecg(&raw, None);
        Ok(())
    }

    /// Play a raw AC/DC sample buffer through the waveform player.
    ///
    /// The loop flag is process-wide native state; it is set explicitly on
    /// every call and the call is serialized through the session lock. The
    /// sample buffers are retained by the session until `stop()` or
    /// `disconnect()` because the vendor library holds only their addresses.
    pub fn play_raw(&self, playback: &RawPlayback, looped: bool) -> AecgResult<()> {
        playback.validate()?;
        let mut inner = self.session.lock_connected()?;
        // ECG raw data carries no sync pulse; the field stays zeroed.
        let raw = inner.retain_playback(playback, SyncPulse::LedOff);
        debug!(
            samples = playback.len(),
            sample_rate = playback.sample_rate,
            looped,
            "play raw ECG buffer"
        );
        self.session.api().waveform_player_loop(looped);
        self.session.api().waveform_player_output_ecg(&raw);
        Ok(())
    }

    /// Sweep the output frequency across the configured range.
    pub fn scan_frequency(&self, scan: &EcgFrequencyScan) -> AecgResult<()> {
        validate_scan(scan.frequency_start, scan.frequency_finish, scan.duration)?;
        let _inner = self.session.lock_connected()?;
        let raw = scan.to_raw();
        debug!(
            start = scan.frequency_start,
            finish = scan.frequency_finish,
            "output ECG frequency scan"
        );
        self.session.api().output_frequency_scan(&raw, None);
        Ok(())
    }

    /// Set the ECG DC offset; the fixed-offset outputs accept 300, 0 or
    /// -300 mV.
    pub fn set_dc_offset(&self, millivolts: i32) -> AecgResult<()> {
        let _inner = self.session.lock_connected()?;
        debug!(millivolts, "set ECG DC offset");
        self.session.api().set_dc_offset(millivolts);
        Ok(())
    }
}

pub(crate) fn validate_scan(start: f64, finish: f64, duration: i32) -> AecgResult<()> {
    if duration <= 0 {
        return Err(AecgError::InvalidArgument(
            "scan duration must be greater than 0".into(),
        ));
    }
    if start <= 0.0 || finish < start {
        return Err(AecgError::InvalidArgument(
            "scan frequency range must be positive and ascending".into(),
        ));
    }
    Ok(())
}
