// src/session/pwtt.rs
//! PWTT module facade

use tracing::debug;

use crate::error::{AecgError, AecgResult};
use crate::session::Session;
use crate::waveform::{EcgWaveformConfig, PpgWaveformConfig};

/// PWTT operations: composed ECG and PPG output with a configurable
/// pulse-transit-time offset between the two waveforms.
pub struct PwttCommands<'a> {
    session: &'a Session,
}

impl<'a> PwttCommands<'a> {
    pub(crate) fn new(session: &'a Session) -> Self {
        Self { session }
    }

    /// Output ECG and PPG together, with the PPG peak delayed by
    /// `ptt_peak_ms` milliseconds relative to the R wave.
    pub fn play(
        &self,
        ptt_peak_ms: i32,
        ecg: &EcgWaveformConfig,
        ppg: &PpgWaveformConfig,
    ) -> AecgResult<()> {
        if ptt_peak_ms < 0 {
            return Err(AecgError::InvalidArgument(
                "pulse transit time must not be negative".into(),
            ));
        }
        let _inner = self.session.lock_connected()?;
        let ecg_raw = ecg.to_raw();
        let ppg_raw = ppg.to_raw();
        debug!(ptt_peak_ms, "output PWTT waveform");
        self.session
            .api()
            .output_ecg_and_ppg(ptt_peak_ms, &ecg_raw, &ppg_raw, None, None);
        Ok(())
    }
}
