// src/session/ppg.rs
//! PPG module facade

use std::sync::Arc;

use tracing::debug;

use crate::bridge;
use crate::error::{AecgError, AecgResult};
use crate::playback::RawPlayback;
use crate::sampling::SamplingHandle;
use crate::session::ecg::validate_scan;
use crate::session::Session;
use crate::waveform::{
    PpgChannel, PpgFrequencyScan, PpgWaveformConfig, SamplingMode, SyncPulse,
};

/// PPG operations scoped to one connected session.
pub struct PpgCommands<'a> {
    session: &'a Session,
}

impl<'a> PpgCommands<'a> {
    pub(crate) fn new(session: &'a Session) -> Self {
        Self { session }
    }

    /// Output PPG waveforms on one, two or three channels. The vendor ABI
    /// has a distinct entry point per arity; exactly these three counts are
    /// supported.
    pub fn play_waveform(
        &self,
        waveforms: &[(PpgChannel, PpgWaveformConfig)],
    ) -> AecgResult<()> {
        if waveforms.is_empty() || waveforms.len() > 3 {
            return Err(AecgError::InvalidArgument(
                "the PPG supports at most 3 channels".into(),
            ));
        }

        let _inner = self.session.lock_connected()?;
        let api = self.session.api();
        debug!(channels = waveforms.len(), "output PPG waveform");
        match waveforms {
            [(channel, config)] => {
                api.output_ppg(*channel as i32, &config.to_raw(), None);
            }
            [(_, first), (_, second)] => {
                api.output_ppg2(&first.to_raw(), &second.to_raw(), None, None);
            }
            [(_, first), (_, second), (_, third)] => {
                api.output_ppg3(
                    &first.to_raw(),
                    &second.to_raw(),
                    &third.to_raw(),
                    None,
                    None,
                    None,
                );
            }
            _ => unreachable!("arity checked above"),
        }
        Ok(())
    }

    /// Play a raw AC/DC sample buffer on one channel.
    ///
    /// Same loop-flag and buffer-retention behaviour as
    /// [`EcgCommands::play_raw`](crate::session::EcgCommands::play_raw).
    pub fn play_raw(
        &self,
        channel: PpgChannel,
        playback: &RawPlayback,
        sync_pulse: SyncPulse,
        looped: bool,
    ) -> AecgResult<()> {
        playback.validate()?;
        let mut inner = self.session.lock_connected()?;
        let raw = inner.retain_playback(playback, sync_pulse);
        debug!(
            channel = channel as i32,
            samples = playback.len(),
            looped,
            "play raw PPG buffer"
        );
        self.session.api().waveform_player_loop(looped);
        self.session
            .api()
            .waveform_player_output_ppg(channel as i32, &raw);
        Ok(())
    }

    /// Sweep the output frequency on one channel.
    pub fn scan_frequency(
        &self,
        channel: PpgChannel,
        scan: &PpgFrequencyScan,
    ) -> AecgResult<()> {
        validate_scan(scan.frequency_start, scan.frequency_finish, scan.duration)?;
        let _inner = self.session.lock_connected()?;
        let raw = scan.to_raw();
        debug!(
            start = scan.frequency_start,
            finish = scan.frequency_finish,
            "output PPG frequency scan"
        );
        self.session
            .api()
            .output_frequency_scan_ppg(channel as i32, &raw, None);
        Ok(())
    }

    /// Start PD/switch sampling on the selected source.
    ///
    /// Averaged readings and asynchronous device errors arrive on the
    /// returned handle's event channel; only one sampling stream may be
    /// active per process.
    pub fn start_sampling(&self, mode: SamplingMode) -> AecgResult<SamplingHandle> {
        let _inner = self.session.lock_connected()?;
        let raw_rx = bridge::register_sampling().ok_or_else(|| {
            AecgError::InvalidArgument("sampling is already active".into())
        })?;

        let api = Arc::clone(self.session.api());
        let handle =
            match SamplingHandle::spawn(Arc::clone(&api), raw_rx, self.session.sampling_window()) {
                Ok(handle) => handle,
                Err(err) => {
                    bridge::clear_sampling();
                    return Err(err);
                }
            };
        api.enable_sampling(mode as i32, bridge::sampling_trampoline);
        api.start_sampling(bridge::sampling_error_trampoline);
        debug!(?mode, "sampling started");
        Ok(handle)
    }
}
