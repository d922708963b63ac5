// src/session/mod.rs
//! Device session lifecycle and connection management
//!
//! One [`Session`] exclusively owns one native device handle. All native
//! access funnels through a single mutex-guarded path because the vendor
//! library documents no thread-safety of its own; the state machine is
//! `Disconnected -> Connecting -> Connected -> Disconnected`, and no module
//! operation runs outside `Connected`.

mod ecg;
mod ppg;
mod pwtt;

#[cfg(test)]
mod tests;

pub use ecg::EcgCommands;
pub use ppg::PpgCommands;
pub use pwtt::PwttCommands;

use std::fmt;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::{Mutex, MutexGuard};
use tracing::{debug, info, warn};

use crate::bridge;
use crate::config::ClientConfig;
use crate::error::{AecgError, AecgResult};
use crate::ffi::library::{NativeApi, VendorLibrary};
use crate::ffi::types::{
    decode_ascii, HwInformation, ModelInformation, PlayRawDataRaw,
};
use crate::playback::RawPlayback;
use crate::waveform::{LedType, SyncPulse};

/// Fixed wait after freeing the native handle. The vendor library cannot
/// signal disconnect completion, and an immediate reconnect races against
/// its internal teardown; one second has proven sufficient on hardware.
pub const SETTLE_DELAY: Duration = Duration::from_secs(1);

/// Connection lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No native handle is held.
    Disconnected,
    /// Handshake in flight; only observable with the callback-style connect.
    Connecting,
    /// Device is connected and module operations are allowed.
    Connected,
}

/// Serial number plus firmware/hardware versions of one module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleInfo {
    /// Module serial number.
    pub serial: String,
    /// Firmware version, `main.sub`.
    pub firmware: String,
    /// Hardware version, `pcb.hw`.
    pub hardware: String,
}

/// Decoded model identity of one module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    /// Two-character product code.
    pub product_name: String,
    /// Hardware generation.
    pub generation_number: u8,
    /// Model number within the generation.
    pub model_number: u8,
    /// Device serial number.
    pub serial_number: i32,
    /// Production year code.
    pub year: i32,
    /// LED emitter per PPG channel.
    pub led_types: [LedType; 3],
}

impl DeviceInfo {
    fn from_raw(raw: &ModelInformation) -> Self {
        Self {
            product_name: decode_ascii(&raw.product_name),
            generation_number: raw.generation_number,
            model_number: raw.model_number,
            serial_number: raw.serial_number,
            year: raw.year,
            led_types: [
                LedType::from(raw.led_type_1),
                LedType::from(raw.led_type_2),
                LedType::from(raw.led_type_3),
            ],
        }
    }

    /// Full serial string in the vendor's documented format.
    pub fn formatted_serial(&self) -> String {
        format!(
            "W{}{:02x}{:02x}-{:02}{:04}",
            self.product_name,
            self.generation_number,
            self.model_number,
            self.year,
            self.serial_number,
        )
    }
}

pub(crate) struct RetainedBuffers {
    ac: Vec<f64>,
    dc: Vec<f64>,
}

pub(crate) struct SessionInner {
    state: ConnectionState,
    // Playback samples are passed to the vendor library by address only.
    // Every buffer handed out since the last stop() or disconnect() stays
    // alive here; the ECG and PPG players may each be reading one.
    retained: Vec<RetainedBuffers>,
}

impl SessionInner {
    /// Clone the playback buffers into session-owned storage and build the
    /// native descriptor over the stable addresses.
    pub(crate) fn retain_playback(
        &mut self,
        playback: &RawPlayback,
        sync_pulse: SyncPulse,
    ) -> PlayRawDataRaw {
        let buffers = RetainedBuffers {
            ac: playback.ac.clone(),
            dc: playback.dc.clone(),
        };
        let raw = PlayRawDataRaw {
            sample_rate: playback.sample_rate,
            size: buffers.ac.len() as i32,
            sync_pulse: sync_pulse as i32,
            ac: buffers.ac.as_ptr(),
            dc: buffers.dc.as_ptr(),
            cb: None,
        };
        // The heap storage behind the descriptor addresses does not move
        // when the owning Vec is pushed.
        self.retained.push(buffers);
        raw
    }
}

/// Client session over one AECG100 device.
pub struct Session {
    api: Arc<dyn NativeApi>,
    inner: Mutex<SessionInner>,
    connect_timeout: Duration,
    port: Option<u32>,
    sampling_window: usize,
}

impl Session {
    /// Load the vendor library named by `config` and build a disconnected
    /// session. A load failure is fatal; no retry is attempted.
    pub fn open(config: &ClientConfig) -> AecgResult<Self> {
        config.validate()?;
        let api: Arc<dyn NativeApi> = Arc::new(VendorLibrary::load(&config.library_path)?);
        Ok(Self::with_api(api, config))
    }

    pub(crate) fn with_api(api: Arc<dyn NativeApi>, config: &ClientConfig) -> Self {
        Self {
            api,
            inner: Mutex::new(SessionInner {
                state: ConnectionState::Disconnected,
                retained: Vec::new(),
            }),
            connect_timeout: Duration::from_millis(config.connect_timeout_ms),
            port: config.port,
            sampling_window: config.sampling_window,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ConnectionState {
        self.inner.lock().state
    }

    /// Whether the session is in the `Connected` state.
    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    pub(crate) fn api(&self) -> &Arc<dyn NativeApi> {
        &self.api
    }

    pub(crate) fn sampling_window(&self) -> usize {
        self.sampling_window
    }

    /// Lock the session, requiring the `Connected` state. Module operations
    /// hold the returned guard across their native call so overlapping calls
    /// from other threads serialize here.
    pub(crate) fn lock_connected(&self) -> AecgResult<MutexGuard<'_, SessionInner>> {
        let inner = self.inner.lock();
        if inner.state != ConnectionState::Connected {
            return Err(AecgError::NotConnected);
        }
        Ok(inner)
    }

    /// Connect using the callback-style handshake with the configured
    /// timeout.
    pub fn connect(&self) -> AecgResult<()> {
        self.connect_with_timeout(self.connect_timeout)
    }

    /// Connect using the callback-style handshake: register the connection
    /// trampoline, invoke the native init, and block until the native side
    /// signals or `timeout` elapses.
    ///
    /// Already connected is an idempotent no-op. On every failure path the
    /// native handle is freed before the error is returned.
    pub fn connect_with_timeout(&self, timeout: Duration) -> AecgResult<()> {
        let mut inner = self.inner.lock();
        if inner.state == ConnectionState::Connected {
            warn!("device is already connected");
            return Ok(());
        }

        inner.state = ConnectionState::Connecting;
        let signal = bridge::register_connection();

        if !self.api.init(bridge::connection_trampoline) {
            bridge::clear_connection();
            self.api.free();
            inner.state = ConnectionState::Disconnected;
            return Err(AecgError::ConnectionFailed);
        }

        let result = match signal.recv_timeout(timeout) {
            Ok(true) => Ok(()),
            Ok(false) => Err(AecgError::ConnectionFailed),
            Err(_) => Err(AecgError::Timeout {
                timeout_ms: timeout.as_millis() as u64,
            }),
        };
        bridge::clear_connection();

        match result {
            Ok(()) => {
                inner.state = ConnectionState::Connected;
                info!("device connected");
                Ok(())
            }
            Err(err) => {
                self.api.free();
                inner.state = ConnectionState::Disconnected;
                Err(err)
            }
        }
    }

    /// Connect using the polling-style entry point with the configured port
    /// and timeout. Fails with [`AecgError::Unsupported`] when the loaded
    /// vendor binary does not export it.
    pub fn connect_via_port(&self) -> AecgResult<()> {
        let mut inner = self.inner.lock();
        if inner.state == ConnectionState::Connected {
            warn!("device is already connected");
            return Ok(());
        }
        if !self.api.supports_port_connect() {
            return Err(AecgError::Unsupported("WTQConnect"));
        }

        inner.state = ConnectionState::Connecting;
        // u32::MAX selects the port automatically, per the vendor header.
        let port = self.port.unwrap_or(u32::MAX);
        let timeout_ms = self.connect_timeout.as_millis() as u32;
        if self.api.connect(port, timeout_ms) {
            inner.state = ConnectionState::Connected;
            info!(port, "device connected");
            Ok(())
        } else {
            self.api.free();
            inner.state = ConnectionState::Disconnected;
            // The polling connect reports false exactly when the timeout
            // elapsed without a device.
            Err(AecgError::Timeout {
                timeout_ms: u64::from(timeout_ms),
            })
        }
    }

    /// Stop output, free the native handle, and hold the settling delay.
    ///
    /// Not connected is an idempotent no-op with a warning. The settling
    /// delay is not cancellable; operations attempted during it fail with
    /// [`AecgError::NotConnected`] once they acquire the session lock.
    pub fn disconnect(&self) -> AecgResult<()> {
        let mut inner = self.inner.lock();
        if inner.state != ConnectionState::Connected {
            warn!("device is not connected");
            return Ok(());
        }

        self.api.stop_output();
        inner.retained.clear();
        self.api.free();
        thread::sleep(SETTLE_DELAY);
        inner.state = ConnectionState::Disconnected;
        info!("device disconnected");
        Ok(())
    }

    /// Stop any active waveform output and release retained playback
    /// buffers. Fails with [`AecgError::NotConnected`] outside `Connected`.
    pub fn stop(&self) -> AecgResult<()> {
        let mut inner = self.lock_connected()?;
        self.api.stop_output();
        inner.retained.clear();
        info!("output waveform stopped");
        Ok(())
    }

    /// Main-module serial number and versions.
    pub fn module_info(&self) -> AecgResult<ModuleInfo> {
        let _inner = self.lock_connected()?;
        let mut raw = HwInformation::default();
        if !self.api.hw_information(&mut raw) {
            debug!("hw information query reported failure");
        }
        Ok(ModuleInfo {
            serial: self.api.serial_number().unwrap_or_default(),
            firmware: format!("{}.{}", raw.fw_main_version, raw.fw_sub_version),
            hardware: format!("{}.{}", raw.pcb_version, raw.hw_version),
        })
    }

    /// PPG-module serial number and versions.
    pub fn ppg_module_info(&self) -> AecgResult<ModuleInfo> {
        let _inner = self.lock_connected()?;
        let mut raw = HwInformation::default();
        if !self.api.ppg_hw_information(&mut raw) {
            debug!("ppg hw information query reported failure");
        }
        Ok(ModuleInfo {
            serial: self.api.ppg_serial_number().unwrap_or_default(),
            firmware: format!("{}.{}", raw.fw_main_version, raw.fw_sub_version),
            hardware: format!("{}.{}", raw.pcb_version, raw.hw_version),
        })
    }

    /// Main-module model identity.
    pub fn device_info(&self) -> AecgResult<DeviceInfo> {
        let _inner = self.lock_connected()?;
        let mut raw = ModelInformation::default();
        if !self.api.device_information(&mut raw) {
            debug!("device information query reported failure");
        }
        Ok(DeviceInfo::from_raw(&raw))
    }

    /// PPG-module model identity.
    pub fn ppg_device_info(&self) -> AecgResult<DeviceInfo> {
        let _inner = self.lock_connected()?;
        let mut raw = ModelInformation::default();
        if !self.api.ppg_device_information(&mut raw) {
            debug!("ppg device information query reported failure");
        }
        Ok(DeviceInfo::from_raw(&raw))
    }

    /// ECG operations.
    pub fn ecg(&self) -> EcgCommands<'_> {
        EcgCommands::new(self)
    }

    /// PPG operations.
    pub fn ppg(&self) -> PpgCommands<'_> {
        PpgCommands::new(self)
    }

    /// PWTT (composed ECG + PPG) operations.
    pub fn pwtt(&self) -> PwttCommands<'_> {
        PwttCommands::new(self)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("state", &self.state())
            .field("connect_timeout", &self.connect_timeout)
            .field("port", &self.port)
            .field("sampling_window", &self.sampling_window)
            .finish_non_exhaustive()
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        // Best-effort teardown so a dropped session never leaks the native
        // handle; errors cannot propagate out of drop.
        let _ = self.disconnect();
    }
}
