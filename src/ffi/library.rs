// src/ffi/library.rs
//! Vendor library loading and entry-point binding
//!
//! The AECG100 SDK ships as four platform-specific shared objects. This
//! module resolves the right filename, loads the binary with `libloading`,
//! and binds every exported entry point up front so a missing symbol fails
//! the load instead of a later call. The `NativeApi` trait is the seam that
//! lets the session layer run against a test double instead of real hardware.

use std::os::raw::c_char;
use std::path::Path;

use libloading::Library;
use tracing::debug;

use crate::error::{AecgError, AecgResult};
use crate::ffi::types::{
    ConnectedCallback, EcgWaveformRaw, FrequencyScan2Raw, FrequencyScanRaw, HwInformation,
    ModelInformation, OutputSignalCallback, PlayRawDataRaw, PpgWaveformRaw, SamplingCallback,
    SamplingErrorCallback,
};

/// Shared-object filename for a machine architecture.
///
/// The mapping is total: unknown architectures fall back to the 32-bit x86
/// build, matching the vendor's own loader scripts.
pub fn vendor_library_name(arch: &str) -> &'static str {
    match arch {
        "aarch64" => "libaecgrpix64.so",
        "arm" => "libaecgrpix86.so",
        "x86_64" => "libaecgx64.so",
        _ => "libaecgx86.so",
    }
}

/// Shared-object filename for the running process.
pub fn default_library_name() -> &'static str {
    vendor_library_name(std::env::consts::ARCH)
}

/// Every entry point the client uses, in vendor ABI terms.
///
/// `VendorLibrary` implements this over the loaded shared object; tests
/// implement it with recording fakes. All methods take `&self` because the
/// vendor handle is process-global; serialization is the session's job.
pub trait NativeApi: Send + Sync {
    /// Initialize the library and register the connection callback.
    fn init(&self, cb: ConnectedCallback) -> bool;
    /// Whether the loaded binary exports the polling-style connect.
    fn supports_port_connect(&self) -> bool;
    /// Polling-style connect; `port` of `u32::MAX` selects automatically.
    fn connect(&self, port: u32, timeout_ms: u32) -> bool;
    /// Release the native handle and library resources.
    fn free(&self);
    /// Stop any active waveform output.
    fn stop_output(&self);

    /// Read main-module firmware/hardware versions.
    fn hw_information(&self, out: &mut HwInformation) -> bool;
    /// Read PPG-module firmware/hardware versions.
    fn ppg_hw_information(&self, out: &mut HwInformation) -> bool;
    /// Read main-module model identity.
    fn device_information(&self, out: &mut ModelInformation) -> bool;
    /// Read PPG-module model identity.
    fn ppg_device_information(&self, out: &mut ModelInformation) -> bool;
    /// Main-module serial number.
    fn serial_number(&self) -> Option<String>;
    /// PPG-module serial number.
    fn ppg_serial_number(&self) -> Option<String>;

    /// Output an ECG waveform.
    fn output_ecg(&self, waveform: &EcgWaveformRaw, cb: Option<OutputSignalCallback>);
    /// Output a PPG waveform on one channel.
    fn output_ppg(&self, channel: i32, waveform: &PpgWaveformRaw, cb: Option<OutputSignalCallback>);
    /// Output PPG waveforms on channels 1 and 2.
    fn output_ppg2(
        &self,
        first: &PpgWaveformRaw,
        second: &PpgWaveformRaw,
        first_cb: Option<OutputSignalCallback>,
        second_cb: Option<OutputSignalCallback>,
    );
    /// Output PPG waveforms on all three channels.
    #[allow(clippy::too_many_arguments)]
    fn output_ppg3(
        &self,
        first: &PpgWaveformRaw,
        second: &PpgWaveformRaw,
        third: &PpgWaveformRaw,
        first_cb: Option<OutputSignalCallback>,
        second_cb: Option<OutputSignalCallback>,
        third_cb: Option<OutputSignalCallback>,
    );
    /// Output composed ECG and PPG waveforms (PWTT mode).
    fn output_ecg_and_ppg(
        &self,
        ptt_peak_ms: i32,
        ecg: &EcgWaveformRaw,
        ppg: &PpgWaveformRaw,
        ecg_cb: Option<OutputSignalCallback>,
        ppg_cb: Option<OutputSignalCallback>,
    );
    /// Run an ECG frequency scan.
    fn output_frequency_scan(&self, scan: &FrequencyScanRaw, cb: Option<OutputSignalCallback>);
    /// Run a PPG frequency scan on one channel.
    fn output_frequency_scan_ppg(
        &self,
        channel: i32,
        scan: &FrequencyScan2Raw,
        cb: Option<OutputSignalCallback>,
    );
    /// Set the ECG DC offset in millivolts.
    fn set_dc_offset(&self, millivolts: i32);

    /// Set the process-wide waveform player loop flag.
    fn waveform_player_loop(&self, enabled: bool);
    /// Play a raw ECG sample buffer.
    fn waveform_player_output_ecg(&self, data: &PlayRawDataRaw);
    /// Play a raw PPG sample buffer on one channel.
    fn waveform_player_output_ppg(&self, channel: i32, data: &PlayRawDataRaw);

    /// Select a sampling source and register the data callback.
    fn enable_sampling(&self, mode: i32, cb: SamplingCallback);
    /// Start sampling and register the error callback.
    fn start_sampling(&self, cb: SamplingErrorCallback);
    /// Stop sampling.
    fn disable_sampling(&self);
}

type InitFn = unsafe extern "C" fn(cb: ConnectedCallback) -> bool;
type ConnectFn = unsafe extern "C" fn(port: u32, timeout_ms: u32) -> bool;
type FreeFn = unsafe extern "C" fn();
type StopOutputFn = unsafe extern "C" fn();
type GetHwInformationFn = unsafe extern "C" fn(out: *mut HwInformation) -> bool;
type GetModelInformationFn = unsafe extern "C" fn(out: *mut ModelInformation) -> bool;
type GetSerialNumberFn = unsafe extern "C" fn() -> *const c_char;
type OutputEcgFn =
    unsafe extern "C" fn(waveform: *const EcgWaveformRaw, cb: Option<OutputSignalCallback>);
type OutputPpgFn = unsafe extern "C" fn(
    channel: i32,
    waveform: *const PpgWaveformRaw,
    cb: Option<OutputSignalCallback>,
);
type OutputPpg2Fn = unsafe extern "C" fn(
    first: *const PpgWaveformRaw,
    second: *const PpgWaveformRaw,
    first_cb: Option<OutputSignalCallback>,
    second_cb: Option<OutputSignalCallback>,
);
type OutputPpg3Fn = unsafe extern "C" fn(
    first: *const PpgWaveformRaw,
    second: *const PpgWaveformRaw,
    third: *const PpgWaveformRaw,
    first_cb: Option<OutputSignalCallback>,
    second_cb: Option<OutputSignalCallback>,
    third_cb: Option<OutputSignalCallback>,
);
type OutputEcgAndPpgFn = unsafe extern "C" fn(
    ptt_peak_ms: i32,
    ecg: *const EcgWaveformRaw,
    ppg: *const PpgWaveformRaw,
    ecg_cb: Option<OutputSignalCallback>,
    ppg_cb: Option<OutputSignalCallback>,
);
type OutputFrequencyScanFn =
    unsafe extern "C" fn(scan: *const FrequencyScanRaw, cb: Option<OutputSignalCallback>);
type OutputFrequencyScanPpgFn = unsafe extern "C" fn(
    channel: i32,
    scan: *const FrequencyScan2Raw,
    cb: Option<OutputSignalCallback>,
);
type SetDcOffsetFn = unsafe extern "C" fn(millivolts: i32);
type PlayerLoopFn = unsafe extern "C" fn(enabled: bool);
type PlayerOutputEcgFn = unsafe extern "C" fn(data: *const PlayRawDataRaw);
type PlayerOutputPpgFn = unsafe extern "C" fn(channel: i32, data: *const PlayRawDataRaw);
type EnableSamplingFn = unsafe extern "C" fn(mode: i32, cb: SamplingCallback);
type StartSamplingFn = unsafe extern "C" fn(cb: SamplingErrorCallback);
type DisableSamplingFn = unsafe extern "C" fn();

/// Loaded vendor shared object with every entry point pre-bound.
pub struct VendorLibrary {
    init: InitFn,
    connect: Option<ConnectFn>,
    free: FreeFn,
    stop_output: StopOutputFn,
    get_hw_information: GetHwInformationFn,
    get_ppg_hw_information: GetHwInformationFn,
    get_device_information: GetModelInformationFn,
    get_ppg_device_information: GetModelInformationFn,
    get_serial_number: GetSerialNumberFn,
    get_ppg_serial_number: GetSerialNumberFn,
    output_ecg: OutputEcgFn,
    output_ppg: OutputPpgFn,
    output_ppg2: OutputPpg2Fn,
    output_ppg3: OutputPpg3Fn,
    output_ecg_and_ppg: OutputEcgAndPpgFn,
    output_frequency_scan: OutputFrequencyScanFn,
    output_frequency_scan_ppg: OutputFrequencyScanPpgFn,
    set_dc_offset: SetDcOffsetFn,
    player_loop: PlayerLoopFn,
    player_output_ecg: PlayerOutputEcgFn,
    player_output_ppg: PlayerOutputPpgFn,
    enable_sampling: EnableSamplingFn,
    start_sampling: StartSamplingFn,
    disable_sampling: DisableSamplingFn,
    // Keeps the shared object mapped for as long as the bound pointers live.
    _lib: Library,
}

fn load_error(path: &Path, reason: impl std::fmt::Display) -> AecgError {
    AecgError::Load {
        path: path.display().to_string(),
        reason: reason.to_string(),
    }
}

/// Resolve a required symbol, surfacing its name on failure.
///
/// # Safety
/// `T` must be the exact function pointer type the vendor exports under
/// `name`.
unsafe fn required<T: Copy>(lib: &Library, path: &Path, name: &str) -> AecgResult<T> {
    lib.get::<T>(name.as_bytes())
        .map(|sym| *sym)
        .map_err(|err| load_error(path, format!("missing symbol {name}: {err}")))
}

impl VendorLibrary {
    /// Load the shared object at `path` and bind all required entry points.
    ///
    /// Fails with [`AecgError::Load`] if the path does not resolve or a
    /// required symbol is absent. A load failure is fatal; there is no retry.
    pub fn load(path: impl AsRef<Path>) -> AecgResult<Self> {
        let path = path.as_ref();
        // Safety: the vendor binary has no constructors with side effects
        // beyond its own static initialization.
        let lib = unsafe { Library::new(path) }.map_err(|err| load_error(path, err))?;

        // Safety: each signature matches the declaration in AECG100.h.
        let loaded = unsafe {
            // The polling-style connect is only exported by newer driver
            // builds; its presence is the load-time capability detection.
            let connect = lib.get::<ConnectFn>(b"WTQConnect").map(|sym| *sym).ok();

            Self {
                init: required(&lib, path, "WTQInit")?,
                connect,
                free: required(&lib, path, "WTQFree")?,
                stop_output: required(&lib, path, "WTQStopOutputWaveform")?,
                get_hw_information: required(&lib, path, "WTQGetHWInformation")?,
                get_ppg_hw_information: required(&lib, path, "WTQGetPPGHWInformation")?,
                get_device_information: required(&lib, path, "WTQGetDeviceInformation")?,
                get_ppg_device_information: required(&lib, path, "WTQGetPPGDeviceInformation")?,
                get_serial_number: required(&lib, path, "WTQGetSerialNumber")?,
                get_ppg_serial_number: required(&lib, path, "WTQGetPPGSerialNumber")?,
                output_ecg: required(&lib, path, "WTQOutputECG")?,
                output_ppg: required(&lib, path, "WTQOutputPPG")?,
                output_ppg2: required(&lib, path, "WTQOutputPPGEx")?,
                output_ppg3: required(&lib, path, "WTQOutputPPG3")?,
                output_ecg_and_ppg: required(&lib, path, "WTQOutputECGAndPPG")?,
                output_frequency_scan: required(&lib, path, "WTQOutputFrequencyScan")?,
                output_frequency_scan_ppg: required(&lib, path, "WTQOutputFrequencyScanPPG")?,
                set_dc_offset: required(&lib, path, "WTQDeviceSetDCOffset")?,
                player_loop: required(&lib, path, "WTQWaveformPlayerLoop")?,
                player_output_ecg: required(&lib, path, "WTQWaveformPlayerOutputECG")?,
                player_output_ppg: required(&lib, path, "WTQWaveformPlayerOutputPPG")?,
                enable_sampling: required(&lib, path, "WTQEnableSampling")?,
                start_sampling: required(&lib, path, "WTQStartSampling")?,
                disable_sampling: required(&lib, path, "WTQDisableSampling")?,
                _lib: lib,
            }
        };

        debug!(
            path = %path.display(),
            port_connect = loaded.connect.is_some(),
            "vendor library loaded"
        );
        Ok(loaded)
    }
}

// The bound function pointers are plain addresses into the mapped shared
// object; the vendor handle itself is process-global state guarded by the
// session mutex.
unsafe impl Send for VendorLibrary {}
unsafe impl Sync for VendorLibrary {}

impl std::fmt::Debug for VendorLibrary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VendorLibrary")
            .field("port_connect", &self.connect.is_some())
            .finish_non_exhaustive()
    }
}

impl NativeApi for VendorLibrary {
    fn init(&self, cb: ConnectedCallback) -> bool {
        unsafe { (self.init)(cb) }
    }

    fn supports_port_connect(&self) -> bool {
        self.connect.is_some()
    }

    fn connect(&self, port: u32, timeout_ms: u32) -> bool {
        match self.connect {
            Some(connect) => unsafe { connect(port, timeout_ms) },
            None => false,
        }
    }

    fn free(&self) {
        unsafe { (self.free)() }
    }

    fn stop_output(&self) {
        unsafe { (self.stop_output)() }
    }

    fn hw_information(&self, out: &mut HwInformation) -> bool {
        unsafe { (self.get_hw_information)(out) }
    }

    fn ppg_hw_information(&self, out: &mut HwInformation) -> bool {
        unsafe { (self.get_ppg_hw_information)(out) }
    }

    fn device_information(&self, out: &mut ModelInformation) -> bool {
        unsafe { (self.get_device_information)(out) }
    }

    fn ppg_device_information(&self, out: &mut ModelInformation) -> bool {
        unsafe { (self.get_ppg_device_information)(out) }
    }

    fn serial_number(&self) -> Option<String> {
        unsafe { crate::ffi::types::decode_c_string((self.get_serial_number)()) }
    }

    fn ppg_serial_number(&self) -> Option<String> {
        unsafe { crate::ffi::types::decode_c_string((self.get_ppg_serial_number)()) }
    }

    fn output_ecg(&self, waveform: &EcgWaveformRaw, cb: Option<OutputSignalCallback>) {
        unsafe { (self.output_ecg)(waveform, cb) }
    }

    fn output_ppg(&self, channel: i32, waveform: &PpgWaveformRaw, cb: Option<OutputSignalCallback>) {
        unsafe { (self.output_ppg)(channel, waveform, cb) }
    }

    fn output_ppg2(
        &self,
        first: &PpgWaveformRaw,
        second: &PpgWaveformRaw,
        first_cb: Option<OutputSignalCallback>,
        second_cb: Option<OutputSignalCallback>,
    ) {
        unsafe { (self.output_ppg2)(first, second, first_cb, second_cb) }
    }

    fn output_ppg3(
        &self,
        first: &PpgWaveformRaw,
        second: &PpgWaveformRaw,
        third: &PpgWaveformRaw,
        first_cb: Option<OutputSignalCallback>,
        second_cb: Option<OutputSignalCallback>,
        third_cb: Option<OutputSignalCallback>,
    ) {
        unsafe { (self.output_ppg3)(first, second, third, first_cb, second_cb, third_cb) }
    }

    fn output_ecg_and_ppg(
        &self,
        ptt_peak_ms: i32,
        ecg: &EcgWaveformRaw,
        ppg: &PpgWaveformRaw,
        ecg_cb: Option<OutputSignalCallback>,
        ppg_cb: Option<OutputSignalCallback>,
    ) {
        unsafe { (self.output_ecg_and_ppg)(ptt_peak_ms, ecg, ppg, ecg_cb, ppg_cb) }
    }

    fn output_frequency_scan(&self, scan: &FrequencyScanRaw, cb: Option<OutputSignalCallback>) {
        unsafe { (self.output_frequency_scan)(scan, cb) }
    }

    fn output_frequency_scan_ppg(
        &self,
        channel: i32,
        scan: &FrequencyScan2Raw,
        cb: Option<OutputSignalCallback>,
    ) {
        unsafe { (self.output_frequency_scan_ppg)(channel, scan, cb) }
    }

    fn set_dc_offset(&self, millivolts: i32) {
        unsafe { (self.set_dc_offset)(millivolts) }
    }

    fn waveform_player_loop(&self, enabled: bool) {
        unsafe { (self.player_loop)(enabled) }
    }

    fn waveform_player_output_ecg(&self, data: &PlayRawDataRaw) {
        unsafe { (self.player_output_ecg)(data) }
    }

    fn waveform_player_output_ppg(&self, channel: i32, data: &PlayRawDataRaw) {
        unsafe { (self.player_output_ppg)(channel, data) }
    }

    fn enable_sampling(&self, mode: i32, cb: SamplingCallback) {
        unsafe { (self.enable_sampling)(mode, cb) }
    }

    fn start_sampling(&self, cb: SamplingErrorCallback) {
        unsafe { (self.start_sampling)(cb) }
    }

    fn disable_sampling(&self) {
        unsafe { (self.disable_sampling)() }
    }
}
