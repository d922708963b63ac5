// src/ffi/types.rs
//! Fixed-layout records and callback types matching the vendor C header
//!
//! Every struct here is passed by reference into the vendor library and must
//! stay byte-identical to the declarations in `AECG100.h`. The trailing
//! `reserved` fields are part of the wire layout and must not be removed.

use std::os::raw::c_char;

/// Notifies a connection or disconnection event.
pub type ConnectedCallback = extern "C" fn(connected: bool);

/// Called with each outputted waveform point during playback.
pub type OutputSignalCallback = extern "C" fn(time: f64, ac: i32, dc: i32);

/// Called with sampled data; `number` is the repeat count of `data`.
pub type SamplingCallback = extern "C" fn(data: i32, number: i32);

/// Called with an asynchronous sampling error code.
pub type SamplingErrorCallback = extern "C" fn(error: i32);

/// Firmware and hardware versions of a module.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
#[allow(missing_docs)]
pub struct HwInformation {
    pub fw_main_version: i32,
    pub fw_sub_version: i32,
    pub hw_version: i32,
    pub pcb_version: i32,
}

/// Model identity of a module; text fields are ASCII, not NUL-terminated.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
#[allow(missing_docs)]
pub struct ModelInformation {
    pub product_name: [u8; 2],
    pub generation_number: u8,
    pub model_number: u8,
    pub serial_number: i32,
    pub year: i32,
    pub led_type_1: i32,
    pub led_type_2: i32,
    pub led_type_3: i32,
}

/// ECG waveform setting, field order per the vendor header.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
#[allow(missing_docs)]
pub struct EcgWaveformRaw {
    pub waveform_type: i32,
    /// Unit: Hz
    pub frequency: f64,
    /// Unit: mV
    pub amplitude: f64,
    pub t_wave: f64,
    pub p_wave: f64,
    pub st_segment: f64,
    pub dc_offset_variable: i32,
    pub dc_offset: i32,
    /// Unit: ms
    pub time_period: i32,
    pub pr_interval: i32,
    pub qrs_duration: i32,
    pub t_duration: i32,
    pub qt_interval: i32,
    pub impedance: i32,
    pub electrode: i32,
    pub pulse_width: i32,
    pub noise_amplitude: f64,
    pub noise_frequency: i32,
    pub pacing_enabled: i32,
    pub pacing_amplitude: f64,
    pub pacing_duration: f64,
    pub pacing_rate: i32,
    pub respiration_enabled: i32,
    pub respiration_amplitude: i32,
    pub respiration_rate: i32,
    pub respiration_ratio: i32,
    pub respiration_baseline: i32,
    pub respiration_apnea_duration: i32,
    pub respiration_apnea_cycle: i32,
    pub reserved: [u8; 12],
}

/// PPG waveform setting, field order per the vendor header.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
#[allow(missing_docs)]
pub struct PpgWaveformRaw {
    pub waveform_type: i32,
    /// Unit: Hz
    pub frequency: f64,
    /// Unit: mV
    pub vol_dc: f64,
    pub vol_sp: f64,
    pub vol_dn: f64,
    pub vol_dp: f64,
    pub ac_offset: f64,
    /// Unit: ms
    pub time_sp: i32,
    pub time_dn: i32,
    pub time_dp: i32,
    pub time_period: i32,
    pub sync_pulse: i32,
    pub inverted: i32,
    pub noise_amplitude: f64,
    pub noise_frequency: i32,
    pub respiration_enabled: i32,
    pub respiration_rate: i32,
    pub respiration_variation: i32,
    pub respiration_in_exhale_ratio: i32,
    pub reserved: [u8; 16],
}

/// ECG frequency scan setting.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
#[allow(missing_docs)]
pub struct FrequencyScanRaw {
    /// Unit: mV
    pub amplitude: f64,
    /// Unit: Hz
    pub frequency_start: f64,
    pub frequency_finish: f64,
    /// Unit: seconds
    pub duration: i32,
}

/// PPG frequency scan setting; adds a DC level and sync pulse mode.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
#[allow(missing_docs)]
pub struct FrequencyScan2Raw {
    /// Unit: mV
    pub amplitude: f64,
    /// Unit: mV; 0 ~ 3000 for PPG
    pub dc: f64,
    pub sync_pulse: i32,
    /// Unit: Hz
    pub frequency_start: f64,
    pub frequency_finish: f64,
    /// Unit: seconds
    pub duration: i32,
}

/// Raw playback descriptor. `ac` and `dc` are addresses of caller-owned
/// arrays of `size` doubles; the vendor library does not copy them, so the
/// backing storage must outlive the playback.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
#[allow(missing_docs)]
pub struct PlayRawDataRaw {
    pub sample_rate: f64,
    pub size: i32,
    pub sync_pulse: i32,
    pub ac: *const f64,
    pub dc: *const f64,
    pub cb: Option<OutputSignalCallback>,
}

/// Decode a fixed-length ASCII field, trimming NUL padding.
pub(crate) fn decode_ascii(bytes: &[u8]) -> String {
    bytes
        .iter()
        .take_while(|&&b| b != 0)
        .map(|&b| b as char)
        .collect()
}

/// Decode a vendor C string pointer; `None` for NULL.
///
/// # Safety
/// `ptr` must either be NULL or point to a valid NUL-terminated string that
/// stays alive for the duration of the call.
pub(crate) unsafe fn decode_c_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    Some(std::ffi::CStr::from_ptr(ptr).to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::size_of;

    // Sizes pinned against the vendor header; a drift here means the struct
    // no longer round-trips through the native calls.

    #[test]
    fn test_hw_information_layout() {
        assert_eq!(size_of::<HwInformation>(), 16);
    }

    #[test]
    fn test_model_information_layout() {
        assert_eq!(size_of::<ModelInformation>(), 24);
    }

    #[test]
    fn test_ecg_waveform_layout() {
        assert_eq!(size_of::<EcgWaveformRaw>(), 168);
    }

    #[test]
    fn test_ppg_waveform_layout() {
        assert_eq!(size_of::<PpgWaveformRaw>(), 128);
    }

    #[test]
    fn test_frequency_scan_layout() {
        assert_eq!(size_of::<FrequencyScanRaw>(), 32);
        assert_eq!(size_of::<FrequencyScan2Raw>(), 48);
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn test_play_raw_data_layout() {
        assert_eq!(size_of::<PlayRawDataRaw>(), 40);
    }

    #[test]
    fn test_decode_ascii_trims_nul_padding() {
        assert_eq!(decode_ascii(&[b'W', b'T', 0, 0]), "WT");
        assert_eq!(decode_ascii(&[0, 0]), "");
        assert_eq!(decode_ascii(b"AB"), "AB");
    }
}
