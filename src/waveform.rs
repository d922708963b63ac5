// src/waveform.rs
//! Typed waveform parameters and device enumerations
//!
//! Each value object maps one-to-one onto a fixed-layout record in
//! [`crate::ffi::types`]. There are no partial-update semantics: every field
//! is set explicitly at construction, and `to_raw()` fills the native struct
//! completely, including the reserved tail. The zeroed native defaults do not
//! correspond to any sane physical configuration, which is exactly why the
//! fields here are not optional.

use crate::ffi::types::{
    EcgWaveformRaw, FrequencyScan2Raw, FrequencyScanRaw, PpgWaveformRaw,
};

/// PPG output channel selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum PpgChannel {
    /// Channel 1.
    Channel1 = 1,
    /// Channel 2.
    Channel2 = 2,
}

/// ECG waveform shapes supported by the synthesizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum EcgWaveformType {
    /// Sine wave.
    Sine = 0,
    /// Triangle wave.
    Triangle = 1,
    /// Square wave.
    Square = 2,
    /// Single rectangle pulse.
    RectanglePulse = 3,
    /// Single triangle pulse.
    TrianglePulse = 4,
    /// Exponential pulse.
    Exponential = 5,
    /// Synthesized ECG complex.
    Ecg = 6,
}

/// Output electrode selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum Electrode {
    /// Right arm (RA).
    RightArm = 0,
    /// Left arm (LA).
    LeftArm = 0xff,
}

/// 620K output impedance switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum EcgImpedance {
    /// Impedance disabled.
    Off = 0,
    /// 620K impedance enabled.
    On = 0xff,
}

/// Mains-style noise overlay frequencies for ECG output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum EcgNoiseFrequency {
    /// No noise overlay.
    Off = 0,
    /// 50 Hz.
    Freq50Hz = 1,
    /// 60 Hz.
    Freq60Hz = 2,
    /// 100 Hz.
    Freq100Hz = 3,
    /// 120 Hz.
    Freq120Hz = 4,
}

/// PPG waveform shapes supported by the synthesizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum PpgWaveformType {
    /// Sine wave.
    Sine = 0,
    /// Triangle wave.
    Triangle = 1,
    /// Square wave.
    Square = 2,
    /// Synthesized PPG pulse.
    Ppg = 3,
}

/// Noise overlay frequencies for PPG output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum PpgNoiseFrequency {
    /// No noise overlay.
    Off = 0,
    /// 50 Hz.
    Freq50Hz = 1,
    /// 60 Hz.
    Freq60Hz = 2,
    /// 1 kHz.
    Freq1KHz = 3,
    /// 5 kHz.
    Freq5KHz = 4,
    /// 100 Hz.
    Freq100Hz = 5,
    /// 120 Hz.
    Freq120Hz = 6,
    /// White noise.
    WhiteNoise = 7,
}

/// Sync pulse behaviour during output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum SyncPulse {
    /// LED off.
    LedOff = 0,
    /// Sync pulse on.
    On = 1,
    /// Sync pulse off.
    Off = 2,
}

/// PPG signal inversion switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum PpgInverted {
    /// Normal polarity.
    Off = 0,
    /// Inverted polarity.
    On = 1,
}

/// LED emitter types reported per PPG channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum LedType {
    /// Green LED.
    Green = 0,
    /// Red LED.
    Red = 1,
    /// Infrared LED.
    Ir = 2,
    /// Channel not populated.
    None = 3,
}

impl From<i32> for LedType {
    fn from(value: i32) -> Self {
        match value {
            0 => LedType::Green,
            1 => LedType::Red,
            2 => LedType::Ir,
            _ => LedType::None,
        }
    }
}

/// PD/switch sampling sources read back from the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum SamplingMode {
    /// Channel-1 photodiode.
    Channel1Pd = 0,
    /// Channel-2 photodiode.
    Channel2Pd = 1,
    /// Channel-1 switch.
    Channel1Switch = 2,
    /// Channel-2 switch.
    Channel2Switch = 3,
}

fn flag(enabled: bool) -> i32 {
    // The vendor enums encode "on" as 0xff, not 1.
    if enabled {
        0xff
    } else {
        0
    }
}

/// Complete ECG waveform configuration.
///
/// Field units follow the vendor manual: voltages in millivolts, timing in
/// milliseconds unless noted otherwise.
#[derive(Debug, Clone, PartialEq)]
pub struct EcgWaveformConfig {
    /// Waveform shape.
    pub waveform_type: EcgWaveformType,
    /// Repetition frequency in Hz.
    pub frequency: f64,
    /// Peak amplitude in mV.
    pub amplitude: f64,
    /// T-wave amplitude in mV.
    pub t_wave: f64,
    /// P-wave amplitude in mV.
    pub p_wave: f64,
    /// ST-segment level in mV.
    pub st_segment: f64,
    /// When true, `dc_offset` may range -500 to 500 mV; otherwise it must be
    /// one of 300, 0, -300.
    pub dc_offset_variable: bool,
    /// DC offset in mV.
    pub dc_offset: i32,
    /// Beat period in ms.
    pub time_period: i32,
    /// PR interval in ms.
    pub pr_interval: i32,
    /// QRS duration in ms.
    pub qrs_duration: i32,
    /// T duration in ms.
    pub t_duration: i32,
    /// QT interval in ms.
    pub qt_interval: i32,
    /// 620K output impedance switch.
    pub impedance: EcgImpedance,
    /// Output electrode.
    pub electrode: Electrode,
    /// Pulse width in ms; effective for the pulse waveform shapes only.
    pub pulse_width: i32,
    /// Noise overlay amplitude in mV, at most 2.00.
    pub noise_amplitude: f64,
    /// Noise overlay frequency.
    pub noise_frequency: EcgNoiseFrequency,
    /// Pacing pulse enable.
    pub pacing_enabled: bool,
    /// Pacing amplitude in mV, -1000 to 1000.
    pub pacing_amplitude: f64,
    /// Pacing duration in ms, 0 to 2, 0.1 resolution.
    pub pacing_duration: f64,
    /// Pacing rate in BPM.
    pub pacing_rate: i32,
    /// Respiration modulation enable.
    pub respiration_enabled: bool,
    /// Respiration amplitude in milliohm, 1000 to 5000.
    pub respiration_amplitude: i32,
    /// Respiration rate in breaths per minute, 4 to 200.
    pub respiration_rate: i32,
    /// Inhale:exhale ratio, 1 to 5.
    pub respiration_ratio: i32,
    /// Respiration baseline in ohm.
    pub respiration_baseline: i32,
    /// Apnea duration in seconds, 0 to 60.
    pub respiration_apnea_duration: i32,
    /// Apnea cycle in minutes, 1 to 10.
    pub respiration_apnea_cycle: i32,
}

impl EcgWaveformConfig {
    /// Marshal into the fixed-layout native record. Every field is written;
    /// the reserved tail is zeroed.
    pub fn to_raw(&self) -> EcgWaveformRaw {
        EcgWaveformRaw {
            waveform_type: self.waveform_type as i32,
            frequency: self.frequency,
            amplitude: self.amplitude,
            t_wave: self.t_wave,
            p_wave: self.p_wave,
            st_segment: self.st_segment,
            dc_offset_variable: i32::from(self.dc_offset_variable),
            dc_offset: self.dc_offset,
            time_period: self.time_period,
            pr_interval: self.pr_interval,
            qrs_duration: self.qrs_duration,
            t_duration: self.t_duration,
            qt_interval: self.qt_interval,
            impedance: self.impedance as i32,
            electrode: self.electrode as i32,
            pulse_width: self.pulse_width,
            noise_amplitude: self.noise_amplitude,
            noise_frequency: self.noise_frequency as i32,
            pacing_enabled: flag(self.pacing_enabled),
            pacing_amplitude: self.pacing_amplitude,
            pacing_duration: self.pacing_duration,
            pacing_rate: self.pacing_rate,
            respiration_enabled: flag(self.respiration_enabled),
            respiration_amplitude: self.respiration_amplitude,
            respiration_rate: self.respiration_rate,
            respiration_ratio: self.respiration_ratio,
            respiration_baseline: self.respiration_baseline,
            respiration_apnea_duration: self.respiration_apnea_duration,
            respiration_apnea_cycle: self.respiration_apnea_cycle,
            reserved: [0; 12],
        }
    }
}

/// Complete PPG waveform configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct PpgWaveformConfig {
    /// Waveform shape.
    pub waveform_type: PpgWaveformType,
    /// Pulse frequency in Hz (1 Hz equals 60 BPM).
    pub frequency: f64,
    /// DC level in mV.
    pub vol_dc: f64,
    /// Systolic peak voltage in mV.
    pub vol_sp: f64,
    /// Dicrotic notch voltage in mV.
    pub vol_dn: f64,
    /// Diastolic peak voltage in mV.
    pub vol_dp: f64,
    /// AC offset in mV; `vol_sp + ac_offset` must not exceed 30 mV.
    pub ac_offset: f64,
    /// Systolic peak time in ms.
    pub time_sp: i32,
    /// Dicrotic notch time in ms.
    pub time_dn: i32,
    /// Diastolic peak time in ms.
    pub time_dp: i32,
    /// Pulse period in ms.
    pub time_period: i32,
    /// Sync pulse behaviour.
    pub sync_pulse: SyncPulse,
    /// Signal inversion.
    pub inverted: PpgInverted,
    /// Noise overlay amplitude in mV, at most 2.00.
    pub noise_amplitude: f64,
    /// Noise overlay frequency.
    pub noise_frequency: PpgNoiseFrequency,
    /// Respiration modulation enable.
    pub respiration_enabled: bool,
    /// Respiration rate in breaths per minute.
    pub respiration_rate: i32,
    /// Respiration variation in percent, -16 to 16.
    pub respiration_variation: i32,
    /// Inhale:exhale ratio, 1 to 5.
    pub respiration_in_exhale_ratio: i32,
}

impl PpgWaveformConfig {
    /// Marshal into the fixed-layout native record.
    pub fn to_raw(&self) -> PpgWaveformRaw {
        PpgWaveformRaw {
            waveform_type: self.waveform_type as i32,
            frequency: self.frequency,
            vol_dc: self.vol_dc,
            vol_sp: self.vol_sp,
            vol_dn: self.vol_dn,
            vol_dp: self.vol_dp,
            ac_offset: self.ac_offset,
            time_sp: self.time_sp,
            time_dn: self.time_dn,
            time_dp: self.time_dp,
            time_period: self.time_period,
            sync_pulse: self.sync_pulse as i32,
            inverted: self.inverted as i32,
            noise_amplitude: self.noise_amplitude,
            noise_frequency: self.noise_frequency as i32,
            respiration_enabled: flag(self.respiration_enabled),
            respiration_rate: self.respiration_rate,
            respiration_variation: self.respiration_variation,
            respiration_in_exhale_ratio: self.respiration_in_exhale_ratio,
            reserved: [0; 16],
        }
    }
}

/// ECG frequency scan parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct EcgFrequencyScan {
    /// Amplitude in mV.
    pub amplitude: f64,
    /// Start frequency in Hz.
    pub frequency_start: f64,
    /// End frequency in Hz.
    pub frequency_finish: f64,
    /// Scan duration in seconds.
    pub duration: i32,
}

impl EcgFrequencyScan {
    /// Marshal into the fixed-layout native record.
    pub fn to_raw(&self) -> FrequencyScanRaw {
        FrequencyScanRaw {
            amplitude: self.amplitude,
            frequency_start: self.frequency_start,
            frequency_finish: self.frequency_finish,
            duration: self.duration,
        }
    }
}

/// PPG frequency scan parameters; adds a DC level and sync pulse mode.
#[derive(Debug, Clone, PartialEq)]
pub struct PpgFrequencyScan {
    /// Amplitude in mV.
    pub amplitude: f64,
    /// DC level in mV, 0 to 3000.
    pub dc: f64,
    /// Sync pulse behaviour.
    pub sync_pulse: SyncPulse,
    /// Start frequency in Hz.
    pub frequency_start: f64,
    /// End frequency in Hz.
    pub frequency_finish: f64,
    /// Scan duration in seconds.
    pub duration: i32,
}

impl PpgFrequencyScan {
    /// Marshal into the fixed-layout native record.
    pub fn to_raw(&self) -> FrequencyScan2Raw {
        FrequencyScan2Raw {
            amplitude: self.amplitude,
            dc: self.dc,
            sync_pulse: self.sync_pulse as i32,
            frequency_start: self.frequency_start,
            frequency_finish: self.frequency_finish,
            duration: self.duration,
        }
    }
}


#[cfg(test)]
mod tests {
    use super::test_fixtures::{ecg_1hz, ppg_60bpm};
    use super::*;

    #[test]
    fn test_ecg_marshalling_sets_every_field() {
        let raw = ecg_1hz().to_raw();
        assert_eq!(raw.waveform_type, 6);
        assert_eq!(raw.frequency, 1.0);
        assert_eq!(raw.qt_interval, 350);
        assert_eq!(raw.electrode, 0);
        assert_eq!(raw.pacing_enabled, 0);
        assert_eq!(raw.respiration_baseline, 1000);
        assert_eq!(raw.reserved, [0; 12]);
    }

    #[test]
    fn test_on_flags_use_vendor_encoding() {
        let mut config = ecg_1hz();
        config.pacing_enabled = true;
        config.impedance = EcgImpedance::On;
        config.electrode = Electrode::LeftArm;
        let raw = config.to_raw();
        assert_eq!(raw.pacing_enabled, 0xff);
        assert_eq!(raw.impedance, 0xff);
        assert_eq!(raw.electrode, 0xff);
    }

    #[test]
    fn test_ppg_marshalling() {
        let raw = ppg_60bpm().to_raw();
        assert_eq!(raw.waveform_type, 3);
        assert_eq!(raw.vol_dc, 625.0);
        assert_eq!(raw.sync_pulse, 2);
        assert_eq!(raw.inverted, 1);
        assert_eq!(raw.reserved, [0; 16]);
    }

    #[test]
    fn test_led_type_from_unknown_code() {
        assert_eq!(LedType::from(1), LedType::Red);
        assert_eq!(LedType::from(42), LedType::None);
    }

    #[test]
    fn test_frequency_scan_marshalling() {
        let scan = PpgFrequencyScan {
            amplitude: 12.5,
            dc: 625.0,
            sync_pulse: SyncPulse::Off,
            frequency_start: 1.0,
            frequency_finish: 30.0,
            duration: 30,
        };
        let raw = scan.to_raw();
        assert_eq!(raw.dc, 625.0);
        assert_eq!(raw.duration, 30);
    }
}
