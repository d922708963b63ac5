// src/session/tests.rs
//! Session lifecycle tests against a recording fake of the vendor ABI

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serial_test::serial;

use crate::bridge;
use crate::config::ClientConfig;
use crate::error::AecgError;
use crate::ffi::library::NativeApi;
use crate::ffi::types::{
    ConnectedCallback, EcgWaveformRaw, FrequencyScan2Raw, FrequencyScanRaw, HwInformation,
    ModelInformation, OutputSignalCallback, PlayRawDataRaw, PpgWaveformRaw, SamplingCallback,
    SamplingErrorCallback,
};
use crate::playback::RawPlayback;
use crate::sampling::SamplingEvent;
use crate::session::{ConnectionState, Session};
use crate::waveform::test_fixtures::{ecg_1hz, ppg_60bpm};
use crate::waveform::{EcgFrequencyScan, LedType, PpgChannel, SamplingMode, SyncPulse};

/// How the fake reacts to the callback-style init.
#[derive(Clone, Copy)]
enum InitBehavior {
    /// Invoke the connection callback synchronously with this result.
    Signal(bool),
    /// Never invoke the callback; forces the handshake timeout.
    Silent,
}

/// Recording stand-in for the loaded vendor library.
struct FakeApi {
    calls: Mutex<Vec<String>>,
    init_result: bool,
    init_behavior: InitBehavior,
    supports_port: bool,
    connect_result: bool,
}

impl FakeApi {
    fn connectable() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            init_result: true,
            init_behavior: InitBehavior::Signal(true),
            supports_port: false,
            connect_result: false,
        }
    }

    fn silent() -> Self {
        Self {
            init_behavior: InitBehavior::Silent,
            ..Self::connectable()
        }
    }

    fn refusing() -> Self {
        Self {
            init_behavior: InitBehavior::Signal(false),
            ..Self::connectable()
        }
    }

    fn with_port_connect(connect_result: bool) -> Self {
        Self {
            supports_port: true,
            connect_result,
            ..Self::connectable()
        }
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().push(call.into());
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    fn clear_calls(&self) {
        self.calls.lock().clear();
    }
}

impl NativeApi for FakeApi {
    fn init(&self, cb: ConnectedCallback) -> bool {
        self.record("init");
        if let InitBehavior::Signal(connected) = self.init_behavior {
            cb(connected);
        }
        self.init_result
    }

    fn supports_port_connect(&self) -> bool {
        self.supports_port
    }

    fn connect(&self, port: u32, timeout_ms: u32) -> bool {
        self.record(format!("connect(port={port}, timeout={timeout_ms})"));
        self.connect_result
    }

    fn free(&self) {
        self.record("free");
    }

    fn stop_output(&self) {
        self.record("stop_output");
    }

    fn hw_information(&self, out: &mut HwInformation) -> bool {
        self.record("hw_information");
        *out = HwInformation {
            fw_main_version: 1,
            fw_sub_version: 2,
            hw_version: 3,
            pcb_version: 4,
        };
        true
    }

    fn ppg_hw_information(&self, out: &mut HwInformation) -> bool {
        self.record("ppg_hw_information");
        *out = HwInformation {
            fw_main_version: 5,
            fw_sub_version: 6,
            hw_version: 7,
            pcb_version: 8,
        };
        true
    }

    fn device_information(&self, out: &mut ModelInformation) -> bool {
        self.record("device_information");
        *out = ModelInformation {
            product_name: [b'A', b'E'],
            generation_number: 1,
            model_number: 2,
            serial_number: 77,
            year: 0x11,
            led_type_1: 0,
            led_type_2: 1,
            led_type_3: 3,
        };
        true
    }

    fn ppg_device_information(&self, out: &mut ModelInformation) -> bool {
        self.record("ppg_device_information");
        *out = ModelInformation::default();
        true
    }

    fn serial_number(&self) -> Option<String> {
        self.record("serial_number");
        Some("AE010077".into())
    }

    fn ppg_serial_number(&self) -> Option<String> {
        self.record("ppg_serial_number");
        Some("AE020077".into())
    }

    fn output_ecg(&self, waveform: &EcgWaveformRaw, _cb: Option<OutputSignalCallback>) {
        self.record(format!("output_ecg(type={})", waveform.waveform_type));
    }

    fn output_ppg(&self, channel: i32, _waveform: &PpgWaveformRaw, _cb: Option<OutputSignalCallback>) {
        self.record(format!("output_ppg(channel={channel})"));
    }

    fn output_ppg2(
        &self,
        _first: &PpgWaveformRaw,
        _second: &PpgWaveformRaw,
        _first_cb: Option<OutputSignalCallback>,
        _second_cb: Option<OutputSignalCallback>,
    ) {
        self.record("output_ppg2");
    }

    fn output_ppg3(
        &self,
        _first: &PpgWaveformRaw,
        _second: &PpgWaveformRaw,
        _third: &PpgWaveformRaw,
        _first_cb: Option<OutputSignalCallback>,
        _second_cb: Option<OutputSignalCallback>,
        _third_cb: Option<OutputSignalCallback>,
    ) {
        self.record("output_ppg3");
    }

    fn output_ecg_and_ppg(
        &self,
        ptt_peak_ms: i32,
        _ecg: &EcgWaveformRaw,
        _ppg: &PpgWaveformRaw,
        _ecg_cb: Option<OutputSignalCallback>,
        _ppg_cb: Option<OutputSignalCallback>,
    ) {
        self.record(format!("output_ecg_and_ppg(ptt={ptt_peak_ms})"));
    }

    fn output_frequency_scan(&self, _scan: &FrequencyScanRaw, _cb: Option<OutputSignalCallback>) {
        self.record("output_frequency_scan");
    }

    fn output_frequency_scan_ppg(
        &self,
        channel: i32,
        _scan: &FrequencyScan2Raw,
        _cb: Option<OutputSignalCallback>,
    ) {
        self.record(format!("output_frequency_scan_ppg(channel={channel})"));
    }

    fn set_dc_offset(&self, millivolts: i32) {
        self.record(format!("set_dc_offset({millivolts})"));
    }

    fn waveform_player_loop(&self, enabled: bool) {
        self.record(format!("waveform_player_loop({enabled})"));
    }

    fn waveform_player_output_ecg(&self, data: &PlayRawDataRaw) {
        self.record(format!(
            "waveform_player_output_ecg(size={}, sync={})",
            data.size, data.sync_pulse
        ));
    }

    fn waveform_player_output_ppg(&self, channel: i32, data: &PlayRawDataRaw) {
        self.record(format!(
            "waveform_player_output_ppg(channel={channel}, size={})",
            data.size
        ));
    }

    fn enable_sampling(&self, mode: i32, _cb: SamplingCallback) {
        self.record(format!("enable_sampling(mode={mode})"));
    }

    fn start_sampling(&self, _cb: SamplingErrorCallback) {
        self.record("start_sampling");
    }

    fn disable_sampling(&self) {
        self.record("disable_sampling");
    }
}

fn test_config() -> ClientConfig {
    ClientConfig {
        library_path: "sdk/libaecgx64.so".into(),
        port: None,
        connect_timeout_ms: 2_000,
        sampling_window: 10,
    }
}

fn session_with(fake: Arc<FakeApi>) -> Session {
    Session::with_api(fake, &test_config())
}

#[test]
fn test_session_debug_reports_state() {
    // Session must be Debug so Result combinators over it render in tests.
    let session = session_with(Arc::new(FakeApi::connectable()));
    let rendered = format!("{session:?}");
    assert!(rendered.contains("Session"));
    assert!(rendered.contains("Disconnected"));
}

#[test]
#[serial]
fn test_connect_transitions_to_connected() {
    let fake = Arc::new(FakeApi::connectable());
    let session = session_with(fake.clone());

    assert_eq!(session.state(), ConnectionState::Disconnected);
    session.connect().unwrap();
    assert_eq!(session.state(), ConnectionState::Connected);
    assert_eq!(fake.calls(), vec!["init"]);
}

#[test]
#[serial]
fn test_connect_while_connected_is_noop() {
    let fake = Arc::new(FakeApi::connectable());
    let session = session_with(fake.clone());

    session.connect().unwrap();
    session.connect().unwrap();

    // No second handshake was initiated.
    let inits = fake.calls().iter().filter(|c| *c == "init").count();
    assert_eq!(inits, 1);
}

#[test]
#[serial]
fn test_connect_refused_frees_handle() {
    let fake = Arc::new(FakeApi::refusing());
    let session = session_with(fake.clone());

    let err = session.connect().unwrap_err();
    assert!(matches!(err, AecgError::ConnectionFailed));
    assert_eq!(session.state(), ConnectionState::Disconnected);
    assert!(fake.calls().contains(&"free".to_string()));
}

#[test]
#[serial]
fn test_connect_init_failure_frees_handle() {
    let fake = Arc::new(FakeApi {
        init_result: false,
        ..FakeApi::silent()
    });
    let session = session_with(fake.clone());

    let err = session.connect().unwrap_err();
    assert!(matches!(err, AecgError::ConnectionFailed));
    assert_eq!(fake.calls(), vec!["init", "free"]);
}

#[test]
#[serial]
fn test_connect_timeout_is_bounded() {
    let fake = Arc::new(FakeApi::silent());
    let session = session_with(fake.clone());

    let started = Instant::now();
    let err = session.connect().unwrap_err();
    let elapsed = started.elapsed();

    assert!(matches!(err, AecgError::Timeout { timeout_ms: 2000 }));
    assert!(elapsed >= Duration::from_millis(1900), "returned too early: {elapsed:?}");
    assert!(elapsed <= Duration::from_millis(2500), "timeout overshot: {elapsed:?}");
    assert_eq!(session.state(), ConnectionState::Disconnected);
    assert!(fake.calls().contains(&"free".to_string()));
}

#[test]
#[serial]
fn test_connect_via_port_without_symbol_is_unsupported() {
    let fake = Arc::new(FakeApi::connectable());
    let session = session_with(fake.clone());

    let err = session.connect_via_port().unwrap_err();
    assert!(matches!(err, AecgError::Unsupported("WTQConnect")));
    assert!(fake.calls().is_empty());
}

#[test]
#[serial]
fn test_connect_via_port_success() {
    let fake = Arc::new(FakeApi::with_port_connect(true));
    let session = session_with(fake.clone());

    session.connect_via_port().unwrap();
    assert_eq!(session.state(), ConnectionState::Connected);
    assert_eq!(
        fake.calls(),
        vec![format!("connect(port={}, timeout=2000)", u32::MAX)]
    );
}

#[test]
#[serial]
fn test_connect_via_port_timeout_frees_handle() {
    let fake = Arc::new(FakeApi::with_port_connect(false));
    let session = session_with(fake.clone());

    let err = session.connect_via_port().unwrap_err();
    assert!(matches!(err, AecgError::Timeout { .. }));
    assert!(fake.calls().contains(&"free".to_string()));
}

#[test]
fn test_disconnect_while_disconnected_is_noop() {
    let fake = Arc::new(FakeApi::connectable());
    let session = session_with(fake.clone());

    session.disconnect().unwrap();
    assert_eq!(session.state(), ConnectionState::Disconnected);
    // No native stop or free was issued.
    assert!(fake.calls().is_empty());
}

#[test]
#[serial]
fn test_disconnect_stops_frees_and_settles() {
    let fake = Arc::new(FakeApi::connectable());
    let session = session_with(fake.clone());
    session.connect().unwrap();
    fake.clear_calls();

    let started = Instant::now();
    session.disconnect().unwrap();

    assert!(started.elapsed() >= Duration::from_secs(1), "settling delay skipped");
    assert_eq!(session.state(), ConnectionState::Disconnected);
    assert_eq!(fake.calls(), vec!["stop_output", "free"]);
}

#[test]
fn test_module_operations_require_connection() {
    let fake = Arc::new(FakeApi::connectable());
    let session = session_with(fake.clone());

    assert!(matches!(
        session.ecg().play_waveform(&ecg_1hz()),
        Err(AecgError::NotConnected)
    ));
    assert!(matches!(
        session.ppg().play_waveform(&[(PpgChannel::Channel1, ppg_60bpm())]),
        Err(AecgError::NotConnected)
    ));
    assert!(matches!(
        session.pwtt().play(500, &ecg_1hz(), &ppg_60bpm()),
        Err(AecgError::NotConnected)
    ));
    assert!(matches!(session.stop(), Err(AecgError::NotConnected)));
    assert!(matches!(session.module_info(), Err(AecgError::NotConnected)));

    // The disconnected facade never reached the native layer.
    assert!(fake.calls().is_empty());
}

#[test]
#[serial]
fn test_ecg_play_waveform_marshals_and_dispatches() {
    let fake = Arc::new(FakeApi::connectable());
    let session = session_with(fake.clone());
    session.connect().unwrap();
    fake.clear_calls();

    session.ecg().play_waveform(&ecg_1hz()).unwrap();
    assert_eq!(fake.calls(), vec!["output_ecg(type=6)"]);
}

#[test]
#[serial]
fn test_ecg_raw_playback_validation() {
    let fake = Arc::new(FakeApi::connectable());
    let session = session_with(fake.clone());
    session.connect().unwrap();
    fake.clear_calls();

    let mismatched = RawPlayback {
        sample_rate: 1000.0,
        ac: vec![0.0; 5],
        dc: vec![0.0; 3],
    };
    let err = session.ecg().play_raw(&mismatched, true).unwrap_err();
    assert!(matches!(err, AecgError::InvalidArgument(_)));
    assert!(fake.calls().is_empty());

    let valid = RawPlayback::new(1000.0, vec![1.0; 1000], vec![0.0; 1000]).unwrap();
    session.ecg().play_raw(&valid, true).unwrap();
    assert_eq!(
        fake.calls(),
        vec![
            "waveform_player_loop(true)",
            // ECG raw data has no sync pulse; the field is zero on the wire
            "waveform_player_output_ecg(size=1000, sync=0)"
        ]
    );
}

#[test]
#[serial]
fn test_consecutive_raw_playbacks_keep_all_buffers() {
    let fake = Arc::new(FakeApi::connectable());
    let session = session_with(fake.clone());
    session.connect().unwrap();

    let first = RawPlayback::new(1000.0, vec![1.0; 8], vec![0.0; 8]).unwrap();
    let second = RawPlayback::new(1000.0, vec![2.0; 8], vec![3000.0; 8]).unwrap();
    session.ecg().play_raw(&first, true).unwrap();
    session
        .ppg()
        .play_raw(PpgChannel::Channel1, &second, SyncPulse::Off, true)
        .unwrap();

    // The ECG and PPG players each hold addresses into one of these
    // buffers; both must stay alive until stop() or disconnect().
    {
        let inner = session.inner.lock();
        assert_eq!(inner.retained.len(), 2);
        assert_eq!(inner.retained[0].ac, vec![1.0; 8]);
        assert_eq!(inner.retained[1].ac, vec![2.0; 8]);
        assert_eq!(inner.retained[1].dc, vec![3000.0; 8]);
    }

    session.stop().unwrap();
    assert!(session.inner.lock().retained.is_empty());
}

#[test]
#[serial]
fn test_ppg_multi_channel_dispatch() {
    let fake = Arc::new(FakeApi::connectable());
    let session = session_with(fake.clone());
    session.connect().unwrap();
    fake.clear_calls();

    let pair = |channel| (channel, ppg_60bpm());

    session
        .ppg()
        .play_waveform(&[pair(PpgChannel::Channel2)])
        .unwrap();
    session
        .ppg()
        .play_waveform(&[pair(PpgChannel::Channel1), pair(PpgChannel::Channel2)])
        .unwrap();
    session
        .ppg()
        .play_waveform(&[
            pair(PpgChannel::Channel1),
            pair(PpgChannel::Channel2),
            pair(PpgChannel::Channel1),
        ])
        .unwrap();

    assert_eq!(
        fake.calls(),
        vec!["output_ppg(channel=2)", "output_ppg2", "output_ppg3"]
    );
}

#[test]
#[serial]
fn test_ppg_channel_count_limits() {
    let fake = Arc::new(FakeApi::connectable());
    let session = session_with(fake.clone());
    session.connect().unwrap();
    fake.clear_calls();

    let err = session.ppg().play_waveform(&[]).unwrap_err();
    assert!(matches!(err, AecgError::InvalidArgument(_)));

    let four = vec![(PpgChannel::Channel1, ppg_60bpm()); 4];
    let err = session.ppg().play_waveform(&four).unwrap_err();
    match err {
        AecgError::InvalidArgument(msg) => assert!(msg.contains("3 channels")),
        other => panic!("expected invalid argument, got {other:?}"),
    }

    assert!(fake.calls().is_empty());
}

#[test]
#[serial]
fn test_ppg_raw_playback_sets_loop_and_channel() {
    let fake = Arc::new(FakeApi::connectable());
    let session = session_with(fake.clone());
    session.connect().unwrap();
    fake.clear_calls();

    let valid = RawPlayback::new(1000.0, vec![0.0; 100], vec![3000.0; 100]).unwrap();
    session
        .ppg()
        .play_raw(PpgChannel::Channel1, &valid, SyncPulse::Off, false)
        .unwrap();
    assert_eq!(
        fake.calls(),
        vec![
            "waveform_player_loop(false)",
            "waveform_player_output_ppg(channel=1, size=100)"
        ]
    );
}

#[test]
#[serial]
fn test_frequency_scans_dispatch() {
    let fake = Arc::new(FakeApi::connectable());
    let session = session_with(fake.clone());
    session.connect().unwrap();
    fake.clear_calls();

    session
        .ecg()
        .scan_frequency(&EcgFrequencyScan {
            amplitude: 1.0,
            frequency_start: 0.5,
            frequency_finish: 150.0,
            duration: 30,
        })
        .unwrap();
    assert_eq!(fake.calls(), vec!["output_frequency_scan"]);

    let err = session
        .ecg()
        .scan_frequency(&EcgFrequencyScan {
            amplitude: 1.0,
            frequency_start: 10.0,
            frequency_finish: 1.0,
            duration: 30,
        })
        .unwrap_err();
    assert!(matches!(err, AecgError::InvalidArgument(_)));
}

#[test]
#[serial]
fn test_pwtt_play_passes_transit_time() {
    let fake = Arc::new(FakeApi::connectable());
    let session = session_with(fake.clone());
    session.connect().unwrap();
    fake.clear_calls();

    session.pwtt().play(500, &ecg_1hz(), &ppg_60bpm()).unwrap();
    assert_eq!(fake.calls(), vec!["output_ecg_and_ppg(ptt=500)"]);

    assert!(matches!(
        session.pwtt().play(-1, &ecg_1hz(), &ppg_60bpm()),
        Err(AecgError::InvalidArgument(_))
    ));
}

#[test]
#[serial]
fn test_info_queries_decode_fixed_fields() {
    let fake = Arc::new(FakeApi::connectable());
    let session = session_with(fake.clone());
    session.connect().unwrap();

    let module = session.module_info().unwrap();
    assert_eq!(module.serial, "AE010077");
    assert_eq!(module.firmware, "1.2");
    assert_eq!(module.hardware, "4.3");

    let ppg_module = session.ppg_module_info().unwrap();
    assert_eq!(ppg_module.serial, "AE020077");
    assert_eq!(ppg_module.firmware, "5.6");
    assert_eq!(ppg_module.hardware, "8.7");

    let device = session.device_info().unwrap();
    assert_eq!(device.product_name, "AE");
    assert_eq!(device.serial_number, 77);
    assert_eq!(
        device.led_types,
        [LedType::Green, LedType::Red, LedType::None]
    );
    assert_eq!(device.formatted_serial(), "WAE0102-170077");
}

#[test]
#[serial]
fn test_sampling_stream_emits_window_averages() {
    let fake = Arc::new(FakeApi::connectable());
    let session = session_with(fake.clone());
    session.connect().unwrap();
    fake.clear_calls();

    // sampling_window in test_config() is 10
    let handle = session.ppg().start_sampling(SamplingMode::Channel1Pd).unwrap();
    assert_eq!(
        fake.calls(),
        vec!["enable_sampling(mode=0)", "start_sampling"]
    );
    assert!(format!("{handle:?}").contains("SamplingHandle"));

    bridge::sampling_trampoline(7, 10);
    bridge::sampling_error_trampoline(-3);

    let events = handle.events();
    assert_eq!(
        events.recv_timeout(Duration::from_secs(1)).unwrap(),
        SamplingEvent::Average(7.0)
    );
    assert_eq!(
        events.recv_timeout(Duration::from_secs(1)).unwrap(),
        SamplingEvent::Error(-3)
    );

    handle.stop();
    assert!(fake.calls().contains(&"disable_sampling".to_string()));
}

#[test]
#[serial]
fn test_sampling_is_exclusive_per_process() {
    let fake = Arc::new(FakeApi::connectable());
    let session = session_with(fake.clone());
    session.connect().unwrap();

    let handle = session.ppg().start_sampling(SamplingMode::Channel1Pd).unwrap();
    let err = session
        .ppg()
        .start_sampling(SamplingMode::Channel2Pd)
        .unwrap_err();
    assert!(matches!(err, AecgError::InvalidArgument(_)));
    handle.stop();
}
