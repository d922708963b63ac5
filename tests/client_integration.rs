// tests/client_integration.rs
//! Integration tests for the public client API, hardware-free

use std::io::Write;

use aecg100::{AecgError, AveragingWindow, ClientConfig, RawPlayback, Session};

#[test]
fn test_open_with_missing_library_fails_fatally() {
    let config = ClientConfig {
        library_path: "/nonexistent/sdk/libaecgx64.so".into(),
        port: None,
        connect_timeout_ms: 1_000,
        sampling_window: 1000,
    };
    let err = Session::open(&config).expect_err("load should fail");
    match err {
        AecgError::Load { path, .. } => assert!(path.contains("nonexistent")),
        other => panic!("expected load error, got {other}"),
    }
}

#[test]
fn test_config_round_trip_through_toml() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    writeln!(file, "library_path = \"sdk/libaecgx64.so\"").unwrap();
    writeln!(file, "port = 3").unwrap();
    writeln!(file, "connect_timeout_ms = 5000").unwrap();
    file.flush().unwrap();

    let config = ClientConfig::from_toml_path(file.path()).expect("valid config");
    assert_eq!(config.port, Some(3));
    assert_eq!(config.connect_timeout_ms, 5_000);
    // Unset fields fall back to defaults
    assert_eq!(config.sampling_window, 1000);
}

#[test]
fn test_playback_validation_is_caught_before_any_session() {
    let err = RawPlayback::new(1000.0, vec![0.1; 10], vec![0.0; 9]).expect_err("mismatch");
    assert!(matches!(err, AecgError::InvalidArgument(_)));
}

#[test]
fn test_averaging_window_tracks_demo_handler() {
    // The vendor demo averages 1000 readings per emitted value
    let mut window = AveragingWindow::new(1000);
    let mut averages = Vec::new();
    averages.extend(window.push(100.0, 600));
    averages.extend(window.push(200.0, 600));
    assert_eq!(averages, vec![140.0]);
    assert_eq!(window.buffered(), 200);
}

#[test]
fn test_waveform_defaults_marshal_consistently() {
    use aecg100::{EcgFrequencyScan, PpgFrequencyScan, SyncPulse};

    let ecg_scan = EcgFrequencyScan {
        amplitude: 1.0,
        frequency_start: 0.5,
        frequency_finish: 150.0,
        duration: 30,
    };
    assert_eq!(ecg_scan.to_raw().duration, 30);

    let ppg_scan = PpgFrequencyScan {
        amplitude: 12.5,
        dc: 625.0,
        sync_pulse: SyncPulse::Off,
        frequency_start: 1.0,
        frequency_finish: 30.0,
        duration: 30,
    };
    assert_eq!(ppg_scan.to_raw().sync_pulse, SyncPulse::Off as i32);
}
