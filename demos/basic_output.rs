// demos/basic_output.rs
//! Basic usage: connect, play an ECG waveform, stream sampled averages

use std::thread;
use std::time::Duration;

use aecg100::{
    ClientConfig, EcgImpedance, EcgNoiseFrequency, EcgWaveformConfig, EcgWaveformType, Electrode,
    SamplingEvent, SamplingMode, Session,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let sdk_dir = std::env::args().nth(1).unwrap_or_else(|| "sdk".into());
    let config = ClientConfig::for_sdk_dir(&sdk_dir);

    let session = Session::open(&config)?;
    session.connect()?;

    let info = session.module_info()?;
    println!("connected: serial {} fw {} hw {}", info.serial, info.firmware, info.hardware);

    // 1 Hz, 1 mV synthesized ECG
    let waveform = EcgWaveformConfig {
        waveform_type: EcgWaveformType::Ecg,
        frequency: 1.0,
        amplitude: 1.0,
        t_wave: 0.2,
        p_wave: 0.2,
        st_segment: 0.0,
        dc_offset_variable: false,
        dc_offset: 0,
        time_period: 1000,
        pr_interval: 160,
        qrs_duration: 100,
        t_duration: 180,
        qt_interval: 350,
        impedance: EcgImpedance::Off,
        electrode: Electrode::RightArm,
        pulse_width: 100,
        noise_amplitude: 0.0,
        noise_frequency: EcgNoiseFrequency::Off,
        pacing_enabled: false,
        pacing_amplitude: 2.0,
        pacing_duration: 2.0,
        pacing_rate: 60,
        respiration_enabled: false,
        respiration_amplitude: 1000,
        respiration_rate: 20,
        respiration_ratio: 1,
        respiration_baseline: 1000,
        respiration_apnea_duration: 10,
        respiration_apnea_cycle: 1,
    };
    session.ecg().play_waveform(&waveform)?;
    println!("playing ECG for 10 s");
    thread::sleep(Duration::from_secs(10));
    session.stop()?;

    // Stream channel-1 photodiode readings for a few windows
    let sampling = session.ppg().start_sampling(SamplingMode::Channel1Pd)?;
    for _ in 0..5 {
        match sampling.events().recv_timeout(Duration::from_secs(5))? {
            SamplingEvent::Average(avg) => println!("PD average: {avg:.1}"),
            SamplingEvent::Error(code) => {
                eprintln!("device sampling error {code}");
                break;
            }
        }
    }
    sampling.stop();

    session.disconnect()?;
    Ok(())
}
