//! aecg100: Safe client bindings for the WhaleTeq AECG100 ECG/PPG test system
//!
//! This library wraps the vendor's shared-object SDK behind a safe, typed
//! API. It covers:
//!
//! - Loading the platform-matched vendor library and binding its entry points
//! - Session lifecycle with an explicit connect/disconnect state machine
//! - ECG, PPG and PWTT waveform output with fully typed parameters
//! - Raw AC/DC sample playback with session-managed buffer retention
//! - PD/switch sampling streamed as fixed-window averages
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use aecg100::{ClientConfig, Session};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Point the client at the vendor SDK directory
//!     let config = ClientConfig::for_sdk_dir("sdk");
//!     let session = Session::open(&config)?;
//!
//!     // Connect and query the device
//!     session.connect()?;
//!     let info = session.module_info()?;
//!     println!("serial {}, firmware {}", info.serial, info.firmware);
//!
//!     session.disconnect()?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub(crate) mod bridge;
pub mod config;
pub mod error;
pub mod ffi;
pub mod playback;
pub mod sampling;
pub mod session;
pub mod waveform;

// Re-export commonly used types for convenience
pub use config::ClientConfig;
pub use error::{AecgError, AecgResult};
pub use playback::RawPlayback;
pub use sampling::{AveragingWindow, SamplingEvent, SamplingHandle, DEFAULT_SAMPLING_WINDOW};
pub use session::{
    ConnectionState, DeviceInfo, EcgCommands, ModuleInfo, PpgCommands, PwttCommands, Session,
};
pub use waveform::{
    EcgFrequencyScan, EcgImpedance, EcgNoiseFrequency, EcgWaveformConfig, EcgWaveformType,
    Electrode, LedType, PpgChannel, PpgFrequencyScan, PpgInverted, PpgNoiseFrequency,
    PpgWaveformConfig, PpgWaveformType, SamplingMode, SyncPulse,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
