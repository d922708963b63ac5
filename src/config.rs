// src/config.rs
//! Client configuration

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AecgError, AecgResult};
use crate::ffi::library::default_library_name;
use crate::sampling::DEFAULT_SAMPLING_WINDOW;

/// Client configuration, loadable from TOML.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClientConfig {
    /// Path to the vendor shared object.
    pub library_path: PathBuf,

    /// COM port number; `None` selects automatically (polling connect only).
    #[serde(default)]
    pub port: Option<u32>,

    /// Connection handshake bound in milliseconds.
    #[serde(default = "defaults::connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    /// Number of sampling readings averaged into one emitted value.
    #[serde(default = "defaults::sampling_window")]
    pub sampling_window: usize,
}

mod defaults {
    pub(super) fn connect_timeout_ms() -> u64 {
        15_000
    }

    pub(super) fn sampling_window() -> usize {
        super::DEFAULT_SAMPLING_WINDOW
    }
}

impl ClientConfig {
    /// Configuration pointing at the architecture-matched vendor library
    /// inside `sdk_dir`, with default timeouts.
    pub fn for_sdk_dir(sdk_dir: impl AsRef<Path>) -> Self {
        Self {
            library_path: sdk_dir.as_ref().join(default_library_name()),
            port: None,
            connect_timeout_ms: defaults::connect_timeout_ms(),
            sampling_window: defaults::sampling_window(),
        }
    }

    /// Load and validate a TOML configuration file.
    pub fn from_toml_path(path: impl AsRef<Path>) -> AecgResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)
            .map_err(|err| AecgError::Config(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check the configuration for values the session cannot work with.
    pub fn validate(&self) -> AecgResult<()> {
        if self.library_path.as_os_str().is_empty() {
            return Err(AecgError::Config("library_path must not be empty".into()));
        }
        if self.connect_timeout_ms == 0 {
            return Err(AecgError::Config(
                "connect_timeout_ms must be greater than 0".into(),
            ));
        }
        if self.sampling_window == 0 {
            return Err(AecgError::Config(
                "sampling_window must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}
