//! Configuration module
//!
//! JSON configuration for the direct passthrough layer.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Error, Result};
use crate::mode::Mode;

/// Direct-mode configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectConfig {
    /// Operating mode: "origin" or "direct"
    #[serde(default = "default_mode")]
    pub mode: String,

    /// Emit state-transition diagnostics
    #[serde(default)]
    pub debug: bool,

    /// Outbound bytes inspected before the connection is trusted for full
    /// passthrough
    #[serde(default = "default_scan_window")]
    pub scan_window: usize,
}

fn default_mode() -> String {
    "origin".to_string()
}

fn default_scan_window() -> usize {
    // One maximum-size TLS record
    16 * 1024
}

impl Default for DirectConfig {
    fn default() -> Self {
        Self {
            mode: default_mode(),
            debug: false,
            scan_window: default_scan_window(),
        }
    }
}

impl DirectConfig {
    /// Load configuration from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read config file: {}", e)))?;
        Self::from_json(&content)
    }

    /// Parse configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))
    }

    /// Parsed operating mode. Unrecognized strings resolve to `Origin`.
    pub fn mode(&self) -> Mode {
        Mode::parse(&self.mode)
    }
}
