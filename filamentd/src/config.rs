//! Daemon configuration, loaded from the data directory when present.
//!
//! Every field has a default, so a partial config file is valid and no file
//! at all means a fully default daemon.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::paths::AppPaths;

fn default_hidden_width() -> usize {
    2
}

fn default_seed() -> u64 {
    7
}

fn default_render_hz() -> u32 {
    30
}

fn default_cooldown_ms() -> u64 {
    100
}

fn default_dwell_ms() -> u64 {
    2000
}

fn default_mode() -> DisplayMode {
    DisplayMode::Live
}

fn default_drift_digit() -> u8 {
    8
}

fn default_spi_device() -> String {
    "/dev/spidev0.0".to_string()
}

fn default_learning_rate() -> f32 {
    0.1
}

fn default_momentum() -> f32 {
    0.9
}

/// What the render loop puts on the rig.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayMode {
    /// Cycle the digits through the live classifier.
    Live,
    /// Animate one digit's segments away from their lit state.
    Drift,
    /// Per-channel shimmer, no network involved.
    Idle,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Hidden units; must match the rig's indicator banks.
    #[serde(default = "default_hidden_width")]
    pub hidden_width: usize,
    /// Weight init seed.
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default = "default_render_hz")]
    pub render_hz: u32,
    /// Delay between training epochs.
    #[serde(default = "default_cooldown_ms")]
    pub cooldown_ms: u64,
    /// How long live mode dwells on each digit.
    #[serde(default = "default_dwell_ms")]
    pub dwell_ms: u64,
    #[serde(default = "default_mode")]
    pub mode: DisplayMode,
    /// Digit the drift animation starts from.
    #[serde(default = "default_drift_digit")]
    pub drift_digit: u8,
    #[serde(default = "default_spi_device")]
    pub spi_device: String,
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f32,
    #[serde(default = "default_momentum")]
    pub momentum: f32,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            hidden_width: default_hidden_width(),
            seed: default_seed(),
            render_hz: default_render_hz(),
            cooldown_ms: default_cooldown_ms(),
            dwell_ms: default_dwell_ms(),
            mode: default_mode(),
            drift_digit: default_drift_digit(),
            spi_device: default_spi_device(),
            learning_rate: default_learning_rate(),
            momentum: default_momentum(),
        }
    }
}

impl DaemonConfig {
    /// Read the config file if one exists; defaults otherwise. A malformed
    /// file is reported and ignored, not fatal.
    pub fn load(paths: &AppPaths) -> Self {
        let path = paths.config_file();
        match std::fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(config) => config,
                Err(e) => {
                    warn!("Ignoring malformed config {}: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        }
    }
}
