//! Resizer configuration module.
//!
//! Handles loading, validating, and merging a `config.toml`. Stock defaults
//! are overridden by whatever keys the user file sets; everything else keeps
//! its default.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [resize]
//! format = "jpg"                # Output encoding: "jpg" or "png"
//! quality = 0.75                # JPEG quality, 0.0-1.0 (ignored for PNG)
//! filter = "lanczos3"           # "bilinear", "catmull_rom", or "lanczos3"
//! preserve_aspect_ratio = true  # Fit inside width x height instead of stretching
//!
//! [store]
//! format = "jpg"
//! quality = 1.0
//! directory = "."               # Where `store` writes when no directory is given
//!
//! [limits]
//! max_input_pixels = 100000000
//! max_output_pixels = 100000000
//! max_alloc_bytes = 536870912
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::{Encoding, Filter, ResizeLimits};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Resizer configuration loaded from `config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResizerConfig {
    /// Defaults for `resize`.
    pub resize: ResizeConfig,
    /// Defaults for `store`.
    pub store: StoreConfig,
    /// Resource limits for decoding and resampling.
    pub limits: LimitsConfig,
}

impl ResizerConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.resize.quality) {
            return Err(ConfigError::Validation(
                "resize.quality must be 0.0-1.0".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.store.quality) {
            return Err(ConfigError::Validation(
                "store.quality must be 0.0-1.0".into(),
            ));
        }
        if self.store.directory.trim().is_empty() {
            return Err(ConfigError::Validation(
                "store.directory must not be empty".into(),
            ));
        }
        let limits = &self.limits;
        if limits.max_input_pixels == 0 || limits.max_output_pixels == 0 || limits.max_alloc_bytes == 0
        {
            return Err(ConfigError::Validation(
                "limits must be non-zero".into(),
            ));
        }
        Ok(())
    }
}

/// Resize defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResizeConfig {
    pub format: Encoding,
    pub quality: f32,
    pub filter: Filter,
    pub preserve_aspect_ratio: bool,
}

impl Default for ResizeConfig {
    fn default() -> Self {
        Self {
            format: Encoding::Jpeg,
            quality: 0.75,
            filter: Filter::Lanczos3,
            preserve_aspect_ratio: true,
        }
    }
}

/// Store defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    pub format: Encoding,
    pub quality: f32,
    pub directory: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            format: Encoding::Jpeg,
            quality: 1.0,
            directory: ".".to_string(),
        }
    }
}

/// Resource limits. See [`ResizeLimits`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LimitsConfig {
    pub max_input_pixels: u64,
    pub max_output_pixels: u64,
    pub max_alloc_bytes: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        let limits = ResizeLimits::default();
        Self {
            max_input_pixels: limits.max_input_pixels,
            max_output_pixels: limits.max_output_pixels,
            max_alloc_bytes: limits.max_alloc_bytes,
        }
    }
}

impl LimitsConfig {
    pub fn to_limits(&self) -> ResizeLimits {
        ResizeLimits {
            max_input_pixels: self.max_input_pixels,
            max_output_pixels: self.max_output_pixels,
            max_alloc_bytes: self.max_alloc_bytes,
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the base layer user overrides are merged on top of.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    toml::Value::try_from(ResizerConfig::default())
        .map_err(|e| ConfigError::Validation(format!("default config must serialize: {e}")))
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<ResizerConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: ResizerConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load configuration from `path`, or stock defaults when no path is given.
///
/// An explicit path that does not exist is an error.
pub fn load_config(path: Option<&Path>) -> Result<ResizerConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let overlay = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            Some(toml::from_str::<toml::Value>(&content)?)
        }
        None => None,
    };
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# image-resizer configuration
# ===========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys cause an error.

# ---------------------------------------------------------------------------
# Resize defaults (command-line flags win over these)
# ---------------------------------------------------------------------------
[resize]
# Output encoding: "jpg" or "png".
format = "jpg"

# JPEG quality, 0.0 (smallest file) to 1.0 (highest fidelity). PNG ignores it.
quality = 0.75

# Resampling filter: "bilinear", "catmull_rom", or "lanczos3".
filter = "lanczos3"

# With both width and height given: true fits inside the box keeping the
# aspect ratio, false stretches to exactly width x height.
preserve_aspect_ratio = true

# ---------------------------------------------------------------------------
# Store defaults
# ---------------------------------------------------------------------------
[store]
format = "jpg"
quality = 1.0

# Directory used when no --directory is given.
directory = "."

# ---------------------------------------------------------------------------
# Resource limits
# ---------------------------------------------------------------------------
[limits]
# Largest source image accepted, in pixels (width * height).
max_input_pixels = 100000000

# Largest output image produced, in pixels.
max_output_pixels = 100000000

# Largest single decoder allocation, in bytes.
max_alloc_bytes = 536870912
"##
}
