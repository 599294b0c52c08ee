//! Layer-library configuration.
//!
//! Handles loading, validating, and merging `face-builder.toml`. The file
//! lives next to the layer images and is optional: stock defaults are used for
//! every key it does not set.
//!
//! ## Config File Location
//!
//! ```text
//! layers/
//! ├── face-builder.toml        # Library config (optional)
//! ├── face_definition.json     # Stacking order (optional)
//! ├── face_head1.png
//! ├── face_head1.png.import    # Sidecar, ignored
//! ├── face_eyes1.png
//! └── face_eyes2.png
//! ```
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! definition = "face_definition.json"  # Stacking order file, relative to the layers dir
//!
//! [parts]
//! token_index = 1                    # Which `_` token holds the category
//! separator = "_"                    # Token separator (single character)
//! ignore_suffixes = [".import"]      # Sidecar files skipped during the scan
//! texture_suffix = ".ase_layer_tex"  # Packer marker stripped from names
//!
//! [render]
//! seed = 42                 # Fixed RNG seed (omit for a fresh face every run)
//!
//! [processing]
//! max_processes = 4         # Max parallel blend workers (omit for auto = CPU cores)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::naming::{DEFAULT_SEPARATOR, DEFAULT_TOKEN_INDEX};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// File name looked up in the layers directory.
pub const CONFIG_FILENAME: &str = "face-builder.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Library configuration loaded from `face-builder.toml`.
///
/// All fields have defaults matching the usual sprite export layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FaceConfig {
    /// Path of the stacking-order definition, relative to the layers directory.
    pub definition: String,
    /// Layer file naming rules.
    pub parts: PartsConfig,
    /// Random selection settings.
    pub render: RenderConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl Default for FaceConfig {
    fn default() -> Self {
        Self {
            definition: "face_definition.json".to_string(),
            parts: PartsConfig::default(),
            render: RenderConfig::default(),
            processing: ProcessingConfig::default(),
        }
    }
}

impl FaceConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.definition.trim().is_empty() {
            return Err(ConfigError::Validation(
                "definition must not be empty".into(),
            ));
        }
        if self.parts.ignore_suffixes.iter().any(|s| s.is_empty()) {
            return Err(ConfigError::Validation(
                "parts.ignore_suffixes entries must not be empty".into(),
            ));
        }
        Ok(())
    }
}

/// Layer file naming rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PartsConfig {
    /// Zero-based token position of the category in a file name.
    pub token_index: usize,
    /// Character splitting a file name into tokens.
    pub separator: char,
    /// Files ending with any of these are sidecars and are skipped.
    pub ignore_suffixes: Vec<String>,
    /// Marker removed from file names before deduplication and classification.
    pub texture_suffix: String,
}

impl Default for PartsConfig {
    fn default() -> Self {
        Self {
            token_index: DEFAULT_TOKEN_INDEX,
            separator: DEFAULT_SEPARATOR,
            ignore_suffixes: vec![".import".to_string()],
            texture_suffix: ".ase_layer_tex".to_string(),
        }
    }
}

/// Random selection settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderConfig {
    /// Fixed seed for reproducible random faces. `None` seeds from the OS.
    pub seed: Option<u64>,
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel blend workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

/// Resolve the RNG seed for a random face.
///
/// An explicit seed (from the command line) wins over `[render] seed`.
/// `None` means seed from the OS.
pub fn effective_seed(explicit: Option<u64>, config: &RenderConfig) -> Option<u64> {
    explicit.or(config.seed)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(FaceConfig::default()).expect("default config must serialize")
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

/// Load `face-builder.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(dir: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = dir.join(CONFIG_FILENAME);
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<FaceConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: FaceConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `face-builder.toml` in the given layers directory.
///
/// A missing directory or file yields the stock defaults.
pub fn load_config(dir: &Path) -> Result<FaceConfig, ConfigError> {
    let base = stock_defaults_value();
    let overlay = load_raw_config(dir)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `face-builder.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# face-builder configuration
# ===========================
# Place this file in the layers directory as face-builder.toml.
# All settings are optional. Values shown below are the defaults.
# Unknown keys will cause an error.

# Stacking-order definition (JSON), relative to the layers directory.
# Its "order" array lists categories bottom to top. Without it, random faces
# stack categories in the order they first appear in the sorted file list,
# and faces built from explicit indices come out empty.
definition = "face_definition.json"

# ---------------------------------------------------------------------------
# Layer file naming
# ---------------------------------------------------------------------------
[parts]
# Zero-based position of the category token. With the default "_" separator,
# face_head2.png splits into ["face", "head2"] and token 1 gives "head".
token_index = 1

# Token separator (a single character).
separator = "_"

# Files ending with any of these suffixes are skipped (import sidecars etc.).
ignore_suffixes = [".import"]

# Marker removed from file names before classification. Two files that are
# equal once the marker is removed count as one layer; the later one wins.
texture_suffix = ".ase_layer_tex"

# ---------------------------------------------------------------------------
# Random faces
# ---------------------------------------------------------------------------
[render]
# Fixed seed for reproducible random faces.
# Omit or comment out for a different face every run.
# seed = 42

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel blend workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}
