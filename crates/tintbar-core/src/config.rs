//! Configuration types and parsing.
//!
//! The file schema stays flat and serialization-friendly: colors are kept
//! as the strings the user wrote and only turned into a
//! [`StyleConfiguration`] after validation.

use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use toml::Table;

use crate::cache::DEFAULT_CACHE_CAPACITY;
use crate::cluster::ClusterOptions;
use crate::color::{Color, parse_hex_color};
use crate::error::{Error, Result};
use crate::style::{IconStyle, SignalIconMode, StyleConfiguration};

/// Embedded default configuration TOML, compiled into the binary.
pub const DEFAULT_CONFIG_TOML: &str = include_str!("../../../config.toml");

/// Result of loading a configuration file.
#[derive(Debug)]
pub struct ConfigLoadResult {
    /// The loaded configuration.
    pub config: Config,
    /// Path where config was found, if any.
    pub source: Option<PathBuf>,
    /// Whether defaults were used (no config file found).
    pub used_defaults: bool,
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Icon coloring and style.
    pub icons: IconsConfig,

    /// Activity glyph colors.
    pub data_activity: DataActivityConfig,

    /// Optional signal cluster features.
    pub signal_cluster: ClusterOptions,

    /// Artifact cache sizing.
    pub cache: CacheConfig,
}

impl Config {
    /// Load configuration from the embedded default TOML string.
    pub fn from_default_toml() -> Result<Self> {
        let config: Config = toml::from_str(DEFAULT_CONFIG_TOML)?;
        Ok(config)
    }

    /// Load configuration from a TOML file, merging with embedded defaults.
    ///
    /// User-provided values override defaults; missing sections or fields
    /// fall back to the embedded default config.
    ///
    /// Returns an error if the file doesn't exist or can't be parsed.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::ConfigNotFound(path.to_path_buf()));
        }

        let content = std::fs::read_to_string(path)?;
        Self::load_with_defaults(&content)
    }

    /// Load configuration from a TOML string, merging with embedded defaults.
    pub fn load_with_defaults(user_toml: &str) -> Result<Self> {
        let mut base: Table = toml::from_str(DEFAULT_CONFIG_TOML)?;
        let user: Table = toml::from_str(user_toml)?;

        deep_merge_toml(&mut base, user);

        let config: Config = base.try_into()?;
        Ok(config)
    }

    /// Find and load configuration using the XDG lookup chain.
    ///
    /// If `explicit_path` is `Some`, that path is used directly and an error
    /// is returned if it doesn't exist or can't be parsed (no fallback).
    ///
    /// If `explicit_path` is `None`, searches in order:
    /// 1. `$XDG_CONFIG_HOME/tintbar/config.toml`
    /// 2. `~/.config/tintbar/config.toml`
    /// 3. `./config.toml` (current working directory)
    ///
    /// If no config file is found in the search chain, the embedded default
    /// config is used.
    pub fn find_and_load(explicit_path: Option<&Path>) -> Result<ConfigLoadResult> {
        if let Some(path) = explicit_path {
            let config = Self::load(path)?;
            return Ok(ConfigLoadResult {
                config,
                source: Some(path.to_path_buf()),
                used_defaults: false,
            });
        }

        // A config file that exists but fails to load is an error, not a
        // reason to fall back to defaults.
        let search_paths = Self::config_search_paths();
        let mut first_error: Option<(PathBuf, Error)> = None;

        for path in &search_paths {
            if path.exists() {
                match Self::load(path) {
                    Ok(config) => {
                        return Ok(ConfigLoadResult {
                            config,
                            source: Some(path.clone()),
                            used_defaults: false,
                        });
                    }
                    Err(e) => {
                        if first_error.is_none() {
                            first_error = Some((path.clone(), e));
                        }
                    }
                }
            }
        }

        if let Some((path, error)) = first_error {
            tracing::error!(
                "Config file {:?} exists but failed to load: {}",
                path,
                error
            );
            return Err(error);
        }

        tracing::info!("No config file found, using built-in default config");
        tracing::debug!(
            "Searched: {}",
            search_paths
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(", ")
        );

        Ok(ConfigLoadResult {
            config: Self::from_default_toml()?,
            source: None,
            used_defaults: true,
        })
    }

    /// Get the list of paths to search for config files.
    pub fn config_search_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        if let Ok(xdg_config) = env::var("XDG_CONFIG_HOME") {
            paths.push(PathBuf::from(xdg_config).join("tintbar/config.toml"));
        }

        if let Ok(home) = env::var("HOME") {
            paths.push(PathBuf::from(home).join(".config/tintbar/config.toml"));
        }

        paths.push(PathBuf::from("config.toml"));

        paths
    }

    /// Validate the configuration, collecting every invalid value.
    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();

        let colors = [
            ("icons.color", &self.icons.color),
            ("icons.color_secondary", &self.icons.color_secondary),
            ("data_activity.color", &self.data_activity.color),
            (
                "data_activity.color_secondary",
                &self.data_activity.color_secondary,
            ),
        ];
        for (field, value) in colors {
            if parse_hex_color(value).is_none() {
                errors.push(format!(
                    "{}: invalid value '{}', expected a hex color like '#ffffff' or '#ffffffcc'",
                    field, value
                ));
            }
        }

        let alphas = [
            ("icons.alpha_signal_cluster", self.icons.alpha_signal_cluster),
            (
                "icons.alpha_text_and_battery",
                self.icons.alpha_text_and_battery,
            ),
        ];
        for (field, value) in alphas {
            if !(0.0..=1.0).contains(&value) {
                errors.push(format!(
                    "{}: invalid value '{}', must be between 0.0 and 1.0",
                    field, value
                ));
            }
        }

        if self.cache.capacity == 0 {
            errors.push("cache.capacity: must be greater than 0".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(Error::ConfigValidation(errors))
        }
    }

    /// Check for settings that are valid but have no effect.
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        let defaults = DataActivityConfig::default();

        if !self.signal_cluster.data_activity && self.data_activity != defaults {
            warnings.push(
                "data_activity: colors set but signal_cluster.data_activity is disabled"
                    .to_string(),
            );
        }

        if !self.icons.coloring_enabled && self.icons.signal_mode == SignalIconMode::Alternate {
            warnings.push(
                "icons.signal_mode: alternate icons are only used while coloring_enabled = true"
                    .to_string(),
            );
        }

        warnings
    }

    /// Style configuration described by this config.
    ///
    /// Fails on colors that do not parse; run [`validate`](Self::validate)
    /// first for a complete report.
    pub fn style(&self) -> Result<StyleConfiguration> {
        Ok(StyleConfiguration {
            coloring_enabled: self.icons.coloring_enabled,
            icon_color: [
                self.icons.color.parse::<Color>()?,
                self.icons.color_secondary.parse::<Color>()?,
            ],
            data_activity_color: [
                self.data_activity.color.parse::<Color>()?,
                self.data_activity.color_secondary.parse::<Color>()?,
            ],
            signal_icon_mode: self.icons.signal_mode,
            icon_style: self.icons.style,
            alpha_signal_cluster: self.icons.alpha_signal_cluster,
            alpha_text_and_battery: self.icons.alpha_text_and_battery,
        })
    }

    /// Print a human-readable summary of the configuration.
    pub fn summary(&self) -> String {
        let mut lines = Vec::new();

        lines.push("Icons:".to_string());
        lines.push(format!(
            "  coloring: {}",
            if self.icons.coloring_enabled {
                "enabled"
            } else {
                "disabled"
            }
        ));
        lines.push(format!("  signal_mode: {:?}", self.icons.signal_mode));
        lines.push(format!("  style: {:?}", self.icons.style));
        lines.push(format!(
            "  color: {} / {}",
            self.icons.color, self.icons.color_secondary
        ));
        lines.push(format!(
            "  alpha: signal cluster {}, text and battery {}",
            self.icons.alpha_signal_cluster, self.icons.alpha_text_and_battery
        ));

        lines.push("\nData activity:".to_string());
        lines.push(format!(
            "  color: {} / {}",
            self.data_activity.color, self.data_activity.color_secondary
        ));

        lines.push("\nSignal cluster:".to_string());
        lines.push(format!(
            "  connection_state: {}, data_activity: {}",
            self.signal_cluster.connection_state, self.signal_cluster.data_activity
        ));

        lines.push("\nCache:".to_string());
        lines.push(format!("  capacity: {}", self.cache.capacity));

        lines.join("\n")
    }
}

/// Deep merge two TOML tables, with `overlay` values taking precedence.
///
/// For nested tables, recursively merges. For arrays and other values,
/// the overlay value completely replaces the base value.
fn deep_merge_toml(base: &mut Table, overlay: Table) {
    for (key, overlay_value) in overlay {
        match (base.get_mut(&key), overlay_value) {
            (Some(toml::Value::Table(base_table)), toml::Value::Table(overlay_table)) => {
                deep_merge_toml(base_table, overlay_table);
            }
            (_, overlay_value) => {
                base.insert(key, overlay_value);
            }
        }
    }
}

/// Icon coloring configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IconsConfig {
    /// Master switch; off means every icon is the host's own.
    pub coloring_enabled: bool,

    /// Icon family for signal icons: "alternate", "native" or "disabled".
    pub signal_mode: SignalIconMode,

    /// Basic icon variant: "classic" or "modern".
    pub style: IconStyle,

    /// Primary tint (hex).
    pub color: String,

    /// Tint of the secondary icon in dual layouts (hex).
    pub color_secondary: String,

    /// Opacity of the signal cluster (0.0 - 1.0).
    pub alpha_signal_cluster: f32,

    /// Opacity of text and battery (0.0 - 1.0).
    pub alpha_text_and_battery: f32,
}

impl Default for IconsConfig {
    fn default() -> Self {
        Self {
            coloring_enabled: false,
            signal_mode: SignalIconMode::Native,
            style: IconStyle::Modern,
            color: "#ffffff".to_string(),
            color_secondary: "#ffffff".to_string(),
            alpha_signal_cluster: 1.0,
            alpha_text_and_battery: 1.0,
        }
    }
}

/// Activity glyph colors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DataActivityConfig {
    pub color: String,
    pub color_secondary: String,
}

impl Default for DataActivityConfig {
    fn default() -> Self {
        Self {
            color: "#ffffff".to_string(),
            color_secondary: "#ffffff".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
    /// Maximum number of rendered artifacts kept.
    pub capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}
