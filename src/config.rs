use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::Deserialize;

use crate::error::FilterError;
use crate::registry::DEFAULT_ACCENT_COLOR;

pub const DEFAULT_NAME: &str = "mute_senders";
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Plugin settings. Built with [`PluginConfig::builder`] or read from TOML.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginConfig {
    /// Prefix for preference keys (`<name>_muted`, `<name>_color`).
    pub name: String,
    pub default_color: String,
    /// Where preferences live. `None` keeps them in memory only.
    pub prefs_path: Option<PathBuf>,
    pub log_level: String,
}

pub struct PluginConfigBuilder {
    name: String,
    default_color: String,
    prefs_path: Option<PathBuf>,
    log_level: String,
}

/// On-disk shape; every key optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    name: Option<String>,
    default_color: Option<String>,
    prefs_path: Option<PathBuf>,
    log_level: Option<String>,
}

impl PluginConfig {
    pub fn builder() -> PluginConfigBuilder {
        PluginConfigBuilder {
            name: DEFAULT_NAME.to_string(),
            default_color: DEFAULT_ACCENT_COLOR.to_string(),
            prefs_path: None,
            log_level: "info".to_string(),
        }
    }

    /// Builder seeded from a TOML file. Keys missing from the file keep
    /// their defaults, so the result can still be adjusted before `build`.
    pub fn from_file(path: &Path) -> Result<PluginConfigBuilder, FilterError> {
        let text = fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> Result<PluginConfigBuilder, FilterError> {
        let file: ConfigFile = toml::from_str(text)?;
        let mut builder = Self::builder();
        if let Some(name) = file.name {
            builder = builder.name(name);
        }
        if let Some(color) = file.default_color {
            builder = builder.default_color(color);
        }
        if let Some(path) = file.prefs_path {
            builder = builder.prefs_path(path);
        }
        if let Some(level) = file.log_level {
            builder = builder.log_level(level);
        }
        Ok(builder)
    }
}

impl PluginConfigBuilder {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn default_color(mut self, color: impl Into<String>) -> Self {
        self.default_color = color.into();
        self
    }

    pub fn prefs_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.prefs_path = Some(path.into());
        self
    }

    /// Keep preferences in the platform config dir, e.g.
    /// `~/.config/nickfilter/prefs.toml`.
    pub fn default_prefs_path(mut self) -> Self {
        self.prefs_path = default_prefs_path();
        self
    }

    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    pub fn build(self) -> PluginConfig {
        PluginConfig {
            name: self.name,
            default_color: self.default_color,
            prefs_path: self.prefs_path,
            log_level: self.log_level,
        }
    }
}

pub fn default_prefs_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "nickfilter").map(|dirs| dirs.config_dir().join("prefs.toml"))
}
