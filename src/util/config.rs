//! Configuration file support for spackle.
//!
//! spackle reads two configuration file locations:
//! - Global: `~/.spackle/config.toml` - User-wide defaults
//! - Project: `.spackle/config.toml` - Project-specific overrides
//!
//! Project config takes precedence over global config.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::builder::ArgumentStyle;

/// spackle configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Spelling of generated arguments
    pub arguments: ArgumentsConfig,

    /// Recipe lookup
    pub recipes: RecipesConfig,
}

/// Overrides for how generated arguments are spelled.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ArgumentsConfig {
    /// Value for enabled boolean variants (default `ON`)
    pub on: Option<String>,

    /// Value for disabled boolean variants (default `OFF`)
    pub off: Option<String>,

    /// Separator for multi-valued variants (default `;`)
    pub list_separator: Option<String>,
}

/// Where recipes are looked up by package name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RecipesConfig {
    /// Directories searched in order for `<package>.toml`
    pub paths: Vec<PathBuf>,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if file doesn't exist.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {:#}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: Config) {
        if other.arguments.on.is_some() {
            self.arguments.on = other.arguments.on;
        }
        if other.arguments.off.is_some() {
            self.arguments.off = other.arguments.off;
        }
        if other.arguments.list_separator.is_some() {
            self.arguments.list_separator = other.arguments.list_separator;
        }

        // Project search paths come first.
        if !other.recipes.paths.is_empty() {
            let mut paths = other.recipes.paths;
            paths.extend(std::mem::take(&mut self.recipes.paths));
            self.recipes.paths = paths;
        }
    }

    /// Argument spelling with configured overrides applied.
    pub fn argument_style(&self) -> ArgumentStyle {
        let mut style = ArgumentStyle::default();
        if let Some(on) = &self.arguments.on {
            style.on = on.clone();
        }
        if let Some(off) = &self.arguments.off {
            style.off = off.clone();
        }
        if let Some(sep) = &self.arguments.list_separator {
            style.list_separator = sep.clone();
        }
        style
    }
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (.spackle/config.toml)
/// 2. Global config (~/.spackle/config.toml)
/// 3. Defaults
pub fn load_config(global_path: &Path, project_path: &Path) -> Config {
    let mut config = Config::default();

    if global_path.exists() {
        config.merge(Config::load_or_default(global_path));
    }

    if project_path.exists() {
        config.merge(Config::load_or_default(project_path));
    }

    config
}

/// Get the global spackle config directory (~/.spackle).
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".spackle"))
}

/// Get the global config path (~/.spackle/config.toml).
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("config.toml"))
}

/// Get the project config path (.spackle/config.toml).
pub fn project_config_path(project_root: &Path) -> PathBuf {
    project_root.join(".spackle").join("config.toml")
}
