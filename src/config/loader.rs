//! Configuration loading and discovery for `petpet.toml`
//!
//! Provides functions to find, load, and merge configuration.

use super::schema::PetpetConfig;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the configuration file searched for
pub const CONFIG_FILE: &str = "petpet.toml";

/// Configuration loading error
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// File I/O error
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error
    #[error("Failed to parse petpet.toml: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error
    #[error("Config validation failed:\n{}", .0.iter().map(|e| format!("  - {}", e)).collect::<Vec<_>>().join("\n"))]
    Validation(Vec<String>),
}

/// CLI arguments that can override config values
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    /// Override templates root
    pub templates: Option<PathBuf>,
    /// Override batch output directory
    pub out_dir: Option<PathBuf>,
    /// Override log filter
    pub log_level: Option<String>,
    /// Override the batch template list
    pub batch_templates: Option<Vec<String>>,
}

/// Find petpet.toml by walking up from the current working directory.
///
/// Search order:
/// 1. Walk up from current directory looking for petpet.toml
/// 2. Check XDG_CONFIG_HOME/petpet/petpet.toml (or ~/.config/petpet/petpet.toml)
pub fn find_config() -> Option<PathBuf> {
    if let Ok(cwd) = env::current_dir() {
        if let Some(path) = find_config_from(cwd) {
            return Some(path);
        }
    }

    find_xdg_config()
}

/// Find petpet.toml in the XDG config directory.
pub fn find_xdg_config() -> Option<PathBuf> {
    let xdg_config = env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|_| env::var("HOME").map(|h| PathBuf::from(h).join(".config")))
        .ok()?;

    let config_path = xdg_config.join("petpet").join(CONFIG_FILE);
    config_path.exists().then_some(config_path)
}

/// Find petpet.toml by walking up from a specific directory.
pub fn find_config_from(start: PathBuf) -> Option<PathBuf> {
    let mut current = start;

    loop {
        let config_path = current.join(CONFIG_FILE);
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            return None;
        }
    }
}

/// Load configuration from a petpet.toml file.
///
/// If a path is provided, loads from that file. Otherwise, uses `find_config()`
/// to locate the config file. If no config file is found, returns a default
/// configuration.
///
/// Relative paths inside a loaded file are resolved against the file's directory.
///
/// # Example
/// ```ignore
/// let config = load_config(None)?;
/// let config = load_config(Some(Path::new("deploy/petpet.toml")))?;
/// ```
pub fn load_config(path: Option<&Path>) -> Result<PetpetConfig, ConfigError> {
    let config_path = match path {
        Some(p) => Some(p.to_path_buf()),
        None => find_config(),
    };

    match config_path {
        Some(p) => load_config_file(&p),
        None => Ok(default_config()),
    }
}

fn load_config_file(path: &Path) -> Result<PetpetConfig, ConfigError> {
    let contents = fs::read_to_string(path)?;
    let mut config: PetpetConfig = toml::from_str(&contents)?;

    let errors = config.validate();
    if !errors.is_empty() {
        return Err(ConfigError::Validation(errors.into_iter().map(|e| e.to_string()).collect()));
    }

    if let Some(root) = config_root(path) {
        config.templates.root = resolve_path(root, &config.templates.root);
        config.output.dir = resolve_path(root, &config.output.dir);
    }

    Ok(config)
}

/// Create a default configuration when no petpet.toml is found.
///
/// Paths stay relative to the current directory.
pub fn default_config() -> PetpetConfig {
    PetpetConfig::default()
}

/// Merge CLI overrides into a configuration.
///
/// CLI arguments take precedence over config file values. A template list
/// given on the command line replaces the configured batch list and uses each
/// template's natural output kind.
pub fn merge_cli_overrides(config: &mut PetpetConfig, overrides: &CliOverrides) {
    if let Some(ref templates) = overrides.templates {
        config.templates.root = templates.clone();
    }

    if let Some(ref out_dir) = overrides.out_dir {
        config.output.dir = out_dir.clone();
    }

    if let Some(ref level) = overrides.log_level {
        config.logging.level = level.clone();
    }

    if let Some(ref names) = overrides.batch_templates {
        config.batch.templates = names
            .iter()
            .map(|name| super::schema::BatchEntry { name: name.clone(), kind: None, text: None })
            .collect();
    }
}

/// Directory containing a config file.
pub fn config_root(config_path: &Path) -> Option<&Path> {
    config_path.parent().filter(|p| !p.as_os_str().is_empty())
}

/// Resolve a path relative to a base directory.
///
/// If the path is absolute, returns it unchanged.
pub fn resolve_path(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}
