//! Configuration schema types for `petpet.toml`
//!
//! Defines the structure and validation rules for the generator host configuration.

use crate::models::OutputKind;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Template directory settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplatesConfig {
    /// Root directory holding one subdirectory per template
    #[serde(default = "default_templates_root")]
    pub root: PathBuf,
    /// Keep loaded templates in memory between calls
    #[serde(default)]
    pub cache: bool,
}

impl Default for TemplatesConfig {
    fn default() -> Self {
        Self { root: default_templates_root(), cache: false }
    }
}

fn default_templates_root() -> PathBuf {
    PathBuf::from("templates")
}

/// Output settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory for batch output
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { dir: default_output_dir() }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive; `RUST_LOG` takes precedence
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: default_log_level(), json: false }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// One template in the batch list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchEntry {
    pub name: String,
    /// Output kind; the template's own type when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<OutputKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl BatchEntry {
    fn new(name: &str, kind: OutputKind) -> Self {
        Self { name: name.to_string(), kind: Some(kind), text: None }
    }
}

/// Batch generation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    #[serde(default = "default_batch_templates")]
    pub templates: Vec<BatchEntry>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self { templates: default_batch_templates() }
    }
}

fn default_batch_templates() -> Vec<BatchEntry> {
    let animated = ["petpet", "pat", "kiss"].map(|n| BatchEntry::new(n, OutputKind::Animated));
    let still = ["perfect", "anyasuki", "dinosaur"].map(|n| BatchEntry::new(n, OutputKind::Static));
    animated.into_iter().chain(still).collect()
}

/// Complete `petpet.toml` configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PetpetConfig {
    #[serde(default)]
    pub templates: TemplatesConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub batch: BatchConfig,
}

/// Configuration validation error
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigValidationError {
    /// Path to the invalid field (e.g., "batch.templates[2].name")
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "petpet.toml: '{}' {}", self.field, self.message)
    }
}

impl PetpetConfig {
    /// Validate the configuration and return any errors
    pub fn validate(&self) -> Vec<ConfigValidationError> {
        let mut errors = Vec::new();

        if self.templates.root.as_os_str().is_empty() {
            errors.push(ConfigValidationError {
                field: "templates.root".to_string(),
                message: "must be a non-empty path".to_string(),
            });
        }

        if self.output.dir.as_os_str().is_empty() {
            errors.push(ConfigValidationError {
                field: "output.dir".to_string(),
                message: "must be a non-empty path".to_string(),
            });
        }

        if self.logging.level.trim().is_empty() {
            errors.push(ConfigValidationError {
                field: "logging.level".to_string(),
                message: "must be a non-empty filter directive".to_string(),
            });
        }

        for (i, entry) in self.batch.templates.iter().enumerate() {
            if entry.name.trim().is_empty() {
                errors.push(ConfigValidationError {
                    field: format!("batch.templates[{}].name", i),
                    message: "must be a non-empty template name".to_string(),
                });
            }
        }

        errors
    }

    /// Check if validation passed
    pub fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }
}
