//! Error and warning types for meme generation

use std::fmt;
use thiserror::Error;

/// Discriminant of everything that can go wrong during a generation call.
///
/// `FontUnavailable` and `TextDrawFailed` only ever tag a [`Warning`]; they are
/// recovered locally and never abort a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    TemplateNotFound,
    TemplateConfigInvalid,
    SourceImageInvalid,
    FontUnavailable,
    TextDrawFailed,
    EncodeFailed,
    Io,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::TemplateNotFound => "template_not_found",
            ErrorKind::TemplateConfigInvalid => "template_config_invalid",
            ErrorKind::SourceImageInvalid => "source_image_invalid",
            ErrorKind::FontUnavailable => "font_unavailable",
            ErrorKind::TextDrawFailed => "text_draw_failed",
            ErrorKind::EncodeFailed => "encode_failed",
            ErrorKind::Io => "io",
        };
        f.write_str(name)
    }
}

/// Error returned by a failed generation call.
///
/// A call that returns an error never produced any output bytes.
#[derive(Debug, Error)]
pub enum PetpetError {
    /// Template directory, config file or frame `0.png` is missing
    #[error("template '{template}' not found: {detail}")]
    TemplateNotFound { template: String, detail: String },
    /// Config exists but cannot be parsed or holds invalid values
    #[error("template '{template}' has an invalid config: {detail}")]
    TemplateConfigInvalid { template: String, detail: String },
    /// Caller-supplied source bytes could not be decoded
    #[error("source image could not be decoded: {0}")]
    SourceImageInvalid(String),
    /// The output codec rejected the composed frames
    #[error("failed to encode output: {0}")]
    EncodeFailed(String),
    /// IO error while writing output on behalf of a host
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PetpetError {
    pub fn not_found(template: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::TemplateNotFound { template: template.into(), detail: detail.into() }
    }

    pub fn invalid_config(template: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::TemplateConfigInvalid { template: template.into(), detail: detail.into() }
    }

    /// The kind tag carried by this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            PetpetError::TemplateNotFound { .. } => ErrorKind::TemplateNotFound,
            PetpetError::TemplateConfigInvalid { .. } => ErrorKind::TemplateConfigInvalid,
            PetpetError::SourceImageInvalid(_) => ErrorKind::SourceImageInvalid,
            PetpetError::EncodeFailed(_) => ErrorKind::EncodeFailed,
            PetpetError::Io(_) => ErrorKind::Io,
        }
    }
}

/// Result alias used across the engine.
pub type Result<T> = std::result::Result<T, PetpetError>;

/// A non-fatal problem recovered during generation
#[derive(Debug, Clone, PartialEq)]
pub struct Warning {
    pub kind: ErrorKind,
    pub message: String,
}

impl Warning {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into() }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}
