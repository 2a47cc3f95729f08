//! Error handling for repogen.
//!
//! This module provides:
//! - [`RepoError`]: The main error enum for all repogen operations
//! - [`ErrorCode`]: Standardized error codes for machine parsing
//! - [`StructuredError`]: Error envelope printed in robot mode

mod codes;

use std::io;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub use codes::ErrorCode;

/// Main error type for repogen operations.
#[derive(Error, Debug)]
pub enum RepoError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Cannot prepare output directory {}: {source}", path.display())]
    Setup { path: PathBuf, source: io::Error },

    #[error("Cannot list repository root {}: {source}", path.display())]
    RootUnreadable { path: PathBuf, source: io::Error },

    #[error("Cannot read {} for {addon}: {reason}", path.display())]
    FragmentRead {
        addon: String,
        path: PathBuf,
        reason: String,
    },

    #[error("Invalid addon descriptor {}: {reason}", path.display())]
    InvalidDescriptor { path: PathBuf, reason: String },

    #[error("Destination {} for addon {addon_id} already exists", path.display())]
    DuplicateDestination { addon_id: String, path: PathBuf },

    #[error("Archive failed for {addon}: {reason}")]
    Archive { addon: String, reason: String },

    #[error("Cannot hash {}: {source}", path.display())]
    Checksum { path: PathBuf, source: io::Error },

    #[error("Bootstrap failed: {0}")]
    Bootstrap(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Missing required config: {0}")]
    MissingConfig(String),
}

impl RepoError {
    /// Get the error code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Io(_) => ErrorCode::IoError,
            Self::Json(_) => ErrorCode::SerializationError,
            Self::Zip(_) | Self::Archive { .. } => ErrorCode::ArchiveFailure,
            Self::Setup { .. } => ErrorCode::SetupFailure,
            Self::RootUnreadable { .. } => ErrorCode::RootUnreadable,
            Self::FragmentRead { .. } => ErrorCode::FragmentReadFailure,
            Self::InvalidDescriptor { .. } => ErrorCode::InvalidDescriptor,
            Self::DuplicateDestination { .. } => ErrorCode::DuplicateDestination,
            Self::Checksum { .. } => ErrorCode::ChecksumFailure,
            Self::Bootstrap(_) => ErrorCode::BootstrapFailure,
            Self::Config(_) => ErrorCode::ConfigInvalid,
            Self::MissingConfig(_) => ErrorCode::ConfigMissingRequired,
        }
    }

    /// Get context information for this error as JSON.
    #[must_use]
    pub fn context(&self) -> Option<Value> {
        match self {
            Self::Setup { path, .. }
            | Self::RootUnreadable { path, .. }
            | Self::InvalidDescriptor { path, .. }
            | Self::Checksum { path, .. } => {
                Some(serde_json::json!({ "path": path.display().to_string() }))
            }
            Self::FragmentRead { addon, path, .. } => Some(serde_json::json!({
                "addon": addon,
                "path": path.display().to_string(),
            })),
            Self::DuplicateDestination { addon_id, path } => Some(serde_json::json!({
                "addon_id": addon_id,
                "path": path.display().to_string(),
            })),
            Self::Archive { addon, .. } => Some(serde_json::json!({ "addon": addon })),
            Self::MissingConfig(key) => Some(serde_json::json!({ "config_key": key })),
            _ => None,
        }
    }

    /// Convert this error to a structured error.
    #[must_use]
    pub fn to_structured(&self) -> StructuredError {
        StructuredError::from_repo_error(self)
    }
}

/// A structured error with machine-readable code, suggestion, and context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredError {
    /// The error code (e.g., "SETUP_FAILURE")
    pub code: ErrorCode,

    /// The numeric error code (e.g., 101)
    pub numeric_code: u16,

    /// Human-readable error message
    pub message: String,

    /// Actionable suggestion for recovery
    pub suggestion: String,

    /// Additional context for debugging
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,

    /// Error category (e.g., "setup", "config")
    pub category: String,
}

impl StructuredError {
    /// Create a new structured error.
    #[must_use]
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            numeric_code: code.numeric(),
            suggestion: code.suggestion().to_string(),
            context: None,
            category: code.category().to_string(),
            code,
            message: message.into(),
        }
    }

    /// Create a structured error from a [`RepoError`].
    #[must_use]
    pub fn from_repo_error(err: &RepoError) -> Self {
        let mut structured = Self::new(err.code(), err.to_string());
        structured.context = err.context();
        structured
    }
}

impl std::fmt::Display for StructuredError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl From<&RepoError> for StructuredError {
    fn from(err: &RepoError) -> Self {
        Self::from_repo_error(err)
    }
}

/// Result type alias using RepoError.
pub type Result<T> = std::result::Result<T, RepoError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repo_error_code_mapping() {
        let err = RepoError::Setup {
            path: PathBuf::from("_zips"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };
        assert_eq!(err.code(), ErrorCode::SetupFailure);
        assert!(err.code().is_fatal());

        let err = RepoError::DuplicateDestination {
            addon_id: "plugin.video.foo".into(),
            path: PathBuf::from("_zips/plugin.video.foo"),
        };
        assert_eq!(err.code(), ErrorCode::DuplicateDestination);
        assert!(!err.code().is_fatal());

        assert_eq!(
            RepoError::Config("bad".into()).code(),
            ErrorCode::ConfigInvalid
        );
    }

    #[test]
    fn test_messages_name_path_and_cause() {
        let err = RepoError::FragmentRead {
            addon: "foo".into(),
            path: PathBuf::from("foo/addon.xml"),
            reason: "stream did not contain valid UTF-8".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("foo/addon.xml"));
        assert!(msg.contains("for foo"));
        assert!(msg.contains("valid UTF-8"));
    }

    #[test]
    fn test_structured_error_context() {
        let err = RepoError::DuplicateDestination {
            addon_id: "foo".into(),
            path: PathBuf::from("out/foo"),
        };
        let structured = err.to_structured();
        assert_eq!(structured.numeric_code, 301);
        assert_eq!(structured.category, "packaging");
        let ctx = structured.context.unwrap();
        assert_eq!(ctx.get("addon_id").unwrap(), "foo");
    }

    #[test]
    fn test_structured_error_serialization() {
        let err = StructuredError::new(ErrorCode::SetupFailure, "cannot remove _zips");
        let json = serde_json::to_string(&err).unwrap();
        assert!(json.contains("SETUP_FAILURE"));
        assert!(json.contains("\"numeric_code\":101"));
        assert!(json.contains("\"category\":\"setup\""));
        assert!(!json.contains("context"));
    }

    #[test]
    fn test_structured_error_display() {
        let err = StructuredError::new(ErrorCode::ConfigInvalid, "bad toml");
        assert_eq!(err.to_string(), "[E701] bad toml");
    }
}
