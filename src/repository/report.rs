//! Explicit outcome values for skip-and-continue steps.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{error, warn};

use super::Candidate;
use crate::error::{ErrorCode, RepoError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Something optional was left out; the addon is still published.
    Warning,
    /// The addon (or file) was skipped.
    Error,
}

impl Severity {
    #[must_use]
    pub const fn for_code(code: ErrorCode) -> Self {
        match code {
            ErrorCode::AssetMissing
            | ErrorCode::AssetAmbiguous
            | ErrorCode::AssetCopyFailure
            | ErrorCode::ChecksumFailure
            | ErrorCode::BootstrapFailure => Self::Warning,
            _ => Self::Error,
        }
    }
}

/// A recoverable problem recorded during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    pub code: ErrorCode,
    pub severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub addon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    pub message: String,
}

impl Issue {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            severity: Severity::for_code(code),
            addon: None,
            path: None,
            message: message.into(),
        }
    }

    /// Convert an error caught at item scope.
    pub fn from_error(err: &RepoError) -> Self {
        let mut issue = Self::new(err.code(), err.to_string());
        match err {
            RepoError::FragmentRead { addon, path, .. } => {
                issue.addon = Some(addon.clone());
                issue.path = Some(path.clone());
            }
            RepoError::DuplicateDestination { addon_id, path } => {
                issue.addon = Some(addon_id.clone());
                issue.path = Some(path.clone());
            }
            RepoError::Archive { addon, .. } => issue.addon = Some(addon.clone()),
            RepoError::InvalidDescriptor { path, .. }
            | RepoError::Checksum { path, .. }
            | RepoError::Setup { path, .. } => issue.path = Some(path.clone()),
            _ => {}
        }
        issue
    }

    #[must_use]
    pub fn with_addon(mut self, addon: impl Into<String>) -> Self {
        self.addon = Some(addon.into());
        self
    }

    #[must_use]
    pub fn with_path(mut self, path: impl AsRef<Path>) -> Self {
        self.path = Some(path.as_ref().to_path_buf());
        self
    }

    pub const fn is_warning(&self) -> bool {
        matches!(self.severity, Severity::Warning)
    }

    /// Emit this issue through tracing.
    pub fn log(&self) {
        let addon = self.addon.as_deref().unwrap_or("-");
        match self.severity {
            Severity::Warning => warn!(code = %self.code, addon, "{}", self.message),
            Severity::Error => error!(code = %self.code, addon, "{}", self.message),
        }
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AddonStatus {
    Packaged,
    PackagedWithWarnings,
    Skipped,
}

/// Result of packaging one candidate and copying its assets.
#[derive(Debug, Clone, Serialize)]
pub struct AddonOutcome {
    pub dir_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub addon_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archive: Option<PathBuf>,
    pub assets: Vec<PathBuf>,
    pub issues: Vec<Issue>,
}

impl AddonOutcome {
    pub fn new(candidate: &Candidate) -> Self {
        Self {
            dir_name: candidate.dir_name.clone(),
            addon_id: None,
            version: None,
            archive: None,
            assets: Vec::new(),
            issues: Vec::new(),
        }
    }

    /// Outcome for a candidate that was never packaged.
    pub fn skipped(candidate: &Candidate, issue: Issue) -> Self {
        let mut outcome = Self::new(candidate);
        outcome.push(issue);
        outcome
    }

    /// Record an issue, tagging it with this addon when it has no owner yet.
    pub fn push(&mut self, mut issue: Issue) {
        if issue.addon.is_none() {
            issue.addon = Some(self.label().to_string());
        }
        self.issues.push(issue);
    }

    /// Addon id when known, directory name otherwise.
    pub fn label(&self) -> &str {
        self.addon_id.as_deref().unwrap_or(&self.dir_name)
    }

    pub fn status(&self) -> AddonStatus {
        if self.archive.is_none() {
            AddonStatus::Skipped
        } else if self.issues.is_empty() {
            AddonStatus::Packaged
        } else {
            AddonStatus::PackagedWithWarnings
        }
    }

    pub fn has_issue(&self, code: ErrorCode) -> bool {
        self.issues.iter().any(|issue| issue.code == code)
    }
}
