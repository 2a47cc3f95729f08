//! Standardized error codes for machine-parseable output.
//!
//! Error codes follow a numeric taxonomy:
//! - 1xx: Setup errors (fatal)
//! - 2xx: Metadata errors
//! - 3xx: Packaging errors
//! - 4xx: Asset errors
//! - 5xx: Manifest/checksum errors
//! - 6xx: Bootstrap errors
//! - 7xx: Config errors
//! - 9xx: Internal errors

use serde::{Deserialize, Serialize};

/// Standardized error codes for issues and robot mode output.
///
/// Each variant maps to a numeric code (e.g., `AssetMissing` -> E401).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // ========================================
    // Setup errors (1xx)
    // ========================================
    /// E101: Output root could not be reset or created
    SetupFailure,
    /// E102: Repository root could not be listed
    RootUnreadable,

    // ========================================
    // Metadata errors (2xx)
    // ========================================
    /// E201: addon.xml missing, unreadable or not UTF-8
    FragmentReadFailure,
    /// E202: addon.xml malformed or missing id/version
    InvalidDescriptor,

    // ========================================
    // Packaging errors (3xx)
    // ========================================
    /// E301: Destination folder for an addon id already exists
    DuplicateDestination,
    /// E302: Archive could not be built or moved
    ArchiveFailure,

    // ========================================
    // Asset errors (4xx)
    // ========================================
    /// E401: Icon or fanart not present
    AssetMissing,
    /// E402: More than one icon candidate
    AssetAmbiguous,
    /// E403: Asset copy failed
    AssetCopyFailure,

    // ========================================
    // Manifest errors (5xx)
    // ========================================
    /// E501: addons.xml could not be hashed
    ChecksumFailure,
    /// E502: addons.xml could not be written
    ManifestWriteFailure,

    // ========================================
    // Bootstrap errors (6xx)
    // ========================================
    /// E601: Repository descriptor could not be created
    BootstrapFailure,

    // ========================================
    // Config errors (7xx)
    // ========================================
    /// E701: Config file has invalid syntax or values
    ConfigInvalid,
    /// E702: Required config value is missing
    ConfigMissingRequired,

    // ========================================
    // Internal errors (9xx)
    // ========================================
    /// E901: Unexpected internal error
    InternalError,
    /// E902: Serialization/deserialization failed
    SerializationError,
    /// E903: IO operation failed
    IoError,
}

impl ErrorCode {
    /// Get the numeric error code (e.g., `AssetMissing` -> 401).
    #[must_use]
    pub const fn numeric(&self) -> u16 {
        match self {
            Self::SetupFailure => 101,
            Self::RootUnreadable => 102,

            Self::FragmentReadFailure => 201,
            Self::InvalidDescriptor => 202,

            Self::DuplicateDestination => 301,
            Self::ArchiveFailure => 302,

            Self::AssetMissing => 401,
            Self::AssetAmbiguous => 402,
            Self::AssetCopyFailure => 403,

            Self::ChecksumFailure => 501,
            Self::ManifestWriteFailure => 502,

            Self::BootstrapFailure => 601,

            Self::ConfigInvalid => 701,
            Self::ConfigMissingRequired => 702,

            Self::InternalError => 901,
            Self::SerializationError => 902,
            Self::IoError => 903,
        }
    }

    /// Get the category name for this error code.
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match self.numeric() / 100 {
            1 => "setup",
            2 => "metadata",
            3 => "packaging",
            4 => "asset",
            5 => "manifest",
            6 => "bootstrap",
            7 => "config",
            _ => "internal",
        }
    }

    /// Whether this condition aborts the whole run.
    ///
    /// Everything else is converted into an issue at the narrowest scope
    /// that owns the affected addon or file.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::SetupFailure
                | Self::RootUnreadable
                | Self::ConfigInvalid
                | Self::ConfigMissingRequired
        )
    }

    /// Get a short recovery hint for this error code.
    #[must_use]
    pub const fn suggestion(&self) -> &'static str {
        match self {
            Self::SetupFailure => {
                "Check permissions on the output directory or remove it manually"
            }
            Self::RootUnreadable => "Check that --root points to a readable directory",
            Self::FragmentReadFailure => "Make sure addon.xml exists and is saved as UTF-8",
            Self::InvalidDescriptor => {
                "addon.xml must be well-formed with non-empty id and version on <addon>"
            }
            Self::DuplicateDestination => "Two addon folders declare the same addon id",
            Self::ArchiveFailure => "Check read permissions inside the addon folder",
            Self::AssetMissing => "Add an icon.png or fanart.jpg to the addon folder",
            Self::AssetAmbiguous => "Keep a single icon.* file in the addon folder",
            Self::AssetCopyFailure => "Check permissions on the output directory",
            Self::ChecksumFailure => {
                "Double check the MD5 hash of addons.xml before publishing"
            }
            Self::ManifestWriteFailure => "Check permissions on the output directory",
            Self::BootstrapFailure => "Check the [repository] section and template path",
            Self::ConfigInvalid => "Fix the syntax of repogen.toml",
            Self::ConfigMissingRequired => "Add the missing key to repogen.toml",
            Self::InternalError | Self::SerializationError | Self::IoError => {
                "Re-run with -vv for details"
            }
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "E{:03}", self.numeric())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_codes_match_categories() {
        assert_eq!(ErrorCode::SetupFailure.category(), "setup");
        assert_eq!(ErrorCode::InvalidDescriptor.category(), "metadata");
        assert_eq!(ErrorCode::DuplicateDestination.category(), "packaging");
        assert_eq!(ErrorCode::AssetAmbiguous.category(), "asset");
        assert_eq!(ErrorCode::ChecksumFailure.category(), "manifest");
        assert_eq!(ErrorCode::BootstrapFailure.category(), "bootstrap");
        assert_eq!(ErrorCode::ConfigInvalid.category(), "config");
        assert_eq!(ErrorCode::IoError.category(), "internal");
    }

    #[test]
    fn only_setup_and_config_are_fatal() {
        assert!(ErrorCode::SetupFailure.is_fatal());
        assert!(ErrorCode::RootUnreadable.is_fatal());
        assert!(ErrorCode::ConfigInvalid.is_fatal());
        assert!(!ErrorCode::DuplicateDestination.is_fatal());
        assert!(!ErrorCode::ChecksumFailure.is_fatal());
        assert!(!ErrorCode::AssetMissing.is_fatal());
    }

    #[test]
    fn display_is_padded_numeric() {
        assert_eq!(ErrorCode::AssetMissing.to_string(), "E401");
        assert_eq!(ErrorCode::SetupFailure.to_string(), "E101");
    }

    #[test]
    fn serializes_screaming_snake_case() {
        let json = serde_json::to_string(&ErrorCode::AssetAmbiguous).unwrap();
        assert_eq!(json, "\"ASSET_AMBIGUOUS\"");
    }
}
