//! Addon repository building blocks.
//!
//! Each submodule owns one step of the build:
//!
//! 1. [`output_dir`] resets the output root (the only fatal step)
//! 2. [`bootstrap`] creates the repository's own descriptor on first run
//! 3. [`discover`] lists addon candidates under the repository root
//! 4. [`manifest`] aggregates every `addon.xml` into `addons.xml`
//! 5. [`checksum`] writes `addons.xml.md5` from the bytes on disk
//! 6. [`package`] zips each addon into its destination folder
//! 7. [`assets`] copies `addon.xml`, icon and fanart next to the archive
//!
//! Recoverable problems are returned as [`Issue`] values instead of errors so
//! the pipeline driver can keep going with the next item.

pub mod addon;
pub mod assets;
pub mod bootstrap;
pub mod checksum;
pub mod discover;
pub mod manifest;
pub mod output_dir;
pub mod package;
pub mod report;

use std::path::{Path, PathBuf};

use crate::config::Config;

pub use addon::{AddonDescriptor, Candidate};
pub use assets::{AssetReport, IconLookup};
pub use bootstrap::BootstrapOutcome;
pub use checksum::ChecksumFile;
pub use manifest::{AggregatedManifest, Aggregation, ManifestFragment};
pub use package::{PackagedArchive, Packager};
pub use report::{AddonOutcome, AddonStatus, Issue, Severity};

/// Per-addon metadata file name.
pub const METADATA_FILE: &str = "addon.xml";

/// Aggregated manifest file name, written to the output root.
pub const MANIFEST_FILE: &str = "addons.xml";

/// Checksum file name, sibling of the manifest.
pub const CHECKSUM_FILE: &str = "addons.xml.md5";

/// Where a run reads from and writes to.
#[derive(Debug, Clone)]
pub struct RepositoryLayout {
    root: PathBuf,
    output_dir: String,
    tools_dir: String,
}

impl RepositoryLayout {
    pub fn new(root: impl AsRef<Path>, config: &Config) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            output_dir: config.output.dir.clone(),
            tools_dir: config.build.tools_dir.clone(),
        }
    }

    /// Repository root containing the addon folders.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Name of the output directory inside the root.
    pub fn output_dir_name(&self) -> &str {
        &self.output_dir
    }

    /// Name of the tool's own directory inside the root.
    pub fn tools_dir_name(&self) -> &str {
        &self.tools_dir
    }

    pub fn output_root(&self) -> PathBuf {
        self.root.join(&self.output_dir)
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.output_root().join(MANIFEST_FILE)
    }

    pub fn checksum_path(&self) -> PathBuf {
        self.output_root().join(CHECKSUM_FILE)
    }

    /// Destination folder for an addon identifier.
    pub fn destination(&self, addon_id: &str) -> PathBuf {
        self.output_root().join(addon_id)
    }
}
