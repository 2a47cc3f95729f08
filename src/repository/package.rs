//! Per-addon zip packaging.
//!
//! Every file below the addon folder is stored under `<dirName>/` inside
//! `<output>/<addonId>/<dirName>-<version>.zip`, except files whose extension
//! is on the exclusion list. The archive is staged next to the output root
//! and renamed into place only once it is complete.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, warn};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::{AddonDescriptor, Candidate, RepositoryLayout};
use crate::config::BuildConfig;
use crate::error::{RepoError, Result};

/// Files at or above this size need zip64 headers.
const ZIP64_THRESHOLD: u64 = u32::MAX as u64;

/// One file scheduled for an archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub source: PathBuf,
    /// Name inside the archive, always `/` separated.
    pub name: String,
}

/// A finished archive.
#[derive(Debug, Clone, Serialize)]
pub struct PackagedArchive {
    pub destination_dir: PathBuf,
    pub archive_path: PathBuf,
    pub entries: usize,
}

/// Builds archives into a repository layout.
#[derive(Debug, Clone, Copy)]
pub struct Packager<'a> {
    layout: &'a RepositoryLayout,
    build: &'a BuildConfig,
}

impl<'a> Packager<'a> {
    pub const fn new(layout: &'a RepositoryLayout, build: &'a BuildConfig) -> Self {
        Self { layout, build }
    }

    /// `<dirName>-<version>.zip`
    pub fn archive_name(dir_name: &str, version: &str) -> String {
        format!("{dir_name}-{version}.zip")
    }

    /// Files of `candidate` that go into its archive, in a stable order.
    pub fn collect_entries(&self, candidate: &Candidate) -> Result<Vec<ArchiveEntry>> {
        let archive_error = |reason: String| RepoError::Archive {
            addon: candidate.dir_name.clone(),
            reason,
        };

        let mut entries = Vec::new();
        let walker = WalkDir::new(&candidate.path)
            .follow_links(false)
            .sort_by_file_name();

        for entry in walker {
            let entry = entry.map_err(|err| archive_error(format!("walk failed: {err}")))?;
            let path = entry.path();
            // Symlinks are not followed, but a link to a regular file is still packaged.
            if !path.is_file() {
                continue;
            }
            if self.is_excluded(path) {
                debug!(addon = %candidate.dir_name, file = %path.display(), "Excluded from archive");
                continue;
            }

            let relative = path
                .strip_prefix(&candidate.path)
                .map_err(|err| archive_error(format!("{}: {err}", path.display())))?;
            let Some(name) = entry_name(&candidate.dir_name, relative) else {
                warn!(addon = %candidate.dir_name, file = %path.display(), "Skipping file with non UTF-8 name");
                continue;
            };

            entries.push(ArchiveEntry {
                source: path.to_path_buf(),
                name,
            });
        }

        Ok(entries)
    }

    fn is_excluded(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.build.is_excluded(&format!(".{ext}")))
    }

    fn options(&self) -> SimpleFileOptions {
        let method = if self.build.compress {
            CompressionMethod::Deflated
        } else {
            CompressionMethod::Stored
        };
        SimpleFileOptions::default().compression_method(method)
    }

    /// Create the destination folder and write the archive into it.
    ///
    /// The destination folder must not exist yet; a second addon with the
    /// same id gets [`RepoError::DuplicateDestination`].
    pub fn package(
        &self,
        candidate: &Candidate,
        descriptor: &AddonDescriptor,
    ) -> Result<PackagedArchive> {
        let destination_dir = self.layout.destination(&descriptor.id);
        match fs::create_dir(&destination_dir) {
            Ok(()) => {}
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
                return Err(RepoError::DuplicateDestination {
                    addon_id: descriptor.id.clone(),
                    path: destination_dir,
                });
            }
            Err(err) => {
                return Err(RepoError::Archive {
                    addon: descriptor.id.clone(),
                    reason: format!("create {}: {err}", destination_dir.display()),
                });
            }
        }

        let archive_path =
            destination_dir.join(Self::archive_name(&candidate.dir_name, &descriptor.version));

        match self.write_archive(candidate, &archive_path) {
            Ok(entries) => {
                info!(
                    addon = %descriptor.id,
                    archive = %archive_path.display(),
                    entries,
                    "Packaged addon"
                );
                Ok(PackagedArchive {
                    destination_dir,
                    archive_path,
                    entries,
                })
            }
            Err(err) => {
                // Leave no empty destination behind for a skipped addon.
                if let Err(cleanup) = fs::remove_dir(&destination_dir) {
                    debug!(path = %destination_dir.display(), error = %cleanup, "Destination not removed");
                }
                let reason = match err {
                    RepoError::Archive { reason, .. } => reason,
                    other => other.to_string(),
                };
                Err(RepoError::Archive {
                    addon: descriptor.id.clone(),
                    reason,
                })
            }
        }
    }

    fn write_archive(&self, candidate: &Candidate, archive_path: &Path) -> Result<usize> {
        let entries = self.collect_entries(candidate)?;
        let options = self.options();

        let mut builder = tempfile::Builder::new();
        builder.prefix(".repogen-").suffix(".zip.part");
        // Published archives get the same umask-derived mode as any other output file.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            builder.permissions(fs::Permissions::from_mode(0o666));
        }
        let staging = builder.tempfile_in(self.layout.output_root())?;

        let mut zip = ZipWriter::new(staging);
        for entry in &entries {
            let mut source = File::open(&entry.source).map_err(|err| RepoError::Archive {
                addon: candidate.dir_name.clone(),
                reason: format!("read {}: {err}", entry.source.display()),
            })?;
            let large = source.metadata().is_ok_and(|meta| meta.len() >= ZIP64_THRESHOLD);
            zip.start_file(entry.name.as_str(), options.large_file(large))?;
            io::copy(&mut source, &mut zip)?;
        }
        let staging = zip.finish()?;

        staging
            .persist(archive_path)
            .map_err(|err| RepoError::Archive {
                addon: candidate.dir_name.clone(),
                reason: format!("persist {}: {}", archive_path.display(), err.error),
            })?;

        Ok(entries.len())
    }
}

/// `<dirName>/a/b.txt` from a relative path, `None` for non UTF-8 names.
fn entry_name(dir_name: &str, relative: &Path) -> Option<String> {
    let mut name = String::from(dir_name);
    for component in relative.components() {
        name.push('/');
        name.push_str(component.as_os_str().to_str()?);
    }
    Some(name)
}
