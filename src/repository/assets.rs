//! Copies the presentation files clients fetch without downloading the zip.

use std::fs;
use std::path::{Path, PathBuf};

use glob::Pattern;
use serde::Serialize;
use tracing::debug;

use super::{Candidate, Issue};
use crate::error::ErrorCode;

pub const ICON_STEM: &str = "icon";
pub const FANART_FILE: &str = "fanart.jpg";

/// Icon sources that are never published.
const ICON_SOURCE_EXTENSIONS: &[&str] = &["psd"];

/// Result of looking for the icon of an addon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IconLookup {
    Missing,
    Found(PathBuf),
    Ambiguous(Vec<PathBuf>),
}

impl IconLookup {
    /// Search the top level of `dir` for `icon.<ext>`.
    pub fn find(dir: &Path) -> Self {
        let pattern = format!("{}/{ICON_STEM}.*", Pattern::escape(&dir.to_string_lossy()));
        let mut matches: Vec<PathBuf> = match glob::glob(&pattern) {
            Ok(paths) => paths.filter_map(std::result::Result::ok).filter(|p| is_icon(p)).collect(),
            Err(err) => {
                debug!(dir = %dir.display(), error = %err, "Icon pattern rejected");
                Vec::new()
            }
        };
        matches.sort();

        match matches.len() {
            0 => Self::Missing,
            1 => Self::Found(matches.remove(0)),
            _ => Self::Ambiguous(matches),
        }
    }
}

fn is_icon(path: &Path) -> bool {
    if !path.is_file() || path.file_stem().and_then(|s| s.to_str()) != Some(ICON_STEM) {
        return false;
    }
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_none_or(|ext| {
            !ICON_SOURCE_EXTENSIONS
                .iter()
                .any(|source| ext.eq_ignore_ascii_case(source))
        })
}

/// Files copied for one addon plus the warnings raised on the way.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AssetReport {
    pub copied: Vec<PathBuf>,
    pub issues: Vec<Issue>,
}

impl AssetReport {
    fn copy(&mut self, source: &Path, destination_dir: &Path) {
        let Some(name) = source.file_name() else {
            return;
        };
        let target = destination_dir.join(name);
        match fs::copy(source, &target) {
            Ok(_) => {
                debug!(file = %target.display(), "Copied asset");
                self.copied.push(target);
            }
            Err(err) => self.issues.push(
                Issue::new(
                    ErrorCode::AssetCopyFailure,
                    format!("cannot copy {} to {}: {err}", source.display(), target.display()),
                )
                .with_path(source),
            ),
        }
    }
}

/// Copy `addon.xml`, the icon and the fan-art of `candidate` into
/// `destination_dir`. Nothing here stops the addon from being published.
pub fn copy_assets(candidate: &Candidate, destination_dir: &Path) -> AssetReport {
    let mut report = AssetReport::default();

    report.copy(&candidate.metadata_path, destination_dir);

    match IconLookup::find(&candidate.path) {
        IconLookup::Found(icon) => report.copy(&icon, destination_dir),
        IconLookup::Missing => report.issues.push(
            Issue::new(ErrorCode::AssetMissing, format!("no {ICON_STEM}.* found"))
                .with_path(&candidate.path),
        ),
        IconLookup::Ambiguous(matches) => {
            let names: Vec<String> = matches
                .iter()
                .filter_map(|p| p.file_name())
                .map(|name| name.to_string_lossy().into_owned())
                .collect();
            report.issues.push(
                Issue::new(
                    ErrorCode::AssetAmbiguous,
                    format!("several icons found ({}), none copied", names.join(", ")),
                )
                .with_path(&candidate.path),
            );
        }
    }

    let fanart = candidate.path.join(FANART_FILE);
    if fanart.is_file() {
        report.copy(&fanart, destination_dir);
    } else {
        report.issues.push(
            Issue::new(ErrorCode::AssetMissing, format!("no {FANART_FILE} found"))
                .with_path(&candidate.path),
        );
    }

    report
}
