//! Output root reset.

use std::fs;
use std::io;
use std::path::Path;

use tracing::{debug, info};

use crate::error::{RepoError, Result};

/// Delete `output_root` if present and recreate it empty.
///
/// Any failure is fatal for the run: building into a half-cleared tree would
/// publish stale archives next to fresh ones.
pub fn reset(output_root: &Path) -> Result<()> {
    let setup = |source: io::Error| RepoError::Setup {
        path: output_root.to_path_buf(),
        source,
    };

    match fs::symlink_metadata(output_root) {
        Ok(metadata) if metadata.is_dir() => {
            debug!(path = %output_root.display(), "Removing previous output");
            fs::remove_dir_all(output_root).map_err(setup)?;
        }
        Ok(_) => {
            debug!(path = %output_root.display(), "Replacing non-directory output path");
            fs::remove_file(output_root).map_err(setup)?;
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => return Err(setup(err)),
    }

    fs::create_dir_all(output_root).map_err(setup)?;

    if fs::read_dir(output_root).map_err(setup)?.next().is_some() {
        return Err(setup(io::Error::other("output directory is not empty after reset")));
    }

    info!(path = %output_root.display(), "Output directory ready");
    Ok(())
}
