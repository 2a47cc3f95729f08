//! Addon candidate discovery.

use std::fs;

use tracing::{debug, info, warn};

use super::{Candidate, RepositoryLayout, METADATA_FILE};
use crate::error::{RepoError, Result};

/// Version-control directories that are never addons.
pub const VCS_DIRS: &[&str] = &[".git", ".svn", ".hg", ".bzr"];

/// List the immediate subdirectories of the root that contain `addon.xml`.
///
/// Order is directory-listing order. Folders without a metadata file are
/// skipped silently; an unreadable root is fatal.
pub fn discover(layout: &RepositoryLayout) -> Result<Vec<Candidate>> {
    let root = layout.root();
    let entries = fs::read_dir(root).map_err(|source| RepoError::RootUnreadable {
        path: root.to_path_buf(),
        source,
    })?;

    let mut candidates = Vec::new();
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!(root = %root.display(), error = %err, "Skipping unreadable directory entry");
                continue;
            }
        };

        let path = entry.path();
        if !path.is_dir() {
            continue;
        }

        let Some(name) = entry.file_name().to_str().map(ToString::to_string) else {
            warn!(path = %path.display(), "Skipping directory with non UTF-8 name");
            continue;
        };

        if is_reserved(&name, layout) {
            debug!(dir = %name, "Skipping reserved directory");
            continue;
        }

        if !path.join(METADATA_FILE).is_file() {
            debug!(dir = %name, "Skipping directory without {METADATA_FILE}");
            continue;
        }

        candidates.push(Candidate::new(name, path));
    }

    info!(count = candidates.len(), "Discovered addon candidates");
    Ok(candidates)
}

fn is_reserved(name: &str, layout: &RepositoryLayout) -> bool {
    name == layout.output_dir_name()
        || name == layout.tools_dir_name()
        || VCS_DIRS.contains(&name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::test_utils::fixtures::RepoFixture;

    fn names(candidates: &[Candidate]) -> Vec<String> {
        let mut names: Vec<String> = candidates.iter().map(|c| c.dir_name.clone()).collect();
        names.sort();
        names
    }

    #[test]
    fn finds_directories_with_metadata() {
        let fixture = RepoFixture::new();
        fixture.add_addon("plugin.foo", "plugin.foo", "1.0.0");
        fixture.add_addon("plugin.bar", "plugin.bar", "2.0.0");
        fixture.write("docs/README.md", "not an addon");
        fixture.write("loose-file.txt", "x");

        let layout = RepositoryLayout::new(fixture.root(), &Config::default());
        let candidates = discover(&layout).unwrap();

        assert_eq!(names(&candidates), vec!["plugin.bar", "plugin.foo"]);
        let foo = candidates.iter().find(|c| c.dir_name == "plugin.foo").unwrap();
        assert_eq!(foo.metadata_path, fixture.root().join("plugin.foo/addon.xml"));
    }

    #[test]
    fn skips_reserved_directories() {
        let fixture = RepoFixture::new();
        fixture.add_addon("plugin.foo", "plugin.foo", "1.0.0");
        fixture.add_addon(".git", "git.addon", "1.0.0");
        fixture.add_addon("_zips", "stale.output", "1.0.0");
        fixture.add_addon("_tools", "tool.addon", "1.0.0");

        let layout = RepositoryLayout::new(fixture.root(), &Config::default());
        let candidates = discover(&layout).unwrap();

        assert_eq!(names(&candidates), vec!["plugin.foo"]);
    }

    #[test]
    fn metadata_must_be_a_file() {
        let fixture = RepoFixture::new();
        std::fs::create_dir_all(fixture.root().join("weird/addon.xml")).unwrap();

        let layout = RepositoryLayout::new(fixture.root(), &Config::default());
        assert!(discover(&layout).unwrap().is_empty());
    }

    #[test]
    fn missing_root_is_fatal() {
        let fixture = RepoFixture::new();
        let layout = RepositoryLayout::new(fixture.root().join("nope"), &Config::default());
        let err = discover(&layout).unwrap_err();
        assert!(matches!(err, RepoError::RootUnreadable { .. }));
        assert!(err.code().is_fatal());
    }
}
