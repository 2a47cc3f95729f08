use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// Minimal `addon.xml` for `id`/`version`, with a declaration line and a
/// couple of child elements.
pub fn addon_xml(id: &str, version: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<addon id="{id}" name="{id}" version="{version}" provider-name="tests">
    <requires>
        <import addon="xbmc.python" version="3.0.0"/>
    </requires>
    <extension point="xbmc.python.pluginsource" library="default.py"/>
    <extension point="xbmc.addon.metadata">
        <summary lang="en_GB">Fixture addon</summary>
    </extension>
</addon>
"#
    )
}

/// Throwaway repository root.
pub struct RepoFixture {
    pub temp_dir: TempDir,
}

impl RepoFixture {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        Self { temp_dir }
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Write a file below the root, creating parent directories.
    pub fn write(&self, relative_path: &str, content: &str) -> PathBuf {
        let full_path = self.root().join(relative_path);
        if let Some(parent) = full_path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent dirs");
        }
        std::fs::write(&full_path, content).expect("Failed to write file");
        full_path
    }

    /// Create `<dir>/addon.xml` and return the addon directory.
    pub fn add_addon(&self, dir: &str, id: &str, version: &str) -> PathBuf {
        self.write(&format!("{dir}/addon.xml"), &addon_xml(id, version));
        self.root().join(dir)
    }
}

impl Default for RepoFixture {
    fn default() -> Self {
        Self::new()
    }
}
