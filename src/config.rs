//! Configuration for the repository generator.
//!
//! Loaded once at startup and passed by reference afterwards. Sources are
//! merged as patches: defaults, global file, project file (or an explicit
//! file, which replaces both), then `REPOGEN_*` environment overrides.

use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{RepoError, Result};

/// Project-level config file name, looked up in the repository root.
pub const PROJECT_CONFIG_FILE: &str = "repogen.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Identity of the repository's own addon. Only needed for bootstrap.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository: Option<RepositoryConfig>,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub build: BuildConfig,
}

impl Config {
    pub fn load(explicit_path: Option<&Path>, repo_root: &Path) -> Result<Self> {
        let mut config = Self::default();

        let explicit = explicit_path
            .map(PathBuf::from)
            .or_else(|| std::env::var("REPOGEN_CONFIG").ok().map(PathBuf::from));

        if let Some(path) = explicit {
            let Some(patch) = Self::load_patch(&path)? else {
                return Err(RepoError::Config(format!(
                    "config file not found: {}",
                    path.display()
                )));
            };
            config.merge_patch(patch);
        } else {
            if let Some(global) = Self::load_global()? {
                config.merge_patch(global);
            }
            if let Some(project) = Self::load_project(repo_root)? {
                config.merge_patch(project);
            }
        }

        config.apply_env_overrides()?;
        config.validate()?;

        Ok(config)
    }

    /// Parse a complete config from TOML text on top of the defaults.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let patch: ConfigPatch = toml::from_str(raw)
            .map_err(|err| RepoError::Config(format!("parse config: {err}")))?;
        let mut config = Self::default();
        config.merge_patch(patch);
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|err| RepoError::Config(format!("serialize config: {err}")))
    }

    fn load_global() -> Result<Option<ConfigPatch>> {
        let Some(dir) = dirs::config_dir() else {
            return Ok(None);
        };
        Self::load_patch(&dir.join("repogen/config.toml"))
    }

    fn load_project(repo_root: &Path) -> Result<Option<ConfigPatch>> {
        Self::load_patch(&repo_root.join(PROJECT_CONFIG_FILE))
    }

    fn load_patch(path: &Path) -> Result<Option<ConfigPatch>> {
        if !path.exists() {
            return Ok(None);
        }

        let raw = std::fs::read_to_string(path)
            .map_err(|err| RepoError::Config(format!("read config {}: {err}", path.display())))?;
        let patch = toml::from_str(&raw)
            .map_err(|err| RepoError::Config(format!("parse config {}: {err}", path.display())))?;
        Ok(Some(patch))
    }

    fn merge_patch(&mut self, patch: ConfigPatch) {
        if let Some(repository) = patch.repository {
            self.repository = Some(repository);
        }
        if let Some(patch) = patch.output {
            self.output.merge(patch);
        }
        if let Some(patch) = patch.build {
            self.build.merge(patch);
        }
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides_from(|key| std::env::var(key).ok())
    }

    fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(value) = lookup("REPOGEN_OUTPUT_DIR") {
            self.output.dir = value;
        }
        if let Some(value) = lookup("REPOGEN_STYLED") {
            self.output.styled = parse_bool("REPOGEN_STYLED", &value)?;
        }
        if let Some(value) = lookup("REPOGEN_EXCLUDES") {
            self.build.excludes = normalize_extensions(value.split(','));
        }
        if let Some(value) = lookup("REPOGEN_COMPRESS") {
            self.build.compress = parse_bool("REPOGEN_COMPRESS", &value)?;
        }
        if let Some(value) = lookup("REPOGEN_PARALLEL") {
            self.build.parallel = parse_bool("REPOGEN_PARALLEL", &value)?;
        }
        if let Some(value) = lookup("REPOGEN_TOOLS_DIR") {
            self.build.tools_dir = value;
        }
        Ok(())
    }

    /// Reject values that would make output paths escape the root.
    pub fn validate(&self) -> Result<()> {
        let dir = self.output.dir.trim();
        if dir.is_empty() {
            return Err(RepoError::MissingConfig("output.dir".to_string()));
        }
        check_dir_name("output.dir", dir)?;
        let tools = self.build.tools_dir.trim();
        if !tools.is_empty() {
            check_dir_name("build.tools_dir", tools)?;
        }
        if let Some(repository) = &self.repository {
            if repository.id.trim().is_empty() {
                return Err(RepoError::MissingConfig("repository.id".to_string()));
            }
        }
        Ok(())
    }
}

/// Exactly one plain component: no root, prefix, `.` or `..`.
fn check_dir_name(key: &str, value: &str) -> Result<()> {
    let components: Vec<Component<'_>> = Path::new(value).components().collect();
    if matches!(components.as_slice(), [Component::Normal(_)]) {
        return Ok(());
    }
    Err(RepoError::Config(format!(
        "{key} must be a single directory name, got {value:?}"
    )))
}

/// Identity of the repository addon created on first run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RepositoryConfig {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_repository_version")]
    pub version: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub url: String,
    /// Template file, relative to the repository root. Built-in template when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<PathBuf>,
}

fn default_repository_version() -> String {
    "1.0.0".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Name of the output directory, created inside the repository root.
    pub dir: String,
    /// Styled terminal output when the terminal supports it.
    pub styled: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: "_zips".to_string(),
            styled: true,
        }
    }
}

impl OutputConfig {
    fn merge(&mut self, patch: OutputPatch) {
        if let Some(value) = patch.dir {
            self.dir = value;
        }
        if let Some(value) = patch.styled {
            self.styled = value;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Lowercase file extensions, with leading dot, left out of archives.
    pub excludes: Vec<String>,
    /// Deflate archive entries (stored otherwise).
    pub compress: bool,
    /// Package addons on the rayon thread pool.
    pub parallel: bool,
    /// Directory holding the tool's own files; never treated as an addon.
    pub tools_dir: String,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            excludes: normalize_extensions([".pyc", ".pyo", ".psd", ".xcf"]),
            compress: true,
            parallel: false,
            tools_dir: "_tools".to_string(),
        }
    }
}

impl BuildConfig {
    fn merge(&mut self, patch: BuildPatch) {
        if let Some(value) = patch.excludes {
            self.excludes = value.into_extensions();
        }
        if let Some(value) = patch.compress {
            self.compress = value;
        }
        if let Some(value) = patch.parallel {
            self.parallel = value;
        }
        if let Some(value) = patch.tools_dir {
            self.tools_dir = value;
        }
    }

    /// Whether a file extension (with leading dot, any case) is excluded.
    #[must_use]
    pub fn is_excluded(&self, extension: &str) -> bool {
        let extension = extension.to_lowercase();
        self.excludes.iter().any(|entry| *entry == extension)
    }
}

/// Turn user supplied extensions into the canonical `.ext` lowercase form.
pub fn normalize_extensions<I, S>(values: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for value in values {
        let trimmed = value.as_ref().trim().to_lowercase();
        if trimmed.is_empty() || trimmed == "." {
            continue;
        }
        let ext = if trimmed.starts_with('.') {
            trimmed
        } else {
            format!(".{trimmed}")
        };
        if !out.contains(&ext) {
            out.push(ext);
        }
    }
    out
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ConfigPatch {
    pub repository: Option<RepositoryConfig>,
    pub output: Option<OutputPatch>,
    pub build: Option<BuildPatch>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct OutputPatch {
    pub dir: Option<String>,
    pub styled: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct BuildPatch {
    pub excludes: Option<ExtensionList>,
    pub compress: Option<bool>,
    pub parallel: Option<bool>,
    pub tools_dir: Option<String>,
}

/// Exclusions may be written as a TOML array or a comma separated string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum ExtensionList {
    List(Vec<String>),
    Csv(String),
}

impl ExtensionList {
    fn into_extensions(self) -> Vec<String> {
        match self {
            Self::List(values) => normalize_extensions(values),
            Self::Csv(value) => normalize_extensions(value.split(',')),
        }
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(RepoError::Config(format!(
            "invalid {key} value {value} (expected true|false)"
        ))),
    }
}
