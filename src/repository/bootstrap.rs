//! First-run creation of the repository's own addon descriptor.
//!
//! When `[repository]` is configured and `<root>/<id>/addon.xml` is absent,
//! a descriptor is rendered from a template so the repository addon is
//! discovered and published like any other addon.

use std::fs;
use std::path::{Path, PathBuf};

use quick_xml::escape::escape;
use serde::Serialize;
use tracing::{debug, info};

use super::addon::check_path_component;
use super::{RepositoryLayout, METADATA_FILE};
use crate::config::RepositoryConfig;
use crate::error::{RepoError, Result};

/// Kodi repository descriptor used when no template file is configured.
pub const DEFAULT_TEMPLATE: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<addon id="{addonid}" name="{name}" version="{version}" provider-name="{author}">
    <extension point="xbmc.addon.repository" name="{name}">
        <dir>
            <info compressed="false">{url}{output_path}/addons.xml</info>
            <checksum>{url}{output_path}/addons.xml.md5</checksum>
            <datadir zip="true">{url}{output_path}/</datadir>
        </dir>
    </extension>
    <extension point="xbmc.addon.metadata">
        <summary>{summary}</summary>
        <description>{description}</description>
        <platform>all</platform>
    </extension>
</addon>
"#;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "path", rename_all = "snake_case")]
pub enum BootstrapOutcome {
    /// No `[repository]` section; nothing to do.
    NotConfigured,
    AlreadyPresent(PathBuf),
    Created(PathBuf),
}

/// Substitute every `{placeholder}` with its XML-escaped value.
///
/// Unknown braces are left alone, so templates may contain literal `{`.
pub fn render(template: &str, repository: &RepositoryConfig, output_path: &str) -> String {
    let values = [
        ("addonid", repository.id.as_str()),
        ("name", repository.name.as_str()),
        ("version", repository.version.as_str()),
        ("author", repository.author.as_str()),
        ("summary", repository.summary.as_str()),
        ("description", repository.description.as_str()),
        ("url", repository.url.as_str()),
        ("output_path", output_path),
    ];

    values
        .iter()
        .fold(template.to_string(), |text, (key, value)| {
            text.replace(&format!("{{{key}}}"), &escape(*value))
        })
}

/// Create `<root>/<id>/addon.xml` unless it exists (or `force` is set).
pub fn bootstrap(
    layout: &RepositoryLayout,
    repository: Option<&RepositoryConfig>,
    force: bool,
) -> Result<BootstrapOutcome> {
    let Some(repository) = repository else {
        debug!("No [repository] section, skipping bootstrap");
        return Ok(BootstrapOutcome::NotConfigured);
    };

    check_path_component("repository.id", &repository.id).map_err(RepoError::Bootstrap)?;

    let addon_dir = layout.root().join(&repository.id);
    let descriptor = addon_dir.join(METADATA_FILE);
    if descriptor.is_file() && !force {
        debug!(path = %descriptor.display(), "Repository descriptor already present");
        return Ok(BootstrapOutcome::AlreadyPresent(descriptor));
    }

    let template = load_template(layout.root(), repository.template.as_deref())?;
    let rendered = render(&template, repository, layout.output_dir_name());

    fs::create_dir_all(&addon_dir).map_err(|err| {
        RepoError::Bootstrap(format!("create {}: {err}", addon_dir.display()))
    })?;
    fs::write(&descriptor, rendered)
        .map_err(|err| RepoError::Bootstrap(format!("write {}: {err}", descriptor.display())))?;

    info!(path = %descriptor.display(), id = %repository.id, "Created repository descriptor");
    Ok(BootstrapOutcome::Created(descriptor))
}

/// Template file relative to the repository root, or the built-in default.
fn load_template(root: &Path, template: Option<&Path>) -> Result<String> {
    let Some(template) = template else {
        return Ok(DEFAULT_TEMPLATE.to_string());
    };
    let path = root.join(template);
    fs::read_to_string(&path).map_err(|err| {
        RepoError::Bootstrap(format!("read template {}: {err}", path.display()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::error::ErrorCode;
    use crate::repository::{AddonDescriptor, Candidate};
    use crate::test_utils::fixtures::RepoFixture;

    fn repository() -> RepositoryConfig {
        RepositoryConfig {
            id: "repository.example".into(),
            name: "Example & Friends".into(),
            version: "1.0.0".into(),
            author: "Me".into(),
            summary: "Addons <here>".into(),
            description: "All of \"them\"".into(),
            url: "https://example.com/repo/".into(),
            template: None,
        }
    }

    #[test]
    fn renders_and_escapes_placeholders() {
        let text = render(
            "<a id=\"{addonid}\" n=\"{name}\">{summary}|{description}|{url}{output_path}|{unknown}</a>",
            &repository(),
            "_zips",
        );
        assert_eq!(
            text,
            "<a id=\"repository.example\" n=\"Example &amp; Friends\">Addons &lt;here&gt;|\
             All of &quot;them&quot;|https://example.com/repo/_zips|{unknown}</a>"
        );
    }

    #[test]
    fn not_configured_is_a_no_op() {
        let fixture = RepoFixture::new();
        let layout = RepositoryLayout::new(fixture.root(), &Config::default());
        assert_eq!(
            bootstrap(&layout, None, false).unwrap(),
            BootstrapOutcome::NotConfigured
        );
    }

    #[test]
    fn creates_a_parsable_descriptor_once() {
        let fixture = RepoFixture::new();
        let layout = RepositoryLayout::new(fixture.root(), &Config::default());
        let repo = repository();

        let outcome = bootstrap(&layout, Some(&repo), false).unwrap();
        let path = fixture.root().join("repository.example/addon.xml");
        assert_eq!(outcome, BootstrapOutcome::Created(path.clone()));

        let candidate = Candidate::new("repository.example", fixture.root().join("repository.example"));
        let descriptor = AddonDescriptor::load(&candidate).unwrap();
        assert_eq!(descriptor.id, "repository.example");
        assert_eq!(descriptor.version, "1.0.0");
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("https://example.com/repo/_zips/addons.xml.md5"));

        std::fs::write(&path, "hand edited").unwrap();
        assert_eq!(
            bootstrap(&layout, Some(&repo), false).unwrap(),
            BootstrapOutcome::AlreadyPresent(path.clone())
        );
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "hand edited");
    }

    #[test]
    fn force_overwrites() {
        let fixture = RepoFixture::new();
        let layout = RepositoryLayout::new(fixture.root(), &Config::default());
        fixture.write("repository.example/addon.xml", "old");

        let outcome = bootstrap(&layout, Some(&repository()), true).unwrap();
        assert!(matches!(outcome, BootstrapOutcome::Created(_)));
        let text = std::fs::read_to_string(fixture.root().join("repository.example/addon.xml")).unwrap();
        assert!(text.contains("xbmc.addon.repository"));
    }

    #[test]
    fn custom_template_is_read_from_root() {
        let fixture = RepoFixture::new();
        fixture.write("_tools/template.xml", "<addon id=\"{addonid}\" version=\"{version}\"/>\n");
        let layout = RepositoryLayout::new(fixture.root(), &Config::default());
        let mut repo = repository();
        repo.template = Some(PathBuf::from("_tools/template.xml"));

        bootstrap(&layout, Some(&repo), false).unwrap();

        let text = std::fs::read_to_string(fixture.root().join("repository.example/addon.xml")).unwrap();
        assert_eq!(text, "<addon id=\"repository.example\" version=\"1.0.0\"/>\n");
    }

    #[test]
    fn missing_template_is_a_bootstrap_failure() {
        let fixture = RepoFixture::new();
        let layout = RepositoryLayout::new(fixture.root(), &Config::default());
        let mut repo = repository();
        repo.template = Some(PathBuf::from("_tools/missing.xml"));

        let err = bootstrap(&layout, Some(&repo), false).unwrap_err();
        assert_eq!(err.code(), ErrorCode::BootstrapFailure);
        assert!(!fixture.root().join("repository.example").exists());
    }

    #[test]
    fn path_like_id_is_rejected() {
        let fixture = RepoFixture::new();
        let layout = RepositoryLayout::new(fixture.root(), &Config::default());
        let mut repo = repository();
        repo.id = "../outside".into();

        let err = bootstrap(&layout, Some(&repo), false).unwrap_err();
        assert!(matches!(err, RepoError::Bootstrap(_)));
    }
}
