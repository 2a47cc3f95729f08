//! Addon candidates and their parsed descriptors.

use std::fs;
use std::path::{Path, PathBuf};

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::Serialize;

use super::{CHECKSUM_FILE, MANIFEST_FILE, METADATA_FILE};
use crate::error::{RepoError, Result};

/// A directory under the repository root that carries an `addon.xml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Candidate {
    /// Directory name; used as the archive name prefix.
    pub dir_name: String,
    pub path: PathBuf,
    pub metadata_path: PathBuf,
}

impl Candidate {
    pub fn new(dir_name: impl Into<String>, path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        Self {
            dir_name: dir_name.into(),
            metadata_path: path.join(METADATA_FILE),
            path,
        }
    }

    /// Read the metadata file as UTF-8 text.
    pub fn read_metadata(&self) -> Result<String> {
        fs::read_to_string(&self.metadata_path).map_err(|err| RepoError::FragmentRead {
            addon: self.dir_name.clone(),
            path: self.metadata_path.clone(),
            reason: err.to_string(),
        })
    }
}

/// Identity of an addon, parsed from the `<addon>` root element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AddonDescriptor {
    pub id: String,
    pub version: String,
    pub source_dir: PathBuf,
    pub metadata_path: PathBuf,
}

impl AddonDescriptor {
    /// Read and parse the candidate's `addon.xml`.
    pub fn load(candidate: &Candidate) -> Result<Self> {
        let xml = candidate.read_metadata()?;
        Self::parse(candidate, &xml)
    }

    /// Parse descriptor text belonging to `candidate`.
    pub fn parse(candidate: &Candidate, xml: &str) -> Result<Self> {
        let invalid = |reason: String| RepoError::InvalidDescriptor {
            path: candidate.metadata_path.clone(),
            reason,
        };

        let (id, version) = parse_identity(xml).map_err(invalid)?;
        let id = require_attribute("id", id).map_err(invalid)?;
        let version = require_attribute("version", version).map_err(invalid)?;
        check_path_component("id", &id).map_err(invalid)?;
        check_path_component("version", &version).map_err(invalid)?;

        Ok(Self {
            id,
            version,
            source_dir: candidate.path.clone(),
            metadata_path: candidate.metadata_path.clone(),
        })
    }
}

/// Walk the whole document so malformed XML is rejected, returning the
/// `id` and `version` attributes of the `<addon>` root.
fn parse_identity(xml: &str) -> std::result::Result<(Option<String>, Option<String>), String> {
    let mut reader = Reader::from_str(xml);
    let mut depth = 0usize;
    let mut root: Option<(Option<String>, Option<String>)> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(element)) => {
                if depth == 0 {
                    root = Some(visit_root(&element, root.is_some())?);
                }
                depth += 1;
            }
            Ok(Event::Empty(element)) => {
                if depth == 0 {
                    root = Some(visit_root(&element, root.is_some())?);
                }
            }
            Ok(Event::End(_)) => depth = depth.saturating_sub(1),
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(err) => {
                return Err(format!(
                    "malformed XML at byte {}: {err}",
                    reader.buffer_position()
                ));
            }
        }
    }

    if depth != 0 {
        return Err("malformed XML: unclosed element at end of file".to_string());
    }
    root.ok_or_else(|| "no <addon> element found".to_string())
}

fn visit_root(
    element: &BytesStart<'_>,
    seen_root: bool,
) -> std::result::Result<(Option<String>, Option<String>), String> {
    if seen_root {
        return Err("malformed XML: more than one root element".to_string());
    }
    let name = element.name();
    if name.as_ref() != b"addon" {
        return Err(format!(
            "root element is <{}>, expected <addon>",
            String::from_utf8_lossy(name.as_ref())
        ));
    }

    let mut id = None;
    let mut version = None;
    for attribute in element.attributes() {
        let attribute = attribute.map_err(|err| format!("bad attribute on <addon>: {err}"))?;
        let value = attribute
            .unescape_value()
            .map_err(|err| format!("bad attribute value on <addon>: {err}"))?;
        match attribute.key.as_ref() {
            b"id" => id = Some(value.into_owned()),
            b"version" => version = Some(value.into_owned()),
            _ => {}
        }
    }
    Ok((id, version))
}

fn require_attribute(name: &str, value: Option<String>) -> std::result::Result<String, String> {
    match value {
        Some(value) if !value.trim().is_empty() => Ok(value),
        Some(_) => Err(format!("attribute {name} is empty")),
        None => Err(format!("attribute {name} is missing")),
    }
}

/// Identifiers and versions end up in output paths.
pub(crate) fn check_path_component(name: &str, value: &str) -> std::result::Result<(), String> {
    if value == "." || value == ".." || value.contains(['/', '\\', '\0']) {
        return Err(format!("{name} {value:?} is not usable as a file name"));
    }
    if [MANIFEST_FILE, CHECKSUM_FILE]
        .iter()
        .any(|reserved| value.eq_ignore_ascii_case(reserved))
    {
        return Err(format!("{name} {value:?} collides with the repository manifest files"));
    }
    Ok(())
}
