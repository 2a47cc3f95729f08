//! `addons.xml` aggregation.
//!
//! Every candidate's `addon.xml` is copied into one document with its XML
//! declaration removed. Lines are kept as written; only trailing whitespace at
//! the end of each fragment is trimmed. A fragment that cannot be read is
//! left out and reported, the rest are still aggregated.

use std::fs;
use std::path::Path;

use tracing::{debug, info};

use super::{Candidate, Issue};
use crate::error::Result;

/// Declaration line written at the top of `addons.xml`.
pub const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

const ROOT_OPEN: &str = "<addons>";
const ROOT_CLOSE: &str = "</addons>";

const BOM: char = '\u{feff}';

/// One addon's metadata text without its declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestFragment {
    /// Directory name of the owning candidate.
    pub addon: String,
    pub text: String,
}

impl ManifestFragment {
    pub fn from_text(addon: impl Into<String>, raw: &str) -> Self {
        Self {
            addon: addon.into(),
            text: strip_declaration(raw),
        }
    }

    pub fn read(candidate: &Candidate) -> Result<Self> {
        let raw = candidate.read_metadata()?;
        Ok(Self::from_text(&candidate.dir_name, &raw))
    }
}

/// Drop declaration lines, keep everything else verbatim.
///
/// A leading byte order mark is dropped with the declaration it precedes.
pub fn strip_declaration(raw: &str) -> String {
    let raw = raw.strip_prefix(BOM).unwrap_or(raw);
    let kept: Vec<&str> = raw.lines().filter_map(without_declaration).collect();
    kept.join("\n").trim_end().to_string()
}

/// `None` when the line holds nothing but a declaration.
fn without_declaration(line: &str) -> Option<&str> {
    let trimmed = line.trim_start_matches(BOM).trim_start();
    let Some(rest) = trimmed.strip_prefix("<?xml") else {
        return Some(line);
    };
    // `<?xml-stylesheet ...?>` and friends are processing instructions, not declarations.
    if !rest.starts_with(|c: char| c.is_whitespace() || c == '?') {
        return Some(line);
    }
    match rest.find("?>") {
        Some(end) => {
            let after = &rest[end + 2..];
            if after.trim().is_empty() {
                None
            } else {
                Some(after)
            }
        }
        None => None,
    }
}

/// The full `addons.xml` document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregatedManifest {
    fragments: Vec<ManifestFragment>,
}

impl AggregatedManifest {
    pub fn new(fragments: Vec<ManifestFragment>) -> Self {
        Self { fragments }
    }

    pub fn fragments(&self) -> &[ManifestFragment] {
        &self.fragments
    }

    /// Number of children written under `<addons>`; empty fragments are not.
    pub fn len(&self) -> usize {
        self.rendered().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn rendered(&self) -> impl Iterator<Item = &str> {
        self.fragments
            .iter()
            .map(|fragment| fragment.text.as_str())
            .filter(|text| !text.is_empty())
    }

    /// Render the document, ending in exactly one newline.
    pub fn render(&self) -> String {
        let body = self.rendered().collect::<Vec<_>>().join("\n\n");

        let mut out = String::with_capacity(body.len() + 64);
        out.push_str(XML_DECLARATION);
        out.push('\n');
        out.push_str(ROOT_OPEN);
        out.push('\n');
        if !body.is_empty() {
            out.push_str(&body);
            out.push('\n');
        }
        out.push_str(ROOT_CLOSE);
        out.push('\n');
        out
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        fs::write(path, self.render())?;
        info!(path = %path.display(), fragments = self.len(), "Wrote aggregated manifest");
        Ok(())
    }
}

/// Aggregated manifest plus the fragments that had to be left out.
#[derive(Debug, Clone, Default)]
pub struct Aggregation {
    pub manifest: AggregatedManifest,
    pub issues: Vec<Issue>,
}

/// Read every candidate's fragment, in candidate order.
pub fn aggregate(candidates: &[Candidate]) -> Aggregation {
    let mut fragments = Vec::with_capacity(candidates.len());
    let mut issues = Vec::new();

    for candidate in candidates {
        match ManifestFragment::read(candidate) {
            Ok(fragment) => {
                debug!(addon = %candidate.dir_name, "Aggregated fragment");
                fragments.push(fragment);
            }
            Err(err) => issues.push(Issue::from_error(&err)),
        }
    }

    Aggregation {
        manifest: AggregatedManifest::new(fragments),
        issues,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::test_utils::fixtures::{addon_xml, RepoFixture};
    use proptest::prelude::*;

    #[test]
    fn strips_only_the_declaration() {
        let raw = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n<addon id=\"a\" version=\"1\">\n    <tag>  spaced  </tag>   \n</addon>\n\n\n";
        let fragment = strip_declaration(raw);
        assert_eq!(
            fragment,
            "<addon id=\"a\" version=\"1\">\n    <tag>  spaced  </tag>   \n</addon>"
        );
    }

    #[test]
    fn keeps_content_after_inline_declaration() {
        let raw = "<?xml version=\"1.0\"?><addon id=\"a\" version=\"1\"/>\n";
        assert_eq!(strip_declaration(raw), "<addon id=\"a\" version=\"1\"/>");
    }

    #[test]
    fn keeps_other_processing_instructions() {
        let raw = "<?xml-stylesheet href=\"s.xsl\"?>\n<addon id=\"a\" version=\"1\"/>";
        assert_eq!(strip_declaration(raw), raw);
    }

    #[test]
    fn handles_crlf_line_endings() {
        let raw = "<?xml version=\"1.0\"?>\r\n<addon id=\"a\" version=\"1\">\r\n</addon>\r\n";
        assert_eq!(
            strip_declaration(raw),
            "<addon id=\"a\" version=\"1\">\n</addon>"
        );
    }

    #[test]
    fn drops_declaration_behind_byte_order_mark() {
        let raw = format!("\u{feff}{}", addon_xml("a", "1.0"));
        let fragment = strip_declaration(&raw);
        assert!(!fragment.contains("<?xml"));
        assert!(!fragment.contains('\u{feff}'));
        assert!(fragment.starts_with("<addon id=\"a\""));
    }

    #[test]
    fn empty_fragments_are_not_counted() {
        let manifest = AggregatedManifest::new(vec![
            ManifestFragment::from_text("a", "<addon id=\"a\" version=\"1\"/>"),
            ManifestFragment::from_text("blank", "<?xml version=\"1.0\"?>\n  \n"),
        ]);
        assert_eq!(manifest.fragments().len(), 2);
        assert_eq!(manifest.len(), 1);
        assert_eq!(manifest.render().matches("<addon ").count(), 1);
    }

    #[test]
    fn renders_empty_manifest() {
        let manifest = AggregatedManifest::default();
        assert_eq!(
            manifest.render(),
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<addons>\n</addons>\n"
        );
    }

    #[test]
    fn renders_fragments_separated_by_blank_line() {
        let manifest = AggregatedManifest::new(vec![
            ManifestFragment::from_text("a", "<addon id=\"a\" version=\"1\"/>\n"),
            ManifestFragment::from_text("b", "<addon id=\"b\" version=\"2\"/>"),
        ]);
        assert_eq!(
            manifest.render(),
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<addons>\n\
             <addon id=\"a\" version=\"1\"/>\n\n\
             <addon id=\"b\" version=\"2\"/>\n</addons>\n"
        );
    }

    #[test]
    fn unreadable_fragment_is_excluded_and_reported() {
        let fixture = RepoFixture::new();
        let good = fixture.add_addon("good", "plugin.good", "1.0.0");
        let bad_dir = fixture.root().join("bad");
        std::fs::create_dir_all(&bad_dir).unwrap();
        std::fs::write(bad_dir.join("addon.xml"), [0xff, 0xfe, 0x00]).unwrap();

        let candidates = vec![
            Candidate::new("bad", &bad_dir),
            Candidate::new("good", &good),
        ];
        let aggregation = aggregate(&candidates);

        assert_eq!(aggregation.manifest.len(), 1);
        assert_eq!(aggregation.manifest.fragments()[0].addon, "good");
        assert_eq!(aggregation.issues.len(), 1);
        let issue = &aggregation.issues[0];
        assert_eq!(issue.code, ErrorCode::FragmentReadFailure);
        assert_eq!(issue.addon.as_deref(), Some("bad"));
        assert_eq!(issue.path.as_deref(), Some(bad_dir.join("addon.xml").as_path()));
    }

    #[test]
    fn write_persists_rendered_text() {
        let fixture = RepoFixture::new();
        let path = fixture.root().join("addons.xml");
        let manifest = AggregatedManifest::new(vec![ManifestFragment::from_text(
            "a",
            &addon_xml("a", "1.0"),
        )]);
        manifest.write(&path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), manifest.render());
    }

    proptest! {
        #[test]
        fn manifest_has_one_declaration_one_root_and_n_children(
            versions in proptest::collection::vec("[0-9]{1,2}\\.[0-9]{1,2}\\.[0-9]{1,2}", 0..12)
        ) {
            let fragments: Vec<ManifestFragment> = versions
                .iter()
                .enumerate()
                .map(|(i, version)| {
                    let id = format!("plugin.n{i}");
                    ManifestFragment::from_text(id.clone(), &addon_xml(&id, version))
                })
                .collect();
            let rendered = AggregatedManifest::new(fragments).render();

            prop_assert_eq!(rendered.matches("<?xml").count(), 1);
            prop_assert!(rendered.starts_with(XML_DECLARATION));
            prop_assert_eq!(rendered.matches("<addons>").count(), 1);
            prop_assert_eq!(rendered.matches("</addons>").count(), 1);
            prop_assert_eq!(rendered.matches("<addon ").count(), versions.len());
            prop_assert!(rendered.ends_with("</addons>\n"));
            prop_assert!(!rendered.ends_with("\n\n"));
        }
    }
}
