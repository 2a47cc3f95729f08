//! Progress and summary output for a build.
//!
//! Reporters write to stdout (or any writer in tests). Logs go to stderr
//! through `tracing`, so the two never interleave in a pipe.

use std::io::{self, Write};

use console::{style, Style};
use parking_lot::Mutex;
use tracing::{debug, trace};

use super::detection::OutputMode;
use super::robot::robot_ok;
use crate::pipeline::{Phase, PipelineReport};
use crate::repository::{AddonOutcome, AddonStatus, Issue, Severity};

/// Final reminder printed after every human-mode build.
pub const CHECKSUM_REMINDER: &str =
    "Always double check the MD5 hash in addons.xml.md5 if the repository does not show up or download properly.";

/// Receives build events as they happen.
pub trait Reporter: Send + Sync {
    fn banner(&self, version: &str);
    fn phase(&self, phase: Phase);
    /// Pipeline-level issue; per-addon issues arrive with [`Reporter::addon`].
    fn issue(&self, issue: &Issue);
    fn addon(&self, outcome: &AddonOutcome);
    fn finish(&self, report: &PipelineReport);
}

/// Reporter that drops everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn banner(&self, _version: &str) {}
    fn phase(&self, _phase: Phase) {}
    fn issue(&self, _issue: &Issue) {}
    fn addon(&self, _outcome: &AddonOutcome) {}
    fn finish(&self, _report: &PipelineReport) {}
}

type Sink = Mutex<Box<dyn Write + Send>>;

fn emit(out: &Sink, text: &str) {
    let mut out = out.lock();
    if let Err(err) = writeln!(out, "{text}") {
        // A closed pipe must not fail the build.
        debug!(error = %err, "Reporter output dropped");
    }
}

/// Plain or styled text for people.
pub struct HumanReporter {
    styled: bool,
    out: Sink,
}

impl HumanReporter {
    pub fn stdout(styled: bool) -> Self {
        Self::new(styled, Box::new(io::stdout()))
    }

    pub fn new(styled: bool, out: Box<dyn Write + Send>) -> Self {
        Self {
            styled,
            out: Mutex::new(out),
        }
    }

    fn paint(&self, text: &str, style: &Style) -> String {
        if self.styled {
            style.apply_to(text).force_styling(true).to_string()
        } else {
            text.to_string()
        }
    }

    fn severity_tag(&self, severity: Severity) -> String {
        match severity {
            Severity::Warning => self.paint("warning", &Style::new().yellow().bold()),
            Severity::Error => self.paint("error", &Style::new().red().bold()),
        }
    }

    fn issue_line(&self, indent: &str, issue: &Issue) -> String {
        format!("{indent}{} {issue}", self.severity_tag(issue.severity))
    }
}

impl Reporter for HumanReporter {
    fn banner(&self, version: &str) {
        trace!(styled = self.styled, "banner");
        let text = format!("repogen {version}");
        emit(&self.out, &self.paint(&text, &Style::new().bold()));
    }

    fn phase(&self, phase: Phase) {
        let arrow = self.paint("==>", &Style::new().cyan().bold());
        emit(&self.out, &format!("{arrow} {phase}"));
    }

    fn issue(&self, issue: &Issue) {
        emit(&self.out, &self.issue_line("    ", issue));
    }

    fn addon(&self, outcome: &AddonOutcome) {
        let (tag, tag_style) = match outcome.status() {
            AddonStatus::Packaged => ("ok", Style::new().green().bold()),
            AddonStatus::PackagedWithWarnings => ("ok", Style::new().yellow().bold()),
            AddonStatus::Skipped => ("skipped", Style::new().red().bold()),
        };
        let tag = self.paint(&format!("{tag:<7}"), &tag_style);

        let mut line = format!("    {tag} {}", outcome.label());
        if let Some(version) = &outcome.version {
            line.push(' ');
            line.push_str(version);
        }
        if let Some(archive) = outcome.archive.as_ref().and_then(|p| p.file_name()) {
            line.push_str(" -> ");
            line.push_str(&archive.to_string_lossy());
        }
        emit(&self.out, &line);

        for issue in &outcome.issues {
            emit(&self.out, &self.issue_line("            ", issue));
        }
    }

    fn finish(&self, report: &PipelineReport) {
        let packaged =
            report.count(AddonStatus::Packaged) + report.count(AddonStatus::PackagedWithWarnings);
        let skipped = report.count(AddonStatus::Skipped);
        let warnings = report.warning_count();

        emit(&self.out, "");
        let summary = format!(
            "Packaged {packaged} addon(s), skipped {skipped}, {warnings} warning(s)"
        );
        let summary_style = if skipped > 0 || report.error_count() > 0 {
            Style::new().yellow().bold()
        } else {
            Style::new().green().bold()
        };
        emit(&self.out, &self.paint(&summary, &summary_style));

        if let Some(manifest) = &report.manifest {
            emit(&self.out, &format!("Manifest: {}", manifest.display()));
        }
        if let Some(checksum) = &report.checksum {
            let digest = if self.styled {
                style(&checksum.digest).dim().force_styling(true).to_string()
            } else {
                checksum.digest.clone()
            };
            emit(&self.out, &format!("Checksum: {digest}"));
        }
        emit(&self.out, CHECKSUM_REMINDER);
    }
}

/// Emits only the final report as one JSON document.
pub struct JsonReporter {
    out: Sink,
}

impl JsonReporter {
    pub fn stdout() -> Self {
        Self::new(Box::new(io::stdout()))
    }

    pub fn new(out: Box<dyn Write + Send>) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }
}

impl Reporter for JsonReporter {
    fn banner(&self, _version: &str) {}
    fn phase(&self, _phase: Phase) {}
    fn issue(&self, _issue: &Issue) {}
    fn addon(&self, _outcome: &AddonOutcome) {}

    fn finish(&self, report: &PipelineReport) {
        let warnings = report.all_issues().map(ToString::to_string).collect();
        let mut response = robot_ok(report);
        response.warnings = warnings;
        match serde_json::to_string_pretty(&response) {
            Ok(json) => emit(&self.out, &json),
            Err(err) => debug!(error = %err, "Report serialization failed"),
        }
    }
}

/// Reporter for an already decided output mode.
pub fn reporter_for(mode: OutputMode) -> Box<dyn Reporter> {
    match mode {
        OutputMode::Json => Box::new(JsonReporter::stdout()),
        OutputMode::Styled => Box::new(HumanReporter::stdout(true)),
        OutputMode::Plain => Box::new(HumanReporter::stdout(false)),
    }
}
