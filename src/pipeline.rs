//! Build driver.
//!
//! Runs `reset -> bootstrap -> discover -> aggregate -> checksum -> package`
//! in that order. Only a failed reset or an unreadable root abort the run;
//! everything else becomes an [`Issue`] on the pipeline or on one addon.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::{ErrorCode, RepoError, Result};
use crate::output::Reporter;
use crate::repository::{
    assets, bootstrap, checksum, discover, manifest, output_dir, AddonDescriptor, AddonOutcome,
    AddonStatus, BootstrapOutcome, Candidate, ChecksumFile, Issue, Packager, RepositoryLayout,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Reset,
    Bootstrap,
    Discover,
    Aggregate,
    Checksum,
    Package,
}

impl Phase {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Reset => "Resetting output directory",
            Self::Bootstrap => "Checking repository descriptor",
            Self::Discover => "Discovering addons",
            Self::Aggregate => "Writing addons.xml",
            Self::Checksum => "Writing addons.xml.md5",
            Self::Package => "Packaging addons",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Everything a finished run produced.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub root: PathBuf,
    pub output_root: PathBuf,
    /// `None` when bootstrap failed; the failure is in `issues`.
    pub bootstrap: Option<BootstrapOutcome>,
    /// `None` when the manifest could not be written.
    pub manifest: Option<PathBuf>,
    pub fragments: usize,
    pub checksum: Option<ChecksumFile>,
    /// Issues that belong to no single addon.
    pub issues: Vec<Issue>,
    pub addons: Vec<AddonOutcome>,
}

impl PipelineReport {
    pub fn count(&self, status: AddonStatus) -> usize {
        self.addons
            .iter()
            .filter(|addon| addon.status() == status)
            .count()
    }

    /// Pipeline and addon issues together.
    pub fn all_issues(&self) -> impl Iterator<Item = &Issue> {
        self.issues
            .iter()
            .chain(self.addons.iter().flat_map(|addon| addon.issues.iter()))
    }

    pub fn warning_count(&self) -> usize {
        self.all_issues().filter(|issue| issue.is_warning()).count()
    }

    pub fn error_count(&self) -> usize {
        self.all_issues().filter(|issue| !issue.is_warning()).count()
    }
}

/// Work decided for one candidate before packaging starts.
enum Plan {
    Skip(AddonOutcome),
    Build(Candidate, AddonDescriptor),
}

pub struct Pipeline<'a> {
    config: &'a Config,
    layout: RepositoryLayout,
    reporter: &'a dyn Reporter,
}

impl<'a> Pipeline<'a> {
    pub fn new(root: impl AsRef<Path>, config: &'a Config, reporter: &'a dyn Reporter) -> Self {
        Self {
            layout: RepositoryLayout::new(root, config),
            config,
            reporter,
        }
    }

    pub const fn layout(&self) -> &RepositoryLayout {
        &self.layout
    }

    pub fn run(&self) -> Result<PipelineReport> {
        let started_at = Utc::now();
        let mut issues = Vec::new();

        self.enter(Phase::Reset);
        output_dir::reset(&self.layout.output_root())?;

        self.enter(Phase::Bootstrap);
        let bootstrap =
            match bootstrap::bootstrap(&self.layout, self.config.repository.as_ref(), false) {
                Ok(outcome) => Some(outcome),
                Err(err) => {
                    self.record(&mut issues, Issue::from_error(&err));
                    None
                }
            };

        self.enter(Phase::Discover);
        let candidates = discover::discover(&self.layout)?;

        self.enter(Phase::Aggregate);
        let aggregation = manifest::aggregate(&candidates);
        let manifest_path = self.layout.manifest_path();
        let manifest_file = match aggregation.manifest.write(&manifest_path) {
            Ok(()) => Some(manifest_path),
            Err(err) => {
                let issue = Issue::new(
                    ErrorCode::ManifestWriteFailure,
                    format!("cannot write {}: {err}", manifest_path.display()),
                )
                .with_path(&manifest_path);
                self.record(&mut issues, issue);
                None
            }
        };

        self.enter(Phase::Checksum);
        let checksum = match &manifest_file {
            Some(path) => match checksum::write_checksum(path) {
                Ok(file) => Some(file),
                Err(err) => {
                    self.record(&mut issues, Issue::from_error(&err));
                    None
                }
            },
            None => {
                let path = self.layout.manifest_path();
                let issue = Issue::new(
                    ErrorCode::ChecksumFailure,
                    format!("{} was not written, no checksum produced", path.display()),
                )
                .with_path(&path);
                self.record(&mut issues, issue);
                None
            }
        };

        self.enter(Phase::Package);
        let unreadable: HashMap<String, Issue> = aggregation
            .issues
            .into_iter()
            .filter_map(|issue| issue.addon.clone().map(|addon| (addon, issue)))
            .collect();
        let plans = self.plan(candidates, unreadable);
        let addons = self.package_all(plans);

        for outcome in &addons {
            for issue in &outcome.issues {
                issue.log();
            }
            self.reporter.addon(outcome);
        }

        let report = PipelineReport {
            started_at,
            finished_at: Utc::now(),
            root: self.layout.root().to_path_buf(),
            output_root: self.layout.output_root(),
            bootstrap,
            manifest: manifest_file,
            fragments: aggregation.manifest.len(),
            checksum,
            issues,
            addons,
        };

        info!(
            packaged = report.count(AddonStatus::Packaged)
                + report.count(AddonStatus::PackagedWithWarnings),
            skipped = report.count(AddonStatus::Skipped),
            warnings = report.warning_count(),
            "Build finished"
        );
        Ok(report)
    }

    fn enter(&self, phase: Phase) {
        info!(phase = ?phase, "{phase}");
        self.reporter.phase(phase);
    }

    fn record(&self, issues: &mut Vec<Issue>, issue: Issue) {
        issue.log();
        self.reporter.issue(&issue);
        issues.push(issue);
    }

    /// Parse descriptors and settle identifier ownership in discovery order.
    fn plan(&self, candidates: Vec<Candidate>, mut unreadable: HashMap<String, Issue>) -> Vec<Plan> {
        let mut claimed: HashSet<String> = HashSet::new();

        candidates
            .into_iter()
            .map(|candidate| {
                if let Some(issue) = unreadable.remove(&candidate.dir_name) {
                    return Plan::Skip(AddonOutcome::skipped(&candidate, issue));
                }

                let descriptor = match AddonDescriptor::load(&candidate) {
                    Ok(descriptor) => descriptor,
                    Err(err) => {
                        return Plan::Skip(AddonOutcome::skipped(&candidate, Issue::from_error(&err)));
                    }
                };

                if !claimed.insert(descriptor.id.clone()) {
                    let err = RepoError::DuplicateDestination {
                        addon_id: descriptor.id.clone(),
                        path: self.layout.destination(&descriptor.id),
                    };
                    let mut outcome = AddonOutcome::new(&candidate);
                    outcome.addon_id = Some(descriptor.id);
                    outcome.version = Some(descriptor.version);
                    outcome.push(Issue::from_error(&err).with_path(&candidate.path));
                    return Plan::Skip(outcome);
                }

                Plan::Build(candidate, descriptor)
            })
            .collect()
    }

    fn package_all(&self, plans: Vec<Plan>) -> Vec<AddonOutcome> {
        let packager = Packager::new(&self.layout, &self.config.build);
        let run = |plan: Plan| match plan {
            Plan::Skip(outcome) => outcome,
            Plan::Build(candidate, descriptor) => package_one(&packager, &candidate, descriptor),
        };

        if self.config.build.parallel {
            debug!(threads = rayon::current_num_threads(), "Packaging in parallel");
            plans.into_par_iter().map(run).collect()
        } else {
            plans.into_iter().map(run).collect()
        }
    }
}

fn package_one(
    packager: &Packager<'_>,
    candidate: &Candidate,
    descriptor: AddonDescriptor,
) -> AddonOutcome {
    let mut outcome = AddonOutcome::new(candidate);
    outcome.addon_id = Some(descriptor.id.clone());
    outcome.version = Some(descriptor.version.clone());

    match packager.package(candidate, &descriptor) {
        Ok(archive) => {
            let assets = assets::copy_assets(candidate, &archive.destination_dir);
            outcome.archive = Some(archive.archive_path);
            outcome.assets = assets.copied;
            for issue in assets.issues {
                outcome.push(issue);
            }
        }
        Err(err) => outcome.push(Issue::from_error(&err)),
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::NullReporter;
    use crate::test_utils::fixtures::RepoFixture;

    fn run(fixture: &RepoFixture, config: &Config) -> PipelineReport {
        Pipeline::new(fixture.root(), config, &NullReporter)
            .run()
            .unwrap()
    }

    #[test]
    fn builds_every_addon() {
        let fixture = RepoFixture::new();
        fixture.add_addon("foo", "foo", "1.0.0");
        fixture.write("foo/icon.png", "png");
        fixture.add_addon("bar", "bar", "2.1.0");

        let report = run(&fixture, &Config::default());

        let out = fixture.root().join("_zips");
        assert!(out.join("foo/foo-1.0.0.zip").is_file());
        assert!(out.join("bar/bar-2.1.0.zip").is_file());
        assert!(out.join("foo/icon.png").is_file());
        assert_eq!(report.fragments, 2);
        assert_eq!(report.manifest, Some(out.join("addons.xml")));
        assert_eq!(report.checksum.as_ref().unwrap().digest.len(), 32);

        let bar = report.addons.iter().find(|a| a.dir_name == "bar").unwrap();
        assert_eq!(bar.status(), AddonStatus::PackagedWithWarnings);
        assert!(bar.has_issue(ErrorCode::AssetMissing));
    }

    #[test]
    fn duplicate_id_goes_to_first_candidate() {
        let fixture = RepoFixture::new();
        fixture.add_addon("a", "plugin.same", "1.0");
        fixture.add_addon("b", "plugin.same", "2.0");

        let report = run(&fixture, &Config::default());

        let skipped: Vec<_> = report
            .addons
            .iter()
            .filter(|a| a.status() == AddonStatus::Skipped)
            .collect();
        assert_eq!(skipped.len(), 1);
        assert!(skipped[0].has_issue(ErrorCode::DuplicateDestination));

        let dest = fixture.root().join("_zips/plugin.same");
        assert_eq!(std::fs::read_dir(dest).unwrap().count(), 2); // zip + addon.xml
    }

    #[test]
    fn unreadable_descriptor_is_reported_once() {
        let fixture = RepoFixture::new();
        fixture.add_addon("good", "plugin.good", "1.0");
        std::fs::create_dir_all(fixture.root().join("bad")).unwrap();
        std::fs::write(fixture.root().join("bad/addon.xml"), [0xff, 0xfe]).unwrap();

        let report = run(&fixture, &Config::default());

        assert!(report.issues.is_empty());
        let bad = report.addons.iter().find(|a| a.dir_name == "bad").unwrap();
        assert_eq!(bad.status(), AddonStatus::Skipped);
        assert_eq!(bad.issues.len(), 1);
        assert_eq!(bad.issues[0].code, ErrorCode::FragmentReadFailure);
        assert_eq!(report.fragments, 1);
    }

    #[test]
    fn parallel_run_matches_sequential_layout() {
        let fixture = RepoFixture::new();
        for i in 0..6 {
            fixture.add_addon(&format!("addon{i}"), &format!("plugin.n{i}"), "1.0");
        }
        fixture.add_addon("dup", "plugin.n0", "9.9");

        let mut config = Config::default();
        config.build.parallel = true;
        let report = run(&fixture, &config);

        assert_eq!(report.count(AddonStatus::Skipped), 1);
        let loser = report
            .addons
            .iter()
            .find(|a| a.status() == AddonStatus::Skipped)
            .unwrap();
        assert!(loser.has_issue(ErrorCode::DuplicateDestination));

        // Whichever of the two was listed first owns the folder alone.
        let dest = fixture.root().join("_zips/plugin.n0");
        let zips: Vec<_> = std::fs::read_dir(&dest)
            .unwrap()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_name().to_string_lossy().ends_with(".zip"))
            .collect();
        assert_eq!(zips.len(), 1);
        assert_eq!(report.addons.len(), 7);
    }

    #[test]
    fn output_setup_failure_aborts_the_run() {
        let fixture = RepoFixture::new();
        let missing = fixture.root().join("missing");
        let config = Config::default();
        // `<root>/_zips` cannot be created below a regular file.
        std::fs::write(&missing, "file").unwrap();
        let err = Pipeline::new(&missing, &config, &NullReporter)
            .run()
            .unwrap_err();
        assert!(err.code().is_fatal());
    }
}
