//! The stage orchestrator.
//!
//! Fixed order: `Init -> ExportDatabase -> [SnapshotPackages] -> BuildArchive
//! -> SyncRemote`. Every stage is isolated: a failure is logged with the
//! stage name and the run continues. Stage outputs travel as explicit values
//! (the archive stage's working directory becomes the sync stage's copy
//! source); the configuration is never mutated.

use crate::backup::config::BackupConfig;
use crate::backup::directive::{self, DirectiveSet, Sign};
use crate::backup::result_error::error::Error;
use crate::backup::result_error::result::Result;
use crate::backup::stage::{self, Toolchain};
use derive_more::Display;
use std::path::PathBuf;
use tracing::{error, info, warn};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Display)]
pub enum Stage {
    #[display("Init")]
    Init,
    #[display("ExportDatabase")]
    ExportDatabase,
    #[display("SnapshotPackages")]
    SnapshotPackages,
    #[display("BuildArchive")]
    BuildArchive,
    #[display("SyncRemote")]
    SyncRemote,
}

/// Result of one stage, recorded so outcomes stay independently observable.
#[derive(Debug, Default)]
pub enum StageOutcome {
    Succeeded,
    Failed(Error),
    #[default]
    Skipped,
}

impl StageOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, StageOutcome::Succeeded)
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, StageOutcome::Failed(_))
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, StageOutcome::Skipped)
    }
}

/// One outcome per stage for a single run.
#[derive(Debug, Default)]
pub struct RunReport {
    pub init: StageOutcome,
    pub export: StageOutcome,
    pub snapshot: StageOutcome,
    pub archive: StageOutcome,
    pub sync: StageOutcome,
}

impl RunReport {
    pub fn iter(&self) -> impl Iterator<Item = (Stage, &StageOutcome)> {
        [
            (Stage::Init, &self.init),
            (Stage::ExportDatabase, &self.export),
            (Stage::SnapshotPackages, &self.snapshot),
            (Stage::BuildArchive, &self.archive),
            (Stage::SyncRemote, &self.sync),
        ]
        .into_iter()
    }

    pub fn any_failed(&self) -> bool {
        self.iter().any(|(_, outcome)| outcome.is_failure())
    }
}

/// Creates the backup root; a pre-existing directory is not an error.
fn init_root(config: &BackupConfig) -> Result<()> {
    let root = &config.backup_path;
    if root.is_dir() {
        info!("{:?}: directory already exists", root);
        Ok(())
    } else {
        std::fs::create_dir_all(root).map_err(Error::from)
    }
}

fn record(stage: Stage, result: Result<()>) -> StageOutcome {
    match result {
        Ok(()) => StageOutcome::Succeeded,
        Err(e) => {
            error!("{stage} failed: {e}");
            StageOutcome::Failed(e)
        }
    }
}

/// Runs the whole pipeline once. Never returns an error: stage failures are
/// captured in the report, and only configuration loading (which happens
/// before this function) is fatal.
pub fn run(config: &BackupConfig, tools: &Toolchain, include_apt_clone: bool) -> RunReport {
    let mut report = RunReport::default();

    info!("Initializing backup run under {:?}", config.backup_path);
    report.init = record(Stage::Init, init_root(config));

    // Directive list for the archiver, seeded from the configuration. Stages
    // push their directories at the front, so later stages take precedence.
    let mut directives = DirectiveSet::from(config.duplicity.filelist.clone());

    info!("Export SQL...");
    report.export = record(
        Stage::ExportDatabase,
        stage::create_stage_dir(&config.backup_path, &config.sql.backup_path).and_then(|dir| {
            // The dump directory is part of the archive even when the dump
            // tool later fails; only a missing directory keeps it out.
            directives.push_front(&dir, Sign::Include);
            stage::sql::export(&tools.mysqldump, &config.sql, &dir).map(|outcome| {
                info!("Dump outcome: {:?}", outcome);
            })
        }),
    );

    if include_apt_clone {
        info!("Clone apt...");
        report.snapshot = record(
            Stage::SnapshotPackages,
            stage::create_stage_dir(&config.backup_path, &config.apt.backup_path).and_then(
                |dir| {
                    directives.push_front(&dir, Sign::Include);
                    stage::apt::clone_packages(&tools.apt_clone, &dir)
                },
            ),
        );
    } else {
        info!("Skipping apt clone, not enabled");
    }

    info!("Duplicity...");
    let mut archive_dir: Option<PathBuf> = None;
    report.archive = record(
        Stage::BuildArchive,
        stage::create_stage_dir(&config.backup_path, &config.duplicity.backup_path).and_then(
            |dir| {
                // Record the handoff as soon as the directory exists: the sync
                // stage still copies whatever the archiver managed to write.
                archive_dir = Some(dir.clone());
                let invocation = directive::build(&config.duplicity, &directives);
                stage::duplicity::archive(&tools.duplicity, &invocation, &dir)
            },
        ),
    );

    report.sync = match &archive_dir {
        Some(source) => record(
            Stage::SyncRemote,
            stage::rclone::copy(&tools.rclone, source, &config.rclone.backup_path),
        ),
        None => {
            warn!("Skipping remote sync, no archive directory was recorded");
            StageOutcome::Skipped
        }
    };

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backup::config::{AptConfig, DuplicityConfig, RcloneConfig, SqlConfig};
    use std::path::Path;
    use tempfile::TempDir;

    fn test_config(root: &Path) -> BackupConfig {
        BackupConfig::builder()
            .backup_path(root)
            .sql(
                SqlConfig::builder()
                    .username("root")
                    .password("pw")
                    .backup_path("sql")
                    .build(),
            )
            .apt(AptConfig::builder().backup_path("apt").build())
            .duplicity(
                DuplicityConfig::builder()
                    .backup_path("duplicity")
                    .source_path("/")
                    .key("passphrase")
                    .build(),
            )
            .rclone(RcloneConfig::builder().backup_path("remote:backups").build())
            .build()
    }

    fn stub_tools() -> Toolchain {
        Toolchain::builder()
            .mysqldump("true")
            .apt_clone("true")
            .duplicity("true")
            .rclone("true")
            .build()
    }

    #[test]
    fn test_full_run_with_stub_tools() {
        let root = TempDir::new().unwrap();
        let config = test_config(root.path());

        let report = run(&config, &stub_tools(), true);

        for (stage, outcome) in report.iter() {
            assert!(outcome.is_success(), "{stage} was {outcome:?}");
        }
        assert!(root.path().join("sql").is_dir());
        assert!(root.path().join("apt").is_dir());
        assert!(root.path().join("duplicity").is_dir());
        assert!(!report.any_failed());
    }

    #[test]
    fn test_snapshot_skipped_unless_enabled() {
        let root = TempDir::new().unwrap();
        let config = test_config(root.path());

        let report = run(&config, &stub_tools(), false);

        assert!(report.snapshot.is_skipped());
        assert!(!root.path().join("apt").exists());
    }

    #[test]
    fn test_export_failure_does_not_stop_later_stages() {
        let root = TempDir::new().unwrap();
        let config = test_config(root.path());
        let tools = Toolchain::builder()
            .mysqldump("false")
            .apt_clone("true")
            .duplicity("true")
            .rclone("true")
            .build();

        let report = run(&config, &tools, false);

        assert!(report.export.is_failure());
        assert!(report.archive.is_success());
        assert!(report.sync.is_success());
    }

    #[test]
    fn test_sync_runs_even_when_archiver_exits_nonzero() {
        // The handoff is recorded when the archive directory is created, so
        // a failed duplicity run still leaves something to sync.
        let root = TempDir::new().unwrap();
        let config = test_config(root.path());
        let tools = Toolchain::builder()
            .mysqldump("true")
            .apt_clone("true")
            .duplicity("false")
            .rclone("true")
            .build();

        let report = run(&config, &tools, false);

        assert!(report.archive.is_failure());
        assert!(report.sync.is_success());
    }

    #[test]
    fn test_sync_skipped_when_no_handoff_recorded() {
        let root = TempDir::new().unwrap();
        let mut config = test_config(root.path());
        // A file where the archive directory should go makes its creation fail
        std::fs::write(root.path().join("blocker"), "").unwrap();
        config.duplicity.backup_path = "blocker/duplicity".into();

        let report = run(&config, &stub_tools(), false);

        assert!(report.archive.is_failure());
        assert!(report.sync.is_skipped());
    }

    #[test]
    fn test_unstartable_tools_are_isolated() {
        let root = TempDir::new().unwrap();
        let config = test_config(root.path());
        let tools = Toolchain::builder()
            .mysqldump("/nonexistent/mysqldump")
            .apt_clone("/nonexistent/apt-clone")
            .duplicity("/nonexistent/duplicity")
            .rclone("/nonexistent/rclone")
            .build();

        let report = run(&config, &tools, true);

        assert!(report.init.is_success());
        assert!(report.export.is_failure());
        assert!(report.snapshot.is_failure());
        assert!(report.archive.is_failure());
        assert!(report.sync.is_failure());
    }

    #[test]
    fn test_stage_directories_feed_the_directive_set() {
        // Drive the directive accumulation the way the pipeline does and
        // check that later stage directories take precedence.
        let root = TempDir::new().unwrap();
        let config = test_config(root.path());
        let mut directives = DirectiveSet::from(config.duplicity.filelist.clone());
        directives.push_front(root.path().join("sql"), Sign::Include);
        directives.push_front(root.path().join("apt"), Sign::Include);

        let invocation = directive::build(&config.duplicity, &directives);
        let apt_pos = invocation
            .args
            .iter()
            .position(|a| a.ends_with("/apt"))
            .unwrap();
        let sql_pos = invocation
            .args
            .iter()
            .position(|a| a.ends_with("/sql"))
            .unwrap();
        assert!(apt_pos < sql_pos);
    }
}
