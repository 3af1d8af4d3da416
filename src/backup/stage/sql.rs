//! Database export stage: dump all databases with `mysqldump`, then
//! deduplicate against the previous dump.

use crate::backup::config::SqlConfig;
use crate::backup::dedup::{dedup_dump, DedupOutcome, DUMP_PREFIX};
use crate::backup::result_error::error::Error;
use crate::backup::result_error::result::Result;
use crate::backup::result_error::WithMsg;
use crate::backup::stage::run_tool;
use chrono::{DateTime, Local, TimeZone};
use std::fmt::Display;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{error, info};

pub static DUMP_FILE_EXT: &str = "sql";

/// Minute granularity; two runs within the same minute overwrite the same
/// dump file.
static TIME_FORMAT: &str = "%Y-%m-%d-%H-%M";

/// Dumps all databases into a file stamped with the local wall-clock minute
/// and prunes it against the previous dump.
pub fn export(tool: &str, config: &SqlConfig, dir: &Path) -> Result<DedupOutcome> {
    export_at(tool, config, dir, Local::now())
}

pub(crate) fn export_at<O: Display, Tz: TimeZone<Offset = O>>(
    tool: &str,
    config: &SqlConfig,
    dir: &Path,
    now: DateTime<Tz>,
) -> Result<DedupOutcome> {
    let dump_path = dump_path_at(dir, now);
    info!(">>> Dumping: {:?} <<<", dump_path);

    let out = File::create(&dump_path)
        .map_err(Error::from)
        .with_msg(format!("could not create dump file {:?}", dump_path))?;

    let result = run_tool(
        Command::new(tool)
            .arg("-u")
            .arg(&config.username)
            .arg(format!("-p{}", config.password.inner()))
            .arg("--skip-dump-date")
            .arg("--all-databases")
            .stdout(out),
        tool,
    );

    if let Err(e) = result {
        // A failed dump leaves a corrupt partial file behind; never compare it
        remove_partial(&dump_path);
        return Err(e);
    }

    info!("Dump was OK");
    dedup_dump(dir, &dump_path)
}

pub(crate) fn dump_path_at<O: Display, Tz: TimeZone<Offset = O>>(
    dir: &Path,
    now: DateTime<Tz>,
) -> PathBuf {
    dir.join(format!(
        "{}{}.{}",
        DUMP_PREFIX,
        now.format(TIME_FORMAT),
        DUMP_FILE_EXT
    ))
}

fn remove_partial(path: &Path) {
    if let Err(e) = std::fs::remove_file(path) {
        error!("could not remove partial dump {:?}: {e}", path);
    }
}
