//! Archive stage: build the incremental encrypted archive with `duplicity`.

use crate::backup::directive::ArchiveInvocation;
use crate::backup::result_error::result::Result;
use crate::backup::stage::run_tool;
use std::path::Path;
use std::process::Command;
use tracing::info;

/// Runs duplicity with the assembled argument set, writing the archive into
/// `work_dir`. The passphrase travels via the `PASSPHRASE` environment
/// variable, never argv.
pub fn archive(tool: &str, invocation: &ArchiveInvocation, work_dir: &Path) -> Result<()> {
    info!(
        "duplicity command: {} {:?} {:?} {}",
        tool, invocation.args, invocation.source_path, invocation.destination
    );
    run_tool(
        Command::new(tool)
            .args(&invocation.args)
            .arg(&invocation.source_path)
            .arg(&invocation.destination)
            .env("PASSPHRASE", invocation.key.inner())
            .current_dir(work_dir),
        tool,
    )?;
    info!("Duplicity was OK");
    Ok(())
}
