//! Package snapshot stage: clone the installed package set with `apt-clone`.

use crate::backup::result_error::result::Result;
use crate::backup::stage::run_tool;
use std::path::Path;
use std::process::Command;
use tracing::info;

/// Writes an apt-clone snapshot (with dpkg-repacked local packages) into
/// `dir`.
pub fn clone_packages(tool: &str, dir: &Path) -> Result<()> {
    run_tool(
        Command::new(tool)
            .args(["clone", "--with-dpkg-repack", "."])
            .current_dir(dir),
        tool,
    )?;
    info!("Clone was OK");
    Ok(())
}
