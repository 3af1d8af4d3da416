//! Remote sync stage: copy the archive directory to the remote store.

use crate::backup::result_error::result::Result;
use crate::backup::stage::run_tool;
use std::path::Path;
use std::process::Command;
use tracing::info;

/// Copies `source` (the archive stage's working directory) to the configured
/// destination identifier. No flags; success is the tool's exit status.
pub fn copy(tool: &str, source: &Path, destination: &str) -> Result<()> {
    info!("rclone copy {:?} -> {}", source, destination);
    run_tool(
        Command::new(tool).arg("copy").arg(source).arg(destination),
        tool,
    )
}
