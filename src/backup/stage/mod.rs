//! Stage implementations, one module per external tool.

pub mod apt;
pub mod duplicity;
pub mod rclone;
pub mod sql;

use crate::backup::result_error::error::Error;
use crate::backup::result_error::result::Result;
use crate::backup::result_error::WithMsg;
use bon::Builder;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::info;

pub static MYSQLDUMP: &str = "mysqldump";
pub static APT_CLONE: &str = "apt-clone";
pub static DUPLICITY: &str = "duplicity";
pub static RCLONE: &str = "rclone";

/// Program names of the external tools, one per stage.
///
/// Defaults to the real tools; tests substitute stub programs to drive the
/// pipeline without them installed.
#[derive(Clone, Debug, Builder)]
pub struct Toolchain {
    #[builder(default = MYSQLDUMP.to_string(), into)]
    pub mysqldump: String,
    #[builder(default = APT_CLONE.to_string(), into)]
    pub apt_clone: String,
    #[builder(default = DUPLICITY.to_string(), into)]
    pub duplicity: String,
    #[builder(default = RCLONE.to_string(), into)]
    pub rclone: String,
}

impl Default for Toolchain {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Runs a prepared command to completion, mapping a failure to spawn or a
/// non-zero exit to an error carrying the tool name.
pub(crate) fn run_tool(cmd: &mut Command, tool: &str) -> Result<()> {
    let status = cmd
        .status()
        .map_err(Error::from)
        .with_msg(format!("could not start {tool}"))?;
    if status.success() {
        Ok(())
    } else {
        Err(Error::ToolFailed {
            tool: tool.to_string(),
            status,
        })
    }
}

/// Creates a stage directory under the backup root; a pre-existing directory
/// is not an error.
pub(crate) fn create_stage_dir(root: &Path, sub_path: &Path) -> Result<PathBuf> {
    let dir = root.join(sub_path);
    if dir.is_dir() {
        info!("{:?}: directory already exists", dir);
    } else {
        std::fs::create_dir_all(&dir)
            .map_err(Error::from)
            .with_msg(format!("could not create stage directory {:?}", dir))?;
    }
    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_toolchain_defaults() {
        let tools = Toolchain::default();
        assert_eq!(tools.mysqldump, MYSQLDUMP);
        assert_eq!(tools.apt_clone, APT_CLONE);
        assert_eq!(tools.duplicity, DUPLICITY);
        assert_eq!(tools.rclone, RCLONE);
    }

    #[test]
    fn test_run_tool_success() {
        assert!(run_tool(&mut Command::new("true"), "true").is_ok());
    }

    #[test]
    fn test_run_tool_nonzero_exit() {
        let err = run_tool(&mut Command::new("false"), "false").unwrap_err();
        match err {
            Error::ToolFailed { tool, status } => {
                assert_eq!(tool, "false");
                assert!(!status.success());
            }
            other => panic!("Expected ToolFailed, got {other:?}"),
        }
    }

    #[test]
    fn test_run_tool_spawn_failure() {
        let err = run_tool(&mut Command::new("/nonexistent/tool"), "tool").unwrap_err();
        assert!(err.to_string().contains("could not start tool"));
    }

    #[test]
    fn test_create_stage_dir_is_idempotent() {
        let root = TempDir::new().unwrap();

        let dir = create_stage_dir(root.path(), Path::new("sql")).unwrap();
        assert!(dir.is_dir());

        // Second call must not fail
        let again = create_stage_dir(root.path(), Path::new("sql")).unwrap();
        assert_eq!(dir, again);
    }

    #[test]
    fn test_create_stage_dir_blocked_by_file() {
        let root = TempDir::new().unwrap();
        std::fs::write(root.path().join("blocker"), "").unwrap();

        let res = create_stage_dir(root.path(), Path::new("blocker/sub"));
        assert!(res.is_err());
    }
}
