//! Validation functions for configuration values.

use globset::Glob;
use std::path::Path;
use validator::ValidationError;

pub fn validate_glob_patterns(patterns: &Vec<String>) -> Result<(), ValidationError> {
    for pattern in patterns {
        if let Err(e) = Glob::new(pattern) {
            return Err(ValidationError::new("InvalidGlob")
                .with_message(format!("invalid glob pattern {pattern:?}: {e}").into()));
        }
    }

    Ok(())
}

pub fn validate_sub_path<P: AsRef<Path>>(path: P) -> Result<(), ValidationError> {
    if path.as_ref().as_os_str().is_empty() {
        return Err(ValidationError::new("InvalidSubPath")
            .with_message("stage backup_path must not be empty".into()));
    }

    Ok(())
}

pub fn validate_remote_target<S: AsRef<str>>(target: S) -> Result<(), ValidationError> {
    if target.as_ref().is_empty() {
        return Err(ValidationError::new("InvalidRemoteTarget")
            .with_message("rclone backup_path must not be empty".into()));
    }

    Ok(())
}
