//! Configuration for the whole backup run.
//!
//! Loaded once at process start from a JSON document and never mutated
//! afterwards: stages hand their outputs to later stages as explicit return
//! values instead of writing derived fields back into the configuration.

use crate::backup::redacted::RedactedString;
use crate::backup::result_error::error::Error;
use crate::backup::result_error::result::Result;
use crate::backup::result_error::WithMsg;
use crate::backup::validate::{validate_glob_patterns, validate_remote_target, validate_sub_path};
use bon::Builder;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::{Component, Path, PathBuf};
use validator::Validate;

/// Root configuration, one section per stage.
///
/// `backup_path` is the root under which every stage creates its own
/// subdirectory; stage `backup_path` fields are always resolved relative to
/// it.
#[derive(Clone, Serialize, Deserialize, Debug, Validate, Builder)]
#[serde(deny_unknown_fields)]
pub struct BackupConfig {
    #[builder(into)]
    pub backup_path: PathBuf,
    #[validate(nested)]
    pub sql: SqlConfig,
    #[validate(nested)]
    pub apt: AptConfig,
    #[validate(nested)]
    pub duplicity: DuplicityConfig,
    #[validate(nested)]
    pub rclone: RcloneConfig,
}

/// Settings for the database export stage.
#[derive(Clone, Serialize, Deserialize, Debug, Validate, Builder)]
#[serde(deny_unknown_fields)]
pub struct SqlConfig {
    #[validate(length(min = 1))]
    #[builder(into)]
    pub username: String,
    #[validate(nested)]
    #[builder(into)]
    pub password: RedactedString,
    #[validate(custom(function = validate_sub_path))]
    #[builder(into)]
    pub backup_path: PathBuf,
}

/// Settings for the optional package snapshot stage.
#[derive(Clone, Serialize, Deserialize, Debug, Validate, Builder)]
#[serde(deny_unknown_fields)]
pub struct AptConfig {
    #[validate(custom(function = validate_sub_path))]
    #[builder(into)]
    pub backup_path: PathBuf,
}

/// Settings for the incremental archive stage.
///
/// `source_path` is the tree duplicity archives; `filelist` seeds the ordered
/// directive list (see [`crate::backup::directive`]).
#[derive(Clone, Serialize, Deserialize, Debug, Validate, Builder)]
#[serde(deny_unknown_fields)]
pub struct DuplicityConfig {
    #[validate(custom(function = validate_sub_path))]
    #[builder(into)]
    pub backup_path: PathBuf,
    #[builder(into)]
    pub source_path: PathBuf,
    #[validate(nested)]
    #[builder(into)]
    pub key: RedactedString,
    #[serde(default)]
    #[validate(custom(function = validate_glob_patterns))]
    #[builder(default)]
    pub include: Vec<String>,
    #[serde(default)]
    #[validate(custom(function = validate_glob_patterns))]
    #[builder(default)]
    pub exclude: Vec<String>,
    #[serde(default)]
    #[builder(default)]
    pub filelist: Vec<String>,
}

/// Settings for the remote sync stage.
///
/// `backup_path` is the destination identifier, opaque to this tool. The copy
/// source is not configured here: it is the archive stage's working
/// directory, handed over at run time.
#[derive(Clone, Serialize, Deserialize, Debug, Validate, Builder)]
#[serde(deny_unknown_fields)]
pub struct RcloneConfig {
    #[validate(custom(function = validate_remote_target))]
    #[builder(into)]
    pub backup_path: String,
}

impl BackupConfig {
    /// Reads, tilde-expands and validates a JSON configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<BackupConfig> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(Error::from)
            .with_msg(format!("cannot open config file {:?}", path))?;
        let mut config: BackupConfig = serde_json::from_reader(file)
            .map_err(Error::from)
            .with_msg(format!("cannot parse JSON config {:?}", path))?;
        config.backup_path = expand_tilde(&config.backup_path);
        config
            .validate()
            .map_err(Error::from)
            .with_msg(format!("config validation failed for {:?}", path))?;
        Ok(config)
    }

    /// Absolute directory for a stage, resolved against the backup root.
    pub fn stage_dir<P: AsRef<Path>>(&self, sub_path: P) -> PathBuf {
        self.backup_path.join(sub_path)
    }
}

/// Replaces a leading `~` component with the user's home directory.
///
/// Paths without a leading `~`, or environments without a resolvable home,
/// are returned unchanged.
fn expand_tilde(path: &Path) -> PathBuf {
    let mut components = path.components();
    match components.next() {
        Some(Component::Normal(first)) if first == "~" => match dirs::home_dir() {
            Some(home) => home.join(components.as_path()),
            None => path.to_path_buf(),
        },
        _ => path.to_path_buf(),
    }
}
