//! # backup_all
//!
//! An unattended, best-effort host backup pipeline built on external tools.
//!
//! ## Stages
//!
//! - **SQL export**: `mysqldump` of all databases, deduplicated against the
//!   previous dump by content hash
//! - **Package snapshot** (optional): `apt-clone` snapshot of the installed
//!   package set
//! - **Archive**: incremental encrypted `duplicity` archive assembled from
//!   declared include/exclude globs and an ordered directive list
//! - **Remote sync**: `rclone` copy of the archive directory to a remote
//!
//! Every stage is isolated: a failing tool is logged and the run continues
//! with the next stage.
//!
//! ## Quick Start
//!
//! ```no_run
//! use backup_all::backup::config::BackupConfig;
//! use backup_all::backup::pipeline;
//! use backup_all::backup::stage::Toolchain;
//!
//! let config = BackupConfig::load("config.json")?;
//! let report = pipeline::run(&config, &Toolchain::default(), false);
//! # Ok::<(), backup_all::backup::result_error::error::Error>(())
//! ```

pub mod backup;
