use backup_all::backup::config::BackupConfig;
use backup_all::backup::pipeline;
use backup_all::backup::stage::Toolchain;
use clap::Parser;
use std::path::PathBuf;
use std::process::exit;
use tracing::{error, info, warn};

/// Backup the host: SQL dump, optional apt snapshot, duplicity archive,
/// rclone sync
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Location of the JSON config file
    #[arg(short, long)]
    config: PathBuf,

    /// Also snapshot the installed package set with apt-clone
    #[arg(long)]
    include_apt_clone: bool,
}

fn main() {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let config = match BackupConfig::load(&args.config) {
        Ok(config) => config,
        Err(e) => {
            error!("configuration file [{:?}] is unusable: {e}", args.config);
            exit(1);
        }
    };

    let report = pipeline::run(&config, &Toolchain::default(), args.include_apt_clone);

    for (stage, outcome) in report.iter() {
        info!("{stage}: {outcome:?}");
    }
    if report.any_failed() {
        // Stage failures are surfaced through the log only; the scheduler
        // always sees exit 0 once the configuration was loadable.
        warn!("One or more stages failed, see the log above");
    }
}
