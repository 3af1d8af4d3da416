//! Dump deduplication for the database export stage.
//!
//! Each export run writes a fresh minute-stamped dump next to the previous
//! one, then this module decides which of the two survives. Equal content
//! keeps the *older* file and drops the new one; changed content drops the
//! previous file. Steady state is a single dump per directory.

use crate::backup::result_error::error::Error;
use crate::backup::result_error::result::Result;
use crate::backup::result_error::WithMsg;
use itertools::Itertools;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::info;

/// Common name prefix shared by every dump file in a stage directory
pub static DUMP_PREFIX: &str = "backup-";

/// What [`dedup_dump`] did with the freshly written dump.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DedupOutcome {
    /// First or only dump in the directory, nothing to compare against
    Kept,
    /// Content unchanged: the new dump was deleted, the older file kept
    DroppedDuplicate { kept: PathBuf },
    /// Content changed: the previous dump was deleted
    ReplacedPrevious { removed: PathBuf },
}

/// Compares `new_dump` against the chronologically preceding dump in `dir`
/// and removes whichever of the two is redundant.
///
/// Ordering is by file modification time; the second-to-last entry is taken
/// as the previous dump (the last is `new_dump` itself, already on disk).
/// When the content hashes match, the new file is removed and the older one
/// retained. That retention direction is deliberate and must not be flipped.
pub fn dedup_dump(dir: &Path, new_dump: &Path) -> Result<DedupOutcome> {
    let new_digest = file_digest(new_dump)?;

    let dumps = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .file_name()
                    .and_then(|name| name.to_str())
                    .is_some_and(|name| name.starts_with(DUMP_PREFIX))
        })
        .filter_map(|path| {
            std::fs::metadata(&path)
                .and_then(|md| md.modified())
                .ok()
                .map(|mtime| (path, mtime))
        })
        .sorted_unstable_by_key(|(_, mtime)| *mtime)
        .map(|(path, _)| path)
        .collect_vec();

    if dumps.len() < 2 {
        info!("No previous dump to compare against, keeping {:?}", new_dump);
        return Ok(DedupOutcome::Kept);
    }

    let previous = dumps[dumps.len() - 2].clone();
    let previous_digest = file_digest(&previous)?;

    if new_digest == previous_digest {
        info!(
            "Dump is equal to the previous one, removing {:?} and keeping {:?}",
            new_dump, previous
        );
        std::fs::remove_file(new_dump)
            .map_err(Error::from)
            .with_msg(format!("could not remove {:?}", new_dump))?;
        Ok(DedupOutcome::DroppedDuplicate { kept: previous })
    } else {
        info!("Dump has changed, removing previous dump {:?}", previous);
        std::fs::remove_file(&previous)
            .map_err(Error::from)
            .with_msg(format!("could not remove {:?}", previous))?;
        Ok(DedupOutcome::ReplacedPrevious { removed: previous })
    }
}

fn file_digest(path: &Path) -> Result<[u8; 32]> {
    let mut file = File::open(path)
        .map_err(Error::from)
        .with_msg(format!("cannot open dump {:?} for hashing", path))?;
    let mut hasher = Sha256::new();
    std::io::copy(&mut file, &mut hasher)?;
    Ok(hasher.finalize().into())
}
