//! Ordered include/exclude directives for the archive invocation.
//!
//! Directives accumulate over one run: the configuration's `filelist` seeds
//! the set, and each stage that produced a directory pushes an include
//! directive for it at the front. Front insertion means the most recently
//! added directive wins when the archiver evaluates overlapping paths.

use crate::backup::config::DuplicityConfig;
use crate::backup::redacted::RedactedString;
use derive_more::{Display, From};
use itertools::Itertools;
use std::path::{Path, PathBuf};

pub static INCLUDE_FLAG: &str = "--include";
pub static EXCLUDE_FLAG: &str = "--exclude";

/// Fixed local destination token passed to duplicity; the archive is written
/// into the stage's working directory.
pub static LOCAL_DESTINATION: &str = "file://.";

static COMMENT_MARKER: char = '#';
static EXCLUDE_SIGN: &str = "-";

/// Directive polarity, rendered the way directive lines store it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Display)]
pub enum Sign {
    #[display("+")]
    Include,
    #[display("-")]
    Exclude,
}

/// The ordered directive lines, newest first.
///
/// Lines keep the raw `"<sign> <path>"` text form so that configuration
/// `filelist` entries (including comments) and run-time additions go through
/// the same parser in [`build`].
#[derive(Clone, Debug, Default, From)]
pub struct DirectiveSet {
    lines: Vec<String>,
}

impl DirectiveSet {
    pub fn push_front<P: AsRef<Path>>(&mut self, path: P, sign: Sign) {
        self.lines
            .insert(0, format!("{} {}", sign, path.as_ref().display()));
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }
}

/// The fully resolved argument set for one duplicity run.
#[derive(Clone, Debug)]
pub struct ArchiveInvocation {
    /// Include/exclude flags, in evaluation order
    pub args: Vec<String>,
    /// Tree being archived
    pub source_path: PathBuf,
    /// Archive store, always [`LOCAL_DESTINATION`]
    pub destination: String,
    /// Encryption passphrase, passed to the tool via its env channel only
    pub key: RedactedString,
}

/// Assembles the archiver argument set: declared include globs first, then
/// declared exclude globs, then the directives in their current order.
///
/// Directive lines starting with `#` contribute nothing, and so do empty or
/// whitespace-only lines (an empty include flag would be worse than either
/// dropping the line or failing the whole archive stage over it). A line
/// splitting into exactly a sign and a path maps `-` to an exclude flag and
/// any other sign to an include flag. Any other shape (a bare path, or a
/// malformed line with extra tokens) contributes an include flag on its
/// first token.
pub fn build(config: &DuplicityConfig, directives: &DirectiveSet) -> ArchiveInvocation {
    let mut args = Vec::new();

    for glob in &config.include {
        args.push(INCLUDE_FLAG.to_string());
        args.push(glob.clone());
    }
    for glob in &config.exclude {
        args.push(EXCLUDE_FLAG.to_string());
        args.push(glob.clone());
    }

    for line in directives.lines() {
        if line.trim().is_empty() || line.starts_with(COMMENT_MARKER) {
            continue;
        }
        let tokens = line.split(' ').collect_vec();
        if tokens.len() == 2 {
            let flag = if tokens[0] == EXCLUDE_SIGN {
                EXCLUDE_FLAG
            } else {
                INCLUDE_FLAG
            };
            args.push(flag.to_string());
            args.push(tokens[1].to_string());
        } else {
            args.push(INCLUDE_FLAG.to_string());
            args.push(tokens[0].to_string());
        }
    }

    ArchiveInvocation {
        args,
        source_path: config.source_path.clone(),
        destination: LOCAL_DESTINATION.to_string(),
        key: config.key.clone(),
    }
}
