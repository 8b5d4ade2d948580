use std::path::PathBuf;

use crate::cli::{Assignment, Cli, ColorChoice};
use crate::path::Path;

/// The local steps of one session, run in field order.
#[derive(Debug, Clone, Default)]
pub struct Script {
    pub pulls: Vec<Path>,
    pub edits: Vec<Assignment>,
    pub deletes: Vec<Path>,
    pub additions: Vec<Assignment>,
    pub discard: bool,
    pub push: bool,
}

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub seed: PathBuf,
    pub script: Script,
    pub color: ColorChoice,
}

impl From<Cli> for RuntimeConfig {
    fn from(cli: Cli) -> Self {
        Self {
            seed: cli.seed,
            script: Script {
                pulls: cli.pulls,
                edits: cli.edits,
                deletes: cli.deletes,
                additions: cli.additions,
                discard: cli.discard,
                push: cli.push,
            },
            color: cli.color,
        }
    }
}
