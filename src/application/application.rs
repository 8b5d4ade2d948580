use snafu::prelude::*;
use snafu::Snafu;
use tracing::{debug, info, warn};

use crate::application::{RuntimeConfig, Script};
use crate::cache::{Cache, CacheError, NodeId};
use crate::cli::ColorChoice;
use crate::path::Path;
use crate::render::{render_cache, render_changes, render_storage};
use crate::seed::{SeedError, read_seed};
use crate::storage::Storage;
use crate::sync::{PushReport, SyncError, pull, push};

pub struct Application;

impl Application {
    pub async fn run(config: impl Into<RuntimeConfig>) -> Result<(), ApplicationError> {
        let config: RuntimeConfig = config.into();
        apply_color_choice(config.color);

        let seed = read_seed(&config.seed).await.context(SeedSnafu)?;
        let mut storage = Storage::from_snapshot(seed);
        info!("Seeded storage with {} top-level documents", storage.children().len());

        let mut cache = Cache::new();
        let pending = execute(&config.script, &mut storage, &mut cache)?;

        println!("storage:\n{}", render_storage(&storage));
        println!("cache:\n{}", render_cache(&cache));
        match pending {
            Some(report) => {
                for rejected in &report.rejected {
                    println!("rejected: {rejected}");
                }
            }
            None => {
                let changes = cache.get_changes();
                if !changes.is_empty() {
                    println!("pending changes:\n{}", render_changes(&changes));
                }
            }
        }

        Ok(())
    }
}

/// Runs the local steps of `script` against `cache`. Returns the push report
/// when the script ends with a push.
pub fn execute(
    script: &Script,
    storage: &mut Storage<String>,
    cache: &mut Cache<String>,
) -> Result<Option<PushReport>, ApplicationError> {
    for path in &script.pulls {
        if pull(&*storage, cache, path).context(SyncSnafu)?.is_none() {
            warn!("No live document at {}, nothing pulled", path);
        }
    }

    for edit in &script.edits {
        let id = pulled(cache, &edit.path)?;
        cache
            .set_edited_document(id, edit.document.clone())
            .context(CacheSnafu)?;
    }

    for path in &script.deletes {
        let id = pulled(cache, path)?;
        cache.delete(id).context(CacheSnafu)?;
    }

    for addition in &script.additions {
        let id = pulled(cache, &addition.path)?;
        cache
            .add_subdocument(id, addition.document.clone())
            .context(CacheSnafu)?;
    }

    if script.discard {
        cache.discard_changes();
    }

    if !script.push {
        debug!("Leaving {} changes staged", cache.get_changes().len());
        return Ok(None);
    }
    let report = push(storage, cache).context(SyncSnafu)?;
    Ok(Some(report))
}

fn pulled(cache: &Cache<String>, path: &Path) -> Result<NodeId, ApplicationError> {
    cache
        .node_at(path)
        .context(NotPulledSnafu { path: path.clone() })
}

fn apply_color_choice(choice: ColorChoice) {
    let enabled = match choice {
        ColorChoice::Auto => supports_color::on(supports_color::Stream::Stdout).is_some(),
        ColorChoice::Always => true,
        ColorChoice::Never => false,
    };
    colored::control::set_override(enabled);
}

#[derive(Debug, Snafu)]
pub enum ApplicationError {
    #[snafu(display("Critical failure encountered while loading the seed"))]
    SeedError { source: SeedError },
    #[snafu(display("Failed to synchronize the cache with storage"))]
    SyncError { source: SyncError },
    #[snafu(display("Failed to stage a local change"))]
    CacheError { source: CacheError },
    #[snafu(display("Document at '{}' has not been pulled", path))]
    NotPulled { path: Path },
}
