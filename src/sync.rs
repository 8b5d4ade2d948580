//! Pull and push between storage and the cache.
//!
//! The cache never writes to storage directly. A push diffs the cache into a
//! batch, hands it to [`DocumentSource::apply_changes`] and then re-pulls every
//! affected path, so storage stays the source of truth.

use snafu::{ResultExt, Snafu};
use tracing::{debug, info, warn};

use crate::cache::{Cache, CacheError, NodeId};
use crate::change::NodeChange;
use crate::path::Path;
use crate::storage::{DocumentSource, StorageError};

/// Outcome of [`push`].
#[derive(Debug, Default)]
pub struct PushReport {
    /// Paths storage reported as changed, in order.
    pub affected: Vec<Path>,
    /// Affected paths that were re-pulled into the cache.
    pub refreshed: Vec<Path>,
    /// Affected paths that no longer resolve and were dropped from the cache.
    pub removed: Vec<Path>,
    /// Changes storage could not apply.
    pub rejected: Vec<StorageError>,
}

impl PushReport {
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty()
    }
}

/// Copies the document at `path` from storage into the cache.
///
/// Returns `Ok(None)` when storage has no live document there; the cache is
/// left untouched in that case.
pub fn pull<T, S>(source: &S, cache: &mut Cache<T>, path: &Path) -> Result<Option<NodeId>, SyncError>
where
    S: DocumentSource<T> + ?Sized,
{
    let Some(handle) = source.query_handle(path) else {
        debug!("Nothing to pull at {}", path);
        return Ok(None);
    };
    let id = cache
        .add_handle(handle)
        .context(CacheUpdateSnafu { path: path.clone() })?;
    Ok(Some(id))
}

/// Commits every local change in the cache and re-synchronizes what storage
/// reports as affected.
pub fn push<T, S>(source: &mut S, cache: &mut Cache<T>) -> Result<PushReport, SyncError>
where
    T: Clone,
    S: DocumentSource<T> + ?Sized,
{
    let batch = cache.get_changes();
    if batch.is_empty() {
        debug!("Nothing to push");
        return Ok(PushReport::default());
    }

    let committed_additions: Vec<Path> = batch
        .iter()
        .filter_map(|change| match change {
            NodeChange::ChildrenAdded { handle_path, .. } => Some(handle_path.clone()),
            _ => None,
        })
        .collect();

    info!("Pushing {} changes", batch.len());
    let result = source.apply_changes(batch);
    let mut report = PushReport {
        affected: result.affected,
        rejected: result.rejected,
        ..PushReport::default()
    };

    for path in committed_additions {
        if report.rejected.iter().any(|err| err.path() == &path) {
            warn!("Additions under {} were not committed, keeping them staged", path);
            continue;
        }
        if let Some(id) = cache.node_at(&path) {
            cache
                .discard_added_children(id)
                .context(CacheUpdateSnafu { path: path.clone() })?;
        }
    }

    for path in &report.affected {
        if pull(&*source, cache, path)?.is_some() {
            report.refreshed.push(path.clone());
        } else if cache.node_at(path).is_some() {
            cache
                .remove_handle(path)
                .context(CacheUpdateSnafu { path: path.clone() })?;
            report.removed.push(path.clone());
        }
    }

    info!(
        "Push finished: {} refreshed, {} removed, {} rejected",
        report.refreshed.len(),
        report.removed.len(),
        report.rejected.len()
    );
    Ok(report)
}

#[derive(Debug, Snafu)]
pub enum SyncError {
    #[snafu(display("Failed to update the cache at '{}'", path))]
    CacheUpdate { path: Path, source: CacheError },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheNode, HandleNode, NodeKind};
    use crate::snapshot::{DocumentSnapshot, RootSnapshot};
    use crate::storage::Storage;

    fn path(s: &str) -> Path {
        s.parse().unwrap()
    }

    fn seeded() -> Storage<String> {
        Storage::from_snapshot(RootSnapshot::from(vec![
            DocumentSnapshot::leaf("A".to_string()),
            DocumentSnapshot::with_children(
                "B".to_string(),
                vec![DocumentSnapshot::leaf("B0".to_string())],
            ),
        ]))
    }

    fn handle_node<'a>(cache: &'a Cache<String>, p: &str) -> &'a HandleNode<String> {
        cache
            .node_at(&path(p))
            .and_then(|id| cache.node(id))
            .and_then(CacheNode::as_handle)
            .expect("handle node")
    }

    #[test]
    fn pull_edit_push_round_trip() {
        let mut storage = seeded();
        let mut cache = Cache::new();

        let id = pull(&storage, &mut cache, &path("/1/0")).unwrap().unwrap();
        assert_eq!(
            cache.node(cache.node_at(&path("/1")).unwrap()).map(CacheNode::kind),
            Some(NodeKind::Missing)
        );
        assert_eq!(cache.query_document(&path("/1/0")), Some(&"B0".to_string()));

        cache.set_edited_document(id, "B0-edited".to_string()).unwrap();
        assert_eq!(
            cache.get_changes(),
            vec![NodeChange::DocumentChanged {
                handle_path: path("/1/0"),
                document: "B0-edited".to_string(),
            }]
        );

        let report = push(&mut storage, &mut cache).unwrap();

        assert_eq!(report.affected, vec![path("/1/0")]);
        assert_eq!(report.refreshed, vec![path("/1/0")]);
        assert!(report.is_clean());
        assert_eq!(
            storage.query_document(&path("/1/0")),
            Some(&"B0-edited".to_string())
        );
        let node = handle_node(&cache, "/1/0");
        assert!(!node.is_edited());
        assert_eq!(node.document(), "B0-edited");
        assert!(cache.get_changes().is_empty());
        cache.assert_consistent();
    }

    #[test]
    fn manual_round_trip_through_storage_calls() {
        let mut storage = seeded();
        let mut cache = Cache::new();
        let id = pull(&storage, &mut cache, &path("/1/0")).unwrap().unwrap();
        cache.set_edited_document(id, "B0-edited".to_string()).unwrap();

        storage.apply_changes(cache.get_changes());
        assert_eq!(
            storage.query_document(&path("/1/0")),
            Some(&"B0-edited".to_string())
        );

        pull(&storage, &mut cache, &path("/1/0")).unwrap();
        assert!(!handle_node(&cache, "/1/0").is_edited());
    }

    #[test]
    fn pulling_absent_document_leaves_cache_untouched() {
        let storage = seeded();
        let mut cache = Cache::new();

        assert_eq!(pull(&storage, &mut cache, &path("/7")).unwrap(), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn pushed_deletion_removes_node_and_collects_missing_parents() {
        let mut storage = seeded();
        let mut cache = Cache::new();
        let id = pull(&storage, &mut cache, &path("/1/0")).unwrap().unwrap();
        cache.delete(id).unwrap();

        let report = push(&mut storage, &mut cache).unwrap();

        assert_eq!(report.removed, vec![path("/1/0")]);
        assert_eq!(storage.query_document(&path("/1/0")), None);
        assert!(cache.is_empty());
        cache.assert_consistent();
    }

    #[test]
    fn pushed_deletion_drops_cached_descendants() {
        let mut storage = seeded();
        let mut cache = Cache::new();
        let parent = pull(&storage, &mut cache, &path("/1")).unwrap().unwrap();
        pull(&storage, &mut cache, &path("/1/0")).unwrap();
        cache.delete(parent).unwrap();

        push(&mut storage, &mut cache).unwrap();

        assert_eq!(cache.node_at(&path("/1/0")), None);
        assert_eq!(storage.query_document(&path("/1/0")), None);
        cache.assert_consistent();
    }

    #[test]
    fn edits_under_a_deleted_parent_are_dropped_with_it() {
        let mut storage = seeded();
        let mut cache = Cache::new();
        let parent = pull(&storage, &mut cache, &path("/1")).unwrap().unwrap();
        let child = pull(&storage, &mut cache, &path("/1/0")).unwrap().unwrap();
        cache.set_edited_document(child, "B0-edited".to_string()).unwrap();
        cache.delete(parent).unwrap();

        let report = push(&mut storage, &mut cache).unwrap();

        assert_eq!(report.affected, vec![path("/1"), path("/1/0")]);
        assert_eq!(report.removed, vec![path("/1")]);
        assert!(report.is_clean());
        assert!(cache.is_empty());
        assert_eq!(storage.query_document(&path("/1/0")), None);
        cache.assert_consistent();
    }

    #[test]
    fn pushed_additions_become_real_handles() {
        let mut storage = seeded();
        let mut cache = Cache::new();
        let parent = pull(&storage, &mut cache, &path("/0")).unwrap().unwrap();
        let added = cache.add_subdocument(parent, "A0".to_string()).unwrap();
        cache.add_subdocument(added, "A00".to_string()).unwrap();

        let report = push(&mut storage, &mut cache).unwrap();

        assert_eq!(report.affected, vec![path("/0/0"), path("/0/0/0")]);
        assert_eq!(report.refreshed, report.affected);
        assert!(cache.node(parent).unwrap().added_children().is_empty());
        assert_eq!(handle_node(&cache, "/0/0").document(), "A0");
        assert_eq!(handle_node(&cache, "/0/0/0").document(), "A00");
        assert_eq!(storage.query_document(&path("/0/0/0")), Some(&"A00".to_string()));
        assert!(cache.get_changes().is_empty());
        cache.assert_consistent();
    }

    #[test]
    fn rejected_additions_stay_staged() {
        let mut storage = seeded();
        let mut cache = Cache::new();
        let parent = pull(&storage, &mut cache, &path("/1/0")).unwrap().unwrap();
        cache.add_subdocument(parent, "orphan".to_string()).unwrap();

        // storage loses the target behind the cache's back
        storage = Storage::from_snapshot(RootSnapshot::from(vec![DocumentSnapshot::leaf(
            "A".to_string(),
        )]));

        let report = push(&mut storage, &mut cache).unwrap();

        assert!(!report.is_clean());
        assert_eq!(report.rejected[0].path(), &path("/1/0"));
        assert_eq!(cache.node(parent).unwrap().added_children().len(), 1);
    }

    #[test]
    fn empty_cache_pushes_nothing() {
        let mut storage = seeded();
        let before = storage.clone();
        let mut cache = Cache::new();

        let report = push(&mut storage, &mut cache).unwrap();

        assert!(report.affected.is_empty());
        assert_eq!(storage, before);
    }
}
