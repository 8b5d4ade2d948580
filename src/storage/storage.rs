use snafu::{OptionExt, Snafu};
use tracing::{debug, trace, warn};

use crate::change::{ChangeBatch, NodeChange};
use crate::handle::DocumentHandle;
use crate::path::Path;
use crate::snapshot::RootSnapshot;
use crate::storage::DocumentSource;
use crate::storage::node::{StorageNode, append_snapshots_into};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Storage<T> {
    children: Vec<StorageNode<T>>,
}

/// Outcome of [`Storage::apply_changes`].
///
/// `affected` lists every path whose state changed, in application order.
/// Changes targeting a path that does not exist are skipped and reported in
/// `rejected`; the remainder of the batch is still applied.
#[derive(Debug, Default)]
pub struct ApplyChangesResult {
    pub affected: Vec<Path>,
    pub rejected: Vec<StorageError>,
}

impl<T> Default for Storage<T> {
    fn default() -> Self {
        Self {
            children: Vec::new(),
        }
    }
}

impl<T> Storage<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: RootSnapshot<T>) -> Self {
        let mut storage = Self::new();
        let mut created = Vec::new();
        append_snapshots_into(
            &mut storage.children,
            false,
            &Path::root(),
            snapshot.children,
            &mut created,
        );
        debug!("Seeded storage with {} documents", created.len());
        storage
    }

    pub fn children(&self) -> &[StorageNode<T>] {
        &self.children
    }

    /// Appends a top-level document and returns its path.
    pub fn append_child(&mut self, document: T) -> Path {
        self.children.push(StorageNode::new(document));
        Path::from(vec![self.children.len() - 1])
    }

    /// Structural lookup. Soft-deleted nodes are still returned; the root
    /// path resolves to nothing since the root carries no document.
    pub fn node(&self, path: &Path) -> Option<&StorageNode<T>> {
        let (first, rest) = path.segments().split_first()?;
        rest.iter()
            .try_fold(self.children.get(*first)?, |node, segment| node.child(*segment))
    }

    pub fn node_mut(&mut self, path: &Path) -> Option<&mut StorageNode<T>> {
        let (first, rest) = path.segments().split_first()?;
        let mut node = self.children.get_mut(*first)?;
        for segment in rest {
            node = node.child_mut(*segment)?;
        }
        Some(node)
    }

    /// The document at `path`, unless it is absent or soft-deleted.
    pub fn query_document(&self, path: &Path) -> Option<&T> {
        self.node(path)
            .filter(|node| !node.is_deleted())
            .map(StorageNode::document)
    }

    pub fn query_handle(&self, path: &Path) -> Option<DocumentHandle<T>>
    where
        T: Clone,
    {
        self.query_document(path)
            .map(|document| DocumentHandle::new(path.clone(), document.clone()))
    }

    /// Exports the live tree. Soft-deleted subtrees are left out.
    pub fn snapshot(&self) -> RootSnapshot<T>
    where
        T: Clone,
    {
        RootSnapshot {
            children: self
                .children
                .iter()
                .filter_map(StorageNode::snapshot)
                .collect(),
        }
    }

    pub fn apply_changes(&mut self, batch: ChangeBatch<T>) -> ApplyChangesResult {
        let mut result = ApplyChangesResult::default();
        let total = batch.len();

        for change in batch {
            if let Err(err) = self.apply_change(change, &mut result.affected) {
                warn!("Rejected change: {}", err);
                result.rejected.push(err);
            }
        }

        debug!(
            "Applied {} of {} changes, {} paths affected",
            total - result.rejected.len(),
            total,
            result.affected.len()
        );
        result
    }

    fn apply_change(
        &mut self,
        change: NodeChange<T>,
        affected: &mut Vec<Path>,
    ) -> Result<(), StorageError> {
        let path = change.handle_path().clone();
        let node = self
            .node_mut(&path)
            .context(MissingTargetNodeSnafu { path: path.clone() })?;

        match change {
            NodeChange::DocumentChanged { document, .. } => {
                trace!("Replacing document at {}", path);
                node.set_document(document);
                affected.push(path);
            }
            NodeChange::ChildrenAdded { added, .. } => {
                trace!("Appending {} subtrees under {}", added.len(), path);
                node.append_snapshots(&path, added, affected);
            }
            NodeChange::Deleted { .. } => {
                trace!("Deleting subtree at {}", path);
                node.delete();
                affected.push(path);
            }
        }

        Ok(())
    }
}

impl<T: Clone> DocumentSource<T> for Storage<T> {
    fn query_handle(&self, path: &Path) -> Option<DocumentHandle<T>> {
        Storage::query_handle(self, path)
    }

    fn apply_changes(&mut self, batch: ChangeBatch<T>) -> ApplyChangesResult {
        Storage::apply_changes(self, batch)
    }
}

#[derive(Debug, Snafu)]
pub enum StorageError {
    #[snafu(display("Attempt to apply change to missing node at '{}'", path))]
    MissingTargetNode { path: Path },
}

impl StorageError {
    pub fn path(&self) -> &Path {
        match self {
            StorageError::MissingTargetNode { path } => path,
        }
    }
}
