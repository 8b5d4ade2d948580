use tracing::trace;

use crate::path::{Path, PathSegment};
use crate::snapshot::DocumentSnapshot;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageNode<T> {
    document: T,
    deleted: bool,
    children: Vec<StorageNode<T>>,
}

impl<T> StorageNode<T> {
    pub fn new(document: T) -> Self {
        Self {
            document,
            deleted: false,
            children: Vec::new(),
        }
    }

    pub fn document(&self) -> &T {
        &self.document
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    pub fn children(&self) -> &[StorageNode<T>] {
        &self.children
    }

    pub fn child(&self, segment: PathSegment) -> Option<&StorageNode<T>> {
        self.children.get(segment)
    }

    pub fn child_mut(&mut self, segment: PathSegment) -> Option<&mut StorageNode<T>> {
        self.children.get_mut(segment)
    }

    pub fn set_document(&mut self, document: T) {
        self.document = document;
    }

    /// Tombstones this node and its whole subtree.
    pub fn delete(&mut self) {
        for child in &mut self.children {
            child.delete();
        }
        self.deleted = true;
    }

    /// Appends a child and returns its index. A child appended under a
    /// deleted node starts out deleted.
    pub fn append_child(&mut self, document: T) -> PathSegment {
        push_child(&mut self.children, self.deleted, document)
    }

    /// Exports the live subtree, or `None` if this node is deleted.
    pub fn snapshot(&self) -> Option<DocumentSnapshot<T>>
    where
        T: Clone,
    {
        if self.deleted {
            return None;
        }
        Some(DocumentSnapshot {
            document: self.document.clone(),
            children: self.children.iter().filter_map(Self::snapshot).collect(),
        })
    }

    pub(super) fn append_snapshots(
        &mut self,
        path: &Path,
        snapshots: Vec<DocumentSnapshot<T>>,
        created: &mut Vec<Path>,
    ) {
        append_snapshots_into(&mut self.children, self.deleted, path, snapshots, created);
    }
}

fn push_child<T>(children: &mut Vec<StorageNode<T>>, parent_deleted: bool, document: T) -> PathSegment {
    let mut node = StorageNode::new(document);
    node.deleted = parent_deleted;
    children.push(node);
    children.len() - 1
}

/// Appends every snapshot depth-first under `parent_path`, recording each new
/// path in `created`.
pub(super) fn append_snapshots_into<T>(
    children: &mut Vec<StorageNode<T>>,
    parent_deleted: bool,
    parent_path: &Path,
    snapshots: Vec<DocumentSnapshot<T>>,
    created: &mut Vec<Path>,
) {
    for DocumentSnapshot {
        document,
        children: nested,
    } in snapshots
    {
        let index = push_child(children, parent_deleted, document);
        let path = parent_path.append(index);
        trace!("Appended storage node {}", path);
        created.push(path.clone());

        let node = &mut children[index];
        append_snapshots_into(&mut node.children, node.deleted, &path, nested, created);
    }
}
