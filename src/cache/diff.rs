use tracing::debug;

use crate::cache::cache::Cache;
use crate::cache::node::{CacheNode, HandleNode, NodeId};
use crate::change::{ChangeBatch, NodeChange};
use crate::snapshot::DocumentSnapshot;

/// Pre-order walk over addressable nodes, children in path order.
pub struct DepthFirst<'a, T> {
    cache: &'a Cache<T>,
    stack: Vec<NodeId>,
}

impl<T> Iterator for DepthFirst<'_, T> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        self.stack
            .extend(self.cache.children(id).iter().rev().copied());
        Some(id)
    }
}

impl<T> Cache<T> {
    pub fn iter_depth_first(&self) -> DepthFirst<'_, T> {
        DepthFirst {
            cache: self,
            stack: self.root.iter().rev().copied().collect(),
        }
    }

    /// Lazily yields one change per changed handle node, parents first.
    pub fn iter_changes(&self) -> impl Iterator<Item = NodeChange<T>> + '_
    where
        T: Clone,
    {
        self.iter_depth_first().filter_map(|id| self.change_for(id))
    }

    pub fn get_changes(&self) -> ChangeBatch<T>
    where
        T: Clone,
    {
        let changes: ChangeBatch<T> = self.iter_changes().collect();
        debug!("Collected {} changes from cache", changes.len());
        changes
    }

    /// Clears the delete flag and edit of every handle node. Staged
    /// subdocuments stay.
    pub fn discard_changes(&mut self) {
        let handles: Vec<NodeId> = self.iter_depth_first().collect();
        for id in handles {
            if let Some(slot) = self.nodes.get_mut(&id) {
                if let CacheNode::Handle(node) = &mut slot.node {
                    node.discard_changes();
                }
            }
        }
        debug!("Discarded local edits and deletions");
    }

    /// Whether `id` would contribute a change.
    pub fn is_changed(&self, id: NodeId) -> bool {
        self.node(id)
            .and_then(CacheNode::as_handle)
            .is_some_and(HandleNode::is_changed)
    }

    /// A delete wins over an edit, and an edit wins over staged additions.
    fn change_for(&self, id: NodeId) -> Option<NodeChange<T>>
    where
        T: Clone,
    {
        let node = self.node(id)?.as_handle()?;
        let handle_path = node.handle_path().clone();

        if node.is_deleted() {
            return Some(NodeChange::Deleted { handle_path });
        }
        if let Some(document) = node.edited_document() {
            return Some(NodeChange::DocumentChanged {
                handle_path,
                document: document.clone(),
            });
        }
        if node.has_added_children() {
            let added = node
                .added_children()
                .iter()
                .filter_map(|child| self.added_snapshot(*child))
                .collect();
            return Some(NodeChange::ChildrenAdded { handle_path, added });
        }
        None
    }

    fn added_snapshot(&self, id: NodeId) -> Option<DocumentSnapshot<T>>
    where
        T: Clone,
    {
        let node = self.node(id)?.as_added()?;
        Some(DocumentSnapshot {
            document: node.document().clone(),
            children: node
                .added_children()
                .iter()
                .filter_map(|child| self.added_snapshot(*child))
                .collect(),
        })
    }
}
