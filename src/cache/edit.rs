use snafu::{OptionExt, ensure};
use tracing::{debug, trace};

use crate::cache::cache::{
    Cache, CacheError, NotAHandleSnafu, NotEditableSnafu, Slot, UnknownNodeSnafu,
};
use crate::cache::node::{AddedNode, CacheNode, HandleNode, NodeId, NodeKind};

/// Local edit staging. Nothing here reaches storage until the changes are
/// diffed out and pushed.
impl<T> Cache<T> {
    /// On a handle node this records an edit; on an added node it replaces
    /// the staged document.
    pub fn set_edited_document(&mut self, id: NodeId, document: T) -> Result<(), CacheError> {
        match &mut self.slot_mut(id)?.node {
            CacheNode::Handle(node) => node.set_edited_document(document),
            CacheNode::Added(node) => node.set_document(document),
            CacheNode::Missing(_) => {
                return NotEditableSnafu {
                    id,
                    kind: NodeKind::Missing,
                }
                .fail();
            }
        }
        trace!("Edited node {}", id);
        Ok(())
    }

    pub fn reset_edited_document(&mut self, id: NodeId) -> Result<(), CacheError> {
        self.handle_mut(id)?.reset_edited_document();
        Ok(())
    }

    /// Flags a handle node as deleted, or drops a staged added node along
    /// with its staged descendants. The flag does not cascade to children.
    pub fn delete(&mut self, id: NodeId) -> Result<(), CacheError> {
        match self.slot_mut(id)?.node.kind() {
            NodeKind::Handle => self.handle_mut(id)?.set_deleted(true),
            NodeKind::Added => {
                self.detach(id);
                self.drop_subtree(id);
            }
            kind @ NodeKind::Missing => return NotEditableSnafu { id, kind }.fail(),
        }
        debug!("Deleted node {} locally", id);
        Ok(())
    }

    pub fn undelete(&mut self, id: NodeId) -> Result<(), CacheError> {
        self.handle_mut(id)?.set_deleted(false);
        Ok(())
    }

    /// Stages a new subdocument under a handle or added node.
    pub fn add_subdocument(&mut self, parent: NodeId, document: T) -> Result<NodeId, CacheError> {
        let kind = self.slot_mut(parent)?.node.kind();
        ensure!(
            kind != NodeKind::Missing,
            NotEditableSnafu { id: parent, kind }
        );

        let id = self.alloc(Some(parent), CacheNode::Added(AddedNode::new(document)));
        if let Some(list) = self.slot_mut(parent)?.node.added_children_mut() {
            list.push(id);
        }
        debug!("Staged subdocument {} under {}", id, parent);
        Ok(id)
    }

    /// Drops every staged subdocument under `id`.
    pub fn discard_added_children(&mut self, id: NodeId) -> Result<(), CacheError> {
        let staged = match self.slot_mut(id)?.node.added_children_mut() {
            Some(list) => std::mem::take(list),
            None => return Ok(()),
        };
        for child in staged {
            self.drop_subtree(child);
        }
        Ok(())
    }

    /// What an editor should show: the staged or edited document, falling
    /// back to the pulled one. `None` for missing nodes.
    pub fn editing_document(&self, id: NodeId) -> Option<&T> {
        match self.node(id)? {
            CacheNode::Handle(node) => Some(node.editing_document()),
            CacheNode::Added(node) => Some(node.document()),
            CacheNode::Missing(_) => None,
        }
    }

    /// Whether `id` is hidden by a local delete, its own or an ancestor's.
    pub fn is_deleted(&self, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node_id) = current {
            if let Some(CacheNode::Handle(node)) = self.node(node_id) {
                if node.is_deleted() {
                    return true;
                }
            }
            current = self.parent(node_id);
        }
        false
    }

    pub(super) fn slot_mut(&mut self, id: NodeId) -> Result<&mut Slot<T>, CacheError> {
        self.nodes.get_mut(&id).context(UnknownNodeSnafu { id })
    }

    fn handle_mut(&mut self, id: NodeId) -> Result<&mut HandleNode<T>, CacheError> {
        match &mut self.slot_mut(id)?.node {
            CacheNode::Handle(node) => Ok(node),
            other => NotAHandleSnafu {
                id,
                kind: other.kind(),
            }
            .fail(),
        }
    }
}
