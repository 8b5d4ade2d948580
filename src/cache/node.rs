use derive_more::{Display, From};

use crate::handle::DocumentHandle;
use crate::path::Path;

/// Stable identity of a cache node. Ids are never reused, and a missing node
/// keeps its id when it is promoted to a handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, From)]
#[display("#{_0}")]
pub struct NodeId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum NodeKind {
    #[display("missing")]
    Missing,
    #[display("handle")]
    Handle,
    #[display("added")]
    Added,
}

/// Placeholder for an address known to exist in storage but not pulled yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingNode {
    handle_path: Path,
    pub(super) children: Vec<NodeId>,
}

impl MissingNode {
    pub(super) fn new(handle_path: Path) -> Self {
        Self {
            handle_path,
            children: Vec::new(),
        }
    }

    pub fn handle_path(&self) -> &Path {
        &self.handle_path
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// A node bound to a document pulled from storage, plus its local edit state.
///
/// The edit, delete and addition axes are independent of each other.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandleNode<T> {
    handle: DocumentHandle<T>,
    edited_document: Option<T>,
    deleted: bool,
    pub(super) added_children: Vec<NodeId>,
    pub(super) children: Vec<NodeId>,
}

impl<T> HandleNode<T> {
    pub(super) fn new(handle: DocumentHandle<T>) -> Self {
        Self::with_children(handle, Vec::new())
    }

    pub(super) fn with_children(handle: DocumentHandle<T>, children: Vec<NodeId>) -> Self {
        Self {
            handle,
            edited_document: None,
            deleted: false,
            added_children: Vec::new(),
            children,
        }
    }

    pub fn handle(&self) -> &DocumentHandle<T> {
        &self.handle
    }

    pub fn handle_path(&self) -> &Path {
        &self.handle.path
    }

    /// The document as pulled, ignoring any local edit.
    pub fn document(&self) -> &T {
        &self.handle.document
    }

    pub fn edited_document(&self) -> Option<&T> {
        self.edited_document.as_ref()
    }

    /// The edited document if there is one, the pulled one otherwise.
    pub fn editing_document(&self) -> &T {
        self.edited_document.as_ref().unwrap_or(&self.handle.document)
    }

    pub fn is_edited(&self) -> bool {
        self.edited_document.is_some()
    }

    /// The local delete flag of this node alone.
    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    pub fn has_added_children(&self) -> bool {
        !self.added_children.is_empty()
    }

    pub fn is_changed(&self) -> bool {
        self.deleted || self.is_edited() || self.has_added_children()
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn added_children(&self) -> &[NodeId] {
        &self.added_children
    }

    pub(super) fn set_edited_document(&mut self, document: T) {
        self.edited_document = Some(document);
    }

    pub(super) fn reset_edited_document(&mut self) {
        self.edited_document = None;
    }

    pub(super) fn set_deleted(&mut self, deleted: bool) {
        self.deleted = deleted;
    }

    /// Rebinds to a freshly pulled handle and drops the pending edit.
    pub(super) fn refresh(&mut self, handle: DocumentHandle<T>) {
        self.reset_edited_document();
        self.handle = handle;
    }

    pub(super) fn discard_changes(&mut self) {
        self.deleted = false;
        self.reset_edited_document();
    }
}

/// A subdocument staged locally; it has no storage path yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddedNode<T> {
    document: T,
    pub(super) added_children: Vec<NodeId>,
}

impl<T> AddedNode<T> {
    pub(super) fn new(document: T) -> Self {
        Self {
            document,
            added_children: Vec::new(),
        }
    }

    pub fn document(&self) -> &T {
        &self.document
    }

    pub fn added_children(&self) -> &[NodeId] {
        &self.added_children
    }

    pub(super) fn set_document(&mut self, document: T) {
        self.document = document;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheNode<T> {
    Missing(MissingNode),
    Handle(HandleNode<T>),
    Added(AddedNode<T>),
}

impl<T> CacheNode<T> {
    pub fn kind(&self) -> NodeKind {
        match self {
            CacheNode::Missing(_) => NodeKind::Missing,
            CacheNode::Handle(_) => NodeKind::Handle,
            CacheNode::Added(_) => NodeKind::Added,
        }
    }

    /// The storage address this node mirrors. Added nodes have none.
    pub fn handle_path(&self) -> Option<&Path> {
        match self {
            CacheNode::Missing(node) => Some(node.handle_path()),
            CacheNode::Handle(node) => Some(node.handle_path()),
            CacheNode::Added(_) => None,
        }
    }

    /// Addressable children, in path order.
    pub fn children(&self) -> &[NodeId] {
        match self {
            CacheNode::Missing(node) => node.children(),
            CacheNode::Handle(node) => node.children(),
            CacheNode::Added(_) => &[],
        }
    }

    pub fn added_children(&self) -> &[NodeId] {
        match self {
            CacheNode::Missing(_) => &[],
            CacheNode::Handle(node) => node.added_children(),
            CacheNode::Added(node) => node.added_children(),
        }
    }

    pub fn as_handle(&self) -> Option<&HandleNode<T>> {
        match self {
            CacheNode::Handle(node) => Some(node),
            _ => None,
        }
    }

    pub fn as_added(&self) -> Option<&AddedNode<T>> {
        match self {
            CacheNode::Added(node) => Some(node),
            _ => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, CacheNode::Missing(_))
    }

    pub(super) fn children_mut(&mut self) -> Option<&mut Vec<NodeId>> {
        match self {
            CacheNode::Missing(node) => Some(&mut node.children),
            CacheNode::Handle(node) => Some(&mut node.children),
            CacheNode::Added(_) => None,
        }
    }

    pub(super) fn added_children_mut(&mut self) -> Option<&mut Vec<NodeId>> {
        match self {
            CacheNode::Missing(_) => None,
            CacheNode::Handle(node) => Some(&mut node.added_children),
            CacheNode::Added(node) => Some(&mut node.added_children),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle(path: &str, document: &str) -> DocumentHandle<String> {
        DocumentHandle::new(path.parse().unwrap(), document.to_string())
    }

    #[test]
    fn fresh_handle_node_is_unchanged() {
        let node = HandleNode::new(handle("/0", "doc"));
        assert!(!node.is_changed());
        assert_eq!(node.editing_document(), "doc");
        assert_eq!(node.handle_path().to_string(), "/0");
    }

    #[test]
    fn edit_is_tracked_even_when_equal_to_pulled_document() {
        let mut node = HandleNode::new(handle("/0", "doc"));
        node.set_edited_document("doc".to_string());
        assert!(node.is_edited());
        assert!(node.is_changed());
    }

    #[test]
    fn refresh_drops_edit_but_keeps_delete_flag() {
        let mut node = HandleNode::new(handle("/0", "old"));
        node.set_edited_document("edited".to_string());
        node.set_deleted(true);

        node.refresh(handle("/0", "new"));

        assert!(!node.is_edited());
        assert!(node.is_deleted());
        assert_eq!(node.document(), "new");
    }

    #[test]
    fn discard_clears_edit_and_delete_only() {
        let mut node = HandleNode::new(handle("/0", "doc"));
        node.set_edited_document("edited".to_string());
        node.set_deleted(true);
        node.added_children.push(NodeId::from(7));

        node.discard_changes();

        assert!(!node.is_edited());
        assert!(!node.is_deleted());
        assert!(node.has_added_children());
    }

    #[test]
    fn kinds_and_display() {
        let missing: CacheNode<String> = CacheNode::Missing(MissingNode::new("/1".parse().unwrap()));
        let added: CacheNode<String> = CacheNode::Added(AddedNode::new("new".to_string()));
        assert_eq!(missing.kind().to_string(), "missing");
        assert_eq!(added.kind(), NodeKind::Added);
        assert_eq!(added.handle_path(), None);
        assert!(missing.is_missing());
        assert_eq!(NodeId::from(3).to_string(), "#3");
    }
}
