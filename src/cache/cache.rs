use std::collections::HashMap;

use snafu::{OptionExt, ResultExt, Snafu, ensure, location};
use tracing::{debug, error, trace};

use crate::cache::node::{CacheNode, HandleNode, MissingNode, NodeId, NodeKind};
use crate::handle::DocumentHandle;
use crate::path::{Path, PathError, PathSegment};

#[derive(Debug, Clone)]
pub(super) struct Slot<T> {
    pub(super) parent: Option<NodeId>,
    pub(super) node: CacheNode<T>,
}

/// Partial view of storage addressed by [`Path`].
///
/// `parent == None` on a slot means the node hangs off the (implicit) root.
#[derive(Debug, Clone)]
pub struct Cache<T> {
    pub(super) nodes: HashMap<NodeId, Slot<T>>,
    pub(super) root: Vec<NodeId>,
    index: HashMap<Path, NodeId>,
    next_id: u64,
}

impl<T> Default for Cache<T> {
    fn default() -> Self {
        Self {
            nodes: HashMap::new(),
            root: Vec::new(),
            index: HashMap::new(),
            next_id: 0,
        }
    }
}

impl<T> Cache<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of nodes of every kind.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn root_children(&self) -> &[NodeId] {
        &self.root
    }

    pub fn node(&self, id: NodeId) -> Option<&CacheNode<T>> {
        self.nodes.get(&id).map(|slot| &slot.node)
    }

    /// The missing or handle node registered at `path`.
    pub fn node_at(&self, path: &Path) -> Option<NodeId> {
        self.index.get(path).copied()
    }

    /// Addressable children of `id`, in path order.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map(CacheNode::children).unwrap_or(&[])
    }

    /// `None` for top-level nodes and unknown ids.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(&id).and_then(|slot| slot.parent)
    }

    pub fn handle_path(&self, id: NodeId) -> Option<&Path> {
        self.node(id).and_then(CacheNode::handle_path)
    }

    /// The pulled document at `path`, ignoring local edits.
    pub fn query_document(&self, path: &Path) -> Option<&T> {
        self.node_at(path)
            .and_then(|id| self.node(id))
            .and_then(CacheNode::as_handle)
            .map(HandleNode::document)
    }

    /// Inserts or refreshes the handle node at `handle.path`.
    ///
    /// An existing handle node drops its pending edit and is rebound. A
    /// missing node at that path is promoted in place and keeps its children.
    /// Otherwise missing placeholders are created for every unknown ancestor
    /// and a new handle node is attached in path order.
    pub fn add_handle(&mut self, handle: DocumentHandle<T>) -> Result<NodeId, CacheError> {
        ensure!(!handle.path.is_root(), RootHandleSnafu);

        match self.node_at(&handle.path) {
            Some(id) => self.rebind(id, handle),
            None => self.insert_handle(handle),
        }
    }

    /// Removes the node at `path` with everything below it, then every
    /// missing ancestor left without children.
    pub fn remove_handle(&mut self, path: &Path) -> Result<(), CacheError> {
        let id = self
            .node_at(path)
            .context(CannotRemoveNodeSnafu { path: path.clone() })?;

        let mut parent = self.parent(id);
        self.detach(id);
        self.drop_subtree(id);
        debug!("Removed cache node {}", path);

        while let Some(current) = parent {
            let Some(slot) = self.nodes.get(&current) else {
                break;
            };
            let orphaned =
                matches!(&slot.node, CacheNode::Missing(missing) if missing.children.is_empty());
            if !orphaned {
                break;
            }
            parent = slot.parent;
            self.detach(current);
            self.drop_subtree(current);
            trace!("Collected childless missing node {}", current);
        }

        Ok(())
    }

    fn rebind(&mut self, id: NodeId, handle: DocumentHandle<T>) -> Result<NodeId, CacheError> {
        let slot = self.nodes.get_mut(&id).context(UnknownNodeSnafu { id })?;

        match &mut slot.node {
            CacheNode::Handle(node) => {
                debug!("Refreshing handle node {}", handle);
                node.refresh(handle);
            }
            CacheNode::Missing(missing) => {
                debug!("Promoting missing node {} to a handle node", handle);
                let children = std::mem::take(&mut missing.children);
                slot.node = CacheNode::Handle(HandleNode::with_children(handle, children));
            }
            CacheNode::Added(_) => {
                return NotAddressableSnafu {
                    id,
                    kind: NodeKind::Added,
                }
                .fail();
            }
        }

        Ok(id)
    }

    fn insert_handle(&mut self, handle: DocumentHandle<T>) -> Result<NodeId, CacheError> {
        let parent_path = handle.path.parent().context(InvalidPathSnafu)?;
        let parent = self.ensure_parent_chain(&parent_path)?;

        let path = handle.path.clone();
        let id = self.alloc(parent, CacheNode::Handle(HandleNode::new(handle)));
        self.index.insert(path.clone(), id);
        self.attach(parent, id);
        debug!("Inserted handle node {} as {}", path, id);

        Ok(id)
    }

    /// Resolves the node that should hold children of `parent_path`,
    /// creating missing placeholders between the nearest known ancestor and
    /// `parent_path`.
    fn ensure_parent_chain(&mut self, parent_path: &Path) -> Result<Option<NodeId>, CacheError> {
        if parent_path.is_root() {
            return Ok(None);
        }
        if let Some(id) = self.node_at(parent_path) {
            return Ok(Some(id));
        }

        let (anchor_path, mut current) = parent_path
            .ancestors()
            .find_map(|path| self.node_at(&path).map(|id| (path, Some(id))))
            .unwrap_or((Path::root(), None));

        let gap = parent_path
            .relative_to(&anchor_path)
            .context(InvalidPathSnafu)?;

        let mut current_path = anchor_path;
        for segment in gap.segments() {
            current_path = current_path.append(*segment);
            let id = self.alloc(current, CacheNode::Missing(MissingNode::new(current_path.clone())));
            self.index.insert(current_path.clone(), id);
            self.attach(current, id);
            trace!("Created missing node {} as {}", current_path, id);
            current = Some(id);
        }

        Ok(current)
    }

    pub(super) fn alloc(&mut self, parent: Option<NodeId>, node: CacheNode<T>) -> NodeId {
        let id = NodeId::from(self.next_id);
        self.next_id += 1;
        self.nodes.insert(id, Slot { parent, node });
        id
    }

    /// Adds an addressable child and restores path order among siblings.
    fn attach(&mut self, parent: Option<NodeId>, child: NodeId) {
        let Some(siblings) = self.child_list_mut(parent) else {
            error!(
                "Assumption that {:?} can hold addressable children failed {}",
                parent,
                location!()
            );
            return;
        };
        let mut siblings = std::mem::take(siblings);
        siblings.push(child);
        siblings.sort_by_key(|id| self.sort_key(*id));

        if let Some(slot) = self.child_list_mut(parent) {
            *slot = siblings;
        }
    }

    /// Unlinks `id` from whichever child list of its parent holds it.
    pub(super) fn detach(&mut self, id: NodeId) {
        let Some(slot) = self.nodes.get(&id) else {
            return;
        };
        let parent = slot.parent;
        let staged = matches!(slot.node, CacheNode::Added(_));

        let list = match (staged, parent) {
            (true, Some(parent)) => self
                .nodes
                .get_mut(&parent)
                .and_then(|slot| slot.node.added_children_mut()),
            _ => self.child_list_mut(parent),
        };

        match list {
            Some(list) => list.retain(|child| *child != id),
            None => error!(
                "Assumption that {} is linked from its parent failed {}",
                id,
                location!()
            ),
        }
    }

    /// Drops `id` and all of its descendants from the arena and the index.
    pub(super) fn drop_subtree(&mut self, id: NodeId) {
        let Some(slot) = self.nodes.remove(&id) else {
            return;
        };

        if let Some(path) = slot.node.handle_path() {
            if self.index.get(path) == Some(&id) {
                self.index.remove(path);
            }
        }

        for child in slot
            .node
            .children()
            .iter()
            .chain(slot.node.added_children())
        {
            self.drop_subtree(*child);
        }
    }

    fn child_list_mut(&mut self, parent: Option<NodeId>) -> Option<&mut Vec<NodeId>> {
        match parent {
            None => Some(&mut self.root),
            Some(parent) => self
                .nodes
                .get_mut(&parent)
                .and_then(|slot| slot.node.children_mut()),
        }
    }

    fn sort_key(&self, id: NodeId) -> PathSegment {
        self.handle_path(id)
            .and_then(|path| path.last_segment().ok())
            .unwrap_or(PathSegment::MAX)
    }

    /// Checks that the index, the child lists and the parent links agree.
    #[cfg(test)]
    pub(crate) fn assert_consistent(&self) {
        for (path, id) in &self.index {
            let node = self.node(*id).expect("indexed node exists");
            assert_eq!(node.handle_path(), Some(path), "index entry {path} points at {id}");
        }

        let mut reachable = 0;
        let mut stack: Vec<(Option<NodeId>, NodeId)> =
            self.root.iter().map(|id| (None, *id)).collect();
        while let Some((parent, id)) = stack.pop() {
            reachable += 1;
            let slot = self.nodes.get(&id).expect("linked node exists");
            assert_eq!(slot.parent, parent, "parent link of {id}");

            if let Some(path) = slot.node.handle_path() {
                assert_eq!(self.index.get(path), Some(&id), "index entry for {path}");
                match parent.and_then(|parent| self.handle_path(parent)) {
                    Some(parent_path) => assert_eq!(&path.parent().unwrap(), parent_path),
                    None => assert_eq!(path.len(), 1),
                }
            }

            let keys: Vec<_> = slot.node.children().iter().map(|c| self.sort_key(*c)).collect();
            assert!(keys.windows(2).all(|w| w[0] < w[1]), "children of {id} sorted");

            stack.extend(
                slot.node
                    .children()
                    .iter()
                    .chain(slot.node.added_children())
                    .map(|child| (Some(id), *child)),
            );
        }

        let root_keys: Vec<_> = self.root.iter().map(|c| self.sort_key(*c)).collect();
        assert!(root_keys.windows(2).all(|w| w[0] < w[1]), "root children sorted");
        assert_eq!(reachable, self.nodes.len(), "every node is reachable");
    }
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(super)))]
pub enum CacheError {
    #[snafu(display("Cannot remove node at '{}': nothing is registered there", path))]
    CannotRemoveNode { path: Path },
    #[snafu(display("A handle cannot be bound to the root path"))]
    RootHandle,
    #[snafu(display("Invalid cache address"))]
    InvalidPath { source: PathError },
    #[snafu(display("No cache node with id {}", id))]
    UnknownNode { id: NodeId },
    #[snafu(display("Cannot edit {} node {}", kind, id))]
    NotEditable { id: NodeId, kind: NodeKind },
    #[snafu(display("Operation needs a handle node, {} is a {} node", id, kind))]
    NotAHandle { id: NodeId, kind: NodeKind },
    #[snafu(display("{} node {} has no address", kind, id))]
    NotAddressable { id: NodeId, kind: NodeKind },
}
