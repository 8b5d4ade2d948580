use derive_more::Display;

use crate::path::Path;
use crate::snapshot::DocumentSnapshot;

/// Wire name of a change, as it appears in a serialized batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ChangeType {
    #[display("changed")]
    Changed,
    #[display("deleted")]
    Deleted,
}

/// One mutation diffed out of the cache, addressed by the handle it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeChange<T> {
    DocumentChanged { handle_path: Path, document: T },
    ChildrenAdded {
        handle_path: Path,
        added: Vec<DocumentSnapshot<T>>,
    },
    Deleted { handle_path: Path },
}

impl<T> NodeChange<T> {
    pub fn handle_path(&self) -> &Path {
        match self {
            NodeChange::DocumentChanged { handle_path, .. }
            | NodeChange::ChildrenAdded { handle_path, .. }
            | NodeChange::Deleted { handle_path } => handle_path,
        }
    }

    pub fn change_type(&self) -> ChangeType {
        match self {
            NodeChange::DocumentChanged { .. } | NodeChange::ChildrenAdded { .. } => {
                ChangeType::Changed
            }
            NodeChange::Deleted { .. } => ChangeType::Deleted,
        }
    }
}

/// An ordered list of changes applied to storage in one call.
pub type ChangeBatch<T> = Vec<NodeChange<T>>;

