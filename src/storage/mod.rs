//! The authoritative document tree.
//!
//! Children are only ever appended, so a child's index under its parent is
//! stable and doubles as its path segment. Deletion is a cascading soft
//! delete: tombstoned nodes keep their slot but disappear from queries and
//! snapshot export.

mod node;
mod source;
mod storage;

pub use node::StorageNode;
pub use source::DocumentSource;
pub use storage::{ApplyChangesResult, Storage, StorageError};
