//! Sparse client-side mirror of storage.
//!
//! Nodes live in an arena keyed by [`NodeId`]. Missing and handle nodes are
//! addressable and registered in a path index; added nodes are staged under a
//! handle (or another added node) and have no path until they are committed.
//! The arena, the child lists and the path index are only ever mutated
//! together, inside [`Cache`].

mod cache;
mod diff;
mod edit;
mod node;

pub use cache::{Cache, CacheError};
pub use diff::DepthFirst;
pub use node::{AddedNode, CacheNode, HandleNode, MissingNode, NodeId, NodeKind};
