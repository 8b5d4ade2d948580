//! Root-relative addresses of documents.
//!
//! A path is an ordered list of child indices, starting at the root. The same
//! addressing scheme is shared by the storage tree and the cache mirror.

mod path;

pub use path::{PATH_SEPARATOR, Path, PathError, PathSegment};
