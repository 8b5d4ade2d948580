use derive_more::Display;

use crate::path::Path;

/// A document pulled from storage together with the path it lives at.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
#[display("{path}")]
pub struct DocumentHandle<T> {
    pub path: Path,
    pub document: T,
}

impl<T> DocumentHandle<T> {
    pub fn new(path: Path, document: T) -> Self {
        Self { path, document }
    }
}
