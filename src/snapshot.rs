//! Plain nested values used to seed storage, export it, and carry staged
//! subtrees inside a children-added change.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentSnapshot<T> {
    pub document: T,
    pub children: Vec<DocumentSnapshot<T>>,
}

impl<T> DocumentSnapshot<T> {
    pub fn leaf(document: T) -> Self {
        Self {
            document,
            children: Vec::new(),
        }
    }

    pub fn with_children(document: T, children: Vec<DocumentSnapshot<T>>) -> Self {
        Self { document, children }
    }

    /// Number of documents in this subtree, including this one.
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(Self::count).sum::<usize>()
    }
}

/// Snapshot of a whole tree. The root carries no document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootSnapshot<T> {
    pub children: Vec<DocumentSnapshot<T>>,
}

impl<T> Default for RootSnapshot<T> {
    fn default() -> Self {
        Self {
            children: Vec::new(),
        }
    }
}

impl<T> From<Vec<DocumentSnapshot<T>>> for RootSnapshot<T> {
    fn from(children: Vec<DocumentSnapshot<T>>) -> Self {
        Self { children }
    }
}
