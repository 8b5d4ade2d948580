use crate::change::ChangeBatch;
use crate::handle::DocumentHandle;
use crate::path::Path;
use crate::storage::ApplyChangesResult;

/// The storage side of the sync protocol.
///
/// [`Storage`](crate::storage::Storage) is the in-memory implementation. A
/// backend that reaches storage over I/O implements this trait and keeps its
/// queueing and retries behind it; `apply_changes` must still report every
/// affected path.
pub trait DocumentSource<T> {
    /// A handle for the live document at `path`, if there is one.
    fn query_handle(&self, path: &Path) -> Option<DocumentHandle<T>>;

    fn apply_changes(&mut self, batch: ChangeBatch<T>) -> ApplyChangesResult;
}
