//! Runtime event stream payloads.

use crate::types::BookId;

/// Monotonic count of successful mutations.
pub type Version = u64;

/// Events emitted from the single-writer runtime loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LibraryEvent {
    /// A book was added.
    BookAdded {
        /// Assigned shelf address.
        id: BookId,
    },
    /// A book was deleted.
    BookDeleted {
        /// Address it was removed from.
        id: BookId,
    },
    /// A book was borrowed or returned.
    StatusChanged {
        /// Address of the book.
        id: BookId,
        /// Loan state after the change.
        borrowed: bool,
    },
    /// Undo rolled back this many operations.
    UndoApplied {
        /// Operations rolled back.
        count: usize,
    },
    /// Storage holds the catalogue as of at least this version.
    DurableUpTo {
        /// Highest version written.
        version: Version,
    },
    /// Writing a version failed; in-memory state is kept.
    PersistFailed {
        /// Version that could not be written.
        version: Version,
        /// Storage error text.
        message: String,
    },
}
