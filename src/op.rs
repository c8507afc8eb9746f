//! Undo record model: the captured inverse of one mutation.

use std::fmt;

use crate::{book::Book, types::BookId};

/// Mutation kinds that can be rolled back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpKind {
    /// A book was added.
    Add,
    /// A book was deleted.
    Delete,
    /// A book was borrowed.
    Borrow,
    /// A book was returned.
    Return,
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OpKind::Add => "add",
            OpKind::Delete => "delete",
            OpKind::Borrow => "borrow",
            OpKind::Return => "return",
        };
        f.write_str(name)
    }
}

/// Enough state to reverse exactly one prior mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UndoRecord {
    /// Forward operation that was applied.
    pub kind: OpKind,
    /// Book as it was before the forward operation. For adds this is the
    /// freshly created record.
    pub book: Book,
    /// Catalogue position of the book when the operation ran.
    pub index: usize,
    /// Shelf address of the book when the operation ran.
    pub book_id: BookId,
}

impl UndoRecord {
    /// Builds a record, taking the ID from the snapshot.
    ///
    /// Returns `None` for an unshelved snapshot, which cannot be rolled back
    /// consistently.
    pub fn capture(kind: OpKind, book: Book, index: usize) -> Option<Self> {
        let book_id = book.book_id?;
        Some(Self {
            kind,
            book,
            index,
            book_id,
        })
    }
}
