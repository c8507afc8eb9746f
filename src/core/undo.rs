//! Undo history: recorded inverses of applied mutations.

use std::collections::VecDeque;

use crate::op::UndoRecord;

/// LIFO history of undoable mutations.
///
/// With a limit set, recording past the limit drops the oldest record, so
/// the surviving records are always the most recent contiguous run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UndoManager {
    history: VecDeque<UndoRecord>,
    limit: Option<usize>,
}

impl UndoManager {
    /// Unbounded history.
    pub fn new() -> Self {
        Self::default()
    }

    /// History that keeps at most `limit` records. `None` is unbounded.
    pub fn with_limit(limit: Option<usize>) -> Self {
        Self {
            history: VecDeque::new(),
            limit,
        }
    }

    /// Pushes a pending record.
    pub fn record(&mut self, record: UndoRecord) {
        if self.limit == Some(0) {
            return;
        }
        self.history.push_back(record);
        if let Some(limit) = self.limit {
            while self.history.len() > limit {
                self.history.pop_front();
            }
        }
    }

    /// Takes the most recent record.
    pub fn pop(&mut self) -> Option<UndoRecord> {
        self.history.pop_back()
    }

    /// Records available to undo.
    pub fn len(&self) -> usize {
        self.history.len()
    }

    /// True when there is nothing to undo.
    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        book::Book,
        op::{OpKind, UndoRecord},
        types::{BookId, Genre},
    };

    use super::*;

    fn rec(slot: usize) -> UndoRecord {
        let mut book = Book::new(format!("Book {slot}"), "Anon", Genre::Action);
        book.book_id = Some(BookId::new(Genre::Action, 0, slot));
        UndoRecord::capture(OpKind::Add, book, slot).unwrap()
    }

    #[test]
    fn pops_in_reverse_order() {
        let mut undo = UndoManager::new();
        undo.record(rec(0));
        undo.record(rec(1));
        assert_eq!(undo.pop().map(|r| r.index), Some(1));
        assert_eq!(undo.pop().map(|r| r.index), Some(0));
        assert!(undo.pop().is_none());
    }

    #[test]
    fn limit_drops_oldest() {
        let mut undo = UndoManager::with_limit(Some(2));
        for slot in 0..4 {
            undo.record(rec(slot));
        }
        assert_eq!(undo.len(), 2);
        assert_eq!(undo.pop().map(|r| r.index), Some(3));
        assert_eq!(undo.pop().map(|r| r.index), Some(2));
    }

    #[test]
    fn zero_limit_keeps_nothing() {
        let mut undo = UndoManager::with_limit(Some(0));
        undo.record(rec(0));
        assert!(undo.is_empty());
    }
}
