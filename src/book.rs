//! Catalogue record, loan state, and status-change commands.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{
    error::LibraryError,
    types::{BookId, Genre},
};

/// Borrower and due date of a book that is out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loan {
    /// Member holding the book.
    pub borrower: String,
    /// Date the book must be back by.
    pub due: NaiveDate,
}

/// One catalogue record.
///
/// A book is borrowed exactly when `loan` is set, so the borrower and due
/// date can never disagree with the borrowed flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    /// Title as entered.
    pub title: String,
    /// Author as entered.
    pub author: String,
    /// Genre, which selects the shelving section.
    pub genre: Genre,
    /// Present while the book is borrowed.
    pub loan: Option<Loan>,
    /// Shelf address, assigned once the book is shelved.
    pub book_id: Option<BookId>,
}

impl Book {
    /// Creates an unshelved, available book.
    pub fn new(title: impl Into<String>, author: impl Into<String>, genre: Genre) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
            genre,
            loan: None,
            book_id: None,
        }
    }

    /// True while the book is out.
    pub fn is_borrowed(&self) -> bool {
        self.loan.is_some()
    }

    /// Current borrower, if any.
    pub fn borrower_name(&self) -> Option<&str> {
        self.loan.as_ref().map(|l| l.borrower.as_str())
    }

    /// Current due date, if any.
    pub fn return_due_date(&self) -> Option<NaiveDate> {
        self.loan.as_ref().map(|l| l.due)
    }

    /// `[X]` when borrowed, `[ ]` otherwise.
    pub fn status_symbol(&self) -> &'static str {
        if self.is_borrowed() { "[X]" } else { "[ ]" }
    }

    /// True when borrowed and the due date is before `today`.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.return_due_date().is_some_and(|due| due < today)
    }

    /// Exact title and author match.
    pub fn matches(&self, title: &str, author: &str) -> bool {
        self.title == title && self.author == author
    }
}

/// Loan state transition requested on a catalogue entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusChange {
    /// Lend the book out.
    Borrow,
    /// Take the book back.
    Return,
}

impl fmt::Display for StatusChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusChange::Borrow => f.write_str("borrow"),
            StatusChange::Return => f.write_str("return"),
        }
    }
}

impl FromStr for StatusChange {
    type Err = LibraryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "borrow" => Ok(StatusChange::Borrow),
            "return" => Ok(StatusChange::Return),
            other => Err(LibraryError::InvalidArgument(format!(
                "unknown status command '{other}'; expected borrow or return"
            ))),
        }
    }
}
