//! Domain error taxonomy shared by the catalogue, shelving, and undo layers.

use std::fmt;

use thiserror::Error;

use crate::types::{BookId, Genre, ShelfNumber};

/// What a failed lookup was searching for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    /// Zero-based catalogue index.
    Index(usize),
    /// Book ID text as supplied by the caller.
    Id(String),
    /// Exact title and author pair.
    TitleAuthor {
        /// Title searched for.
        title: String,
        /// Author searched for.
        author: String,
    },
}

impl fmt::Display for Lookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lookup::Index(index) => write!(f, "no book at position {}", index + 1),
            Lookup::Id(id) => write!(f, "no book with ID {id}"),
            Lookup::TitleAuthor { title, author } => write!(f, "no book titled \"{title}\" by {author}"),
        }
    }
}

/// Every failure the library can report. None of them is fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LibraryError {
    /// Index, ID, or title+author lookup miss.
    #[error("Book not found! ({0})")]
    NotFound(Lookup),
    /// Shelf-count ceiling reached for a genre.
    #[error("the {genre} section is full ({max_shelves} shelves)")]
    SectionFull {
        /// Genre that ran out of shelves.
        genre: Genre,
        /// Configured shelf ceiling.
        max_shelves: usize,
    },
    /// Malformed command arguments.
    #[error("{0}")]
    InvalidArgument(String),
    /// Borrow requested on a book that is already out.
    #[error("\"{0}\" is already borrowed")]
    AlreadyBorrowed(String),
    /// Return requested on a book that is on the shelf.
    #[error("\"{0}\" is not currently borrowed")]
    NotBorrowed(String),
    /// Shelf listing requested past the allocated shelves.
    #[error("the {genre} section has only {available} shelves; shelf {requested} does not exist")]
    ShelfOutOfRange {
        /// Genre listed.
        genre: Genre,
        /// Shelf number requested.
        requested: ShelfNumber,
        /// Shelves currently allocated.
        available: usize,
    },
    /// A slot that must be free already holds a book.
    #[error("shelf slot {0} is already occupied")]
    SlotOccupied(BookId),
    /// Undo requested with an empty history.
    #[error("Nothing to undo.")]
    NothingToUndo,
}

impl LibraryError {
    /// True for outcomes reported as information rather than failure.
    pub fn is_informational(&self) -> bool {
        matches!(self, LibraryError::NothingToUndo)
    }
}

/// Result alias for library operations.
pub type LibraryResult<T> = Result<T, LibraryError>;
