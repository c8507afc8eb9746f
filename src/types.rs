//! Shared primitive identifiers and the fixed genre set.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::LibraryError;

/// Zero-based shelf position within a genre.
pub type ShelfNumber = usize;
/// Zero-based slot position within a shelf.
pub type SlotNumber = usize;

/// Catalogue genre. Each genre owns its own run of shelves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Genre {
    /// Romance.
    Romance,
    /// Adventure.
    Adventure,
    /// Action.
    Action,
    /// Horror.
    Horror,
    /// Mystery.
    Mystery,
    /// Non-fiction.
    #[serde(rename = "nonfiction")]
    NonFiction,
    /// Science fiction.
    #[serde(rename = "scifi")]
    SciFi,
}

impl Genre {
    /// Number of genres.
    pub const COUNT: usize = 7;

    /// Every genre, in display order.
    pub const ALL: [Genre; Genre::COUNT] = [
        Genre::Romance,
        Genre::Adventure,
        Genre::Action,
        Genre::Horror,
        Genre::Mystery,
        Genre::NonFiction,
        Genre::SciFi,
    ];

    /// Position in [`Genre::ALL`].
    pub fn ordinal(self) -> usize {
        self as usize
    }

    /// Lowercase name accepted on the command line.
    pub fn name(self) -> &'static str {
        match self {
            Genre::Romance => "romance",
            Genre::Adventure => "adventure",
            Genre::Action => "action",
            Genre::Horror => "horror",
            Genre::Mystery => "mystery",
            Genre::NonFiction => "nonfiction",
            Genre::SciFi => "scifi",
        }
    }

    /// Book ID prefix for this genre.
    pub fn prefix(self) -> &'static str {
        match self {
            Genre::Romance => "R",
            Genre::Adventure => "AD",
            Genre::Action => "AC",
            Genre::Horror => "H",
            Genre::Mystery => "MY",
            Genre::NonFiction => "NF",
            Genre::SciFi => "SCIF",
        }
    }

    /// Reverse of [`Genre::prefix`].
    pub fn from_prefix(prefix: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|g| g.prefix() == prefix)
    }
}

impl fmt::Display for Genre {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Genre {
    type Err = LibraryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|g| g.name() == wanted)
            .ok_or_else(|| {
                LibraryError::InvalidArgument(format!(
                    "unknown genre '{}'; expected one of: romance, adventure, action, horror, mystery, nonfiction, scifi",
                    s.trim()
                ))
            })
    }
}

/// Structured shelf address, rendered as `PREFIX-SHELF-SLOT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BookId {
    /// Genre whose shelves hold the book.
    pub genre: Genre,
    /// Zero-based shelf number.
    pub shelf: ShelfNumber,
    /// Zero-based slot number.
    pub slot: SlotNumber,
}

impl BookId {
    /// Builds an ID from its parts.
    pub fn new(genre: Genre, shelf: ShelfNumber, slot: SlotNumber) -> Self {
        Self { genre, shelf, slot }
    }
}

impl fmt::Display for BookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.genre.prefix(), self.shelf, self.slot)
    }
}

impl FromStr for BookId {
    type Err = LibraryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || LibraryError::InvalidArgument(format!("malformed book ID '{s}'"));
        let mut parts = s.trim().split('-');
        let (Some(prefix), Some(shelf), Some(slot), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(malformed());
        };
        let genre = Genre::from_prefix(prefix).ok_or_else(malformed)?;
        let shelf = shelf.parse().map_err(|_| malformed())?;
        let slot = slot.parse().map_err(|_| malformed())?;
        Ok(Self { genre, shelf, slot })
    }
}

impl TryFrom<String> for BookId {
    type Error = LibraryError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<BookId> for String {
    fn from(value: BookId) -> Self {
        value.to_string()
    }
}
