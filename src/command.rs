//! Line command parsing and dispatch onto the [`Library`] facade.
//!
//! Parsing rejects malformed input with [`LibraryError::InvalidArgument`]
//! before anything is mutated. User-facing book indices are 1-based; shelf
//! numbers are 0-based to match book IDs.

use crate::{
    book::{Book, StatusChange},
    core::{
        catalogue::{FindCriteria, Statistics},
        library::{BookSelector, Library, ShelfListing},
    },
    error::{LibraryError, LibraryResult},
    op::UndoRecord,
    types::{Genre, ShelfNumber},
};

/// Which subset `list` shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    /// Every book.
    All,
    /// Books currently out.
    Borrowed,
    /// Books past due.
    Overdue,
    /// Members holding overdue books.
    OverdueUsers,
}

/// One parsed user command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `add TITLE / AUTHOR / GENRE`
    Add {
        /// Title.
        title: String,
        /// Author.
        author: String,
        /// Genre.
        genre: Genre,
    },
    /// `borrow INDEX / MEMBER`
    Borrow {
        /// Zero-based catalogue index.
        index: usize,
        /// Borrowing member.
        borrower: String,
    },
    /// `return INDEX`
    Return {
        /// Zero-based catalogue index.
        index: usize,
    },
    /// `delete num|bk|id / ...`
    Delete(BookSelector),
    /// `list [borrowed|overdue|users]`
    List(ListKind),
    /// `shelf GENRE / NUMBER`
    Shelf {
        /// Genre section.
        genre: Genre,
        /// Zero-based shelf number.
        number: ShelfNumber,
    },
    /// `find CRITERIA TERM`
    Find {
        /// Field to search.
        criteria: FindCriteria,
        /// Search term.
        term: String,
    },
    /// `quantity / TITLE / AUTHOR`
    Quantity {
        /// Title.
        title: String,
        /// Author.
        author: String,
    },
    /// `statistics`
    Statistics,
    /// `undo [COUNT]`
    Undo {
        /// Mutations to roll back.
        count: usize,
    },
    /// `help`
    Help,
    /// `bye`
    Exit,
}

/// Result of running a [`Command`], owned so it can cross the runtime
/// boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// A book was added.
    Added(Book),
    /// A book was deleted; carries the removed record and the new count.
    Deleted {
        /// Removed record.
        book: Book,
        /// Books left.
        remaining: usize,
    },
    /// A borrow or return succeeded.
    StatusChanged {
        /// Change applied.
        change: StatusChange,
        /// Updated record.
        book: Book,
    },
    /// Books with their zero-based catalogue index.
    Books {
        /// Heading describing the subset.
        heading: String,
        /// Matching books.
        books: Vec<(usize, Book)>,
    },
    /// Member names.
    Borrowers(Vec<String>),
    /// Shelf contents.
    Shelf(ShelfListing),
    /// Copy count for a title and author.
    Quantity {
        /// Title.
        title: String,
        /// Author.
        author: String,
        /// Copies in the catalogue.
        count: usize,
    },
    /// Aggregate counts.
    Statistics(Statistics),
    /// Records rolled back, newest first.
    Undone(Vec<UndoRecord>),
    /// Help text requested.
    Help,
    /// Session end requested.
    Exit,
}

impl Command {
    /// Parses one input line.
    pub fn parse(input: &str) -> LibraryResult<Self> {
        let input = input.trim();
        if input.is_empty() {
            return Err(invalid("Please enter a command. Type 'help' to see what I can do."));
        }
        let (word, rest) = input.split_once(' ').unwrap_or((input, ""));
        let rest = rest.trim();

        match word.to_ascii_lowercase().as_str() {
            "bye" => Ok(Command::Exit),
            "help" => Ok(Command::Help),
            "statistics" | "stats" => Ok(Command::Statistics),
            "list" => parse_list(rest),
            "add" => {
                let [title, author, genre] = split_n::<3>(rest)
                    .ok_or_else(|| invalid("Invalid format. It should be: add BOOK_TITLE / AUTHOR_NAME / GENRE"))?;
                Ok(Command::Add {
                    title: required(title, "title")?,
                    author: required(author, "author")?,
                    genre: genre.parse()?,
                })
            }
            "borrow" => {
                let [index, borrower] = split_n::<2>(rest)
                    .ok_or_else(|| invalid("Invalid format. It should be: borrow BOOK_INDEX / MEMBER_NAME"))?;
                Ok(Command::Borrow {
                    index: parse_index(index)?,
                    borrower: required(borrower, "member name")?,
                })
            }
            "return" => Ok(Command::Return {
                index: parse_index(rest)?,
            }),
            "delete" => parse_delete(rest),
            "shelf" => {
                let [genre, number] = split_n::<2>(rest)
                    .ok_or_else(|| invalid("Invalid format. It should be: shelf GENRE / SHELF_NUMBER"))?;
                Ok(Command::Shelf {
                    genre: genre.parse()?,
                    number: number
                        .parse()
                        .map_err(|_| invalid("Please provide a valid shelf number."))?,
                })
            }
            "find" => {
                let (criteria, term) = rest
                    .split_once(' ')
                    .ok_or_else(|| invalid("Invalid format. It should be: find CRITERIA TERM"))?;
                Ok(Command::Find {
                    criteria: criteria.parse()?,
                    term: required(term, "search term")?,
                })
            }
            "quantity" => {
                let [_, title, author] = split_n::<3>(rest)
                    .ok_or_else(|| invalid("Invalid format. It should be: quantity / TITLE / AUTHOR"))?;
                Ok(Command::Quantity {
                    title: required(title, "title")?,
                    author: required(author, "author")?,
                })
            }
            "undo" => {
                let count = if rest.is_empty() {
                    1
                } else {
                    rest.parse::<usize>()
                        .ok()
                        .filter(|n| *n > 0)
                        .ok_or_else(|| invalid("Please provide a positive undo count."))?
                };
                Ok(Command::Undo { count })
            }
            _ => Err(invalid(
                "I don't understand. Try starting with list, add, delete, borrow, return!",
            )),
        }
    }

    /// True for commands that change the catalogue when they succeed.
    pub fn is_mutating(&self) -> bool {
        matches!(
            self,
            Command::Add { .. }
                | Command::Borrow { .. }
                | Command::Return { .. }
                | Command::Delete(_)
                | Command::Undo { .. }
        )
    }

    /// Runs the command against `library`.
    pub fn apply(self, library: &mut Library) -> LibraryResult<Reply> {
        match self {
            Command::Add { title, author, genre } => library.add_book(&title, &author, genre).map(Reply::Added),
            Command::Borrow { index, borrower } => library
                .update_status(StatusChange::Borrow, index, Some(&borrower))
                .map(|book| Reply::StatusChanged {
                    change: StatusChange::Borrow,
                    book,
                }),
            Command::Return { index } => library
                .update_status(StatusChange::Return, index, None)
                .map(|book| Reply::StatusChanged {
                    change: StatusChange::Return,
                    book,
                }),
            Command::Delete(selector) => library.delete_book(selector).map(|book| Reply::Deleted {
                book,
                remaining: library.books().len(),
            }),
            Command::List(kind) => Ok(list(library, kind)),
            Command::Shelf { genre, number } => library.list_shelf(genre, number).map(Reply::Shelf),
            Command::Find { criteria, term } => Ok(Reply::Books {
                heading: format!("Books matching '{term}':"),
                books: owned(library.catalogue().find(criteria, &term)),
            }),
            Command::Quantity { title, author } => {
                let count = library.catalogue().quantity(&title, &author);
                Ok(Reply::Quantity { title, author, count })
            }
            Command::Statistics => Ok(Reply::Statistics(library.catalogue().statistics(library.today()))),
            Command::Undo { count } => library.undo(count).map(Reply::Undone),
            Command::Help => Ok(Reply::Help),
            Command::Exit => Ok(Reply::Exit),
        }
    }
}

fn list(library: &Library, kind: ListKind) -> Reply {
    let today = library.today();
    let catalogue = library.catalogue();
    match kind {
        ListKind::All => Reply::Books {
            heading: format!("Here are all your books ({}):", catalogue.len()),
            books: catalogue.books().iter().cloned().enumerate().collect(),
        },
        ListKind::Borrowed => Reply::Books {
            heading: "Borrowed books:".to_string(),
            books: owned(catalogue.borrowed()),
        },
        ListKind::Overdue => Reply::Books {
            heading: "Overdue books:".to_string(),
            books: owned(catalogue.overdue(today)),
        },
        ListKind::OverdueUsers => Reply::Borrowers(
            catalogue
                .overdue_borrowers(today)
                .into_iter()
                .map(str::to_string)
                .collect(),
        ),
    }
}

fn owned(books: Vec<(usize, &Book)>) -> Vec<(usize, Book)> {
    books.into_iter().map(|(i, b)| (i, b.clone())).collect()
}

fn parse_list(rest: &str) -> LibraryResult<Command> {
    let kind = match rest.to_ascii_lowercase().as_str() {
        "" => ListKind::All,
        "borrowed" => ListKind::Borrowed,
        "overdue" => ListKind::Overdue,
        "users" | "overdue users" => ListKind::OverdueUsers,
        _ => {
            return Err(invalid(
                "Invalid list command type. It should be: list, list overdue, list borrowed, list users.",
            ));
        }
    };
    Ok(Command::List(kind))
}

fn parse_delete(rest: &str) -> LibraryResult<Command> {
    const USAGE: &str = "Invalid format. It should be: delete num / INDEX, delete bk / TITLE / AUTHOR, or delete id / BOOK_ID";
    let (mode, args) = rest.split_once('/').ok_or_else(|| invalid(USAGE))?;
    let selector = match mode.trim().to_ascii_lowercase().as_str() {
        "num" => BookSelector::Index(parse_index(args)?),
        "bk" => {
            let [title, author] = split_n::<2>(args).ok_or_else(|| invalid(USAGE))?;
            BookSelector::TitleAuthor {
                title: required(title, "title")?,
                author: required(author, "author")?,
            }
        }
        "id" => BookSelector::Id(required(args, "book ID")?),
        _ => return Err(invalid(USAGE)),
    };
    Ok(Command::Delete(selector))
}

/// Splits on `/` into exactly `N` trimmed parts; the last part keeps any
/// further slashes.
fn split_n<const N: usize>(input: &str) -> Option<[&str; N]> {
    let parts: Vec<&str> = input.splitn(N, '/').map(str::trim).collect();
    parts.try_into().ok()
}

/// 1-based user index to 0-based.
fn parse_index(raw: &str) -> LibraryResult<usize> {
    raw.trim()
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .ok_or_else(|| invalid("Please provide a valid book index."))
}

fn required(raw: &str, what: &str) -> LibraryResult<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(invalid(&format!("The {what} must not be empty.")));
    }
    Ok(trimmed.to_string())
}

fn invalid(message: &str) -> LibraryError {
    LibraryError::InvalidArgument(message.to_string())
}
