//! Facade keeping catalogue, shelving, and undo history in lock-step.
//!
//! Every mutation orders its steps so that a failure leaves both views
//! untouched: fallible shelf lookups run before the catalogue changes, and
//! a shelf failure after a catalogue append rolls the append back. At rest,
//! a book ID is in the catalogue exactly when its shelf slot is occupied.

use std::fmt;

use chrono::{Local, NaiveDate};
use hashbrown::HashSet;

use crate::{
    book::{Book, StatusChange},
    config::LibraryConfig,
    core::{
        catalogue::Catalogue,
        shelving::{ShelvedBook, ShelvingAllocator, Slot},
        undo::UndoManager,
    },
    error::{LibraryError, LibraryResult, Lookup},
    op::{OpKind, UndoRecord},
    types::{BookId, Genre, ShelfNumber},
};

/// Source of "today" for due-date arithmetic.
pub type Clock = Box<dyn Fn() -> NaiveDate + Send>;

fn system_clock() -> Clock {
    Box::new(|| Local::now().date_naive())
}

/// How a delete names its target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookSelector {
    /// Zero-based catalogue index.
    Index(usize),
    /// First book with this exact title and author.
    TitleAuthor {
        /// Title to match.
        title: String,
        /// Author to match.
        author: String,
    },
    /// Book ID text.
    Id(String),
}

/// One slot of a shelf listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShelfEntry {
    /// Never used.
    Empty,
    /// Previously held a deleted book.
    Placeholder,
    /// Holds a catalogued book.
    Book {
        /// Title.
        title: String,
        /// Author.
        author: String,
        /// Whether the book is currently out.
        borrowed: bool,
    },
}

/// Owned snapshot of one shelf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShelfListing {
    /// Genre of the shelf.
    pub genre: Genre,
    /// Shelf number.
    pub number: ShelfNumber,
    /// Slots in address order, with their IDs.
    pub entries: Vec<(BookId, ShelfEntry)>,
}

/// Catalogue, shelving, and undo history behind one consistent API.
pub struct Library {
    catalogue: Catalogue,
    shelves: ShelvingAllocator,
    undo: UndoManager,
    config: LibraryConfig,
    clock: Clock,
    reseated: usize,
}

impl fmt::Debug for Library {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Library")
            .field("catalogue", &self.catalogue)
            .field("shelves", &self.shelves)
            .field("undo", &self.undo)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Default for Library {
    fn default() -> Self {
        Self::new(LibraryConfig::default())
    }
}

impl Library {
    /// Empty library.
    pub fn new(config: LibraryConfig) -> Self {
        Self {
            catalogue: Catalogue::new(),
            shelves: ShelvingAllocator::new(&config),
            undo: UndoManager::with_limit(config.undo_limit),
            config,
            clock: system_clock(),
            reseated: 0,
        }
    }

    /// Starts a [`LibraryBuilder`].
    pub fn builder() -> LibraryBuilder {
        LibraryBuilder::default()
    }

    /// Assembles a library from preconstructed collaborators. The caller is
    /// responsible for `catalogue` and `shelves` agreeing.
    pub fn from_parts(
        catalogue: Catalogue,
        shelves: ShelvingAllocator,
        undo: UndoManager,
        config: LibraryConfig,
    ) -> Self {
        Self {
            catalogue,
            shelves,
            undo,
            config,
            clock: system_clock(),
            reseated: 0,
        }
    }

    /// Replaces the date source.
    pub fn set_clock(&mut self, clock: Clock) {
        self.clock = clock;
    }

    /// Today according to the configured clock.
    pub fn today(&self) -> NaiveDate {
        (self.clock)()
    }

    /// Active configuration.
    pub fn config(&self) -> &LibraryConfig {
        &self.config
    }

    /// All books in catalogue order.
    pub fn books(&self) -> &[Book] {
        self.catalogue.books()
    }

    /// Read access to the catalogue.
    pub fn catalogue(&self) -> &Catalogue {
        &self.catalogue
    }

    /// Read access to the shelving state.
    pub fn shelves(&self) -> &ShelvingAllocator {
        &self.shelves
    }

    /// Seeded books whose stored ID differed from the one assigned on load.
    pub fn reseated_on_load(&self) -> usize {
        self.reseated
    }

    /// Pending undo records.
    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    /// Catalogues and shelves a new book. Returns the stored record.
    pub fn add_book(&mut self, title: &str, author: &str, genre: Genre) -> LibraryResult<Book> {
        let title = non_blank(title, "title")?;
        let author = non_blank(author, "author")?;

        let id = self.shelves.next_free_slot(genre)?;
        let index = self.catalogue.len();
        let book = self.catalogue.add_new_book(title, author, genre, id).clone();
        if let Err(err) = self.shelves.occupy(&id, label(&book)) {
            self.catalogue.pop();
            tracing::warn!(book_id = %id, error = %err, "shelving failed; catalogue add rolled back");
            return Err(err);
        }

        tracing::debug!(book_id = %id, index, title, "book added");
        self.record(OpKind::Add, book.clone(), index);
        self.debug_check();
        Ok(book)
    }

    /// Deletes one book from the catalogue and leaves a placeholder on its
    /// shelf. Returns the removed record.
    pub fn delete_book(&mut self, selector: BookSelector) -> LibraryResult<Book> {
        let index = self.resolve(&selector)?;
        let book = self.remove_at(index)?;
        tracing::debug!(book_id = ?book.book_id, index, "book deleted");
        self.record(OpKind::Delete, book.clone(), index);
        self.debug_check();
        Ok(book)
    }

    /// Borrows or returns the book at `index`. Returns the updated record.
    pub fn update_status(
        &mut self,
        change: StatusChange,
        index: usize,
        borrower: Option<&str>,
    ) -> LibraryResult<Book> {
        let before = self
            .catalogue
            .get(index)
            .cloned()
            .ok_or(LibraryError::NotFound(Lookup::Index(index)))?;
        let today = self.today();
        let after = self
            .catalogue
            .update_status(change, index, borrower, today, self.config.loan_period_days)?
            .clone();

        tracing::debug!(book_id = ?after.book_id, index, %change, "status updated");
        let kind = match change {
            StatusChange::Borrow => OpKind::Borrow,
            StatusChange::Return => OpKind::Return,
        };
        self.record(kind, before, index);
        Ok(after)
    }

    /// Rolls back up to `count` mutations, newest first.
    ///
    /// Returns the replayed records. An empty history yields
    /// [`LibraryError::NothingToUndo`]; asking for more than exists replays
    /// what is there.
    pub fn undo(&mut self, count: usize) -> LibraryResult<Vec<UndoRecord>> {
        if count == 0 {
            return Err(LibraryError::InvalidArgument(
                "undo count must be at least 1".to_string(),
            ));
        }
        if self.undo.is_empty() {
            return Err(LibraryError::NothingToUndo);
        }

        let mut replayed = Vec::new();
        while replayed.len() < count {
            let Some(record) = self.undo.pop() else {
                break;
            };
            if let Err(err) = self.apply_inverse(&record) {
                tracing::warn!(kind = %record.kind, book_id = %record.book_id, error = %err, "undo replay failed");
                return Err(err);
            }
            tracing::info!(kind = %record.kind, book_id = %record.book_id, "undo applied");
            replayed.push(record);
        }
        self.debug_check();
        Ok(replayed)
    }

    /// Owned view of shelf `shelf_index` of `genre`, joined with the
    /// catalogue for loan status.
    pub fn list_shelf(&self, genre: Genre, shelf_index: ShelfNumber) -> LibraryResult<ShelfListing> {
        let shelf = self.shelves.list_shelf(genre, shelf_index)?;
        let entries = shelf
            .slots()
            .iter()
            .enumerate()
            .map(|(slot, content)| {
                let id = BookId::new(genre, shelf.number(), slot);
                let entry = match content {
                    Slot::Empty => ShelfEntry::Empty,
                    Slot::Placeholder => ShelfEntry::Placeholder,
                    Slot::Occupied(shelved) => ShelfEntry::Book {
                        title: shelved.title.clone(),
                        author: shelved.author.clone(),
                        borrowed: self.book_by_id(&id).is_some_and(Book::is_borrowed),
                    },
                };
                (id, entry)
            })
            .collect();
        Ok(ShelfListing {
            genre,
            number: shelf.number(),
            entries,
        })
    }

    /// Book shelved at `id`.
    pub fn book_by_id(&self, id: &BookId) -> Option<&Book> {
        self.catalogue
            .index_of_id(id)
            .and_then(|i| self.catalogue.get(i))
    }

    /// First book with this title and author.
    pub fn book_by_title_and_author(&self, title: &str, author: &str) -> Option<&Book> {
        self.catalogue
            .find_first(title, author)
            .and_then(|i| self.catalogue.get(i))
    }

    /// Index of the last-added book with this title and author.
    pub fn last_added_index(&self, title: &str, author: &str) -> Option<usize> {
        self.catalogue.find_last(title, author)
    }

    /// True when every catalogued ID has a matching occupied slot and every
    /// occupied slot is catalogued.
    pub fn is_consistent(&self) -> bool {
        let mut catalogued = HashSet::new();
        for book in self.catalogue.books() {
            let Some(id) = book.book_id else {
                return false;
            };
            let shelved = self.shelves.slot(&id).and_then(Slot::book);
            if shelved != Some(&label(book)) || !catalogued.insert(id) {
                return false;
            }
        }
        let occupied = self.shelves.occupied_ids();
        occupied.len() == catalogued.len() && occupied.iter().all(|id| catalogued.contains(id))
    }

    fn resolve(&self, selector: &BookSelector) -> LibraryResult<usize> {
        match selector {
            BookSelector::Index(index) => Ok(*index),
            BookSelector::TitleAuthor { title, author } => self
                .catalogue
                .find_first(title.trim(), author.trim())
                .ok_or_else(|| {
                    LibraryError::NotFound(Lookup::TitleAuthor {
                        title: title.clone(),
                        author: author.clone(),
                    })
                }),
            BookSelector::Id(raw) => raw
                .parse::<BookId>()
                .ok()
                .and_then(|id| self.catalogue.index_of_id(&id))
                .ok_or_else(|| LibraryError::NotFound(Lookup::Id(raw.clone()))),
        }
    }

    fn remove_at(&mut self, index: usize) -> LibraryResult<Book> {
        let book = self.catalogue.delete_book(index)?;
        match book.book_id {
            Some(id) if !self.shelves.vacate(&id) => {
                tracing::warn!(book_id = %id, "deleted book had no occupied shelf slot");
            }
            _ => {}
        }
        Ok(book)
    }

    fn apply_inverse(&mut self, record: &UndoRecord) -> LibraryResult<()> {
        let id = record.book_id;
        match record.kind {
            OpKind::Add => {
                let index = self.index_of(&id)?;
                self.remove_at(index)?;
            }
            OpKind::Delete => {
                if self.catalogue.contains(&id) {
                    return Err(LibraryError::SlotOccupied(id));
                }
                self.shelves.occupy(&id, label(&record.book))?;
                self.catalogue.insert_at(record.index, record.book.clone());
            }
            OpKind::Borrow | OpKind::Return => {
                let index = self.index_of(&id)?;
                self.catalogue.set_loan(index, record.book.loan.clone())?;
            }
        }
        Ok(())
    }

    fn index_of(&self, id: &BookId) -> LibraryResult<usize> {
        self.catalogue
            .index_of_id(id)
            .ok_or_else(|| LibraryError::NotFound(Lookup::Id(id.to_string())))
    }

    fn record(&mut self, kind: OpKind, snapshot: Book, index: usize) {
        match UndoRecord::capture(kind, snapshot, index) {
            Some(record) => self.undo.record(record),
            None => tracing::warn!(%kind, index, "unshelved book; mutation not undoable"),
        }
    }

    fn debug_check(&self) {
        debug_assert!(self.is_consistent(), "catalogue and shelves diverged");
    }
}

/// Configures and seeds a [`Library`].
#[derive(Default)]
pub struct LibraryBuilder {
    config: LibraryConfig,
    clock: Option<Clock>,
    books: Vec<Book>,
}

impl LibraryBuilder {
    /// Shelving, lending, and undo settings.
    pub fn config(mut self, config: LibraryConfig) -> Self {
        self.config = config;
        self
    }

    /// Date source for due dates and overdue checks.
    pub fn clock(mut self, clock: impl Fn() -> NaiveDate + Send + 'static) -> Self {
        self.clock = Some(Box::new(clock));
        self
    }

    /// Books loaded from storage, in catalogue order.
    pub fn seed(mut self, books: Vec<Book>) -> Self {
        self.books = books;
        self
    }

    /// Builds the library, replaying seeded books through the allocator in
    /// order. Stored IDs are replaced by the deterministic replay IDs; loan
    /// state is kept. The undo history starts empty. Stored books are never
    /// rejected, even when they need more shelves than the configured
    /// ceiling allows.
    pub fn build(self) -> LibraryResult<Library> {
        let mut library = Library::new(self.config);
        if let Some(clock) = self.clock {
            library.clock = clock;
        }
        for mut book in self.books {
            let id = library.shelves.load(book.genre, label(&book));
            if book.book_id != Some(id) {
                tracing::debug!(stored = ?book.book_id, assigned = %id, "book ID reassigned on load");
                library.reseated += 1;
            }
            book.book_id = Some(id);
            library.catalogue.push(book);
        }
        library.debug_check();
        Ok(library)
    }
}

fn label(book: &Book) -> ShelvedBook {
    ShelvedBook {
        title: book.title.clone(),
        author: book.author.clone(),
    }
}

fn non_blank<'a>(value: &'a str, field: &str) -> LibraryResult<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(LibraryError::InvalidArgument(format!("{field} must not be empty")));
    }
    Ok(trimmed)
}
