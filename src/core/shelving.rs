//! Fixed-capacity genre shelving and book ID allocation.
//!
//! Every genre owns a [`GenreShelves`] run that grows one [`Shelf`] at a
//! time. A slot keeps its address for as long as it is occupied; deleting a
//! book leaves a [`Slot::Placeholder`] behind instead of compacting, so the
//! IDs of neighbouring books never move.

use crate::{
    config::LibraryConfig,
    error::{LibraryError, LibraryResult},
    types::{BookId, Genre, ShelfNumber, SlotNumber},
};

/// Label shown for a shelved book.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShelvedBook {
    /// Title of the shelved book.
    pub title: String,
    /// Author of the shelved book.
    pub author: String,
}

/// Content of one shelf position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Slot {
    /// Never assigned since the shelf was built.
    Empty,
    /// A book sits here.
    Occupied(ShelvedBook),
    /// A book was deleted from here. Free for reuse.
    Placeholder,
}

impl Slot {
    /// True when a new book may be placed here.
    pub fn is_free(&self) -> bool {
        !matches!(self, Slot::Occupied(_))
    }

    /// The shelved book, if any.
    pub fn book(&self) -> Option<&ShelvedBook> {
        match self {
            Slot::Occupied(book) => Some(book),
            _ => None,
        }
    }
}

/// Fixed-size row of slots for one genre and shelf number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shelf {
    number: ShelfNumber,
    slots: Vec<Slot>,
}

impl Shelf {
    /// Builds a shelf of `capacity` empty slots.
    pub fn new(number: ShelfNumber, capacity: usize) -> Self {
        Self {
            number,
            slots: vec![Slot::Empty; capacity],
        }
    }

    /// Shelf number within its genre.
    pub fn number(&self) -> ShelfNumber {
        self.number
    }

    /// Slot count, fixed at construction.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// All slots in address order.
    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    /// Slot at `slot`, if it exists.
    pub fn slot(&self, slot: SlotNumber) -> Option<&Slot> {
        self.slots.get(slot)
    }

    /// Lowest free slot.
    pub fn first_free(&self) -> Option<SlotNumber> {
        self.slots.iter().position(Slot::is_free)
    }

    /// Number of occupied slots.
    pub fn occupied(&self) -> usize {
        self.slots.iter().filter(|s| !s.is_free()).count()
    }

    fn put(&mut self, slot: SlotNumber, book: ShelvedBook) -> bool {
        match self.slots.get_mut(slot) {
            Some(target) if target.is_free() => {
                *target = Slot::Occupied(book);
                true
            }
            _ => false,
        }
    }

    fn clear(&mut self, slot: SlotNumber) -> bool {
        match self.slots.get_mut(slot) {
            Some(target) if matches!(target, Slot::Occupied(_)) => {
                *target = Slot::Placeholder;
                true
            }
            _ => false,
        }
    }
}

/// Growable run of shelves for a single genre.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenreShelves {
    genre: Genre,
    capacity: usize,
    max_shelves: Option<usize>,
    shelves: Vec<Shelf>,
}

impl GenreShelves {
    /// Empty run; shelves are allocated on first use.
    pub fn new(genre: Genre, capacity: usize, max_shelves: Option<usize>) -> Self {
        Self {
            genre,
            capacity: capacity.max(1),
            max_shelves,
            shelves: Vec::new(),
        }
    }

    /// Shelves allocated so far.
    pub fn shelves(&self) -> &[Shelf] {
        &self.shelves
    }

    /// Slots per shelf.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// First free address: earliest shelf, then earliest slot. Points one
    /// past the last shelf when every allocated shelf is full.
    pub fn next_free_slot(&self) -> LibraryResult<BookId> {
        let id = self.first_free_or_new();
        if id.shelf == self.shelves.len() {
            self.check_ceiling(id.shelf)?;
        }
        Ok(id)
    }

    /// Shelves a stored book at the first free address, opening shelves past
    /// the ceiling if the stored catalogue needs them.
    pub fn load(&mut self, book: ShelvedBook) -> BookId {
        let id = self.first_free_or_new();
        if id.shelf == self.shelves.len() && self.check_ceiling(id.shelf).is_err() {
            tracing::warn!(genre = %self.genre, shelf = id.shelf, "stored catalogue exceeds shelf ceiling");
        }
        self.grow_to(id.shelf);
        self.shelves[id.shelf].put(id.slot, book);
        id
    }

    fn first_free_or_new(&self) -> BookId {
        for shelf in &self.shelves {
            if let Some(slot) = shelf.first_free() {
                return BookId::new(self.genre, shelf.number(), slot);
            }
        }
        BookId::new(self.genre, self.shelves.len(), 0)
    }

    fn grow_to(&mut self, shelf: ShelfNumber) {
        while self.shelves.len() <= shelf {
            let number = self.shelves.len();
            self.shelves.push(Shelf::new(number, self.capacity));
        }
    }

    /// Places `book` at `shelf`/`slot`, allocating shelves up to `shelf`.
    /// The ceiling applies only to shelves not yet allocated.
    pub fn occupy(&mut self, shelf: ShelfNumber, slot: SlotNumber, book: ShelvedBook) -> LibraryResult<()> {
        let id = BookId::new(self.genre, shelf, slot);
        if slot >= self.capacity {
            return Err(LibraryError::InvalidArgument(format!(
                "slot {slot} exceeds the {} section capacity of {}",
                self.genre, self.capacity
            )));
        }
        if shelf >= self.shelves.len() {
            self.check_ceiling(shelf)?;
        }
        self.grow_to(shelf);
        if self.shelves[shelf].put(slot, book) {
            Ok(())
        } else {
            Err(LibraryError::SlotOccupied(id))
        }
    }

    fn check_ceiling(&self, shelf: ShelfNumber) -> LibraryResult<()> {
        match self.max_shelves {
            Some(max_shelves) if shelf >= max_shelves => Err(LibraryError::SectionFull {
                genre: self.genre,
                max_shelves,
            }),
            _ => Ok(()),
        }
    }

    /// Replaces an occupied slot with a placeholder. False when there was
    /// nothing to clear.
    pub fn vacate(&mut self, shelf: ShelfNumber, slot: SlotNumber) -> bool {
        self.shelves
            .get_mut(shelf)
            .is_some_and(|s| s.clear(slot))
    }
}

/// Routes shelving requests to the right genre and owns the ID space.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShelvingAllocator {
    sections: [GenreShelves; Genre::COUNT],
}

impl Default for ShelvingAllocator {
    fn default() -> Self {
        Self::new(&LibraryConfig::default())
    }
}

impl ShelvingAllocator {
    /// One empty section per genre, sized from `config`.
    pub fn new(config: &LibraryConfig) -> Self {
        let sections = Genre::ALL.map(|genre| {
            GenreShelves::new(genre, config.capacity_for(genre), config.max_shelves_per_genre)
        });
        Self { sections }
    }

    /// Shelves `title`/`author` in the first free slot for `genre`.
    pub fn add_book(&mut self, title: &str, author: &str, genre: Genre) -> LibraryResult<BookId> {
        let id = self.next_free_slot(genre)?;
        self.occupy(
            &id,
            ShelvedBook {
                title: title.to_string(),
                author: author.to_string(),
            },
        )?;
        Ok(id)
    }

    /// Address the next add to `genre` would receive. Mutates nothing.
    pub fn next_free_slot(&self, genre: Genre) -> LibraryResult<BookId> {
        self.section(genre).next_free_slot()
    }

    /// Replays a stored book into `genre`, ignoring the shelf ceiling.
    pub fn load(&mut self, genre: Genre, book: ShelvedBook) -> BookId {
        self.section_mut(genre).load(book)
    }

    /// Places a book at exactly `id`. Used for fresh adds and for restoring
    /// a deleted book to its original address.
    pub fn occupy(&mut self, id: &BookId, book: ShelvedBook) -> LibraryResult<()> {
        self.section_mut(id.genre).occupy(id.shelf, id.slot, book)
    }

    /// Removes the book named by the textual `book_id`.
    ///
    /// A malformed ID, a missing shelf or slot, or a slot that holds no book
    /// is a silent no-op. Callers that need to know must validate first or
    /// use [`ShelvingAllocator::vacate`].
    pub fn delete_book(&mut self, book_id: &str) {
        if let Ok(id) = book_id.parse::<BookId>() {
            self.vacate(&id);
        }
    }

    /// Typed removal. Returns whether a book was actually cleared.
    pub fn vacate(&mut self, id: &BookId) -> bool {
        self.section_mut(id.genre).vacate(id.shelf, id.slot)
    }

    /// Shelf `shelf_index` of `genre` for listing.
    pub fn list_shelf(&self, genre: Genre, shelf_index: ShelfNumber) -> LibraryResult<&Shelf> {
        let section = self.section(genre);
        section
            .shelves()
            .get(shelf_index)
            .ok_or(LibraryError::ShelfOutOfRange {
                genre,
                requested: shelf_index,
                available: section.shelves().len(),
            })
    }

    /// Slot addressed by `id`, if allocated.
    pub fn slot(&self, id: &BookId) -> Option<&Slot> {
        self.section(id.genre)
            .shelves()
            .get(id.shelf)
            .and_then(|s| s.slot(id.slot))
    }

    /// Shelves allocated for `genre`.
    pub fn shelf_count(&self, genre: Genre) -> usize {
        self.section(genre).shelves().len()
    }

    /// Every occupied address, genre by genre in [`Genre::ALL`] order.
    pub fn occupied_ids(&self) -> Vec<BookId> {
        let mut out = Vec::new();
        for genre in Genre::ALL {
            for shelf in self.section(genre).shelves() {
                for (slot, content) in shelf.slots().iter().enumerate() {
                    if !content.is_free() {
                        out.push(BookId::new(genre, shelf.number(), slot));
                    }
                }
            }
        }
        out
    }

    /// Section for `genre`.
    pub fn section(&self, genre: Genre) -> &GenreShelves {
        &self.sections[genre.ordinal()]
    }

    fn section_mut(&mut self, genre: Genre) -> &mut GenreShelves {
        &mut self.sections[genre.ordinal()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn label(title: &str) -> ShelvedBook {
        ShelvedBook {
            title: title.to_string(),
            author: "Anon".to_string(),
        }
    }

    #[test]
    fn first_free_slot_prefers_earliest_shelf_then_slot() {
        let mut section = GenreShelves::new(Genre::Horror, 2, None);
        section.occupy(0, 0, label("a")).unwrap();
        section.occupy(0, 1, label("b")).unwrap();
        section.occupy(1, 0, label("c")).unwrap();
        assert_eq!(section.next_free_slot().unwrap(), BookId::new(Genre::Horror, 1, 1));

        assert!(section.vacate(0, 1));
        assert_eq!(section.next_free_slot().unwrap(), BookId::new(Genre::Horror, 0, 1));
    }

    #[test]
    fn vacated_slot_becomes_placeholder_not_empty() {
        let mut section = GenreShelves::new(Genre::Mystery, 3, None);
        section.occupy(0, 0, label("a")).unwrap();
        section.occupy(0, 1, label("b")).unwrap();
        assert!(section.vacate(0, 0));

        let shelf = &section.shelves()[0];
        assert_eq!(shelf.slot(0), Some(&Slot::Placeholder));
        assert_eq!(shelf.slot(1), Some(&Slot::Occupied(label("b"))));
        assert_eq!(shelf.slot(2), Some(&Slot::Empty));
        assert_eq!(shelf.capacity(), 3);
    }

    #[test]
    fn vacate_twice_is_a_no_op() {
        let mut section = GenreShelves::new(Genre::Mystery, 1, None);
        section.occupy(0, 0, label("a")).unwrap();
        assert!(section.vacate(0, 0));
        assert!(!section.vacate(0, 0));
        assert!(!section.vacate(4, 0));
    }

    #[test]
    fn occupied_slot_rejects_second_book() {
        let mut section = GenreShelves::new(Genre::Action, 2, None);
        section.occupy(0, 0, label("a")).unwrap();
        assert_eq!(
            section.occupy(0, 0, label("b")),
            Err(LibraryError::SlotOccupied(BookId::new(Genre::Action, 0, 0)))
        );
    }

    #[test]
    fn shelf_ceiling_reports_section_full() {
        let mut section = GenreShelves::new(Genre::Romance, 1, Some(2));
        section.occupy(0, 0, label("a")).unwrap();
        section.occupy(1, 0, label("b")).unwrap();
        assert_eq!(
            section.next_free_slot(),
            Err(LibraryError::SectionFull {
                genre: Genre::Romance,
                max_shelves: 2
            })
        );
    }

    #[test]
    fn loading_past_ceiling_opens_extra_shelves() {
        let mut section = GenreShelves::new(Genre::Romance, 1, Some(1));
        assert_eq!(section.load(label("a")), BookId::new(Genre::Romance, 0, 0));
        assert_eq!(section.load(label("b")), BookId::new(Genre::Romance, 1, 0));
        assert_eq!(section.shelves().len(), 2);

        // Freed slots on the extra shelf can be reused and restored.
        assert!(section.vacate(1, 0));
        assert_eq!(section.next_free_slot().unwrap(), BookId::new(Genre::Romance, 1, 0));
        section.occupy(1, 0, label("b")).unwrap();
        assert!(matches!(section.next_free_slot(), Err(LibraryError::SectionFull { .. })));
    }

    #[test]
    fn malformed_delete_is_silent() {
        let mut shelves = ShelvingAllocator::default();
        let id = shelves.add_book("Dune", "Herbert", Genre::SciFi).unwrap();
        let before = shelves.clone();

        shelves.delete_book("not-an-id");
        shelves.delete_book("SCIF-9-9");
        shelves.delete_book("SCIF-0-4");
        assert_eq!(shelves, before);

        shelves.delete_book(&id.to_string());
        assert_eq!(shelves.slot(&id), Some(&Slot::Placeholder));
    }

    #[test]
    fn list_shelf_past_allocation_is_out_of_range() {
        let mut shelves = ShelvingAllocator::default();
        shelves.add_book("Emma", "Austen", Genre::Romance).unwrap();
        assert!(shelves.list_shelf(Genre::Romance, 0).is_ok());
        assert_eq!(
            shelves.list_shelf(Genre::Romance, 1).unwrap_err(),
            LibraryError::ShelfOutOfRange {
                genre: Genre::Romance,
                requested: 1,
                available: 1
            }
        );
    }
}
