//! Ordered book list: the system of record.

use std::str::FromStr;

use chrono::{Days, NaiveDate};
use hashbrown::{HashMap, HashSet};

use crate::{
    book::{Book, Loan, StatusChange},
    error::{LibraryError, LibraryResult, Lookup},
    types::{BookId, Genre},
};

/// Field matched by [`Catalogue::find`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FindCriteria {
    /// Title substring.
    Title,
    /// Author substring.
    Author,
    /// Exact genre name.
    Genre,
    /// Book ID substring.
    Id,
}

impl FromStr for FindCriteria {
    type Err = LibraryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "title" => Ok(FindCriteria::Title),
            "author" => Ok(FindCriteria::Author),
            "genre" => Ok(FindCriteria::Genre),
            "id" => Ok(FindCriteria::Id),
            other => Err(LibraryError::InvalidArgument(format!(
                "unknown search criteria '{other}'; expected title, author, genre or id"
            ))),
        }
    }
}

/// Aggregate counts over the catalogue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statistics {
    /// Books in the catalogue.
    pub total: usize,
    /// Books currently out.
    pub borrowed: usize,
    /// Books past their due date.
    pub overdue: usize,
    /// Book count per genre, in [`Genre::ALL`] order.
    pub per_genre: Vec<(Genre, usize)>,
}

impl Statistics {
    /// Books on the shelf.
    pub fn available(&self) -> usize {
        self.total - self.borrowed
    }
}

/// Catalogue of books in insertion order.
///
/// Indices shift on delete; callers must re-resolve positions after any
/// removal. IDs are never generated here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalogue {
    books: Vec<Book>,
}

impl Catalogue {
    /// Empty catalogue.
    pub fn new() -> Self {
        Self::default()
    }

    /// All books, in catalogue order.
    pub fn books(&self) -> &[Book] {
        &self.books
    }

    /// Number of books.
    pub fn len(&self) -> usize {
        self.books.len()
    }

    /// True when empty.
    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }

    /// Appends an available book carrying an allocator-issued ID.
    pub fn add_new_book(&mut self, title: &str, author: &str, genre: Genre, book_id: BookId) -> &Book {
        let mut book = Book::new(title, author, genre);
        book.book_id = Some(book_id);
        self.push(book)
    }

    /// Appends an existing record as-is.
    pub fn push(&mut self, book: Book) -> &Book {
        self.books.push(book);
        let last = self.books.len() - 1;
        &self.books[last]
    }

    /// Removes the book at `index`, shifting later books down.
    pub fn delete_book(&mut self, index: usize) -> LibraryResult<Book> {
        if index >= self.books.len() {
            return Err(LibraryError::NotFound(Lookup::Index(index)));
        }
        Ok(self.books.remove(index))
    }

    /// Drops the most recently appended book.
    pub fn pop(&mut self) -> Option<Book> {
        self.books.pop()
    }

    /// Inserts `book` at `index`, clamped to the end. Returns the index used.
    pub fn insert_at(&mut self, index: usize, book: Book) -> usize {
        let index = index.min(self.books.len());
        self.books.insert(index, book);
        index
    }

    /// Applies a borrow or return to the book at `index`.
    ///
    /// Borrow needs a borrower name and sets the due date to `today` plus
    /// `loan_days`. A rejected change leaves the book untouched.
    pub fn update_status(
        &mut self,
        change: StatusChange,
        index: usize,
        borrower: Option<&str>,
        today: NaiveDate,
        loan_days: u32,
    ) -> LibraryResult<&Book> {
        let book = self
            .books
            .get_mut(index)
            .ok_or(LibraryError::NotFound(Lookup::Index(index)))?;
        match change {
            StatusChange::Borrow => {
                if book.is_borrowed() {
                    return Err(LibraryError::AlreadyBorrowed(book.title.clone()));
                }
                let borrower = borrower
                    .map(str::trim)
                    .filter(|name| !name.is_empty())
                    .ok_or_else(|| {
                        LibraryError::InvalidArgument("a borrower name is required to borrow".to_string())
                    })?;
                let due = today
                    .checked_add_days(Days::new(u64::from(loan_days)))
                    .ok_or_else(|| LibraryError::InvalidArgument("loan period overflows the calendar".to_string()))?;
                book.loan = Some(Loan {
                    borrower: borrower.to_string(),
                    due,
                });
            }
            StatusChange::Return => {
                if !book.is_borrowed() {
                    return Err(LibraryError::NotBorrowed(book.title.clone()));
                }
                book.loan = None;
            }
        }
        Ok(book)
    }

    /// Overwrites the loan state of the book at `index`. Used by undo to
    /// reinstate an exact borrower and due date.
    pub fn set_loan(&mut self, index: usize, loan: Option<Loan>) -> LibraryResult<&Book> {
        let book = self
            .books
            .get_mut(index)
            .ok_or(LibraryError::NotFound(Lookup::Index(index)))?;
        book.loan = loan;
        Ok(book)
    }

    /// Book at `index`.
    pub fn get(&self, index: usize) -> Option<&Book> {
        self.books.get(index)
    }

    /// Position of the book shelved at `id`.
    pub fn index_of_id(&self, id: &BookId) -> Option<usize> {
        self.books.iter().position(|b| b.book_id.as_ref() == Some(id))
    }

    /// True when some catalogue entry carries `id`.
    pub fn contains(&self, id: &BookId) -> bool {
        self.index_of_id(id).is_some()
    }

    /// First book matching `title` and `author`.
    pub fn find_first(&self, title: &str, author: &str) -> Option<usize> {
        self.books.iter().position(|b| b.matches(title, author))
    }

    /// Last-added book matching `title` and `author`.
    pub fn find_last(&self, title: &str, author: &str) -> Option<usize> {
        self.books.iter().rposition(|b| b.matches(title, author))
    }

    /// Copies of `title` by `author`.
    pub fn quantity(&self, title: &str, author: &str) -> usize {
        self.books.iter().filter(|b| b.matches(title, author)).count()
    }

    /// Books currently out, with their catalogue index.
    pub fn borrowed(&self) -> Vec<(usize, &Book)> {
        self.books
            .iter()
            .enumerate()
            .filter(|(_, b)| b.is_borrowed())
            .collect()
    }

    /// Books past due on `today`, with their catalogue index.
    pub fn overdue(&self, today: NaiveDate) -> Vec<(usize, &Book)> {
        self.books
            .iter()
            .enumerate()
            .filter(|(_, b)| b.is_overdue(today))
            .collect()
    }

    /// Distinct borrowers holding an overdue book, in catalogue order.
    pub fn overdue_borrowers(&self, today: NaiveDate) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.books
            .iter()
            .filter(|b| b.is_overdue(today))
            .filter_map(Book::borrower_name)
            .filter(|name| seen.insert(*name))
            .collect()
    }

    /// Case-insensitive search on one field.
    pub fn find(&self, criteria: FindCriteria, term: &str) -> Vec<(usize, &Book)> {
        let needle = term.trim().to_lowercase();
        self.books
            .iter()
            .enumerate()
            .filter(|(_, b)| match criteria {
                FindCriteria::Title => b.title.to_lowercase().contains(&needle),
                FindCriteria::Author => b.author.to_lowercase().contains(&needle),
                FindCriteria::Genre => b.genre.name() == needle,
                FindCriteria::Id => b
                    .book_id
                    .is_some_and(|id| id.to_string().to_lowercase().contains(&needle)),
            })
            .collect()
    }

    /// Counts for the statistics view.
    pub fn statistics(&self, today: NaiveDate) -> Statistics {
        let mut per_genre: HashMap<Genre, usize> = HashMap::new();
        for book in &self.books {
            *per_genre.entry(book.genre).or_default() += 1;
        }
        Statistics {
            total: self.books.len(),
            borrowed: self.books.iter().filter(|b| b.is_borrowed()).count(),
            overdue: self.books.iter().filter(|b| b.is_overdue(today)).count(),
            per_genre: Genre::ALL
                .into_iter()
                .map(|g| (g, per_genre.get(&g).copied().unwrap_or(0)))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn seeded() -> Catalogue {
        let mut cat = Catalogue::new();
        cat.add_new_book("Dune", "Herbert", Genre::SciFi, BookId::new(Genre::SciFi, 0, 0));
        cat.add_new_book("Emma", "Austen", Genre::Romance, BookId::new(Genre::Romance, 0, 0));
        cat.add_new_book("Dune", "Herbert", Genre::SciFi, BookId::new(Genre::SciFi, 0, 1));
        cat
    }

    #[test]
    fn borrow_sets_loan_with_due_date() {
        let mut cat = seeded();
        let book = cat
            .update_status(StatusChange::Borrow, 1, Some("Alice"), day(2025, 5, 1), 14)
            .unwrap();
        assert_eq!(book.borrower_name(), Some("Alice"));
        assert_eq!(book.return_due_date(), Some(day(2025, 5, 15)));
    }

    #[test]
    fn double_borrow_and_idle_return_leave_state_unchanged() {
        let mut cat = seeded();
        cat.update_status(StatusChange::Borrow, 0, Some("Alice"), day(2025, 5, 1), 14)
            .unwrap();
        let before = cat.clone();

        let err = cat
            .update_status(StatusChange::Borrow, 0, Some("Bob"), day(2025, 5, 2), 14)
            .unwrap_err();
        assert_eq!(err, LibraryError::AlreadyBorrowed("Dune".to_string()));
        let err = cat
            .update_status(StatusChange::Return, 1, None, day(2025, 5, 2), 14)
            .unwrap_err();
        assert_eq!(err, LibraryError::NotBorrowed("Emma".to_string()));
        assert_eq!(cat, before);
    }

    #[test]
    fn borrow_without_name_is_invalid() {
        let mut cat = seeded();
        let err = cat
            .update_status(StatusChange::Borrow, 0, Some("  "), day(2025, 5, 1), 14)
            .unwrap_err();
        assert!(matches!(err, LibraryError::InvalidArgument(_)));
        assert!(!cat.books()[0].is_borrowed());
    }

    #[test]
    fn delete_out_of_bounds_is_not_found() {
        let mut cat = seeded();
        assert_eq!(
            cat.delete_book(3).unwrap_err(),
            LibraryError::NotFound(Lookup::Index(3))
        );
        assert_eq!(cat.len(), 3);
    }

    #[test]
    fn title_author_lookup_first_and_last() {
        let cat = seeded();
        assert_eq!(cat.find_first("Dune", "Herbert"), Some(0));
        assert_eq!(cat.find_last("Dune", "Herbert"), Some(2));
        assert_eq!(cat.quantity("Dune", "Herbert"), 2);
        assert_eq!(cat.find_first("Dune", "Nobody"), None);
    }

    #[test]
    fn overdue_queries_use_due_date() {
        let mut cat = seeded();
        cat.update_status(StatusChange::Borrow, 0, Some("Alice"), day(2025, 1, 1), 14)
            .unwrap();
        cat.update_status(StatusChange::Borrow, 2, Some("Alice"), day(2025, 1, 1), 14)
            .unwrap();
        cat.update_status(StatusChange::Borrow, 1, Some("Bob"), day(2025, 3, 1), 14)
            .unwrap();

        let today = day(2025, 2, 1);
        assert_eq!(cat.overdue(today).len(), 2);
        assert_eq!(cat.overdue_borrowers(today), vec!["Alice"]);

        let stats = cat.statistics(today);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.borrowed, 3);
        assert_eq!(stats.available(), 0);
        assert_eq!(stats.overdue, 2);
        assert!(stats.per_genre.contains(&(Genre::SciFi, 2)));
    }

    #[test]
    fn find_matches_case_insensitively() {
        let cat = seeded();
        assert_eq!(cat.find(FindCriteria::Title, "dun").len(), 2);
        assert_eq!(cat.find(FindCriteria::Genre, "Romance").len(), 1);
        assert_eq!(cat.find(FindCriteria::Id, "scif-0-1").len(), 1);
    }
}
