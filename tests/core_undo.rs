use chrono::NaiveDate;

use lebook::{
    book::StatusChange,
    config::LibraryConfig,
    core::library::{BookSelector, Library},
    error::LibraryError,
    op::OpKind,
    types::Genre,
};

fn fixed_day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 1).unwrap()
}

fn library() -> Library {
    Library::builder().clock(fixed_day).build().unwrap()
}

#[test]
fn undo_add_removes_the_book_and_frees_its_slot() {
    let mut library = library();
    library.add_book("Dune", "Herbert", Genre::SciFi).unwrap();

    let undone = library.undo(1).unwrap();
    assert_eq!(undone.len(), 1);
    assert_eq!(undone[0].kind, OpKind::Add);
    assert!(library.books().is_empty());
    assert!(library.shelves().occupied_ids().is_empty());
    assert!(library.is_consistent());
}

#[test]
fn undo_delete_restores_same_id_and_position() {
    let mut library = library();
    library.add_book("A", "X", Genre::Horror).unwrap();
    let middle = library.add_book("B", "X", Genre::Horror).unwrap();
    library.add_book("C", "X", Genre::Horror).unwrap();
    let before = library.books().to_vec();

    library
        .delete_book(BookSelector::TitleAuthor {
            title: "B".to_string(),
            author: "X".to_string(),
        })
        .unwrap();
    assert_eq!(library.books().len(), 2);

    library.undo(1).unwrap();
    assert_eq!(library.books(), before.as_slice());
    assert_eq!(library.books()[1].book_id, middle.book_id);
    assert!(library.is_consistent());
}

#[test]
fn undo_borrow_and_return_restore_loan_exactly() {
    let mut library = library();
    library.add_book("Emma", "Austen", Genre::Romance).unwrap();

    let borrowed = library
        .update_status(StatusChange::Borrow, 0, Some("Alice"))
        .unwrap();
    assert_eq!(borrowed.borrower_name(), Some("Alice"));
    assert_eq!(
        borrowed.return_due_date(),
        NaiveDate::from_ymd_opt(2025, 3, 15)
    );

    library.update_status(StatusChange::Return, 0, None).unwrap();
    assert!(!library.books()[0].is_borrowed());

    library.undo(1).unwrap();
    assert_eq!(library.books()[0], borrowed);

    library.undo(1).unwrap();
    assert!(!library.books()[0].is_borrowed());
    assert_eq!(library.books()[0].loan, None);
}

#[test]
fn rejected_status_changes_are_not_recorded() {
    let mut library = library();
    library.add_book("Emma", "Austen", Genre::Romance).unwrap();

    assert!(matches!(
        library.update_status(StatusChange::Return, 0, None),
        Err(LibraryError::NotBorrowed(_))
    ));
    library.update_status(StatusChange::Borrow, 0, Some("Bob")).unwrap();
    assert!(matches!(
        library.update_status(StatusChange::Borrow, 0, Some("Carol")),
        Err(LibraryError::AlreadyBorrowed(_))
    ));
    assert!(matches!(
        library.update_status(StatusChange::Borrow, 7, Some("Carol")),
        Err(LibraryError::NotFound(_))
    ));
    assert_eq!(library.undo_len(), 2);
}

#[test]
fn multi_step_undo_runs_newest_first() {
    let mut library = library();
    library.add_book("A", "X", Genre::Action).unwrap();
    library.add_book("B", "X", Genre::Action).unwrap();
    library.update_status(StatusChange::Borrow, 1, Some("Dan")).unwrap();
    library.delete_book(BookSelector::Index(0)).unwrap();

    let undone = library.undo(3).unwrap();
    let kinds: Vec<_> = undone.iter().map(|r| r.kind).collect();
    assert_eq!(kinds, vec![OpKind::Delete, OpKind::Borrow, OpKind::Add]);

    assert_eq!(library.books().len(), 1);
    assert_eq!(library.books()[0].title, "A");
    assert!(!library.books()[0].is_borrowed());
    assert_eq!(library.undo_len(), 1);
    assert!(library.is_consistent());
}

#[test]
fn undo_more_than_history_replays_everything() {
    let mut library = library();
    library.add_book("A", "X", Genre::Mystery).unwrap();
    library.add_book("B", "X", Genre::Mystery).unwrap();

    let undone = library.undo(10).unwrap();
    assert_eq!(undone.len(), 2);
    assert!(library.books().is_empty());
    assert_eq!(library.undo(1), Err(LibraryError::NothingToUndo));
}

#[test]
fn undo_with_empty_history_or_zero_count_fails() {
    let mut library = library();
    assert_eq!(library.undo(1), Err(LibraryError::NothingToUndo));

    library.add_book("A", "X", Genre::Mystery).unwrap();
    assert!(matches!(library.undo(0), Err(LibraryError::InvalidArgument(_))));
    assert_eq!(library.books().len(), 1);
}

#[test]
fn undo_does_not_record_its_own_inverse() {
    let mut library = library();
    library.add_book("A", "X", Genre::Adventure).unwrap();
    library.undo(1).unwrap();
    assert_eq!(library.undo_len(), 0);
    assert!(library.books().is_empty());
}

#[test]
fn undo_limit_drops_oldest_records() {
    let config = LibraryConfig {
        undo_limit: Some(2),
        ..LibraryConfig::default()
    };
    let mut library = Library::builder().config(config).clock(fixed_day).build().unwrap();
    for title in ["A", "B", "C"] {
        library.add_book(title, "X", Genre::Romance).unwrap();
    }
    assert_eq!(library.undo_len(), 2);

    library.undo(5).unwrap();
    let titles: Vec<_> = library.books().iter().map(|b| b.title.as_str()).collect();
    assert_eq!(titles, vec!["A"]);
}
