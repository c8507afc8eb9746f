use chrono::NaiveDate;
use proptest::prelude::*;

use lebook::{
    book::{Book, StatusChange},
    config::LibraryConfig,
    core::library::{BookSelector, Library},
    error::LibraryError,
    types::Genre,
};

#[derive(Debug, Clone)]
enum Action {
    Add { title_idx: u8, genre_idx: u8 },
    Delete { target: u8 },
    DeleteById { target: u8 },
    Borrow { target: u8, who: u8 },
    Return { target: u8 },
    Undo { count: u8 },
}

fn action_strategy() -> impl Strategy<Value = Action> {
    prop_oneof![
        4 => (0u8..12, 0u8..7).prop_map(|(title_idx, genre_idx)| Action::Add { title_idx, genre_idx }),
        1 => (0u8..24).prop_map(|target| Action::Delete { target }),
        1 => (0u8..24).prop_map(|target| Action::DeleteById { target }),
        1 => (0u8..24, 0u8..4).prop_map(|(target, who)| Action::Borrow { target, who }),
        1 => (0u8..24).prop_map(|target| Action::Return { target }),
        1 => (1u8..4).prop_map(|count| Action::Undo { count }),
    ]
}

fn small_library() -> Library {
    let config = LibraryConfig {
        default_shelf_capacity: 3,
        max_shelves_per_genre: Some(3),
        ..LibraryConfig::default()
    };
    Library::builder()
        .config(config)
        .clock(|| NaiveDate::from_ymd_opt(2025, 1, 10).unwrap())
        .build()
        .unwrap()
}

fn apply(library: &mut Library, action: &Action) -> Result<(), LibraryError> {
    match *action {
        Action::Add { title_idx, genre_idx } => library
            .add_book(&format!("Title {title_idx}"), "Author", Genre::ALL[usize::from(genre_idx)])
            .map(|_| ()),
        Action::Delete { target } => library
            .delete_book(BookSelector::Index(usize::from(target)))
            .map(|_| ()),
        Action::DeleteById { target } => {
            let raw = library
                .books()
                .get(usize::from(target))
                .and_then(|b| b.book_id)
                .map(|id| id.to_string())
                .unwrap_or_else(|| "R-9-9".to_string());
            library.delete_book(BookSelector::Id(raw)).map(|_| ())
        }
        Action::Borrow { target, who } => library
            .update_status(StatusChange::Borrow, usize::from(target), Some(&format!("member{who}")))
            .map(|_| ()),
        Action::Return { target } => library
            .update_status(StatusChange::Return, usize::from(target), None)
            .map(|_| ()),
        Action::Undo { count } => library.undo(usize::from(count)).map(|_| ()),
    }
}

proptest! {
    #[test]
    fn random_sequences_keep_catalogue_and_shelves_in_step(actions in prop::collection::vec(action_strategy(), 1..150)) {
        let mut library = small_library();

        for action in &actions {
            let before: Vec<Book> = library.books().to_vec();
            let undo_before = library.undo_len();
            let result = apply(&mut library, action);

            prop_assert!(library.is_consistent(), "diverged after {:?}", action);
            if result.is_err() && !matches!(action, Action::Undo { .. }) {
                prop_assert_eq!(library.books(), before.as_slice());
                prop_assert_eq!(library.undo_len(), undo_before);
            }
        }
    }

    #[test]
    fn undoing_everything_returns_to_empty(actions in prop::collection::vec(action_strategy(), 1..100)) {
        let mut library = small_library();
        for action in actions.iter().filter(|a| !matches!(a, Action::Undo { .. })) {
            let _ = apply(&mut library, action);
        }

        let pending = library.undo_len();
        if pending > 0 {
            let undone = library.undo(pending).unwrap();
            prop_assert_eq!(undone.len(), pending);
        }
        prop_assert!(library.books().is_empty());
        prop_assert!(library.shelves().occupied_ids().is_empty());
        prop_assert!(library.is_consistent());
    }

    #[test]
    fn ids_are_unique_and_match_their_genre(actions in prop::collection::vec(action_strategy(), 1..150)) {
        let mut library = small_library();
        for action in &actions {
            let _ = apply(&mut library, action);
        }

        let mut seen = std::collections::HashSet::new();
        for book in library.books() {
            let id = book.book_id.unwrap();
            prop_assert_eq!(id.genre, book.genre);
            prop_assert!(id.slot < 3);
            prop_assert!(id.shelf < 3);
            prop_assert!(seen.insert(id));
        }
    }
}
