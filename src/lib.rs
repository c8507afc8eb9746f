//! Personal library catalogue with genre shelving, loans, and multi-step undo.
//!
//! # Examples
//!
//! In-memory usage with [`core::library::Library`]:
//! ```
//! use lebook::{
//!     core::library::{BookSelector, Library},
//!     types::Genre,
//! };
//!
//! let mut library = Library::default();
//! let added = library.add_book("Dune", "Frank Herbert", Genre::SciFi).expect("add");
//! assert_eq!(added.book_id.expect("shelved").to_string(), "SCIF-0-0");
//!
//! library.delete_book(BookSelector::Index(0)).expect("delete");
//! library.undo(1).expect("undo");
//! assert_eq!(library.books()[0].book_id, added.book_id);
//! ```
//!
//! Runtime usage with a SQLite store:
//! ```no_run
//! use lebook::{
//!     command::Command,
//!     core::library::Library,
//!     persist::{BookStore, sqlite::SqliteStore},
//!     runtime::handle::{spawn_library, RuntimeConfig},
//! };
//!
//! # #[tokio::main]
//! # async fn main() {
//! let store = SqliteStore::open("lebook.db").expect("open sqlite");
//! let library = Library::builder()
//!     .seed(store.read().expect("read"))
//!     .build()
//!     .expect("seed");
//! let handle = spawn_library(library, Some(Box::new(store)), RuntimeConfig::default());
//! let reply = handle
//!     .execute(Command::parse("add Dune / Frank Herbert / scifi").expect("parse"))
//!     .await
//!     .expect("add");
//! println!("{reply:?}");
//! handle.shutdown().await.expect("shutdown");
//! # }
//! ```

/// Loan-carrying book records.
pub mod book;
/// Line command parsing and dispatch.
pub mod command;
/// Library settings loaded from JSON.
pub mod config;
/// Catalogue, shelving, undo, and the library facade.
pub mod core;
/// Domain error types.
pub mod error;
/// Undo record model.
pub mod op;
/// Catalogue storage backends.
pub mod persist;
/// Single-writer runtime handle and events.
pub mod runtime;
/// Genres and book IDs.
pub mod types;
/// Console rendering.
pub mod ui;
