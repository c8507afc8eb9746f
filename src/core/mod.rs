//! In-memory catalogue, shelving, undo history, and the facade over them.

/// Ordered book list and lookups.
pub mod catalogue;
/// Facade coordinating catalogue, shelves, and undo.
pub mod library;
/// Genre shelves, slots, and ID allocation.
pub mod shelving;
/// Bounded LIFO undo history.
pub mod undo;
