pub mod flat_file;
pub mod sqlite;

use thiserror::Error;

use crate::book::Book;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },
    #[error("catalogue stored up to version {durable}, newest is {requested}: {reason}")]
    Behind {
        durable: u64,
        requested: u64,
        reason: String,
    },
    #[error("{0}")]
    Message(String),
}

pub type PersistResult<T> = Result<T, PersistError>;

/// Whole-catalogue storage. `write` replaces everything previously stored.
pub trait BookStore: Send {
    fn write(&mut self, books: &[Book]) -> PersistResult<()>;
    fn read(&self) -> PersistResult<Vec<Book>>;
    fn flush(&mut self) -> PersistResult<()> {
        Ok(())
    }
}
