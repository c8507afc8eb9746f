//! SQLite-backed catalogue store.

use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use rusqlite::{Connection, OptionalExtension, params};
use serde::{Deserialize, Serialize};

use crate::book::Book;

use super::{BookStore, PersistError, PersistResult};

const BOOK_FORMAT_VERSION: u16 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct BookEnvelope {
    format_version: u16,
    book: Book,
}

/// SQLite implementation of [`crate::persist::BookStore`].
///
/// Each write replaces the `books` table inside one transaction and appends
/// an audit row to `writes`.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Opens or creates a SQLite-backed store at `path`.
    ///
    /// Enables WAL mode and sets `synchronous=NORMAL`.
    pub fn open(path: impl AsRef<Path>) -> PersistResult<Self> {
        let conn = Connection::open(path)?;
        Self::init_connection(conn)
    }

    /// Opens an in-memory store.
    pub fn open_in_memory() -> PersistResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_connection(conn)
    }

    fn init_connection(conn: Connection) -> PersistResult<Self> {
        conn.execute_batch(include_str!("schema.sql"))?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        Ok(Self { conn })
    }

    /// Number of whole-catalogue writes recorded.
    pub fn write_count(&self) -> PersistResult<u64> {
        let count: Option<i64> = self
            .conn
            .query_row("SELECT COUNT(*) FROM writes", [], |row| row.get(0))
            .optional()?;
        Ok(count.unwrap_or(0) as u64)
    }
}

impl BookStore for SqliteStore {
    fn write(&mut self, books: &[Book]) -> PersistResult<()> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM books", [])?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO books(position, book_id, title, author, genre, borrowed, payload) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )?;
            for (position, book) in books.iter().enumerate() {
                let payload = serde_json::to_vec(&BookEnvelope {
                    format_version: BOOK_FORMAT_VERSION,
                    book: book.clone(),
                })?;
                stmt.execute(params![
                    position as i64,
                    book.book_id.map(|id| id.to_string()),
                    book.title,
                    book.author,
                    book.genre.name(),
                    book.is_borrowed(),
                    payload,
                ])?;
            }
        }
        tx.execute(
            "INSERT INTO writes(ts_ms, book_count) VALUES (?1, ?2)",
            params![now_ms() as i64, books.len() as i64],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn read(&self) -> PersistResult<Vec<Book>> {
        let mut stmt = self
            .conn
            .prepare("SELECT payload FROM books ORDER BY position ASC")?;
        let rows = stmt.query_map([], |row| row.get::<_, Vec<u8>>(0))?;

        let mut out = Vec::new();
        for row in rows {
            out.push(decode_book_payload(&row?)?);
        }
        Ok(out)
    }

    fn flush(&mut self) -> PersistResult<()> {
        self.conn.execute_batch("PRAGMA wal_checkpoint(PASSIVE);")?;
        Ok(())
    }
}

fn decode_book_payload(payload: &[u8]) -> PersistResult<Book> {
    let envelope: BookEnvelope = serde_json::from_slice(payload)?;
    if envelope.format_version != BOOK_FORMAT_VERSION {
        return Err(PersistError::Message(format!(
            "unsupported book format version: {}",
            envelope.format_version
        )));
    }
    Ok(envelope.book)
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
