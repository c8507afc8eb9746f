//! Line-per-book text file store.
//!
//! Each line is `title|author|genre|borrowed|borrower|due|id` with `borrowed`
//! as `0`/`1`, `due` as `YYYY-MM-DD`, and empty fields for absent values.
//! `\`, `|`, and newlines inside a field are backslash-escaped.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use crate::{
    book::{Book, Loan},
    types::{BookId, Genre},
};

use super::{BookStore, PersistError, PersistResult};

const FIELD_SEP: char = '|';
const FIELD_COUNT: usize = 7;
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Text-file implementation of [`crate::persist::BookStore`].
#[derive(Debug, Clone)]
pub struct FlatFileStore {
    path: PathBuf,
}

impl FlatFileStore {
    /// Store backed by `path`. Nothing is touched until the first write.
    pub fn open(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl BookStore for FlatFileStore {
    fn write(&mut self, books: &[Book]) -> PersistResult<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        let tmp = self.path.with_extension("tmp");
        {
            let mut file = fs::File::create(&tmp)?;
            for book in books {
                writeln!(file, "{}", encode_line(book))?;
            }
            file.sync_all()?;
        }
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn read(&self) -> PersistResult<Vec<Book>> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };
        raw.lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(n, line)| {
                decode_line(line).map_err(|message| PersistError::Parse {
                    line: n + 1,
                    message,
                })
            })
            .collect()
    }
}

fn encode_line(book: &Book) -> String {
    let borrowed = if book.is_borrowed() { "1" } else { "0" };
    let due = book
        .return_due_date()
        .map(|d| d.format(DATE_FORMAT).to_string())
        .unwrap_or_default();
    let id = book.book_id.map(|id| id.to_string()).unwrap_or_default();
    let fields = [
        escape(&book.title),
        escape(&book.author),
        book.genre.name().to_string(),
        borrowed.to_string(),
        escape(book.borrower_name().unwrap_or_default()),
        due,
        id,
    ];
    fields.join(&FIELD_SEP.to_string())
}

fn decode_line(line: &str) -> Result<Book, String> {
    let fields = split_fields(line);
    let [title, author, genre, borrowed, borrower, due, id]: [String; FIELD_COUNT] = fields
        .try_into()
        .map_err(|f: Vec<String>| format!("expected {FIELD_COUNT} fields, found {}", f.len()))?;

    let genre: Genre = genre.parse().map_err(|e| format!("{e}"))?;
    let loan = match borrowed.as_str() {
        "0" => None,
        "1" => {
            let due = NaiveDate::parse_from_str(&due, DATE_FORMAT)
                .map_err(|e| format!("bad due date '{due}': {e}"))?;
            if borrower.is_empty() {
                return Err("borrowed book has no borrower".to_string());
            }
            Some(Loan { borrower, due })
        }
        other => return Err(format!("bad borrowed flag '{other}'")),
    };
    let book_id = if id.is_empty() {
        None
    } else {
        Some(id.parse::<BookId>().map_err(|e| format!("{e}"))?)
    };

    Ok(Book {
        title,
        author,
        genre,
        loan,
        book_id,
    })
}

fn escape(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    for ch in field.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            FIELD_SEP => out.push_str("\\|"),
            '\n' => out.push_str("\\n"),
            other => out.push(other),
        }
    }
    out
}

fn split_fields(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut chars = line.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' => match chars.next() {
                Some('n') => current.push('\n'),
                Some(escaped) => current.push(escaped),
                None => current.push('\\'),
            },
            FIELD_SEP => fields.push(std::mem::take(&mut current)),
            other => current.push(other),
        }
    }
    fields.push(current);
    fields
}
