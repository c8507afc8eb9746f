//! Console text for replies, errors, and prompts.

use std::fmt::Write as _;

use crate::{
    book::{Book, StatusChange},
    command::Reply,
    core::library::{ShelfEntry, ShelfListing},
    error::LibraryError,
};

/// Separator line framing every response.
pub const SEPARATOR: &str = "========================================";

const DATE_FORMAT: &str = "%b %d %Y";

/// Greeting shown at startup.
pub fn welcome() -> String {
    framed("Welcome to Lebook, your personal book management system!")
}

/// Farewell shown on `bye`.
pub fn goodbye() -> String {
    framed("Goodbye! Hope to see you again soon!")
}

/// Command reference.
pub fn help() -> String {
    let body = "\
Available Commands:
 1. add TITLE / AUTHOR / GENRE      - Add a new book.
 2. borrow INDEX / MEMBER_NAME      - Borrow a book (1-based index).
 3. delete bk / TITLE / AUTHOR      - Remove book by title and author.
 4. delete num / INDEX              - Remove book by list index (1-based).
 5. delete id / ID                  - Remove book by book ID.
 6. find CRITERIA TERM              - Search books (title, author, genre, id).
 7. help                            - Show this help menu.
 8. list                            - List all books.
 9. list borrowed                   - List borrowed books.
10. list overdue                    - List overdue books.
11. list users                      - List members with overdue books.
12. quantity / TITLE / AUTHOR       - Count copies of a book.
13. return INDEX                    - Return a borrowed book (1-based index).
14. shelf GENRE / SHELF_NUMBER      - List a shelf (0-based number).
15. statistics                      - View library statistics.
16. undo [COUNT]                    - Undo add/delete/borrow/return.
17. bye                             - Exit the program.
Supported Genres: romance, adventure, action, horror, mystery, nonfiction, scifi";
    framed(body)
}

/// `[ERROR]` frame, or a plain frame for informational outcomes.
pub fn error(err: &LibraryError) -> String {
    if err.is_informational() {
        framed(&err.to_string())
    } else {
        framed(&format!("[ERROR] {err}"))
    }
}

/// Confirmation prompt for multi-step undo.
pub fn undo_prompt(count: usize) -> String {
    format!("Confirm undo {count} request? <y/n>: ")
}

/// Renders a successful reply.
pub fn render(reply: &Reply) -> String {
    match reply {
        Reply::Added(book) => framed(&format!(
            "[SUCCESS] Added: {} by {} (ID: {})",
            book.title,
            book.author,
            id_text(book)
        )),
        Reply::Deleted { book, remaining } => framed(&format!(
            "Book deleted: {} by {}\nNow you have {remaining} books in the library.",
            book.title, book.author
        )),
        Reply::StatusChanged { change, book } => {
            let verb = match change {
                StatusChange::Borrow => "Borrowed",
                StatusChange::Return => "Returned",
            };
            let mut out = format!("{verb}: {}", book.title);
            if let (Some(who), Some(due)) = (book.borrower_name(), book.return_due_date()) {
                let _ = write!(out, " (by {who}, due {})", due.format(DATE_FORMAT));
            }
            framed(&out)
        }
        Reply::Books { heading, books } => {
            if books.is_empty() {
                return framed(&format!("{heading}\n(no books)"));
            }
            framed(&format!("{heading}\n{}", book_list(books)))
        }
        Reply::Borrowers(names) => {
            if names.is_empty() {
                return framed("No members have overdue books.");
            }
            framed(&format!("Members with overdue books:\n{}", names.join("\n")))
        }
        Reply::Shelf(listing) => framed(&shelf(listing)),
        Reply::Quantity { title, author, count } => {
            framed(&format!("There are {count} copies of {title} by {author}."))
        }
        Reply::Statistics(stats) => {
            let mut out = format!(
                "Library statistics:\n  Total books: {}\n  Available: {}\n  Borrowed: {}\n  Overdue: {}\n  By genre:",
                stats.total,
                stats.available(),
                stats.borrowed,
                stats.overdue
            );
            for (genre, count) in &stats.per_genre {
                let _ = write!(out, "\n    {genre}: {count}");
            }
            framed(&out)
        }
        Reply::Undone(records) => {
            let mut out = format!("Undid {} operation(s):", records.len());
            for record in records {
                let _ = write!(
                    out,
                    "\n  {} of {} ({})",
                    record.kind, record.book.title, record.book_id
                );
            }
            framed(&out)
        }
        Reply::Help => help(),
        Reply::Exit => goodbye(),
    }
}

/// Numbered book lines, 1-based, with a loan line for borrowed books.
pub fn book_list(books: &[(usize, Book)]) -> String {
    let mut out = String::new();
    for (index, book) in books {
        if !out.is_empty() {
            out.push('\n');
        }
        let _ = write!(
            out,
            "{}. {} {} by {} (Genre: {}, ID: {})",
            index + 1,
            book.status_symbol(),
            book.title,
            book.author,
            book.genre,
            id_text(book)
        );
        if let Some(loan) = &book.loan {
            let _ = write!(
                out,
                "\n     Borrowed by: {} (Due: {})",
                loan.borrower,
                loan.due.format(DATE_FORMAT)
            );
        }
    }
    out
}

/// Slot-by-slot shelf listing with placeholders marked.
pub fn shelf(listing: &ShelfListing) -> String {
    let mut out = format!("{} shelf {}:", listing.genre, listing.number);
    for (id, entry) in &listing.entries {
        let line = match entry {
            ShelfEntry::Empty => "(empty)".to_string(),
            ShelfEntry::Placeholder => "[removed]".to_string(),
            ShelfEntry::Book {
                title,
                author,
                borrowed,
            } => {
                let status = if *borrowed { "[X]" } else { "[ ]" };
                format!("{status} {title} by {author}")
            }
        };
        let _ = write!(out, "\n  {id}: {line}");
    }
    out
}

fn framed(body: &str) -> String {
    format!("{SEPARATOR}\n{body}\n{SEPARATOR}")
}

fn id_text(book: &Book) -> String {
    book.book_id
        .map(|id| id.to_string())
        .unwrap_or_else(|| "N/A".to_string())
}
