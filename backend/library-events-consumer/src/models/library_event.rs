use library_event_schema::{Book, LibraryEventType};
use serde::{Deserialize, Serialize};

/// Persisted library event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryEventEntity {
    pub library_event_id: i32,
    pub library_event_type: LibraryEventType,
    pub book: Option<BookEntity>,
}

/// Persisted book, owned by exactly one library event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookEntity {
    pub book_id: i32,
    pub book_name: String,
    pub book_author: String,
    pub library_event_id: i32,
}

impl BookEntity {
    /// Book row pointing back at its owning event
    pub fn linked_to(library_event_id: i32, book: &Book) -> Self {
        Self {
            book_id: book.book_id,
            book_name: book.book_name.clone(),
            book_author: book.book_author.clone(),
            library_event_id,
        }
    }
}
