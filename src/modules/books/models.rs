use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A book record, keyed by ISBN.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Book {
    /// Primary key; never changes after creation
    pub isbn: String,
    pub amazon_url: String,
    pub author: String,
    pub language: String,
    pub pages: i64,
    pub publisher: String,
    pub title: String,
    pub year: i64,
}

/// Body of a create request. Every field, including the ISBN, is required.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBook {
    pub isbn: String,
    pub amazon_url: String,
    pub author: String,
    pub language: String,
    pub pages: i64,
    pub publisher: String,
    pub title: String,
    pub year: i64,
}

impl From<NewBook> for Book {
    fn from(new: NewBook) -> Self {
        Self {
            isbn: new.isbn,
            amazon_url: new.amazon_url,
            author: new.author,
            language: new.language,
            pages: new.pages,
            publisher: new.publisher,
            title: new.title,
            year: new.year,
        }
    }
}

/// Body of an update request: every field except the ISBN, replaced
/// wholesale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookChanges {
    pub amazon_url: String,
    pub author: String,
    pub language: String,
    pub pages: i64,
    pub publisher: String,
    pub title: String,
    pub year: i64,
}

/// Equality filters for listing books. Unset fields do not constrain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookFilter {
    pub isbn: Option<String>,
    pub amazon_url: Option<String>,
    pub author: Option<String>,
    pub language: Option<String>,
    pub pages: Option<i64>,
    pub publisher: Option<String>,
    pub title: Option<String>,
    pub year: Option<i64>,
}

/// A query parameter that should have been an integer but was not.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("filter '{field}' must be an integer, got '{value}'")]
pub struct InvalidFilter {
    pub field: &'static str,
    pub value: String,
}

const FILTER_FIELDS: [&str; 8] = [
    "isbn",
    "amazon_url",
    "author",
    "language",
    "pages",
    "publisher",
    "title",
    "year",
];

fn parse_integer(
    params: &HashMap<String, String>,
    field: &'static str,
) -> Result<Option<i64>, InvalidFilter> {
    params
        .get(field)
        .map(|value| {
            value.trim().parse().map_err(|_| InvalidFilter {
                field,
                value: value.to_string(),
            })
        })
        .transpose()
}

impl BookFilter {
    /// Build a filter from raw query parameters. Keys that are not book
    /// fields are ignored; integer fields are checked in declaration order.
    pub fn from_query(params: &HashMap<String, String>) -> Result<Self, InvalidFilter> {
        for key in params.keys() {
            if !FILTER_FIELDS.contains(&key.as_str()) {
                tracing::debug!(key = %key, "ignoring unknown book filter");
            }
        }

        let text = |field: &str| params.get(field).cloned();

        Ok(Self {
            isbn: text("isbn"),
            amazon_url: text("amazon_url"),
            author: text("author"),
            language: text("language"),
            pages: parse_integer(params, "pages")?,
            publisher: text("publisher"),
            title: text("title"),
            year: parse_integer(params, "year")?,
        })
    }
}

/// `{ "books": [...] }`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BooksResponse {
    pub books: Vec<Book>,
}

/// `{ "book": {...} }`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookResponse {
    pub book: Book,
}

/// `{ "message": "..." }`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}
