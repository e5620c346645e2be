use async_trait::async_trait;
use shelf_http::AppError;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use thiserror::Error;

use super::models::{Book, BookChanges, BookFilter, NewBook};

const BOOK_COLUMNS: &str = "isbn, amazon_url, author, language, pages, publisher, title, year";

/// Failures surfaced by a [`BookStore`]
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("There is no book with an isbn {isbn}")]
    NotFound { isbn: String },

    #[error("There is already a book with an isbn {isbn}")]
    Duplicate { isbn: String },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { .. } => AppError::not_found(err.to_string()),
            StoreError::Duplicate { .. } => AppError::conflict(err.to_string()),
            StoreError::Database(source) => {
                AppError::Internal(anyhow::Error::new(source).context("book store query failed"))
            }
        }
    }
}

/// Persistence contract for book records
#[async_trait]
pub trait BookStore: Send + Sync {
    /// All books matching every set filter field, ordered by title then isbn
    async fn find_all(&self, filter: &BookFilter) -> Result<Vec<Book>, StoreError>;

    async fn find_one(&self, isbn: &str) -> Result<Book, StoreError>;

    async fn create(&self, book: NewBook) -> Result<Book, StoreError>;

    /// Replace every non-key field of the book stored under `isbn`
    async fn update(&self, isbn: &str, changes: BookChanges) -> Result<Book, StoreError>;

    async fn remove(&self, isbn: &str) -> Result<(), StoreError>;
}

/// [`BookStore`] backed by the `books` table
#[derive(Clone)]
pub struct SqliteBookStore {
    pool: SqlitePool,
}

impl SqliteBookStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn push_text<'a>(
    builder: &mut QueryBuilder<'a, Sqlite>,
    has_clause: &mut bool,
    column: &str,
    value: &'a Option<String>,
) {
    if let Some(value) = value {
        push_condition(builder, has_clause, column);
        builder.push_bind(value.as_str());
    }
}

fn push_integer(
    builder: &mut QueryBuilder<'_, Sqlite>,
    has_clause: &mut bool,
    column: &str,
    value: Option<i64>,
) {
    if let Some(value) = value {
        push_condition(builder, has_clause, column);
        builder.push_bind(value);
    }
}

fn push_condition(builder: &mut QueryBuilder<'_, Sqlite>, has_clause: &mut bool, column: &str) {
    builder.push(if *has_clause { " AND " } else { " WHERE " });
    builder.push(column);
    builder.push(" = ");
    *has_clause = true;
}

#[async_trait]
impl BookStore for SqliteBookStore {
    async fn find_all(&self, filter: &BookFilter) -> Result<Vec<Book>, StoreError> {
        let mut builder =
            QueryBuilder::<Sqlite>::new(format!("SELECT {} FROM books", BOOK_COLUMNS));
        let mut has_clause = false;

        push_text(&mut builder, &mut has_clause, "isbn", &filter.isbn);
        push_text(&mut builder, &mut has_clause, "amazon_url", &filter.amazon_url);
        push_text(&mut builder, &mut has_clause, "author", &filter.author);
        push_text(&mut builder, &mut has_clause, "language", &filter.language);
        push_integer(&mut builder, &mut has_clause, "pages", filter.pages);
        push_text(&mut builder, &mut has_clause, "publisher", &filter.publisher);
        push_text(&mut builder, &mut has_clause, "title", &filter.title);
        push_integer(&mut builder, &mut has_clause, "year", filter.year);

        builder.push(" ORDER BY title, isbn");

        let books = builder
            .build_query_as::<Book>()
            .fetch_all(&self.pool)
            .await?;

        Ok(books)
    }

    async fn find_one(&self, isbn: &str) -> Result<Book, StoreError> {
        let sql = format!("SELECT {} FROM books WHERE isbn = ?", BOOK_COLUMNS);

        sqlx::query_as::<_, Book>(&sql)
            .bind(isbn)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::NotFound {
                isbn: isbn.to_string(),
            })
    }

    async fn create(&self, book: NewBook) -> Result<Book, StoreError> {
        let sql = format!(
            "INSERT INTO books ({columns}) VALUES (?, ?, ?, ?, ?, ?, ?, ?) RETURNING {columns}",
            columns = BOOK_COLUMNS
        );

        sqlx::query_as::<_, Book>(&sql)
            .bind(&book.isbn)
            .bind(&book.amazon_url)
            .bind(&book.author)
            .bind(&book.language)
            .bind(book.pages)
            .bind(&book.publisher)
            .bind(&book.title)
            .bind(book.year)
            .fetch_one(&self.pool)
            .await
            .map_err(|err| match err {
                sqlx::Error::Database(ref db) if db.is_unique_violation() => StoreError::Duplicate {
                    isbn: book.isbn.clone(),
                },
                other => StoreError::Database(other),
            })
    }

    async fn update(&self, isbn: &str, changes: BookChanges) -> Result<Book, StoreError> {
        let sql = format!(
            "UPDATE books SET amazon_url = ?, author = ?, language = ?, pages = ?, \
             publisher = ?, title = ?, year = ? WHERE isbn = ? RETURNING {}",
            BOOK_COLUMNS
        );

        sqlx::query_as::<_, Book>(&sql)
            .bind(&changes.amazon_url)
            .bind(&changes.author)
            .bind(&changes.language)
            .bind(changes.pages)
            .bind(&changes.publisher)
            .bind(&changes.title)
            .bind(changes.year)
            .bind(isbn)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::NotFound {
                isbn: isbn.to_string(),
            })
    }

    async fn remove(&self, isbn: &str) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM books WHERE isbn = ?")
            .bind(isbn)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound {
                isbn: isbn.to_string(),
            });
        }

        Ok(())
    }
}
