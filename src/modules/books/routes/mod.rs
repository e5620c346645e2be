//! HTTP handlers for the books API.
//!
//! Every handler validates, makes exactly one store call, and shapes the
//! response. Failures are returned as [`AppError`] and rendered by its
//! central responder.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use shelf_http::AppError;

use super::models::{
    BookChanges, BookFilter, BookResponse, BooksResponse, MessageResponse, NewBook,
};
use super::schema::{Schema, NEW_BOOK, UPDATE_BOOK};
use super::store::BookStore;

const ISBN_ALREADY_EXISTS: &str = "isbn already exists";
const BOOK_DELETED: &str = "Book deleted";

/// Shared handler state
#[derive(Clone)]
pub struct BooksState {
    pub store: Arc<dyn BookStore>,
}

/// Routes relative to the module mount point
pub fn router(state: BooksState) -> Router {
    Router::new()
        .route("/", get(list_books).post(create_book))
        .route(
            "/{isbn}",
            get(get_book).put(update_book).delete(delete_book),
        )
        .with_state(state)
}

/// Validate `body` against `schema`, then decode it.
fn decode<T: DeserializeOwned>(schema: &Schema, body: Value) -> Result<T, AppError> {
    if let Err(errors) = schema.validate(&body) {
        tracing::debug!(schema = schema.name, violations = errors.len(), "request body rejected");
        return Err(AppError::validation(errors));
    }

    serde_json::from_value(body).map_err(|err| AppError::bad_request(err.to_string()))
}

/// `GET /` => `{books: [book, ...]}`
async fn list_books(
    State(state): State<BooksState>,
    query: Result<Query<HashMap<String, String>>, QueryRejection>,
) -> Result<Json<BooksResponse>, AppError> {
    let Query(params) = query?;
    let filter =
        BookFilter::from_query(&params).map_err(|err| AppError::bad_request(err.to_string()))?;

    let books = state.store.find_all(&filter).await?;
    Ok(Json(BooksResponse { books }))
}

/// `GET /{id}` => `{book: book}`
async fn get_book(
    State(state): State<BooksState>,
    Path(id): Path<String>,
) -> Result<Json<BookResponse>, AppError> {
    let book = state.store.find_one(&id).await?;
    Ok(Json(BookResponse { book }))
}

/// `POST /` bookData => `{book: newBook}`
async fn create_book(
    State(state): State<BooksState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<BookResponse>), AppError> {
    let Json(body) = payload?;
    let new_book: NewBook = decode(&NEW_BOOK, body)?;

    let book = state.store.create(new_book).await?;
    tracing::info!(isbn = %book.isbn, "book created");

    Ok((StatusCode::CREATED, Json(BookResponse { book })))
}

/// `PUT /{isbn}` bookData => `{book: updatedBook}`
///
/// A body carrying `isbn` is rejected before schema validation runs.
async fn update_book(
    State(state): State<BooksState>,
    Path(isbn): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<BookResponse>, AppError> {
    let Json(body) = payload?;

    if body.get("isbn").is_some() {
        return Err(AppError::forbidden_field(ISBN_ALREADY_EXISTS));
    }

    let changes: BookChanges = decode(&UPDATE_BOOK, body)?;

    let book = state.store.update(&isbn, changes).await?;
    tracing::info!(isbn = %book.isbn, "book updated");

    Ok(Json(BookResponse { book }))
}

/// `DELETE /{isbn}` => `{message: "Book deleted"}`
async fn delete_book(
    State(state): State<BooksState>,
    Path(isbn): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    state.store.remove(&isbn).await?;
    tracing::info!(isbn = %isbn, "book deleted");

    Ok(Json(MessageResponse {
        message: BOOK_DELETED.to_string(),
    }))
}
