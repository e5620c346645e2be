pub mod models;
pub mod routes;
pub mod schema;
pub mod store;

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use serde_json::json;
use shelf_kernel::{InitCtx, Migration, Module};

use routes::BooksState;
use store::BookStore;

/// Schema migrations owned by the books module
pub const MIGRATIONS: &[Migration] = &[Migration {
    id: "001_create_books",
    up: r#"
        CREATE TABLE IF NOT EXISTS books (
            isbn       TEXT PRIMARY KEY,
            amazon_url TEXT NOT NULL,
            author     TEXT NOT NULL,
            language   TEXT NOT NULL,
            pages      INTEGER NOT NULL,
            publisher  TEXT NOT NULL,
            title      TEXT NOT NULL,
            year       INTEGER NOT NULL
        );
        "#,
}];

/// Book records keyed by ISBN: list, get, create, update, delete
pub struct BooksModule {
    store: Arc<dyn BookStore>,
}

impl BooksModule {
    pub fn new(store: Arc<dyn BookStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        "books"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        routes::router(BooksState {
            store: Arc::clone(&self.store),
        })
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(openapi_fragment())
    }

    fn migrations(&self) -> Vec<Migration> {
        MIGRATIONS.to_vec()
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module stopped");
        Ok(())
    }
}

fn json_content(schema: serde_json::Value) -> serde_json::Value {
    json!({
        "application/json": {
            "schema": schema
        }
    })
}

fn error_response(description: &str) -> serde_json::Value {
    json!({
        "description": description,
        "content": json_content(json!({ "$ref": "#/components/schemas/ErrorResponse" }))
    })
}

fn book_response(description: &str) -> serde_json::Value {
    json!({
        "description": description,
        "content": json_content(json!({ "$ref": "#/components/schemas/BookEnvelope" }))
    })
}

fn isbn_parameter() -> serde_json::Value {
    json!({
        "name": "isbn",
        "in": "path",
        "required": true,
        "schema": { "type": "string" }
    })
}

fn book_properties(with_isbn: bool) -> serde_json::Value {
    let mut properties = json!({
        "amazon_url": { "type": "string" },
        "author": { "type": "string" },
        "language": { "type": "string" },
        "pages": { "type": "integer" },
        "publisher": { "type": "string" },
        "title": { "type": "string" },
        "year": { "type": "integer" }
    });
    if with_isbn {
        properties["isbn"] = json!({ "type": "string", "description": "Primary key" });
    }
    properties
}

fn required_fields(schema: &schema::Schema) -> Vec<&'static str> {
    schema.fields.iter().map(|field| field.name).collect()
}

fn openapi_fragment() -> serde_json::Value {
    json!({
        "paths": {
            "/": {
                "get": {
                    "summary": "List books, optionally filtered by field equality",
                    "tags": ["Books"],
                    "responses": {
                        "200": {
                            "description": "Matching books",
                            "content": json_content(json!({
                                "type": "object",
                                "properties": {
                                    "books": {
                                        "type": "array",
                                        "items": { "$ref": "#/components/schemas/Book" }
                                    }
                                },
                                "required": ["books"]
                            }))
                        },
                        "400": error_response("Invalid filter value")
                    }
                },
                "post": {
                    "summary": "Create a book",
                    "tags": ["Books"],
                    "requestBody": {
                        "required": true,
                        "content": json_content(json!({ "$ref": "#/components/schemas/NewBook" }))
                    },
                    "responses": {
                        "201": book_response("Created book"),
                        "400": error_response("Body failed validation"),
                        "409": error_response("A book with this isbn already exists")
                    }
                }
            },
            "/{isbn}": {
                "get": {
                    "summary": "Get a book by isbn",
                    "tags": ["Books"],
                    "parameters": [isbn_parameter()],
                    "responses": {
                        "200": book_response("The book"),
                        "404": error_response("No book with this isbn")
                    }
                },
                "put": {
                    "summary": "Replace every field of a book except its isbn",
                    "tags": ["Books"],
                    "parameters": [isbn_parameter()],
                    "requestBody": {
                        "required": true,
                        "content": json_content(json!({ "$ref": "#/components/schemas/UpdateBook" }))
                    },
                    "responses": {
                        "200": book_response("Updated book"),
                        "400": error_response("Body failed validation or contained isbn"),
                        "404": error_response("No book with this isbn")
                    }
                },
                "delete": {
                    "summary": "Delete a book",
                    "tags": ["Books"],
                    "parameters": [isbn_parameter()],
                    "responses": {
                        "200": {
                            "description": "Book deleted",
                            "content": json_content(json!({
                                "type": "object",
                                "properties": { "message": { "type": "string" } },
                                "required": ["message"]
                            }))
                        },
                        "404": error_response("No book with this isbn")
                    }
                }
            }
        },
        "components": {
            "schemas": {
                "Book": {
                    "type": "object",
                    "properties": book_properties(true),
                    "required": required_fields(&schema::NEW_BOOK)
                },
                "BookEnvelope": {
                    "type": "object",
                    "properties": { "book": { "$ref": "#/components/schemas/Book" } },
                    "required": ["book"]
                },
                "NewBook": {
                    "type": "object",
                    "properties": book_properties(true),
                    "required": required_fields(&schema::NEW_BOOK)
                },
                "UpdateBook": {
                    "type": "object",
                    "properties": book_properties(false),
                    "required": required_fields(&schema::UPDATE_BOOK)
                }
            }
        }
    })
}

/// Create the books module over the given store
pub fn create_module(store: Arc<dyn BookStore>) -> Arc<dyn Module> {
    Arc::new(BooksModule::new(store))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_fragment_documents_every_operation() {
        let spec = openapi_fragment();

        for method in ["get", "post"] {
            assert!(spec["paths"]["/"][method].is_object(), "missing {method} /");
        }
        for method in ["get", "put", "delete"] {
            assert!(
                spec["paths"]["/{isbn}"][method].is_object(),
                "missing {method} /{{isbn}}"
            );
        }
    }

    #[test]
    fn test_openapi_update_schema_omits_isbn() {
        let spec = openapi_fragment();
        let update = &spec["components"]["schemas"]["UpdateBook"];

        assert!(update["properties"].get("isbn").is_none());
        assert_eq!(update["required"].as_array().unwrap().len(), 7);
        assert_eq!(
            spec["components"]["schemas"]["NewBook"]["required"][0],
            "isbn"
        );
    }
}
