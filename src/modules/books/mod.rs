pub mod models;
pub mod repository;
pub mod routes;

use async_trait::async_trait;
use axum::{routing::get, Router};
use bookshelf_kernel::{InitCtx, Migration, Module};
use serde_json::json;

/// Tag carried by every cached book read. Any book or author write clears it.
pub const BOOKS_CACHE_TAG: &str = "books";

/// Books module: the catalogue itself
pub struct BooksModule;

impl BooksModule {
    pub const fn new() -> Self {
        Self
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
            cache_ttl_secs = ?ctx.settings.cache.ttl_secs,
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self, ctx: &InitCtx<'_>) -> Router {
        Router::new()
            .route("/", get(routes::list_books).post(routes::create_book))
            .route(
                "/{id}",
                get(routes::get_book)
                    .put(routes::update_book)
                    .delete(routes::delete_book),
            )
            .with_state(ctx.services.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        let error = json!({
            "application/json": { "schema": { "$ref": "#/components/schemas/ErrorResponse" } }
        });
        let id_param = json!({
            "name": "id", "in": "path", "required": true, "schema": { "type": "integer" }
        });
        let payload = json!({
            "required": true,
            "content": {
                "application/json": { "schema": { "$ref": "#/components/schemas/BookPayload" } }
            }
        });

        Some(json!({
            "paths": {
                "/": {
                    "get": {
                        "summary": "List books",
                        "description": "Paginated when both page and limit are given and greater than zero.",
                        "tags": ["Books"],
                        "parameters": [
                            { "name": "page", "in": "query", "required": false, "schema": { "type": "integer", "minimum": 1 } },
                            { "name": "limit", "in": "query", "required": false, "schema": { "type": "integer", "minimum": 1 } }
                        ],
                        "responses": {
                            "200": {
                                "description": "List of books",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "type": "array",
                                            "items": { "$ref": "#/components/schemas/Book" }
                                        }
                                    }
                                }
                            }
                        }
                    },
                    "post": {
                        "summary": "Create a book",
                        "tags": ["Books"],
                        "security": [{ "bearerAuth": [] }],
                        "requestBody": payload.clone(),
                        "responses": {
                            "201": {
                                "description": "Book created; Location points at it",
                                "content": {
                                    "application/json": {
                                        "schema": { "$ref": "#/components/schemas/Book" }
                                    }
                                }
                            },
                            "400": { "description": "Validation error", "content": error.clone() },
                            "401": { "description": "Missing or invalid token", "content": error.clone() },
                            "403": { "description": "ROLE_ADMIN required", "content": error.clone() }
                        }
                    }
                },
                "/{id}": {
                    "get": {
                        "summary": "Get one book",
                        "tags": ["Books"],
                        "parameters": [id_param.clone()],
                        "responses": {
                            "200": {
                                "description": "The book",
                                "content": {
                                    "application/json": {
                                        "schema": { "$ref": "#/components/schemas/Book" }
                                    }
                                }
                            },
                            "404": { "description": "Book not found", "content": error.clone() }
                        }
                    },
                    "put": {
                        "summary": "Replace a book",
                        "tags": ["Books"],
                        "security": [{ "bearerAuth": [] }],
                        "parameters": [id_param.clone()],
                        "requestBody": payload,
                        "responses": {
                            "204": { "description": "Book updated" },
                            "400": { "description": "Validation error", "content": error.clone() },
                            "403": { "description": "ROLE_ADMIN required", "content": error.clone() },
                            "404": { "description": "Book not found", "content": error.clone() }
                        }
                    },
                    "delete": {
                        "summary": "Delete a book",
                        "tags": ["Books"],
                        "security": [{ "bearerAuth": [] }],
                        "parameters": [id_param],
                        "responses": {
                            "204": { "description": "Book deleted" },
                            "403": { "description": "ROLE_ADMIN required", "content": error.clone() },
                            "404": { "description": "Book not found", "content": error }
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "Book": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "integer" },
                            "title": { "type": "string" },
                            "coverText": { "type": ["string", "null"] },
                            "author": {
                                "oneOf": [
                                    { "type": "null" },
                                    {
                                        "type": "object",
                                        "properties": {
                                            "id": { "type": "integer" },
                                            "firstName": { "type": "string" },
                                            "lastName": { "type": "string" }
                                        }
                                    }
                                ]
                            }
                        },
                        "required": ["id", "title", "coverText", "author"]
                    },
                    "BookPayload": {
                        "type": "object",
                        "properties": {
                            "title": { "type": "string", "minLength": 1, "maxLength": 255 },
                            "coverText": { "type": ["string", "null"] },
                            "idAuthor": { "type": ["integer", "null"] }
                        },
                        "required": ["title"]
                    }
                }
            }
        }))
    }

    fn migrations(&self) -> Vec<Migration> {
        vec![Migration {
            id: "001_init",
            up: r#"
                CREATE TABLE books (
                    id         INTEGER PRIMARY KEY AUTOINCREMENT,
                    title      TEXT NOT NULL CHECK (length(trim(title)) > 0 AND length(title) <= 255),
                    cover_text TEXT,
                    author_id  INTEGER REFERENCES authors(id) ON DELETE CASCADE
                );
                CREATE INDEX idx_books_author_id ON books(author_id);
                "#,
        }]
    }
}

/// Create a new instance of the books module
pub fn create_module() -> std::sync::Arc<dyn Module> {
    std::sync::Arc::new(BooksModule::new())
}
