pub mod models;
pub mod repository;
pub mod routes;

use async_trait::async_trait;
use axum::{routing::get, Router};
use bookshelf_kernel::{InitCtx, Migration, Module};
use serde_json::json;

/// Authors module: the people books are attributed to
pub struct AuthorsModule;

impl AuthorsModule {
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Module for AuthorsModule {
    fn name(&self) -> &'static str {
        "authors"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            "authors module initialized"
        );
        Ok(())
    }

    fn routes(&self, ctx: &InitCtx<'_>) -> Router {
        Router::new()
            .route("/", get(routes::list_authors).post(routes::create_author))
            .route("/{id}", get(routes::get_author).delete(routes::delete_author))
            .with_state(ctx.services.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        let error = json!({
            "application/json": { "schema": { "$ref": "#/components/schemas/ErrorResponse" } }
        });
        let id_param = json!([{
            "name": "id", "in": "path", "required": true, "schema": { "type": "integer" }
        }]);

        Some(json!({
            "paths": {
                "/": {
                    "get": {
                        "summary": "List authors with their books",
                        "tags": ["Authors"],
                        "responses": {
                            "200": {
                                "description": "List of authors",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "type": "array",
                                            "items": { "$ref": "#/components/schemas/Author" }
                                        }
                                    }
                                }
                            }
                        }
                    },
                    "post": {
                        "summary": "Create an author",
                        "tags": ["Authors"],
                        "security": [{ "bearerAuth": [] }],
                        "requestBody": {
                            "required": true,
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/AuthorPayload" }
                                }
                            }
                        },
                        "responses": {
                            "201": { "description": "Author created" },
                            "400": { "description": "Validation error", "content": error.clone() },
                            "401": { "description": "Missing or invalid token", "content": error.clone() },
                            "403": { "description": "ROLE_ADMIN required", "content": error.clone() }
                        }
                    }
                },
                "/{id}": {
                    "get": {
                        "summary": "Get one author",
                        "tags": ["Authors"],
                        "parameters": id_param.clone(),
                        "responses": {
                            "200": {
                                "description": "Author with books",
                                "content": {
                                    "application/json": {
                                        "schema": { "$ref": "#/components/schemas/Author" }
                                    }
                                }
                            },
                            "404": { "description": "Author not found", "content": error.clone() }
                        }
                    },
                    "delete": {
                        "summary": "Delete an author and all of their books",
                        "tags": ["Authors"],
                        "security": [{ "bearerAuth": [] }],
                        "parameters": id_param,
                        "responses": {
                            "204": { "description": "Author deleted" },
                            "403": { "description": "ROLE_ADMIN required", "content": error.clone() },
                            "404": { "description": "Author not found", "content": error }
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "Author": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "integer" },
                            "firstName": { "type": "string" },
                            "lastName": { "type": "string" },
                            "books": {
                                "type": "array",
                                "items": {
                                    "type": "object",
                                    "properties": {
                                        "id": { "type": "integer" },
                                        "title": { "type": "string" },
                                        "coverText": { "type": ["string", "null"] }
                                    }
                                }
                            }
                        },
                        "required": ["id", "firstName", "lastName", "books"]
                    },
                    "AuthorPayload": {
                        "type": "object",
                        "properties": {
                            "firstName": { "type": "string", "minLength": 1, "maxLength": 255 },
                            "lastName": { "type": "string", "minLength": 1, "maxLength": 255 }
                        },
                        "required": ["firstName", "lastName"]
                    }
                }
            }
        }))
    }

    fn migrations(&self) -> Vec<Migration> {
        vec![Migration {
            id: "001_init",
            up: r#"
                CREATE TABLE authors (
                    id         INTEGER PRIMARY KEY AUTOINCREMENT,
                    first_name TEXT NOT NULL,
                    last_name  TEXT NOT NULL
                );
                "#,
        }]
    }
}

/// Create a new instance of the authors module
pub fn create_module() -> std::sync::Arc<dyn Module> {
    std::sync::Arc::new(AuthorsModule::new())
}
