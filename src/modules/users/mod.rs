pub mod models;
pub mod repository;
pub mod routes;

use async_trait::async_trait;
use axum::{
    routing::{get, post},
    Router,
};
use bookshelf_kernel::{InitCtx, Migration, Module};
use serde_json::json;

/// Users module: accounts and token login
pub struct UsersModule;

impl UsersModule {
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Module for UsersModule {
    fn name(&self) -> &'static str {
        "users"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            token_ttl_secs = ctx.settings.auth.token_ttl_secs,
            "users module initialized"
        );
        Ok(())
    }

    fn routes(&self, ctx: &InitCtx<'_>) -> Router {
        Router::new()
            .route("/login", post(routes::login))
            .route("/me", get(routes::me))
            .with_state(ctx.services.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        let error = json!({
            "application/json": { "schema": { "$ref": "#/components/schemas/ErrorResponse" } }
        });

        Some(json!({
            "paths": {
                "/login": {
                    "post": {
                        "summary": "Log in and receive a bearer token",
                        "tags": ["Users"],
                        "requestBody": {
                            "required": true,
                            "content": {
                                "application/json": {
                                    "schema": {
                                        "type": "object",
                                        "properties": {
                                            "username": { "type": "string", "format": "email" },
                                            "password": { "type": "string" }
                                        },
                                        "required": ["username", "password"]
                                    }
                                }
                            }
                        },
                        "responses": {
                            "200": {
                                "description": "Access token",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "type": "object",
                                            "properties": { "token": { "type": "string" } },
                                            "required": ["token"]
                                        }
                                    }
                                }
                            },
                            "401": { "description": "Invalid credentials", "content": error.clone() }
                        }
                    }
                },
                "/me": {
                    "get": {
                        "summary": "Current account",
                        "tags": ["Users"],
                        "security": [{ "bearerAuth": [] }],
                        "responses": {
                            "200": {
                                "description": "The authenticated user",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "type": "object",
                                            "properties": {
                                                "id": { "type": "integer" },
                                                "email": { "type": "string" },
                                                "roles": { "type": "array", "items": { "type": "string" } }
                                            }
                                        }
                                    }
                                }
                            },
                            "401": { "description": "Missing or invalid token", "content": error }
                        }
                    }
                }
            }
        }))
    }

    fn migrations(&self) -> Vec<Migration> {
        vec![Migration {
            id: "001_init",
            up: r#"
                CREATE TABLE users (
                    id            INTEGER PRIMARY KEY AUTOINCREMENT,
                    email         TEXT NOT NULL UNIQUE,
                    roles         TEXT NOT NULL DEFAULT '[]',
                    password_hash TEXT NOT NULL
                );
                "#,
        }]
    }
}

/// Create a new instance of the users module
pub fn create_module() -> std::sync::Arc<dyn Module> {
    std::sync::Arc::new(UsersModule::new())
}
