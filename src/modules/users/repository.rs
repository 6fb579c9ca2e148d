use anyhow::Context;
use bookshelf_authz::Role;
use bookshelf_db::Db;

use super::models::{User, UserRow};

/// Query helper for the `users` table.
#[derive(Clone)]
pub struct UserRepository {
    db: Db,
}

impl UserRepository {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    pub async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, email, roles, password_hash FROM users WHERE email = ?",
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await
        .with_context(|| format!("failed to load user '{email}'"))?;
        row.map(User::try_from).transpose()
    }

    /// Store a new account. `password_hash` must already be hashed.
    pub async fn insert(&self, email: &str, roles: &[Role], password_hash: &str) -> anyhow::Result<i64> {
        let roles = serde_json::to_string(roles).with_context(|| "failed to encode roles")?;
        let result = sqlx::query("INSERT INTO users (email, roles, password_hash) VALUES (?, ?, ?)")
            .bind(email)
            .bind(roles)
            .bind(password_hash)
            .execute(&self.db)
            .await
            .with_context(|| format!("failed to insert user '{email}'"))?;
        Ok(result.last_insert_rowid())
    }
}
