//! SQLite pool factory and migration runner.

use std::str::FromStr;

use anyhow::Context;
use serde::Deserialize;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

/// Shared connection pool handed to modules.
pub type Db = SqlitePool;

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    #[serde(default = "DatabaseSettings::default_url")]
    pub url: String,
    #[serde(default = "DatabaseSettings::default_max_connections")]
    pub max_connections: u32,
}

impl DatabaseSettings {
    fn default_url() -> String {
        "sqlite://bookshelf.db".to_string()
    }

    fn default_max_connections() -> u32 {
        5
    }

    /// Whether the URL points at a private in-memory database.
    pub fn is_in_memory(&self) -> bool {
        self.url.contains(":memory:") || self.url.contains("mode=memory")
    }
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: Self::default_url(),
            max_connections: Self::default_max_connections(),
        }
    }
}

/// Migration definition contributed by a module.
#[derive(Debug, Clone)]
pub struct Migration {
    pub id: &'static str,
    pub up: &'static str,
}

/// Open a connection pool with foreign keys enforced.
pub async fn connect(settings: &DatabaseSettings) -> anyhow::Result<Db> {
    let options = SqliteConnectOptions::from_str(&settings.url)
        .with_context(|| format!("invalid database url '{}'", settings.url))?
        .create_if_missing(true)
        .foreign_keys(true);

    // An in-memory database lives and dies with its connection, so keep
    // exactly one and never recycle it.
    let pool_options = if settings.is_in_memory() {
        SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new().max_connections(settings.max_connections)
    };

    let pool = pool_options
        .connect_with(options)
        .await
        .with_context(|| "failed to open database pool")?;

    tracing::info!(target: "bookshelf-db", url = %settings.url, "database pool ready");
    Ok(pool)
}

/// Apply pending migrations in the given order, recording each applied id.
///
/// Migrations are keyed by `(module, id)`; already applied entries are skipped,
/// so running this repeatedly is safe.
pub async fn run_migrations(db: &Db, migrations: &[(String, Migration)]) -> anyhow::Result<usize> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS _migrations (
            module     TEXT NOT NULL,
            id         TEXT NOT NULL,
            applied_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            PRIMARY KEY (module, id)
        )",
    )
    .execute(db)
    .await
    .with_context(|| "failed to create migrations table")?;

    let mut applied = 0;
    for (module, migration) in migrations {
        let seen: Option<(String,)> =
            sqlx::query_as("SELECT id FROM _migrations WHERE module = ? AND id = ?")
                .bind(module)
                .bind(migration.id)
                .fetch_optional(db)
                .await
                .with_context(|| format!("failed to read migration state for '{module}'"))?;
        if seen.is_some() {
            continue;
        }

        let mut tx = db.begin().await?;
        sqlx::raw_sql(migration.up)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("migration {module}/{} failed", migration.id))?;
        sqlx::query("INSERT INTO _migrations (module, id) VALUES (?, ?)")
            .bind(module)
            .bind(migration.id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        tracing::info!(target: "bookshelf-db", module = %module, migration = migration.id, "migration applied");
        applied += 1;
    }

    Ok(applied)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory() -> DatabaseSettings {
        DatabaseSettings {
            url: "sqlite::memory:".to_string(),
            max_connections: 5,
        }
    }

    fn migrations() -> Vec<(String, Migration)> {
        vec![
            (
                "parents".to_string(),
                Migration {
                    id: "001_init",
                    up: "CREATE TABLE parent (id INTEGER PRIMARY KEY);",
                },
            ),
            (
                "children".to_string(),
                Migration {
                    id: "001_init",
                    up: "CREATE TABLE child (
                        id INTEGER PRIMARY KEY,
                        parent_id INTEGER NOT NULL REFERENCES parent(id) ON DELETE CASCADE
                    );",
                },
            ),
        ]
    }

    #[test]
    fn default_url_is_a_file_database() {
        let settings = DatabaseSettings::default();
        assert_eq!(settings.url, "sqlite://bookshelf.db");
        assert!(!settings.is_in_memory());
        assert!(memory().is_in_memory());
    }

    #[tokio::test]
    async fn migrations_apply_once() {
        let db = connect(&memory()).await.unwrap();

        assert_eq!(run_migrations(&db, &migrations()).await.unwrap(), 2);
        assert_eq!(run_migrations(&db, &migrations()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn foreign_keys_cascade() {
        let db = connect(&memory()).await.unwrap();
        run_migrations(&db, &migrations()).await.unwrap();

        sqlx::query("INSERT INTO parent (id) VALUES (1)")
            .execute(&db)
            .await
            .unwrap();
        sqlx::query("INSERT INTO child (id, parent_id) VALUES (1, 1), (2, 1)")
            .execute(&db)
            .await
            .unwrap();
        sqlx::query("DELETE FROM parent WHERE id = 1")
            .execute(&db)
            .await
            .unwrap();

        let (remaining,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM child")
            .fetch_one(&db)
            .await
            .unwrap();
        assert_eq!(remaining, 0);
    }
}
