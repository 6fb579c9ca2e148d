use anyhow::Context;
use bookshelf_db::Db;

use super::models::{Author, AuthorBook, AuthorPayload};

/// Query helper for the `authors` table.
#[derive(Clone)]
pub struct AuthorRepository {
    db: Db,
}

impl AuthorRepository {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    pub async fn find(&self, id: i64) -> anyhow::Result<Option<Author>> {
        sqlx::query_as::<_, Author>(
            "SELECT id, first_name, last_name FROM authors WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .with_context(|| format!("failed to load author {id}"))
    }

    pub async fn find_all(&self) -> anyhow::Result<Vec<Author>> {
        sqlx::query_as::<_, Author>("SELECT id, first_name, last_name FROM authors ORDER BY id")
            .fetch_all(&self.db)
            .await
            .with_context(|| "failed to list authors")
    }

    /// Books of the given author, in store order.
    pub async fn books_of(&self, author_id: i64) -> anyhow::Result<Vec<AuthorBook>> {
        sqlx::query_as::<_, AuthorBook>(
            "SELECT id, title, cover_text, author_id FROM books WHERE author_id = ? ORDER BY id",
        )
        .bind(author_id)
        .fetch_all(&self.db)
        .await
        .with_context(|| format!("failed to list books of author {author_id}"))
    }

    /// Every book that has an author, in store order.
    pub async fn all_authored_books(&self) -> anyhow::Result<Vec<AuthorBook>> {
        sqlx::query_as::<_, AuthorBook>(
            "SELECT id, title, cover_text, author_id FROM books
             WHERE author_id IS NOT NULL ORDER BY id",
        )
        .fetch_all(&self.db)
        .await
        .with_context(|| "failed to list authored books")
    }

    pub async fn insert(&self, payload: &AuthorPayload) -> anyhow::Result<i64> {
        let result = sqlx::query("INSERT INTO authors (first_name, last_name) VALUES (?, ?)")
            .bind(&payload.first_name)
            .bind(&payload.last_name)
            .execute(&self.db)
            .await
            .with_context(|| "failed to insert author")?;
        Ok(result.last_insert_rowid())
    }

    /// Delete an author; the store removes its books with it.
    pub async fn delete(&self, id: i64) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM authors WHERE id = ?")
            .bind(id)
            .execute(&self.db)
            .await
            .with_context(|| format!("failed to delete author {id}"))?;
        Ok(result.rows_affected() > 0)
    }
}
