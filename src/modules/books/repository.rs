use anyhow::Context;
use bookshelf_db::Db;

use super::models::{Book, BookDraft, BookRow};

const SELECT_BOOKS: &str = "
    SELECT b.id, b.title, b.cover_text,
           a.id AS author_id, a.first_name AS author_first_name, a.last_name AS author_last_name
    FROM books b
    LEFT JOIN authors a ON a.id = b.author_id";

/// Query helper for the `books` table.
#[derive(Clone)]
pub struct BookRepository {
    db: Db,
}

impl BookRepository {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    pub async fn find(&self, id: i64) -> anyhow::Result<Option<Book>> {
        let row = sqlx::query_as::<_, BookRow>(&format!("{SELECT_BOOKS} WHERE b.id = ?"))
            .bind(id)
            .fetch_optional(&self.db)
            .await
            .with_context(|| format!("failed to load book {id}"))?;
        Ok(row.map(Book::from))
    }

    pub async fn find_all(&self) -> anyhow::Result<Vec<Book>> {
        let rows = sqlx::query_as::<_, BookRow>(&format!("{SELECT_BOOKS} ORDER BY b.id"))
            .fetch_all(&self.db)
            .await
            .with_context(|| "failed to list books")?;
        Ok(rows.into_iter().map(Book::from).collect())
    }

    /// `limit` books starting at `(page - 1) * limit`, in store order.
    ///
    /// `page` and `limit` must both be at least 1.
    pub async fn find_all_with_pagination(&self, page: u32, limit: u32) -> anyhow::Result<Vec<Book>> {
        let offset = (i64::from(page) - 1) * i64::from(limit);
        let rows = sqlx::query_as::<_, BookRow>(&format!("{SELECT_BOOKS} ORDER BY b.id LIMIT ? OFFSET ?"))
            .bind(i64::from(limit))
            .bind(offset)
            .fetch_all(&self.db)
            .await
            .with_context(|| format!("failed to list books page {page} (limit {limit})"))?;
        Ok(rows.into_iter().map(Book::from).collect())
    }

    #[cfg(test)]
    pub async fn count(&self) -> anyhow::Result<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM books")
            .fetch_one(&self.db)
            .await
            .with_context(|| "failed to count books")?;
        Ok(count)
    }

    pub async fn insert(&self, draft: &BookDraft) -> anyhow::Result<i64> {
        let result = sqlx::query("INSERT INTO books (title, cover_text, author_id) VALUES (?, ?, ?)")
            .bind(&draft.title)
            .bind(&draft.cover_text)
            .bind(draft.author_id)
            .execute(&self.db)
            .await
            .with_context(|| "failed to insert book")?;
        Ok(result.last_insert_rowid())
    }

    pub async fn update(&self, id: i64, draft: &BookDraft) -> anyhow::Result<bool> {
        let result = sqlx::query("UPDATE books SET title = ?, cover_text = ?, author_id = ? WHERE id = ?")
            .bind(&draft.title)
            .bind(&draft.cover_text)
            .bind(draft.author_id)
            .bind(id)
            .execute(&self.db)
            .await
            .with_context(|| format!("failed to update book {id}"))?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn delete(&self, id: i64) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM books WHERE id = ?")
            .bind(id)
            .execute(&self.db)
            .await
            .with_context(|| format!("failed to delete book {id}"))?;
        Ok(result.rows_affected() > 0)
    }
}
