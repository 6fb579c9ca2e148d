//! Demo data: two accounts, ten authors and twenty books.

use anyhow::Context;
use bookshelf_authz::{password::hash_password, Role};
use bookshelf_kernel::Services;

use crate::modules::books::BOOKS_CACHE_TAG;

pub const USER_EMAIL: &str = "user@bookapi.com";
pub const ADMIN_EMAIL: &str = "admin@bookapi.com";
pub const DEFAULT_PASSWORD: &str = "password";

const AUTHOR_COUNT: usize = 10;
const BOOK_COUNT: usize = 20;

/// Rows written by [`load`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixtureSummary {
    pub users: usize,
    pub authors: usize,
    pub books: usize,
}

/// Replace the contents of every table with the demo data set.
///
/// Existing rows are purged and id sequences reset, so authors are numbered
/// 1 to 10 and books 1 to 20. Book `i` belongs to author `(i - 1) % 10 + 1`.
pub async fn load(services: &Services) -> anyhow::Result<FixtureSummary> {
    let password_hash = tokio::task::spawn_blocking(|| hash_password(DEFAULT_PASSWORD))
        .await
        .context("password hashing task failed")?
        .context("failed to hash fixture password")?;

    let mut tx = services.db.begin().await?;

    sqlx::raw_sql(
        "DELETE FROM books;
         DELETE FROM authors;
         DELETE FROM users;
         DELETE FROM sqlite_sequence WHERE name IN ('books', 'authors', 'users');",
    )
    .execute(&mut *tx)
    .await
    .context("failed to purge existing data")?;

    let accounts = [(USER_EMAIL, vec![Role::User]), (ADMIN_EMAIL, vec![Role::Admin])];
    for (email, roles) in &accounts {
        let roles = serde_json::to_string(roles).context("failed to encode roles")?;
        sqlx::query("INSERT INTO users (email, roles, password_hash) VALUES (?, ?, ?)")
            .bind(email)
            .bind(roles)
            .bind(&password_hash)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("failed to insert user '{email}'"))?;
    }

    let mut author_ids = Vec::with_capacity(AUTHOR_COUNT);
    for i in 0..AUTHOR_COUNT {
        let result = sqlx::query("INSERT INTO authors (first_name, last_name) VALUES (?, ?)")
            .bind(format!("Prénom {i}"))
            .bind(format!("Nom {i}"))
            .execute(&mut *tx)
            .await
            .context("failed to insert author")?;
        author_ids.push(result.last_insert_rowid());
    }

    for i in 0..BOOK_COUNT {
        sqlx::query("INSERT INTO books (title, cover_text, author_id) VALUES (?, ?, ?)")
            .bind(format!("Titre {i}"))
            .bind(format!("Quatrième de couverture numéro : {i}"))
            .bind(author_ids[i % author_ids.len()])
            .execute(&mut *tx)
            .await
            .context("failed to insert book")?;
    }

    tx.commit().await.context("failed to commit fixtures")?;
    services.cache.invalidate_tags(&[BOOKS_CACHE_TAG]).await?;

    let summary = FixtureSummary {
        users: accounts.len(),
        authors: author_ids.len(),
        books: BOOK_COUNT,
    };
    tracing::info!(?summary, "fixtures loaded");
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::App;
    use crate::modules::books::repository::BookRepository;
    use crate::modules::users::repository::UserRepository;
    use bookshelf_kernel::Settings;

    #[tokio::test]
    async fn load_twice_leaves_one_data_set() {
        let app = App::bootstrap(Settings::in_memory()).await.unwrap();

        load(&app.services).await.unwrap();
        let summary = load(&app.services).await.unwrap();

        assert_eq!(
            summary,
            FixtureSummary {
                users: 2,
                authors: 10,
                books: 20
            }
        );
        let books = BookRepository::new(app.services.db.clone());
        assert_eq!(books.count().await.unwrap(), 20);

        let first = books.find(1).await.unwrap().unwrap();
        assert_eq!(first.title, "Titre 0");
        assert_eq!(first.author.map(|author| author.id), Some(1));
        let eleventh = books.find(11).await.unwrap().unwrap();
        assert_eq!(eleventh.author.map(|author| author.last_name), Some("Nom 0".to_string()));
    }

    #[tokio::test]
    async fn admin_account_carries_admin_role() {
        let app = App::bootstrap(Settings::in_memory()).await.unwrap();
        load(&app.services).await.unwrap();

        let admin = UserRepository::new(app.services.db.clone())
            .find_by_email(ADMIN_EMAIL)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(admin.roles(), vec![Role::User, Role::Admin]);
    }
}
