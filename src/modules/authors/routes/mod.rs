use std::collections::HashMap;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use bookshelf_http::{AdminUser, AppError};
use bookshelf_kernel::{Services, Validate};

use super::models::{AuthorBook, AuthorPayload, AuthorView};
use super::repository::AuthorRepository;
use crate::modules::books::BOOKS_CACHE_TAG;
use crate::utils;

/// List every author with their books
pub async fn list_authors(State(services): State<Services>) -> Result<Json<Vec<AuthorView>>, AppError> {
    let repo = AuthorRepository::new(services.db.clone());
    let authors = repo.find_all().await?;

    let mut books_by_author: HashMap<i64, Vec<AuthorBook>> = HashMap::new();
    for book in repo.all_authored_books().await? {
        books_by_author.entry(book.author_id).or_default().push(book);
    }

    let views = authors
        .into_iter()
        .map(|author| {
            let books = books_by_author.remove(&author.id).unwrap_or_default();
            AuthorView::new(author, books)
        })
        .collect();

    Ok(Json(views))
}

/// Fetch one author with their books
pub async fn get_author(
    State(services): State<Services>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<AuthorView>, AppError> {
    let Path(id) = id.map_err(utils::reject_path)?;
    let repo = AuthorRepository::new(services.db.clone());
    let author = repo
        .find(id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Author {id} not found")))?;
    let books = repo.books_of(author.id).await?;

    Ok(Json(AuthorView::new(author, books)))
}

/// Create an author
pub async fn create_author(
    State(services): State<Services>,
    AdminUser(claims): AdminUser,
    payload: Result<Json<AuthorPayload>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(payload) = payload.map_err(utils::reject_body)?;
    payload.validate()?;

    let repo = AuthorRepository::new(services.db.clone());
    let id = repo.insert(&payload).await?;
    let author = repo
        .find(id)
        .await?
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("author {id} vanished after insert")))?;

    tracing::info!(author_id = id, by = %claims.sub, "author created");

    let location = format!("/api/authors/{id}");
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(AuthorView::new(author, Vec::new())),
    )
        .into_response())
}

/// Delete an author together with all of their books
pub async fn delete_author(
    State(services): State<Services>,
    AdminUser(claims): AdminUser,
    id: Result<Path<i64>, PathRejection>,
) -> Result<StatusCode, AppError> {
    let Path(id) = id.map_err(utils::reject_path)?;
    let repo = AuthorRepository::new(services.db.clone());
    if !repo.delete(id).await? {
        return Err(AppError::not_found(format!("Author {id} not found")));
    }

    // The cascade removed books, so every cached book read is stale.
    services.cache.invalidate_tags(&[BOOKS_CACHE_TAG]).await?;

    tracing::info!(author_id = id, by = %claims.sub, "author deleted");
    Ok(StatusCode::NO_CONTENT)
}
