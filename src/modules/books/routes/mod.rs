use anyhow::Context;
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use bookshelf_http::{AdminUser, AppError};
use bookshelf_kernel::{Services, Validate};
use serde::Deserialize;

use super::models::{BookDraft, BookPayload, BookView};
use super::repository::BookRepository;
use super::BOOKS_CACHE_TAG;
use crate::modules::authors::repository::AuthorRepository;
use crate::utils;

/// Optional pagination window for the book list.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Pagination {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl Pagination {
    /// `(page, limit)` when both are given and non-zero.
    pub fn window(&self) -> Option<(u32, u32)> {
        match (self.page, self.limit) {
            (Some(page), Some(limit)) if page > 0 && limit > 0 => Some((page, limit)),
            _ => None,
        }
    }

    pub fn cache_key(&self) -> String {
        match self.window() {
            Some((page, limit)) => format!("books_list_page{page}_limit{limit}"),
            None => "books_list_all".to_string(),
        }
    }
}

fn detail_cache_key(id: i64) -> String {
    format!("book_{id}")
}

fn book_not_found(id: i64) -> AppError {
    AppError::not_found(format!("Book {id} not found"))
}

/// Look up `id_author`, yielding `None` when absent or unknown.
async fn resolve_author(services: &Services, id_author: Option<i64>) -> anyhow::Result<Option<i64>> {
    let Some(id) = id_author else {
        return Ok(None);
    };
    let author = AuthorRepository::new(services.db.clone()).find(id).await?;
    if author.is_none() {
        tracing::info!(author_id = id, "unknown author id, book left without author");
    }
    Ok(author.map(|author| author.id))
}

async fn invalidate_books(services: &Services) -> Result<(), AppError> {
    let removed = services.cache.invalidate_tags(&[BOOKS_CACHE_TAG]).await?;
    tracing::debug!(removed, "book cache invalidated");
    Ok(())
}

/// List books, optionally one page at a time
pub async fn list_books(
    State(services): State<Services>,
    pagination: Result<Query<Pagination>, QueryRejection>,
) -> Result<Response, AppError> {
    let Query(pagination) = pagination.map_err(utils::reject_query)?;
    let repo = BookRepository::new(services.db.clone());

    let body = services
        .cache
        .get_or_try_insert_with(&pagination.cache_key(), &[BOOKS_CACHE_TAG], || async {
            let books = match pagination.window() {
                Some((page, limit)) => repo.find_all_with_pagination(page, limit).await?,
                None => repo.find_all().await?,
            };
            let views: Vec<BookView> = books.iter().map(BookView::from).collect();
            serde_json::to_string(&views)
                .context("failed to serialize book list")
                .map_err(AppError::from)
        })
        .await?;

    Ok(utils::raw_json(StatusCode::OK, body))
}

/// Fetch one book with its author
pub async fn get_book(
    State(services): State<Services>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Response, AppError> {
    let Path(id) = id.map_err(utils::reject_path)?;
    let repo = BookRepository::new(services.db.clone());

    let body = services
        .cache
        .get_or_try_insert_with(&detail_cache_key(id), &[BOOKS_CACHE_TAG], || async {
            let book = repo.find(id).await?.ok_or_else(|| book_not_found(id))?;
            serde_json::to_string(&BookView::from(&book))
                .context("failed to serialize book")
                .map_err(AppError::from)
        })
        .await?;

    Ok(utils::raw_json(StatusCode::OK, body))
}

/// Create a book
pub async fn create_book(
    State(services): State<Services>,
    AdminUser(claims): AdminUser,
    payload: Result<Json<BookPayload>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(payload) = payload.map_err(utils::reject_body)?;

    let mut draft = BookDraft::from_payload(&payload);
    draft.validate()?;
    draft.author_id = resolve_author(&services, payload.id_author).await?;

    let repo = BookRepository::new(services.db.clone());
    let id = repo.insert(&draft).await?;
    invalidate_books(&services).await?;

    let book = repo
        .find(id)
        .await?
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("book {id} vanished after insert")))?;

    tracing::info!(book_id = id, author_id = ?draft.author_id, by = %claims.sub, "book created");

    let location = format!("/api/books/{id}");
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(BookView::from(&book)),
    )
        .into_response())
}

/// Replace a book's title, cover text and author
pub async fn update_book(
    State(services): State<Services>,
    AdminUser(claims): AdminUser,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<BookPayload>, JsonRejection>,
) -> Result<StatusCode, AppError> {
    let Path(id) = id.map_err(utils::reject_path)?;
    let Json(payload) = payload.map_err(utils::reject_body)?;

    let repo = BookRepository::new(services.db.clone());
    let current = repo.find(id).await?.ok_or_else(|| book_not_found(id))?;

    // Validate the final state; nothing is written when it fails.
    let mut draft = BookDraft::apply(&current, &payload);
    draft.validate()?;
    draft.author_id = resolve_author(&services, payload.id_author).await?;

    if !repo.update(id, &draft).await? {
        return Err(book_not_found(id));
    }
    invalidate_books(&services).await?;

    tracing::info!(book_id = id, author_id = ?draft.author_id, by = %claims.sub, "book updated");
    Ok(StatusCode::NO_CONTENT)
}

/// Delete a book
pub async fn delete_book(
    State(services): State<Services>,
    AdminUser(claims): AdminUser,
    id: Result<Path<i64>, PathRejection>,
) -> Result<StatusCode, AppError> {
    let Path(id) = id.map_err(utils::reject_path)?;
    let repo = BookRepository::new(services.db.clone());
    if !repo.delete(id).await? {
        return Err(book_not_found(id));
    }
    invalidate_books(&services).await?;

    tracing::info!(book_id = id, by = %claims.sub, "book deleted");
    Ok(StatusCode::NO_CONTENT)
}
