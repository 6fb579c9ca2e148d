use bookshelf_kernel::{Validate, ValidationErrors, Validator};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::modules::authors::models::{Author, AuthorSummary};

pub const TITLE_MAX_LEN: usize = 255;

/// Stored book with its author resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub cover_text: Option<String>,
    pub author: Option<Author>,
}

/// Flat row of a book joined with its optional author.
#[derive(Debug, FromRow)]
pub(crate) struct BookRow {
    id: i64,
    title: String,
    cover_text: Option<String>,
    author_id: Option<i64>,
    author_first_name: Option<String>,
    author_last_name: Option<String>,
}

impl From<BookRow> for Book {
    fn from(row: BookRow) -> Self {
        let author = match (row.author_id, row.author_first_name, row.author_last_name) {
            (Some(id), Some(first_name), Some(last_name)) => Some(Author {
                id,
                first_name,
                last_name,
            }),
            _ => None,
        };
        Self {
            id: row.id,
            title: row.title,
            cover_text: row.cover_text,
            author,
        }
    }
}

/// Request body for creating or replacing a book.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookPayload {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub cover_text: Option<String>,
    /// Author to attach; an unknown id leaves the book without one.
    #[serde(default)]
    pub id_author: Option<i64>,
}

/// The state a book will be stored in, checked before anything is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookDraft {
    pub title: String,
    pub cover_text: Option<String>,
    pub author_id: Option<i64>,
}

impl BookDraft {
    /// Draft for a new book from a request body.
    pub fn from_payload(payload: &BookPayload) -> Self {
        Self {
            title: payload.title.clone(),
            cover_text: payload.cover_text.clone(),
            author_id: None,
        }
    }

    /// Draft of `current` with the scalar fields of `payload` copied over.
    pub fn apply(current: &Book, payload: &BookPayload) -> Self {
        Self {
            title: payload.title.clone(),
            cover_text: payload.cover_text.clone(),
            author_id: current.author.as_ref().map(|author| author.id),
        }
    }
}

impl Validate for BookDraft {
    fn validate(&self) -> Result<(), ValidationErrors> {
        Validator::new()
            .not_blank("title", &self.title, "The book title is required")
            .length("title", &self.title, 1, TITLE_MAX_LEN)
            .finish()
    }
}

/// Public projection of a book: the nested author never lists its books.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookView {
    pub id: i64,
    pub title: String,
    pub cover_text: Option<String>,
    pub author: Option<AuthorSummary>,
}

impl From<&Book> for BookView {
    fn from(book: &Book) -> Self {
        Self {
            id: book.id,
            title: book.title.clone(),
            cover_text: book.cover_text.clone(),
            author: book.author.as_ref().map(AuthorSummary::from),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book() -> Book {
        Book {
            id: 1,
            title: "Mrs Dalloway".to_string(),
            cover_text: Some("Clarissa sort acheter des fleurs".to_string()),
            author: Some(Author {
                id: 3,
                first_name: "Virginia".to_string(),
                last_name: "Woolf".to_string(),
            }),
        }
    }

    #[test]
    fn payload_reads_author_id_from_same_body() {
        let payload: BookPayload = serde_json::from_str(
            r#"{"title":"Une chambre à soi","coverText":"...","idAuthor":3}"#,
        )
        .unwrap();

        assert_eq!(payload.title, "Une chambre à soi");
        assert_eq!(payload.cover_text.as_deref(), Some("..."));
        assert_eq!(payload.id_author, Some(3));
    }

    #[test]
    fn missing_title_is_a_violation_not_a_parse_error() {
        let payload: BookPayload = serde_json::from_str(r#"{"coverText":"x"}"#).unwrap();

        let errors = BookDraft::from_payload(&payload).validate().unwrap_err();

        assert!(errors.has_field("title"));
        assert_eq!(errors.violations()[0].message, "The book title is required");
    }

    #[test]
    fn title_length_bounds() {
        let mut draft = BookDraft::from_payload(&BookPayload::default());

        draft.title = "a".repeat(TITLE_MAX_LEN);
        assert!(draft.validate().is_ok());

        draft.title = "a".repeat(300);
        let errors = draft.validate().unwrap_err();
        assert_eq!(errors.violations().len(), 1);
        assert_eq!(
            errors.violations()[0].message,
            "title must not exceed 255 characters"
        );
    }

    #[test]
    fn apply_copies_scalars_onto_current() {
        let payload = BookPayload {
            title: "Orlando".to_string(),
            cover_text: None,
            id_author: None,
        };

        let draft = BookDraft::apply(&book(), &payload);

        assert_eq!(draft.title, "Orlando");
        assert_eq!(draft.cover_text, None);
        assert_eq!(draft.author_id, Some(3));
    }

    #[test]
    fn view_nests_author_without_books() {
        let json = serde_json::to_value(BookView::from(&book())).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "id": 1,
                "title": "Mrs Dalloway",
                "coverText": "Clarissa sort acheter des fleurs",
                "author": {"id": 3, "firstName": "Virginia", "lastName": "Woolf"}
            })
        );
    }

    #[test]
    fn row_without_author_maps_to_none() {
        let row = BookRow {
            id: 2,
            title: "Titre 2".to_string(),
            cover_text: None,
            author_id: None,
            author_first_name: None,
            author_last_name: None,
        };

        assert_eq!(Book::from(row).author, None);
    }
}
