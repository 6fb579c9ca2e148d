use bookshelf_kernel::{Validate, ValidationErrors, Validator};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Stored author record.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Author {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
}

/// Book as listed under its author, without the author reference.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorBook {
    pub id: i64,
    pub title: String,
    pub cover_text: Option<String>,
    #[serde(skip)]
    pub author_id: i64,
}

/// Author projection for the authors endpoints, books included.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorView {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub books: Vec<AuthorBook>,
}

impl AuthorView {
    pub fn new(author: Author, books: Vec<AuthorBook>) -> Self {
        Self {
            id: author.id,
            first_name: author.first_name,
            last_name: author.last_name,
            books,
        }
    }
}

/// Author projection nested inside a book; never carries the book list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorSummary {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
}

impl From<&Author> for AuthorSummary {
    fn from(author: &Author) -> Self {
        Self {
            id: author.id,
            first_name: author.first_name.clone(),
            last_name: author.last_name.clone(),
        }
    }
}

/// Request body for creating an author.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorPayload {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

impl Validate for AuthorPayload {
    fn validate(&self) -> Result<(), ValidationErrors> {
        Validator::new()
            .not_blank("firstName", &self.first_name, "The first name is required")
            .length("firstName", &self.first_name, 1, 255)
            .not_blank("lastName", &self.last_name, "The last name is required")
            .length("lastName", &self.last_name, 1, 255)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_serializes_camel_case() {
        let author = Author {
            id: 3,
            first_name: "Virginia".to_string(),
            last_name: "Woolf".to_string(),
        };

        let json = serde_json::to_value(AuthorSummary::from(&author)).unwrap();

        assert_eq!(
            json,
            serde_json::json!({"id": 3, "firstName": "Virginia", "lastName": "Woolf"})
        );
    }

    #[test]
    fn view_books_omit_author_reference() {
        let author = Author {
            id: 1,
            first_name: "A".to_string(),
            last_name: "B".to_string(),
        };
        let book = AuthorBook {
            id: 7,
            title: "Orlando".to_string(),
            cover_text: None,
            author_id: 1,
        };

        let json = serde_json::to_value(AuthorView::new(author, vec![book])).unwrap();

        assert_eq!(
            json["books"][0],
            serde_json::json!({"id": 7, "title": "Orlando", "coverText": null})
        );
    }

    #[test]
    fn payload_requires_both_names() {
        let payload: AuthorPayload = serde_json::from_str(r#"{"firstName": "Virginia"}"#).unwrap();

        let errors = payload.validate().unwrap_err();

        assert!(errors.has_field("lastName"));
        assert!(!errors.has_field("firstName"));
    }
}
