//! Project-specific helpers shared by the modules.

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use bookshelf_http::AppError;

/// Respond with a body that is already serialized JSON.
pub fn raw_json(status: StatusCode, body: String) -> Response {
    (status, [(header::CONTENT_TYPE, "application/json")], body).into_response()
}

/// Turn a body that failed to deserialize into the standard error shape.
pub fn reject_body(rejection: JsonRejection) -> AppError {
    AppError::bad_request(rejection.body_text())
}

/// Same for a query string that does not match the expected parameters.
pub fn reject_query(rejection: QueryRejection) -> AppError {
    AppError::bad_request(rejection.body_text())
}

pub fn reject_path(rejection: PathRejection) -> AppError {
    AppError::bad_request(rejection.body_text())
}
