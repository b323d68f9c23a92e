use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::models::MovieId;

/// Application-level errors
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    /// Query references an unknown movie, is empty, or carries an out-of-range rating
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// k < 1 or an unsupported method
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Catalog or rating history failed a structural check at load time
    #[error("Data integrity error: {0}")]
    DataIntegrity(String),

    /// An estimator was handed a movie its model has no row for
    #[error("Unknown item: movie {0} is not part of the estimator model")]
    UnknownItem(MovieId),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::InvalidQuery(_) | AppError::InvalidArgument(_) => {
                (StatusCode::BAD_REQUEST, self.to_string())
            }
            AppError::DataIntegrity(_)
            | AppError::UnknownItem(_)
            | AppError::Csv(_)
            | AppError::Io(_)
            | AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()),
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (AppError::InvalidQuery("empty".into()), StatusCode::BAD_REQUEST),
            (AppError::InvalidArgument("k".into()), StatusCode::BAD_REQUEST),
            (AppError::NotFound("movie 1".into()), StatusCode::NOT_FOUND),
            (AppError::UnknownItem(7), StatusCode::INTERNAL_SERVER_ERROR),
            (
                AppError::DataIntegrity("dup".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }

    #[test]
    fn test_unknown_item_message_names_movie() {
        let err = AppError::UnknownItem(42);
        assert!(err.to_string().contains("movie 42"));
    }
}
