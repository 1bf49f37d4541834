//! 模拟平台错误
//!
//! 错误响应体与平台保持一致：`{"errors": [{"category", "code", "detail"}]}`。

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum MockError {
    #[error("{0} not found: {1}")]
    NotFound(&'static str, String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Card declined.")]
    CardDeclined,

    #[error("This request could not be authorized.")]
    Unauthorized,
}

impl MockError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(..) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::CardDeclined => StatusCode::PAYMENT_REQUIRED,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
        }
    }

    fn category_and_code(&self) -> (&'static str, &'static str) {
        match self {
            Self::NotFound(..) => ("INVALID_REQUEST_ERROR", "NOT_FOUND"),
            Self::BadRequest(_) => ("INVALID_REQUEST_ERROR", "BAD_REQUEST"),
            Self::Conflict(_) => ("INVALID_REQUEST_ERROR", "CONFLICT"),
            Self::CardDeclined => ("PAYMENT_METHOD_ERROR", "CARD_DECLINED"),
            Self::Unauthorized => ("AUTHENTICATION_ERROR", "UNAUTHORIZED"),
        }
    }
}

impl IntoResponse for MockError {
    fn into_response(self) -> Response {
        let (category, code) = self.category_and_code();
        let body = json!({
            "errors": [{
                "category": category,
                "code": code,
                "detail": self.to_string(),
            }]
        });
        (self.status_code(), axum::Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, MockError>;
