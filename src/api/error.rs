//! Error responses shared by every handler

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::Error;

pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A required parameter is missing or malformed
    BadRequest,
    /// A named team, list or member does not exist
    NotFound,
    /// The store failed
    Internal,
}

impl ErrorKind {
    pub fn status(self) -> StatusCode {
        match self {
            ErrorKind::BadRequest => StatusCode::BAD_REQUEST,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// A failed request, rendered as a plain-text body
#[derive(Debug, Clone)]
pub struct ApiError {
    pub kind: ErrorKind,
    pub message: String,
    pub detail: Option<String>,
}

impl ApiError {
    pub fn new(kind: ErrorKind, message: impl Into<String>, detail: Option<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            detail,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::BadRequest, message, None)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message, None)
    }

    /// Map a store failure while `action` (e.g. "adding team") was running
    pub fn store(action: &str, err: Error) -> Self {
        match err {
            Error::DocumentNotFound(_) => Self::not_found("Document not found"),
            Error::InvalidDocumentId(msg) => Self::bad_request(format!("Invalid name: {}", msg)),
            other => Self::new(
                ErrorKind::Internal,
                format!("Error {}", action),
                Some(other.to_string()),
            ),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.kind.status()
    }

    /// The response body text
    pub fn body(&self) -> String {
        match &self.detail {
            Some(detail) => format!("{}: {}", self.message, detail),
            None => self.message.clone(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = self.body();
        match self.kind {
            ErrorKind::Internal => tracing::error!(error = %body, "Request failed"),
            _ => tracing::debug!(status = %self.status(), error = %body, "Request rejected"),
        }
        (self.status(), body).into_response()
    }
}
