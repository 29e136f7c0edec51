//! Mapping of domain errors onto HTTP responses.
//!
//! Bodies are plain text. Client-side failures carry the domain message
//! verbatim; infrastructure failures are logged and answered generically.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::error;

use crate::domain::{DomainError, ErrorKind};

#[derive(Debug)]
pub struct ApiError(pub DomainError);

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        Self(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self.0.kind() {
            ErrorKind::Input | ErrorKind::Conflict => StatusCode::BAD_REQUEST,
            ErrorKind::Auth => StatusCode::UNAUTHORIZED,
            ErrorKind::Infrastructure => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!(error = %self.0, "Request failed");
            return (status, "internal server error").into_response();
        }
        (status, self.0.to_string()).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
