//! Validated JSON extractor for Axum
//!
//! `JsonBody<T>` deserializes the request body as JSON whatever the
//! `Content-Type` says, then runs `validator::Validate::validate()` on the
//! value. Both failures answer `400 Bad Request` with a plain-text reason.

use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::{FromRequest, Request};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::de::DeserializeOwned;
use validator::Validate;

/// An extractor that deserializes JSON and validates it.
///
/// ```ignore
/// #[derive(Deserialize, Validate)]
/// struct Credentials {
///     #[validate(length(min = 1, max = 64))]
///     username: String,
/// }
///
/// async fn handler(JsonBody(body): JsonBody<Credentials>) {
///     // `body` is guaranteed to pass validation
/// }
/// ```
pub struct JsonBody<T>(pub T);

/// Error type for `JsonBody` extraction failures.
#[derive(Debug)]
pub enum JsonBodyRejection {
    /// The body could not be read.
    Body(BytesRejection),
    /// JSON parsing failed.
    Json(serde_json::Error),
    /// Validation failed.
    Validation(validator::ValidationErrors),
}

fn describe(errors: &validator::ValidationErrors) -> String {
    let field_errors: Vec<String> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| {
                let msg = e
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| e.code.to_string());
                format!("{}: {}", field, msg)
            })
        })
        .collect();

    if field_errors.is_empty() {
        "validation failed".to_string()
    } else {
        field_errors.join("; ")
    }
}

impl IntoResponse for JsonBodyRejection {
    fn into_response(self) -> Response {
        let message = match self {
            Self::Body(rejection) => return rejection.into_response(),
            Self::Json(e) => format!("invalid JSON: {}", e),
            Self::Validation(errors) => describe(&errors),
        };
        (StatusCode::BAD_REQUEST, message).into_response()
    }
}

impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = JsonBodyRejection;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(JsonBodyRejection::Body)?;

        let value: T = serde_json::from_slice(&bytes).map_err(JsonBodyRejection::Json)?;
        value.validate().map_err(JsonBodyRejection::Validation)?;

        Ok(JsonBody(value))
    }
}

// ── Tests ──────────────────────────────────────────────────────
