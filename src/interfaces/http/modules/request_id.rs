//! Request correlation
//!
//! Every request runs inside an `http_request` span tagged with the service
//! name and an `X-Request-Id`. Reservation and auth logs emitted while the
//! request is handled inherit both fields, so a conflict logged by the
//! booking service can be traced back to the caller's ID.

use axum::{
    body::Body,
    extract::State,
    http::{HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use tracing::Instrument;
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Longest caller-supplied ID that is propagated as is.
const MAX_REQUEST_ID_LEN: usize = 128;

/// Correlation ID of the current request, stored in request extensions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestId(pub String);

/// Caller's ID when it is a short, printable token; otherwise `None`.
fn incoming_id(request: &Request<Body>) -> Option<String> {
    let raw = request.headers().get(REQUEST_ID_HEADER)?.to_str().ok()?;
    let id = raw.trim();
    let printable = id.bytes().all(|b| b.is_ascii_graphic());
    (!id.is_empty() && id.len() <= MAX_REQUEST_ID_LEN && printable).then(|| id.to_string())
}

pub async fn request_id_middleware(
    State(service): State<&'static str>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let request_id = incoming_id(&request).unwrap_or_else(|| Uuid::new_v4().to_string());
    request
        .extensions_mut()
        .insert(RequestId(request_id.clone()));

    let span = tracing::info_span!(
        "http_request",
        service,
        request_id = %request_id,
        method = %request.method(),
        path = %request.uri().path(),
        status = tracing::field::Empty,
    );

    let mut response = next.run(request).instrument(span.clone()).await;
    span.record("status", response.status().as_u16());

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{middleware, routing::get, Extension, Router};
    use tower::ServiceExt;

    fn app() -> Router {
        Router::new()
            .route(
                "/echo",
                get(|Extension(id): Extension<RequestId>| async move { id.0 }),
            )
            .layer(middleware::from_fn_with_state("booking", request_id_middleware))
    }

    async fn call(header: Option<&str>) -> (String, String) {
        let mut req = Request::builder().uri("/echo");
        if let Some(value) = header {
            req = req.header(REQUEST_ID_HEADER, value);
        }
        let resp = app().oneshot(req.body(Body::empty()).unwrap()).await.unwrap();
        let echoed = resp.headers()[REQUEST_ID_HEADER].to_str().unwrap().to_string();
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (echoed, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_caller_id_is_propagated() {
        let (echoed, seen) = call(Some("trace-123")).await;
        assert_eq!(echoed, "trace-123");
        assert_eq!(seen, "trace-123");
    }

    #[tokio::test]
    async fn test_missing_or_oversized_id_is_replaced() {
        let (echoed, seen) = call(None).await;
        assert!(Uuid::parse_str(&echoed).is_ok());
        assert_eq!(echoed, seen);

        let long = "x".repeat(MAX_REQUEST_ID_LEN + 1);
        let (echoed, _) = call(Some(&long)).await;
        assert_ne!(echoed, long);
        assert!(Uuid::parse_str(&echoed).is_ok());
    }
}
