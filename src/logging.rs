//! Middleware for logging requests and responses.

use axum::{
    body::{Body, Bytes},
    extract::Request,
    http::{StatusCode, request, response},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::Value;

use crate::endpoints;

/// The number of bytes of a body that are logged at the `info` level.
pub const LOG_BODY_LENGTH_LIMIT: usize = 64;

/// JSON fields whose values are replaced before a body is logged.
const REDACTED_FIELDS: [&str; 1] = ["ssn"];

const REDACTED_TEXT: &str = "********";

/// Routes whose bodies are never logged unless they can be parsed and redacted.
const SENSITIVE_ROUTES: [&str; 1] = [endpoints::RETIREMENT_SSN];

const UNPARSED_SENSITIVE_BODY: &str = "<body not logged>";

/// Log the request and response for each request.
///
/// Both the request and response are logged at the `info` level.
/// If a body is longer than [LOG_BODY_LENGTH_LIMIT] bytes, it is
/// truncated and the full body is logged at the `debug` level.
/// Social security numbers in JSON bodies are redacted, whatever the
/// content type header says, and bodies of the Social Security routes that
/// are not valid JSON are left out.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();
    let path = parts.uri.path().to_owned();
    let body_bytes = match read_body(body).await {
        Ok(bytes) => bytes,
        Err(error) => {
            tracing::warn!("Could not read request body: {error}");
            return StatusCode::BAD_REQUEST.into_response();
        }
    };

    let body_text = loggable_text(&path, &body_bytes);
    log_request(&parts, &body_text);

    let request = Request::from_parts(parts, Body::from(body_bytes));
    let response = next.run(request).await;

    let (parts, body) = response.into_parts();
    let body_bytes = match read_body(body).await {
        Ok(bytes) => bytes,
        Err(error) => {
            tracing::error!("Could not read response body: {error}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let body_text = loggable_text(&path, &body_bytes);
    log_response(&parts, &body_text);

    Response::from_parts(parts, Body::from(body_bytes))
}

async fn read_body(body: Body) -> Result<Bytes, axum::Error> {
    axum::body::to_bytes(body, usize::MAX).await
}

/// The body of a request to or response from `path` as text with sensitive
/// JSON fields redacted.
fn loggable_text(path: &str, body: &[u8]) -> String {
    if body.is_empty() {
        return String::new();
    }

    if let Ok(mut json) = serde_json::from_slice::<Value>(body) {
        redact_fields(&mut json);
        return json.to_string();
    }

    if is_sensitive_route(path) {
        return UNPARSED_SENSITIVE_BODY.to_owned();
    }

    String::from_utf8_lossy(body).to_string()
}

fn is_sensitive_route(path: &str) -> bool {
    SENSITIVE_ROUTES.iter().any(|route| {
        path.strip_prefix(route)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
    })
}

fn redact_fields(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, field) in map.iter_mut() {
                if REDACTED_FIELDS.contains(&key.as_str()) {
                    *field = Value::String(REDACTED_TEXT.to_owned());
                } else {
                    redact_fields(field);
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(redact_fields),
        _ => {}
    }
}

/// The longest prefix of `body` that is at most [LOG_BODY_LENGTH_LIMIT] bytes
/// and ends on a character boundary.
fn truncate(body: &str) -> &str {
    let end = (0..=LOG_BODY_LENGTH_LIMIT)
        .rev()
        .find(|&index| body.is_char_boundary(index))
        .unwrap_or(0);

    &body[..end]
}

fn log_request(parts: &request::Parts, body: &str) {
    if body.len() > LOG_BODY_LENGTH_LIMIT {
        tracing::info!(
            "Received request: {} {}\nbody: {}...",
            parts.method,
            parts.uri,
            truncate(body)
        );
        tracing::debug!("Full request body: {body:?}");
    } else {
        tracing::info!(
            "Received request: {} {}\nbody: {body:?}",
            parts.method,
            parts.uri
        );
    }
}

fn log_response(parts: &response::Parts, body: &str) {
    if body.len() > LOG_BODY_LENGTH_LIMIT {
        tracing::info!(
            "Sending response: {}\nbody: {}...",
            parts.status,
            truncate(body)
        );
        tracing::debug!("Full response body: {body:?}");
    } else {
        tracing::info!("Sending response: {}\nbody: {body:?}", parts.status);
    }
}
