//! API-key authentication for the `/api/*` surface, the request-scoped
//! correlation-id middleware that feeds the skill dispatcher's context, and
//! the incoming-request logger (`logIncomingRequests`).

use std::time::Instant;

use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use uuid::Uuid;

use crate::skill::RequestContext;

use super::AppState;

const REQUEST_ID_HEADER: &str = "x-request-id";
const CORRELATION_ID_HEADER: &str = "x-correlation-id";

/// Enforces an API key for every request whose path starts with `/api/`.
/// The key may arrive as the `apiKey` query parameter, checked first, or as
/// an `Authorization: Bearer <key>` header.
pub async fn api_key_auth(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    if !req.uri().path().starts_with("/api/") {
        return next.run(req).await;
    }

    let authorized = match query_param(req.uri().query().unwrap_or(""), "apiKey") {
        Some(key) => key == state.config.api_key,
        None => req
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .is_some_and(|key| key == state.config.api_key),
    };

    if authorized {
        next.run(req).await
    } else {
        unauthorized()
    }
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        axum::Json(serde_json::json!({"status": "error", "message": "Unauthorized"})),
    )
        .into_response()
}

/// Attaches a request id (generated if absent) and a correlation id (echoed
/// from the inbound header if present, generated otherwise) both as response
/// headers and as a `RequestContext` extension the skill handler forwards
/// into the dispatcher.
pub async fn request_context(mut req: Request<Body>, next: Next) -> Response {
    let request_id = header_value(&req, REQUEST_ID_HEADER).unwrap_or_else(|| Uuid::new_v4().to_string());
    let correlation_id =
        header_value(&req, CORRELATION_ID_HEADER).unwrap_or_else(|| request_id.clone());

    req.extensions_mut().insert(RequestContext {
        request_id: request_id.clone(),
        correlation_id: correlation_id.clone(),
    });

    let mut response = next.run(req).await;
    if let Ok(v) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, v);
    }
    if let Ok(v) = HeaderValue::from_str(&correlation_id) {
        response.headers_mut().insert(CORRELATION_ID_HEADER, v);
    }
    response
}

/// Logs every inbound HTTP request and its outcome when
/// `logIncomingRequests` is set; a no-op pass-through otherwise. Uses
/// key=value pairs when `logStructured` is set, a plain sentence otherwise.
pub async fn request_logging(State(state): State<AppState>, req: Request<Body>, next: Next) -> Response {
    if !state.config.log_incoming_requests {
        return next.run(req).await;
    }

    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let started = Instant::now();
    let response = next.run(req).await;
    let status = response.status().as_u16();
    let elapsed_ms = started.elapsed().as_millis();

    if state.config.log_structured {
        log::info!(
            "[Api] method={method} path={path} status={status} elapsed_ms={elapsed_ms}"
        );
    } else {
        log::info!("[Api] {method} {path} -> {status} ({elapsed_ms}ms)");
    }

    response
}

fn header_value(req: &Request<Body>, name: &str) -> Option<String> {
    req.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// Hand-rolled so the auth middleware doesn't need a query-extraction crate
/// for a single, known-simple parameter.
fn query_param(query: &str, key: &str) -> Option<String> {
    query.split('&').find_map(|pair| {
        let mut parts = pair.splitn(2, '=');
        let k = parts.next()?;
        if k != key {
            return None;
        }
        Some(percent_decode(parts.next().unwrap_or("")))
    })
}

fn percent_decode(value: &str) -> String {
    let bytes = value.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => {
                out.push(b' ');
                i += 1;
            }
            b'%' if i + 2 < bytes.len() => {
                let hex = std::str::from_utf8(&bytes[i + 1..i + 3]).ok();
                match hex.and_then(|h| u8::from_str_radix(h, 16).ok()) {
                    Some(byte) => {
                        out.push(byte);
                        i += 3;
                    }
                    None => {
                        out.push(bytes[i]);
                        i += 1;
                    }
                }
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_param_finds_exact_key() {
        assert_eq!(
            query_param("apiKey=abc123&other=1", "apiKey"),
            Some("abc123".to_string())
        );
    }

    #[test]
    fn query_param_decodes_percent_escapes() {
        assert_eq!(
            query_param("apiKey=a%20b%2Bc", "apiKey"),
            Some("a b+c".to_string())
        );
    }

    #[test]
    fn query_param_absent_returns_none() {
        assert_eq!(query_param("other=1", "apiKey"), None);
    }
}
