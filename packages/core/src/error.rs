//! Error types shared across the bridge.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// Gives an error kind a stable, machine-readable code for API responses,
/// independent of the human-readable `Display` message.
pub trait ErrorCode {
    fn code(&self) -> &'static str;
}

/// Why a login attempt failed to complete.
#[derive(Debug, thiserror::Error)]
pub enum LoginError {
    #[error("amazon user/password not configured and no saved session exists")]
    MissingCredentials,
    #[error("failed to fetch the login form: {0}")]
    LoginFormFetchFailed(String),
    #[error("login step 1 failed: {0}")]
    LoginStep1Failed(String),
    #[error("login step 2 failed, redirected to {0}")]
    LoginStep2Failed(String),
    #[error("csrf cookie missing after login")]
    MissingCsrf,
}

impl ErrorCode for LoginError {
    fn code(&self) -> &'static str {
        match self {
            Self::MissingCredentials => "missing_credentials",
            Self::LoginFormFetchFailed(_) => "login_form_fetch_failed",
            Self::LoginStep1Failed(_) => "login_step1_failed",
            Self::LoginStep2Failed(_) => "login_step2_failed",
            Self::MissingCsrf => "missing_csrf",
        }
    }
}

/// Error surfaced by the HTTP transport layer (C1).
#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    #[error("http transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("http status {status}: {message}")]
    Status { status: u16, message: String },
    #[error("failed to decode response body: {0}")]
    Decode(String),
}

impl HttpError {
    /// True iff this failure is an upstream authentication rejection (401).
    #[must_use]
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, Self::Status { status: 401, .. })
    }
}

impl ErrorCode for HttpError {
    fn code(&self) -> &'static str {
        match self {
            Self::Transport(_) => "upstream_transport_error",
            Self::Status { .. } => "upstream_status_error",
            Self::Decode(_) => "upstream_decode_error",
        }
    }
}

/// Top-level error type returned by core operations and surfaced over the REST
/// and skill HTTP boundaries.
#[derive(Debug, thiserror::Error, Serialize)]
#[serde(tag = "type", content = "message")]
pub enum BridgeError {
    #[error("invalid request body: {0}")]
    ParseError(String),

    #[error("upstream authentication failed: {0}")]
    #[serde(skip)]
    AuthError(#[source] HttpErrorWrapper),

    #[error("upstream request failed: {0}")]
    #[serde(skip)]
    UpstreamError(#[source] HttpErrorWrapper),

    #[error("login failed: {0}")]
    #[serde(skip)]
    LoginFailure(#[source] LoginError),

    #[error("skill id does not match configured application id")]
    SkillAuthError,

    #[error("{0}")]
    NotFound(String),
}

/// Newtype so `HttpError` (which doesn't implement `Serialize`) can live
/// inside a `Serialize` enum behind `#[serde(skip)]`.
#[derive(Debug)]
pub struct HttpErrorWrapper(pub HttpError);

impl std::fmt::Display for HttpErrorWrapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
impl std::error::Error for HttpErrorWrapper {}

impl From<HttpError> for BridgeError {
    fn from(e: HttpError) -> Self {
        if e.is_auth_failure() {
            Self::AuthError(HttpErrorWrapper(e))
        } else {
            Self::UpstreamError(HttpErrorWrapper(e))
        }
    }
}

impl From<LoginError> for BridgeError {
    fn from(e: LoginError) -> Self {
        Self::LoginFailure(e)
    }
}

impl From<serde_json::Error> for BridgeError {
    fn from(e: serde_json::Error) -> Self {
        Self::ParseError(e.to_string())
    }
}

impl ErrorCode for BridgeError {
    fn code(&self) -> &'static str {
        match self {
            Self::ParseError(_) => "parse_error",
            Self::AuthError(_) => "auth_error",
            Self::UpstreamError(_) => "upstream_error",
            Self::LoginFailure(e) => e.code(),
            Self::SkillAuthError => "skill_auth_error",
            Self::NotFound(_) => "not_found",
        }
    }
}

impl BridgeError {
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::ParseError(_) => StatusCode::BAD_REQUEST,
            Self::AuthError(_) | Self::UpstreamError(_) | Self::LoginFailure(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::SkillAuthError => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }
}

impl IntoResponse for BridgeError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();
        let body = serde_json::json!({
            "status": "error",
            "message": self.to_string(),
        });
        let mut response = (status, axum::Json(body)).into_response();
        if let Ok(value) = axum::http::HeaderValue::from_str(code) {
            response.headers_mut().insert("x-error-code", value);
        }
        response
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;
