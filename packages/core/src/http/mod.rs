//! HTTP transport (C1): a thin, testable wrapper around the real HTTP client
//! that the vendor client builds on.

mod cookie_jar;
mod transport;

pub use cookie_jar::SharedCookieJar;
pub use transport::ReqwestTransport;

use crate::error::HttpError;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// An ordered, duplicate-tolerant list of header `(name, value)` pairs.
/// Order matters for some of the vendor login steps.
pub type HeaderList = Vec<(String, String)>;

/// The outcome of a non-redirect-following request.
#[derive(Debug, Clone)]
pub struct Response {
    pub status: u16,
    pub body: String,
    pub redirect_location: String,
}

/// Everything the vendor client needs from an HTTP layer. Expressed as a
/// trait (object-safe, so it can be shared behind `Arc<dyn HttpTransport>`)
/// so login/retry logic can be tested against a fake implementation.
///
/// `rest_get`/`rest_post` operate on `serde_json::Value` rather than generic
/// types so the trait stays object-safe; typed (de)serialization happens at
/// the call site in `vendor::client`.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn simple_get(&self, url: &str, headers: &HeaderList) -> Result<Response, HttpError>;

    async fn simple_post(
        &self,
        url: &str,
        headers: &HeaderList,
        form: &[(String, String)],
    ) -> Result<Response, HttpError>;

    async fn rest_get(&self, url: &str, headers: &HeaderList) -> Result<Value, HttpError>;

    async fn rest_post(
        &self,
        url: &str,
        headers: &HeaderList,
        body: &Value,
    ) -> Result<Value, HttpError>;

    /// Returns the cookies currently held for `url`, as `(name, value)` pairs.
    fn cookies_for(&self, url: &str) -> Vec<(String, String)>;

    /// Replaces whichever cookies are scoped to `url` with `cookies`.
    fn set_cookies_for(&self, url: &str, cookies: &[(String, String)]);

    /// Drops every stored cookie.
    fn reset_cookie_jar(&self);
}

pub type SharedTransport = Arc<dyn HttpTransport>;
