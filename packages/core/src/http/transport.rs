use super::cookie_jar::SharedCookieJar;
use super::{HeaderList, HttpTransport, Response};
use crate::error::HttpError;
use async_trait::async_trait;
use reqwest::redirect::Policy;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// The real `HttpTransport`, built on `reqwest`. Redirects are never
/// followed automatically so the caller can observe the final `Location`
/// header (the login step relies on this to confirm success or to surface a
/// captcha/device-verification redirect).
pub struct ReqwestTransport {
    client: reqwest::Client,
    jar: Arc<SharedCookieJar>,
    log_outgoing: bool,
}

impl ReqwestTransport {
    /// Builds a transport with a fresh cookie jar. Outgoing requests are not
    /// logged; use [`ReqwestTransport::with_logging`] to opt in.
    #[must_use]
    pub fn new() -> Self {
        Self::with_logging(false)
    }

    /// Builds a transport with a fresh cookie jar, logging every outgoing
    /// request and its outcome (including errors) when `log_outgoing` is set
    /// (`logOutgoingRequests` in the bridge configuration).
    #[must_use]
    pub fn with_logging(log_outgoing: bool) -> Self {
        let jar = SharedCookieJar::new();
        let client = reqwest::Client::builder()
            .cookie_provider(jar.clone())
            .redirect(Policy::none())
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .expect("reqwest client configuration is always valid");
        Self {
            client,
            jar,
            log_outgoing,
        }
    }

    fn apply_headers(
        mut builder: reqwest::RequestBuilder,
        headers: &HeaderList,
    ) -> reqwest::RequestBuilder {
        for (key, value) in headers {
            builder = builder.header(key, value);
        }
        builder
    }

    async fn send(
        &self,
        method: &str,
        url: &str,
        builder: reqwest::RequestBuilder,
    ) -> Result<Response, HttpError> {
        if self.log_outgoing {
            log::debug!("[Http] -> {method} {url}");
        }
        let result = self.send_inner(builder).await;
        if self.log_outgoing {
            match &result {
                Ok(resp) => log::debug!("[Http] <- {method} {url} status={}", resp.status),
                Err(e) => log::warn!("[Http] <- {method} {url} error={e}"),
            }
        }
        result
    }

    async fn send_inner(&self, builder: reqwest::RequestBuilder) -> Result<Response, HttpError> {
        let resp = builder.send().await?;
        let status = resp.status().as_u16();
        let redirect_location = resp
            .headers()
            .get(reqwest::header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        if status >= 400 {
            return Err(HttpError::Status {
                status,
                message: resp.status().canonical_reason().unwrap_or("").to_string(),
            });
        }
        let body = resp.text().await?;
        Ok(Response {
            status,
            body,
            redirect_location,
        })
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn simple_get(&self, url: &str, headers: &HeaderList) -> Result<Response, HttpError> {
        let builder = Self::apply_headers(self.client.get(url), headers);
        self.send("GET", url, builder).await
    }

    async fn simple_post(
        &self,
        url: &str,
        headers: &HeaderList,
        form: &[(String, String)],
    ) -> Result<Response, HttpError> {
        let builder = Self::apply_headers(self.client.post(url), headers).form(form);
        self.send("POST", url, builder).await
    }

    async fn rest_get(&self, url: &str, headers: &HeaderList) -> Result<Value, HttpError> {
        let resp = self.simple_get(url, headers).await?;
        serde_json::from_str(&resp.body).map_err(|e| HttpError::Decode(e.to_string()))
    }

    async fn rest_post(
        &self,
        url: &str,
        headers: &HeaderList,
        body: &Value,
    ) -> Result<Value, HttpError> {
        let builder = Self::apply_headers(self.client.post(url), headers).json(body);
        let resp = self.send("POST", url, builder).await?;
        if resp.body.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&resp.body).map_err(|e| HttpError::Decode(e.to_string()))
    }

    fn cookies_for(&self, url: &str) -> Vec<(String, String)> {
        self.jar.cookies_for(url)
    }

    fn set_cookies_for(&self, url: &str, cookies: &[(String, String)]) {
        self.jar.set_cookies_for(url, cookies);
    }

    fn reset_cookie_jar(&self) {
        self.jar.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_transport_builds() {
        let _t = ReqwestTransport::new();
    }
}
