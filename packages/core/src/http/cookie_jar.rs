use parking_lot::RwLock;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::HeaderValue;
use reqwest::Url;
use std::sync::Arc;

/// A `reqwest::cookie::CookieStore` that can be reset and inspected, unlike
/// a bare `reqwest::cookie::Jar`: logging back in after a 401 needs to throw
/// the old session away, and the login/CSRF flow needs to read cookies back
/// out rather than just replaying them on outbound requests.
pub struct SharedCookieJar {
    inner: RwLock<Jar>,
}

impl Default for SharedCookieJar {
    fn default() -> Self {
        Self {
            inner: RwLock::new(Jar::default()),
        }
    }
}

impl SharedCookieJar {
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    #[must_use]
    pub fn cookies_for(&self, url: &str) -> Vec<(String, String)> {
        let Ok(url) = Url::parse(url) else {
            return Vec::new();
        };
        let Some(header) = self.inner.read().cookies(&url) else {
            return Vec::new();
        };
        let Ok(text) = header.to_str() else {
            return Vec::new();
        };
        text.split(';')
            .filter_map(|pair| {
                let pair = pair.trim();
                let (name, value) = pair.split_once('=')?;
                Some((name.trim().to_string(), value.trim().to_string()))
            })
            .collect()
    }

    pub fn set_cookies_for(&self, url: &str, cookies: &[(String, String)]) {
        let Ok(parsed) = Url::parse(url) else {
            return;
        };
        let guard = self.inner.read();
        for (name, value) in cookies {
            let raw = format!("{name}={value}");
            guard.add_cookie_str(&raw, &parsed);
        }
    }

    /// Drops every cookie, used before a forced re-login.
    pub fn reset(&self) {
        *self.inner.write() = Jar::default();
    }
}

impl CookieStore for SharedCookieJar {
    fn set_cookies(
        &self,
        cookie_headers: &mut dyn Iterator<Item = &HeaderValue>,
        url: &Url,
    ) {
        self.inner.read().set_cookies(cookie_headers, url);
    }

    fn cookies(&self, url: &Url) -> Option<HeaderValue> {
        self.inner.read().cookies(url)
    }
}
