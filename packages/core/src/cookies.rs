//! Cookie persistence and login-form scraping (C2).

use crate::http::HttpTransport;
use regex::Regex;
use std::path::PathBuf;
use std::sync::OnceLock;

fn form_extractor() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?s)<form[^>]+name="signIn"[^>]*>(.*?)</form>"#)
            .expect("form extractor regex is valid")
    })
}

fn form_input_extractor() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"name="([^"]+)".*?value="([^"]+)""#).expect("input extractor regex is valid")
    })
}

/// Persists and reloads the vendor session's cookies, and scrapes the
/// login-form HTML for its hidden inputs. One instance per configured
/// cookie file path.
pub struct CookieHelper {
    file_path: PathBuf,
}

impl CookieHelper {
    #[must_use]
    pub fn new(file_path: impl Into<PathBuf>) -> Self {
        Self {
            file_path: file_path.into(),
        }
    }

    #[must_use]
    pub fn cookies_saved(&self) -> bool {
        match std::fs::metadata(&self.file_path) {
            Ok(meta) => !meta.is_dir(),
            Err(_) => false,
        }
    }

    /// Writes every cookie scoped to `https://{base_domain}/` as one
    /// `name=value` line. Attributes are not preserved.
    pub fn save_cookies(
        &self,
        transport: &dyn HttpTransport,
        base_domain: &str,
    ) -> std::io::Result<()> {
        let url = format!("https://{base_domain}/");
        let cookies = transport.cookies_for(&url);
        let mut contents = String::new();
        for (name, value) in cookies {
            contents.push_str(&name);
            contents.push('=');
            contents.push_str(&value);
            contents.push('\n');
        }
        std::fs::write(&self.file_path, contents)
    }

    /// Loads cookies from disk and installs them scoped to
    /// `https://alexa.{base_domain}/`.
    pub fn load_cookies(
        &self,
        transport: &dyn HttpTransport,
        base_domain: &str,
    ) -> std::io::Result<()> {
        let contents = std::fs::read_to_string(&self.file_path)?;
        let pairs: Vec<(String, String)> = contents
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .filter_map(|line| {
                let (name, value) = line.split_once('=')?;
                Some((name.to_string(), value.to_string()))
            })
            .collect();
        let url = format!("https://alexa.{base_domain}/");
        transport.set_cookies_for(&url, &pairs);
        Ok(())
    }

    /// Returns the `csrf` cookie's value scoped to `https://alexa.{base_domain}/`,
    /// or an empty string if absent. Matching is case-insensitive on the name,
    /// matching the upstream's own inconsistency in casing across releases.
    #[must_use]
    pub fn extract_csrf(&self, transport: &dyn HttpTransport, base_domain: &str) -> String {
        let url = format!("https://alexa.{base_domain}/");
        transport
            .cookies_for(&url)
            .into_iter()
            .find(|(name, _)| name.eq_ignore_ascii_case("csrf"))
            .map(|(_, value)| value)
            .unwrap_or_default()
    }

    /// Returns the first `<form name="signIn">...</form>` block, or empty if
    /// none is present.
    #[must_use]
    pub fn extract_login_form(page_html: &str) -> String {
        form_extractor()
            .find(page_html)
            .map(|m| m.as_str().to_string())
            .unwrap_or_default()
    }

    /// Extracts every `name="X" ... value="Y"` pair from a form's HTML.
    #[must_use]
    pub fn extract_login_form_inputs(form_html: &str) -> Vec<(String, String)> {
        form_input_extractor()
            .captures_iter(form_html)
            .map(|c| (c[1].to_string(), c[2].to_string()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_signin_form() {
        let page = r#"<html><body><form action="/x" name="signIn" method="post"><input type="hidden" name="a" value="1"></form></body></html>"#;
        let form = CookieHelper::extract_login_form(page);
        assert!(form.contains(r#"name="signIn""#));
        assert!(form.ends_with("</form>"));
    }

    #[test]
    fn extracts_form_inputs() {
        let form = r#"<form name="signIn"><input type="hidden" name="appActionToken" value="A1"><input type="hidden" name="openid.pape.max_auth_age" value="0"></form>"#;
        let inputs = CookieHelper::extract_login_form_inputs(form);
        assert_eq!(inputs.len(), 2);
        assert_eq!(inputs[0], ("appActionToken".to_string(), "A1".to_string()));
    }

    #[test]
    fn missing_form_returns_empty() {
        assert_eq!(CookieHelper::extract_login_form("<html></html>"), "");
    }

    #[test]
    fn cookies_saved_false_when_missing() {
        let helper = CookieHelper::new("/nonexistent/path/cookies.data");
        assert!(!helper.cookies_saved());
    }

    #[test]
    fn save_then_load_round_trips() {
        use crate::http::ReqwestTransport;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cookies.data");
        let helper = CookieHelper::new(&path);
        let transport = ReqwestTransport::new();
        transport.set_cookies_for(
            "https://example.com/",
            &[("session".to_string(), "abc".to_string())],
        );
        helper.save_cookies(&transport, "example.com").unwrap();
        assert!(helper.cookies_saved());

        let transport2 = ReqwestTransport::new();
        helper.load_cookies(&transport2, "example.com").unwrap();
        let cookies = transport2.cookies_for("https://alexa.example.com/");
        assert!(cookies.contains(&("session".to_string(), "abc".to_string())));
    }
}
