//! Runtime configuration for the bridge.

use serde::Deserialize;

/// Every configuration key recognized by the bridge, settable via CLI flag or
/// `NA_`-prefixed environment variable (the CLI layer in `apps/server` owns
/// the actual flag/env wiring; this struct is the value both funnel into).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub amazon_domain: String,
    pub amazon_user: String,
    pub amazon_password: String,
    pub amazon_cookie_path: String,
    pub api_key: String,
    pub stream_domain: String,
    pub alexa_skill_id: String,
    pub alexa_skill_name: String,
    pub listen_address: String,
    pub log_incoming_requests: bool,
    pub log_outgoing_requests: bool,
    pub log_structured: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            amazon_domain: "amazon.com".to_string(),
            amazon_user: String::new(),
            amazon_password: String::new(),
            amazon_cookie_path: "cookies.data".to_string(),
            api_key: String::new(),
            stream_domain: String::new(),
            alexa_skill_id: String::new(),
            alexa_skill_name: "navi stream".to_string(),
            listen_address: ":8080".to_string(),
            log_incoming_requests: false,
            log_outgoing_requests: false,
            log_structured: false,
        }
    }
}

impl Config {
    /// Checks that the fields with no sensible default are present.
    pub fn validate(&self) -> Result<(), String> {
        if self.api_key.is_empty() {
            return Err("apiKey is required".to_string());
        }
        if self.stream_domain.is_empty() {
            return Err("streamDomain is required".to_string());
        }
        if self.alexa_skill_id.is_empty() {
            return Err("alexaSkillId is required".to_string());
        }
        Ok(())
    }
}
