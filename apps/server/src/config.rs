//! Command-line configuration for the bridge server.
//!
//! Recognizes exactly two channels: CLI flags and `NA_`-prefixed environment
//! variables (via `clap`'s `env` attribute on each flag), funneled directly
//! into the core `Config`.

use clap::Parser;
use na_bridge_core::Config;

/// na-bridge-server - bridges a playback queue to voice-assistant speakers.
#[derive(Parser, Debug)]
#[command(name = "na-bridge-server")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Base domain for vendor URLs.
    #[arg(long, env = "NA_AMAZON_DOMAIN", default_value = "amazon.com")]
    pub amazon_domain: String,

    /// Vendor account email, optional when a cookie file already exists.
    #[arg(long, env = "NA_AMAZON_USER", default_value = "")]
    pub amazon_user: String,

    /// Vendor account password, optional when a cookie file already exists.
    #[arg(long, env = "NA_AMAZON_PASSWORD", default_value = "")]
    pub amazon_password: String,

    /// Where cookies are persisted between runs.
    #[arg(long, env = "NA_AMAZON_COOKIE_PATH", default_value = "cookies.data")]
    pub amazon_cookie_path: String,

    /// API key required on every `/api/*` request.
    #[arg(long, env = "NA_API_KEY")]
    pub api_key: String,

    /// Public URL prefix prepended to each song's stream path.
    #[arg(long, env = "NA_STREAM_DOMAIN")]
    pub stream_domain: String,

    /// Expected `applicationId` on inbound `/skill` requests.
    #[arg(long, env = "NA_ALEXA_SKILL_ID")]
    pub alexa_skill_id: String,

    /// Verb prefix used in `Alexa.TextCommand` requests.
    #[arg(long, env = "NA_ALEXA_SKILL_NAME", default_value = "navi stream")]
    pub alexa_skill_name: String,

    /// HTTP listen address.
    #[arg(long, env = "NA_LISTEN_ADDRESS", default_value = ":8080")]
    pub listen_address: String,

    /// Log every inbound HTTP request.
    #[arg(long, env = "NA_LOG_INCOMING_REQUESTS")]
    pub log_incoming_requests: bool,

    /// Log every outbound vendor HTTP request.
    #[arg(long, env = "NA_LOG_OUTGOING_REQUESTS")]
    pub log_outgoing_requests: bool,

    /// Emit structured (key=value) logs instead of `env_logger`'s default text format.
    #[arg(long, env = "NA_LOG_STRUCTURED")]
    pub log_structured: bool,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long, default_value = "info", env = "NA_LOG_LEVEL")]
    pub log_level: log::LevelFilter,
}

impl Args {
    /// Builds the core `Config` directly from parsed CLI args; there is no
    /// file format underneath to merge with.
    #[must_use]
    pub fn to_core_config(&self) -> Config {
        Config {
            amazon_domain: self.amazon_domain.clone(),
            amazon_user: self.amazon_user.clone(),
            amazon_password: self.amazon_password.clone(),
            amazon_cookie_path: self.amazon_cookie_path.clone(),
            api_key: self.api_key.clone(),
            stream_domain: self.stream_domain.clone(),
            alexa_skill_id: self.alexa_skill_id.clone(),
            alexa_skill_name: self.alexa_skill_name.clone(),
            listen_address: self.listen_address.clone(),
            log_incoming_requests: self.log_incoming_requests,
            log_outgoing_requests: self.log_outgoing_requests,
            log_structured: self.log_structured,
        }
    }
}
