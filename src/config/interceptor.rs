use reqwest::Url;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::Error;

const MAX_FALLBACK_SECS: i64 = 365 * 24 * 60 * 60;
const MAX_REFRESH_LIFETIME_DAYS: i64 = 3650;

/// Names of the headers the interceptor reads from responses.
///
/// Lookups are case-insensitive, so the casing here is cosmetic.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
#[serde(default)]
pub struct HeaderNames {
    pub access_token: String,
    pub refresh_token: String,
    pub front_token: String,
    pub session_id: String,
}

impl Default for HeaderNames {
    fn default() -> Self {
        Self {
            access_token: "st-access-token".to_string(),
            refresh_token: "st-refresh-token".to_string(),
            front_token: "front-token".to_string(),
            session_id: "x-session_id".to_string(),
        }
    }
}

/// Settings for the request interceptor and its response processor.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
#[serde(default)]
pub struct InterceptorConfig {
    /// Origin the application itself is served from, e.g. `http://localhost:3000`.
    pub app_origin: String,
    /// Absolute origins of backends that should receive credentials.
    pub backend_origins: Vec<String>,
    /// Path prefixes on `app_origin` that receive credentials.
    pub api_prefixes: Vec<String>,
    /// Backend requests containing this path never receive credentials.
    pub sign_in_path: String,
    /// A 401 from a URL containing any of these is not treated as a logout.
    pub auth_endpoint_patterns: Vec<String>,
    /// Where to send the user after an unauthorized response.
    pub login_path: String,
    pub redirect_delay_ms: u64,
    /// Lifetime assumed for an access token whose expiry cannot be decoded.
    pub access_token_fallback_secs: i64,
    pub refresh_token_lifetime_days: i64,
    /// Header carrying the session id on outbound requests.
    pub session_header: String,
    pub headers: HeaderNames,
}

impl Default for InterceptorConfig {
    fn default() -> Self {
        Self {
            app_origin: "http://localhost:3000".to_string(),
            backend_origins: Vec::new(),
            api_prefixes: vec!["/api/".to_string()],
            sign_in_path: "/api/auth/signin".to_string(),
            auth_endpoint_patterns: vec![
                "/api/auth/".to_string(),
                "/auth/".to_string(),
                "signin".to_string(),
                "signup".to_string(),
            ],
            login_path: "/auth".to_string(),
            redirect_delay_ms: 100,
            access_token_fallback_secs: 3600,
            refresh_token_lifetime_days: 30,
            session_header: "x-session_id".to_string(),
            headers: HeaderNames::default(),
        }
    }
}

impl InterceptorConfig {
    /// Checks that origins parse and that the lists the scope rules depend on
    /// are usable.
    pub fn validate(&self) -> Result<(), Error> {
        parse_origin(&self.app_origin)?;
        for origin in &self.backend_origins {
            parse_origin(origin)?;
        }
        if self.api_prefixes.iter().all(|p| p.is_empty()) {
            return Err(Error::Config(
                "interceptor.api_prefixes must contain at least one non-empty prefix".into(),
            ));
        }
        if self.login_path.is_empty() {
            return Err(Error::Config("interceptor.login_path must not be empty".into()));
        }
        if !(1..=MAX_FALLBACK_SECS).contains(&self.access_token_fallback_secs) {
            return Err(Error::Config(format!(
                "interceptor.access_token_fallback_secs must be between 1 and {}, got {}",
                MAX_FALLBACK_SECS, self.access_token_fallback_secs
            )));
        }
        if !(1..=MAX_REFRESH_LIFETIME_DAYS).contains(&self.refresh_token_lifetime_days) {
            return Err(Error::Config(format!(
                "interceptor.refresh_token_lifetime_days must be between 1 and {}, got {}",
                MAX_REFRESH_LIFETIME_DAYS, self.refresh_token_lifetime_days
            )));
        }
        if http::HeaderName::from_bytes(self.session_header.as_bytes()).is_err() {
            return Err(Error::Config(format!(
                "interceptor.session_header '{}' is not a valid header name",
                self.session_header
            )));
        }
        Ok(())
    }
}

/// Parses an origin string, rejecting anything that is not an absolute http(s) URL.
pub(crate) fn parse_origin(origin: &str) -> Result<Url, Error> {
    let url = Url::parse(origin)
        .map_err(|e| Error::Config(format!("invalid origin '{}': {}", origin, e)))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(Error::Config(format!(
            "origin '{}' has unsupported scheme '{}'",
            origin, other
        ))),
    }
}
