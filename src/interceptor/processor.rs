use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use http::{HeaderMap, StatusCode};
use reqwest::Url;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::codec::{decode_expiry, decode_identity};
use crate::config::InterceptorConfig;
use crate::models::CredentialSet;
use crate::sinks::{IdentitySink, Navigator};
use crate::store::{EphemeralStorage, TokenStore};
use crate::utils::log_throttle::LogThrottle;

/// Ephemeral-storage key written on every full token rotation.
pub const JUST_LOGGED_IN_KEY: &str = "just_logged_in";

const DECODE_LOG_WINDOW: Duration = Duration::from_secs(30);

/// What a single pass over a response did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// A 401 from a non-auth endpoint: tokens were cleared.
    LoggedOut { redirect_scheduled: bool },
    /// A 401 from an auth endpoint; left alone so sign-in failures do not loop.
    AuthEndpointRejected,
    /// Both tokens arrived and the full set was replaced.
    Rotated { identity_published: bool },
    /// Only a new access token arrived.
    AccessTokenRenewed,
    Unchanged,
}

/// Reacts to response status and headers. Never fails and never touches the body.
pub struct ResponseProcessor {
    config: Arc<InterceptorConfig>,
    store: Arc<dyn TokenStore>,
    identity: Arc<dyn IdentitySink>,
    navigator: Arc<dyn Navigator>,
    ephemeral: Arc<dyn EphemeralStorage>,
    pending_redirect: Mutex<Option<JoinHandle<()>>>,
    throttle: LogThrottle,
}

impl ResponseProcessor {
    pub fn new(
        config: Arc<InterceptorConfig>,
        store: Arc<dyn TokenStore>,
        identity: Arc<dyn IdentitySink>,
        navigator: Arc<dyn Navigator>,
        ephemeral: Arc<dyn EphemeralStorage>,
    ) -> Self {
        Self {
            config,
            store,
            identity,
            navigator,
            ephemeral,
            pending_redirect: Mutex::new(None),
            throttle: LogThrottle::new(DECODE_LOG_WINDOW),
        }
    }

    pub fn process(&self, url: &Url, status: StatusCode, headers: &HeaderMap) -> ProcessOutcome {
        if status == StatusCode::UNAUTHORIZED {
            return self.handle_unauthorized(url);
        }
        self.handle_rotation(headers)
    }

    fn is_auth_endpoint(&self, url: &Url) -> bool {
        let url = url.as_str();
        self.config
            .auth_endpoint_patterns
            .iter()
            .any(|pattern| !pattern.is_empty() && url.contains(pattern.as_str()))
    }

    fn handle_unauthorized(&self, url: &Url) -> ProcessOutcome {
        if self.is_auth_endpoint(url) {
            debug!(
                event_name = "interceptor.unauthorized.auth_endpoint",
                event_domain = "interceptor",
                url = url.as_str(),
                "401 from auth endpoint, leaving tokens in place"
            );
            return ProcessOutcome::AuthEndpointRejected;
        }

        let location = self.navigator.current_location();
        warn!(
            event_name = "interceptor.unauthorized",
            event_domain = "interceptor",
            url = url.as_str(),
            location = location.as_str(),
            "401 Unauthorized received, clearing tokens"
        );
        self.store.clear_all_tokens();

        let redirect_scheduled = if location.contains(self.config.login_path.as_str()) {
            false
        } else {
            self.schedule_redirect()
        };
        ProcessOutcome::LoggedOut { redirect_scheduled }
    }

    /// Navigates to the login path after the configured delay, so state
    /// updates from the current call settle first. At most one redirect is
    /// pending at a time.
    fn schedule_redirect(&self) -> bool {
        let mut pending = self
            .pending_redirect
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if pending.as_ref().is_some_and(|handle| !handle.is_finished()) {
            return false;
        }

        let navigator = self.navigator.clone();
        let target = self.config.login_path.clone();
        let delay = Duration::from_millis(self.config.redirect_delay_ms);

        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                info!(
                    event_name = "interceptor.redirect.scheduled",
                    event_domain = "interceptor",
                    login_path = target.as_str(),
                    delay_ms = self.config.redirect_delay_ms,
                    "redirecting to login"
                );
                *pending = Some(runtime.spawn(async move {
                    tokio::time::sleep(delay).await;
                    navigator.navigate(&target);
                }));
            }
            Err(_) => {
                // No runtime to own a timer.
                navigator.navigate(&target);
            }
        }
        true
    }

    /// Aborts a scheduled login redirect. Returns true if one was still pending.
    pub fn cancel_pending_redirect(&self) -> bool {
        let handle = self
            .pending_redirect
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        match handle {
            Some(handle) if !handle.is_finished() => {
                handle.abort();
                debug!(
                    event_name = "interceptor.redirect.cancelled",
                    event_domain = "interceptor",
                    "pending login redirect cancelled"
                );
                true
            }
            _ => false,
        }
    }

    fn handle_rotation(&self, headers: &HeaderMap) -> ProcessOutcome {
        let names = &self.config.headers;
        let access_token = header_value(headers, &names.access_token);
        let refresh_token = header_value(headers, &names.refresh_token);

        match (access_token, refresh_token) {
            (Some(access_token), Some(refresh_token)) => {
                let now = Utc::now();
                let credentials = CredentialSet {
                    access_token_expiry: self.access_expiry(&access_token, now),
                    refresh_token_expiry: offset_from(
                        now,
                        TimeDelta::try_days(self.config.refresh_token_lifetime_days),
                    ),
                    access_token,
                    refresh_token,
                    session_id: header_value(headers, &names.session_id).unwrap_or_default(),
                };
                self.store.store_tokens(credentials);

                if let Err(e) = self
                    .ephemeral
                    .set_item(JUST_LOGGED_IN_KEY, &now.timestamp_millis().to_string())
                {
                    debug!(error = %e, "could not record fresh login marker");
                }

                let identity_published = header_value(headers, &names.front_token)
                    .map(|front_token| self.publish_identity(&front_token))
                    .unwrap_or(false);

                info!(
                    event_name = "interceptor.tokens.rotated",
                    event_domain = "interceptor",
                    identity_published,
                    "stored rotated credentials"
                );
                ProcessOutcome::Rotated { identity_published }
            }
            (Some(access_token), None) => {
                let expiry = self.access_expiry(&access_token, Utc::now());
                self.store.store_access_token(access_token, expiry);
                debug!(
                    event_name = "interceptor.access_token.renewed",
                    event_domain = "interceptor",
                    "stored renewed access token"
                );
                ProcessOutcome::AccessTokenRenewed
            }
            _ => ProcessOutcome::Unchanged,
        }
    }

    /// The decoded expiry, or the configured fallback lifetime from `now`.
    fn access_expiry(&self, access_token: &str, now: DateTime<Utc>) -> DateTime<Utc> {
        decode_expiry(access_token).unwrap_or_else(|e| {
            if let Some(suppressed_count) = self.throttle.should_emit("codec.expiry.fallback") {
                warn!(
                    event_name = "codec.expiry.fallback",
                    event_domain = "codec",
                    error = %e,
                    fallback_secs = self.config.access_token_fallback_secs,
                    suppressed_count,
                    "access token expiry unreadable, using fallback"
                );
            }
            offset_from(
                now,
                TimeDelta::try_seconds(self.config.access_token_fallback_secs),
            )
        })
    }

    fn publish_identity(&self, front_token: &str) -> bool {
        match decode_identity(front_token) {
            Ok(identity) => {
                self.identity.publish(identity);
                true
            }
            Err(e) => {
                if let Some(suppressed_count) = self.throttle.should_emit("codec.identity.invalid") {
                    debug!(
                        event_name = "codec.identity.invalid",
                        event_domain = "codec",
                        error = %e,
                        suppressed_count,
                        "front token ignored"
                    );
                }
                false
            }
        }
    }
}

impl Drop for ResponseProcessor {
    fn drop(&mut self) {
        self.cancel_pending_redirect();
    }
}

/// `now + delta`, saturating instead of overflowing.
fn offset_from(now: DateTime<Utc>, delta: Option<TimeDelta>) -> DateTime<Utc> {
    delta
        .and_then(|delta| now.checked_add_signed(delta))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// A header as a non-empty string. `HeaderMap` lookups ignore case.
fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}
