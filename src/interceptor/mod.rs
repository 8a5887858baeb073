//! The authenticated fetch interceptor.
//!
//! [`AuthInterceptor`] wraps a [`Fetch`] implementation. In-scope requests get
//! the current bearer token and session id attached, unless a refresh is in
//! progress. Their responses are then handed to the [`ResponseProcessor`] for
//! token rotation and 401 handling before being returned to the caller as is.
//!
//! ```rust,ignore
//! let interceptor = AuthInterceptor::new(reqwest::Client::new(), config, collaborators)?;
//! let response = interceptor.fetch(request).await?;
//! // Uninstall: get the original primitive back.
//! let client = interceptor.into_inner();
//! ```

mod fetch;
mod processor;
mod scope;

use std::sync::Arc;

use async_trait::async_trait;
use http::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use reqwest::{Request, Response};
use tracing::{debug, trace, warn};

use crate::config::InterceptorConfig;
use crate::coordinator::RefreshCoordinator;
use crate::error::Error;
use crate::sinks::{IdentitySink, Navigator};
use crate::store::{EphemeralStorage, TokenStore};

pub use fetch::Fetch;
pub use processor::{ProcessOutcome, ResponseProcessor, JUST_LOGGED_IN_KEY};
pub use scope::Scope;

/// The shared state the interceptor reads from and reports to.
#[derive(Clone)]
pub struct Collaborators {
    pub store: Arc<dyn TokenStore>,
    pub coordinator: RefreshCoordinator,
    pub identity: Arc<dyn IdentitySink>,
    pub navigator: Arc<dyn Navigator>,
    pub ephemeral: Arc<dyn EphemeralStorage>,
}

pub struct AuthInterceptor<F> {
    inner: F,
    scope: Scope,
    session_header: HeaderName,
    store: Arc<dyn TokenStore>,
    coordinator: RefreshCoordinator,
    processor: ResponseProcessor,
}

impl<F: Fetch> AuthInterceptor<F> {
    /// Installs the interceptor around `inner`.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the interceptor settings are unusable.
    pub fn new(
        inner: F,
        config: InterceptorConfig,
        collaborators: Collaborators,
    ) -> Result<Self, Error> {
        config.validate()?;
        let scope = Scope::from_config(&config)?;
        let session_header = HeaderName::from_bytes(config.session_header.as_bytes())
            .map_err(|e| Error::Config(format!("invalid session header: {}", e)))?;

        let processor = ResponseProcessor::new(
            Arc::new(config),
            collaborators.store.clone(),
            collaborators.identity,
            collaborators.navigator,
            collaborators.ephemeral,
        );

        Ok(Self {
            inner,
            scope,
            session_header,
            store: collaborators.store,
            coordinator: collaborators.coordinator,
            processor,
        })
    }

    /// Uninstalls the interceptor, returning the wrapped primitive. A login
    /// redirect still waiting on its delay is cancelled.
    pub fn into_inner(self) -> F {
        self.processor.cancel_pending_redirect();
        self.inner
    }

    pub fn inner(&self) -> &F {
        &self.inner
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Cancels a scheduled login redirect, e.g. when the owning page goes away.
    pub fn cancel_pending_redirect(&self) -> bool {
        self.processor.cancel_pending_redirect()
    }

    /// Sets the bearer and session headers from the store. Any other header
    /// the caller supplied is left as it was.
    fn attach_credentials(&self, headers: &mut HeaderMap) {
        // Read once per request. A refresh starting after this point still
        // races the request; the server's 401 handles that case.
        if self.coordinator.is_refreshing() {
            debug!(
                event_name = "interceptor.credentials.skipped",
                event_domain = "interceptor",
                "refresh in progress, sending request without credentials"
            );
            return;
        }

        if let Some(token) = self.store.access_token() {
            match HeaderValue::from_str(&format!("Bearer {}", token)) {
                Ok(mut value) => {
                    value.set_sensitive(true);
                    headers.insert(AUTHORIZATION, value);
                }
                Err(_) => warn!(
                    event_name = "interceptor.credentials.invalid",
                    event_domain = "interceptor",
                    header = "authorization",
                    "stored access token is not a valid header value"
                ),
            }
        }

        if let Some(session_id) = self.store.session_id() {
            match HeaderValue::from_str(&session_id) {
                Ok(value) => {
                    headers.insert(self.session_header.clone(), value);
                }
                Err(_) => warn!(
                    event_name = "interceptor.credentials.invalid",
                    event_domain = "interceptor",
                    header = self.session_header.as_str(),
                    "stored session id is not a valid header value"
                ),
            }
        }
    }
}

#[async_trait]
impl<F: Fetch> Fetch for AuthInterceptor<F> {
    async fn fetch(&self, mut request: Request) -> Result<Response, Error> {
        if !self.scope.contains(request.url()) {
            trace!(url = request.url().as_str(), "out of scope, passing through");
            return self.inner.fetch(request).await;
        }

        self.attach_credentials(request.headers_mut());
        let url = request.url().clone();

        let response = self.inner.fetch(request).await?;
        let outcome = self
            .processor
            .process(&url, response.status(), response.headers());
        trace!(url = url.as_str(), ?outcome, "response processed");

        Ok(response)
    }
}
