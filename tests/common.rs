#![allow(dead_code)]

use std::sync::Arc;

use authfetch::config::InterceptorConfig;
use authfetch::interceptor::{AuthInterceptor, Collaborators};
use authfetch::sinks::{RecordingNavigator, SharedIdentity};
use authfetch::store::{MemoryEphemeralStorage, MemoryTokenStore};
use authfetch::{CredentialSet, RefreshCoordinator, TokenStore};
use base64::{engine::general_purpose, Engine as _};
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use reqwest::{Method, Request};
use serde::Serialize;

pub struct TestApp {
    pub interceptor: AuthInterceptor<reqwest::Client>,
    pub store: Arc<MemoryTokenStore>,
    pub coordinator: RefreshCoordinator,
    pub identity: Arc<SharedIdentity>,
    pub navigator: Arc<RecordingNavigator>,
    pub ephemeral: Arc<MemoryEphemeralStorage>,
}

/// An interceptor whose application origin is `app_origin`, with `backends`
/// receiving credentials too, and a user sitting on `/chat/t1`.
pub fn build_app(app_origin: &str, backends: &[&str]) -> TestApp {
    let store = Arc::new(MemoryTokenStore::new());
    let coordinator = RefreshCoordinator::new();
    let identity = Arc::new(SharedIdentity::new());
    let navigator = Arc::new(RecordingNavigator::new("/chat/t1"));
    let ephemeral = Arc::new(MemoryEphemeralStorage::new());

    let config = InterceptorConfig {
        app_origin: app_origin.to_string(),
        backend_origins: backends.iter().map(|b| b.to_string()).collect(),
        redirect_delay_ms: 20,
        ..Default::default()
    };
    let collaborators = Collaborators {
        store: store.clone(),
        coordinator: coordinator.clone(),
        identity: identity.clone(),
        navigator: navigator.clone(),
        ephemeral: ephemeral.clone(),
    };

    TestApp {
        interceptor: AuthInterceptor::new(reqwest::Client::new(), config, collaborators)
            .expect("interceptor should build"),
        store,
        coordinator,
        identity,
        navigator,
        ephemeral,
    }
}

pub fn logged_in(store: &MemoryTokenStore) {
    let now = Utc::now();
    store.store_tokens(CredentialSet {
        access_token: "access-0".to_string(),
        refresh_token: "refresh-0".to_string(),
        access_token_expiry: now + Duration::minutes(10),
        refresh_token_expiry: now + Duration::days(20),
        session_id: "session-0".to_string(),
    });
}

#[derive(Serialize)]
struct AccessClaims {
    sub: String,
    exp: i64,
}

/// An HS256 access token expiring at `exp` (seconds since the epoch).
pub fn access_token(exp: i64) -> String {
    let claims = AccessClaims {
        sub: "u1".to_string(),
        exp,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(b"backend-secret"),
    )
    .expect("Failed to encode JWT")
}

/// A front token whose first segment is `payload` as base64 JSON.
pub fn front_token(payload: &serde_json::Value) -> String {
    let encoded = general_purpose::STANDARD.encode(payload.to_string());
    format!("{}.1700000000000.V2", encoded)
}

pub fn get(url: &str) -> Request {
    Request::new(Method::GET, url.parse().expect("valid url"))
}
