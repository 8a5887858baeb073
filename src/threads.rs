//! Listing of the user's conversation threads through an authenticated fetch.

use std::sync::{PoisonError, RwLock};

use reqwest::{Method, Request, Url};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::Error;
use crate::interceptor::Fetch;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ThreadItem {
    pub thread_id: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ThreadListStatus {
    Idle,
    Loading,
    Success,
    Failed,
}

#[derive(Debug)]
struct ThreadState {
    status: ThreadListStatus,
    threads: Vec<ThreadItem>,
    selected: Option<String>,
}

/// Fetches and caches the thread list. Credentials come from whatever
/// `Fetch` it is built on, normally an installed `AuthInterceptor`.
pub struct ThreadsClient<F> {
    fetch: F,
    url: Url,
    state: RwLock<ThreadState>,
}

impl<F: Fetch> ThreadsClient<F> {
    /// `app_origin` and `path` are joined, e.g. `http://localhost:3000` + `/api/threads`.
    pub fn new(fetch: F, app_origin: &str, path: &str) -> Result<Self, Error> {
        let url = Url::parse(app_origin)
            .and_then(|origin| origin.join(path))
            .map_err(|e| Error::Config(format!("invalid threads url: {}", e)))?;
        Ok(Self {
            fetch,
            url,
            state: RwLock::new(ThreadState {
                status: ThreadListStatus::Idle,
                threads: Vec::new(),
                selected: None,
            }),
        })
    }

    pub fn status(&self) -> ThreadListStatus {
        self.state.read().unwrap_or_else(PoisonError::into_inner).status
    }

    pub fn threads(&self) -> Vec<ThreadItem> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .threads
            .clone()
    }

    pub fn thread_id(&self) -> Option<String> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .selected
            .clone()
    }

    pub fn set_thread_id(&self, thread_id: Option<String>) {
        self.state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .selected = thread_id;
    }

    /// Refreshes the thread list. A call made while another is still loading
    /// returns `Loading` without sending anything. If the returned future is
    /// dropped mid-load, the status goes back to what it was.
    pub async fn fetch_threads(&self) -> ThreadListStatus {
        let guard = {
            let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
            if state.status == ThreadListStatus::Loading {
                return ThreadListStatus::Loading;
            }
            let previous = std::mem::replace(&mut state.status, ThreadListStatus::Loading);
            LoadingGuard {
                state: &self.state,
                previous: Some(previous),
            }
        };

        let status = match self.load().await {
            Ok(threads) => {
                debug!(
                    event_name = "threads.fetched",
                    event_domain = "threads",
                    count = threads.len(),
                    "thread list fetched"
                );
                self.state
                    .write()
                    .unwrap_or_else(PoisonError::into_inner)
                    .threads = threads;
                ThreadListStatus::Success
            }
            Err(e) => {
                warn!(
                    event_name = "threads.fetch_failed",
                    event_domain = "threads",
                    error = %e,
                    "failed to fetch thread list"
                );
                ThreadListStatus::Failed
            }
        };
        guard.settle(status);
        status
    }

    async fn load(&self) -> Result<Vec<ThreadItem>, String> {
        let request = Request::new(Method::GET, self.url.clone());
        let response = self
            .fetch
            .fetch(request)
            .await
            .map_err(|e| format!("Error sending request: {}", e))?;

        if !response.status().is_success() {
            return Err(format!("Unexpected status code: {}", response.status()));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| format!("Error parsing JSON: {}", e))?;
        Ok(match body {
            Value::Array(items) => items
                .into_iter()
                .filter_map(|item| serde_json::from_value(item).ok())
                .collect(),
            _ => Vec::new(),
        })
    }
}

/// Holds a `Loading` status; restores the previous one unless settled.
struct LoadingGuard<'a> {
    state: &'a RwLock<ThreadState>,
    previous: Option<ThreadListStatus>,
}

impl LoadingGuard<'_> {
    fn settle(mut self, status: ThreadListStatus) {
        self.previous = None;
        self.state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .status = status;
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        if let Some(previous) = self.previous.take() {
            debug!(
                event_name = "threads.fetch_abandoned",
                event_domain = "threads",
                "thread list fetch dropped before completing"
            );
            self.state
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .status = previous;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use mockito::Server;
    use reqwest::Response;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Sends nothing and never answers.
    #[derive(Default)]
    struct Stalled {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Fetch for Stalled {
        async fn fetch(&self, _request: Request) -> Result<Response, Error> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            futures::future::pending().await
        }
    }

    #[tokio::test]
    async fn test_fetch_threads_success() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("GET", "/api/threads")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"[{"thread_id": "t1", "description": "Budget"}, {"thread_id": "t2"}]"#)
            .create_async()
            .await;

        let client = ThreadsClient::new(reqwest::Client::new(), &server.url(), "/api/threads")
            .expect("client should build");
        assert_eq!(client.status(), ThreadListStatus::Idle);

        let status = client.fetch_threads().await;
        m.assert_async().await;

        assert_eq!(status, ThreadListStatus::Success);
        assert_eq!(
            client.threads(),
            vec![
                ThreadItem {
                    thread_id: "t1".to_string(),
                    description: Some("Budget".to_string()),
                },
                ThreadItem {
                    thread_id: "t2".to_string(),
                    description: None,
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_non_array_body_gives_empty_list() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/api/threads")
            .with_status(200)
            .with_body(r#"{"detail": "nothing here"}"#)
            .create_async()
            .await;

        let client = ThreadsClient::new(reqwest::Client::new(), &server.url(), "/api/threads")
            .expect("client should build");
        assert_eq!(client.fetch_threads().await, ThreadListStatus::Success);
        assert!(client.threads().is_empty());
    }

    #[tokio::test]
    async fn test_error_status_keeps_previous_list() {
        let mut server = Server::new_async().await;
        let ok = server
            .mock("GET", "/api/threads")
            .with_status(200)
            .with_body(r#"[{"thread_id": "t1"}]"#)
            .expect(1)
            .create_async()
            .await;

        let client = ThreadsClient::new(reqwest::Client::new(), &server.url(), "/api/threads")
            .expect("client should build");
        client.fetch_threads().await;
        ok.assert_async().await;
        ok.remove_async().await;

        server
            .mock("GET", "/api/threads")
            .with_status(502)
            .create_async()
            .await;
        assert_eq!(client.fetch_threads().await, ThreadListStatus::Failed);
        assert_eq!(client.status(), ThreadListStatus::Failed);
        assert_eq!(client.threads().len(), 1);
    }

    #[test]
    fn test_selected_thread() {
        let client = ThreadsClient::new(reqwest::Client::new(), "http://localhost:3000", "/api/threads")
            .expect("client should build");
        assert_eq!(client.thread_id(), None);
        client.set_thread_id(Some("t9".to_string()));
        assert_eq!(client.thread_id().as_deref(), Some("t9"));
    }

    #[tokio::test]
    async fn test_dropped_fetch_does_not_stay_loading() {
        let client = ThreadsClient::new(Stalled::default(), "http://localhost:3000", "/api/threads")
            .expect("client should build");

        let first = tokio::time::timeout(Duration::from_millis(20), client.fetch_threads()).await;
        assert!(first.is_err(), "stalled fetch should time out");
        assert_eq!(client.status(), ThreadListStatus::Idle);

        let again = tokio::time::timeout(Duration::from_millis(20), client.fetch_threads()).await;
        assert!(again.is_err(), "second call should send a new request");
        assert_eq!(client.fetch.calls.load(Ordering::SeqCst), 2);
    }
}
