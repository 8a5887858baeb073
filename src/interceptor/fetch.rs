use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Request, Response};

use crate::error::Error;

/// The request primitive every outbound call goes through.
///
/// `reqwest::Client` is the base implementation; [`super::AuthInterceptor`]
/// wraps any `Fetch` and is itself a `Fetch`, so call sites do not change when
/// it is installed.
#[async_trait]
pub trait Fetch: Send + Sync {
    async fn fetch(&self, request: Request) -> Result<Response, Error>;
}

#[async_trait]
impl Fetch for reqwest::Client {
    async fn fetch(&self, request: Request) -> Result<Response, Error> {
        Ok(self.execute(request).await?)
    }
}

#[async_trait]
impl<'a, F: Fetch + ?Sized> Fetch for &'a F {
    async fn fetch(&self, request: Request) -> Result<Response, Error> {
        (**self).fetch(request).await
    }
}

#[async_trait]
impl<F: Fetch + ?Sized> Fetch for Arc<F> {
    async fn fetch(&self, request: Request) -> Result<Response, Error> {
        (**self).fetch(request).await
    }
}
