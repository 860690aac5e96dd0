//! `X-Token` authentication middleware

use axum::{
    body::Body,
    http::Request,
    response::{IntoResponse, Response},
};
use futures::future::BoxFuture;
use secrecy::{ExposeSecret, SecretString};
use std::{
    sync::Arc,
    task::{Context, Poll},
};
use tower::{Layer, Service};
use tracing::warn;

use crate::error::AppError;

/// Header carrying the caller's credential
pub const X_TOKEN: &str = "x-token";

/// Authentication layer
#[derive(Clone)]
pub struct AuthLayer {
    secret: Arc<SecretString>,
}

impl AuthLayer {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: Arc::new(SecretString::new(secret.into())),
        }
    }

    /// Check a presented token against the configured secret
    pub fn verify(&self, token: &[u8]) -> bool {
        constant_time_eq(token, self.secret.expose_secret().as_bytes())
    }
}

impl<S> Layer<S> for AuthLayer {
    type Service = AuthMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthMiddleware {
            inner,
            auth: self.clone(),
        }
    }
}

/// Authentication middleware service
#[derive(Clone)]
pub struct AuthMiddleware<S> {
    inner: S,
    auth: AuthLayer,
}

impl<S> Service<Request<Body>> for AuthMiddleware<S>
where
    S: Service<Request<Body>, Response = Response> + Send + Clone + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<Body>) -> Self::Future {
        // Liveness probes carry no credential
        if request.uri().path() == "/health" {
            return Box::pin(self.inner.call(request));
        }

        let authorized = request
            .headers()
            .get(X_TOKEN)
            .map(|value| self.auth.verify(value.as_bytes()));

        match authorized {
            Some(true) => Box::pin(self.inner.call(request)),
            Some(false) => {
                warn!(path = %request.uri().path(), "Invalid X-Token provided");
                Box::pin(async move { Ok(AppError::Unauthorized.into_response()) })
            }
            None => {
                warn!(path = %request.uri().path(), "No X-Token provided");
                Box::pin(async move { Ok(AppError::Unauthorized.into_response()) })
            }
        }
    }
}

/// Byte comparison whose running time depends only on the lengths
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
