//! gRPC authentication layer.
//!
//! A tower layer mounted on `tonic::transport::Server::builder().layer(..)`.
//! It sees the full method path (`/package.Service/Method`), which a tonic
//! `Interceptor` does not, so it can let public methods through unchecked.
//!
//! # Security
//!
//! - Every method outside the public set requires a valid bearer token in
//!   the `authorization` metadata, verified exactly as on the HTTP path
//! - Failures return `UNAUTHENTICATED` with a generic message
//! - Verified `PayloadClaims` land in the request extensions, where tonic
//!   handlers read them through `tonic::Request::extensions()`

use crate::auth::{authenticate, TokenCodec, AUTHORIZATION_HEADER};
use crate::observability::metrics::record_auth_failure;
use axum::http;
use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tonic::body::BoxBody;
use tonic::Status;
use tower::{Layer, Service};

/// Tower layer for gRPC bearer authentication.
#[derive(Clone)]
pub struct GrpcAuthLayer {
    codec: Arc<dyn TokenCodec>,
    public_methods: Arc<HashSet<String>>,
}

impl GrpcAuthLayer {
    /// Create a layer that exempts `public_methods` (full method paths).
    pub fn new<I, M>(codec: Arc<dyn TokenCodec>, public_methods: I) -> Self
    where
        I: IntoIterator<Item = M>,
        M: Into<String>,
    {
        Self {
            codec,
            public_methods: Arc::new(public_methods.into_iter().map(Into::into).collect()),
        }
    }

    /// Whether `path` bypasses authentication.
    pub fn is_public(&self, path: &str) -> bool {
        self.public_methods.contains(path)
    }
}

impl<S> Layer<S> for GrpcAuthLayer {
    type Service = GrpcAuthService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        GrpcAuthService {
            inner,
            codec: self.codec.clone(),
            public_methods: self.public_methods.clone(),
        }
    }
}

/// Tower service produced by `GrpcAuthLayer`.
#[derive(Clone)]
pub struct GrpcAuthService<S> {
    inner: S,
    codec: Arc<dyn TokenCodec>,
    public_methods: Arc<HashSet<String>>,
}

impl<S, ReqBody> Service<http::Request<ReqBody>> for GrpcAuthService<S>
where
    S: Service<http::Request<ReqBody>, Response = http::Response<BoxBody>>
        + Clone
        + Send
        + 'static,
    S::Future: Send + 'static,
    ReqBody: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: http::Request<ReqBody>) -> Self::Future {
        // Take the service that was driven to readiness, leave a fresh clone.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let codec = self.codec.clone();
        let public_methods = self.public_methods.clone();

        Box::pin(async move {
            let method = req.uri().path().to_string();

            if public_methods.contains(&method) {
                tracing::trace!(target: "gateway.grpc.auth", method = %method, "Public method");
                return inner.call(req).await;
            }

            let header_value = req
                .headers()
                .get(AUTHORIZATION_HEADER)
                .and_then(|h| h.to_str().ok());

            match authenticate(codec.as_ref(), header_value) {
                Ok(claims) => {
                    req.extensions_mut().insert(claims);
                    inner.call(req).await
                }
                Err(e) => {
                    tracing::debug!(
                        target: "gateway.grpc.auth",
                        method = %method,
                        reason = e.reason(),
                        "gRPC request rejected"
                    );
                    record_auth_failure("grpc", e.reason());
                    Ok(Status::unauthenticated(e.client_message()).into_http())
                }
            }
        })
    }
}
