use std::sync::Arc;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::http::{Method, Request};
use axum::response::Response;
use tower::{Layer, Service};
use tracing::{debug, warn};

use dropgate_core::RequestTarget;
use dropgate_gateway::{Gateway, Redemption};

use crate::delivery::{NotFoundPage, download_response};

/// Tower layer that answers requests addressed to a claimed download path.
///
/// A request whose path splits into `<prefix>/<token>` with a prefix known to
/// the gateway is answered here with either the file or the not-found page.
/// Only `GET` and `HEAD` redeem the token; any other method on a claimed path
/// gets the not-found page and leaves the token in place. Every other request
/// reaches the inner service untouched.
#[derive(Clone)]
pub struct InterceptLayer {
    gateway: Arc<Gateway>,
    not_found: NotFoundPage,
}

impl InterceptLayer {
    pub fn new(gateway: Arc<Gateway>, not_found: NotFoundPage) -> Self {
        Self { gateway, not_found }
    }
}

impl<S> Layer<S> for InterceptLayer {
    type Service = InterceptMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        InterceptMiddleware {
            inner,
            gateway: Arc::clone(&self.gateway),
            not_found: self.not_found.clone(),
        }
    }
}

/// Tower service performing the interception described on [`InterceptLayer`].
#[derive(Clone)]
pub struct InterceptMiddleware<S> {
    inner: S,
    gateway: Arc<Gateway>,
    not_found: NotFoundPage,
}

impl<S> Service<Request<Body>> for InterceptMiddleware<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let gateway = Arc::clone(&self.gateway);
        let not_found = self.not_found.clone();
        let mut inner = self.inner.clone();

        Box::pin(async move {
            let method = req.method().clone();
            let uri = req
                .uri()
                .path_and_query()
                .map_or_else(|| req.uri().path(), |pq| pq.as_str());
            let Some(target) = RequestTarget::parse(uri) else {
                return inner.call(req).await;
            };

            match gateway.is_claimed(&target.prefix).await {
                Ok(true) => {}
                Ok(false) => return inner.call(req).await,
                Err(e) => {
                    warn!(prefix = %target.prefix, error = %e, "path index unavailable, passing request through");
                    return inner.call(req).await;
                }
            }

            debug!(prefix = %target.prefix, %method, "request claimed");
            if method != Method::GET && method != Method::HEAD {
                return Ok(not_found.response());
            }

            let response = match gateway.redeem(&target).await {
                Ok(Redemption::Deliver(resource)) => {
                    download_response(&resource, &method, &not_found).await
                }
                Ok(Redemption::NotFound) => not_found.response(),
                Err(e) => {
                    warn!(prefix = %target.prefix, error = %e, "redemption failed");
                    not_found.response()
                }
            };
            Ok(response)
        })
    }
}
