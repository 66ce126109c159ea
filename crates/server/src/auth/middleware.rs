use std::sync::Arc;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::{IntoResponse, Response};
use tower::{Layer, Service};

use super::jwt::JwtManager;

/// Tower layer that adds bearer-token authentication.
#[derive(Clone)]
pub struct AuthLayer {
    jwt: Arc<JwtManager>,
}

impl AuthLayer {
    pub fn new(jwt: Arc<JwtManager>) -> Self {
        Self { jwt }
    }
}

impl<S> Layer<S> for AuthLayer {
    type Service = AuthMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthMiddleware {
            inner,
            jwt: Arc::clone(&self.jwt),
        }
    }
}

/// Tower service that authenticates requests and injects the caller's
/// [`Identity`](super::identity::Identity) as a request extension.
#[derive(Clone)]
pub struct AuthMiddleware<S> {
    inner: S,
    jwt: Arc<JwtManager>,
}

impl<S> Service<Request<Body>> for AuthMiddleware<S>
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

    fn call(&mut self, mut req: Request<Body>) -> Self::Future {
        let jwt = Arc::clone(&self.jwt);
        let mut inner = self.inner.clone();

        Box::pin(async move {
            if let Some(auth_header) = req.headers().get("authorization")
                && let Ok(header_str) = auth_header.to_str()
                && let Some(token) = header_str.strip_prefix("Bearer ")
            {
                return match jwt.validate_token(token) {
                    Ok(identity) => {
                        req.extensions_mut().insert(identity);
                        inner.call(req).await
                    }
                    Err(e) => Ok(unauthorized(&e)),
                };
            }

            Ok(unauthorized("missing authentication credentials"))
        })
    }
}

fn unauthorized(message: &str) -> Response {
    let body = serde_json::json!({ "error": message });
    (StatusCode::UNAUTHORIZED, axum::Json(body)).into_response()
}
