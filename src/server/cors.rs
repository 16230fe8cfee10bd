//! Cross Origin Resource Sharing (CORS) layer
//!
//! Every response carries the fixed cross-origin headers, and `OPTIONS`
//! preflight requests are answered directly, before routing or any body
//! processing, without invoking the inner service.

use std::future::Future;
use std::pin::Pin;
use std::task::Context;
use std::task::Poll;

use http::HeaderMap;
use http::HeaderValue;
use http::Method;
use http::Request;
use http::Response;
use http::StatusCode;
use http::header::ACCESS_CONTROL_ALLOW_HEADERS;
use http::header::ACCESS_CONTROL_ALLOW_METHODS;
use http::header::ACCESS_CONTROL_ALLOW_ORIGIN;
use tower::Layer;
use tower::Service;

const ALLOW_METHODS: &str = "POST, GET, OPTIONS, PUT, DELETE";
const ALLOW_HEADERS: &str =
    "Accept, Content-Type, Content-Length, Accept-Encoding, X-CSRF-Token, Authorization";

/// Layer applying the fixed, allow-everyone CORS policy to every response.
#[derive(Clone, Debug, Default)]
pub(crate) struct CorsLayer;

impl CorsLayer {
    pub(crate) fn new() -> Self {
        Self
    }
}

impl<S> Layer<S> for CorsLayer {
    type Service = CorsService<S>;

    fn layer(&self, service: S) -> Self::Service {
        CorsService { inner: service }
    }
}

/// The service produced by [`CorsLayer`].
#[derive(Clone, Debug)]
pub(crate) struct CorsService<S> {
    inner: S,
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for CorsService<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>> + Send + 'static,
    S::Future: Send + 'static,
    S::Error: Send + 'static,
    ReqBody: Send + 'static,
    ResBody: Send + 'static + Default,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<ReqBody>) -> Self::Future {
        // Intercept OPTIONS requests and return the preflight response directly
        if req.method() == Method::OPTIONS {
            let mut response = Response::builder()
                .status(StatusCode::OK)
                .body(ResBody::default())
                .expect("building an empty response can not fail");
            add_cors_headers(response.headers_mut());
            return Box::pin(async move { Ok(response) });
        }

        let fut = self.inner.call(req);
        Box::pin(async move {
            let mut response = fut.await?;
            add_cors_headers(response.headers_mut());
            Ok(response)
        })
    }
}

/// The fixed header set applied to every response.
fn add_cors_headers(headers: &mut HeaderMap) {
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(
        ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOW_METHODS),
    );
    headers.insert(
        ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(ALLOW_HEADERS),
    );
}

#[cfg(test)]
mod tests {
    use std::future::Future;
    use std::pin::Pin;
    use std::task::Context;
    use std::task::Poll;

    use http::Request;
    use http::Response;
    use http::StatusCode;

    use super::*;

    struct DummyService;
    impl Service<Request<()>> for DummyService {
        type Response = Response<&'static str>;
        type Error = ();
        type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

        fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            Poll::Ready(Ok(()))
        }

        fn call(&mut self, _req: Request<()>) -> Self::Future {
            Box::pin(async {
                Ok(Response::builder()
                    .status(StatusCode::OK)
                    .body("ok")
                    .unwrap())
            })
        }
    }

    /// Fails the test when the inner service is reached.
    struct UnreachableService;
    impl Service<Request<()>> for UnreachableService {
        type Response = Response<&'static str>;
        type Error = ();
        type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

        fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            Poll::Ready(Ok(()))
        }

        fn call(&mut self, _req: Request<()>) -> Self::Future {
            panic!("the inner service must not be invoked for preflight requests");
        }
    }

    fn assert_cors_headers(headers: &http::HeaderMap) {
        assert_eq!(headers.get(ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(), "*");
        assert_eq!(
            headers.get(ACCESS_CONTROL_ALLOW_METHODS).unwrap(),
            ALLOW_METHODS
        );
        assert_eq!(
            headers.get(ACCESS_CONTROL_ALLOW_HEADERS).unwrap(),
            ALLOW_HEADERS
        );
    }

    #[test]
    fn test_cors_headers_on_regular_responses() {
        let mut service = CorsLayer::new().layer(DummyService);
        let req = Request::post("/graphql").body(()).unwrap();
        let resp = futures::executor::block_on(service.call(req)).unwrap();
        assert_cors_headers(resp.headers());
        assert_eq!(*resp.body(), "ok");
    }

    #[test]
    fn test_preflight_short_circuits_with_an_empty_body() {
        let mut service = CorsLayer::new().layer(UnreachableService);
        let req = Request::builder()
            .method("OPTIONS")
            .uri("/graphql")
            .body(())
            .unwrap();
        let resp = futures::executor::block_on(service.call(req)).unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_cors_headers(resp.headers());
        assert_eq!(*resp.body(), "");
    }
}
