use crate::http::make_error_response;
use http_body_util::Full;
use hyper::body::{Bytes, Incoming};
use hyper::service::Service;
use hyper::{Request, Response, StatusCode};
use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

type ReadinessProbe = Arc<dyn Fn() -> bool + Send + Sync>;

/// Liveness and readiness probes, served on the admin listener.
#[derive(Clone)]
pub struct AdminService {
    is_ready: ReadinessProbe,
}

impl AdminService {
    pub fn new<F>(is_ready: F) -> Self
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        Self {
            is_ready: Arc::new(is_ready),
        }
    }
}

impl Service<Request<Incoming>> for AdminService {
    type Response = Response<Full<Bytes>>;
    type Error = Infallible;
    type Future =
        Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send + 'static>>;

    fn call(&self, req: Request<Incoming>) -> Self::Future {
        let ready = (self.is_ready)();

        Box::pin(async move {
            let ok = || Response::new(Full::new(Bytes::from("ok\n")));

            let res = match req.uri().path() {
                "/health" => ok(),
                "/ready" if ready => ok(),
                "/ready" => make_error_response(StatusCode::SERVICE_UNAVAILABLE),
                _ => make_error_response(StatusCode::NOT_FOUND),
            };
            Ok(res)
        })
    }
}
