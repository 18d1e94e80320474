//! CORS middleware - answers preflights and stamps every response.

use actix_web::{
    Error, HttpResponse,
    body::EitherBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
    http::{
        Method,
        header::{self, HeaderMap, HeaderValue},
    },
};
use std::future::{Future, Ready, ready};
use std::pin::Pin;
use std::sync::Arc;

const ALLOW_METHODS: &str = "GET, POST, OPTIONS";
const ALLOW_HEADERS: &str = "Content-Type";

/// Which origins get echoed back in `Access-Control-Allow-Origin`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorsPolicy {
    /// Returned for every origin that does not match an allowed prefix.
    pub primary_origin: String,
    /// Extra origin prefixes, for local development.
    pub dev_origins: Vec<String>,
}

impl Default for CorsPolicy {
    fn default() -> Self {
        Self {
            primary_origin: "https://1mb.dev".to_string(),
            dev_origins: vec![
                "http://localhost".to_string(),
                "http://127.0.0.1".to_string(),
            ],
        }
    }
}

impl CorsPolicy {
    pub fn allow_origin<'a>(&'a self, origin: Option<&'a str>) -> &'a str {
        match origin {
            Some(origin)
                if std::iter::once(&self.primary_origin)
                    .chain(self.dev_origins.iter())
                    .any(|prefix| origin.starts_with(prefix.as_str())) =>
            {
                origin
            }
            _ => &self.primary_origin,
        }
    }

    fn apply(&self, origin: Option<&str>, headers: &mut HeaderMap) {
        let allowed = HeaderValue::from_str(self.allow_origin(origin))
            .unwrap_or_else(|_| HeaderValue::from_static("https://1mb.dev"));

        headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, allowed);
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(ALLOW_METHODS),
        );
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(ALLOW_HEADERS),
        );
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
    }
}

/// CORS middleware factory.
pub struct Cors {
    policy: Arc<CorsPolicy>,
}

impl Cors {
    pub fn new(policy: CorsPolicy) -> Self {
        Self {
            policy: Arc::new(policy),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for Cors
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = CorsService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(CorsService {
            service,
            policy: self.policy.clone(),
        }))
    }
}

pub struct CorsService<S> {
    service: S,
    policy: Arc<CorsPolicy>,
}

impl<S, B> Service<ServiceRequest> for CorsService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let policy = self.policy.clone();
        let origin = req
            .headers()
            .get(header::ORIGIN)
            .and_then(|v| v.to_str().ok())
            .map(String::from);

        // Preflight: headers only, never reaches the handlers or the request log.
        if req.method() == Method::OPTIONS {
            let mut response = HttpResponse::Ok().finish();
            policy.apply(origin.as_deref(), response.headers_mut());

            let (http_req, _payload) = req.into_parts();
            let srv_response = ServiceResponse::new(http_req, response);

            return Box::pin(async move { Ok(srv_response.map_into_right_body()) });
        }

        let fut = self.service.call(req);
        Box::pin(async move {
            let mut res = fut.await?;
            policy.apply(origin.as_deref(), res.headers_mut());
            Ok(res.map_into_left_body())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowed_origins_are_echoed() {
        let policy = CorsPolicy::default();
        assert_eq!(policy.allow_origin(Some("https://1mb.dev")), "https://1mb.dev");
        assert_eq!(
            policy.allow_origin(Some("http://localhost:4000")),
            "http://localhost:4000"
        );
        assert_eq!(
            policy.allow_origin(Some("http://127.0.0.1:8080")),
            "http://127.0.0.1:8080"
        );
    }

    #[test]
    fn test_foreign_origin_gets_primary() {
        let policy = CorsPolicy::default();
        assert_eq!(policy.allow_origin(Some("https://evil.example")), "https://1mb.dev");
        assert_eq!(policy.allow_origin(None), "https://1mb.dev");
    }
}
