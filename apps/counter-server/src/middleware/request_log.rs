//! Request log middleware - reports one `request` event per handled request.

use actix_web::{
    Error,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
    http::header::HeaderMap,
};
use std::future::{Future, Ready, ready};
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;

use counter_core::ports::{CounterEvent, EventSink, RequestSummary};

const UNKNOWN: &str = "unknown";
const USER_AGENT_LIMIT: usize = 50;

/// Where the request came from, as told by the edge headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    pub method: String,
    pub path: String,
    pub country: String,
    pub city: String,
    pub colo: String,
    pub user_agent: String,
}

impl RequestContext {
    pub fn from_parts(method: &str, path: &str, headers: &HeaderMap) -> Self {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .filter(|v| !v.is_empty())
        };

        Self {
            method: method.to_string(),
            path: path.to_string(),
            country: header("CF-IPCountry").unwrap_or(UNKNOWN).to_string(),
            city: header("CF-IPCity").unwrap_or(UNKNOWN).to_string(),
            // CF-Ray looks like `8a1b2c3d4e5f6789-AMS`.
            colo: header("CF-Ray")
                .and_then(|ray| ray.rsplit_once('-'))
                .map(|(_, colo)| colo.to_string())
                .unwrap_or_else(|| UNKNOWN.to_string()),
            user_agent: header("User-Agent")
                .map(|ua| ua.chars().take(USER_AGENT_LIMIT).collect())
                .unwrap_or_else(|| UNKNOWN.to_string()),
        }
    }

    pub fn finish(self, status: u16, duration_ms: u64, error: Option<String>) -> RequestSummary {
        RequestSummary {
            method: self.method,
            path: self.path,
            country: self.country,
            city: self.city,
            colo: self.colo,
            user_agent: self.user_agent,
            status,
            duration_ms,
            error,
        }
    }
}

/// Request log middleware factory.
pub struct RequestLog {
    events: Arc<dyn EventSink>,
}

impl RequestLog {
    pub fn new(events: Arc<dyn EventSink>) -> Self {
        Self { events }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RequestLog
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = RequestLogService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequestLogService {
            service,
            events: self.events.clone(),
        }))
    }
}

pub struct RequestLogService<S> {
    service: S,
    events: Arc<dyn EventSink>,
}

impl<S, B> Service<ServiceRequest> for RequestLogService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let start = Instant::now();
        let context = RequestContext::from_parts(req.method().as_str(), req.path(), req.headers());
        let events = self.events.clone();

        let fut = self.service.call(req);

        Box::pin(async move {
            let res = fut.await?;

            let status = res.status().as_u16();
            let error = res.response().error().map(|e| e.to_string());
            let duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

            events.emit(CounterEvent::Request(context.finish(status, duration_ms, error)));

            Ok(res)
        })
    }
}
