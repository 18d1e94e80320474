use reqwest::Url;
use serde::Serialize;

/// An intercepted outbound request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub method: String,
    pub url: Url,
}

impl FetchRequest {
    pub fn new(method: impl Into<String>, url: Url) -> Self {
        Self {
            method: method.into().to_uppercase(),
            url,
        }
    }

    pub fn get(url: Url) -> Self {
        Self::new("GET", url)
    }

    pub fn post(url: Url) -> Self {
        Self::new("POST", url)
    }

    pub fn is_get(&self) -> bool {
        self.method == "GET"
    }

    /// Identity of the request inside a cache generation.
    pub fn cache_key(&self) -> String {
        format!("{} {}", self.method, self.url)
    }
}

/// Snapshot of a response as stored in, or served from, a cache generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl CachedResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    /// A response with a JSON body and `Content-Type: application/json`.
    pub fn json<T: Serialize>(status: u16, value: &T) -> Self {
        let body = serde_json::to_vec(value).unwrap_or_default();
        Self::new(status, body).with_header("Content-Type", "application/json")
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Only a plain 200 is worth caching; redirects, errors and partial
    /// content pass through untouched.
    pub fn is_cacheable(&self) -> bool {
        self.status == 200
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Which caching policy applies to a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestClass {
    /// Counter API - network first, synthetic fallback when offline.
    Api,
    /// Web fonts - stale-while-revalidate.
    Font,
    /// Everything else - cache first.
    Static,
}
