//! Offline worker configuration: cache generation, precache manifest and request classes.

use reqwest::Url;

/// Pages, styles, scripts and images precached on install.
pub const STATIC_ASSETS: &[&str] = &[
    "/",
    "/index.html",
    "/404.html",
    "/assets/css/style.css",
    "/assets/js/theme.js",
    "/assets/js/counter.js",
    "/assets/js/parallax.js",
    "/assets/images/favicon.svg",
    "/assets/images/logo.svg",
];

/// Fonts precached on install and then served stale-while-revalidate.
pub const FONT_ASSETS: &[&str] = &[
    "/assets/fonts/inter-latin.woff2",
    "/assets/fonts/space-grotesk-700-latin.woff2",
];

/// Name of a cache generation, e.g. `1mb-3f2a9c1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheGeneration(String);

impl CacheGeneration {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Generation stamped at build time from the commit being built.
    pub fn current() -> Self {
        Self(env!("CACHE_GENERATION").to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub generation: CacheGeneration,
    /// Site origin the manifest paths are relative to.
    pub origin: Url,
    pub static_assets: Vec<String>,
    pub font_assets: Vec<String>,
    /// Requests whose host contains this marker go to the counter API.
    pub api_host_marker: String,
    /// Requests whose path contains this segment are fonts.
    pub fonts_path: String,
}

impl WorkerConfig {
    pub fn new(origin: Url) -> Self {
        Self {
            generation: CacheGeneration::current(),
            origin,
            static_assets: STATIC_ASSETS.iter().map(|s| s.to_string()).collect(),
            font_assets: FONT_ASSETS.iter().map(|s| s.to_string()).collect(),
            api_host_marker: "workers.dev".to_string(),
            fonts_path: "/assets/fonts/".to_string(),
        }
    }

    pub fn with_generation(mut self, generation: CacheGeneration) -> Self {
        self.generation = generation;
        self
    }

    pub fn with_api_host_marker(mut self, marker: impl Into<String>) -> Self {
        self.api_host_marker = marker.into();
        self
    }

    /// Every precached path: static assets first, then fonts.
    pub fn manifest(&self) -> impl Iterator<Item = &str> {
        self.static_assets
            .iter()
            .chain(self.font_assets.iter())
            .map(String::as_str)
    }
}
