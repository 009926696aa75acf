//! Service-worker cache dispatcher: offline support for the site.
//!
//! Requests are classified by path and routed through cache-first or
//! network-first strategies against named, versioned caches. Activation
//! performs a generational sweep: every cache not matching the current
//! static/dynamic names is deleted wholesale.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use log::{debug, error, info};
use regex::Regex;

use crate::fetch::{Fetch, FetchResponse};

/// Build tag baked into the cache names.
pub const SW_VERSION: &str = "1.0.0";

/// Critical resources cached at install, all-or-nothing.
pub const CRITICAL_RESOURCES: &[&str] = &[
    "/",
    "/index.html",
    "/data/portfolio-en.json",
    "/data/portfolio-pt-PT.json",
    "/img/profile.jpg",
    "/favicon.ico",
];

const OFFLINE_PAGE: &str = "/offline.html";

pub fn static_cache_name(version: &str) -> String {
    format!("portfolio-static-v{}", version)
}

pub fn dynamic_cache_name(version: &str) -> String {
    format!("portfolio-dynamic-v{}", version)
}

/// An intercepted request, reduced to what dispatch needs.
#[derive(Debug, Clone)]
pub struct SwRequest {
    pub method: String,
    pub url: String,
    /// True for page navigations (address bar, link clicks).
    pub is_navigation: bool,
}

impl SwRequest {
    pub fn get(url: &str) -> Self {
        SwRequest {
            method: "GET".to_string(),
            url: url.to_string(),
            is_navigation: false,
        }
    }

    pub fn navigate(url: &str) -> Self {
        SwRequest {
            method: "GET".to_string(),
            url: url.to_string(),
            is_navigation: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwResponse {
    pub status: u16,
    pub status_text: String,
    pub body: Vec<u8>,
}

impl SwResponse {
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    fn offline() -> Self {
        SwResponse {
            status: 503,
            status_text: "Service Unavailable".to_string(),
            body: b"Offline - Resource not available".to_vec(),
        }
    }

    fn from_fetch(response: &FetchResponse) -> Self {
        SwResponse {
            status: response.status,
            status_text: String::new(),
            body: response.body.clone(),
        }
    }
}

/// Named request→response caches.
pub struct CacheSet {
    caches: Mutex<HashMap<String, HashMap<String, SwResponse>>>,
}

impl CacheSet {
    pub fn new() -> Self {
        CacheSet {
            caches: Mutex::new(HashMap::new()),
        }
    }

    pub fn put(&self, cache_name: &str, url: &str, response: SwResponse) {
        let mut caches = self.caches.lock().unwrap();
        caches
            .entry(cache_name.to_string())
            .or_default()
            .insert(url.to_string(), response);
    }

    /// Match across every cache, like the global `caches.match`.
    pub fn match_request(&self, url: &str) -> Option<SwResponse> {
        let caches = self.caches.lock().unwrap();
        caches.values().find_map(|entries| entries.get(url).cloned())
    }

    pub fn match_in(&self, cache_name: &str, url: &str) -> Option<SwResponse> {
        let caches = self.caches.lock().unwrap();
        caches.get(cache_name)?.get(url).cloned()
    }

    pub fn delete_cache(&self, cache_name: &str) -> bool {
        self.caches.lock().unwrap().remove(cache_name).is_some()
    }

    pub fn cache_names(&self) -> Vec<String> {
        self.caches.lock().unwrap().keys().cloned().collect()
    }
}

impl Default for CacheSet {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStrategy {
    CacheFirst,
    NetworkFirst,
}

pub struct ServiceWorker {
    caches: CacheSet,
    fetcher: Arc<dyn Fetch>,
    static_cache: String,
    dynamic_cache: String,
    static_asset_re: Regex,
}

impl ServiceWorker {
    pub fn new(fetcher: Arc<dyn Fetch>, version: &str) -> Self {
        ServiceWorker {
            caches: CacheSet::new(),
            fetcher,
            static_cache: static_cache_name(version),
            dynamic_cache: dynamic_cache_name(version),
            static_asset_re: Regex::new(
                r"(?i)\.(css|js|png|jpg|jpeg|gif|svg|ico|woff|woff2|ttf|eot)$",
            )
            .unwrap(),
        }
    }

    pub fn caches(&self) -> &CacheSet {
        &self.caches
    }

    /// Pre-populate the static cache with the critical manifest.
    /// All-or-nothing: one failed resource fails the install and
    /// nothing is committed.
    pub fn install(&self) -> Result<(), String> {
        let mut fetched = Vec::with_capacity(CRITICAL_RESOURCES.len());
        for resource in CRITICAL_RESOURCES {
            let response = self
                .fetcher
                .fetch(resource)
                .map_err(|e| format!("Failed to cache {}: {}", resource, e))?;
            if !response.ok() {
                error!("Failed to cache critical resource {}: status {}", resource, response.status);
                return Err(format!(
                    "Failed to cache {}: status {}",
                    resource, response.status
                ));
            }
            fetched.push((*resource, SwResponse::from_fetch(&response)));
        }
        for (url, response) in fetched {
            self.caches.put(&self.static_cache, url, response);
        }
        info!("Critical resources cached successfully");
        Ok(())
    }

    /// Generational sweep: delete every cache that is neither the
    /// current static nor dynamic cache.
    pub fn activate(&self) {
        for name in self.caches.cache_names() {
            if name != self.static_cache && name != self.dynamic_cache {
                info!("Deleting old cache: {}", name);
                self.caches.delete_cache(&name);
            }
        }
    }

    /// Strategy and target cache for a request path. Order matters:
    /// static assets, then data files, then HTML pages, then the rest.
    pub fn classify(&self, path: &str) -> (FetchStrategy, &str) {
        if self.is_static_asset(path) {
            (FetchStrategy::CacheFirst, self.static_cache.as_str())
        } else if Self::is_data_file(path) {
            (FetchStrategy::NetworkFirst, self.dynamic_cache.as_str())
        } else if Self::is_html_page(path) {
            (FetchStrategy::NetworkFirst, self.static_cache.as_str())
        } else {
            (FetchStrategy::NetworkFirst, self.dynamic_cache.as_str())
        }
    }

    fn is_static_asset(&self, path: &str) -> bool {
        self.static_asset_re.is_match(path)
    }

    fn is_data_file(path: &str) -> bool {
        path.contains("/data/") && path.ends_with(".json")
    }

    fn is_html_page(path: &str) -> bool {
        path.ends_with(".html") || path == "/"
    }

    /// Dispatch one request. `None` means pass through untouched:
    /// non-GET methods, non-HTTP(S) schemes, and browser-extension or
    /// devtools paths are not intercepted.
    pub fn handle(&self, request: &SwRequest) -> Option<SwResponse> {
        if request.method != "GET" {
            return None;
        }
        let path = Self::request_path(&request.url)?;
        if path.starts_with("/chrome-extension") || path.starts_with("/devtools") {
            return None;
        }

        let (strategy, cache_name) = self.classify(&path);
        let cache_name = cache_name.to_string();
        let response = match strategy {
            FetchStrategy::CacheFirst => self.cache_first(request, &cache_name),
            FetchStrategy::NetworkFirst => self.network_first(request, &cache_name),
        };
        Some(response)
    }

    /// Path component of the request URL, or `None` for schemes the
    /// worker does not intercept.
    fn request_path(raw: &str) -> Option<String> {
        match url::Url::parse(raw) {
            Ok(parsed) => {
                if parsed.scheme() == "http" || parsed.scheme() == "https" {
                    Some(parsed.path().to_string())
                } else {
                    None
                }
            }
            // Path-only request URLs are same-origin by definition.
            Err(_) if raw.starts_with('/') => {
                Some(raw.split(['?', '#']).next().unwrap_or(raw).to_string())
            }
            Err(_) => None,
        }
    }

    fn cache_first(&self, request: &SwRequest, cache_name: &str) -> SwResponse {
        if let Some(cached) = self.caches.match_request(&request.url) {
            debug!("Cache hit: {}", request.url);
            return cached;
        }
        match self.fetcher.fetch(&request.url) {
            Ok(network) => {
                let response = SwResponse::from_fetch(&network);
                if response.ok() {
                    self.caches.put(cache_name, &request.url, response.clone());
                }
                response
            }
            Err(e) => {
                error!("Cache-first strategy failed for {}: {}", request.url, e);
                SwResponse::offline()
            }
        }
    }

    fn network_first(&self, request: &SwRequest, cache_name: &str) -> SwResponse {
        match self.fetcher.fetch(&request.url) {
            Ok(network) => {
                let response = SwResponse::from_fetch(&network);
                if response.ok() {
                    self.caches.put(cache_name, &request.url, response.clone());
                }
                response
            }
            Err(e) => {
                debug!("Network failed for {}, trying cache: {}", request.url, e);
                if let Some(cached) = self.caches.match_request(&request.url) {
                    return cached;
                }
                if request.is_navigation {
                    if let Some(offline) = self.caches.match_request(OFFLINE_PAGE) {
                        return offline;
                    }
                }
                SwResponse::offline()
            }
        }
    }
}
