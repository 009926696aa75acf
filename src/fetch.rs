//! HTTP seam for static-file fetches.

use serde_json::Value;

/// A fetched response. A non-2xx status is still `Ok` at the transport
/// level; callers check [`ok`](FetchResponse::ok).
#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl FetchResponse {
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Decode the body as JSON.
    pub fn json(&self) -> Result<Value, String> {
        serde_json::from_slice(&self.body).map_err(|e| e.to_string())
    }
}

/// Transport trait. `Err` means the request never produced a response
/// (network down, DNS failure); HTTP errors come back as `Ok`.
pub trait Fetch: Send + Sync {
    fn fetch(&self, url: &str) -> Result<FetchResponse, String>;
}

/// Production fetcher over a blocking reqwest client. Path-only URLs
/// (the form every data URL in the crate takes) resolve against the
/// configured origin, the way the browser resolves them.
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
    origin: url::Url,
}

impl HttpFetcher {
    pub fn new(origin: &str) -> Result<Self, String> {
        Ok(HttpFetcher {
            client: reqwest::blocking::Client::new(),
            origin: url::Url::parse(origin).map_err(|e| e.to_string())?,
        })
    }
}

impl Fetch for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<FetchResponse, String> {
        let absolute = if url.starts_with("http://") || url.starts_with("https://") {
            url::Url::parse(url).map_err(|e| e.to_string())?
        } else {
            self.origin.join(url).map_err(|e| e.to_string())?
        };
        let response = self
            .client
            .get(absolute)
            .send()
            .map_err(|e| e.to_string())?;
        let status = response.status().as_u16();
        let body = response.bytes().map_err(|e| e.to_string())?.to_vec();
        Ok(FetchResponse { status, body })
    }
}
