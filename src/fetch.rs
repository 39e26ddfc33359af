//! Requests, responses, and the injected network seam.
//!
//! `Response` is an immutable value type with a cheaply clonable `Bytes`
//! body; `clone()` stands in for the platform's clone-before-consume rule
//! on single-read streams.

use async_trait::async_trait;
use bytes::Bytes;
use hashbrown::HashMap;

use crate::SwError;

/// What kind of resource a request is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Destination {
    /// Full-page navigation. The only destination with an offline fallback.
    Document,
    Script,
    Style,
    Image,
    Font,
    #[default]
    Other,
}

/// An inbound resource request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// Request URL (path or absolute).
    pub url: String,

    /// Request method.
    pub method: String,

    /// Destination type.
    pub destination: Destination,
}

impl Request {
    /// Create a GET request.
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: "GET".to_string(),
            destination: Destination::Other,
        }
    }

    /// Create a GET request for a full-page navigation.
    pub fn navigation(url: impl Into<String>) -> Self {
        Self::get(url).with_destination(Destination::Document)
    }

    /// Set the destination type.
    pub fn with_destination(mut self, destination: Destination) -> Self {
        self.destination = destination;
        self
    }

    /// Cache identity: method + URL.
    pub fn cache_key(&self) -> String {
        format!("{} {}", self.method, self.url)
    }

    /// Check if this is a full-page navigation.
    pub fn is_navigation(&self) -> bool {
        self.destination == Destination::Document
    }
}

/// Response type classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseType {
    /// Same-origin, inspectable. The only type eligible for caching.
    Basic,
    /// Cross-origin; body and status are not inspectable.
    Opaque,
    /// Network-level failure.
    Error,
}

/// A network or cached result.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    /// Status code.
    pub status: u16,

    /// Status text.
    pub status_text: String,

    /// Type classification.
    pub response_type: ResponseType,

    /// Response headers.
    pub headers: HashMap<String, String>,

    /// Response body.
    pub body: Bytes,
}

impl Response {
    /// Create a 200 OK basic response.
    pub fn basic(body: impl Into<Bytes>) -> Self {
        Self {
            status: 200,
            status_text: "OK".to_string(),
            response_type: ResponseType::Basic,
            headers: HashMap::new(),
            body: body.into(),
        }
    }

    /// Create a basic response with the given status.
    pub fn with_status(status: u16, status_text: impl Into<String>) -> Self {
        Self {
            status,
            status_text: status_text.into(),
            response_type: ResponseType::Basic,
            headers: HashMap::new(),
            body: Bytes::new(),
        }
    }

    /// Create an opaque cross-origin response.
    pub fn opaque(body: impl Into<Bytes>) -> Self {
        Self {
            status: 0,
            status_text: String::new(),
            response_type: ResponseType::Opaque,
            headers: HashMap::new(),
            body: body.into(),
        }
    }

    /// Get a header value.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(|v| v.as_str())
    }

    /// Check if this response may be written to a cache store: basic type
    /// and a 200 status. Keeps error pages and opaque blobs out.
    pub fn is_cacheable(&self) -> bool {
        self.status == 200 && self.response_type == ResponseType::Basic
    }

    /// Get body as text.
    pub fn text(&self) -> Result<String, std::string::FromUtf8Error> {
        String::from_utf8(self.body.to_vec())
    }
}

/// The injected network seam. The host wires this to its real fetch stack;
/// tests substitute a scripted backend.
#[async_trait]
pub trait NetworkBackend: Send + Sync {
    /// Perform the request. A rejected fetch (offline, DNS failure) is an
    /// `Err`; an HTTP error status is still an `Ok` response.
    async fn fetch(&self, request: &Request) -> Result<Response, SwError>;
}
