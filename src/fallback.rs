//! Offline-page fallback decision for intercepted navigation requests.

/// Destination of an intercepted fetch, as reported by the service worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestDestination {
    /// Full-document navigation: address bar entry, reload, bookmark.
    Document,
    /// In-app data fetch.
    Data,
    /// Script asset.
    Script,
    /// Stylesheet asset.
    Style,
    /// Image asset.
    Image,
    /// Font asset.
    Font,
    /// Anything else.
    Other,
}

/// Minimal view of an intercepted request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    /// Request method.
    pub method: String,
    /// Request destination.
    pub destination: RequestDestination,
    /// Request headers as name/value pairs.
    pub headers: Vec<(String, String)>,
}

impl FetchRequest {
    /// Builds a request with no headers.
    pub fn new(method: impl Into<String>, destination: RequestDestination) -> Self {
        Self {
            method: method.into(),
            destination,
            headers: Vec::new(),
        }
    }

    /// Adds one header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Decides whether a failed request should be served the cached offline page.
///
/// Only hard document navigations qualify. Partial-navigation data requests
/// are tagged with a framework header and must fail through to in-app error
/// handling; serving HTML in their place would corrupt client-side routing
/// state. Pure predicate, no state of its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackMatcher {
    data_request_header: String,
}

impl FallbackMatcher {
    /// Creates a matcher that treats requests carrying
    /// `data_request_header` as partial navigations.
    pub fn new(data_request_header: impl Into<String>) -> Self {
        Self {
            data_request_header: data_request_header.into(),
        }
    }

    /// True when the failed request should receive the offline page.
    pub fn matches(&self, request: &FetchRequest) -> bool {
        request.method.eq_ignore_ascii_case("GET")
            && request.destination == RequestDestination::Document
            && request.header(&self.data_request_header).is_none()
    }
}

impl Default for FallbackMatcher {
    fn default() -> Self {
        Self::new("x-nextjs-data")
    }
}
