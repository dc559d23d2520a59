use std::collections::HashMap;

/// HTTP request methods.
///
/// Every registered method is recognized so that the parser can tell an
/// unsupported method apart from garbage, but only `GET` is served.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// GET - Retrieve a resource
    GET,
    /// HEAD - Like GET but without the response body
    HEAD,
    /// POST - Create or submit data
    POST,
    /// PUT - Replace a resource
    PUT,
    /// DELETE - Delete a resource
    DELETE,
    /// OPTIONS - Describe communication options
    OPTIONS,
    /// PATCH - Partial modification of a resource
    PATCH,
    /// CONNECT - Establish a tunnel
    CONNECT,
    /// TRACE - Loop-back test
    TRACE,
}

impl Method {
    /// Parses an HTTP method token. Method names are case-sensitive.
    ///
    /// # Example
    ///
    /// ```
    /// # use lantern::http::request::Method;
    /// assert_eq!(Method::parse("GET"), Some(Method::GET));
    /// assert_eq!(Method::parse("get"), None);
    /// ```
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "GET" => Some(Method::GET),
            "HEAD" => Some(Method::HEAD),
            "POST" => Some(Method::POST),
            "PUT" => Some(Method::PUT),
            "DELETE" => Some(Method::DELETE),
            "OPTIONS" => Some(Method::OPTIONS),
            "PATCH" => Some(Method::PATCH),
            "CONNECT" => Some(Method::CONNECT),
            "TRACE" => Some(Method::TRACE),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::GET => "GET",
            Method::HEAD => "HEAD",
            Method::POST => "POST",
            Method::PUT => "PUT",
            Method::DELETE => "DELETE",
            Method::OPTIONS => "OPTIONS",
            Method::PATCH => "PATCH",
            Method::CONNECT => "CONNECT",
            Method::TRACE => "TRACE",
        }
    }

    /// Whether the server implements this method.
    pub fn is_supported(&self) -> bool {
        matches!(self, Method::GET)
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed, validated HTTP request.
///
/// Only produced through [`RequestBuilder::build`], which guarantees that a
/// `host` header is present and that header names are lower-case.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    /// Absolute path, e.g. "/index.html". Never the bare "/".
    pub target: String,
    /// HTTP version token, e.g. "HTTP/1.1"
    pub version: String,
    /// Lower-cased header names; repeated fields joined with ','
    pub headers: HashMap<String, String>,
    keep_alive_requested: bool,
}

/// Builder for constructing Request objects.
pub struct RequestBuilder {
    method: Option<Method>,
    target: Option<String>,
    version: Option<String>,
    headers: HashMap<String, String>,
}

impl RequestBuilder {
    pub fn new() -> Self {
        Self {
            method: None,
            target: None,
            version: None,
            headers: HashMap::new(),
        }
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    pub fn target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Adds a header field. A name seen before has the new value appended
    /// to the existing one, separated by a comma.
    pub fn header(mut self, key: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.push_header(key.as_ref(), value.into());
        self
    }

    pub(crate) fn push_header(&mut self, key: &str, value: String) {
        let key = key.to_ascii_lowercase();
        match self.headers.get_mut(&key) {
            Some(existing) => {
                existing.push(',');
                existing.push_str(&value);
            }
            None => {
                self.headers.insert(key, value);
            }
        }
    }

    pub(crate) fn header_count(&self) -> usize {
        self.headers.len()
    }

    pub fn build(self) -> Result<Request, &'static str> {
        let target = self.target.ok_or("target missing")?;
        if !target.starts_with('/') {
            return Err("target must be an absolute path");
        }
        if !self.headers.contains_key("host") {
            return Err("missing host header");
        }
        let keep_alive_requested = self
            .headers
            .get("connection")
            .is_some_and(|v| v.trim().eq_ignore_ascii_case("keep-alive"));

        Ok(Request {
            method: self.method.ok_or("method missing")?,
            target,
            version: self.version.unwrap_or_else(|| "HTTP/1.1".to_string()),
            headers: self.headers,
            keep_alive_requested,
        })
    }
}

impl Default for RequestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl Request {
    /// Retrieves a header value by name. Names are matched case-insensitively.
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers
            .get(&key.to_ascii_lowercase())
            .map(|v| v.as_str())
    }

    /// Whether the client sent `connection: keep-alive`.
    ///
    /// Unlike the HTTP/1.1 default, persistence is only granted on an explicit
    /// request.
    pub fn keep_alive(&self) -> bool {
        self.keep_alive_requested
    }

    pub fn user_agent(&self) -> Option<&str> {
        self.header("user-agent")
    }
}
