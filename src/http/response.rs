use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::{Duration, SystemTime};

use crate::config::KeepAliveConfig;

/// Value of the `server` header.
pub const SERVER_NAME: &str = concat!("lantern/", env!("CARGO_PKG_VERSION"));

/// HTTP status codes the server can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusCode {
    /// 100 Continue
    Continue,
    /// 200 OK
    Ok,
    /// 304 Not Modified
    NotModified,
    /// 400 Bad Request
    BadRequest,
    /// 401 Unauthorized
    Unauthorized,
    /// 403 Forbidden
    Forbidden,
    /// 404 Not Found
    NotFound,
    /// 500 Internal Server Error
    InternalServerError,
    /// 501 Not Implemented
    NotImplemented,
    /// 503 Service Unavailable
    ServiceUnavailable,
    /// 505 HTTP Version Not Supported
    HttpVersionNotSupported,
}

impl StatusCode {
    /// Returns the numeric HTTP status code.
    ///
    /// # Example
    ///
    /// ```
    /// # use lantern::http::response::StatusCode;
    /// assert_eq!(StatusCode::Ok.as_u16(), 200);
    /// assert_eq!(StatusCode::NotImplemented.as_u16(), 501);
    /// ```
    pub fn as_u16(&self) -> u16 {
        match self {
            StatusCode::Continue => 100,
            StatusCode::Ok => 200,
            StatusCode::NotModified => 304,
            StatusCode::BadRequest => 400,
            StatusCode::Unauthorized => 401,
            StatusCode::Forbidden => 403,
            StatusCode::NotFound => 404,
            StatusCode::InternalServerError => 500,
            StatusCode::NotImplemented => 501,
            StatusCode::ServiceUnavailable => 503,
            StatusCode::HttpVersionNotSupported => 505,
        }
    }

    /// Returns the standard HTTP reason phrase for this status code.
    ///
    /// # Example
    ///
    /// ```
    /// # use lantern::http::response::StatusCode;
    /// assert_eq!(StatusCode::NotFound.reason_phrase(), "Not Found");
    /// ```
    pub fn reason_phrase(&self) -> &'static str {
        match self {
            StatusCode::Continue => "Continue",
            StatusCode::Ok => "OK",
            StatusCode::NotModified => "Not Modified",
            StatusCode::BadRequest => "Bad Request",
            StatusCode::Unauthorized => "Unauthorized",
            StatusCode::Forbidden => "Forbidden",
            StatusCode::NotFound => "Not Found",
            StatusCode::InternalServerError => "Internal Server Error",
            StatusCode::NotImplemented => "Not Implemented",
            StatusCode::ServiceUnavailable => "Service Unavailable",
            StatusCode::HttpVersionNotSupported => "HTTP Version Not Supported",
        }
    }
}

/// What follows the header block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Body {
    Empty,
    /// Streamed from disk by the writer; `len` is what `content-length` advertises.
    File { path: PathBuf, len: u64 },
}

/// Persistent-connection decision for one response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeepAlive {
    Close,
    /// Keep the connection open; `remaining` more requests are allowed on it.
    Persist { timeout: Duration, remaining: u32 },
}

/// Server-side keep-alive settings, applied per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeepAlivePolicy {
    pub enabled: bool,
    pub timeout: Duration,
    pub max_requests: u32,
}

impl KeepAlivePolicy {
    pub fn from_config(cfg: &KeepAliveConfig) -> Self {
        Self {
            enabled: cfg.enabled,
            timeout: cfg.timeout(),
            max_requests: cfg.max_requests,
        }
    }

    /// Decides whether the response to request number `served` (zero based)
    /// may keep the connection open.
    ///
    /// The connection persists only if the server enables it, the client
    /// asked for it, and at least one more request fits in the budget.
    ///
    /// ```
    /// # use std::time::Duration;
    /// # use lantern::http::response::{KeepAlive, KeepAlivePolicy};
    /// let policy = KeepAlivePolicy { enabled: true, timeout: Duration::from_secs(3), max_requests: 5 };
    /// assert_eq!(
    ///     policy.decide(true, 0),
    ///     KeepAlive::Persist { timeout: Duration::from_secs(3), remaining: 4 }
    /// );
    /// assert_eq!(policy.decide(true, 4), KeepAlive::Close);
    /// assert_eq!(policy.decide(false, 0), KeepAlive::Close);
    /// ```
    pub fn decide(&self, requested: bool, served: u32) -> KeepAlive {
        if !self.enabled || !requested {
            return KeepAlive::Close;
        }
        let remaining = self.max_requests.saturating_sub(served.saturating_add(1));
        if remaining == 0 {
            KeepAlive::Close
        } else {
            KeepAlive::Persist {
                timeout: self.timeout,
                remaining,
            }
        }
    }
}

/// A complete HTTP response ready to be handed to the writer.
///
/// Header names are lower-case and iterate in sorted order.
#[derive(Debug)]
pub struct Response {
    pub status: StatusCode,
    pub headers: BTreeMap<String, String>,
    pub body: Body,
    pub keep_alive: KeepAlive,
}

impl Response {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(|v| v.as_str())
    }

    pub fn is_keep_alive(&self) -> bool {
        matches!(self.keep_alive, KeepAlive::Persist { .. })
    }
}

/// Builder for responses. `build` fills in the headers every response carries.
///
/// ```ignore
/// let response = ResponseBuilder::new(StatusCode::Ok)
///     .file(path, len)
///     .header("content-type", "text/html; charset=utf-8")
///     .keep_alive(policy.decide(true, 0))
///     .build();
/// ```
pub struct ResponseBuilder {
    status: StatusCode,
    headers: BTreeMap<String, String>,
    body: Body,
    keep_alive: KeepAlive,
    debug: bool,
}

impl ResponseBuilder {
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: BTreeMap::new(),
            body: Body::Empty,
            keep_alive: KeepAlive::Close,
            debug: false,
        }
    }

    /// Adds or replaces a header. The name is lower-cased.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .insert(key.into().to_ascii_lowercase(), value.into());
        self
    }

    /// Serves `len` bytes of the file at `path` as the body.
    pub fn file(mut self, path: impl Into<PathBuf>, len: u64) -> Self {
        self.body = Body::File {
            path: path.into(),
            len,
        };
        self
    }

    pub fn keep_alive(mut self, keep_alive: KeepAlive) -> Self {
        self.keep_alive = keep_alive;
        self
    }

    /// Adds the `x-server-thread` diagnostic header.
    pub fn debug(mut self, enabled: bool) -> Self {
        self.debug = enabled;
        self
    }

    pub fn build(mut self) -> Response {
        let date = httpdate::fmt_http_date(SystemTime::now());
        self.headers.insert("date".to_string(), date);
        self.headers
            .insert("server".to_string(), SERVER_NAME.to_string());

        match &self.body {
            Body::File { len, .. } => {
                self.headers
                    .insert("content-length".to_string(), len.to_string());
            }
            Body::Empty => {
                if matches!(self.status, StatusCode::NotFound | StatusCode::Forbidden) {
                    self.headers
                        .insert("content-length".to_string(), "0".to_string());
                }
            }
        }

        // Without a length the client can only find the end of the message
        // by seeing the connection close.
        if !self.headers.contains_key("content-length") {
            self.keep_alive = KeepAlive::Close;
        }

        match self.keep_alive {
            KeepAlive::Persist { timeout, remaining } => {
                self.headers
                    .insert("connection".to_string(), "keep-alive".to_string());
                self.headers.insert(
                    "keep-alive".to_string(),
                    format!("timeout={},max={}", timeout.as_secs(), remaining),
                );
            }
            KeepAlive::Close => {
                self.headers
                    .insert("connection".to_string(), "close".to_string());
            }
        }

        if self.debug {
            self.headers.insert(
                "x-server-thread".to_string(),
                format!("{:?}", std::thread::current().id()),
            );
        }

        Response {
            status: self.status,
            headers: self.headers,
            body: self.body,
            keep_alive: self.keep_alive,
        }
    }
}
