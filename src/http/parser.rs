use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};

use crate::config::{Config, Limits};
use crate::http::error::RequestError;
use crate::http::request::{Method, Request, RequestBuilder};
use crate::http::response::StatusCode;

/// Reads requests off a buffered byte stream, one at a time.
///
/// Lines may end in CRLF or a bare LF. The parser consumes exactly one
/// message, including any declared body, so the stream is positioned at the
/// start of the next request afterwards.
#[derive(Debug, Clone)]
pub struct RequestParser {
    default_document: String,
    limits: Limits,
}

impl RequestParser {
    pub fn new(default_document: impl Into<String>, limits: Limits) -> Self {
        Self {
            default_document: default_document.into(),
            limits,
        }
    }

    pub fn from_config(cfg: &Config) -> Self {
        Self::new(cfg.default_document.clone(), cfg.limits)
    }

    pub async fn parse<R>(&self, reader: &mut R) -> Result<Request, RequestError>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut line = Vec::with_capacity(256);

        // Start line. Nothing at all means the peer went away between requests.
        let start_line = match self.read_line(reader, &mut line).await? {
            Some(l) => l,
            None => return Err(RequestError::Closed),
        };
        tracing::debug!(start_line = %start_line, "Request received");

        let (method, target, version) = parse_start_line(&start_line)?;
        let target = if target == "/" {
            format!("/{}", self.default_document)
        } else {
            target.to_string()
        };

        let mut builder = RequestBuilder::new()
            .method(method)
            .target(target)
            .version(version);

        // Header fields up to the blank line
        let mut fields = 0usize;
        loop {
            let header_line = self
                .read_line(reader, &mut line)
                .await?
                .ok_or_else(|| RequestError::bad_request("unexpected end of request"))?;
            if header_line.is_empty() {
                break;
            }

            fields += 1;
            if fields > self.limits.max_header_count {
                return Err(RequestError::bad_request("too many header fields"));
            }

            let (name, value) = parse_header_line(&header_line)?;
            builder.push_header(name, value.to_string());
        }
        tracing::trace!(fields, distinct = builder.header_count(), "Headers parsed");

        let request = builder.build().map_err(RequestError::bad_request)?;

        // Discard any body so the next request starts on a clean boundary
        let body_len = match request.header("content-length") {
            Some(v) => v
                .trim()
                .parse::<u64>()
                .map_err(|_| RequestError::bad_request("invalid content-length"))?,
            None => 0,
        };
        if body_len > self.limits.max_body_bytes {
            return Err(RequestError::bad_request("request body too large"));
        }
        if body_len > 0 {
            let drained =
                tokio::io::copy(&mut (&mut *reader).take(body_len), &mut tokio::io::sink()).await?;
            if drained < body_len {
                return Err(RequestError::bad_request("unexpected end of request"));
            }
        }

        Ok(request)
    }

    /// Reads one line without its terminator. `None` means end of stream
    /// before any byte; a final line without a terminator is returned as is.
    async fn read_line<R>(
        &self,
        reader: &mut R,
        buf: &mut Vec<u8>,
    ) -> Result<Option<String>, RequestError>
    where
        R: AsyncBufRead + Unpin,
    {
        buf.clear();
        let max = self.limits.max_header_line_bytes;
        // Room for the longest allowed line plus CRLF
        let limit = max as u64 + 2;

        let n = (&mut *reader).take(limit).read_until(b'\n', buf).await?;
        if n == 0 {
            return Ok(None);
        }

        if buf.last() == Some(&b'\n') {
            buf.pop();
            if buf.last() == Some(&b'\r') {
                buf.pop();
            }
        }
        if buf.len() > max {
            return Err(RequestError::bad_request("header line too long"));
        }

        let line = std::str::from_utf8(buf)
            .map_err(|_| RequestError::bad_request("line is not valid UTF-8"))?;
        Ok(Some(line.to_string()))
    }
}

/// Splits `METHOD SP TARGET SP VERSION` and validates each token.
fn parse_start_line(line: &str) -> Result<(Method, &str, &str), RequestError> {
    let mut parts = line.split(' ');
    let (Some(method), Some(target), Some(version), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(RequestError::bad_request("invalid start line"));
    };
    if method.is_empty() || target.is_empty() || version.is_empty() {
        return Err(RequestError::bad_request("invalid start line"));
    }

    let method = match Method::parse(method) {
        Some(m) if m.is_supported() => m,
        _ => {
            return Err(RequestError::Status {
                status: StatusCode::NotImplemented,
                reason: format!("method {method} not implemented").into(),
            });
        }
    };

    check_version(version)?;

    if !target.starts_with('/') {
        return Err(RequestError::bad_request("request target must be an absolute path"));
    }

    Ok((method, target, version))
}

/// Accepts `HTTP/1.x`; other well-formed versions get 505.
fn check_version(version: &str) -> Result<(), RequestError> {
    let digits = version
        .strip_prefix("HTTP/")
        .and_then(|v| v.split_once('.'))
        .filter(|(major, minor)| {
            !major.is_empty()
                && !minor.is_empty()
                && major.bytes().all(|b| b.is_ascii_digit())
                && minor.bytes().all(|b| b.is_ascii_digit())
        });

    match digits {
        None => Err(RequestError::bad_request("invalid HTTP version")),
        Some(("1", _)) => Ok(()),
        Some(_) => Err(RequestError::Status {
            status: StatusCode::HttpVersionNotSupported,
            reason: format!("version {version} not supported").into(),
        }),
    }
}

/// `field-name ":" OWS field-value OWS`
fn parse_header_line(line: &str) -> Result<(&str, &str), RequestError> {
    let (name, value) = line
        .split_once(':')
        .ok_or_else(|| RequestError::bad_request("malformed header field"))?;

    if name.is_empty()
        || name
            .bytes()
            .any(|b| b.is_ascii_whitespace() || b.is_ascii_control())
    {
        return Err(RequestError::bad_request("malformed header field name"));
    }

    Ok((name, value.trim_matches(|c: char| c == ' ' || c == '\t')))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_line_needs_exactly_three_tokens() {
        assert!(parse_start_line("GET / HTTP/1.1").is_ok());
        for line in ["GET /", "GET  / HTTP/1.1", "GET / HTTP/1.1 extra", ""] {
            let err = parse_start_line(line).unwrap_err();
            assert_eq!(err.status(), Some(StatusCode::BadRequest), "{line:?}");
        }
    }

    #[test]
    fn version_checks() {
        assert!(check_version("HTTP/1.0").is_ok());
        assert!(check_version("HTTP/1.1").is_ok());
        assert_eq!(
            check_version("HTTP/2.0").unwrap_err().status(),
            Some(StatusCode::HttpVersionNotSupported)
        );
        for bad in ["HTTP/1", "http/1.1", "HTTP/x.1", "1.1"] {
            assert_eq!(
                check_version(bad).unwrap_err().status(),
                Some(StatusCode::BadRequest),
                "{bad}"
            );
        }
    }

    #[test]
    fn header_value_whitespace_is_trimmed() {
        assert_eq!(parse_header_line("Host:  example.com \t").unwrap(), ("Host", "example.com"));
        assert_eq!(parse_header_line("X-Empty:").unwrap(), ("X-Empty", ""));
        assert!(parse_header_line("Bad Name: x").is_err());
        assert!(parse_header_line(": x").is_err());
    }
}
