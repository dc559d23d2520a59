use std::borrow::Cow;
use std::fmt;
use std::io;

use crate::http::response::StatusCode;

/// Why no request could be taken off a connection.
#[derive(Debug)]
pub enum RequestError {
    /// The bytes received are not an acceptable request. Always answered with
    /// a bodiless response carrying `status`.
    Status {
        status: StatusCode,
        reason: Cow<'static, str>,
    },
    /// An idle persistent connection reached its keep-alive timeout.
    Timeout,
    /// The peer closed the connection before sending another request.
    Closed,
    /// Reading failed below HTTP, typically a reset by the peer.
    Io(io::Error),
}

impl RequestError {
    pub fn bad_request(reason: impl Into<Cow<'static, str>>) -> Self {
        RequestError::Status {
            status: StatusCode::BadRequest,
            reason: reason.into(),
        }
    }

    /// The status to answer with, if this error deserves a response at all.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            RequestError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestError::Status { status, reason } => {
                write!(f, "{} {}: {}", status.as_u16(), status.reason_phrase(), reason)
            }
            RequestError::Timeout => f.write_str("keep-alive timeout"),
            RequestError::Closed => f.write_str("connection closed by peer"),
            RequestError::Io(e) => write!(f, "read failed: {e}"),
        }
    }
}

impl std::error::Error for RequestError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RequestError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for RequestError {
    fn from(e: io::Error) -> Self {
        RequestError::Io(e)
    }
}

/// A response could not be delivered to the client.
#[derive(Debug)]
pub enum SendError {
    Io(io::Error),
    /// The body file held fewer bytes than `content-length` promised.
    ShortBody { expected: u64, written: u64 },
}

impl fmt::Display for SendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SendError::Io(e) => write!(f, "failed to send response: {e}"),
            SendError::ShortBody { expected, written } => write!(
                f,
                "failed to send response: body ended after {written} of {expected} bytes"
            ),
        }
    }
}

impl std::error::Error for SendError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SendError::Io(e) => Some(e),
            SendError::ShortBody { .. } => None,
        }
    }
}

impl From<io::Error> for SendError {
    fn from(e: io::Error) -> Self {
        SendError::Io(e)
    }
}
