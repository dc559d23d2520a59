use bytes::{BufMut, BytesMut};
use tokio::io::{AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::http::error::SendError;
use crate::http::response::{Body, Response};

pub const HTTP_VERSION: &str = "HTTP/1.1";

/// Status line, header lines and the blank line that ends them.
fn serialize_head(resp: &Response) -> BytesMut {
    let mut buf = BytesMut::with_capacity(256);

    // Status line
    let status_line = format!(
        "{} {} {}\r\n",
        HTTP_VERSION,
        resp.status.as_u16(),
        resp.status.reason_phrase()
    );
    buf.put_slice(status_line.as_bytes());

    // Headers
    for (k, v) in &resp.headers {
        buf.put_slice(k.as_bytes());
        buf.put_slice(b": ");
        buf.put_slice(v.as_bytes());
        buf.put_slice(b"\r\n");
    }

    // Header/body separator
    buf.put_slice(b"\r\n");

    buf
}

/// Writes one response onto a sink.
///
/// The writer borrows the sink and never closes it; whoever owns the
/// connection decides that after `write_to_stream` returns.
pub struct ResponseWriter<'a> {
    response: &'a Response,
    head: BytesMut,
}

impl<'a> ResponseWriter<'a> {
    pub fn new(response: &'a Response) -> Self {
        Self {
            response,
            head: serialize_head(response),
        }
    }

    /// Writes head and body, then flushes. Returns the number of body bytes sent.
    pub async fn write_to_stream<W>(self, stream: &mut W) -> Result<u64, SendError>
    where
        W: AsyncWrite + Unpin,
    {
        stream.write_all(&self.head).await?;

        let written = match &self.response.body {
            Body::Empty => 0,
            Body::File { path, len } => {
                let file = tokio::fs::File::open(path).await?;
                // Never send more than content-length announced, even if the
                // file grew in the meantime.
                let written = tokio::io::copy(&mut file.take(*len), stream).await?;
                if written < *len {
                    return Err(SendError::ShortBody {
                        expected: *len,
                        written,
                    });
                }
                written
            }
        };

        stream.flush().await?;
        Ok(written)
    }
}
