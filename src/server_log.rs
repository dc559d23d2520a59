//! Durable server log.
//!
//! Workers hand complete lines to a bounded queue drained by one background
//! task, so lines never interleave. When the queue is full the line is dropped
//! instead of making the worker wait: logging must never stall a request.

use std::fmt;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::SystemTime;

use serde::Deserialize;
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::sync::mpsc;

use crate::http::request::Request;
use crate::http::response::Response;

/// Queued lines before new ones are dropped.
pub const QUEUE_CAPACITY: usize = 100;

/// Log line severity, most important first. A configured threshold keeps
/// every severity up to and including itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Always,
    Connection,
    Error,
    Warning,
    Information,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Always => "ALWAYS",
            Severity::Connection => "CONNECTION",
            Severity::Error => "ERROR",
            Severity::Warning => "WARNING",
            Severity::Information => "INFO",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

struct Inner {
    tx: mpsc::Sender<String>,
    threshold: Severity,
    dropped: AtomicU64,
}

/// Cheap, cloneable handle to the log queue.
#[derive(Clone)]
pub struct ServerLog {
    inner: Option<Arc<Inner>>,
}

impl ServerLog {
    /// A log that discards everything.
    pub fn disabled() -> Self {
        Self { inner: None }
    }

    /// A log whose lines are delivered to the returned receiver.
    pub fn channel(capacity: usize, threshold: Severity) -> (Self, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(capacity);
        let log = Self {
            inner: Some(Arc::new(Inner {
                tx,
                threshold,
                dropped: AtomicU64::new(0),
            })),
        };
        (log, rx)
    }

    /// Opens `path` for appending and starts the writer task.
    ///
    /// If the file cannot be opened the server keeps running with a disabled
    /// log.
    pub async fn open(path: &Path, threshold: Severity) -> Self {
        let file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await;

        match file {
            Ok(file) => {
                let (log, rx) = Self::channel(QUEUE_CAPACITY, threshold);
                tokio::spawn(write_lines(rx, file));
                log
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "Could not open server log, continuing without it"
                );
                Self::disabled()
            }
        }
    }

    pub fn enabled(&self, severity: Severity) -> bool {
        self.inner
            .as_ref()
            .is_some_and(|inner| severity <= inner.threshold)
    }

    /// Queues one line. Never blocks.
    pub fn append(&self, severity: Severity, line: impl fmt::Display) {
        let Some(inner) = &self.inner else {
            return;
        };
        if severity > inner.threshold {
            return;
        }

        let stamped = format!(
            "{} {} {}",
            httpdate::fmt_http_date(SystemTime::now()),
            severity,
            line
        );
        if inner.tx.try_send(stamped).is_err() {
            inner.dropped.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Logs a finished exchange as
    /// `client server METHOD TARGET STATUS USER-AGENT`, with `-` standing in
    /// for request details when the request could not be parsed.
    pub fn connection(
        &self,
        request: Option<&Request>,
        response: &Response,
        client: SocketAddr,
        server: SocketAddr,
    ) {
        if !self.enabled(Severity::Connection) {
            return;
        }

        let status = response.status.as_u16();
        let line = match request {
            Some(req) => format!(
                "{client} {server} {} {} {status} {}",
                req.method,
                req.target,
                req.user_agent().unwrap_or("-")
            ),
            None => format!("{client} {server} - - {status} -"),
        };
        self.append(Severity::Connection, line);
    }

    /// Lines discarded because the queue was full.
    pub fn dropped(&self) -> u64 {
        self.inner
            .as_ref()
            .map_or(0, |inner| inner.dropped.load(Ordering::Relaxed))
    }
}

async fn write_lines(mut rx: mpsc::Receiver<String>, file: tokio::fs::File) {
    let mut out = BufWriter::new(file);

    while let Some(line) = rx.recv().await {
        let mut batch = Some(line);
        // Drain whatever else is queued before flushing
        while let Some(line) = batch.take().or_else(|| rx.try_recv().ok()) {
            if let Err(e) = write_line(&mut out, &line).await {
                tracing::warn!(error = %e, "Server log write failed, stopping log writer");
                return;
            }
        }
        if let Err(e) = out.flush().await {
            tracing::warn!(error = %e, "Server log flush failed, stopping log writer");
            return;
        }
    }
}

async fn write_line(out: &mut BufWriter<tokio::fs::File>, line: &str) -> std::io::Result<()> {
    out.write_all(line.as_bytes()).await?;
    out.write_all(b"\n").await
}
