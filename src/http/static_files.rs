//! Maps request targets onto files under the content root.

use std::io;
use std::path::PathBuf;

use crate::config::Config;
use crate::http::mime;
use crate::http::request::Request;
use crate::http::response::{KeepAlive, Response, ResponseBuilder, StatusCode};

#[derive(Debug, Clone)]
pub struct StaticFiles {
    root: PathBuf,
    debug: bool,
}

impl StaticFiles {
    pub fn new(root: impl Into<PathBuf>, debug: bool) -> Self {
        Self {
            root: root.into(),
            debug,
        }
    }

    pub fn from_config(cfg: &Config) -> Self {
        Self::new(cfg.root_directory.clone(), cfg.debug_mode)
    }

    /// Translates a request target into a path under the root.
    ///
    /// Query and fragment are ignored. Returns `None` for targets that try to
    /// climb out of the root.
    pub fn resolve(&self, target: &str) -> Option<PathBuf> {
        let path = target.split(['?', '#']).next().unwrap_or(target);

        let mut resolved = self.root.clone();
        for segment in path.split('/') {
            match segment {
                "" | "." => continue,
                ".." => return None,
                s if s.contains(['\\', '\0']) => return None,
                s => resolved.push(s),
            }
        }
        Some(resolved)
    }

    /// Builds the response for a parsed request. Never fails: anything
    /// unexpected becomes a bodiless 500.
    pub async fn respond(&self, request: &Request, keep_alive: KeepAlive) -> Response {
        match self.lookup(request, keep_alive).await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(uri = %request.target, error = %e, "Failed to build response");
                self.bodiless(StatusCode::InternalServerError, KeepAlive::Close)
            }
        }
    }

    /// A response without a body that still carries the common headers.
    pub fn bodiless(&self, status: StatusCode, keep_alive: KeepAlive) -> Response {
        ResponseBuilder::new(status)
            .keep_alive(keep_alive)
            .debug(self.debug)
            .build()
    }

    async fn lookup(&self, request: &Request, keep_alive: KeepAlive) -> io::Result<Response> {
        let Some(path) = self.resolve(&request.target) else {
            tracing::debug!(uri = %request.target, "Rejected target outside content root");
            return Ok(self.bodiless(StatusCode::Forbidden, keep_alive));
        };

        let metadata = match tokio::fs::metadata(&path).await {
            Ok(m) => m,
            Err(e) => return self.classify(e, keep_alive),
        };
        if metadata.is_dir() {
            return Ok(self.bodiless(StatusCode::Forbidden, keep_alive));
        }

        // Readability is whatever opening the file says it is
        if let Err(e) = tokio::fs::File::open(&path).await {
            return self.classify(e, keep_alive);
        }

        let content_type = mime::content_type(&path);
        Ok(ResponseBuilder::new(StatusCode::Ok)
            .header("content-type", content_type)
            .file(path, metadata.len())
            .keep_alive(keep_alive)
            .debug(self.debug)
            .build())
    }

    fn classify(&self, e: io::Error, keep_alive: KeepAlive) -> io::Result<Response> {
        match e.kind() {
            io::ErrorKind::NotFound | io::ErrorKind::NotADirectory => {
                Ok(self.bodiless(StatusCode::NotFound, keep_alive))
            }
            io::ErrorKind::PermissionDenied => Ok(self.bodiless(StatusCode::Forbidden, keep_alive)),
            _ => Err(e),
        }
    }
}
