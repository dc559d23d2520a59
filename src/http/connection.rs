use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};

use crate::config::Config;
use crate::http::error::RequestError;
use crate::http::parser::RequestParser;
use crate::http::request::Request;
use crate::http::response::{KeepAlive, KeepAlivePolicy, Response};
use crate::http::static_files::StaticFiles;
use crate::http::timer::KeepAliveTimer;
use crate::http::writer::ResponseWriter;
use crate::server_log::{ServerLog, Severity};

/// Everything a connection needs that is shared across the whole server.
pub struct ConnectionContext {
    pub parser: RequestParser,
    pub files: StaticFiles,
    pub policy: KeepAlivePolicy,
    pub log: ServerLog,
}

impl ConnectionContext {
    pub fn from_config(cfg: &Config, log: ServerLog) -> Self {
        Self {
            parser: RequestParser::from_config(cfg),
            files: StaticFiles::from_config(cfg),
            policy: KeepAlivePolicy::from_config(&cfg.keep_alive),
            log,
        }
    }
}

pub enum ConnectionState {
    AwaitingRequest,
    /// `request` is `None` when the response answers a request that failed to parse.
    Responding {
        request: Option<Request>,
        response: Response,
    },
    Closed(CloseReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// The last response did not keep the connection alive.
    Completed,
    /// An idle persistent connection ran out its keep-alive timeout.
    KeepAliveTimeout,
    /// The peer closed its side between requests.
    PeerClosed,
    /// Reading failed below HTTP.
    PeerReset,
    /// A response could not be written.
    SendFailed,
}

/// One accepted connection, served request by request until it closes.
pub struct Connection<S> {
    stream: BufReader<S>,
    ctx: Arc<ConnectionContext>,
    client: SocketAddr,
    server: SocketAddr,
    served: u32,
    state: ConnectionState,
    closed: bool,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S, client: SocketAddr, server: SocketAddr, ctx: Arc<ConnectionContext>) -> Self {
        Self {
            stream: BufReader::new(stream),
            ctx,
            client,
            server,
            served: 0,
            state: ConnectionState::AwaitingRequest,
            closed: false,
        }
    }

    /// Runs the connection to completion. The stream is shut down exactly
    /// once whichever way the state machine ends.
    pub async fn run(mut self) -> CloseReason {
        let reason = self.drive().await;
        self.close().await;
        tracing::debug!(
            client = %self.client,
            served = self.served,
            reason = ?reason,
            "Connection closed"
        );
        reason
    }

    async fn drive(&mut self) -> CloseReason {
        loop {
            let state = std::mem::replace(
                &mut self.state,
                ConnectionState::Closed(CloseReason::Completed),
            );
            self.state = match state {
                ConnectionState::AwaitingRequest => self.await_request().await,
                ConnectionState::Responding { request, response } => {
                    self.respond(request, response).await
                }
                ConnectionState::Closed(reason) => return reason,
            };
        }
    }

    async fn await_request(&mut self) -> ConnectionState {
        let parsed = if self.served == 0 {
            self.ctx.parser.parse(&mut self.stream).await
        } else {
            // Idle persistent connection: the next request races the timer
            let timer = KeepAliveTimer::arm(self.ctx.policy.timeout);
            let parsed = tokio::select! {
                biased;
                _ = timer.expired() => Err(RequestError::Timeout),
                parsed = self.ctx.parser.parse(&mut self.stream) => parsed,
            };
            if parsed.is_ok() && !timer.cancel() {
                // Fired between the read completing and the cancel
                Err(RequestError::Timeout)
            } else {
                parsed
            }
        };

        match parsed {
            Ok(request) => {
                let keep_alive = self.ctx.policy.decide(request.keep_alive(), self.served);
                let response = self.ctx.files.respond(&request, keep_alive).await;
                ConnectionState::Responding {
                    request: Some(request),
                    response,
                }
            }
            Err(RequestError::Status { status, reason }) => {
                tracing::debug!(client = %self.client, status = status.as_u16(), %reason, "Rejected request");
                self.ctx.log.append(
                    Severity::Information,
                    format!("Rejected request from {}: {}", self.client, reason),
                );
                ConnectionState::Responding {
                    request: None,
                    response: self.ctx.files.bodiless(status, KeepAlive::Close),
                }
            }
            Err(RequestError::Timeout) => {
                self.ctx.log.append(
                    Severity::Information,
                    format!("Keep-alive timeout for {}", self.client),
                );
                ConnectionState::Closed(CloseReason::KeepAliveTimeout)
            }
            Err(RequestError::Closed) => ConnectionState::Closed(CloseReason::PeerClosed),
            Err(RequestError::Io(e)) => {
                tracing::debug!(client = %self.client, error = %e, "Connection reset while reading");
                self.ctx.log.append(
                    Severity::Information,
                    format!("Connection from {} reset: {}", self.client, e),
                );
                ConnectionState::Closed(CloseReason::PeerReset)
            }
        }
    }

    async fn respond(&mut self, request: Option<Request>, response: Response) -> ConnectionState {
        let writer = ResponseWriter::new(&response);
        if let Err(e) = writer.write_to_stream(self.stream.get_mut()).await {
            tracing::error!(client = %self.client, error = %e, "Failed to send response");
            self.ctx.log.append(
                Severity::Error,
                format!("Error responding to {}: {}", self.client, e),
            );
            return ConnectionState::Closed(CloseReason::SendFailed);
        }

        self.ctx
            .log
            .connection(request.as_ref(), &response, self.client, self.server);
        self.served += 1;

        if response.is_keep_alive() && self.served < self.ctx.policy.max_requests {
            ConnectionState::AwaitingRequest
        } else {
            ConnectionState::Closed(CloseReason::Completed)
        }
    }

    async fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        if let Err(e) = self.stream.get_mut().shutdown().await {
            tracing::debug!(client = %self.client, error = %e, "Shutdown after close failed");
        }
    }
}
