//! HTTP/1.1 static file serving.
//!
//! # Architecture
//!
//! - **`connection`**: per-connection state machine, keep-alive handling
//! - **`parser`**: reads one request off a buffered byte stream
//! - **`request`**: the parsed request and its builder
//! - **`response`**: status codes, keep-alive policy, response builder
//! - **`static_files`**: resolves targets under the content root
//! - **`writer`**: serializes a response onto the socket
//! - **`timer`**: cancellable keep-alive timer
//! - **`mime`**: content types by file extension
//! - **`error`**: request and send failures
//!
//! # Connection State Machine
//!
//! ```text
//!        ┌──────────────────┐
//!        │ AwaitingRequest  │ ← parse next request (keep-alive timer armed
//!        └──────┬───────────┘   from the second request on)
//!               │ request parsed, or parse error classified
//!               ▼
//!        ┌──────────────────┐
//!        │   Responding     │ ← write the response, log the exchange
//!        └──────┬───────────┘
//!               ├─ keep-alive and budget left → AwaitingRequest
//!               └─ otherwise → Closed
//!
//!   timeout, peer close/reset or send failure → Closed (no response)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use lantern::config::Config;
//! use lantern::http::connection::{Connection, ConnectionContext};
//! use lantern::server_log::ServerLog;
//! use tokio::net::TcpListener;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let cfg = Config::default();
//!     let ctx = Arc::new(ConnectionContext::from_config(&cfg, ServerLog::disabled()));
//!     let listener = TcpListener::bind("127.0.0.1:8080").await?;
//!
//!     loop {
//!         let (socket, peer) = listener.accept().await?;
//!         let local = socket.local_addr()?;
//!         let ctx = Arc::clone(&ctx);
//!         tokio::spawn(Connection::new(socket, peer, local, ctx).run());
//!     }
//! }
//! ```

pub mod connection;
pub mod error;
pub mod mime;
pub mod parser;
pub mod request;
pub mod response;
pub mod static_files;
pub mod timer;
pub mod writer;
