use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tokio::sync::Semaphore;
use tracing::{debug, info};

use crate::config::Config;
use crate::http::connection::{Connection, ConnectionContext};
use crate::server_log::{ServerLog, Severity};

/// Binds the listening socket on all interfaces.
pub async fn bind(cfg: &Config) -> anyhow::Result<TcpListener> {
    let addr = SocketAddr::from(([0, 0, 0, 0], cfg.port));
    TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))
}

/// Accepts connections forever, serving at most `num_threads` at a time.
///
/// A connection is only accepted once a slot is free, so excess clients wait
/// in the kernel backlog.
pub async fn run(listener: TcpListener, cfg: &Config, log: ServerLog) -> anyhow::Result<()> {
    let local = listener.local_addr()?;
    info!("Listening on {}", local);
    log.append(Severity::Always, format!("Listening on {local}"));

    let ctx = Arc::new(ConnectionContext::from_config(cfg, log));
    let slots = Arc::new(Semaphore::new(cfg.num_threads));

    loop {
        let permit = Arc::clone(&slots).acquire_owned().await?;
        let (socket, peer) = listener.accept().await?;
        debug!("Accepted connection from {}", peer);

        let server_addr = socket.local_addr().unwrap_or(local);
        let ctx = Arc::clone(&ctx);
        tokio::spawn(async move {
            let _permit = permit;
            Connection::new(socket, peer, server_addr, ctx).run().await;
        });
    }
}
