//! Lantern - minimal HTTP/1.1 static file server
//!
//! Core library: configuration, the HTTP connection lifecycle, the
//! dispatcher and the server log.

pub mod config;
pub mod http;
pub mod server;
pub mod server_log;
