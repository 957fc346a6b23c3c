//! Citadel - static HTTP/1.1 file server
//!
//! Core library: connection handling, request grammar, sessions and the
//! server lifecycle.

pub mod config;
pub mod fs;
pub mod http;
pub mod report;
pub mod server;
pub mod tls;
