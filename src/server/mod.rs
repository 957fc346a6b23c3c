//! Listening sockets and the lifecycle of the sessions they accept.

pub mod listener;
pub mod registry;

pub use listener::Server;
pub use registry::SessionRegistry;
