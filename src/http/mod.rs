//! HTTP/1.1 protocol implementation.
//!
//! Requests are parsed byte by byte straight off the socket; responses are
//! either fixed pages or files streamed from the root directory.
//!
//! # Architecture
//!
//! - **`connection`**: byte-level I/O over plain TCP or TLS
//! - **`parser`**: RFC 7230 request-line and header grammar
//! - **`request`**: parsed request and header multimap
//! - **`response`**: status codes, fixed pages, response bodies
//! - **`writer`**: serializes the status line and header block
//! - **`session`**: the per-connection exchange state machine
//! - **`error`**: client and launch error kinds
//!
//! # Session State Machine
//!
//! ```text
//!   ReadMethod → ReadPath → ValidatePath → ExtractQuery
//!        → ReadVersion → ReadCRLF → ReadHeaders
//!        → InterpretConnectionHeader → Dispatch → Respond
//!                     │ any ClientError
//!                     ▼
//!              ┌──────────────┐
//!              │   Recover    │ ← 400 / 404 / 429 / 301, or give up
//!              └──────┬───────┘
//!                     │ exchange finished
//!                     ├─ handled & Open    → ReadMethod (same connection)
//!                     └─ failed or Closing → teardown
//! ```

pub mod connection;
pub mod error;
pub mod parser;
pub mod request;
pub mod response;
pub mod session;
pub mod writer;
