//! Per-connection exchange loop.
//!
//! A [`Session`] owns one [`Connection`] and runs exchanges on it until the
//! peer goes away, a fatal error happens, or persistence switches to
//! [`Persistence::Closing`].

use std::sync::Arc;

use crate::config::ServerConfig;
use crate::fs::{File, FileResolver};
use crate::http::connection::Connection;
use crate::http::error::ClientError;
use crate::http::parser;
use crate::http::request::Request;
use crate::http::response::{Body, Response};
use crate::http::writer::{Framing, serialize_head};
use crate::report::ReportKind;

/// Keep-alive state of a connection. There is no way back to `Open`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Persistence {
    Open,
    Closing,
}

pub struct Session {
    id: u64,
    connection: Connection,
    config: Arc<ServerConfig>,
    request: Request,
    persistence: Persistence,
    request_count: u64,
}

impl Session {
    pub fn new(id: u64, connection: Connection, config: Arc<ServerConfig>) -> Self {
        Self {
            id,
            connection,
            config,
            request: Request::with_sequence(1),
            persistence: Persistence::Open,
            request_count: 0,
        }
    }

    pub fn persistence(&self) -> Persistence {
        self.persistence
    }

    /// Handshake, then exchanges until the connection is done. The
    /// connection is always torn down before returning.
    pub async fn run(mut self) {
        if !self.setup().await {
            tracing::error!(session = self.id, peer = %self.connection.peer(), "failed to set up connection");
            self.connection.teardown().await;
            return;
        }

        loop {
            let succeeded = self.run_exchange().await;
            self.reset_exchange();
            if !succeeded || self.persistence == Persistence::Closing {
                break;
            }
        }

        self.connection.teardown().await;
        tracing::debug!(session = self.id, requests = self.request_count, "session finished");
    }

    /// The handshake is bounded by the read timeout, if any.
    async fn setup(&mut self) -> bool {
        let handshake = self.connection.setup(self.config.tls.as_ref());
        match self.config.read_timeout {
            Some(limit) => tokio::time::timeout(limit, handshake).await.unwrap_or_else(|_| {
                tracing::debug!(session = self.id, "handshake timed out");
                false
            }),
            None => handshake.await,
        }
    }

    fn mark_closing(&mut self) {
        self.persistence = Persistence::Closing;
    }

    fn reset_exchange(&mut self) {
        let next = self.request.sequence + 1;
        self.request = Request::with_sequence(next);
    }

    /// One request/response. `false` ends the connection.
    async fn run_exchange(&mut self) -> bool {
        let max_method_len = self.config.policy.max_method_length;
        if let Err(error) = parser::parse_request(&mut self.connection, &mut self.request, max_method_len).await {
            return self.recover(error).await;
        }

        self.interpret_connection_header();

        match self.handle_request().await {
            Ok(()) => true,
            Err(error) => self.recover(error).await,
        }
    }

    fn interpret_connection_header(&mut self) {
        if self.persistence == Persistence::Open && self.request.wants_close() {
            self.mark_closing();
        }
    }

    async fn handle_request(&mut self) -> Result<(), ClientError> {
        let policy = self.config.policy;
        self.request_count += 1;
        if policy.max_requests_per_connection != 0 {
            if !policy.max_requests_close_immediately {
                if self.request_count > policy.max_requests_per_connection {
                    return Err(ClientError::TooManyRequestsPerThisConnection);
                }
            } else if self.request_count >= policy.max_requests_per_connection {
                // This response is the last one; say so in its head.
                self.mark_closing();
            }
        }

        if self.config.upgrades_to_https() {
            return Err(ClientError::UpgradeToHttps);
        }

        let resolver = Arc::clone(&self.config.resolver);
        let file = resolve(resolver, self.request.clone(), self.id)
            .await
            .ok_or(ClientError::FileNotFound)?;

        let canonical = tokio::fs::canonicalize(file.path())
            .await
            .map_err(|_| ClientError::CheckFileLocationFailed)?;
        if !canonical.starts_with(&self.config.root) {
            return Err(ClientError::OutsideRootDirectory);
        }

        let media_type = self.config.media_types.detect(&file);
        self.respond(Response::file(file, media_type)).await
    }

    /// Writes head and, unless the method is HEAD, the body.
    async fn respond(&mut self, response: Response) -> Result<(), ClientError> {
        let head = serialize_head(
            &response,
            Framing {
                server: &self.config.product_name,
                keep_alive: self.persistence == Persistence::Open,
            },
        );
        if !self.connection.write_string(head.as_bytes()).await {
            return Err(ClientError::FailedWriteResponseMetadata);
        }

        tracing::info!(
            session = self.id,
            sequence = self.request.sequence,
            method = %self.request.method,
            path = %self.request.path,
            status = response.status.as_u16(),
            "response"
        );

        if self.request.is_head() {
            return Ok(());
        }

        let written = match response.body {
            Body::Static(text) => self.connection.write_string(text.as_bytes()).await,
            Body::Text(text) => self.connection.write_string(text.as_bytes()).await,
            Body::File(file) => {
                let size = file.size();
                self.connection.send_file(file.into_handle(), size).await
            }
        };

        if written {
            Ok(())
        } else {
            Err(ClientError::FailedWriteResponseBody)
        }
    }

    /// Decides what the client sees for `error`. Returns whether the
    /// exchange counts as handled.
    async fn recover(&mut self, error: ClientError) -> bool {
        use ClientError::*;

        match error {
            FileNotFound => {
                if is_index_target(&self.request.path) {
                    return self.serve(Response::default_page()).await;
                }
                let context = format!("Path='{}'", self.request.path);
                self.config.reporter.report(ReportKind::FileNotFound, &context);
                self.serve(Response::not_found()).await
            }
            OutsideRootDirectory => {
                let context = format!("Path='{}'", self.request.path);
                self.config.reporter.report(ReportKind::OutsideRootDirectory, &context);
                self.serve(Response::not_found()).await
            }
            EmptyMethod
            | IncorrectMethod
            | MethodTooLong
            | IncorrectPath
            | InvalidPathEmpty
            | InvalidPathNotAbsolute
            | IncorrectVersion
            | IncorrectCrlf
            | IncorrectHeaderFieldName
            | IncorrectHeaderFieldValue
            | IncorrectHeaderFieldNewline
            | UnexpectedCrInFieldName => {
                // The stream position is unknown after a grammar error.
                self.mark_closing();
                self.serve(Response::bad_request(error.description())).await
            }
            TooManyRequestsPerThisConnection => {
                self.mark_closing();
                self.serve(Response::too_many_requests()).await
            }
            UpgradeToHttps => {
                let host = self.config.https_hostname.as_deref().unwrap_or_default();
                let location = format!("https://{}{}", host, self.request.target());
                self.serve(Response::moved_permanently(location)).await
            }
            CheckFileLocationFailed
            | InvalidPathMultipleQuestionMarks
            | FailedReadHeaderFieldGeneric
            | FailedReadHeaderFieldName
            | FailedReadHeaderFieldValue
            | FailedReadHeaderNewline
            | FailedReadMethod
            | FailedReadPath
            | FailedReadCrlf
            | FailedReadVersion
            | FailedWriteResponseBody
            | FailedWriteResponseMetadata => {
                // A peer closing an idle keep-alive connection is not worth more
                // than a trace.
                if error == FailedReadMethod && self.request.sequence > 1 {
                    tracing::trace!(session = self.id, "peer closed connection");
                } else {
                    tracing::info!(session = self.id, error = %error, "exchange failed");
                }
                false
            }
        }
    }

    async fn serve(&mut self, response: Response) -> bool {
        self.respond(response).await.is_ok()
    }
}

/// Resolvers touch the filesystem synchronously, so they run on the
/// blocking pool. A resolver panic is resumed in the calling task.
async fn resolve(resolver: Arc<dyn FileResolver>, request: Request, session: u64) -> Option<File> {
    match tokio::task::spawn_blocking(move || resolver.resolve(&request)).await {
        Ok(file) => file,
        Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
        Err(e) => {
            tracing::warn!(session, error = %e, "file resolution cancelled");
            None
        }
    }
}

fn is_index_target(path: &str) -> bool {
    path == "/" || path == "/index.html"
}
