//! Request-line and header-block grammar (RFC 7230 section 3).
//!
//! The parser pulls one byte at a time from a [`ByteSource`] and never
//! looks ahead, so it can run directly on a live connection. Every stage
//! returns the [`ClientError`] specific to where it stopped.

use std::future::Future;

use crate::http::error::ClientError;
use crate::http::request::Request;

/// Anything the parser can pull single bytes from.
///
/// `None` means no byte is available: end of stream, an I/O error, or a
/// timeout. The parser maps it to a stage-specific "failed to read" error.
pub trait ByteSource {
    fn read_byte(&mut self) -> impl Future<Output = Option<u8>> + Send;
}

impl ByteSource for &[u8] {
    async fn read_byte(&mut self) -> Option<u8> {
        let (&first, rest) = self.split_first()?;
        *self = rest;
        Some(first)
    }
}

/// RFC 7230 `tchar`.
pub fn is_token_char(c: u8) -> bool {
    c.is_ascii_alphanumeric()
        || matches!(
            c,
            b'!' | b'#' | b'$' | b'%' | b'&' | b'\'' | b'*' | b'+' | b'-' | b'.' | b'^' | b'_'
                | b'`' | b'|' | b'~'
        )
}

/// Characters allowed in an origin-form request-target: RFC 3986 `pchar`,
/// the segment separator and the query marker.
pub fn is_path_char(c: u8) -> bool {
    c.is_ascii_alphanumeric()
        || matches!(
            c,
            // unreserved
            b'-' | b'.' | b'_' | b'~'
            // pct-encoded
            | b'%'
            // sub-delims
            | b'!' | b'$' | b'&' | b'\'' | b'(' | b')' | b'*' | b'+' | b',' | b';' | b'='
            | b':' | b'@' | b'/' | b'?'
        )
}

fn is_field_value_char(c: u8) -> bool {
    matches!(c, 0x21..=0x7E | 0x80..=0xFF | b' ' | b'\t')
}

/// Reads the method token and its terminating SP.
///
/// `max_len` of 0 means no limit.
pub async fn read_method<S: ByteSource>(src: &mut S, max_len: usize) -> Result<String, ClientError> {
    // GET and POST fit without reallocating
    let mut buffer = Vec::with_capacity(4);

    loop {
        let c = src.read_byte().await.ok_or(ClientError::FailedReadMethod)?;

        if c == b' ' {
            if buffer.is_empty() {
                return Err(ClientError::EmptyMethod);
            }
            return Ok(into_string(buffer));
        }

        if !is_token_char(c) {
            return Err(ClientError::IncorrectMethod);
        }

        if max_len != 0 && buffer.len() == max_len {
            return Err(ClientError::MethodTooLong);
        }

        buffer.push(c);
    }
}

/// Reads the raw request-target up to its terminating SP.
pub async fn read_path<S: ByteSource>(src: &mut S) -> Result<String, ClientError> {
    let mut buffer = Vec::new();

    loop {
        let c = src.read_byte().await.ok_or(ClientError::FailedReadPath)?;

        if c == b' ' {
            return Ok(into_string(buffer));
        }

        if !is_path_char(c) {
            return Err(ClientError::IncorrectPath);
        }

        buffer.push(c);
    }
}

/// Only the origin form (`/path`) is accepted; `*` and absolute-URI are not.
pub fn validate_path(path: &str) -> Result<(), ClientError> {
    match path.as_bytes().first() {
        None => Err(ClientError::InvalidPathEmpty),
        Some(b'/') => Ok(()),
        Some(_) => Err(ClientError::InvalidPathNotAbsolute),
    }
}

/// Splits the query off `request.path` in place.
pub fn extract_query(request: &mut Request) -> Result<(), ClientError> {
    let Some(mark) = request.path.find('?') else {
        return Ok(());
    };

    if request.path[mark + 1..].contains('?') {
        return Err(ClientError::InvalidPathMultipleQuestionMarks);
    }

    request.query = Some(request.path[mark + 1..].to_string());
    request.path.truncate(mark);
    Ok(())
}

/// Reads `HTTP/1.<digit>`. The minor version is checked, not kept.
pub async fn read_version<S: ByteSource>(src: &mut S) -> Result<(), ClientError> {
    const PREFIX: &[u8; 7] = b"HTTP/1.";

    for expected in PREFIX {
        let c = src.read_byte().await.ok_or(ClientError::FailedReadVersion)?;
        if c != *expected {
            return Err(ClientError::IncorrectVersion);
        }
    }

    let minor = src.read_byte().await.ok_or(ClientError::FailedReadVersion)?;
    if !minor.is_ascii_digit() {
        return Err(ClientError::IncorrectVersion);
    }

    Ok(())
}

pub async fn read_crlf<S: ByteSource>(src: &mut S) -> Result<(), ClientError> {
    let cr = src.read_byte().await.ok_or(ClientError::FailedReadCrlf)?;
    let lf = src.read_byte().await.ok_or(ClientError::FailedReadCrlf)?;

    if cr != b'\r' || lf != b'\n' {
        return Err(ClientError::IncorrectCrlf);
    }

    Ok(())
}

/// Reads header fields until the empty line, storing them into `request`.
///
/// Fields are collected first and only copied into the request once the
/// whole block parsed.
pub async fn read_headers<S: ByteSource>(src: &mut S, request: &mut Request) -> Result<(), ClientError> {
    let mut fields = Vec::new();

    loop {
        let first = src
            .read_byte()
            .await
            .ok_or(ClientError::FailedReadHeaderFieldName)?;

        if first == b'\r' {
            let lf = src
                .read_byte()
                .await
                .ok_or(ClientError::FailedReadHeaderNewline)?;
            if lf != b'\n' {
                return Err(ClientError::UnexpectedCrInFieldName);
            }
            break;
        }

        fields.push(read_header_field(src, first).await?);
    }

    for (name, value) in fields {
        request.headers.insert(name, value);
    }

    Ok(())
}

async fn read_header_field<S: ByteSource>(src: &mut S, first: u8) -> Result<(String, String), ClientError> {
    let name = read_field_name(src, first).await?;

    // OWS
    let mut c = loop {
        let c = src
            .read_byte()
            .await
            .ok_or(ClientError::FailedReadHeaderFieldGeneric)?;
        if c != b' ' && c != b'\t' {
            break c;
        }
    };

    // obs-fold is not supported
    let mut value = Vec::new();
    loop {
        if c == b'\r' {
            let lf = src
                .read_byte()
                .await
                .ok_or(ClientError::FailedReadHeaderNewline)?;
            if lf != b'\n' {
                return Err(ClientError::IncorrectHeaderFieldNewline);
            }
            break;
        }

        if !is_field_value_char(c) {
            return Err(ClientError::IncorrectHeaderFieldValue);
        }
        value.push(c);

        c = src
            .read_byte()
            .await
            .ok_or(ClientError::FailedReadHeaderFieldValue)?;
    }

    while matches!(value.last(), Some(b' ' | b'\t')) {
        value.pop();
    }

    Ok((name, into_string(value)))
}

async fn read_field_name<S: ByteSource>(src: &mut S, first: u8) -> Result<String, ClientError> {
    let mut name = Vec::new();
    let mut c = first;

    loop {
        if c == b':' {
            if name.is_empty() {
                return Err(ClientError::IncorrectHeaderFieldName);
            }
            return Ok(into_string(name));
        }

        if !is_token_char(c) {
            return Err(ClientError::IncorrectHeaderFieldName);
        }
        name.push(c.to_ascii_lowercase());

        c = src
            .read_byte()
            .await
            .ok_or(ClientError::FailedReadHeaderFieldName)?;
    }
}

/// Runs the whole request grammar: request-line, validation, query split,
/// header block.
pub async fn parse_request<S: ByteSource>(
    src: &mut S,
    request: &mut Request,
    max_method_len: usize,
) -> Result<(), ClientError> {
    request.method = read_method(src, max_method_len).await?;
    request.path = read_path(src).await?;
    validate_path(&request.path)?;
    extract_query(request)?;
    read_version(src).await?;
    read_crlf(src).await?;
    read_headers(src, request).await
}

// Method, path and field-name bytes are ASCII by construction; field values
// may carry obs-text, which is decoded lossily.
fn into_string(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(s) => s,
        Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
    }
}
