use std::fmt::Write;

use crate::http::response::Response;

const HTTP_VERSION: &str = "HTTP/1.1";

/// Connection-level values every response head carries.
#[derive(Debug, Clone, Copy)]
pub struct Framing<'a> {
    /// Product name for the `Server` header
    pub server: &'a str,
    pub keep_alive: bool,
}

/// Status line and header block, terminated by the empty line.
///
/// Header order is fixed: `Content-Length`, `Server`, `Connection`,
/// `Content-Type`, then `Location` when present.
pub fn serialize_head(resp: &Response, framing: Framing<'_>) -> String {
    let mut head = String::with_capacity(160);

    // Writing into a String cannot fail.
    let _ = write!(
        head,
        "{} {} {}\r\n",
        HTTP_VERSION,
        resp.status.as_u16(),
        resp.status.reason_phrase()
    );
    let _ = write!(head, "Content-Length: {}\r\n", resp.body.len());
    let _ = write!(head, "Server: {}\r\n", framing.server);
    let _ = write!(
        head,
        "Connection: {}\r\n",
        if framing.keep_alive { "keep-alive" } else { "close" }
    );

    head.push_str("Content-Type: ");
    head.push_str(resp.media_type.complete_type());
    if resp.media_type.include_charset() {
        head.push_str(";charset=utf-8");
    }
    head.push_str("\r\n");

    if let Some(location) = &resp.location {
        let _ = write!(head, "Location: {location}\r\n");
    }

    // Header/body separator
    head.push_str("\r\n");

    head
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_head() {
        let head = serialize_head(
            &Response::not_found(),
            Framing {
                server: "citadel",
                keep_alive: true,
            },
        );

        assert!(head.starts_with("HTTP/1.1 404 Not Found\r\n"));
        assert!(head.contains("\r\nConnection: keep-alive\r\n"));
        assert!(head.contains("\r\nContent-Type: text/html;charset=utf-8\r\n"));
        assert!(head.ends_with("\r\n\r\n"));
    }
}
