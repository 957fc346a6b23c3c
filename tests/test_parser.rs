use citadel::http::error::ClientError;
use citadel::http::parser::{
    extract_query, is_path_char, parse_request, read_crlf, read_headers, read_method, read_path,
    read_version, validate_path,
};
use citadel::http::request::Request;

async fn parse(raw: &[u8]) -> Result<Request, ClientError> {
    let mut src = raw;
    let mut req = Request::default();
    parse_request(&mut src, &mut req, 0).await?;
    Ok(req)
}

#[tokio::test]
async fn test_parse_simple_get_request() {
    let req = parse(b"GET / HTTP/1.1\r\nHost: example.com\r\n\r\n").await.unwrap();

    assert_eq!(req.method, "GET");
    assert_eq!(req.path, "/");
    assert_eq!(req.query, None);
    assert_eq!(req.header("host"), Some("example.com"));
}

#[tokio::test]
async fn test_parse_multiple_headers() {
    let req = parse(
        b"GET /path HTTP/1.1\r\nHost: example.com\r\nUser-Agent: test-client\r\nAccept: */*\r\n\r\n",
    )
    .await
    .unwrap();

    assert_eq!(req.headers.len(), 3);
    assert_eq!(req.header("host"), Some("example.com"));
    assert_eq!(req.header("user-agent"), Some("test-client"));
    assert_eq!(req.header("accept"), Some("*/*"));
}

#[tokio::test]
async fn test_header_names_are_lowercased_values_kept() {
    let req = parse(b"GET / HTTP/1.1\r\nContent-TYPE: Application/JSON\r\n\r\n")
        .await
        .unwrap();

    assert!(req.headers.contains("content-type"));
    assert_eq!(req.header("content-type"), Some("Application/JSON"));
}

#[tokio::test]
async fn test_duplicate_headers_are_preserved() {
    let req = parse(b"GET / HTTP/1.1\r\nX-A: 1\r\nx-a: 2\r\n\r\n").await.unwrap();

    assert_eq!(req.headers.get_all("x-a").collect::<Vec<_>>(), vec!["1", "2"]);
}

#[tokio::test]
async fn test_header_value_whitespace_is_trimmed() {
    let req = parse(b"GET / HTTP/1.1\r\nX-Test:  value  \r\n\r\n").await.unwrap();
    assert_eq!(req.header("x-test"), Some("value"));

    let req = parse(b"GET / HTTP/1.1\r\nX-Test:\t a  b\t\r\n\r\n").await.unwrap();
    assert_eq!(req.header("x-test"), Some("a  b"));
}

#[tokio::test]
async fn test_empty_header_value() {
    let req = parse(b"GET / HTTP/1.1\r\nX-Empty:\r\nX-Spaces:   \r\n\r\n").await.unwrap();

    assert_eq!(req.header("x-empty"), Some(""));
    assert_eq!(req.header("x-spaces"), Some(""));
}

#[tokio::test]
async fn test_obs_text_in_header_value() {
    let req = parse(b"GET / HTTP/1.1\r\nX-Name: caf\xC3\xA9\r\n\r\n").await.unwrap();
    assert_eq!(req.header("x-name"), Some("caf\u{e9}"));
}

#[tokio::test]
async fn test_query_is_split_from_path() {
    let req = parse(b"GET /a?b HTTP/1.1\r\n\r\n").await.unwrap();

    assert_eq!(req.path, "/a");
    assert_eq!(req.query.as_deref(), Some("b"));
}

#[tokio::test]
async fn test_empty_query() {
    let req = parse(b"GET /search? HTTP/1.1\r\n\r\n").await.unwrap();

    assert_eq!(req.path, "/search");
    assert_eq!(req.query.as_deref(), Some(""));
}

#[tokio::test]
async fn test_multiple_question_marks_rejected() {
    assert_eq!(
        parse(b"GET /a?b?c HTTP/1.1\r\n\r\n").await,
        Err(ClientError::InvalidPathMultipleQuestionMarks)
    );
    assert_eq!(
        parse(b"GET /a?b?c?d HTTP/1.1\r\n\r\n").await,
        Err(ClientError::InvalidPathMultipleQuestionMarks)
    );
}

#[tokio::test]
async fn test_missing_method_terminator_is_read_failure() {
    assert_eq!(parse(b"GET").await, Err(ClientError::FailedReadMethod));
    assert_eq!(parse(b"").await, Err(ClientError::FailedReadMethod));
}

#[tokio::test]
async fn test_empty_method() {
    assert_eq!(parse(b" / HTTP/1.1\r\n\r\n").await, Err(ClientError::EmptyMethod));
}

#[tokio::test]
async fn test_method_must_be_token() {
    assert_eq!(
        parse(b"GE(T / HTTP/1.1\r\n\r\n").await,
        Err(ClientError::IncorrectMethod)
    );
}

#[tokio::test]
async fn test_extension_methods_are_accepted() {
    let req = parse(b"PROPFIND / HTTP/1.1\r\n\r\n").await.unwrap();
    assert_eq!(req.method, "PROPFIND");
}

#[tokio::test]
async fn test_method_length_policy() {
    let mut src: &[u8] = b"GET / HTTP/1.1\r\n\r\n";
    assert_eq!(read_method(&mut src, 3).await, Ok("GET".to_string()));

    let mut src: &[u8] = b"DELETE / HTTP/1.1\r\n\r\n";
    assert_eq!(read_method(&mut src, 3).await, Err(ClientError::MethodTooLong));
}

#[tokio::test]
async fn test_path_validation() {
    assert_eq!(parse(b"GET  HTTP/1.1\r\n\r\n").await, Err(ClientError::InvalidPathEmpty));
    assert_eq!(
        parse(b"OPTIONS * HTTP/1.1\r\n\r\n").await,
        Err(ClientError::InvalidPathNotAbsolute)
    );
    assert_eq!(
        parse(b"GET http://example.com/ HTTP/1.1\r\n\r\n").await,
        Err(ClientError::InvalidPathNotAbsolute)
    );
    assert_eq!(
        parse(b"GET /a\"b HTTP/1.1\r\n\r\n").await,
        Err(ClientError::IncorrectPath)
    );
    assert_eq!(parse(b"GET /abc").await, Err(ClientError::FailedReadPath));
}

#[test]
fn test_path_chars() {
    for c in b"/az09-._~%!$&'()*+,;=:@?" {
        assert!(is_path_char(*c), "{} should be allowed", *c as char);
    }
    for c in b" \"<>\\^`{|}#\r\n" {
        assert!(!is_path_char(*c), "{} should be rejected", *c as char);
    }
}

#[tokio::test]
async fn test_version() {
    let mut src: &[u8] = b"HTTP/1.0";
    assert_eq!(read_version(&mut src).await, Ok(()));

    for bad in [b"HTTP/2.0", b"http/1.1", b"HTTP/1.x", b"HTTP 1.1"] {
        let mut src: &[u8] = bad;
        assert_eq!(read_version(&mut src).await, Err(ClientError::IncorrectVersion));
    }

    let mut src: &[u8] = b"HTTP/1";
    assert_eq!(read_version(&mut src).await, Err(ClientError::FailedReadVersion));
}

#[tokio::test]
async fn test_request_line_crlf() {
    let mut src: &[u8] = b"\r\n";
    assert_eq!(read_crlf(&mut src).await, Ok(()));

    let mut src: &[u8] = b"\n\n";
    assert_eq!(read_crlf(&mut src).await, Err(ClientError::IncorrectCrlf));

    let mut src: &[u8] = b"\r";
    assert_eq!(read_crlf(&mut src).await, Err(ClientError::FailedReadCrlf));

    assert_eq!(
        parse(b"GET / HTTP/1.1\n\r\n").await,
        Err(ClientError::IncorrectCrlf)
    );
}

#[tokio::test]
async fn test_malformed_header_name() {
    assert_eq!(
        parse(b"GET / HTTP/1.1\r\nBroken Header: x\r\n\r\n").await,
        Err(ClientError::IncorrectHeaderFieldName)
    );
    assert_eq!(
        parse(b"GET / HTTP/1.1\r\n: x\r\n\r\n").await,
        Err(ClientError::IncorrectHeaderFieldName)
    );
    assert_eq!(
        parse(b"GET / HTTP/1.1\r\nBrokenHeader\r\n\r\n").await,
        Err(ClientError::IncorrectHeaderFieldName)
    );
}

#[tokio::test]
async fn test_lone_cr_cases() {
    // CR at the start of a line that is not the terminating empty line
    assert_eq!(
        parse(b"GET / HTTP/1.1\r\n\rX: y\r\n\r\n").await,
        Err(ClientError::UnexpectedCrInFieldName)
    );
    // CR inside a field value not followed by LF
    assert_eq!(
        parse(b"GET / HTTP/1.1\r\nX: a\rb\r\n\r\n").await,
        Err(ClientError::IncorrectHeaderFieldNewline)
    );
}

#[tokio::test]
async fn test_control_character_in_value() {
    assert_eq!(
        parse(b"GET / HTTP/1.1\r\nX: a\x01b\r\n\r\n").await,
        Err(ClientError::IncorrectHeaderFieldValue)
    );
}

#[tokio::test]
async fn test_truncated_header_block() {
    assert_eq!(
        parse(b"GET / HTTP/1.1\r\nHost: example.com\r\n").await,
        Err(ClientError::FailedReadHeaderFieldName)
    );
    assert_eq!(
        parse(b"GET / HTTP/1.1\r\nHost: exam").await,
        Err(ClientError::FailedReadHeaderFieldValue)
    );
    assert_eq!(
        parse(b"GET / HTTP/1.1\r\nHost:").await,
        Err(ClientError::FailedReadHeaderFieldGeneric)
    );
}

#[tokio::test]
async fn test_headers_not_stored_on_failure() {
    let mut src: &[u8] = b"Good: 1\r\nBad Name: 2\r\n\r\n";
    let mut req = Request::default();

    assert_eq!(
        read_headers(&mut src, &mut req).await,
        Err(ClientError::IncorrectHeaderFieldName)
    );
    assert!(req.headers.is_empty());
}

#[tokio::test]
async fn test_stages_individually() {
    let mut src: &[u8] = b"/files/a.txt?download=1 ";
    let path = read_path(&mut src).await.unwrap();
    assert_eq!(validate_path(&path), Ok(()));

    let mut req = Request {
        path,
        ..Request::default()
    };
    extract_query(&mut req).unwrap();
    assert_eq!(req.path, "/files/a.txt");
    assert_eq!(req.query.as_deref(), Some("download=1"));
}
