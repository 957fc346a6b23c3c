use citadel::http::request::{Headers, Request, RequestBuilder};

#[test]
fn test_request_header_retrieval() {
    let req = RequestBuilder::new()
        .method("GET")
        .path("/")
        .header("Host", "example.com")
        .header("Content-Type", "application/json")
        .build()
        .unwrap();

    assert_eq!(req.header("Host"), Some("example.com"));
    assert_eq!(req.header("content-type"), Some("application/json"));
    assert_eq!(req.header("Missing"), None);
}

#[test]
fn test_request_wants_close() {
    let req = RequestBuilder::new()
        .method("GET")
        .path("/")
        .header("Connection", "Close")
        .build()
        .unwrap();
    assert!(req.wants_close());

    let req = RequestBuilder::new()
        .method("GET")
        .path("/")
        .header("Connection", "keep-alive")
        .build()
        .unwrap();
    assert!(!req.wants_close());
}

#[test]
fn test_request_wants_close_any_duplicate() {
    let req = RequestBuilder::new()
        .method("GET")
        .path("/")
        .header("Connection", "keep-alive")
        .header("Connection", "close")
        .build()
        .unwrap();
    assert!(req.wants_close());
}

#[test]
fn test_request_no_connection_header_keeps_alive() {
    let req = RequestBuilder::new().method("GET").path("/").build().unwrap();
    assert!(!req.wants_close());
}

#[test]
fn test_request_is_head() {
    let head = RequestBuilder::new().method("HEAD").path("/").build().unwrap();
    let get = RequestBuilder::new().method("GET").path("/").build().unwrap();
    let lower = RequestBuilder::new().method("head").path("/").build().unwrap();

    assert!(head.is_head());
    assert!(!get.is_head());
    // Methods are case-sensitive
    assert!(!lower.is_head());
}

#[test]
fn test_request_builder_requires_method_and_path() {
    assert!(RequestBuilder::new().path("/").build().is_err());
    assert!(RequestBuilder::new().method("GET").build().is_err());
}

#[test]
fn test_request_with_sequence_is_blank() {
    let req = Request::with_sequence(7);

    assert_eq!(req.sequence, 7);
    assert!(req.method.is_empty());
    assert!(req.path.is_empty());
    assert!(req.query.is_none());
    assert!(req.headers.is_empty());
}

#[test]
fn test_request_target_without_query() {
    let req = RequestBuilder::new().method("GET").path("/a/b").build().unwrap();
    assert_eq!(req.target(), "/a/b");
}

#[test]
fn test_headers_len_counts_duplicates() {
    let mut headers = Headers::new();
    headers.insert("a", "1");
    headers.insert("A", "2");
    headers.insert("b", "3");

    assert_eq!(headers.len(), 3);
    assert!(headers.contains("B"));
    assert!(!headers.contains("c"));
}
