use crate::fs::media::MediaType;
use crate::fs::resolver::File;

/// Built-in page served for `/index.html` when the root has none.
pub const DEFAULT_PAGE: &str = "<!doctype html><html lang=\"en\"><head><meta charset=\"utf-8\">\
<title>Citadel - Default Page</title><style>body{font-family:sans-serif;margin:0 10%}\
h1{padding-top:5%}</style></head><body><h1>Citadel</h1><h3>It works!</h3>\
<p>The server is running and configured correctly.</p>\
<p>Place an index.html in the root directory to replace this page.</p></body></html>";

pub const NOT_FOUND_PAGE: &str = "<!doctype html><html><head><title>File Not Found</title></head>\
<body><h1>File Not Found</h1></body></html>";

pub const TOO_MANY_REQUESTS_PAGE: &str = "<!doctype html><html><head><title>Too Many Requests</title></head>\
<body><h1>Too Many Requests!</h1></body></html>";

pub const MOVED_PERMANENTLY_PAGE: &str = "<!doctype html><html><head><title>Moved Permanently</title></head>\
<body><h1>Moved Permanently</h1></body></html>";

/// HTTP status codes the server emits.
///
/// - `Ok` (200): file or default page served
/// - `MovedPermanently` (301): plaintext request redirected to HTTPS
/// - `BadRequest` (400): malformed request-line or header block
/// - `NotFound` (404): nothing to serve for the target
/// - `TooManyRequests` (429): per-connection request limit exceeded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    /// 200 OK
    Ok,
    /// 301 Moved Permanently
    MovedPermanently,
    /// 400 Bad Request
    BadRequest,
    /// 404 Not Found
    NotFound,
    /// 429 Too Many Requests
    TooManyRequests,
}

impl StatusCode {
    /// Returns the numeric HTTP status code.
    ///
    /// # Example
    ///
    /// ```
    /// # use citadel::http::response::StatusCode;
    /// assert_eq!(StatusCode::Ok.as_u16(), 200);
    /// assert_eq!(StatusCode::TooManyRequests.as_u16(), 429);
    /// ```
    pub fn as_u16(&self) -> u16 {
        match self {
            StatusCode::Ok => 200,
            StatusCode::MovedPermanently => 301,
            StatusCode::BadRequest => 400,
            StatusCode::NotFound => 404,
            StatusCode::TooManyRequests => 429,
        }
    }

    /// Returns the standard HTTP reason phrase for this status code.
    pub fn reason_phrase(&self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::MovedPermanently => "Moved Permanently",
            StatusCode::BadRequest => "Bad Request",
            StatusCode::NotFound => "Not Found",
            StatusCode::TooManyRequests => "Too Many Requests",
        }
    }
}

/// Response payload. Files are streamed, everything else is written whole.
#[derive(Debug)]
pub enum Body {
    Static(&'static str),
    Text(String),
    File(File),
}

impl Body {
    pub fn len(&self) -> u64 {
        match self {
            Body::Static(s) => s.len() as u64,
            Body::Text(s) => s.len() as u64,
            Body::File(f) => f.size(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A response ready to be framed and written to a connection.
///
/// Framing headers (`Content-Length`, `Server`, `Connection`) are added by
/// the writer; only the content type and an optional redirect target live
/// here.
#[derive(Debug)]
pub struct Response {
    pub status: StatusCode,
    pub media_type: MediaType,
    pub location: Option<String>,
    pub body: Body,
}

/// Builder for constructing responses in a fluent style.
///
/// # Example
///
/// ```ignore
/// let response = ResponseBuilder::new(StatusCode::NotFound)
///     .media_type(MediaType::html())
///     .body(Body::Static(NOT_FOUND_PAGE))
///     .build();
/// ```
pub struct ResponseBuilder {
    status: StatusCode,
    media_type: MediaType,
    location: Option<String>,
    body: Body,
}

impl ResponseBuilder {
    /// Starts an empty `text/html` response.
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            media_type: MediaType::html(),
            location: None,
            body: Body::Static(""),
        }
    }

    pub fn media_type(mut self, media_type: MediaType) -> Self {
        self.media_type = media_type;
        self
    }

    pub fn location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn body(mut self, body: Body) -> Self {
        self.body = body;
        self
    }

    pub fn build(self) -> Response {
        Response {
            status: self.status,
            media_type: self.media_type,
            location: self.location,
            body: self.body,
        }
    }
}

impl Response {
    /// `200 OK` streaming a resolved file.
    pub fn file(file: File, media_type: MediaType) -> Self {
        ResponseBuilder::new(StatusCode::Ok)
            .media_type(media_type)
            .body(Body::File(file))
            .build()
    }

    pub fn default_page() -> Self {
        ResponseBuilder::new(StatusCode::Ok)
            .body(Body::Static(DEFAULT_PAGE))
            .build()
    }

    /// `400` whose body explains what was wrong with the request.
    pub fn bad_request(message: &str) -> Self {
        ResponseBuilder::new(StatusCode::BadRequest)
            .media_type(MediaType::plain_text())
            .body(Body::Text(format!("Malformed request: {message}")))
            .build()
    }

    pub fn not_found() -> Self {
        ResponseBuilder::new(StatusCode::NotFound)
            .body(Body::Static(NOT_FOUND_PAGE))
            .build()
    }

    pub fn too_many_requests() -> Self {
        ResponseBuilder::new(StatusCode::TooManyRequests)
            .body(Body::Static(TOO_MANY_REQUESTS_PAGE))
            .build()
    }

    pub fn moved_permanently(location: impl Into<String>) -> Self {
        ResponseBuilder::new(StatusCode::MovedPermanently)
            .location(location)
            .body(Body::Static(MOVED_PERMANENTLY_PAGE))
            .build()
    }
}
