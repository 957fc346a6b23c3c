use std::collections::HashMap;

/// Header multimap keyed by lowercase field-name.
///
/// Duplicate field-names are kept; lookups by name are case-insensitive
/// because names are folded on insertion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    fields: HashMap<String, Vec<String>>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a value, keeping any earlier values stored under the same name.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into().to_ascii_lowercase();
        self.fields.entry(name).or_default().push(value.into());
    }

    /// First value stored under `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.get_all(name).next()
    }

    pub fn get_all<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a str> + 'a {
        self.fields
            .get(&name.to_ascii_lowercase())
            .into_iter()
            .flatten()
            .map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(&name.to_ascii_lowercase())
    }

    /// Number of stored values, counting duplicates.
    pub fn len(&self) -> usize {
        self.fields.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// One parsed request-line plus header block.
///
/// The method is kept as the raw token: the server only distinguishes
/// `HEAD` from everything else.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Request {
    /// Method token (e.g. "GET")
    pub method: String,
    /// Absolute path, without the query once it has been split off
    pub path: String,
    /// Everything after the `?` of the request-target
    pub query: Option<String>,
    pub headers: Headers,
    /// Position of this request on its connection, starting at 1
    pub sequence: u64,
}

/// Builder for constructing Request objects.
pub struct RequestBuilder {
    method: Option<String>,
    path: Option<String>,
    query: Option<String>,
    headers: Headers,
    sequence: u64,
}

impl Default for RequestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestBuilder {
    pub fn new() -> Self {
        Self {
            method: None,
            path: None,
            query: None,
            headers: Headers::new(),
            sequence: 1,
        }
    }

    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn sequence(mut self, sequence: u64) -> Self {
        self.sequence = sequence;
        self
    }

    pub fn build(self) -> Result<Request, &'static str> {
        Ok(Request {
            method: self.method.ok_or("method missing")?,
            path: self.path.ok_or("path missing")?,
            query: self.query,
            headers: self.headers,
            sequence: self.sequence,
        })
    }
}

impl Request {
    /// A blank request for the given position on the connection.
    pub fn with_sequence(sequence: u64) -> Self {
        Self {
            sequence,
            ..Self::default()
        }
    }

    /// Retrieves the first value of a header.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    pub fn is_head(&self) -> bool {
        self.method == "HEAD"
    }

    /// True when any `Connection` header value is `close`, ignoring case.
    pub fn wants_close(&self) -> bool {
        self.headers
            .get_all("connection")
            .any(|v| v.eq_ignore_ascii_case("close"))
    }

    /// The request-target as it appeared on the wire, query included.
    pub fn target(&self) -> String {
        match &self.query {
            Some(query) => format!("{}?{}", self.path, query),
            None => self.path.clone(),
        }
    }
}
