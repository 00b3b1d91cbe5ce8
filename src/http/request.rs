use std::collections::HashMap;

use bytes::Bytes;

use crate::http::headers::Headers;

/// Protocol version the server speaks.
pub const HTTP_VERSION: &str = "HTTP/1.1";

/// HTTP request methods accepted by the server.
///
/// Anything else is rejected by the parser with 405 Method Not Allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// GET - Retrieve a resource
    GET,
    /// POST - Submit form data
    POST,
    /// HEAD - Like GET but without the response body
    HEAD,
}

impl Method {
    /// Every supported method, in the order advertised by `Allow`.
    pub const ALLOWED: [Method; 3] = [Method::GET, Method::POST, Method::HEAD];

    /// Parses an HTTP method from a string.
    ///
    /// # Arguments
    ///
    /// * `s` - String representation of the method (case-sensitive)
    ///
    /// # Returns
    ///
    /// `Some(Method)` if the string matches a supported method, `None` otherwise.
    ///
    /// # Example
    ///
    /// ```
    /// # use rawhttp::http::request::Method;
    /// assert_eq!(Method::from_str("GET"), Some(Method::GET));
    /// assert_eq!(Method::from_str("get"), None);
    /// assert_eq!(Method::from_str("PUT"), None);
    /// ```
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "GET" => Some(Method::GET),
            "POST" => Some(Method::POST),
            "HEAD" => Some(Method::HEAD),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::GET => "GET",
            Method::POST => "POST",
            Method::HEAD => "HEAD",
        }
    }

    /// Value of the `Allow` header sent with 405 responses.
    ///
    /// ```
    /// # use rawhttp::http::request::Method;
    /// assert_eq!(Method::allow_header(), "GET, POST, HEAD");
    /// ```
    pub fn allow_header() -> String {
        Method::ALLOWED
            .iter()
            .map(Method::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed HTTP request.
///
/// Built once per connection by the parser and never mutated afterwards, so
/// every field is exposed read-only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    starting_line: String,
    method: Method,
    uri: String,
    version: String,
    remote_address: String,
    headers: Headers,
    parameters: HashMap<String, String>,
    body: Bytes,
}

/// Builder for constructing Request objects outside the parser.
pub struct RequestBuilder {
    method: Option<Method>,
    uri: Option<String>,
    version: Option<String>,
    remote_address: String,
    headers: Headers,
    parameters: HashMap<String, String>,
    body: Bytes,
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
            uri: None,
            version: None,
            remote_address: String::new(),
            headers: Headers::new(),
            parameters: HashMap::new(),
            body: Bytes::new(),
        }
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    pub fn uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn remote_address(mut self, remote_address: impl Into<String>) -> Self {
        self.remote_address = remote_address.into();
        self
    }

    pub fn header(mut self, key: &str, value: impl Into<String>) -> Self {
        self.headers.insert(key, value);
        self
    }

    pub fn headers(mut self, headers: Headers) -> Self {
        self.headers = headers;
        self
    }

    pub fn parameter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(name.into(), value.into());
        self
    }

    pub fn parameters(mut self, parameters: HashMap<String, String>) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn build(self) -> Result<Request, &'static str> {
        let method = self.method.ok_or("method missing")?;
        let uri = self.uri.ok_or("uri missing")?;
        let version = self.version.unwrap_or_else(|| HTTP_VERSION.to_string());
        Ok(Request {
            starting_line: format!("{} {} {}", method, uri, version),
            method,
            uri,
            version,
            remote_address: self.remote_address,
            headers: self.headers,
            parameters: self.parameters,
            body: self.body,
        })
    }

    pub(crate) fn build_parsed(self, starting_line: String) -> Result<Request, &'static str> {
        let mut request = self.build()?;
        request.starting_line = starting_line;
        Ok(request)
    }
}

impl Request {
    /// The raw start-line, e.g. `GET /index.html?x=1 HTTP/1.1`.
    pub fn starting_line(&self) -> &str {
        &self.starting_line
    }

    pub fn method(&self) -> Method {
        self.method
    }

    /// Request path without the query string.
    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn remote_address(&self) -> &str {
        &self.remote_address
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn parameters(&self) -> &HashMap<String, String> {
        &self.parameters
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Retrieves a header value by name, ignoring case.
    ///
    /// # Returns
    ///
    /// `Some(&str)` with the header value if present, `None` otherwise.
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers.get(key)
    }

    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters.get(name).map(String::as_str)
    }

    /// Retrieves the Content-Length header value and parses it as a usize.
    ///
    /// Returns 0 if the header is missing or not a valid number.
    pub fn content_length(&self) -> usize {
        self.header("Content-Length")
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(0)
    }
}
