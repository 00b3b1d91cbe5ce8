use std::io::Read;
use std::sync::Arc;
use std::time::SystemTime;

use bytes::Bytes;
use chrono::{DateTime, TimeZone, Utc};
use minijinja::context;

use crate::clock::{Clock, rfc1123};
use crate::http::error::HttpError;
use crate::http::headers::Headers;
use crate::http::status::StatusTable;
use crate::template::TemplateManager;

pub const ERROR_TEMPLATE: &str = "error.html";

/// Values accepted by [`Response::set_header`].
///
/// Dates are rendered the way HTTP date headers expect them
/// (`Tue, 3 Jun 2008 11:05:30 GMT`).
pub trait IntoHeaderValue {
    fn into_header_value(self) -> String;
}

impl IntoHeaderValue for &str {
    fn into_header_value(self) -> String {
        self.to_string()
    }
}

impl IntoHeaderValue for String {
    fn into_header_value(self) -> String {
        self
    }
}

impl IntoHeaderValue for &String {
    fn into_header_value(self) -> String {
        self.clone()
    }
}

macro_rules! integer_header_value {
    ($($t:ty),*) => {
        $(impl IntoHeaderValue for $t {
            fn into_header_value(self) -> String {
                self.to_string()
            }
        })*
    };
}

integer_header_value!(u16, u32, u64, usize, i32, i64);

impl<Tz: TimeZone> IntoHeaderValue for DateTime<Tz> {
    fn into_header_value(self) -> String {
        rfc1123(&self)
    }
}

impl IntoHeaderValue for SystemTime {
    fn into_header_value(self) -> String {
        rfc1123(&DateTime::<Utc>::from(self))
    }
}

/// An HTTP response under construction.
///
/// Handlers receive a `&mut Response` that already carries the starter
/// headers; the connection worker finalizes and writes it once the handler
/// returns.
#[derive(Debug, Clone)]
pub struct Response {
    status: u16,
    headers: Headers,
    body: Bytes,
}

impl Default for Response {
    fn default() -> Self {
        Self {
            status: 200,
            headers: Headers::new(),
            body: Bytes::new(),
        }
    }
}

impl Response {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn set_status(&mut self, status: u16) -> &mut Self {
        self.status = status;
        self
    }

    /// Adds or replaces a header.
    ///
    /// # Arguments
    ///
    /// * `name` - Header name, normalized to `Title-Case`
    /// * `value` - Anything implementing [`IntoHeaderValue`]
    ///
    /// # Returns
    ///
    /// `HttpError::InvalidArgument` for a blank name or a CR/LF in the name or value.
    ///
    /// # Example
    ///
    /// ```
    /// # use rawhttp::http::response::Response;
    /// let mut response = Response::new();
    /// response.set_header("content-type", "text/plain").unwrap();
    /// assert_eq!(response.headers().get("Content-Type"), Some("text/plain"));
    /// assert!(response.set_header("X-Bad", "a\r\nb").is_err());
    /// ```
    pub fn set_header(&mut self, name: &str, value: impl IntoHeaderValue) -> Result<&mut Self, HttpError> {
        if name.trim().is_empty() {
            return Err(HttpError::InvalidArgument("header name must not be blank".into()));
        }
        let value = value.into_header_value();
        if has_line_break(name) || has_line_break(&value) {
            return Err(HttpError::InvalidArgument(format!(
                "header {name} must not contain CR or LF"
            )));
        }
        self.headers.insert(name, value);
        Ok(self)
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn set_body(&mut self, body: impl AsRef<[u8]>) -> &mut Self {
        self.body = Bytes::copy_from_slice(body.as_ref());
        self
    }

    /// Replaces the body with everything `reader` yields.
    pub fn set_body_from_reader(&mut self, mut reader: impl Read) -> Result<&mut Self, HttpError> {
        let mut body = Vec::new();
        reader.read_to_end(&mut body).map_err(|e| HttpError::Internal {
            message: format!("can not read response body: {e}"),
            source: Some(e.into()),
        })?;
        self.body = Bytes::from(body);
        Ok(self)
    }

    /// The body bytes. Cloning `Bytes` never exposes the response's own buffer to mutation.
    pub fn body(&self) -> Bytes {
        self.body.clone()
    }

    pub fn is_body_empty(&self) -> bool {
        self.body.is_empty()
    }

    pub fn body_len(&self) -> usize {
        self.body.len()
    }

    fn put_header(&mut self, name: &str, value: impl Into<String>) {
        self.headers.insert(name, value);
    }
}

fn has_line_break(s: &str) -> bool {
    s.contains(['\r', '\n'])
}

/// Creates fresh responses and prepares them for writing.
pub struct ResponseBuilder {
    server_name: String,
    clock: Arc<dyn Clock>,
    statuses: StatusTable,
    templates: Arc<TemplateManager>,
}

impl ResponseBuilder {
    pub fn new(
        server_name: impl Into<String>,
        clock: Arc<dyn Clock>,
        statuses: StatusTable,
        templates: Arc<TemplateManager>,
    ) -> Self {
        Self {
            server_name: server_name.into(),
            clock,
            statuses,
            templates,
        }
    }

    /// A 200 response with the starter headers every response carries.
    pub fn build_new(&self) -> Response {
        let mut response = Response::new();
        response.put_header("Date", rfc1123(&self.clock.now()));
        response.put_header("Server", self.server_name.as_str());
        response.put_header("Content-Language", "en");
        response.put_header("Connection", "close");
        response.put_header("Content-Type", "text/html");
        response
    }

    /// Last step before writing.
    ///
    /// Error statuses without a body get the error page, `Content-Length`
    /// is set from the final body, and a HEAD response loses its body but
    /// keeps the length.
    pub fn finalize(&self, response: &mut Response, head_request: bool) {
        if response.status() >= 400 && response.is_body_empty() {
            let body = self.error_page(response.status());
            response.set_body(body);
        }
        response.put_header("Content-Length", response.body_len().to_string());
        if head_request {
            response.body = Bytes::new();
        }
    }

    fn error_page(&self, status: u16) -> String {
        let message = self.statuses.message(status);
        match self.templates.render(
            ERROR_TEMPLATE,
            context! { STATUS_CODE => status, STATUS_MESSAGE => message },
        ) {
            Ok(html) => html,
            Err(e) => {
                tracing::error!(error = %e, status, "Can not render error page");
                format!("<h1>{status} {message}</h1>")
            }
        }
    }
}

impl std::fmt::Debug for ResponseBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseBuilder")
            .field("server_name", &self.server_name)
            .finish()
    }
}
