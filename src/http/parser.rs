use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::io::{self, Read};

use bytes::Bytes;

use crate::http::buffer::ByteAccumulator;
use crate::http::error::HttpError;
use crate::http::headers::Headers;
use crate::http::request::{HTTP_VERSION, Method, Request, RequestBuilder};

const BODY_CHUNK: usize = 8192;
const CONTENT_LENGTH: &str = "content-length:";

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// The peer closed the connection before a full request head arrived.
    #[error("input stream closed before the request head was complete")]
    EndOfStream,
    #[error("I/O error while reading request: {0}")]
    Io(#[from] io::Error),
    #[error(transparent)]
    Rejected(#[from] HttpError),
}

/// A parameter value with a `%` not followed by two hex digits.
#[derive(Debug, thiserror::Error)]
#[error("malformed escape in value of parameter {name}: {value}")]
pub struct InvalidEscape {
    pub name: String,
    pub value: String,
}

/// Reads one request off `input`.
///
/// The head is consumed byte by byte until the blank line, then exactly
/// `Content-Length` body bytes are read. Nothing past the body is touched.
pub fn parse_http_request<R: Read>(input: &mut R, remote_address: &str) -> Result<Request, ParseError> {
    let head = read_head(input)?;
    let starting_line = head.split("\r\n").find(|l| !l.is_empty()).unwrap_or_default();
    let content_length = content_length(&head);
    let body = read_body(input, content_length, starting_line)?;

    let request = build_request(&head, body, remote_address)?;
    tracing::trace!(
        method = %request.method(),
        uri = request.uri(),
        params = request.parameters().len(),
        "Parsed request"
    );
    Ok(request)
}

fn read_head<R: Read>(input: &mut R) -> Result<String, ParseError> {
    let mut head = ByteAccumulator::new();
    let mut byte = [0u8; 1];

    while !head.ends_with_blank_line() {
        match input.read(&mut byte) {
            Ok(0) => return Err(ParseError::EndOfStream),
            Ok(_) => head.push(byte[0]),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Err(ParseError::EndOfStream),
            Err(e) => return Err(e.into()),
        }
    }

    Ok(String::from_utf8_lossy(&head.snapshot()).into_owned())
}

/// Value of the first `Content-Length` line in the head, 0 when absent or
/// unparsable.
fn content_length(head: &str) -> usize {
    for line in head.split("\r\n") {
        let Some(prefix) = line.get(..CONTENT_LENGTH.len()) else {
            continue;
        };
        if !prefix.eq_ignore_ascii_case(CONTENT_LENGTH) {
            continue;
        }

        let raw = line[CONTENT_LENGTH.len()..].trim();
        return match raw.parse::<usize>() {
            Ok(len) => len,
            Err(e) => {
                tracing::warn!(value = raw, error = %e, "Unparsable Content-Length, assuming 0");
                0
            }
        };
    }
    0
}

fn read_body<R: Read>(input: &mut R, content_length: usize, starting_line: &str) -> Result<Bytes, ParseError> {
    let mut body = ByteAccumulator::new();
    let mut chunk = [0u8; BODY_CHUNK];
    let mut remaining = content_length;

    while remaining > 0 {
        let want = remaining.min(BODY_CHUNK);
        let n = match input.read(&mut chunk[..want]) {
            Ok(0) => {
                return Err(HttpError::bad_request(
                    format!(
                        "body ended after {} of {} bytes",
                        content_length - remaining,
                        content_length
                    ),
                    Some(starting_line),
                )
                .into());
            }
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };

        body.extend_from(&chunk, 0, n).map_err(|e| HttpError::BadRequest {
            message: e.to_string(),
            starting_line: Some(starting_line.to_string()),
            source: Some(Box::new(e)),
        })?;
        remaining -= n;
    }

    Ok(body.snapshot())
}

fn build_request(head: &str, body: Bytes, remote_address: &str) -> Result<Request, HttpError> {
    let mut lines = head.split("\r\n").filter(|line| !line.is_empty());
    let starting_line = lines
        .next()
        .ok_or_else(|| HttpError::bad_request("request head is empty", None))?;

    let tokens: Vec<&str> = starting_line.split(' ').collect();
    let &[method, uri, version] = tokens.as_slice() else {
        return Err(HttpError::bad_request(
            format!("malformed starting line: {starting_line}"),
            Some(starting_line),
        ));
    };

    let method = Method::from_str(method).ok_or_else(|| HttpError::MethodNotAllowed {
        method: method.to_string(),
        starting_line: starting_line.to_string(),
    })?;
    if version != HTTP_VERSION {
        return Err(HttpError::VersionNotSupported {
            version: version.to_string(),
            starting_line: starting_line.to_string(),
        });
    }
    if uri.is_empty() {
        return Err(HttpError::bad_request("request URI is empty", Some(starting_line)));
    }

    let headers = parse_headers(lines, starting_line)?;

    let (path, query) = match uri.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (uri, None),
    };
    let parameters = match method {
        Method::GET | Method::HEAD => query.map(parse_parameters).transpose(),
        Method::POST if !body.is_empty() => parse_parameters(&String::from_utf8_lossy(&body)).map(Some),
        Method::POST => Ok(None),
    }
    .map_err(|e| HttpError::BadRequest {
        message: e.to_string(),
        starting_line: Some(starting_line.to_string()),
        source: Some(Box::new(e)),
    })?
    .unwrap_or_default();

    RequestBuilder::new()
        .method(method)
        .uri(path)
        .version(version)
        .remote_address(remote_address)
        .headers(headers)
        .parameters(parameters)
        .body(body)
        .build_parsed(starting_line.to_string())
        .map_err(|e| HttpError::bad_request(e, Some(starting_line)))
}

fn parse_headers<'a>(lines: impl Iterator<Item = &'a str>, starting_line: &str) -> Result<Headers, HttpError> {
    let mut headers = Headers::new();
    let mut last_name: Option<String> = None;

    for line in lines {
        if line.starts_with([' ', '\t']) {
            let name = last_name.as_deref().ok_or_else(|| {
                HttpError::bad_request("header continuation without a preceding header", Some(starting_line))
            })?;
            headers.append_to(name, line.trim());
            continue;
        }

        let (name, value) = line.split_once(':').ok_or_else(|| {
            HttpError::bad_request(format!("malformed header line: {line}"), Some(starting_line))
        })?;
        if name.trim().is_empty() {
            return Err(HttpError::bad_request(
                format!("header without a name: {line}"),
                Some(starting_line),
            ));
        }
        last_name = Some(headers.insert(name, value.trim()));
    }

    Ok(headers)
}

/// Decodes `application/x-www-form-urlencoded` data.
///
/// Pairs split on the first `=`; a pair without one has an empty value.
/// Only values are decoded (`+` and `%XX`), names are kept as sent.
///
/// A repeated name only grows its value when the new value is not already a
/// substring of what has been collected, so `a=1&a=2` gives `1,2` while
/// `a=1&a=1` stays `1`.
pub fn parse_parameters(encoded: &str) -> Result<HashMap<String, String>, InvalidEscape> {
    let mut parameters = HashMap::new();

    for pair in encoded.split('&').filter(|pair| !pair.is_empty()) {
        let (name, raw) = pair.split_once('=').unwrap_or((pair, ""));
        let value = decode_value(raw).ok_or_else(|| InvalidEscape {
            name: name.to_string(),
            value: raw.to_string(),
        })?;

        match parameters.entry(name.to_string()) {
            Entry::Vacant(slot) => {
                slot.insert(value);
            }
            Entry::Occupied(mut slot) => {
                if !slot.get().contains(value.as_str()) {
                    let merged = slot.get_mut();
                    merged.push(',');
                    merged.push_str(&value);
                }
            }
        }
    }

    Ok(parameters)
}

fn decode_value(raw: &str) -> Option<String> {
    let bytes = raw.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] != b'%' {
            i += 1;
            continue;
        }
        match bytes.get(i + 1..i + 3) {
            Some(hex) if hex.iter().all(u8::is_ascii_hexdigit) => i += 3,
            _ => return None,
        }
    }

    let spaced = raw.replace('+', " ");
    Some(String::from_utf8_lossy(&urlencoding::decode_binary(spaced.as_bytes())).into_owned())
}
