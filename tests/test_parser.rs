use rawhttp::http::error::HttpError;
use rawhttp::http::parser::{ParseError, parse_http_request, parse_parameters};
use rawhttp::http::request::Method;

fn parse(raw: &[u8]) -> Result<rawhttp::http::request::Request, ParseError> {
    let mut input = raw;
    parse_http_request(&mut input, "127.0.0.1:40000")
}

#[test]
fn test_parse_simple_get_request() {
    let parsed = parse(b"GET /index.html HTTP/1.1\r\nHost: localhost\r\n\r\n").unwrap();

    assert_eq!(parsed.method(), Method::GET);
    assert_eq!(parsed.uri(), "/index.html");
    assert_eq!(parsed.version(), "HTTP/1.1");
    assert_eq!(parsed.header("Host"), Some("localhost"));
    assert_eq!(parsed.headers().len(), 1);
    assert_eq!(parsed.starting_line(), "GET /index.html HTTP/1.1");
}

#[test]
fn test_parse_all_supported_methods() {
    for method in ["GET", "POST", "HEAD"] {
        let raw = format!("{method} /a HTTP/1.1\r\n\r\n");
        let parsed = parse(raw.as_bytes()).unwrap();
        assert_eq!(parsed.method().as_str(), method);
    }
}

#[test]
fn test_parse_body_stops_at_content_length() {
    let parsed = parse(b"POST /form HTTP/1.1\r\nContent-Length: 13\r\n\r\nname=Ann&age=7").unwrap();

    assert_eq!(parsed.method(), Method::POST);
    assert_eq!(&parsed.body()[..], b"name=Ann&age=");
    assert_eq!(parsed.parameter("name"), Some("Ann"));
    assert_eq!(parsed.parameter("age"), Some(""));
}

#[test]
fn test_parse_post_parameters_from_body() {
    let parsed = parse(b"POST /form HTTP/1.1\r\nContent-Length: 14\r\n\r\nname=Ann&age=7").unwrap();

    assert_eq!(parsed.parameter("name"), Some("Ann"));
    assert_eq!(parsed.parameter("age"), Some("7"));
    assert_eq!(parsed.content_length(), 14);
}

#[test]
fn test_parse_query_string_is_split_from_uri() {
    let parsed = parse(b"GET /search?q=rust+lang&page=2 HTTP/1.1\r\n\r\n").unwrap();

    assert_eq!(parsed.uri(), "/search");
    assert_eq!(parsed.parameter("q"), Some("rust lang"));
    assert_eq!(parsed.parameter("page"), Some("2"));
    assert_eq!(parsed.starting_line(), "GET /search?q=rust+lang&page=2 HTTP/1.1");
}

#[test]
fn test_parse_duplicate_query_parameters() {
    let parsed = parse(b"GET /?a=1&a=2 HTTP/1.1\r\n\r\n").unwrap();
    assert_eq!(parsed.parameter("a"), Some("1,2"));

    let parsed = parse(b"GET /?a=1&a=1 HTTP/1.1\r\n\r\n").unwrap();
    assert_eq!(parsed.parameter("a"), Some("1"));
}

#[test]
fn test_parse_header_continuation_lines() {
    let parsed = parse(b"GET / HTTP/1.1\r\nX-Long: first\r\n  second\r\n\tthird\r\nHost: h\r\n\r\n").unwrap();

    assert_eq!(parsed.header("X-Long"), Some("firstsecondthird"));
    assert_eq!(parsed.header("host"), Some("h"));
}

#[test]
fn test_parse_header_names_are_normalized() {
    let parsed = parse(b"GET / HTTP/1.1\r\ncontent-TYPE: text/plain\r\n\r\n").unwrap();
    let names: Vec<&str> = parsed.headers().iter().map(|(name, _)| name).collect();

    assert_eq!(names, ["Content-Type"]);
}

#[test]
fn test_parse_unsupported_method() {
    let err = parse(b"PUT /index.html HTTP/1.1\r\n\r\n").unwrap_err();

    match err {
        ParseError::Rejected(e @ HttpError::MethodNotAllowed { .. }) => {
            assert_eq!(e.status_code(), 405);
            assert_eq!(e.starting_line(), Some("PUT /index.html HTTP/1.1"));
            assert_eq!(e.response_headers(), vec![("Allow", "GET, POST, HEAD".to_string())]);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_parse_method_is_case_sensitive() {
    let err = parse(b"get / HTTP/1.1\r\n\r\n").unwrap_err();
    assert!(matches!(err, ParseError::Rejected(HttpError::MethodNotAllowed { .. })));
}

#[test]
fn test_parse_unsupported_version() {
    let err = parse(b"GET / HTTP/1.0\r\n\r\n").unwrap_err();

    match err {
        ParseError::Rejected(e) => assert_eq!(e.status_code(), 505),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_parse_malformed_starting_line() {
    for raw in [&b"GET /\r\n\r\n"[..], b"GET / HTTP/1.1 extra\r\n\r\n", b"\r\n\r\n"] {
        match parse(raw) {
            Err(ParseError::Rejected(e)) => assert_eq!(e.status_code(), 400),
            other => panic!("unexpected result for {:?}: {other:?}", String::from_utf8_lossy(raw)),
        }
    }
}

#[test]
fn test_parse_malformed_header_line() {
    let err = parse(b"GET / HTTP/1.1\r\nno colon here\r\n\r\n").unwrap_err();
    assert!(matches!(err, ParseError::Rejected(HttpError::BadRequest { .. })));
}

#[test]
fn test_parse_truncated_body() {
    let err = parse(b"POST / HTTP/1.1\r\nContent-Length: 10\r\n\r\nabc").unwrap_err();
    assert!(matches!(err, ParseError::Rejected(HttpError::BadRequest { .. })));
}

#[test]
fn test_parse_incomplete_head_is_end_of_stream() {
    assert!(matches!(parse(b"GET / HTTP/1.1\r\nHost: x\r\n"), Err(ParseError::EndOfStream)));
    assert!(matches!(parse(b""), Err(ParseError::EndOfStream)));
}

#[test]
fn test_parse_is_deterministic() {
    let raw = b"POST /p?ignored=1 HTTP/1.1\r\nA: b\r\nContent-Length: 3\r\n\r\nx=1";
    let first = parse(raw).unwrap();
    let second = parse(raw).unwrap();

    assert_eq!(first.method(), second.method());
    assert_eq!(first.uri(), second.uri());
    assert_eq!(first.version(), second.version());
    assert_eq!(first.headers(), second.headers());
    assert_eq!(first.parameters(), second.parameters());
    assert_eq!(first.body(), second.body());
}

#[test]
fn test_parse_parameters_decoding() {
    let params = parse_parameters("greeting=hello%20world&empty=&flag").unwrap();

    assert_eq!(params.get("greeting").map(String::as_str), Some("hello world"));
    assert_eq!(params.get("empty").map(String::as_str), Some(""));
    assert_eq!(params.get("flag").map(String::as_str), Some(""));
}

#[test]
fn test_parse_parameter_names_kept_as_sent() {
    let parsed = parse(b"GET /x?first%20name=Ann HTTP/1.1\r\n\r\n").unwrap();

    assert_eq!(parsed.parameter("first%20name"), Some("Ann"));
    assert_eq!(parsed.parameter("first name"), None);
}

#[test]
fn test_parse_malformed_escape_is_bad_request() {
    let err = parse(b"GET /x?a=%zz&b=%E HTTP/1.1\r\n\r\n").unwrap_err();
    assert!(matches!(err, ParseError::Rejected(HttpError::BadRequest { .. })));

    let err = parse(b"POST /form HTTP/1.1\r\nContent-Length: 6\r\n\r\nname=%").unwrap_err();
    assert!(matches!(err, ParseError::Rejected(HttpError::BadRequest { .. })));
}
