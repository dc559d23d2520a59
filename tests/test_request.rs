use lantern::http::request::{Method, RequestBuilder};

fn base() -> RequestBuilder {
    RequestBuilder::new()
        .method(Method::GET)
        .target("/index.html")
        .header("Host", "example.com")
}

#[test]
fn test_request_header_retrieval_is_case_insensitive() {
    let req = base()
        .header("Content-Type", "text/plain")
        .build()
        .unwrap();

    assert_eq!(req.header("host"), Some("example.com"));
    assert_eq!(req.header("HOST"), Some("example.com"));
    assert_eq!(req.header("content-type"), Some("text/plain"));
    assert_eq!(req.header("missing"), None);
}

#[test]
fn test_request_duplicate_headers_append() {
    let req = base()
        .header("Accept", "text/html")
        .header("ACCEPT", "image/png")
        .build()
        .unwrap();

    assert_eq!(req.headers.get("accept").unwrap(), "text/html,image/png");
}

#[test]
fn test_request_requires_host() {
    let result = RequestBuilder::new()
        .method(Method::GET)
        .target("/")
        .header("Accept", "*/*")
        .build();

    assert_eq!(result.unwrap_err(), "missing host header");
}

#[test]
fn test_request_requires_absolute_target() {
    let result = RequestBuilder::new()
        .method(Method::GET)
        .target("index.html")
        .header("Host", "x")
        .build();

    assert!(result.is_err());
}

#[test]
fn test_request_version_defaults_to_http11() {
    let req = base().build().unwrap();
    assert_eq!(req.version, "HTTP/1.1");
}

#[test]
fn test_request_keep_alive_requires_explicit_header() {
    assert!(!base().build().unwrap().keep_alive());
    assert!(base().header("Connection", "keep-alive").build().unwrap().keep_alive());
    assert!(base().header("Connection", "KEEP-ALIVE").build().unwrap().keep_alive());
    assert!(!base().header("Connection", "close").build().unwrap().keep_alive());
}

#[test]
fn test_request_user_agent() {
    assert_eq!(base().build().unwrap().user_agent(), None);
    let req = base().header("User-Agent", "curl/8.0").build().unwrap();
    assert_eq!(req.user_agent(), Some("curl/8.0"));
}

#[test]
fn test_method_parse_and_support() {
    let methods = vec![
        ("GET", Method::GET),
        ("HEAD", Method::HEAD),
        ("POST", Method::POST),
        ("PUT", Method::PUT),
        ("DELETE", Method::DELETE),
        ("OPTIONS", Method::OPTIONS),
        ("PATCH", Method::PATCH),
        ("CONNECT", Method::CONNECT),
        ("TRACE", Method::TRACE),
    ];

    for (token, expected) in methods {
        let method = Method::parse(token).unwrap();
        assert_eq!(method, expected);
        assert_eq!(method.as_str(), token);
        assert_eq!(method.is_supported(), token == "GET");
    }

    assert_eq!(Method::parse("FETCH"), None);
}
