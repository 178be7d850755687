use hyper::header;
use hyper::{Body, Response, StatusCode};

pub const ALLOW_METHODS: &str = "GET, POST, OPTIONS";
pub const ALLOW_HEADERS: &str = "Content-Type, X-User-Id";
pub const MAX_AGE_SECS: u64 = 86400;

/// Answer to an OPTIONS preflight: 200, empty body.
pub fn preflight() -> Response<Body> {
    Response::builder()
        .status(StatusCode::OK)
        .header(header::ACCESS_CONTROL_ALLOW_ORIGIN, "*")
        .header(header::ACCESS_CONTROL_ALLOW_METHODS, ALLOW_METHODS)
        .header(header::ACCESS_CONTROL_ALLOW_HEADERS, ALLOW_HEADERS)
        .header(header::ACCESS_CONTROL_MAX_AGE, MAX_AGE_SECS.to_string())
        .body(Body::empty())
        .expect("failed to build preflight response")
}
