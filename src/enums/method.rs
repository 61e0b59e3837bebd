/// Methods recognized by the request-line parser.
///
/// Any other token on the wire is a `BAD_REQUEST`; this is a closed set,
/// not an extensible one (see `server/request_target.rs` in `tk-http` for
/// the analogous closed-set treatment of request targets).
const KNOWN_METHODS: &[&str] = &[
    "GET", "POST", "PUT", "DELETE", "HEAD",
    "CONNECT", "OPTIONS", "TRACE", "PATCH",
];

/// Methods whose bodies must be framed (`Content-Length` or chunked);
/// a missing frame on these is `LENGTH_REQUIRED`, not just an empty body.
const BODY_REQUIRED_METHODS: &[&str] = &["PUT", "POST", "PATCH"];

pub fn is_known_method(token: &str) -> bool {
    KNOWN_METHODS.contains(&token)
}

pub fn requires_length(method: &str) -> bool {
    BODY_REQUIRED_METHODS.contains(&method)
}
