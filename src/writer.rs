//! Formats canned error responses and the application-driven response.
//! Owns no state beyond what's needed to format bytes; writing those
//! bytes to the transport is the caller's job (`proto.rs`), matching
//! the ownership rule that only protocol-side code touches the socket.

/// 400 Bad Request: header-only, `Connection: close`.
pub fn bad_request() -> Vec<u8> {
    b"HTTP/1.1 400 Bad Request\r\n\
      Content-Type: text/plain\r\n\
      Connection: close\r\n\
      \r\n".to_vec()
}

/// 411 Length Required: header-only, `Connection: close`.
pub fn length_required() -> Vec<u8> {
    b"HTTP/1.1 411 Length Required\r\n\
      Content-Type: text/plain\r\n\
      Connection: close\r\n\
      \r\n".to_vec()
}

/// 500 Internal Server Error: header-only, `Connection: close`.
pub fn internal_server_error() -> Vec<u8> {
    b"HTTP/1.1 500 Internal Server Error\r\n\
      Content-Type: text/plain\r\n\
      Connection: close\r\n\
      \r\n".to_vec()
}

/// 408 Request Timeout, with a short body naming the condition.
pub fn request_timeout() -> Vec<u8> {
    let body = b"Request timed out";
    let mut out = Vec::new();
    out.extend_from_slice(b"HTTP/1.1 408 Request Timeout\r\n");
    out.extend_from_slice(b"Content-Type: text/plain\r\n");
    out.extend_from_slice(b"Connection: close\r\n");
    out.extend_from_slice(format!("Content-Length: {}\r\n", body.len()).as_bytes());
    out.extend_from_slice(b"\r\n");
    out.extend_from_slice(body);
    out
}

/// 505 HTTP Version Not Supported, body naming the offending version.
pub fn unsupported_protocol(version: &str) -> Vec<u8> {
    let body = format!("Unsupported protocol: {}", version);
    let mut out = Vec::new();
    out.extend_from_slice(b"HTTP/1.1 505 HTTP Version Not Supported\r\n");
    out.extend_from_slice(b"Content-Type: text/plain\r\n");
    out.extend_from_slice(b"Connection: close\r\n");
    out.extend_from_slice(format!("Content-Length: {}\r\n", body.len()).as_bytes());
    out.extend_from_slice(b"\r\n");
    out.extend_from_slice(body.as_bytes());
    out
}

/// Formats the status line and header block of an application-driven
/// response. Written exactly once per cycle, on the first
/// `http.response.body` message of the cycle.
///
/// Names and values are written as-is (ISO-8859-1), no folding or
/// sanitation: the application is trusted to hand back well-formed bytes.
pub fn response_head(status: u16, headers: &[(Vec<u8>, Vec<u8>)]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(format!("HTTP/1.1 {}\r\n", status).as_bytes());
    for &(ref name, ref value) in headers {
        out.extend_from_slice(name);
        out.extend_from_slice(b": ");
        out.extend_from_slice(value);
        out.extend_from_slice(b"\r\n");
    }
    out.extend_from_slice(b"\r\n");
    out
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn bad_request_is_header_only() {
        let bytes = bad_request();
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.starts_with("HTTP/1.1 400 Bad Request\r\n"));
        assert!(text.ends_with("\r\n\r\n"));
        assert!(text.contains("Connection: close\r\n"));
    }

    #[test]
    fn timeout_response_has_matching_content_length() {
        let bytes = request_timeout();
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("Content-Length: 17\r\n"));
        assert!(text.ends_with("Request timed out"));
    }

    #[test]
    fn unsupported_protocol_names_the_version() {
        let bytes = unsupported_protocol("2.0");
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.starts_with("HTTP/1.1 505 HTTP Version Not Supported\r\n"));
        assert!(text.ends_with("Unsupported protocol: 2.0"));
    }

    #[test]
    fn response_head_writes_headers_in_order() {
        let bytes = response_head(200, &[
            (b"content-length".to_vec(), b"5".to_vec()),
            (b"x-a".to_vec(), b"1".to_vec()),
        ]);
        assert_eq!(bytes, b"HTTP/1.1 200\r\ncontent-length: 5\r\nx-a: 1\r\n\r\n".to_vec());
    }
}
