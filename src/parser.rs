//! The incremental request parser (`RequestBuffer`). Owns the raw bytes
//! of exactly one in-flight request, advances a small state machine as
//! bytes arrive, and exposes the parsed header block and (de-chunked)
//! body once a cycle completes.
//!
//! Byte-oriented throughout: buffers are scanned for markers (`\r\n\r\n`,
//! chunk size lines) rather than driven through an external grammar.

use std::str;

use enums::{Version, is_known_method, requires_length};
use scope::Headers;

/// A parse failure surfaced by `feed` via `ParserState::Error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserError {
    BadRequest,
    LengthRequired,
}

/// States of the one-request parser state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserState {
    ReceivingHeaders,
    ReceivingBody,
    ReceivingChunks,
    Complete,
    ChunksComplete,
    Error,
}

impl ParserState {
    pub fn is_terminal_success(&self) -> bool {
        matches!(*self, ParserState::Complete | ParserState::ChunksComplete)
    }
}

/// A parsed, owned request line + header block, independent of the
/// buffer it came from. Produced by the pure function `parse_headers`.
#[derive(Debug, Clone)]
pub struct ParsedHeaders {
    pub method: String,
    pub path: String,
    pub raw_path: Vec<u8>,
    pub query_string: Vec<u8>,
    pub headers: Headers,
    pub http_version: Version,
}

/// Accumulates bytes for one request and drives the state machine.
/// A fresh instance is installed after every completed cycle; nothing
/// here survives past one request.
pub struct RequestBuffer {
    buffer: Vec<u8>,
    state: ParserState,
    content_length: Option<u64>,
    chunked: bool,
    headers_end: Option<usize>,
    error: Option<ParserError>,
    /// Cursor into the chunk-framed tail, consumed by `last_chunks()`.
    chunk_cursor: usize,
}

impl RequestBuffer {
    pub fn new() -> RequestBuffer {
        RequestBuffer {
            buffer: Vec::new(),
            state: ParserState::ReceivingHeaders,
            content_length: None,
            chunked: false,
            headers_end: None,
            error: None,
            chunk_cursor: 0,
        }
    }

    pub fn state(&self) -> ParserState {
        self.state
    }

    pub fn error(&self) -> Option<ParserError> {
        self.error
    }

    /// Appends bytes and advances the state machine once. Returns `true`
    /// iff the request is now complete (`Complete` or `ChunksComplete`).
    pub fn feed(&mut self, data: &[u8]) -> bool {
        if data.is_empty() {
            return self.state.is_terminal_success();
        }
        self.buffer.extend_from_slice(data);
        self.advance();
        self.state.is_terminal_success()
    }

    fn advance(&mut self) {
        match self.state {
            ParserState::ReceivingHeaders => self.advance_headers(),
            ParserState::ReceivingBody => self.advance_body(),
            ParserState::ReceivingChunks => self.advance_chunks(),
            ParserState::Complete
            | ParserState::ChunksComplete
            | ParserState::Error => {}
        }
    }

    fn fail(&mut self, err: ParserError) {
        self.state = ParserState::Error;
        self.error = Some(err);
    }

    fn advance_headers(&mut self) {
        let sep = find(&self.buffer, b"\r\n\r\n");
        let sep = match sep {
            Some(i) => i,
            None => return,
        };
        self.headers_end = Some(sep + 4);
        let head = match str::from_utf8(&self.buffer[..sep]) {
            // ISO-8859-1 never fails UTF-8 validation for ASCII bytes but
            // can for octets >= 0x80; decode leniently instead.
            Ok(s) => s.to_string(),
            Err(_) => decode_latin1(&self.buffer[..sep]),
        };

        self.chunked = scan_transfer_encoding_chunked(&head);
        if self.chunked {
            self.state = ParserState::ReceivingChunks;
            self.chunk_cursor = self.headers_end.unwrap();
            self.advance_chunks();
            return;
        }

        let method = match first_line_method(&head) {
            Some(m) => m,
            None => return self.fail(ParserError::BadRequest),
        };
        self.content_length = scan_content_length(&head);
        let body_required = requires_length(&method);

        match self.content_length {
            None if body_required => self.fail(ParserError::LengthRequired),
            None => self.state = ParserState::Complete,
            Some(0) => self.state = ParserState::Complete,
            Some(len) => {
                self.state = ParserState::ReceivingBody;
                self.content_length = Some(len);
                self.advance_body();
            }
        }
    }

    fn advance_body(&mut self) {
        let end = self.headers_end.expect("headers_end set before body");
        let have = (self.buffer.len() - end) as u64;
        if have >= self.content_length.unwrap_or(0) {
            self.state = ParserState::Complete;
        }
    }

    fn advance_chunks(&mut self) {
        let end = self.headers_end.expect("headers_end set before chunks");
        let mut pos = end;
        loop {
            let tail = &self.buffer[pos..];
            match next_chunk_frame(tail) {
                ChunkFrame::Incomplete => return,
                ChunkFrame::Malformed => return self.fail(ParserError::BadRequest),
                ChunkFrame::TrailingGarbage => return self.fail(ParserError::BadRequest),
                ChunkFrame::Final => {
                    self.state = ParserState::ChunksComplete;
                    return;
                }
                ChunkFrame::Frame { header_len, size } => {
                    pos += header_len + size + 2;
                }
            }
        }
    }

    /// Bytes up to and including `\r\n\r\n`. Valid once headers are
    /// parsed, i.e. `state` is neither `ReceivingHeaders` nor `Error`.
    pub fn headers_raw(&self) -> Result<&[u8], ()> {
        match self.headers_end {
            Some(end) if self.state != ParserState::Error => Ok(&self.buffer[..end]),
            _ => Err(()),
        }
    }

    /// The request body, de-chunked if chunked. Valid only in a terminal
    /// success state.
    pub fn body(&self) -> Vec<u8> {
        assert!(self.state.is_terminal_success(), "body not ready");
        let end = self.headers_end.unwrap();
        if self.chunked {
            dechunk_all(&self.buffer[end..])
        } else {
            match self.content_length {
                Some(len) => self.buffer[end..end + len as usize].to_vec(),
                None => Vec::new(),
            }
        }
    }

    /// Newly arrived chunk payloads (without framing), concatenated, and
    /// consumed up to the current cursor. Valid during or at the end of
    /// chunked reception.
    pub fn last_chunks(&mut self) -> Vec<u8> {
        assert!(matches!(self.state,
            ParserState::ReceivingChunks | ParserState::ChunksComplete));
        let mut out = Vec::new();
        loop {
            let tail = &self.buffer[self.chunk_cursor..];
            match next_chunk_frame(tail) {
                ChunkFrame::Frame { header_len, size } => {
                    let data_start = self.chunk_cursor + header_len;
                    out.extend_from_slice(&self.buffer[data_start..data_start + size]);
                    self.chunk_cursor = data_start + size + 2;
                }
                _ => break,
            }
        }
        out
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

fn scan_transfer_encoding_chunked(head: &str) -> bool {
    for line in head.split("\r\n") {
        if let Some(colon) = line.find(':') {
            let (name, value) = line.split_at(colon);
            if name.eq_ignore_ascii_case("transfer-encoding") {
                return value[1..].trim().eq_ignore_ascii_case("chunked");
            }
        }
    }
    false
}

fn scan_content_length(head: &str) -> Option<u64> {
    for line in head.split("\r\n") {
        if let Some(colon) = line.find(':') {
            let (name, value) = line.split_at(colon);
            if name.eq_ignore_ascii_case("content-length") {
                return value[1..].trim().parse().ok();
            }
        }
    }
    None
}

fn first_line_method(head: &str) -> Option<String> {
    let first_line = head.split("\r\n").next().unwrap_or("");
    let mut parts = first_line.split(' ');
    let method = parts.next()?;
    let _target = parts.next()?;
    let _version = parts.next()?;
    if parts.next().is_some() {
        return None; // trailing whitespace / extra tokens on request line
    }
    Some(method.to_string())
}

enum ChunkFrame {
    /// A complete, well-formed chunk was consumed; `header_len` is the
    /// size-line length including its trailing CRLF.
    Frame { header_len: usize, size: usize },
    Final,
    Incomplete,
    Malformed,
    TrailingGarbage,
}

/// Parses one chunk frame at the start of `tail`. Does not mutate
/// anything; callers advance their own cursor using the result.
fn next_chunk_frame(tail: &[u8]) -> ChunkFrame {
    let size_end = match find(tail, b"\r\n") {
        Some(i) => i,
        None => return ChunkFrame::Incomplete,
    };
    let size_line = &tail[..size_end];
    let size_token = match size_line.iter().position(|&b| b == b';') {
        Some(i) => &size_line[..i],
        None => size_line,
    };
    let size_str = match str::from_utf8(size_token) {
        Ok(s) => s,
        Err(_) => return ChunkFrame::Malformed,
    };
    let size = match usize::from_str_radix(size_str.trim(), 16) {
        Ok(n) => n,
        Err(_) => return ChunkFrame::Malformed,
    };
    let header_len = size_end + 2;

    if size == 0 {
        return match tail.len().checked_sub(header_len) {
            None | Some(0) | Some(1) => ChunkFrame::Incomplete,
            Some(2) => {
                if &tail[header_len..header_len + 2] == b"\r\n" {
                    ChunkFrame::Final
                } else {
                    ChunkFrame::Malformed
                }
            }
            Some(_) => ChunkFrame::TrailingGarbage,
        };
    }

    let full = header_len + size + 2;
    if tail.len() < full {
        return ChunkFrame::Incomplete;
    }
    if &tail[header_len + size..full] != b"\r\n" {
        return ChunkFrame::Malformed;
    }
    ChunkFrame::Frame { header_len, size }
}

fn dechunk_all(mut tail: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    loop {
        match next_chunk_frame(tail) {
            ChunkFrame::Frame { header_len, size } => {
                out.extend_from_slice(&tail[header_len..header_len + size]);
                tail = &tail[header_len + size + 2..];
            }
            _ => break,
        }
    }
    out
}

/// Pure function over a header block: splits the request line, validates
/// the method and protocol, splits path/query, lowercases header names,
/// trims values, preserves duplicates and order, and requires a
/// non-empty `Host`. Byte decoding is ISO-8859-1.
///
/// Returns `Err(ParserError::BadRequest)` except for the one case the
/// spec calls out separately (unsupported protocol), which is surfaced
/// through `Err` with a distinguishing payload via `parse_headers_result`.
pub enum HeaderParseError {
    BadRequest,
    UnsupportedProtocol(String),
}

pub fn parse_headers(raw: &[u8]) -> Result<ParsedHeaders, HeaderParseError> {
    let text = decode_latin1(raw);
    let mut lines = text.split("\r\n");
    let request_line = lines.next().unwrap_or("");
    let mut tokens = request_line.split(' ');
    let method = tokens.next().filter(|s| !s.is_empty())
        .ok_or(HeaderParseError::BadRequest)?;
    let target = tokens.next().filter(|s| !s.is_empty())
        .ok_or(HeaderParseError::BadRequest)?;
    let proto = tokens.next().filter(|s| !s.is_empty())
        .ok_or(HeaderParseError::BadRequest)?;
    if tokens.next().is_some() {
        return Err(HeaderParseError::BadRequest);
    }

    if !is_known_method(method) {
        return Err(HeaderParseError::BadRequest);
    }

    if !proto.starts_with("HTTP/") {
        return Err(HeaderParseError::BadRequest);
    }
    let version_token = &proto[5..];
    let version = match Version::parse(version_token) {
        Some(v) => v,
        None => return Err(HeaderParseError::UnsupportedProtocol(version_token.to_string())),
    };

    let (path, query) = match target.find('?') {
        Some(i) => (&target[..i], &target[i + 1..]),
        None => (target, ""),
    };

    let mut headers = Headers::new();
    let mut has_host = false;
    for line in lines {
        if line.is_empty() || line.starts_with(':') {
            continue;
        }
        let colon = line.find(':').ok_or(HeaderParseError::BadRequest)?;
        let (name, value) = line.split_at(colon);
        let name = name.trim().to_ascii_lowercase();
        let value = value[1..].trim();
        if name == "host" && !value.is_empty() {
            has_host = true;
        }
        headers.push(name.into_bytes(), value.as_bytes().to_vec());
    }

    if !has_host {
        return Err(HeaderParseError::BadRequest);
    }

    Ok(ParsedHeaders {
        method: method.to_string(),
        path: path.to_string(),
        raw_path: path.as_bytes().to_vec(),
        query_string: query.as_bytes().to_vec(),
        headers: headers,
        http_version: version,
    })
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn whole_request_reaches_complete() {
        let mut p = RequestBuffer::new();
        assert!(p.feed(b"GET / HTTP/1.1\r\nHost: example.com\r\n\r\n"));
        assert_eq!(p.state(), ParserState::Complete);
        let headers = parse_headers(p.headers_raw().unwrap())
            .map_err(|_| ()).unwrap();
        assert_eq!(headers.method, "GET");
        assert_eq!(headers.path, "/");
        assert_eq!(headers.headers.0, vec![
            (b"host".to_vec(), b"example.com".to_vec()),
        ]);
    }

    #[test]
    fn byte_splitting_yields_same_terminal_state() {
        let whole = b"POST /s HTTP/1.1\r\nHost: h\r\nContent-Length: 12\r\n\r\nHello, World";
        let mut one_shot = RequestBuffer::new();
        one_shot.feed(whole);

        let mut split = RequestBuffer::new();
        for byte in whole {
            split.feed(&[*byte]);
        }

        assert_eq!(one_shot.state(), split.state());
        assert_eq!(one_shot.state(), ParserState::Complete);
        assert_eq!(one_shot.body(), split.body());
        assert_eq!(one_shot.body(), b"Hello, World".to_vec());
    }

    #[test]
    fn content_length_body_is_exact() {
        let mut p = RequestBuffer::new();
        p.feed(b"POST /submit HTTP/1.1\r\nHost: h\r\nContent-Length: 12\r\n\r\nHello, World");
        assert_eq!(p.state(), ParserState::Complete);
        assert_eq!(p.body(), b"Hello, World".to_vec());
    }

    #[test]
    fn body_incomplete_stays_receiving_body() {
        let mut p = RequestBuffer::new();
        p.feed(b"POST /submit HTTP/1.1\r\nHost: h\r\nContent-Length: 12\r\n\r\nHello,");
        assert_eq!(p.state(), ParserState::ReceivingBody);
    }

    #[test]
    fn chunked_upload_round_trips() {
        let mut p = RequestBuffer::new();
        p.feed(b"POST /u HTTP/1.1\r\nHost: h\r\nTransfer-Encoding: chunked\r\n\r\n");
        assert_eq!(p.state(), ParserState::ReceivingChunks);
        p.feed(b"5\r\nHello\r\n");
        assert_eq!(p.state(), ParserState::ReceivingChunks);
        p.feed(b"6\r\nWorld!\r\n");
        assert_eq!(p.state(), ParserState::ReceivingChunks);
        p.feed(b"0\r\n\r\n");
        assert_eq!(p.state(), ParserState::ChunksComplete);
        assert_eq!(p.body(), b"HelloWorld!".to_vec());
    }

    #[test]
    fn malformed_chunk_size_is_bad_request() {
        let mut p = RequestBuffer::new();
        p.feed(b"POST /u HTTP/1.1\r\nHost: h\r\nTransfer-Encoding: chunked\r\n\r\n");
        p.feed(b"5Hello\r\n");
        assert_eq!(p.state(), ParserState::Error);
        assert_eq!(p.error(), Some(ParserError::BadRequest));
    }

    #[test]
    fn chunk_missing_trailing_crlf_is_bad_request() {
        let mut p = RequestBuffer::new();
        p.feed(b"POST /u HTTP/1.1\r\nHost: h\r\nTransfer-Encoding: chunked\r\n\r\n");
        p.feed(b"5\r\nHelloXX");
        assert_eq!(p.state(), ParserState::Error);
        assert_eq!(p.error(), Some(ParserError::BadRequest));
    }

    #[test]
    fn truncated_nonzero_chunk_waits() {
        let mut p = RequestBuffer::new();
        p.feed(b"POST /u HTTP/1.1\r\nHost: h\r\nTransfer-Encoding: chunked\r\n\r\n");
        p.feed(b"6\r\nWor");
        assert_eq!(p.state(), ParserState::ReceivingChunks);
    }

    #[test]
    fn zero_chunk_without_final_crlf_waits() {
        let mut p = RequestBuffer::new();
        p.feed(b"POST /u HTTP/1.1\r\nHost: h\r\nTransfer-Encoding: chunked\r\n\r\n");
        p.feed(b"0\r\n");
        assert_eq!(p.state(), ParserState::ReceivingChunks);
    }

    #[test]
    fn bytes_after_zero_chunk_terminator_are_bad_request() {
        let mut p = RequestBuffer::new();
        p.feed(b"POST /u HTTP/1.1\r\nHost: h\r\nTransfer-Encoding: chunked\r\n\r\n");
        p.feed(b"0\r\n\r\nXX");
        assert_eq!(p.state(), ParserState::Error);
        assert_eq!(p.error(), Some(ParserError::BadRequest));
    }

    #[test]
    fn missing_content_length_on_post_is_length_required() {
        let mut p = RequestBuffer::new();
        p.feed(b"POST /submit HTTP/1.1\r\nHost: h\r\n\r\n");
        assert_eq!(p.state(), ParserState::Error);
        assert_eq!(p.error(), Some(ParserError::LengthRequired));
    }

    #[test]
    fn get_without_content_length_completes_with_empty_body() {
        let mut p = RequestBuffer::new();
        p.feed(b"GET / HTTP/1.1\r\nHost: h\r\n\r\n");
        assert_eq!(p.state(), ParserState::Complete);
        assert_eq!(p.body(), Vec::<u8>::new());
    }

    #[test]
    fn feeding_empty_bytes_leaves_state_unchanged() {
        let mut p = RequestBuffer::new();
        p.feed(b"GET / HTTP/1.1\r\n");
        let before = p.state();
        p.feed(b"");
        assert_eq!(p.state(), before);
    }

    #[test]
    fn version_mismatch_is_unsupported_protocol() {
        let err = parse_headers(b"GET / HTTP/2.0\r\nHost: h\r\n\r\n")
            .err().expect("must fail");
        match err {
            HeaderParseError::UnsupportedProtocol(v) => assert_eq!(v, "2.0"),
            _ => panic!("wrong error variant"),
        }
    }

    #[test]
    fn request_line_with_trailing_whitespace_is_bad_request() {
        let err = parse_headers(b"GET /  HTTP/1.1\r\nHost: h\r\n\r\n").err();
        assert!(err.is_some());
    }

    #[test]
    fn duplicate_headers_preserve_order() {
        let parsed = parse_headers(
            b"GET / HTTP/1.1\r\nHost: h\r\nX-A: 1\r\nX-A: 2\r\n\r\n"
        ).map_err(|_| ()).unwrap();
        assert_eq!(parsed.headers.0, vec![
            (b"host".to_vec(), b"h".to_vec()),
            (b"x-a".to_vec(), b"1".to_vec()),
            (b"x-a".to_vec(), b"2".to_vec()),
        ]);
    }

    #[test]
    fn missing_host_is_bad_request() {
        let err = parse_headers(b"GET / HTTP/1.1\r\n\r\n").err();
        assert!(err.is_some());
    }

    #[test]
    fn parse_headers_is_idempotent() {
        let raw: &[u8] = b"GET /x?y=1 HTTP/1.1\r\nHost: h\r\n\r\n";
        let a = parse_headers(raw).map_err(|_| ()).unwrap();
        let b = parse_headers(raw).map_err(|_| ()).unwrap();
        assert_eq!(a.method, b.method);
        assert_eq!(a.path, b.path);
        assert_eq!(a.query_string, b.query_string);
    }

    #[test]
    fn completed_request_resets_on_fresh_buffer() {
        let p = RequestBuffer::new();
        assert_eq!(p.state(), ParserState::ReceivingHeaders);
    }
}
