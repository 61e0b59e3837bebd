use enums::Version;

/// An ordered, duplicate-preserving list of `(name, value)` header pairs.
///
/// Names are already lowercased and values already trimmed by the time
/// they land here (see `parser::parse_headers`); lookups are
/// case-insensitive on name but the wire order of duplicates is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers(pub Vec<(Vec<u8>, Vec<u8>)>);

impl Headers {
    pub fn new() -> Headers {
        Headers(Vec::new())
    }

    pub fn push(&mut self, name: Vec<u8>, value: Vec<u8>) {
        self.0.push((name, value));
    }

    pub fn iter(&self) -> ::std::slice::Iter<(Vec<u8>, Vec<u8>)> {
        self.0.iter()
    }

    /// First value for `name` (case-insensitive), if any.
    pub fn get(&self, name: &str) -> Option<&[u8]> {
        let name = name.as_bytes();
        self.0.iter()
            .find(|&&(ref n, _)| n.eq_ignore_ascii_case(name))
            .map(|&(_, ref v)| v.as_slice())
    }
}

/// A `(host, port)` pair, absent when the transport can't report one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Addr {
    pub host: String,
    pub port: u16,
}

/// The immutable per-request descriptor handed to the application.
#[derive(Debug, Clone)]
pub struct HttpScope {
    pub method: String,
    pub path: String,
    pub raw_path: Vec<u8>,
    pub query_string: Vec<u8>,
    pub headers: Headers,
    pub http_version: Version,
    pub scheme: &'static str,
    pub client: Option<Addr>,
    pub server: Option<Addr>,
    /// Always empty: this core never mounts sub-applications.
    pub root_path: String,
    /// Fixed `{"version": "3.0", "spec_version": "2.3"}` the callback
    /// convention expects on every `http` scope. The core never reads
    /// this back; it's carried purely for compatibility.
    pub asgi_version: &'static str,
    pub asgi_spec_version: &'static str,
}

/// The fixed `asgi["version"]` value carried on every `http` scope.
pub const ASGI_VERSION: &'static str = "3.0";
/// The fixed `asgi["spec_version"]` value carried on every `http` scope.
pub const ASGI_SPEC_VERSION: &'static str = "2.3";

/// The scope passed to the application for the one-per-process lifespan
/// channel. Carries no request data; it exists purely as a discriminator.
#[derive(Debug, Clone, Default)]
pub struct LifespanScope;

/// The value passed as the first argument of the application callable.
///
/// Mirrors the ASGI convention's two scope types: `http` (one per request)
/// and `lifespan` (one per process).
#[derive(Debug, Clone)]
pub enum Scope {
    Http(HttpScope),
    Lifespan(LifespanScope),
}

impl Scope {
    pub fn type_name(&self) -> &'static str {
        match *self {
            Scope::Http(_) => "http",
            Scope::Lifespan(_) => "lifespan",
        }
    }
}

#[cfg(test)]
mod test {
    use super::Headers;

    #[test]
    fn header_lookup_is_case_insensitive() {
        let mut headers = Headers::new();
        headers.push(b"content-type".to_vec(), b"text/plain".to_vec());
        assert_eq!(headers.get("Content-Type"), Some(&b"text/plain"[..]));
        assert_eq!(headers.get("CONTENT-TYPE"), Some(&b"text/plain"[..]));
        assert_eq!(headers.get("x-missing"), None);
    }

    #[test]
    fn duplicates_preserve_order() {
        let mut headers = Headers::new();
        headers.push(b"x-a".to_vec(), b"1".to_vec());
        headers.push(b"x-a".to_vec(), b"2".to_vec());
        assert_eq!(headers.0, vec![
            (b"x-a".to_vec(), b"1".to_vec()),
            (b"x-a".to_vec(), b"2".to_vec()),
        ]);
        // get() returns the first occurrence only, matching the keep-alive
        // scan in proto.rs which only needs "does Connection appear".
        assert_eq!(headers.get("x-a"), Some(&b"1"[..]));
    }
}
