use std::fmt;

/// The HTTP version token from the request line.
///
/// All three forms accepted by the wire format are kept distinct because
/// keep-alive defaulting distinguishes `Http11` from the legacy `Http1`
/// spelling (see `Version::keeps_alive_by_default`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Version {
    /// `HTTP/1.0`
    Http10,
    /// `HTTP/1`
    Http1,
    /// `HTTP/1.1`
    Http11,
}

impl Version {
    /// Parses the token following `HTTP/` in a request line.
    pub fn parse(token: &str) -> Option<Version> {
        match token {
            "1.0" => Some(Version::Http10),
            "1" => Some(Version::Http1),
            "1.1" => Some(Version::Http11),
            _ => None,
        }
    }

    /// The exact token as it appeared on the wire, for the ASGI scope.
    pub fn as_str(&self) -> &'static str {
        match *self {
            Version::Http10 => "1.0",
            Version::Http1 => "1",
            Version::Http11 => "1.1",
        }
    }

    /// Whether a connection without an explicit `Connection` header should
    /// be kept alive by default.
    pub fn keeps_alive_by_default(&self) -> bool {
        *self == Version::Http11
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod test {
    use super::Version;

    #[test]
    fn parses_known_tokens() {
        assert_eq!(Version::parse("1.0"), Some(Version::Http10));
        assert_eq!(Version::parse("1"), Some(Version::Http1));
        assert_eq!(Version::parse("1.1"), Some(Version::Http11));
        assert_eq!(Version::parse("2.0"), None);
    }

    #[test]
    fn only_1_1_keeps_alive_by_default() {
        assert!(Version::Http11.keeps_alive_by_default());
        assert!(!Version::Http10.keeps_alive_by_default());
        assert!(!Version::Http1.keeps_alive_by_default());
    }
}
