//! Tracks, for the current response cycle, whether `http.response.start`
//! has been seen plus the accepted status/headers, and retains the
//! request scope so the keep-alive decision can consult its headers.

use scope::HttpScope;

pub struct ResponseState {
    started: bool,
    status: Option<u16>,
    headers: Vec<(Vec<u8>, Vec<u8>)>,
    scope: Option<HttpScope>,
    /// Set once any byte of the application's own response has reached
    /// the transport. Used to suppress a second, malformed 500 status
    /// line after real response bytes.
    wrote_bytes: bool,
}

impl ResponseState {
    pub fn new() -> ResponseState {
        ResponseState {
            started: false,
            status: None,
            headers: Vec::new(),
            scope: None,
            wrote_bytes: false,
        }
    }

    pub fn reset(&mut self, scope: HttpScope) {
        self.started = false;
        self.status = None;
        self.headers.clear();
        self.scope = Some(scope);
        self.wrote_bytes = false;
    }

    pub fn start(&mut self, status: u16, headers: Vec<(Vec<u8>, Vec<u8>)>) {
        self.started = true;
        self.status = Some(status);
        self.headers = headers;
    }

    pub fn started(&self) -> bool {
        self.started
    }

    pub fn status(&self) -> u16 {
        self.status.expect("status read before http.response.start")
    }

    pub fn headers(&self) -> &[(Vec<u8>, Vec<u8>)] {
        &self.headers
    }

    pub fn scope(&self) -> Option<&HttpScope> {
        self.scope.as_ref()
    }

    pub fn mark_wrote_bytes(&mut self) {
        self.wrote_bytes = true;
    }

    pub fn wrote_bytes(&self) -> bool {
        self.wrote_bytes
    }
}

#[cfg(test)]
mod test {
    use super::ResponseState;
    use scope::{HttpScope, Headers};
    use enums::Version;

    fn scope() -> HttpScope {
        HttpScope {
            method: "GET".into(),
            path: "/".into(),
            raw_path: b"/".to_vec(),
            query_string: Vec::new(),
            headers: Headers::new(),
            http_version: Version::Http11,
            scheme: "http",
            client: None,
            server: None,
            root_path: String::new(),
            asgi_version: "3.0",
            asgi_spec_version: "2.3",
        }
    }

    #[test]
    fn starts_unstarted() {
        let state = ResponseState::new();
        assert!(!state.started());
    }

    #[test]
    fn reset_clears_prior_cycle() {
        let mut state = ResponseState::new();
        state.start(200, vec![(b"x".to_vec(), b"y".to_vec())]);
        state.mark_wrote_bytes();
        state.reset(scope());
        assert!(!state.started());
        assert!(!state.wrote_bytes());
        assert!(state.headers().is_empty());
    }
}
