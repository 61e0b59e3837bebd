use std::sync::Arc;
use std::time::Duration;

/// Fine-grained configuration of the connection engine.
///
/// Built fluently and finalized with `.done()` into an `Arc<Config>` shared
/// by every connection, the same way `tk-http`'s own `server::Config` is
/// constructed.
#[derive(Debug, Clone)]
pub struct Config {
    host: String,
    port: u16,
    backlog: i32,
    request_timeout: Duration,
    keep_alive_timeout: Duration,
    max_keep_alive_requests: u64,
}

impl Config {
    /// Create a config with the defaults from the external-interfaces
    /// section: `0.0.0.0:3000`, backlog 100, 60s/5s timeouts, 100 requests.
    pub fn new() -> Config {
        Config {
            host: "0.0.0.0".to_string(),
            port: 3000,
            backlog: 100,
            request_timeout: Duration::from_secs(60),
            keep_alive_timeout: Duration::from_secs(5),
            max_keep_alive_requests: 100,
        }
    }

    /// Host to bind the listener on.
    pub fn host<S: Into<String>>(&mut self, value: S) -> &mut Self {
        self.host = value.into();
        self
    }

    /// Port to bind the listener on.
    pub fn port(&mut self, value: u16) -> &mut Self {
        self.port = value;
        self
    }

    /// TCP accept backlog.
    pub fn backlog(&mut self, value: i32) -> &mut Self {
        self.backlog = value;
        self
    }

    /// How long a request may remain in progress before a 408 is sent.
    pub fn request_timeout(&mut self, value: Duration) -> &mut Self {
        self.request_timeout = value;
        self
    }

    /// How long an idle keep-alive connection is held open.
    pub fn keep_alive_timeout(&mut self, value: Duration) -> &mut Self {
        self.keep_alive_timeout = value;
        self
    }

    /// Requests served on one connection before keep-alive is refused.
    pub fn max_keep_alive_requests(&mut self, value: u64) -> &mut Self {
        self.max_keep_alive_requests = value;
        self
    }

    /// Create an `Arc`'d config clone to pass to the constructor.
    ///
    /// This is just a convenience method.
    pub fn done(&mut self) -> Arc<Config> {
        Arc::new(self.clone())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn backlog_size(&self) -> i32 {
        self.backlog
    }

    pub fn request_timeout_duration(&self) -> Duration {
        self.request_timeout
    }

    pub fn keep_alive_timeout_duration(&self) -> Duration {
        self.keep_alive_timeout
    }

    pub fn max_keep_alive_requests_count(&self) -> u64 {
        self.max_keep_alive_requests
    }
}

impl Default for Config {
    fn default() -> Config {
        Config::new()
    }
}

#[cfg(test)]
mod test {
    use super::Config;

    #[test]
    fn defaults_match_external_interfaces() {
        let cfg = Config::new();
        assert_eq!(cfg.bind_addr(), "0.0.0.0:3000");
        assert_eq!(cfg.backlog_size(), 100);
        assert_eq!(cfg.max_keep_alive_requests_count(), 100);
    }

    #[test]
    fn builder_is_fluent() {
        let cfg = Config::new().host("127.0.0.1").port(8080).done();
        assert_eq!(cfg.bind_addr(), "127.0.0.1:8080");
    }
}
