use std::io;

quick_error! {
    /// The unified error type for the connection engine.
    ///
    /// Every variant here corresponds to one of the error taxonomy entries
    /// of the protocol: each is caught at the connection boundary, turned
    /// into a single canned response, and never propagated further.
    #[derive(Debug)]
    pub enum Error {
        Io(err: io::Error) {
            description("I/O error")
            display("I/O error: {}", err)
            from()
        }
        /// Malformed framing, invalid method, missing `Host`, malformed
        /// header line, or malformed chunk.
        BadRequest {
            description("bad request")
        }
        /// A body-bearing method (`PUT`/`POST`/`PATCH`) without a
        /// `Content-Length` and without chunked framing.
        LengthRequired {
            description("length required")
        }
        /// The request line named an HTTP version outside
        /// `{1.0, 1, 1.1}`.
        UnsupportedProtocol(version: String) {
            description("unsupported protocol version")
            display("unsupported protocol: {}", version)
        }
        /// The REQUEST timer fired before the request completed.
        RequestTimeout {
            description("request timeout")
        }
        /// The application future resolved to an error, or the send
        /// ordering was violated (`http.response.body` before
        /// `http.response.start`).
        Internal(message: String) {
            description("internal error")
            display("internal error: {}", message)
        }
        /// The peer closed the transport mid-cycle.
        Disconnected {
            description("peer disconnected")
        }
        /// The application signalled `lifespan.startup.failed`.
        StartupFailed(message: String) {
            description("application startup failed")
            display("application startup failed: {}", message)
        }
    }
}
