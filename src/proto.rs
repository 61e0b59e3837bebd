//! The connection orchestrator: receives bytes, drives the parser,
//! spawns the application task, pumps receive/send messages, enforces
//! keep-alive policy, and handles disconnects.
//!
//! Structured as a single `futures` 0.1 `Future` driving its own
//! connection state machine in `poll()`, rather than a set of
//! registered callbacks.

use std::io::{self, Read, Write};
use std::sync::Arc;

use futures::{Async, Future, Poll, Stream};
use futures::sync::mpsc;
use tokio_core::reactor::Handle;
use tokio_io::{AsyncRead, AsyncWrite};

use app::Application;
use config::Config;
use error::Error;
use message::{self, IncomingMessage, OutgoingMessage, Sender};
use parser::{self, HeaderParseError, ParserError, ParserState, RequestBuffer};
use response_state::ResponseState;
use scope::{self, Addr, HttpScope, Scope};
use timeout::{Fired, TimeoutController, TimerKind};
use writer;

const READ_CHUNK: usize = 8192;

/// Addresses and TLS presence captured at connection-established time;
/// these come from the listener that accepted the socket, not from
/// anything the connection engine negotiates itself.
#[derive(Debug, Clone)]
pub struct ConnInfo {
    pub local: Option<Addr>,
    pub remote: Option<Addr>,
    pub tls: bool,
}

/// A low-level HTTP/1.1 server connection, generic over any
/// `AsyncRead + AsyncWrite` transport and the application callable.
pub struct Proto<S, A: Application> {
    io: S,
    app: Arc<A>,
    handle: Handle,
    config: Arc<Config>,
    conn: ConnInfo,

    parser: RequestBuffer,
    headers_dispatched: bool,
    request_count: u64,

    response: ResponseState,
    timeout: TimeoutController,

    req_tx: Option<mpsc::UnboundedSender<IncomingMessage>>,
    resp_rx: Option<mpsc::UnboundedReceiver<OutgoingMessage>>,

    out_buf: Vec<u8>,
    closing: bool,
}

impl<S, A> Proto<S, A>
    where S: AsyncRead + AsyncWrite, A: Application + 'static
{
    pub fn new(io: S, conn: ConnInfo, config: Arc<Config>, handle: Handle, app: Arc<A>)
        -> Proto<S, A>
    {
        debug!("connection established from {:?}", conn.remote);
        let timeout = TimeoutController::new(handle.clone());
        Proto {
            io: io,
            app: app,
            handle: handle,
            config: config,
            conn: conn,
            parser: RequestBuffer::new(),
            headers_dispatched: false,
            request_count: 0,
            response: ResponseState::new(),
            timeout: timeout,
            req_tx: None,
            resp_rx: None,
            out_buf: Vec::new(),
            closing: false,
        }
    }

    fn queue(&mut self, bytes: Vec<u8>) {
        self.out_buf.extend_from_slice(&bytes);
    }

    fn begin_close(&mut self) {
        self.timeout.cancel(TimerKind::All);
        self.closing = true;
    }

    fn flush_output(&mut self) -> Poll<(), Error> {
        while !self.out_buf.is_empty() {
            match self.io.write(&self.out_buf) {
                Ok(0) => return Err(Error::Disconnected),
                Ok(n) => {
                    self.response.mark_wrote_bytes();
                    self.out_buf.drain(..n);
                }
                Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => {
                    return Ok(Async::NotReady);
                }
                Err(e) => return Err(e.into()),
            }
        }
        Ok(Async::Ready(()))
    }

    // -- timers -----------------------------------------------------

    fn poll_timers(&mut self) -> Result<bool, Error> {
        match self.timeout.poll_fired()? {
            Async::Ready(Some(Fired::Request)) => {
                warn!("{} on {:?}", Error::RequestTimeout, self.conn.remote);
                self.queue(writer::request_timeout());
                self.begin_close();
                Ok(true)
            }
            Async::Ready(Some(Fired::KeepAlive)) => {
                debug!("keep-alive timed out on {:?}", self.conn.remote);
                self.begin_close();
                Ok(true)
            }
            Async::Ready(None) | Async::NotReady => Ok(false),
        }
    }

    // -- bytes from the wire -----------------------------------------

    fn poll_incoming(&mut self) -> Result<bool, Error> {
        if self.closing {
            return Ok(false);
        }
        let mut buf = [0u8; READ_CHUNK];
        match self.io.read(&mut buf) {
            Ok(0) => {
                debug!("eof from {:?}", self.conn.remote);
                if let Some(ref tx) = self.req_tx {
                    let _ = tx.unbounded_send(IncomingMessage::Disconnect);
                }
                self.begin_close();
                Ok(true)
            }
            Ok(n) => {
                self.data_received(&buf[..n])?;
                Ok(true)
            }
            Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => Ok(false),
            Err(ref e) if e.kind() == io::ErrorKind::ConnectionReset => {
                self.begin_close();
                Ok(true)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn data_received(&mut self, data: &[u8]) -> Result<(), Error> {
        self.timeout.arm_request(self.config.request_timeout_duration())?;
        self.timeout.cancel(TimerKind::KeepAlive);

        self.parser.feed(data);

        match self.parser.state() {
            ParserState::ReceivingChunks
            | ParserState::ChunksComplete
            | ParserState::Complete => self.advance_dispatch()?,
            ParserState::Error => {
                let err = self.parser.error();
                self.begin_close();
                match err {
                    Some(ParserError::LengthRequired) => {
                        debug!("{}", Error::LengthRequired);
                        self.queue(writer::length_required());
                    }
                    _ => {
                        debug!("{}", Error::BadRequest);
                        self.queue(writer::bad_request());
                    }
                }
            }
            ParserState::ReceivingHeaders | ParserState::ReceivingBody => {}
        }
        Ok(())
    }

    /// Parse headers (once per cycle), build the scope, spawn the
    /// application, push the current receive message, and swap in a
    /// fresh parser once the cycle is terminal.
    fn advance_dispatch(&mut self) -> Result<(), Error> {
        if !self.headers_dispatched {
            let raw = self.parser.headers_raw().expect("headers available");
            let parsed = match parser::parse_headers(raw) {
                Ok(p) => p,
                Err(HeaderParseError::UnsupportedProtocol(v)) => {
                    debug!("{}", Error::UnsupportedProtocol(v.clone()));
                    self.timeout.cancel(TimerKind::All);
                    self.queue(writer::unsupported_protocol(&v));
                    self.closing = true;
                    return Ok(());
                }
                Err(HeaderParseError::BadRequest) => {
                    debug!("{}", Error::BadRequest);
                    self.timeout.cancel(TimerKind::All);
                    self.queue(writer::bad_request());
                    self.closing = true;
                    return Ok(());
                }
            };

            let http_scope = HttpScope {
                method: parsed.method,
                path: parsed.path,
                raw_path: parsed.raw_path,
                query_string: parsed.query_string,
                headers: parsed.headers,
                http_version: parsed.http_version,
                scheme: if self.conn.tls { "https" } else { "http" },
                client: self.conn.remote.clone(),
                server: self.conn.local.clone(),
                root_path: String::new(),
                asgi_version: scope::ASGI_VERSION,
                asgi_spec_version: scope::ASGI_SPEC_VERSION,
            };
            self.response.reset(http_scope.clone());

            let (receiver, sender, req_tx, resp_rx) = message::channel_pair();
            self.req_tx = Some(req_tx);
            self.resp_rx = Some(resp_rx);
            self.headers_dispatched = true;

            self.spawn_application(Scope::Http(http_scope), receiver, sender);
        }

        self.push_receive_message();

        if self.parser.state().is_terminal_success() {
            self.request_count += 1;
            self.parser = RequestBuffer::new();
            self.headers_dispatched = false;
            self.timeout.cancel(TimerKind::Request);
        }
        Ok(())
    }

    fn spawn_application(&self, scope: Scope, receiver: message::Receiver, sender: Sender) {
        let fault_tx = sender.clone();
        let app = self.app.clone();
        let task = app.call(scope, receiver, sender).then(move |result| {
            if let Err(message) = result {
                fault_tx.send(OutgoingMessage::Fault { message: message });
            }
            Ok::<(), ()>(())
        });
        self.handle.spawn(task);
    }

    fn push_receive_message(&mut self) {
        let msg = match self.parser.state() {
            ParserState::ReceivingChunks => {
                IncomingMessage::Request {
                    body: self.parser.last_chunks(),
                    more_body: true,
                }
            }
            ParserState::ChunksComplete => {
                IncomingMessage::Request {
                    body: self.parser.last_chunks(),
                    more_body: false,
                }
            }
            ParserState::Complete => {
                IncomingMessage::Request { body: self.parser.body(), more_body: false }
            }
            _ => IncomingMessage::Request { body: Vec::new(), more_body: false },
        };
        if let Some(ref tx) = self.req_tx {
            let _ = tx.unbounded_send(msg);
        }
    }

    // -- messages from the application --------------------------------

    fn poll_outgoing(&mut self) -> Result<bool, Error> {
        let msg = match self.resp_rx {
            Some(ref mut rx) => match rx.poll() {
                Ok(Async::Ready(Some(msg))) => msg,
                Ok(Async::Ready(None)) | Ok(Async::NotReady) => return Ok(false),
                Err(()) => return Ok(false),
            },
            None => return Ok(false),
        };
        self.handle_outgoing(msg)?;
        Ok(true)
    }

    fn handle_outgoing(&mut self, msg: OutgoingMessage) -> Result<(), Error> {
        match msg {
            OutgoingMessage::ResponseStart { status, headers } => {
                self.response.start(status, headers);
            }
            OutgoingMessage::ResponseBody { body, more_body } => {
                self.write_response_body(body, more_body)?;
            }
            OutgoingMessage::Fault { message } => {
                error!("application fault: {}", message);
                self.timeout.cancel(TimerKind::All);
                if !self.response.wrote_bytes() {
                    self.queue(writer::internal_server_error());
                }
                self.closing = true;
            }
            OutgoingMessage::LifespanStartupComplete
            | OutgoingMessage::LifespanStartupFailed { .. }
            | OutgoingMessage::LifespanShutdownComplete
            | OutgoingMessage::LifespanShutdownFailed { .. } => {
                // Only meaningful on the dedicated lifespan channel
                // (see lifespan.rs); a request-cycle sender never emits
                // these, so there's nothing to do here.
            }
        }
        Ok(())
    }

    fn write_response_body(&mut self, body: Vec<u8>, more_body: bool) -> Result<(), Error> {
        if !self.response.started() {
            return Err(Error::Internal(
                "http.response.body sent before http.response.start".to_string()));
        }
        if !self.response.wrote_bytes() {
            let head = writer::response_head(self.response.status(), self.response.headers());
            self.queue(head);
        }
        self.queue(body);
        self.response.mark_wrote_bytes();

        if !more_body {
            self.resp_rx = None;
            if self.should_keep_alive() {
                debug!("keeping connection alive after request {} on {:?}",
                    self.request_count, self.conn.remote);
                self.timeout.arm_keep_alive(self.config.keep_alive_timeout_duration())?;
            } else {
                self.begin_close();
            }
        }
        Ok(())
    }

    fn should_keep_alive(&self) -> bool {
        if self.request_count >= self.config.max_keep_alive_requests_count() {
            return false;
        }
        let scope = match self.response.scope() {
            Some(s) => s,
            None => return false,
        };
        match scope.headers.get("connection") {
            Some(value) => !value.eq_ignore_ascii_case(b"close"),
            None => scope.http_version.keeps_alive_by_default(),
        }
    }
}

impl<S, A> Future for Proto<S, A>
    where S: AsyncRead + AsyncWrite, A: Application + 'static
{
    type Item = ();
    type Error = Error;

    fn poll(&mut self) -> Poll<(), Error> {
        loop {
            match self.flush_output() {
                Ok(Async::Ready(())) => {
                    if self.closing {
                        return Ok(Async::Ready(()));
                    }
                }
                Ok(Async::NotReady) => return Ok(Async::NotReady),
                Err(e) => return Err(e),
            }

            let mut progressed = self.poll_timers()?;
            if !self.closing {
                progressed |= self.poll_outgoing()?;
            }
            if !self.closing {
                progressed |= self.poll_incoming()?;
            }
            if !progressed {
                return Ok(Async::NotReady);
            }
        }
    }
}
