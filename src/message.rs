//! The ASGI-style message types and the `receive`/`send` channel pair
//! the application callable is invoked with.
//!
//! Each request cycle gets one `futures::sync::mpsc` pair carrying
//! incoming messages to the application and one carrying outgoing
//! messages back. Unbounded channels are used rather than bounded ones
//! so `Sender::send` can be a plain synchronous call instead of a `Sink`
//! an application would have to drive to completion itself.

use futures::{Async, Future, Poll, Stream};
use futures::sync::mpsc;

/// A message delivered to the application via `receive()`.
#[derive(Debug, Clone)]
pub enum IncomingMessage {
    Request { body: Vec<u8>, more_body: bool },
    Disconnect,
    LifespanStartup,
    LifespanShutdown,
}

/// A message the application hands to `send()`.
#[derive(Debug, Clone)]
pub enum OutgoingMessage {
    ResponseStart { status: u16, headers: Vec<(Vec<u8>, Vec<u8>)> },
    ResponseBody { body: Vec<u8>, more_body: bool },
    LifespanStartupComplete,
    LifespanStartupFailed { message: String },
    LifespanShutdownComplete,
    LifespanShutdownFailed { message: String },
    /// Not part of the wire protocol: pushed by the `proto.rs` task
    /// wrapper when the application future itself resolves to an error,
    /// so the 500/close decision is still made from protocol-side code
    /// polling this same channel.
    Fault { message: String },
}

/// The `receive` half handed to the application. Each call consumes the
/// receiver and returns a future yielding the next message plus a fresh
/// receiver to call again with -- the standard "pull" idiom for a
/// `futures` 0.1 stream consumed one item at a time.
pub struct Receiver {
    inner: mpsc::UnboundedReceiver<IncomingMessage>,
}

pub struct RecvFuture(Option<mpsc::UnboundedReceiver<IncomingMessage>>);

impl Receiver {
    pub fn new(inner: mpsc::UnboundedReceiver<IncomingMessage>) -> Receiver {
        Receiver { inner: inner }
    }

    pub fn recv(self) -> RecvFuture {
        RecvFuture(Some(self.inner))
    }
}

impl Future for RecvFuture {
    type Item = (IncomingMessage, Receiver);
    type Error = ();

    fn poll(&mut self) -> Poll<Self::Item, ()> {
        let mut inner = self.0.take().expect("RecvFuture polled after completion");
        match inner.poll() {
            Ok(Async::Ready(Some(msg))) => {
                Ok(Async::Ready((msg, Receiver::new(inner))))
            }
            Ok(Async::Ready(None)) => {
                Ok(Async::Ready((IncomingMessage::Disconnect, Receiver::new(inner))))
            }
            Ok(Async::NotReady) => {
                self.0 = Some(inner);
                Ok(Async::NotReady)
            }
            Err(()) => {
                Ok(Async::Ready((IncomingMessage::Disconnect, Receiver::new(inner))))
            }
        }
    }
}

/// The `send` half handed to the application. Cloneable so `proto.rs`
/// can keep a copy to push a `Fault` message if the application future
/// itself errors out.
#[derive(Clone)]
pub struct Sender {
    inner: mpsc::UnboundedSender<OutgoingMessage>,
}

impl Sender {
    pub fn new(inner: mpsc::UnboundedSender<OutgoingMessage>) -> Sender {
        Sender { inner: inner }
    }

    pub fn send(&self, msg: OutgoingMessage) {
        // An unbounded channel only fails to send if the receiver (the
        // connection's poll loop) has already been dropped, which means
        // the connection is gone; there's nowhere left to report that.
        let _ = self.inner.unbounded_send(msg);
    }
}

/// Builds one request cycle's channel pair: `(Receiver, Sender)` for the
/// application, plus the producer/consumer ends `proto.rs` keeps.
pub fn channel_pair() -> (Receiver, Sender,
    mpsc::UnboundedSender<IncomingMessage>, mpsc::UnboundedReceiver<OutgoingMessage>)
{
    let (req_tx, req_rx) = mpsc::unbounded();
    let (resp_tx, resp_rx) = mpsc::unbounded();
    (Receiver::new(req_rx), Sender::new(resp_tx), req_tx, resp_rx)
}
