//! Runs the application once at boot with a `lifespan` scope: a single
//! long-lived application task is given `lifespan.startup`, and much
//! later `lifespan.shutdown`, over the same receive/send pair.
//!
//! The driver waits on the `futures::sync::mpsc` channel the
//! application's `send` calls feed -- the same channel-bridging idiom
//! `proto.rs` uses for request cycles -- rather than polling on a fixed
//! interval.

use std::sync::Arc;

use futures::{Async, Future, Poll, Stream};
use futures::sync::mpsc;
use tokio_core::reactor::Handle;

use app::Application;
use error::Error;
use message::{self, IncomingMessage, OutgoingMessage};
use scope::{LifespanScope, Scope};

/// Holds the channel ends left over once the application task has been
/// spawned; carried from the startup phase into the (much later)
/// shutdown phase.
pub struct LifespanDriver {
    req_tx: mpsc::UnboundedSender<IncomingMessage>,
    resp_rx: mpsc::UnboundedReceiver<OutgoingMessage>,
}

impl LifespanDriver {
    /// Spawns the application once with a `lifespan` scope and sends
    /// `lifespan.startup`. Call `.startup()` on the result to wait for
    /// the answer.
    pub fn spawn<A>(app: Arc<A>, handle: &Handle) -> LifespanDriver
        where A: Application + 'static
    {
        let (receiver, sender, req_tx, resp_rx) = message::channel_pair();
        let task = app.call(Scope::Lifespan(LifespanScope::default()), receiver, sender)
            .then(|result| {
                if let Err(message) = result {
                    error!("lifespan application task failed: {}", message);
                }
                Ok::<(), ()>(())
            });
        handle.spawn(task);
        let _ = req_tx.unbounded_send(IncomingMessage::LifespanStartup);
        LifespanDriver { req_tx: req_tx, resp_rx: resp_rx }
    }

    /// Waits for `lifespan.startup.complete` or `.failed`.
    pub fn startup(self) -> Startup {
        Startup(Some(self))
    }

    /// Sends `lifespan.shutdown` and waits for the matching completion
    /// message.
    pub fn shutdown(self) -> Shutdown {
        let _ = self.req_tx.unbounded_send(IncomingMessage::LifespanShutdown);
        Shutdown(Some(self))
    }
}

/// Resolves once the application answers `lifespan.startup.complete`.
pub struct Startup(Option<LifespanDriver>);

impl Future for Startup {
    type Item = LifespanDriver;
    type Error = Error;

    fn poll(&mut self) -> Poll<LifespanDriver, Error> {
        let mut driver = self.0.take().expect("Startup polled after completion");
        loop {
            match driver.resp_rx.poll() {
                Ok(Async::Ready(Some(OutgoingMessage::LifespanStartupComplete))) => {
                    debug!("application startup complete");
                    return Ok(Async::Ready(driver));
                }
                Ok(Async::Ready(Some(OutgoingMessage::LifespanStartupFailed { message }))) => {
                    return Err(Error::StartupFailed(message));
                }
                Ok(Async::Ready(Some(_))) => continue,
                Ok(Async::Ready(None)) => {
                    return Err(Error::StartupFailed(
                        "lifespan task ended before signalling startup".to_string()));
                }
                Ok(Async::NotReady) => {
                    self.0 = Some(driver);
                    return Ok(Async::NotReady);
                }
                Err(()) => {
                    return Err(Error::StartupFailed("lifespan channel error".to_string()));
                }
            }
        }
    }
}

/// Resolves once the application answers `lifespan.shutdown.complete` or
/// `.failed`. A failure is only logged: the process is tearing down
/// regardless.
pub struct Shutdown(Option<LifespanDriver>);

impl Future for Shutdown {
    type Item = ();
    type Error = ();

    fn poll(&mut self) -> Poll<(), ()> {
        let mut driver = self.0.take().expect("Shutdown polled after completion");
        loop {
            match driver.resp_rx.poll() {
                Ok(Async::Ready(Some(OutgoingMessage::LifespanShutdownComplete))) => {
                    debug!("application shutdown complete");
                    return Ok(Async::Ready(()));
                }
                Ok(Async::Ready(Some(OutgoingMessage::LifespanShutdownFailed { message }))) => {
                    error!("application shutdown failed: {}", message);
                    return Ok(Async::Ready(()));
                }
                Ok(Async::Ready(Some(_))) => continue,
                Ok(Async::Ready(None)) | Err(()) => return Ok(Async::Ready(())),
                Ok(Async::NotReady) => {
                    self.0 = Some(driver);
                    return Ok(Async::NotReady);
                }
            }
        }
    }
}
