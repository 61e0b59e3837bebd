//! Two independent, re-armable logical timers: REQUEST and KEEP_ALIVE.
//!
//! `tokio-core`'s reactor has no cheaper re-arm primitive than dropping
//! and recreating the `Timeout` future, so that's what `arm` does here.

use std::time::Duration;

use futures::{Async, Future, Poll};
use tokio_core::reactor::{Handle, Timeout};

use error::Error;

/// Which timer(s) a `cancel` call targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    Request,
    KeepAlive,
    All,
}

pub struct TimeoutController {
    handle: Handle,
    request: Option<Timeout>,
    keep_alive: Option<Timeout>,
}

/// What fired, reported by `poll_fired` so the caller can run the
/// matching side effect (write 408, or close) without `TimeoutController`
/// needing to know about responses or transports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fired {
    Request,
    KeepAlive,
}

impl TimeoutController {
    pub fn new(handle: Handle) -> TimeoutController {
        TimeoutController {
            handle: handle,
            request: None,
            keep_alive: None,
        }
    }

    pub fn arm_request(&mut self, duration: Duration) -> Result<(), Error> {
        self.request = Some(Timeout::new(duration, &self.handle)?);
        Ok(())
    }

    pub fn arm_keep_alive(&mut self, duration: Duration) -> Result<(), Error> {
        self.keep_alive = Some(Timeout::new(duration, &self.handle)?);
        Ok(())
    }

    pub fn cancel(&mut self, kind: TimerKind) {
        match kind {
            TimerKind::Request => self.request = None,
            TimerKind::KeepAlive => self.keep_alive = None,
            TimerKind::All => {
                self.request = None;
                self.keep_alive = None;
            }
        }
    }

    pub fn request_armed(&self) -> bool {
        self.request.is_some()
    }

    pub fn keep_alive_armed(&self) -> bool {
        self.keep_alive.is_some()
    }

    /// Polls whichever timer is armed. Returns `Ok(Some(kind))` exactly
    /// once per fire, clearing that timer's slot; `Ok(None)` if nothing
    /// fired yet.
    pub fn poll_fired(&mut self) -> Poll<Option<Fired>, Error> {
        if let Some(ref mut t) = self.request {
            if let Async::Ready(()) = t.poll()? {
                self.request = None;
                return Ok(Async::Ready(Some(Fired::Request)));
            }
        }
        if let Some(ref mut t) = self.keep_alive {
            if let Async::Ready(()) = t.poll()? {
                self.keep_alive = None;
                return Ok(Async::Ready(Some(Fired::KeepAlive)));
            }
        }
        Ok(Async::NotReady)
    }
}

#[cfg(test)]
mod test {
    use super::TimerKind;

    #[test]
    fn cancel_all_clears_both_slots() {
        // TimeoutController needs a live reactor Handle to construct, so
        // the arm/poll paths are exercised end-to-end in tests/proto.rs;
        // this just documents the enum surface used by proto.rs.
        assert_eq!(TimerKind::All, TimerKind::All);
    }
}
