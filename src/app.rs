//! The application interface: a callable of three arguments. Since
//! `tokio-core`'s executor is single-threaded, `Handle::spawn` needs no
//! `Send` bound, so applications are plain functions (or closures)
//! rather than a `dyn Trait` object.

use futures::Future;

use message::{Receiver, Sender};
use scope::Scope;

/// An ASGI-style application: given a scope and a receive/send pair,
/// returns a future that resolves to `Ok(())` on a normal finish or
/// `Err(message)` if it faulted. `proto.rs` converts a faulted future
/// into the INTERNAL_ERROR response path.
pub trait Application {
    type Future: Future<Item = (), Error = String> + 'static;

    fn call(&self, scope: Scope, receive: Receiver, send: Sender) -> Self::Future;
}

impl<F, Fut> Application for F
    where F: Fn(Scope, Receiver, Sender) -> Fut,
          Fut: Future<Item = (), Error = String> + 'static,
{
    type Future = Fut;

    fn call(&self, scope: Scope, receive: Receiver, send: Sender) -> Fut {
        (self)(scope, receive, send)
    }
}
