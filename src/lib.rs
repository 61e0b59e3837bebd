//! A minimal ASGI-style application server core for the tokio-rs stack.

extern crate futures;
extern crate tokio_core;
extern crate tokio_io;
extern crate tokio_signal;
extern crate tk_listen;
#[macro_use(quick_error)] extern crate quick_error;
#[macro_use] extern crate matches;
#[macro_use] extern crate log;

#[cfg(test)]
extern crate env_logger;
#[cfg(test)]
extern crate tk_bufstream;

mod enums;
pub mod config;
pub mod error;
pub mod scope;
pub mod message;
pub mod app;
mod parser;
mod timeout;
mod response_state;
mod writer;
pub mod proto;
pub mod lifespan;
pub mod listener;

pub use app::Application;
pub use config::Config;
pub use error::Error;
pub use message::{IncomingMessage, OutgoingMessage, Receiver, Sender};
pub use scope::{Addr, HttpScope, LifespanScope, Scope, Headers};
pub use proto::{ConnInfo, Proto};
pub use listener::Server;
pub use enums::Version;
