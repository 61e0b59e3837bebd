//! A minimal "Hello, World!" application exercising the listener,
//! lifespan driver and connection engine end to end.
//!
//! Mirrors the style of `tk-http`'s own `examples/hello_world.rs`: a
//! plain function matching the application signature, wired up via
//! `env_logger` for diagnostics.

extern crate env_logger;
extern crate futures;
extern crate tk_asgi;

use std::env;

use futures::Future;

use tk_asgi::{Config, IncomingMessage, OutgoingMessage, Receiver, Scope, Sender};
use tk_asgi::listener::Server;

fn hello_world(scope: Scope, receive: Receiver, send: Sender)
    -> Box<Future<Item = (), Error = String>>
{
    match scope {
        Scope::Lifespan(_) => Box::new(
            receive.recv()
                .map_err(|_| "lifespan receive failed".to_string())
                .and_then(move |(msg, receiver)| {
                    if let IncomingMessage::LifespanStartup = msg {
                        send.send(OutgoingMessage::LifespanStartupComplete);
                    }
                    receiver.recv()
                        .map_err(|_| "lifespan receive failed".to_string())
                        .map(move |(msg, _receiver)| {
                            if let IncomingMessage::LifespanShutdown = msg {
                                send.send(OutgoingMessage::LifespanShutdownComplete);
                            }
                        })
                })
        ),
        Scope::Http(_) => Box::new(
            receive.recv()
                .map_err(|_| "http receive failed".to_string())
                .map(move |(_msg, _receiver)| {
                    let body = b"Hello, World!".to_vec();
                    send.send(OutgoingMessage::ResponseStart {
                        status: 200,
                        headers: vec![
                            (b"content-type".to_vec(), b"text/plain".to_vec()),
                            (b"content-length".to_vec(),
                                body.len().to_string().into_bytes()),
                        ],
                    });
                    send.send(OutgoingMessage::ResponseBody {
                        body: body,
                        more_body: false,
                    });
                })
        ),
    }
}

fn main() {
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    env_logger::init().expect("init logging");

    let config = Config::new().done();
    Server::run(hello_world, config).expect("server error");
}
