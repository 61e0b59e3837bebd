//! Black-box connection tests driving `Proto` against an in-memory
//! transport (`tk_bufstream::MockData`): feed bytes in, run a real
//! reactor, and check the connection resolves cleanly.

extern crate futures;
extern crate tk_asgi;
extern crate tk_bufstream;
extern crate tokio_core;

use std::sync::Arc;

use futures::Future;
use tk_bufstream::MockData;
use tokio_core::reactor::Core;

use tk_asgi::{Config, OutgoingMessage, Receiver, Scope, Sender};
use tk_asgi::proto::{ConnInfo, Proto};

/// Answers every request with an empty `200` and `Connection: close`, so
/// each test connection resolves deterministically after one cycle.
fn close_after_one_response(_scope: Scope, receive: Receiver, send: Sender)
    -> Box<Future<Item = (), Error = String>>
{
    Box::new(receive.recv()
        .map_err(|_| "receive failed".to_string())
        .map(move |(_msg, _receiver)| {
            send.send(OutgoingMessage::ResponseStart {
                status: 200,
                headers: vec![
                    (b"content-length".to_vec(), b"0".to_vec()),
                    (b"connection".to_vec(), b"close".to_vec()),
                ],
            });
            send.send(OutgoingMessage::ResponseBody {
                body: Vec::new(),
                more_body: false,
            });
        }))
}

fn conn_info() -> ConnInfo {
    ConnInfo { local: None, remote: None, tls: false }
}

#[test]
fn simple_get_request_runs_to_completion() {
    let mut core = Core::new().unwrap();
    let mock = MockData::new();
    mock.add_input("GET / HTTP/1.1\r\nHost: example.com\r\nConnection: close\r\n\r\n");

    let proto = Proto::new(mock.clone(), conn_info(), Config::new().done(),
        core.handle(), Arc::new(close_after_one_response));

    core.run(proto).expect("connection should close cleanly");
}

#[test]
fn keep_alive_request_waits_for_more_bytes() {
    let mut core = Core::new().unwrap();
    let mock = MockData::new();
    // No `Connection: close`, so an HTTP/1.1 request keeps the
    // connection open after the response; with no further input the
    // keep-alive timer (5s default) hasn't fired yet, so a single
    // `poll()` must return `NotReady` rather than resolving.
    mock.add_input("GET / HTTP/1.1\r\nHost: example.com\r\n\r\n");

    let mut proto = Proto::new(mock.clone(), conn_info(), Config::new().done(),
        core.handle(), Arc::new(close_after_one_response));

    assert!(!proto.poll().expect("poll must not error").is_ready());
}

#[test]
fn unsupported_protocol_closes_without_panicking() {
    let mut core = Core::new().unwrap();
    let mock = MockData::new();
    mock.add_input("GET / HTTP/2.0\r\nHost: example.com\r\n\r\n");

    let proto = Proto::new(mock.clone(), conn_info(), Config::new().done(),
        core.handle(), Arc::new(close_after_one_response));

    core.run(proto).expect("505 path must close, not error out");
}

#[test]
fn missing_host_is_bad_request_and_closes() {
    let mut core = Core::new().unwrap();
    let mock = MockData::new();
    mock.add_input("GET / HTTP/1.1\r\n\r\n");

    let proto = Proto::new(mock.clone(), conn_info(), Config::new().done(),
        core.handle(), Arc::new(close_after_one_response));

    core.run(proto).expect("400 path must close, not error out");
}

#[test]
fn post_without_content_length_gets_length_required() {
    let mut core = Core::new().unwrap();
    let mock = MockData::new();
    mock.add_input("POST /submit HTTP/1.1\r\nHost: example.com\r\n\r\n");

    let proto = Proto::new(mock.clone(), conn_info(), Config::new().done(),
        core.handle(), Arc::new(close_after_one_response));

    core.run(proto).expect("411 path must close, not error out");
}
