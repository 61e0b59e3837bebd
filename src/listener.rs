//! Binds the TCP socket, accepts connections onto the reactor, and wires
//! SIGINT/SIGTERM to a shared shutdown flag.
//!
//! Grounded in `tk-http`'s own `examples/generate_on_the_fly.rs`, which
//! establishes the `tk_listen::ListenExt::sleep_on_error(..).listen(n)`
//! accept-loop idiom this module reuses; signal handling is new (no
//! example repo in the pack wires signals), so it's built from
//! `tokio-signal`, a real crate from the same `tokio-core` 0.1 era,
//! rather than hand-rolling a self-pipe with unsafe `libc` calls.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures::{Future, Stream};
use tokio_core::net::TcpListener;
use tokio_core::reactor::{Core, Handle};
use tk_listen::ListenExt;

use app::Application;
use config::Config;
use error::Error;
use lifespan::LifespanDriver;
use proto::{ConnInfo, Proto};
use scope::Addr;

const ACCEPT_ERROR_PAUSE: Duration = Duration::from_millis(100);

/// Runs one full process lifecycle: lifespan startup, accept loop until
/// a shutdown signal arrives, lifespan shutdown.
pub struct Server;

impl Server {
    pub fn run<A>(app: A, config: Arc<Config>) -> Result<(), Error>
        where A: Application + 'static
    {
        let mut core = Core::new()?;
        let handle = core.handle();
        let app = Arc::new(app);

        let driver = LifespanDriver::spawn(app.clone(), &handle);
        let driver = core.run(driver.startup())?;

        let addr: SocketAddr = config.bind_addr().parse()
            .map_err(|_| Error::Internal("invalid listen address".to_string()))?;
        let listener = TcpListener::bind(&addr, &handle)?;
        info!("listening on {}", config.bind_addr());

        let accept_handle = handle.clone();
        let accept_app = app.clone();
        let accept_config = config.clone();
        let accepted = listener.incoming()
            .sleep_on_error(ACCEPT_ERROR_PAUSE, &handle)
            .map(move |(socket, peer)| {
                let conn = ConnInfo {
                    local: socket.local_addr().ok().map(addr_from),
                    remote: Some(addr_from(peer)),
                    tls: false,
                };
                Proto::new(socket, conn, accept_config.clone(), accept_handle.clone(),
                        accept_app.clone())
                    .map_err(|e| warn!("connection error: {}", e))
            })
            .listen(accept_config.backlog_size() as usize);

        let signal = shutdown_signal(&handle)?.map_err(|_| ());
        let _ = core.run(accepted.select(signal).map(|_| ()).map_err(|_| ()));

        info!("shutting down");
        core.run(driver.shutdown()).ok();
        Ok(())
    }
}

fn addr_from(sock: SocketAddr) -> Addr {
    Addr { host: sock.ip().to_string(), port: sock.port() }
}

#[cfg(unix)]
fn shutdown_signal(handle: &Handle)
    -> Result<Box<Future<Item = (), Error = io::Error>>, Error>
{
    use tokio_signal::unix::{Signal, SIGINT, SIGTERM};

    let int = Signal::new(SIGINT, handle)
        .and_then(|sig| sig.into_future().map(|_| ()).map_err(|(e, _)| e));
    let term = Signal::new(SIGTERM, handle)
        .and_then(|sig| sig.into_future().map(|_| ()).map_err(|(e, _)| e));
    Ok(Box::new(int.select(term).map(|_| ()).map_err(|(e, _)| e)))
}

#[cfg(not(unix))]
fn shutdown_signal(handle: &Handle)
    -> Result<Box<Future<Item = (), Error = io::Error>>, Error>
{
    Ok(Box::new(::tokio_signal::ctrl_c(handle)
        .flatten_stream()
        .into_future()
        .map(|_| ())
        .map_err(|(e, _)| e)))
}
