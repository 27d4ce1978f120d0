use crate::error::TransportError;
use crate::fixed_server::hyper::run_server;
use crate::fixed_server::ServerOptions;
use crate::router::Router;
use crate::Fixture;
use log::{debug, warn};
use std::fmt;
use std::net::{SocketAddr, TcpListener};
use std::sync::Arc;
use tokio::sync::oneshot;

/// A mock HTTP server answering with the fixtures installed on it.
///
/// `FixedServer`s are usually obtained from [`FixtureRegistry::create_server`], which installs
/// the requested fixtures for you. Each instance owns its routing table and its listener: two
/// servers never share state, even when they were built from the same registry with
/// overlapping fixtures, and shutting one down leaves the others untouched.
///
/// ## Lifecycle
///
/// `created` → [`listen`] → `listening` → [`destroy`] → `destroyed`.
///
/// Fixtures must be installed before calling [`listen`]. A server listens once: calling
/// [`listen`] again, or [`destroy`] on a server that is not listening, is reported as an error.
/// Dropping a listening server shuts it down in the background; call [`destroy`] when you need
/// to know the port has been released.
///
/// Each listening server is driven by a dedicated thread running its own single-threaded
/// `tokio` runtime, so `listen` and `destroy` can be awaited from any async runtime.
///
/// [`FixtureRegistry::create_server`]: crate::FixtureRegistry::create_server
/// [`listen`]: FixedServer::listen
/// [`destroy`]: FixedServer::destroy
pub struct FixedServer {
    router: Router,
    options: ServerOptions,
    state: ServerState,
}

enum ServerState {
    Created,
    Listening(RunningServer),
    Destroyed,
}

struct RunningServer {
    address: SocketAddr,
    // When `shutdown_trigger` gets dropped the listening server terminates gracefully.
    shutdown_trigger: oneshot::Sender<()>,
    // Completes once the server thread has released the listener and all connections.
    closed: oneshot::Receiver<()>,
}

impl FixedServer {
    /// A server with no fixtures installed.
    pub fn new(options: ServerOptions) -> Self {
        Self {
            router: Router::default(),
            options,
            state: ServerState::Created,
        }
    }

    /// Answer requests matching the fixture's method and route with its response.
    ///
    /// Installing a fixture with the same method and route as an earlier one replaces it.
    /// Fixtures installed once the server is listening are ignored.
    pub fn install_fixture(&mut self, fixture: &Fixture) {
        if !matches!(self.state, ServerState::Created) {
            warn!(
                "Ignoring fixture \"{}\": the server has already been started.",
                fixture.name()
            );
            return;
        }
        self.router.install(
            fixture.method().clone(),
            fixture.pattern().clone(),
            fixture.responder(),
        );
    }

    /// Start serving the installed fixtures on `port`, or on the port configured in
    /// [`ServerOptions`] if `None`.
    ///
    /// The returned future resolves to the bound address as soon as the socket is listening:
    /// requests can be issued right away.
    ///
    /// ### Example:
    /// ```rust
    /// use fixed_server::{FixedServer, ServerOptions};
    ///
    /// #[tokio::main]
    /// async fn main() {
    ///     let mut server = FixedServer::new(ServerOptions::default());
    ///
    ///     // Port 0: let the OS pick a free one.
    ///     let address = server.listen(Some(0)).await.unwrap();
    ///     assert_ne!(address.port(), 0);
    ///
    ///     // Nothing installed, nothing matches.
    ///     let status = reqwest::get(server.uri().unwrap()).await.unwrap().status();
    ///     assert_eq!(status, 404);
    ///
    ///     server.destroy().await.unwrap();
    /// }
    /// ```
    pub async fn listen(&mut self, port: Option<u16>) -> Result<SocketAddr, TransportError> {
        if !matches!(self.state, ServerState::Created) {
            return Err(TransportError::AlreadyStarted);
        }
        let port = port.unwrap_or(self.options.port);
        let host = self.options.host.as_str();

        let bind_error = |source| TransportError::Bind {
            address: format!("{}:{}", host, port),
            source,
        };
        let listener = TcpListener::bind((host, port)).map_err(bind_error)?;
        listener.set_nonblocking(true).map_err(bind_error)?;
        let address = listener.local_addr().map_err(bind_error)?;

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(TransportError::Runtime)?;
        let listener = {
            let _guard = runtime.enter();
            tokio::net::TcpListener::from_std(listener).map_err(TransportError::Runtime)?
        };

        let (shutdown_trigger, shutdown_receiver) = oneshot::channel();
        let (closed_trigger, closed) = oneshot::channel();
        let router = Arc::new(self.router.clone());
        let body_print_limit = self.options.body_print_limit;
        std::thread::Builder::new()
            .name(format!("fixed-server-{}", address))
            .spawn(move || {
                runtime.block_on(run_server(
                    listener,
                    router,
                    body_print_limit,
                    shutdown_receiver,
                ));
                // Dropping the runtime tears down whatever connection task is still around.
                drop(runtime);
                let _ = closed_trigger.send(());
            })
            .map_err(TransportError::Runtime)?;

        debug!(
            "Fixed server listening on {} with {} route(s).",
            address,
            self.router.len()
        );
        self.state = ServerState::Listening(RunningServer {
            address,
            shutdown_trigger,
            closed,
        });
        Ok(address)
    }

    /// Stop accepting connections, wind down the open ones and release the port.
    ///
    /// The returned future resolves once the port is free to be bound again. Other servers are
    /// not affected.
    ///
    /// Open connections are allowed to finish: a response held back by
    /// [`ResponseTemplate::set_delay`](crate::ResponseTemplate::set_delay) keeps `destroy`
    /// pending until it has been sent. Drop the server instead if you do not need to wait.
    pub async fn destroy(&mut self) -> Result<(), TransportError> {
        let running = match std::mem::replace(&mut self.state, ServerState::Destroyed) {
            ServerState::Listening(running) => running,
            other => {
                self.state = other;
                return Err(TransportError::NotListening);
            }
        };

        debug!("Shutting down the fixed server listening on {}.", running.address);
        let _ = running.shutdown_trigger.send(());
        running
            .closed
            .await
            .map_err(|_| TransportError::Shutdown {
                address: running.address,
            })?;
        debug!("Fixed server on {} shut down.", running.address);
        Ok(())
    }

    /// The socket address this server is listening on, e.g. `127.0.0.1:4372`.
    pub fn address(&self) -> Option<SocketAddr> {
        match &self.state {
            ServerState::Listening(running) => Some(running.address),
            _ => None,
        }
    }

    /// The base uri of this server, e.g. `http://127.0.0.1:4372`, while it is listening.
    pub fn uri(&self) -> Option<String> {
        self.address()
            .map(|address| format!("{}://{}", self.options.scheme(), address))
    }

    pub fn is_listening(&self) -> bool {
        matches!(self.state, ServerState::Listening(_))
    }

    /// Number of distinct method and route pairs installed.
    pub fn route_count(&self) -> usize {
        self.router.len()
    }
}

impl fmt::Debug for FixedServer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match &self.state {
            ServerState::Created => "created".to_string(),
            ServerState::Listening(running) => format!("listening on {}", running.address),
            ServerState::Destroyed => "destroyed".to_string(),
        };
        f.debug_struct("FixedServer")
            .field("routes", &self.router.len())
            .field("state", &state)
            .finish()
    }
}
