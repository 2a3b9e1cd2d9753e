use crate::{
    common::{
        data::{RequestLogEntry, ResponseProducer},
        runtime,
        util::Join,
    },
    server::{
        builder::MockServerBuilder,
        handler::MockRequestHandler,
        server::{self, MockServerConfig},
        state::{MemoryStateManager, StateManager},
    },
};
use std::{net::SocketAddr, sync::Arc, thread};
use thiserror::Error;
use tokio::sync::oneshot;

#[derive(Error, Debug)]
pub enum Error {
    #[error("mock server error: {0}")]
    Server(#[from] server::Error),
    #[error("cannot build the server runtime: {0}")]
    RuntimeError(std::io::Error),
    #[error("cannot spawn the server thread: {0}")]
    ServerThreadError(std::io::Error),
    #[error("the server thread terminated unexpectedly")]
    ServerTerminated,
    #[error("the mock server is already running on {0}")]
    AlreadyRunning(SocketAddr),
    #[error("the mock server is not running")]
    NotRunning,
}

/// Returned by [MockServer::start](struct.MockServer.html#method.start).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerStartResult {
    /// The port the server is listening on. If an ephemeral port was requested, this is the
    /// port the operating system assigned.
    pub port: u16,
}

struct RunningServer {
    shutdown: oneshot::Sender<()>,
    stopped: oneshot::Receiver<Result<(), Error>>,
}

/// A mock server that records every request it receives and answers with the responses
/// configured through [configure_response](#method.configure_response).
///
/// Each instance owns its own request log and routes, so many servers can run in one process.
/// A server can be started and stopped repeatedly; its request log and routes are kept across
/// restarts.
///
/// While running, a server serves connections on its own thread with a single-threaded
/// runtime, so it can be used from synchronous tests as well as from any async runtime.
pub struct MockServer {
    state: Arc<MemoryStateManager>,
    config: MockServerConfig,
    address: Option<SocketAddr>,
    running: Option<RunningServer>,
}

impl MockServer {
    /// Creates a new, not yet started `MockServer` with default settings.
    pub fn new() -> Self {
        MockServerBuilder::new().build()
    }

    /// Returns a [MockServerBuilder](struct.MockServerBuilder.html) to configure a server.
    pub fn builder() -> MockServerBuilder {
        MockServerBuilder::new()
    }

    pub(crate) fn with_config(config: MockServerConfig) -> Self {
        Self {
            state: Arc::new(MemoryStateManager::new()),
            config,
            address: None,
            running: None,
        }
    }

    #[cfg(test)]
    pub(crate) fn config(&self) -> &MockServerConfig {
        &self.config
    }

    /// Starts the server asynchronously on the loopback interface.
    ///
    /// If `port` is `None`, the port configured on the builder is used. If neither is set (or
    /// the port is `0`), the operating system assigns an ephemeral port. The returned future
    /// resolves once the socket is listening.
    ///
    /// # Errors
    /// - [Error::Server] wrapping a socket bind error if the port is unavailable.
    /// - [Error::AlreadyRunning] if the server was started before and not stopped.
    ///
    /// **Example**:
    /// ```
    /// smol::block_on(async {
    ///     let mut server = mumbo::MockServer::new();
    ///     let result = server.start_async(None).await.unwrap();
    ///     assert!(result.port > 0);
    ///     server.stop_async().await.unwrap();
    /// });
    /// ```
    pub async fn start_async(&mut self, port: Option<u16>) -> Result<ServerStartResult, Error> {
        if let (Some(address), Some(_)) = (self.address, &self.running) {
            return Err(Error::AlreadyRunning(address));
        }

        let handler = MockRequestHandler::new(self.state.clone(), self.config.print_access_log);
        let config = MockServerConfig {
            static_port: port.or(self.config.static_port),
            ..self.config.clone()
        };
        let srv = server::MockServer::new(Box::new(handler), config);

        let (addr_sender, addr_receiver) = oneshot::channel::<SocketAddr>();
        let (shutdown_sender, shutdown_receiver) = oneshot::channel::<()>();
        let (stopped_sender, stopped_receiver) = oneshot::channel::<Result<(), Error>>();

        thread::Builder::new()
            .name("mumbo-server".to_string())
            .spawn(move || {
                // A dropped sender also counts as a shutdown signal.
                let shutdown = async {
                    let _ = shutdown_receiver.await;
                };
                let result = match runtime::block_on_current_thread(
                    srv.start_with_signals(Some(addr_sender), shutdown),
                ) {
                    Ok(result) => result.map_err(Error::Server),
                    Err(err) => Err(Error::RuntimeError(err)),
                };

                if let Err(err) = &result {
                    tracing::error!("mock server terminated: {}", err);
                }

                let _ = stopped_sender.send(result);
            })
            .map_err(Error::ServerThreadError)?;

        let address = match addr_receiver.await {
            Ok(address) => address,
            // The server never started listening, so the thread reports why.
            Err(_) => {
                return match stopped_receiver.await {
                    Ok(Err(err)) => Err(err),
                    _ => Err(Error::ServerTerminated),
                }
            }
        };

        self.address = Some(address);
        self.running = Some(RunningServer {
            shutdown: shutdown_sender,
            stopped: stopped_receiver,
        });

        Ok(ServerStartResult {
            port: address.port(),
        })
    }

    /// Starts the server synchronously. See [start_async](#method.start_async).
    ///
    /// **Example**:
    /// ```
    /// let mut server = mumbo::MockServer::new();
    ///
    /// let result = server.start(None).unwrap();
    ///
    /// assert_eq!(server.port(), Some(result.port));
    /// server.stop().unwrap();
    /// ```
    pub fn start(&mut self, port: Option<u16>) -> Result<ServerStartResult, Error> {
        self.start_async(port).join()
    }

    /// Stops the server asynchronously. The listening socket is closed right away, open
    /// connections are closed once their in-flight requests have been answered. The future
    /// resolves when the port has been released and all connections are closed.
    ///
    /// In-flight requests are never cut off, so a client that sends its body slowly keeps
    /// `stop_async` waiting until the request is complete. A client that never finishes its
    /// request line or headers is disconnected after a few seconds.
    ///
    /// # Errors
    /// - [Error::NotRunning] if the server is not running.
    pub async fn stop_async(&mut self) -> Result<(), Error> {
        let running = self.running.take().ok_or(Error::NotRunning)?;

        let _ = running.shutdown.send(());
        match running.stopped.await {
            Ok(result) => result,
            Err(_) => Err(Error::ServerTerminated),
        }
    }

    /// Stops the server synchronously. See [stop_async](#method.stop_async).
    pub fn stop(&mut self) -> Result<(), Error> {
        self.stop_async().join()
    }

    /// Returns `true` between a successful start and the next stop.
    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// The address the server listens on, or listened on before it was stopped.
    /// `None` if the server has never been started.
    pub fn address(&self) -> Option<SocketAddr> {
        self.address
    }

    /// The port the server listens on, or listened on before it was stopped.
    pub fn port(&self) -> Option<u16> {
        self.address.map(|addr| addr.port())
    }

    /// Builds the URL for a specific path on the mock server.
    ///
    /// **Example**:
    /// ```
    /// let mut server = mumbo::MockServer::new();
    /// let port = server.start(None).unwrap().port;
    ///
    /// let url = server.url("/hello");
    ///
    /// assert_eq!(url, Some(format!("http://127.0.0.1:{}/hello", port)));
    /// ```
    pub fn url<S: Into<String>>(&self, path: S) -> Option<String> {
        self.address
            .map(|addr| format!("http://{}{}", addr, path.into()))
    }

    /// Builds the base URL for the mock server (e.g. `http://127.0.0.1:8080`).
    pub fn base_url(&self) -> Option<String> {
        self.url("")
    }

    /// Returns a snapshot of all requests received since the server was created or since the
    /// log was last cleared, in the order in which the requests completed.
    pub fn requests(&self) -> Vec<Arc<RequestLogEntry>> {
        self.state.requests()
    }

    /// Empties the request log.
    pub fn clear_requests(&self) {
        self.state.clear_requests()
    }

    /// Adds a mock route. Requests whose method and request target (path and query) are
    /// exactly equal to `method` and `path` are answered with the response returned by
    /// `producer`. The producer is called again for every matching request.
    ///
    /// Routes are never removed. If several routes match a request, the one that was added
    /// first wins. Requests without a matching route are answered with an empty `200 OK`.
    ///
    /// **Example**:
    /// ```
    /// use mumbo::{MockServer, MockedResponse};
    ///
    /// let mut server = MockServer::new();
    /// server.start(None).unwrap();
    ///
    /// server.configure_response("GET", "/mocked", || {
    ///     MockedResponse::new(200).with_body(r#"{"test":"response"}"#)
    /// });
    ///
    /// let response = reqwest::blocking::get(server.url("/mocked").unwrap()).unwrap();
    ///
    /// assert_eq!(response.status(), 200);
    /// assert_eq!(response.text().unwrap(), r#"{"test":"response"}"#);
    /// ```
    pub fn configure_response<M, P, F>(&self, method: M, path: P, producer: F)
    where
        M: Into<String>,
        P: Into<String>,
        F: ResponseProducer + Send + Sync + 'static,
    {
        self.state
            .add_route(method.into(), path.into(), Arc::new(producer))
    }
}

impl Default for MockServer {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        if self.running.is_some() {
            if let Err(err) = self.stop() {
                tracing::warn!("cannot stop mock server: {}", err);
            }
        }
    }
}
