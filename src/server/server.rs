use bytes::{Bytes, BytesMut};
use http::{Request, Response, StatusCode};
use http_body_util::{combinators::BoxBody, BodyExt, Full};
use hyper::{body::Incoming, server::conn::http1, service::service_fn};
use hyper_util::{
    rt::{TokioIo, TokioTimer},
    server::graceful::GracefulShutdown,
};
use std::{future::Future, io, net::SocketAddr, sync::Arc, time::Duration};
use thiserror::Error;
use tokio::{
    net::TcpListener,
    sync::oneshot::Sender,
    task::spawn,
};

use crate::server::{
    handler,
    handler::Handler,
    server::Error::{
        BufferError, LocalSocketAddrError, PublishSocketAddrError, RouterError, SocketBindError,
    },
    RequestMetadata,
};

/// How long a connection may take to send a complete request head. Bounds how long a stop
/// waits for a client that never finishes its request line or headers.
const HEADER_READ_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Error, Debug)]
pub enum Error {
    #[error("cannot bind to socket addr {0}: {1}")]
    SocketBindError(SocketAddr, io::Error),
    #[error("cannot obtain local address: {0}")]
    LocalSocketAddrError(io::Error),
    #[error("cannot send bound TCP address to the caller {0}")]
    PublishSocketAddrError(SocketAddr),
    #[error("buffering error: {0}")]
    BufferError(hyper::Error),
    #[error("HTTP error: {0}")]
    HTTPError(#[from] http::Error),
    #[error("cannot process request: {0}")]
    RouterError(#[from] handler::Error),
}

#[derive(Clone, Debug, Default)]
pub struct MockServerConfig {
    pub static_port: Option<u16>,
    pub print_access_log: bool,
}

/// Accepts TCP connections on the loopback interface and serves them as HTTP/1.1
/// connections, delegating every request to the handler.
pub(crate) struct MockServer<H>
where
    H: Handler + Send + Sync + 'static,
{
    handler: Box<H>,
    config: MockServerConfig,
}

impl<H> MockServer<H>
where
    H: Handler + Send + Sync + 'static,
{
    pub fn new(handler: Box<H>, config: MockServerConfig) -> Self {
        MockServer { handler, config }
    }

    /// Binds the listening socket and serves connections until `shutdown` resolves.
    ///
    /// # Parameters
    /// - `socket_addr_sender`: An optional `Sender` to send the server's socket address once it's bound.
    /// - `shutdown`: A future that resolves when the server should shut down.
    ///
    /// A bind failure is returned before anything is sent through `socket_addr_sender`.
    pub async fn start_with_signals<F>(
        self,
        socket_addr_sender: Option<Sender<SocketAddr>>,
        shutdown: F,
    ) -> Result<(), Error>
    where
        F: Future<Output = ()>,
    {
        let addr = SocketAddr::from(([127, 0, 0, 1], self.config.static_port.unwrap_or(0)));
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| SocketBindError(addr, e))?;

        let local_addr = listener.local_addr().map_err(LocalSocketAddrError)?;
        if let Some(sender) = socket_addr_sender {
            sender.send(local_addr).map_err(PublishSocketAddrError)?;
        }

        tracing::info!("Listening on {}", local_addr);
        self.run_accept_loop(listener, shutdown).await
    }

    pub async fn run_accept_loop<F>(self, listener: TcpListener, shutdown: F) -> Result<(), Error>
    where
        F: Future<Output = ()>,
    {
        let server = Arc::new(self);
        let graceful = GracefulShutdown::new();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    match accepted {
                        Ok((tcp_stream, remote_address)) => {
                            tracing::trace!("new TCP connection from {}", remote_address);
                            let local_addr = match tcp_stream.local_addr() {
                                Ok(addr) => addr,
                                Err(err) => {
                                    tracing::error!("{}", LocalSocketAddrError(err));
                                    continue;
                                }
                            };
                            let server = server.clone();
                            let connection = http1::Builder::new()
                                .timer(TokioTimer::new())
                                .header_read_timeout(HEADER_READ_TIMEOUT)
                                .serve_connection(
                                    TokioIo::new(tcp_stream),
                                    service_fn(move |mut req: Request<Incoming>| {
                                        req.extensions_mut().insert(RequestMetadata::new("http", local_addr));
                                        server.clone().service(req)
                                    }),
                                );
                            let connection = graceful.watch(connection);
                            spawn(async move {
                                if let Err(err) = connection.await {
                                    tracing::debug!("connection from {} closed with error: {:?}", remote_address, err);
                                }
                            });
                        },
                        Err(err) => {
                            tracing::error!("TCP error: {:?}", err);
                        },
                    };
                }
                _ = &mut shutdown => {
                    break;
                }
            }
        }

        // Stop accepting before waiting for the open connections, so the port is released
        // even while in-flight requests are still finishing.
        let local_addr = listener.local_addr().ok();
        drop(listener);
        graceful.shutdown().await;

        if let Some(addr) = local_addr {
            tracing::info!("Stopped listening on {}", addr);
        }

        Ok(())
    }

    async fn service(
        self: Arc<Self>,
        req: Request<Incoming>,
    ) -> Result<Response<BoxBody<Bytes, hyper::Error>>, Error> {
        tracing::trace!("New HTTP request received: {}", req.uri());

        let req = match buffer_request(req).await {
            Ok(req) => req,
            Err(err) => {
                return error_response(StatusCode::INTERNAL_SERVER_ERROR, BufferError(err));
            }
        };

        match self.handler.handle(req).await {
            Ok(response) => to_service_response(response),
            Err(err) => error_response(StatusCode::INTERNAL_SERVER_ERROR, RouterError(err)),
        }
    }
}

/// Receives the request body frame by frame and concatenates the data frames in arrival
/// order. There is no size limit.
async fn buffer_request(req: Request<Incoming>) -> Result<Request<Bytes>, hyper::Error> {
    let (parts, mut body) = req.into_parts();
    let mut buffer = BytesMut::new();
    let mut chunks = 0usize;

    while let Some(frame) = body.frame().await {
        if let Ok(data) = frame?.into_data() {
            buffer.extend_from_slice(&data);
            chunks += 1;
        }
    }

    tracing::trace!(
        "Received request body of {} bytes in {} chunks",
        buffer.len(),
        chunks
    );

    Ok(Request::from_parts(parts, buffer.freeze()))
}

fn full<T: Into<Bytes>>(chunk: T) -> BoxBody<Bytes, hyper::Error> {
    Full::new(chunk.into())
        .map_err(|never| match never {})
        .boxed()
}

fn error_response(
    code: StatusCode,
    err: Error,
) -> Result<Response<BoxBody<Bytes, hyper::Error>>, Error> {
    tracing::error!("failed to process request: {}", err);
    Ok(Response::builder()
        .status(code)
        .body(full(err.to_string()))?)
}

fn to_service_response(
    response: Response<Bytes>,
) -> Result<Response<BoxBody<Bytes, hyper::Error>>, Error> {
    let (parts, body) = response.into_parts();
    Ok(Response::from_parts(parts, full(body)))
}
