use std::net::SocketAddr;

pub(crate) mod builder;
pub(crate) mod handler;
pub(crate) mod routes;
#[allow(clippy::module_inception)]
pub(crate) mod server;
pub(crate) mod state;

/// Connection level information attached to every request before it reaches the handler.
#[derive(Clone, Debug)]
pub(crate) struct RequestMetadata {
    pub scheme: &'static str,
    pub local_addr: SocketAddr,
}

impl RequestMetadata {
    pub fn new(scheme: &'static str, local_addr: SocketAddr) -> Self {
        Self { scheme, local_addr }
    }
}
