use crate::{api::MockServer, common::util::read_env, server::server::MockServerConfig};

/// The `MockServerBuilder` struct is used to configure a [MockServer](struct.MockServer.html)
/// before it is started for the first time.
///
/// Options that are not set fall back to defaults:
/// - port: none, so `start(None)` binds an ephemeral port chosen by the operating system.
/// - access log: enabled if the environment variable `MUMBO_PRINT_ACCESS_LOG` is `true`.
#[derive(Default)]
pub struct MockServerBuilder {
    port: Option<u16>,
    print_access_log: Option<bool>,
}

impl MockServerBuilder {
    /// Creates a new instance of `MockServerBuilder` with default settings.
    pub fn new() -> Self {
        MockServerBuilder {
            port: None,
            print_access_log: None,
        }
    }

    /// Sets the port the server binds to when `start` is called without a port.
    ///
    /// # Parameters
    /// - `port`: The port number. `0` requests an ephemeral port.
    ///
    /// # Returns
    /// A modified `MockServerBuilder` instance for method chaining.
    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Sets the default port as an optional value.
    pub fn port_option(mut self, port: Option<u16>) -> Self {
        self.port = port;
        self
    }

    /// Sets whether every handled request is logged at `info` level with its method,
    /// request target and response status.
    pub fn print_access_log(mut self, enabled: bool) -> Self {
        self.print_access_log = Some(enabled);
        self
    }

    /// Sets whether to print access logs as an optional value.
    pub fn print_access_log_option(mut self, enabled: Option<bool>) -> Self {
        self.print_access_log = enabled;
        self
    }

    /// Builds a `MockServer` with the current settings. The server is not started yet.
    pub fn build(self) -> MockServer {
        let print_access_log = self.print_access_log.unwrap_or_else(|| {
            read_env("MUMBO_PRINT_ACCESS_LOG", "false").eq_ignore_ascii_case("true")
        });

        MockServer::with_config(MockServerConfig {
            static_port: self.port,
            print_access_log,
        })
    }
}
