//! `mumbo` is an in-process HTTP mock server for tests. A test starts a [MockServer](struct.MockServer.html),
//! points the code under test at it, and then
//!
//! * inspects every request the server received (URL, method and body), and
//! * scripts the responses the server sends for specific method and path combinations.
//!
//! Each `MockServer` is independent: it owns its own request log and its own routes, listens on
//! its own port and can be started and stopped any number of times. The request log and the
//! configured routes survive a restart.
//!
//! # Getting Started
//! ```rust
//! use mumbo::{MockServer, MockedResponse};
//!
//! // Start a mock server on an ephemeral port.
//! let mut server = MockServer::new();
//! let port = server.start(None).unwrap().port;
//!
//! // Answer GET /translate with a scripted response.
//! server.configure_response("GET", "/translate", || {
//!     MockedResponse::new(201).with_body("Привет")
//! });
//!
//! // Send requests to the mock server. This simulates your code.
//! let client = reqwest::blocking::Client::new();
//! let response = client
//!     .get(format!("http://127.0.0.1:{}/translate", port))
//!     .send()
//!     .unwrap();
//! client
//!     .post(format!("http://127.0.0.1:{}/unknown", port))
//!     .body("hello")
//!     .send()
//!     .unwrap();
//!
//! // Ensure the mock server did respond as configured ...
//! assert_eq!(response.status(), 201);
//! assert_eq!(response.text().unwrap(), "Привет");
//!
//! // ... and recorded both requests in the order they completed.
//! let requests = server.requests();
//! assert_eq!(requests.len(), 2);
//! assert_eq!(requests[0].path(), "/translate");
//! assert_eq!(requests[1].method(), "POST");
//! assert_eq!(requests[1].body(), "hello");
//!
//! server.stop().unwrap();
//! ```
//!
//! # Route Matching
//! A route matches a request if its method and its path are exactly equal to the request method
//! and the request target. There is no normalization: `GET` does not match `get`, `/x` does not
//! match `/x/`, and a query string is part of the request target (`/x` does not match `/x?a=1`).
//! If several routes match, the route that was configured first wins. Requests without a matching
//! route are answered with status `200` and an empty body.
//!
//! Response producers are called once for every matching request, so they can return different
//! responses over time. Response bodies are sent verbatim. Use
//! [MockedResponse::json](struct.MockedResponse.html#method.json) to send a JSON document.
//!
//! # Sync and Async API
//! `start`/`stop` block the calling thread, `start_async`/`stop_async` return futures that can be
//! awaited on any async runtime. The server itself always runs on a dedicated thread.
//!
//! # Logging
//! The crate logs through `tracing` (with `log` compatibility). Set
//! `MUMBO_PRINT_ACCESS_LOG=true` or use
//! [MockServerBuilder::print_access_log](struct.MockServerBuilder.html#method.print_access_log)
//! to log one line per handled request.
mod api;
mod common;
mod server;

pub use api::{Error, MockServer, ServerStartResult};
pub use common::data::{MockedResponse, RequestLogEntry, ResponseProducer};
pub use server::{builder::MockServerBuilder, handler::Error as RequestError, server::Error as ServerError};
