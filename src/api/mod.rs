pub use server::{Error, MockServer, ServerStartResult};

mod server;
