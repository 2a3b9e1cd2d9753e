use crate::common::data::{MockedResponse, ResponseProducer};
use std::{fmt, sync::Arc};

/// A (method, path) binding to a response producer.
#[derive(Clone)]
pub(crate) struct MockRoute {
    pub method: String,
    pub path: String,
    producer: Arc<dyn ResponseProducer + Send + Sync>,
}

impl MockRoute {
    pub fn new(
        method: String,
        path: String,
        producer: Arc<dyn ResponseProducer + Send + Sync>,
    ) -> Self {
        Self {
            method,
            path,
            producer,
        }
    }

    pub fn matches(&self, method: &str, path: &str) -> bool {
        self.method == method && self.path == path
    }

    pub fn respond(&self) -> MockedResponse {
        self.producer.produce()
    }
}

impl fmt::Debug for MockRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockRoute")
            .field("method", &self.method)
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

/// Ordered collection of mock routes. Routes can only be appended.
///
/// Lookup compares method and path by exact string equality (no case folding, no trailing
/// slash equivalence, query strings are part of the path) and returns the route that was
/// registered first.
#[derive(Default, Debug)]
pub(crate) struct RouteRegistry {
    routes: Vec<MockRoute>,
}

impl RouteRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, route: MockRoute) {
        self.routes.push(route);
    }

    pub fn find_match(&self, method: &str, path: &str) -> Option<&MockRoute> {
        self.routes.iter().find(|r| r.matches(method, path))
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }
}
