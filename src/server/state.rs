use crate::{
    common::data::{MockedResponse, RequestLogEntry, ResponseProducer},
    server::routes::{MockRoute, RouteRegistry},
};
use std::sync::{Arc, Mutex, MutexGuard};

pub(crate) struct MockServerState {
    pub requests: Vec<Arc<RequestLogEntry>>,
    pub routes: RouteRegistry,
}

impl MockServerState {
    pub fn new() -> Self {
        MockServerState {
            requests: Vec::new(),
            routes: RouteRegistry::new(),
        }
    }
}

pub(crate) trait StateManager {
    fn add_route(
        &self,
        method: String,
        path: String,
        producer: Arc<dyn ResponseProducer + Send + Sync>,
    );

    fn requests(&self) -> Vec<Arc<RequestLogEntry>>;
    fn clear_requests(&self);

    /// Appends the entry to the request log and resolves the response for it. Both steps
    /// happen under one lock so no other request can interleave between them.
    fn record_and_resolve(&self, entry: RequestLogEntry, path: &str) -> Option<MockedResponse>;
}

pub(crate) struct MemoryStateManager {
    state: Mutex<MockServerState>,
}

impl MemoryStateManager {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockServerState::new()),
        }
    }

    // A producer that panicked while the lock was held poisons it. The log and the registry
    // are only ever appended to or cleared, so the data is still consistent.
    fn lock(&self) -> MutexGuard<'_, MockServerState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for MemoryStateManager {
    fn default() -> Self {
        MemoryStateManager::new()
    }
}

impl StateManager for MemoryStateManager {
    fn add_route(
        &self,
        method: String,
        path: String,
        producer: Arc<dyn ResponseProducer + Send + Sync>,
    ) {
        let mut state = self.lock();

        tracing::debug!(
            "Adding mock route #{} for {} {}",
            state.routes.len() + 1,
            method,
            path
        );

        state.routes.register(MockRoute::new(method, path, producer));
    }

    fn requests(&self) -> Vec<Arc<RequestLogEntry>> {
        self.lock().requests.clone()
    }

    fn clear_requests(&self) {
        let mut state = self.lock();
        tracing::debug!("Clearing {} logged requests", state.requests.len());
        state.requests.clear();
    }

    fn record_and_resolve(&self, entry: RequestLogEntry, path: &str) -> Option<MockedResponse> {
        let mut state = self.lock();

        let method = entry.method().to_string();
        state.requests.push(Arc::new(entry));

        match state.routes.find_match(&method, path) {
            Some(route) => {
                tracing::debug!("Matched mock route {:?}", route);
                Some(route.respond())
            }
            None => {
                tracing::trace!("No mock route for {} {}", method, path);
                None
            }
        }
    }
}
