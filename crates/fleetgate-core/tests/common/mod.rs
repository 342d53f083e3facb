// Shared test helpers: an in-memory transport with scripted responses.

#![allow(dead_code)]

use std::sync::Mutex;
use std::time::Duration;

use fleetgate_api::{ApiRequest, Error, Method, Transport};
use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use serde_json::Value;

type Handler = Box<dyn Fn(&ApiRequest) -> Result<Value, Error> + Send + Sync>;

/// Answers every request through `handler` after an optional delay and
/// records what was sent.
pub struct ScriptedTransport {
    handler: Handler,
    delay: Duration,
    calls: Mutex<Vec<ApiRequest>>,
}

impl ScriptedTransport {
    pub fn new(handler: impl Fn(&ApiRequest) -> Result<Value, Error> + Send + Sync + 'static) -> Self {
        Self {
            handler: Box::new(handler),
            delay: Duration::ZERO,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> Vec<ApiRequest> {
        self.calls.lock().expect("calls lock poisoned").clone()
    }

    /// Number of requests sent with `method` to `path`.
    pub fn count(&self, method: Method, path: &str) -> usize {
        self.calls
            .lock()
            .expect("calls lock poisoned")
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .count()
    }
}

impl Transport for ScriptedTransport {
    fn execute(&self, request: ApiRequest) -> BoxFuture<'static, Result<Value, Error>> {
        let response = (self.handler)(&request);
        self.calls
            .lock()
            .expect("calls lock poisoned")
            .push(request);
        let delay = self.delay;
        async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            response
        }
        .boxed()
    }
}
