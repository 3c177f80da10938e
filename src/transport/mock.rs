//! Scripted transport for tests.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::time::Duration;

use super::{ApiRequest, Method, Transport};
use crate::error::TransportError;

type Handler = Box<dyn Fn(&ApiRequest) -> Result<Value, TransportError> + Send + Sync>;

pub(crate) struct MockTransport {
    handler: Handler,
    delay: Option<Duration>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl MockTransport {
    pub(crate) fn new(
        handler: impl Fn(&ApiRequest) -> Result<Value, TransportError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            handler: Box::new(handler),
            delay: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Hold every response for `delay` so concurrent callers overlap.
    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub(crate) fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().clone()
    }

    pub(crate) fn count(&self, method: Method, path: &str) -> usize {
        self.requests
            .lock()
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .count()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: ApiRequest) -> Result<Value, TransportError> {
        self.requests.lock().push(request.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        (self.handler)(&request)
    }
}

pub(crate) fn status_error(path: &str, status: u16, message: &str) -> TransportError {
    TransportError::Status {
        path: path.to_string(),
        status,
        message: message.to_string(),
    }
}
