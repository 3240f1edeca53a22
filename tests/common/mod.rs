//! Shared test doubles.

// Not every test binary uses every helper.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use courier::transport::{ApiRequest, Transport, TransportError};

/// Transport double with scripted responses and recorded requests.
///
/// Responses are consumed front-to-back, one per `send`. Running out of
/// scripted responses panics the executor task, which surfaces to the caller
/// as an interrupted action.
#[derive(Default)]
pub struct MockTransport {
    responses: Mutex<VecDeque<Result<serde_json::Value, TransportError>>>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script a successful decoded response body.
    pub fn enqueue(&self, body: serde_json::Value) {
        if let Ok(mut responses) = self.responses.lock() {
            responses.push_back(Ok(body));
        }
    }

    /// Script a transport-level failure.
    pub fn enqueue_error(&self, status: u16) {
        if let Ok(mut responses) = self.responses.lock() {
            responses.push_back(Err(TransportError::Status { status }));
        }
    }

    /// Requests recorded so far, in send order.
    pub fn requests(&self) -> Vec<ApiRequest> {
        match self.requests.lock() {
            Ok(requests) => requests.clone(),
            Err(e) => panic!("request log lock poisoned: {e}"),
        }
    }

    pub fn request_count(&self) -> usize {
        self.requests().len()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: &ApiRequest) -> Result<serde_json::Value, TransportError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }
        let next = match self.responses.lock() {
            Ok(mut responses) => responses.pop_front(),
            Err(e) => panic!("response queue lock poisoned: {e}"),
        };
        next.expect("mock transport has no scripted response left")
    }
}
