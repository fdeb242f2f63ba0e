//! Scripted transport for unit tests.

use crate::client::ApiClient;
use crate::session::Session;
use crate::toast::Toaster;
use crate::transport::{ApiRequest, RawResponse, Transport, TransportError};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;

type Outcome = Result<RawResponse, TransportError>;

enum Scripted {
    Ready(Outcome),
    Gated(oneshot::Receiver<Outcome>),
}

/// Replies to requests in the order they are sent, from a queue of scripted outcomes.
#[derive(Default)]
pub(crate) struct ScriptedTransport {
    script: Mutex<VecDeque<Scripted>>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl ScriptedTransport {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Client over this transport with an in-memory session and a fresh toaster.
    pub(crate) fn client(self: &Arc<Self>) -> ApiClient {
        ApiClient::new(self.clone(), Session::in_memory(), Toaster::new())
    }

    pub(crate) fn push_ok(&self, body: Value) {
        self.push(Scripted::Ready(Ok(RawResponse {
            status: 200,
            body: Some(body),
        })));
    }

    pub(crate) fn push_err(&self, status: Option<u16>, message: &str, body: Option<Value>) {
        self.push(Scripted::Ready(Err(TransportError {
            status,
            message: message.to_string(),
            body,
        })));
    }

    /// Queue a reply that is held back until the returned sender fires.
    pub(crate) fn push_gated(&self) -> oneshot::Sender<Outcome> {
        let (tx, rx) = oneshot::channel();
        self.push(Scripted::Gated(rx));
        tx
    }

    pub(crate) fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub(crate) fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Yield until `count` requests have reached the transport.
    pub(crate) async fn wait_for_requests(&self, count: usize) {
        while self.request_count() < count {
            tokio::task::yield_now().await;
        }
    }

    fn push(&self, scripted: Scripted) {
        self.script.lock().unwrap().push_back(scripted);
    }
}

pub(crate) fn ok_body(body: Value) -> Outcome {
    Ok(RawResponse {
        status: 200,
        body: Some(body),
    })
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: ApiRequest) -> Outcome {
        self.requests.lock().unwrap().push(request);
        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(Scripted::Ready(outcome)) => outcome,
            Some(Scripted::Gated(rx)) => rx.await.unwrap_or_else(|_| {
                Err(TransportError {
                    status: None,
                    message: "gate dropped".into(),
                    body: None,
                })
            }),
            None => Err(TransportError {
                status: None,
                message: "no scripted response".into(),
                body: None,
            }),
        }
    }
}
