#![allow(dead_code)]

use alumni::api::backend::BackendClient;
use alumni::api::proxy::{
    BackendProxy, Endpoints, ProxyRequest, ProxyResponse, Transport, TransportError,
};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::{Arc, Mutex};

pub const PRIMARY: &str = "http://localhost:5000";
pub const SECONDARY: &str = "http://192.168.1.20:5000";

/// What the fake backend does with a request.
pub enum Outcome {
    Respond(u16, Value),
    Refuse,
}

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub url: String,
    pub method: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
}

type Handler = dyn Fn(&str, &ProxyRequest) -> Outcome + Send + Sync;

pub struct FakeTransport {
    handler: Box<Handler>,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

impl FakeTransport {
    pub fn new<F>(handler: F) -> (Self, Arc<Mutex<Vec<RecordedCall>>>)
    where
        F: Fn(&str, &ProxyRequest) -> Outcome + Send + Sync + 'static,
    {
        let calls = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                handler: Box::new(handler),
                calls: calls.clone(),
            },
            calls,
        )
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn send(&self, url: &str, request: &ProxyRequest) -> Result<ProxyResponse, TransportError> {
        self.calls.lock().unwrap().push(RecordedCall {
            url: url.to_string(),
            method: request.method.to_string(),
            headers: request.headers.clone(),
            body: request.body.clone(),
        });

        match (self.handler)(url, request) {
            Outcome::Respond(status, body) => Ok(ProxyResponse::new(status, body)),
            Outcome::Refuse => Err(TransportError {
                url: url.to_string(),
                message: "connection refused".to_string(),
            }),
        }
    }
}

pub fn proxy<F>(handler: F) -> (BackendProxy<FakeTransport>, Arc<Mutex<Vec<RecordedCall>>>)
where
    F: Fn(&str, &ProxyRequest) -> Outcome + Send + Sync + 'static,
{
    let (transport, calls) = FakeTransport::new(handler);
    (
        BackendProxy::with_transport(transport, Endpoints::new(PRIMARY, SECONDARY)),
        calls,
    )
}

pub fn client<F>(handler: F) -> (BackendClient<FakeTransport>, Arc<Mutex<Vec<RecordedCall>>>)
where
    F: Fn(&str, &ProxyRequest) -> Outcome + Send + Sync + 'static,
{
    let (proxy, calls) = proxy(handler);
    (BackendClient::new(proxy), calls)
}

/// Backend reachable only on the secondary address, answering every path
/// with `status` and `body`.
pub fn secondary_only(
    status: u16,
    body: Value,
) -> impl Fn(&str, &ProxyRequest) -> Outcome + Send + Sync + 'static {
    move |url, _| {
        if url.starts_with(SECONDARY) {
            Outcome::Respond(status, body.clone())
        } else {
            Outcome::Refuse
        }
    }
}

pub fn urls(calls: &Arc<Mutex<Vec<RecordedCall>>>) -> Vec<String> {
    calls.lock().unwrap().iter().map(|c| c.url.clone()).collect()
}
