use async_trait::async_trait;
use log::{debug, warn};
use reqwest::{Client, Method, header};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

pub const DEFAULT_PRIMARY_URL: &str = "http://localhost:5000";
pub const DEFAULT_SECONDARY_URL: &str = "http://127.0.0.1:5000";

/// The two backend base URLs, tried in order on every call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub primary: String,
    pub secondary: String,
}

impl Endpoints {
    pub fn new(primary: &str, secondary: &str) -> Self {
        Self {
            primary: primary.trim_end_matches('/').to_string(),
            secondary: secondary.trim_end_matches('/').to_string(),
        }
    }

    fn iter(&self) -> impl Iterator<Item = &str> {
        [self.primary.as_str(), self.secondary.as_str()].into_iter()
    }
}

impl Default for Endpoints {
    fn default() -> Self {
        Self::new(DEFAULT_PRIMARY_URL, DEFAULT_SECONDARY_URL)
    }
}

/// Outbound request options, forwarded untouched to whichever endpoint
/// answers.
#[derive(Debug, Clone)]
pub struct ProxyRequest {
    pub method: Method,
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl ProxyRequest {
    pub fn new(method: Method) -> Self {
        Self {
            method,
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn get() -> Self {
        Self::new(Method::GET)
    }

    pub fn post(body: Value) -> Self {
        Self::new(Method::POST).with_body(body)
    }

    pub fn put(body: Value) -> Self {
        Self::new(Method::PUT).with_body(body)
    }

    pub fn delete() -> Self {
        Self::new(Method::DELETE)
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn with_bearer(self, token: &str) -> Self {
        self.with_header(header::AUTHORIZATION.as_str(), &format!("Bearer {token}"))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProxyResponse {
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    /// Parsed JSON body. Empty bodies are `null`, non-JSON text is kept as a
    /// JSON string.
    pub body: Value,
}

impl ProxyResponse {
    pub fn new(status: u16, body: Value) -> Self {
        Self {
            status,
            headers: BTreeMap::new(),
            body,
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Connection-level failure: no status line came back from `url`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("request to {url} failed: {message}")]
pub struct TransportError {
    pub url: String,
    pub message: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProxyError {
    #[error("backend unavailable, all endpoints failed: {}", Attempts(.attempts))]
    BackendUnavailable { attempts: Vec<TransportError> },
}

struct Attempts<'a>(&'a [TransportError]);

impl fmt::Display for Attempts<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self
            .0
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ");
        write!(f, "{joined}")
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Any HTTP status is a response. Only failures to obtain one are errors.
    async fn send(&self, url: &str, request: &ProxyRequest) -> Result<ProxyResponse, TransportError>;
}

pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = Client::builder().build()?;
        Ok(Self { client })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

fn parse_body(bytes: &[u8]) -> Value {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Value::Null;
    }
    serde_json::from_slice(bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned()))
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, url: &str, request: &ProxyRequest) -> Result<ProxyResponse, TransportError> {
        let transport_error = |e: reqwest::Error| TransportError {
            url: url.to_string(),
            message: e.to_string(),
        };

        let mut builder = self.client.request(request.method.clone(), url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(transport_error)?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        // The backend has seen the request once a status arrived.
        let body = match response.bytes().await {
            Ok(bytes) => parse_body(&bytes),
            Err(e) => {
                warn!("{url} answered {status} but the body could not be read: {e}");
                Value::Null
            }
        };

        Ok(ProxyResponse {
            status,
            headers,
            body,
        })
    }
}

fn join_url(base: &str, endpoint: &str) -> String {
    if endpoint.starts_with('/') {
        format!("{base}{endpoint}")
    } else {
        format!("{base}/{endpoint}")
    }
}

/// Forwards requests to the primary endpoint, falling back to the secondary
/// one only when the primary cannot be reached at all. Keeps no state between
/// calls.
///
/// A request is never replayed once an endpoint produced a status line, even
/// if its body was cut short.
pub struct BackendProxy<T: Transport = HttpTransport> {
    transport: T,
    endpoints: Endpoints,
}

impl BackendProxy<HttpTransport> {
    pub fn new(endpoints: Endpoints) -> Result<Self, reqwest::Error> {
        Ok(Self::with_transport(HttpTransport::new()?, endpoints))
    }
}

impl<T: Transport> BackendProxy<T> {
    pub fn with_transport(transport: T, endpoints: Endpoints) -> Self {
        Self {
            transport,
            endpoints,
        }
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    pub async fn request(&self, endpoint: &str, request: &ProxyRequest) -> Result<ProxyResponse, ProxyError> {
        let mut attempts = Vec::new();

        for base in self.endpoints.iter() {
            let url = join_url(base, endpoint);
            debug!("{} {}", request.method, url);

            match self.transport.send(&url, request).await {
                Ok(response) => {
                    debug!("{} {} -> {}", request.method, url, response.status);
                    return Ok(response);
                }
                Err(e) => {
                    warn!("{e}");
                    attempts.push(e);
                }
            }
        }

        Err(ProxyError::BackendUnavailable { attempts })
    }
}
