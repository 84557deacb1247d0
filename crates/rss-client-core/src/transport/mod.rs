//! Server transport
//!
//! The engine talks to each committee member over an opaque JSON
//! request/response channel. The [`ServerTransport`] trait captures that
//! capability set (`get`, `post`); [`Endpoint`] is the tagged variant the
//! engine dispatches through, covering remote URLs and the in-process mock
//! with the same interface.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

pub use async_trait::async_trait;

use crate::error::Result;

pub mod http;
pub mod mock;

pub use http::HttpEndpoint;
pub use mock::{Fault, MockServer};

/// JSON request/response capability of one server endpoint
#[async_trait]
pub trait ServerTransport: Send + Sync {
    /// Issue a GET; the path may carry a query string
    async fn get(&self, path: &str) -> Result<Value>;

    /// Issue a POST with a JSON body
    async fn post(&self, path: &str, body: Value) -> Result<Value>;
}

/// One committee member's endpoint: remote URL or in-process mock
#[derive(Clone)]
pub enum Endpoint {
    /// Remote server reached over HTTP
    Http(HttpEndpoint),
    /// In-process mock server
    Mock(Arc<MockServer>),
}

impl Endpoint {
    /// Endpoint for a remote server URL
    pub fn http(url: impl Into<String>) -> Self {
        Endpoint::Http(HttpEndpoint::new(url))
    }

    /// Endpoint wrapping an in-process mock server
    pub fn mock(server: Arc<MockServer>) -> Self {
        Endpoint::Mock(server)
    }

    /// Dispatch a GET to the underlying transport
    pub async fn get(&self, path: &str) -> Result<Value> {
        match self {
            Endpoint::Http(endpoint) => endpoint.get(path).await,
            Endpoint::Mock(server) => server.get(path).await,
        }
    }

    /// Dispatch a POST to the underlying transport
    pub async fn post(&self, path: &str, body: Value) -> Result<Value> {
        match self {
            Endpoint::Http(endpoint) => endpoint.post(path, body).await,
            Endpoint::Mock(server) => server.post(path, body).await,
        }
    }
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Http(endpoint) => f.debug_tuple("Http").field(&endpoint.base_url()).finish(),
            Endpoint::Mock(_) => f.debug_tuple("Mock").finish(),
        }
    }
}
