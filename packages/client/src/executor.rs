//! HTTP execution abstraction for testing.
//!
//! The client talks to the network only through [`HttpExecutor`], so tests
//! can script responses and transport failures without a live server.

use std::time::Duration;

use reqwest::blocking::Client;

use crate::error::Result;
use crate::types::{HttpRequest, HttpResponse};

/// Why an executor produced no response.
#[derive(thiserror::Error, Debug)]
pub enum ExecuteError {
    /// The host could not be reached or stopped answering: connection
    /// refused or reset, DNS failure, timeout.
    #[error("{0}")]
    Unreachable(String),

    /// The request failed for a reason unrelated to the host's health,
    /// such as a malformed request or an unreadable body.
    #[error(transparent)]
    Request(reqwest::Error),
}

impl From<reqwest::Error> for ExecuteError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() || err.is_request() {
            ExecuteError::Unreachable(err.to_string())
        } else {
            ExecuteError::Request(err)
        }
    }
}

/// Trait for executing HTTP requests.
pub trait HttpExecutor: Send + Sync {
    /// Execute an HTTP request and return the response.
    ///
    /// Non-2xx statuses are `Ok`.
    fn execute(&self, request: &HttpRequest) -> std::result::Result<HttpResponse, ExecuteError>;
}

/// Production HTTP executor using reqwest.
pub struct ReqwestExecutor {
    client: Client,
}

impl ReqwestExecutor {
    /// Create an executor with reqwest's default settings.
    pub fn new() -> Result<Self> {
        let client = Client::builder().build()?;
        Ok(Self { client })
    }

    /// Create an executor that gives up on requests after `timeout`.
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

impl HttpExecutor for ReqwestExecutor {
    fn execute(&self, request: &HttpRequest) -> std::result::Result<HttpResponse, ExecuteError> {
        let method: http::Method = request.method.into();

        let mut req_builder = self.client.request(method, &request.url);

        // invalid header names or values surface as a builder error on send
        for (name, value) in &request.headers {
            req_builder = req_builder.header(name.as_str(), value.as_str());
        }

        if let Some(body) = &request.body {
            req_builder = req_builder.body(body.clone());
        }

        let response = req_builder.send()?;
        let status = response.status().as_u16();
        let body = response.text()?;

        Ok(HttpResponse { status, body })
    }
}
