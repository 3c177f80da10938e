//! Request transport and bearer-header injection.
//!
//! The cache layer never talks to `reqwest` directly; it hands an
//! [`ApiRequest`] to a [`Transport`]. [`HttpTransport`] is the real
//! implementation. Tests substitute their own.

#[cfg(test)]
pub(crate) mod mock;

use async_trait::async_trait;
use reqwest::header::{HeaderValue, AUTHORIZATION};
use reqwest::Client;
use serde_json::Value;
use std::fmt;

use crate::config::ApiConfig;
use crate::error::{ErrorBody, TransportError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Patch,
}

impl Method {
    fn as_reqwest(&self) -> reqwest::Method {
        match self {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Patch => reqwest::Method::PATCH,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Patch => "PATCH",
        })
    }
}

/// A backend request, path relative to the configured base URL.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
    /// Bearer token; never blank when `Some`.
    pub bearer: Option<String>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            bearer: None,
        }
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Attach a bearer token. Absent or blank tokens leave the request
    /// without one.
    pub fn with_bearer(mut self, token: Option<String>) -> Self {
        self.bearer = token.filter(|t| !t.trim().is_empty());
        self
    }

    /// Value of the `Authorization` header, if one should be sent.
    pub fn authorization(&self) -> Option<String> {
        self.bearer.as_ref().map(|t| format!("Bearer {}", t.trim()))
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a request and return the decoded JSON body of a success response.
    async fn send(&self, request: ApiRequest) -> Result<Value, TransportError>;
}

/// `reqwest`-backed transport.
pub struct HttpTransport {
    base_url: String,
    client: Client,
}

impl HttpTransport {
    pub fn new(config: &ApiConfig) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| TransportError::Network {
                path: config.base_url.clone(),
                message: format!("failed to create HTTP client: {}", e),
            })?;
        Ok(Self::with_client(&config.base_url, client))
    }

    /// Use a custom HTTP client (for connection pool reuse or testing).
    pub fn with_client(base_url: &str, client: Client) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Build the outgoing request without sending it.
    pub fn prepare(&self, request: &ApiRequest) -> Result<reqwest::Request, TransportError> {
        let mut builder = self
            .client
            .request(request.method.as_reqwest(), self.url(&request.path));

        if let Some(value) = request.authorization() {
            match HeaderValue::from_str(&value) {
                Ok(header) => builder = builder.header(AUTHORIZATION, header),
                Err(_) => {
                    tracing::warn!(path = %request.path, "Token is not a valid header value, sending without Authorization");
                }
            }
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        builder.build().map_err(|e| TransportError::Network {
            path: request.path.clone(),
            message: e.to_string(),
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: ApiRequest) -> Result<Value, TransportError> {
        let prepared = self.prepare(&request)?;
        tracing::debug!(method = %request.method, path = %request.path, "Sending request");

        let response = self
            .client
            .execute(prepared)
            .await
            .map_err(|e| TransportError::Network {
                path: request.path.clone(),
                message: e.to_string(),
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| TransportError::Network {
            path: request.path.clone(),
            message: e.to_string(),
        })?;

        if !status.is_success() {
            tracing::debug!(path = %request.path, status = status.as_u16(), "Request rejected");
            return Err(TransportError::Status {
                path: request.path,
                status: status.as_u16(),
                message: ErrorBody::message_from(&body),
            });
        }

        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&body).map_err(|e| TransportError::Decode {
            path: request.path,
            message: e.to_string(),
        })
    }
}
