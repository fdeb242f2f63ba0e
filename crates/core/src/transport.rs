//! HTTP transport seam.
//!
//! [`Transport`] is the single point where the client touches the network. The production
//! implementation is [`HttpTransport`] (reqwest); tests substitute a scripted fake.

use crate::constants::{AUTH_COOKIE_NAME, REQUEST_ID_HEADER};
use crate::{ClinicError, ClinicResult};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE, COOKIE};
use reqwest::Url;
use serde_json::Value;
use uuid::Uuid;

/// HTTP verbs used by the clinic API.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }

    fn to_reqwest(self) -> reqwest::Method {
        match self {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Patch => reqwest::Method::PATCH,
            HttpMethod::Delete => reqwest::Method::DELETE,
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One logical API call, relative to the configured base URL.
#[derive(Clone, Debug)]
pub struct ApiRequest {
    pub method: HttpMethod,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
    pub bearer: Option<String>,
    pub request_id: Uuid,
}

impl ApiRequest {
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            bearer: None,
            request_id: Uuid::new_v4(),
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, path)
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn params(mut self, pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        self.query.extend(pairs);
        self
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn bearer(mut self, token: Option<String>) -> Self {
        self.bearer = token;
        self
    }

    /// Value of the first query parameter named `key`.
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// A response the transport accepted (2xx).
#[derive(Clone, Debug)]
pub struct RawResponse {
    pub status: u16,
    pub body: Option<Value>,
}

/// A failed call: either no response at all, or a non-2xx response.
#[derive(Clone, Debug, thiserror::Error)]
#[error("{message}")]
pub struct TransportError {
    pub status: Option<u16>,
    pub message: String,
    pub body: Option<Value>,
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: ApiRequest) -> Result<RawResponse, TransportError>;
}

/// reqwest-backed transport.
///
/// Every request carries `Content-Type` and `Accept: application/json`. When a token is
/// attached it is sent both as a bearer token and as the `AUTH_TOKEN` cookie.
#[derive(Clone, Debug)]
pub struct HttpTransport {
    base_url: Url,
    http: reqwest::Client,
}

impl HttpTransport {
    /// # Errors
    ///
    /// Returns [`ClinicError::HttpClient`] if the underlying client cannot be constructed.
    pub fn new(base_url: Url) -> ClinicResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(ClinicError::HttpClient)?;

        Ok(Self { base_url, http })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: ApiRequest) -> Result<RawResponse, TransportError> {
        let url = self
            .base_url
            .join(request.path.trim_start_matches('/'))
            .map_err(|e| TransportError {
                status: None,
                message: format!("invalid request path '{}': {e}", request.path),
                body: None,
            })?;

        let mut builder = self
            .http
            .request(request.method.to_reqwest(), url)
            .header(REQUEST_ID_HEADER, request.request_id.to_string());
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(token) = &request.bearer {
            builder = builder
                .bearer_auth(token)
                .header(COOKIE, format!("{AUTH_COOKIE_NAME}={token}"));
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| TransportError {
            status: e.status().map(|s| s.as_u16()),
            message: e.to_string(),
            body: None,
        })?;

        let status = response.status();
        let bytes = response.bytes().await.map_err(|e| TransportError {
            status: Some(status.as_u16()),
            message: e.to_string(),
            body: None,
        })?;
        let body = if bytes.is_empty() {
            None
        } else {
            serde_json::from_slice::<Value>(&bytes).ok()
        };

        if status.is_success() {
            Ok(RawResponse {
                status: status.as_u16(),
                body,
            })
        } else {
            Err(TransportError {
                status: Some(status.as_u16()),
                message: format!("Request failed with status code {}", status.as_u16()),
                body,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_collects_query_and_body() {
        let request = ApiRequest::get("services/search")
            .param("name", "xray")
            .params([("page".to_string(), "0".to_string())])
            .json(serde_json::json!({ "a": 1 }));

        assert_eq!(request.method, HttpMethod::Get);
        assert_eq!(request.query_value("name"), Some("xray"));
        assert_eq!(request.query_value("page"), Some("0"));
        assert_eq!(request.query_value("size"), None);
        assert!(request.body.is_some());
    }

    #[test]
    fn requests_get_distinct_ids() {
        let a = ApiRequest::get("patients");
        let b = ApiRequest::get("patients");
        assert_ne!(a.request_id, b.request_id);
    }

    #[tokio::test]
    async fn unreachable_server_is_transport_error() {
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let base = Url::parse(&format!("http://127.0.0.1:{port}/api/")).unwrap();
        let transport = HttpTransport::new(base).expect("client builds");
        let err = transport
            .send(ApiRequest::get("patients"))
            .await
            .expect_err("connection refused");
        assert!(err.status.is_none());
        assert!(!err.message.is_empty());
    }
}
