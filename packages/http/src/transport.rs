//! Network transport abstraction.
//!
//! `HttpClient` never talks to the network directly; it hands the final
//! `(url, config)` pair to a [`Transport`]. Production code uses
//! [`ReqwestTransport`], tests use [`mock::MockTransport`].

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;
use tracing::{debug, trace};
use url::Url;

use crate::types::{Body, Form, PartValue, RequestConfig, ResponseMeta};

/// Failure to complete an exchange.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// DNS, refused connection, TLS or transport timeout.
    #[error("connection failed: {0}")]
    Connect(String),

    /// The request could not be built.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

/// A response as received from the wire, body not yet interpreted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawResponse {
    pub meta: ResponseMeta,
    pub body: Vec<u8>,
}

/// Performs a single HTTP exchange.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(
        &self,
        url: &str,
        config: &RequestConfig,
    ) -> Result<RawResponse, TransportError>;
}

/// Production transport using reqwest.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an already configured reqwest client.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// Create a transport whose every exchange is bounded by `timeout`.
    pub fn with_timeout(timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;

        Ok(Self { client })
    }

    fn header_map(config: &RequestConfig) -> Result<HeaderMap, TransportError> {
        let mut headers = HeaderMap::new();
        for (name, value) in &config.headers {
            let header_name = HeaderName::try_from(name.as_str())
                .map_err(|e| TransportError::InvalidRequest(format!("header {name}: {e}")))?;
            let header_value = HeaderValue::try_from(value.as_str())
                .map_err(|e| TransportError::InvalidRequest(format!("header {name}: {e}")))?;
            if headers.insert(header_name, header_value).is_some() {
                trace!(header = %name, "duplicate header name, earlier value replaced");
            }
        }
        Ok(headers)
    }

    fn multipart(form: &Form) -> Result<reqwest::multipart::Form, TransportError> {
        let mut multipart = reqwest::multipart::Form::new();
        for part in &form.parts {
            multipart = match &part.value {
                PartValue::Text(text) => multipart.text(part.name.clone(), text.clone()),
                PartValue::File {
                    bytes,
                    file_name,
                    mime,
                } => {
                    let mut file = reqwest::multipart::Part::bytes(bytes.clone());
                    if let Some(file_name) = file_name {
                        file = file.file_name(file_name.clone());
                    }
                    if let Some(mime) = mime {
                        file = file
                            .mime_str(mime)
                            .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;
                    }
                    multipart.part(part.name.clone(), file)
                }
            };
        }
        Ok(multipart)
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(
        &self,
        url: &str,
        config: &RequestConfig,
    ) -> Result<RawResponse, TransportError> {
        let parsed = Url::parse(url)
            .map_err(|e| TransportError::InvalidRequest(format!("url {url:?}: {e}")))?;
        let method: http::Method = config.method.into();

        let mut headers = Self::header_map(config)?;
        if matches!(config.body, Some(Body::Multipart(_))) {
            // reqwest sets the boundary-carrying value itself
            headers.remove(header::CONTENT_TYPE);
        }

        let mut req_builder = self.client.request(method, parsed).headers(headers);

        if let Some(timeout) = config.timeout {
            req_builder = req_builder.timeout(timeout);
        }

        req_builder = match &config.body {
            Some(Body::Text(text)) => req_builder.body(text.clone()),
            Some(Body::Bytes(bytes)) => req_builder.body(bytes.clone()),
            Some(Body::Multipart(form)) => req_builder.multipart(Self::multipart(form)?),
            None => req_builder,
        };

        let response = req_builder
            .send()
            .await
            .map_err(|e| TransportError::Connect(e.to_string()))?;

        let status = response.status();
        let mut headers = HashMap::new();
        for (name, value) in response.headers() {
            if let Ok(v) = value.to_str() {
                headers.insert(name.to_string(), v.to_string());
            }
        }

        let meta = ResponseMeta {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or("Unknown").to_string(),
            url: response.url().to_string(),
            headers,
        };

        // An unreadable body is treated like an empty one.
        let body = match response.bytes().await {
            Ok(bytes) => bytes.to_vec(),
            Err(e) => {
                debug!(url, error = %e, "failed to read response body");
                Vec::new()
            }
        };

        Ok(RawResponse { meta, body })
    }
}

/// Mock transport for testing.
///
/// Returns predefined responses keyed by full URL and records every request.
#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

    /// A request as seen by the mock.
    #[derive(Debug, Clone, PartialEq)]
    pub struct RecordedRequest {
        pub url: String,
        pub config: RequestConfig,
    }

    #[derive(Default)]
    struct State {
        responses: HashMap<String, RawResponse>,
        default_response: Option<RawResponse>,
        failure: Option<String>,
        recorded: Vec<RecordedRequest>,
    }

    /// A mock transport that returns predefined responses.
    #[derive(Clone, Default)]
    pub struct MockTransport {
        state: Arc<Mutex<State>>,
    }

    impl MockTransport {
        pub fn new() -> Self {
            Self::default()
        }

        fn state(&self) -> MutexGuard<'_, State> {
            self.state.lock().unwrap_or_else(PoisonError::into_inner)
        }

        /// Add a response for a specific URL.
        pub fn with_response(self, url: impl Into<String>, response: RawResponse) -> Self {
            self.state().responses.insert(url.into(), response);
            self
        }

        /// Set a default response when no URL matches.
        pub fn with_default_response(self, response: RawResponse) -> Self {
            self.state().default_response = Some(response);
            self
        }

        /// Fail every request as if the connection could not be made.
        pub fn fail_with(self, message: impl Into<String>) -> Self {
            self.state().failure = Some(message.into());
            self
        }

        pub fn recorded_requests(&self) -> Vec<RecordedRequest> {
            self.state().recorded.clone()
        }

        pub fn last_request(&self) -> Option<RecordedRequest> {
            self.state().recorded.last().cloned()
        }

        pub fn clear_recorded(&self) {
            self.state().recorded.clear();
        }

        /// JSON response with `Content-Type: application/json`.
        pub fn json_response(status: u16, body: serde_json::Value) -> RawResponse {
            Self::response(status, "application/json", body.to_string().into_bytes())
        }

        pub fn text_response(status: u16, body: &str) -> RawResponse {
            Self::response(status, "text/plain; charset=utf-8", body.as_bytes().to_vec())
        }

        pub fn empty_response(status: u16) -> RawResponse {
            RawResponse {
                meta: ResponseMeta {
                    status,
                    status_text: status_text(status),
                    ..Default::default()
                },
                body: Vec::new(),
            }
        }

        pub fn response(status: u16, content_type: &str, body: Vec<u8>) -> RawResponse {
            RawResponse {
                meta: ResponseMeta {
                    status,
                    status_text: status_text(status),
                    url: String::new(),
                    headers: HashMap::from([(
                        "content-type".to_string(),
                        content_type.to_string(),
                    )]),
                },
                body,
            }
        }

        pub fn not_found() -> RawResponse {
            Self::json_response(404, serde_json::json!({"error": "Not Found"}))
        }
    }

    fn status_text(status: u16) -> String {
        http::StatusCode::from_u16(status)
            .ok()
            .and_then(|s| s.canonical_reason())
            .unwrap_or("Unknown")
            .to_string()
    }

    #[async_trait]
    impl Transport for MockTransport {
        async fn send(
            &self,
            url: &str,
            config: &RequestConfig,
        ) -> Result<RawResponse, TransportError> {
            let mut state = self.state();
            state.recorded.push(RecordedRequest {
                url: url.to_string(),
                config: config.clone(),
            });

            if let Some(message) = &state.failure {
                return Err(TransportError::Connect(message.clone()));
            }

            let mut response = state
                .responses
                .get(url)
                .or(state.default_response.as_ref())
                .cloned()
                .unwrap_or_else(Self::not_found);
            response.meta.url = url.to_string();
            Ok(response)
        }
    }
}
