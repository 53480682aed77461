//! # seva-http
//!
//! Fetch-style HTTP client with interceptor chains and a registry of named
//! clients.
//!
//! ## Client
//!
//! ```ignore
//! use seva_http::{HttpClient, HttpClientConfig};
//!
//! let client = HttpClient::with_reqwest(HttpClientConfig::new("https://api.example.com"));
//!
//! // POST with a JSON body; Content-Type is forced to application/json
//! let reply = client.post("/properties", serde_json::json!({"ward": 4}), None).await?;
//!
//! // Non-2xx statuses are not errors, they are reported in the envelope
//! println!("{:?} {}", reply.status(), reply.data());
//! ```
//!
//! ## Interceptors
//!
//! ```ignore
//! use seva_http::{request_fn, RequestOverride};
//! use seva_http::interceptors::UnwrapData;
//!
//! let id = client.use_request_interceptor(request_fn(|url, config| {
//!     let mut config = config.clone();
//!     config.headers.insert("Authorization".into(), "Bearer token".into());
//!     Ok(Some(RequestOverride::config(config)))
//! }));
//! client.use_response_interceptor(UnwrapData);
//! client.eject_request_interceptor(id);
//! ```
//!
//! ## Registry
//!
//! ```ignore
//! use seva_http::{HttpClientConfig, HttpProvider};
//!
//! let provider = HttpProvider::default();
//! let svc = provider.create("svc", HttpClientConfig::new("http://h:1"));
//! // Same instance; the second config is ignored
//! let again = provider.create("svc", HttpClientConfig::new("http://other"));
//! ```

pub mod client;
pub mod error;
pub mod interceptor;
pub mod interceptors;
pub mod provider;
pub mod transport;
pub mod types;

pub use client::{HttpClient, HttpClientConfig};
pub use error::{Error, Result};
pub use interceptor::{
    request_fn, response_fn, InterceptorId, InterceptorManager, RequestInterceptor,
    ResponseInterceptor,
};
pub use provider::HttpProvider;
pub use transport::{RawResponse, ReqwestTransport, Transport, TransportError};
pub use types::{
    Body, Envelope, Form, Headers, Method, Part, PartValue, Reply, RequestBody, RequestConfig,
    RequestOverride, ResponseMeta,
};
