use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use crate::error::Result;

/// Header map. Keys are compared exactly as written; nothing is normalized.
pub type Headers = HashMap<String, String>;

pub const CONTENT_TYPE: &str = "Content-Type";
pub const APPLICATION_JSON: &str = "application/json";

/// HTTP method for requests
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    #[default]
    GET,
    POST,
    PUT,
    PATCH,
    DELETE,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::GET => "GET",
            Method::POST => "POST",
            Method::PUT => "PUT",
            Method::PATCH => "PATCH",
            Method::DELETE => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Method> for http::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::GET => http::Method::GET,
            Method::POST => http::Method::POST,
            Method::PUT => http::Method::PUT,
            Method::PATCH => http::Method::PATCH,
            Method::DELETE => http::Method::DELETE,
        }
    }
}

/// One field of a multipart form.
#[derive(Debug, Clone, PartialEq)]
pub struct Part {
    pub name: String,
    pub value: PartValue,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PartValue {
    Text(String),
    File {
        bytes: Vec<u8>,
        file_name: Option<String>,
        mime: Option<String>,
    },
}

/// Multipart body description.
///
/// Encoding (boundary, part headers) is left to the transport.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Form {
    pub parts: Vec<Part>,
}

impl Form {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parts.push(Part {
            name: name.into(),
            value: PartValue::Text(value.into()),
        });
        self
    }

    pub fn file(
        mut self,
        name: impl Into<String>,
        bytes: Vec<u8>,
        file_name: Option<String>,
        mime: Option<String>,
    ) -> Self {
        self.parts.push(Part {
            name: name.into(),
            value: PartValue::File {
                bytes,
                file_name,
                mime,
            },
        });
        self
    }
}

/// Request body as supplied by the caller.
///
/// The variant decides header negotiation: `Json` forces
/// `Content-Type: application/json` and is serialized to text, `Multipart`
/// strips `Content-Type` so the transport can add its boundary, `Raw` and
/// `Text` are sent as-is.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Json(Value),
    Multipart(Form),
    Raw {
        bytes: Vec<u8>,
        content_type: Option<String>,
    },
    Text(String),
}

impl RequestBody {
    /// Serialize any value into a `Json` body.
    pub fn json<T: Serialize>(value: &T) -> Result<Self> {
        Ok(RequestBody::Json(serde_json::to_value(value)?))
    }

    pub fn raw(bytes: Vec<u8>, content_type: Option<String>) -> Self {
        RequestBody::Raw {
            bytes,
            content_type,
        }
    }

    /// Turn the caller's body into the payload carried by the request config.
    pub(crate) fn into_body(self) -> Result<Body> {
        Ok(match self {
            RequestBody::Json(value) => Body::Text(serde_json::to_string(&value)?),
            RequestBody::Multipart(form) => Body::Multipart(form),
            RequestBody::Raw { bytes, .. } => Body::Bytes(bytes),
            RequestBody::Text(text) => Body::Text(text),
        })
    }
}

impl From<Value> for RequestBody {
    fn from(value: Value) -> Self {
        RequestBody::Json(value)
    }
}

impl From<Form> for RequestBody {
    fn from(form: Form) -> Self {
        RequestBody::Multipart(form)
    }
}

impl From<String> for RequestBody {
    fn from(text: String) -> Self {
        RequestBody::Text(text)
    }
}

impl From<&str> for RequestBody {
    fn from(text: &str) -> Self {
        RequestBody::Text(text.to_string())
    }
}

/// Serialized payload handed to the transport.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Text(String),
    Bytes(Vec<u8>),
    Multipart(Form),
}

impl Body {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Body::Text(text) => Some(text.as_str()),
            _ => None,
        }
    }

    /// Parse a text payload back into JSON.
    pub fn as_json(&self) -> Option<Value> {
        self.as_text()
            .and_then(|text| serde_json::from_str(text).ok())
    }
}

/// The outgoing request descriptor passed through request interceptors.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestConfig {
    pub method: Method,
    pub headers: Headers,
    pub body: Option<Body>,
    /// Per-request transport timeout. Never set by the client itself.
    pub timeout: Option<Duration>,
}

impl RequestConfig {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }
}

/// Partial replacement returned by a request interceptor.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestOverride {
    pub url: Option<String>,
    pub config: Option<RequestConfig>,
}

impl RequestOverride {
    pub fn url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            config: None,
        }
    }

    pub fn config(config: RequestConfig) -> Self {
        Self {
            url: None,
            config: Some(config),
        }
    }
}

/// Metadata of a received response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseMeta {
    /// HTTP status code
    pub status: u16,

    /// Status text (e.g., "OK", "Not Found")
    pub status_text: String,

    /// Final URL of the exchange
    pub url: String,

    /// Response headers
    pub headers: HashMap<String, String>,
}

impl ResponseMeta {
    /// Look up a response header, ignoring ASCII case.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Check if the response status indicates success (2xx)
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Check if the response status indicates a client error (4xx)
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status)
    }

    /// Check if the response status indicates a server error (5xx)
    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.status)
    }
}

/// Default result of a request: status, parsed data and response metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub status: u16,
    pub data: Value,
    pub raw: ResponseMeta,
}

/// What `HttpClient::request` resolves to.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// No response interceptor substituted a value.
    Envelope(Envelope),
    /// The value returned by the first response interceptor that produced one.
    Intercepted(Value),
}

impl Reply {
    /// HTTP status, known only for the default envelope.
    pub fn status(&self) -> Option<u16> {
        match self {
            Reply::Envelope(envelope) => Some(envelope.status),
            Reply::Intercepted(_) => None,
        }
    }

    pub fn envelope(&self) -> Option<&Envelope> {
        match self {
            Reply::Envelope(envelope) => Some(envelope),
            Reply::Intercepted(_) => None,
        }
    }

    pub fn is_intercepted(&self) -> bool {
        matches!(self, Reply::Intercepted(_))
    }

    /// The envelope's data, or the substituted value.
    pub fn data(&self) -> &Value {
        match self {
            Reply::Envelope(envelope) => &envelope.data,
            Reply::Intercepted(value) => value,
        }
    }

    pub fn into_data(self) -> Value {
        match self {
            Reply::Envelope(envelope) => envelope.data,
            Reply::Intercepted(value) => value,
        }
    }

    /// Deserialize `into_data()` into a specific type
    pub fn json<T: DeserializeOwned>(self) -> Result<T> {
        Ok(serde_json::from_value(self.into_data())?)
    }
}
