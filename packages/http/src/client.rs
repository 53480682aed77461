//! The HTTP client: base URL, default headers, interceptor chains.
//!
//! Every verb goes through [`HttpClient::request`]:
//!
//! ```text
//! baseURL + path, defaults + per-call headers, body negotiation
//!   -> request interceptors (in order, each awaited)
//!   -> transport
//!   -> body parsing (204 / empty => null, JSON, text)
//!   -> response interceptors (first Some(value) wins)
//!   -> Reply::Envelope { status, data, raw }
//! ```
//!
//! A non-2xx status is not an error here; it is reported in the envelope.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, trace};

use crate::error::Result;
use crate::interceptor::{
    InterceptorId, InterceptorManager, RequestInterceptor, ResponseInterceptor,
};
use crate::interceptors::UnwrapData;
use crate::transport::{RawResponse, ReqwestTransport, Transport};
use crate::types::{
    Envelope, Headers, Method, Reply, RequestBody, RequestConfig, APPLICATION_JSON, CONTENT_TYPE,
};

/// Construction parameters for an [`HttpClient`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HttpClientConfig {
    /// Prefix for every request path
    #[serde(default)]
    pub base_url: String,

    /// Default headers. When absent the client sends
    /// `Content-Type: application/json` by default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<Headers>,
}

impl HttpClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            headers: None,
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .get_or_insert_with(Headers::new)
            .insert(name.into(), value.into());
        self
    }
}

fn default_headers() -> Headers {
    Headers::from([(CONTENT_TYPE.to_string(), APPLICATION_JSON.to_string())])
}

/// A shared, mutable HTTP client.
///
/// All mutators take `&self`, so every holder of an `Arc<HttpClient>` sees
/// base URL, header and interceptor changes made through any other holder.
pub struct HttpClient {
    base_url: RwLock<String>,
    default_headers: RwLock<Headers>,
    request_interceptors: InterceptorManager<dyn RequestInterceptor>,
    response_interceptors: InterceptorManager<dyn ResponseInterceptor>,
    unwrap_interceptor: Mutex<Option<InterceptorId>>,
    transport: Arc<dyn Transport>,
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

impl HttpClient {
    pub fn new(config: HttpClientConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            base_url: RwLock::new(config.base_url),
            default_headers: RwLock::new(config.headers.unwrap_or_else(default_headers)),
            request_interceptors: InterceptorManager::new(),
            response_interceptors: InterceptorManager::new(),
            unwrap_interceptor: Mutex::new(None),
            transport,
        }
    }

    /// Create a client backed by a fresh [`ReqwestTransport`].
    pub fn with_reqwest(config: HttpClientConfig) -> Self {
        Self::new(config, Arc::new(ReqwestTransport::new()))
    }

    pub fn base_url(&self) -> String {
        read(&self.base_url).clone()
    }

    pub fn set_base_url(&self, url: impl Into<String>) {
        *write(&self.base_url) = url.into();
    }

    /// Snapshot of the default headers.
    pub fn default_headers(&self) -> Headers {
        read(&self.default_headers).clone()
    }

    pub fn set_default_header(&self, name: impl Into<String>, value: impl Into<String>) {
        write(&self.default_headers).insert(name.into(), value.into());
    }

    pub fn remove_default_header(&self, name: &str) {
        write(&self.default_headers).remove(name);
    }

    pub fn use_request_interceptor(
        &self,
        interceptor: impl RequestInterceptor + 'static,
    ) -> InterceptorId {
        self.request_interceptors.add(Arc::new(interceptor))
    }

    pub fn eject_request_interceptor(&self, id: InterceptorId) {
        self.request_interceptors.eject(id);
    }

    pub fn use_response_interceptor(
        &self,
        interceptor: impl ResponseInterceptor + 'static,
    ) -> InterceptorId {
        self.response_interceptors.add(Arc::new(interceptor))
    }

    pub fn eject_response_interceptor(&self, id: InterceptorId) {
        self.response_interceptors.eject(id);
        let mut unwrap = self
            .unwrap_interceptor
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if *unwrap == Some(id) {
            *unwrap = None;
        }
    }

    pub fn request_interceptors(&self) -> &InterceptorManager<dyn RequestInterceptor> {
        &self.request_interceptors
    }

    pub fn response_interceptors(&self) -> &InterceptorManager<dyn ResponseInterceptor> {
        &self.response_interceptors
    }

    /// Attach the [`UnwrapData`] response interceptor unless this client
    /// already carries it. Returns the id of the attached interceptor.
    pub fn ensure_unwrap_interceptor(&self) -> InterceptorId {
        let mut unwrap = self
            .unwrap_interceptor
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        match *unwrap {
            Some(id) if self.response_interceptors.contains(id) => id,
            _ => {
                let id = self.response_interceptors.add(Arc::new(UnwrapData));
                *unwrap = Some(id);
                id
            }
        }
    }

    /// Shorthand for GET
    pub async fn get(&self, path: &str, headers: Option<Headers>) -> Result<Reply> {
        self.request(Method::GET, path, None, headers).await
    }

    /// Shorthand for POST.
    ///
    /// There is no implicit body: pass `json!({})` for an empty JSON object,
    /// or call [`request`](Self::request) with `None` to send nothing.
    pub async fn post(
        &self,
        path: &str,
        body: impl Into<RequestBody>,
        headers: Option<Headers>,
    ) -> Result<Reply> {
        self.request(Method::POST, path, Some(body.into()), headers)
            .await
    }

    /// Shorthand for PUT.
    ///
    /// There is no implicit body: pass `json!({})` for an empty JSON object,
    /// or call [`request`](Self::request) with `None` to send nothing.
    pub async fn put(
        &self,
        path: &str,
        body: impl Into<RequestBody>,
        headers: Option<Headers>,
    ) -> Result<Reply> {
        self.request(Method::PUT, path, Some(body.into()), headers)
            .await
    }

    /// Shorthand for PATCH.
    ///
    /// There is no implicit body: pass `json!({})` for an empty JSON object,
    /// or call [`request`](Self::request) with `None` to send nothing.
    pub async fn patch(
        &self,
        path: &str,
        body: impl Into<RequestBody>,
        headers: Option<Headers>,
    ) -> Result<Reply> {
        self.request(Method::PATCH, path, Some(body.into()), headers)
            .await
    }

    /// Shorthand for DELETE
    pub async fn delete(&self, path: &str, headers: Option<Headers>) -> Result<Reply> {
        self.request(Method::DELETE, path, None, headers).await
    }

    /// Run one exchange through the interceptor chains.
    ///
    /// `path` is appended to the base URL verbatim. Transport failures
    /// become [`Error::Connectivity`](crate::Error::Connectivity); errors
    /// returned by interceptors propagate unchanged.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<RequestBody>,
        headers: Option<Headers>,
    ) -> Result<Reply> {
        let mut url = format!("{}{}", self.base_url(), path);
        let mut config = RequestConfig {
            method,
            headers: self.compute_headers(headers.unwrap_or_default(), body.as_ref()),
            body: body.map(RequestBody::into_body).transpose()?,
            timeout: None,
        };

        for interceptor in self.request_interceptors.list() {
            if let Some(modified) = interceptor.on_request(&url, &config).await? {
                if let Some(next_url) = modified.url {
                    url = next_url;
                }
                if let Some(next_config) = modified.config {
                    config = next_config;
                }
            }
        }

        debug!(method = %config.method, %url, "sending request");
        let response = self.transport.send(&url, &config).await.map_err(|e| {
            debug!(%url, error = %e, "transport failed");
            e
        })?;
        debug!(%url, status = response.meta.status, "received response");

        let data = parse_data(&response);

        for interceptor in self.response_interceptors.list() {
            if let Some(value) = interceptor.on_response(&data, &response.meta).await? {
                trace!(%url, "response replaced by interceptor");
                return Ok(Reply::Intercepted(value));
            }
        }

        Ok(Reply::Envelope(Envelope {
            status: response.meta.status,
            data,
            raw: response.meta,
        }))
    }

    /// Defaults overlaid with per-call headers, then adjusted for the body kind.
    fn compute_headers(&self, headers: Headers, body: Option<&RequestBody>) -> Headers {
        let mut computed = self.default_headers();
        computed.extend(headers);

        let forced = match body {
            Some(RequestBody::Multipart(_)) => None,
            Some(RequestBody::Json(_)) => Some(APPLICATION_JSON.to_string()),
            Some(RequestBody::Raw {
                content_type: Some(content_type),
                ..
            }) => Some(content_type.clone()),
            _ => return computed,
        };

        // Names compare case-insensitively on the wire.
        computed.retain(|name, _| !name.eq_ignore_ascii_case(CONTENT_TYPE));
        if let Some(content_type) = forced {
            computed.insert(CONTENT_TYPE.to_string(), content_type);
        }

        computed
    }
}

/// Interpret a response body. Never fails: anything unparseable is `null`.
fn parse_data(response: &RawResponse) -> Value {
    let meta = &response.meta;
    if meta.status == 204 || meta.header("content-length") == Some("0") || response.body.is_empty()
    {
        return Value::Null;
    }

    let content_type = meta.header("content-type").unwrap_or_default();
    if content_type.contains(APPLICATION_JSON) {
        return serde_json::from_slice(&response.body).unwrap_or_else(|e| {
            trace!(error = %e, "response body is not valid JSON");
            Value::Null
        });
    }

    match String::from_utf8(response.body.clone()) {
        Ok(text) => Value::String(text),
        Err(e) => {
            trace!(error = %e, "response body is not valid UTF-8");
            Value::Null
        }
    }
}

impl fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpClient")
            .field("base_url", &*read(&self.base_url))
            .field("default_headers", &*read(&self.default_headers))
            .field("request_interceptors", &self.request_interceptors)
            .field("response_interceptors", &self.response_interceptors)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::interceptor::{request_fn, response_fn, RequestInterceptor};
    use crate::transport::mock::MockTransport;
    use crate::types::{Body, Form, RequestOverride, ResponseMeta};
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::HashMap;
    use std::time::Duration;

    fn client_with(transport: &MockTransport, base_url: &str) -> HttpClient {
        HttpClient::new(
            HttpClientConfig::new(base_url),
            Arc::new(transport.clone()),
        )
    }

    #[tokio::test]
    async fn post_json_sends_serialized_body_and_content_type() {
        let transport =
            MockTransport::new().with_default_response(MockTransport::empty_response(201));
        let client = client_with(&transport, "http://h:1");

        client
            .post("/items", json!({"name": "a"}), None)
            .await
            .unwrap();

        let sent = transport.last_request().unwrap();
        assert_eq!(sent.url, "http://h:1/items");
        assert_eq!(sent.config.method, Method::POST);
        assert_eq!(sent.config.header("Content-Type"), Some("application/json"));
        assert_eq!(
            sent.config.body,
            Some(Body::Text(r#"{"name":"a"}"#.to_string()))
        );
    }

    #[tokio::test]
    async fn path_is_appended_verbatim() {
        let transport = MockTransport::new();
        let client = client_with(&transport, "http://h:1/api/");

        client.get("/users", None).await.unwrap();
        client.get("users", None).await.unwrap();

        let recorded = transport.recorded_requests();
        assert_eq!(recorded[0].url, "http://h:1/api//users");
        assert_eq!(recorded[1].url, "http://h:1/api/users");
    }

    #[tokio::test]
    async fn json_response_yields_default_envelope() {
        let transport = MockTransport::new().with_response(
            "http://h/data",
            MockTransport::json_response(200, json!({"a": 1})),
        );
        let client = client_with(&transport, "http://h");

        let reply = client.get("/data", None).await.unwrap();
        let envelope = reply.envelope().unwrap();
        assert_eq!(envelope.status, 200);
        assert_eq!(envelope.data, json!({"a": 1}));
        assert_eq!(envelope.raw.status, 200);
        assert_eq!(envelope.raw.url, "http://h/data");
    }

    #[tokio::test]
    async fn no_content_yields_null_data() {
        let transport = MockTransport::new()
            .with_response("http://h/gone", MockTransport::empty_response(204));
        let client = client_with(&transport, "http://h");

        let reply = client.delete("/gone", None).await.unwrap();
        assert_eq!(reply.status(), Some(204));
        assert_eq!(reply.data(), &Value::Null);
    }

    #[tokio::test]
    async fn malformed_json_degrades_to_null() {
        let transport = MockTransport::new().with_default_response(MockTransport::response(
            200,
            "application/json; charset=utf-8",
            b"{not json".to_vec(),
        ));
        let client = client_with(&transport, "http://h");

        let reply = client.get("/broken", None).await.unwrap();
        assert_eq!(reply.data(), &Value::Null);
    }

    #[tokio::test]
    async fn non_json_body_is_returned_as_text() {
        let transport =
            MockTransport::new().with_default_response(MockTransport::text_response(200, "pong"));
        let client = client_with(&transport, "http://h");

        let reply = client.get("/ping", None).await.unwrap();
        assert_eq!(reply.data(), &json!("pong"));
    }

    #[tokio::test]
    async fn zero_content_length_yields_null() {
        let mut response = MockTransport::text_response(200, "ignored");
        response
            .meta
            .headers
            .insert("Content-Length".to_string(), "0".to_string());
        let transport = MockTransport::new().with_default_response(response);
        let client = client_with(&transport, "http://h");

        let reply = client.get("/x", None).await.unwrap();
        assert_eq!(reply.data(), &Value::Null);
    }

    #[tokio::test]
    async fn error_status_is_not_raised() {
        let transport = MockTransport::new().with_default_response(MockTransport::json_response(
            500,
            json!({"usrMsg": "down"}),
        ));
        let client = client_with(&transport, "http://h");

        let reply = client.get("/x", None).await.unwrap();
        assert_eq!(reply.status(), Some(500));
        assert_eq!(reply.data()["usrMsg"], "down");
    }

    #[tokio::test]
    async fn transport_failure_becomes_connectivity_error() {
        let transport = MockTransport::new().fail_with("connection refused");
        let client = client_with(&transport, "http://h");

        let error = client.get("/x", None).await.unwrap_err();
        assert_eq!(error.status_code(), 0);
        assert_eq!(error.to_string(), crate::error::CONNECTIVITY_MESSAGE);
        assert_eq!(error.internal_message(), Some("connection refused"));
    }

    #[tokio::test]
    async fn multipart_body_drops_content_type() {
        let transport = MockTransport::new();
        let client = client_with(&transport, "http://h");

        let form = Form::new().text("owner", "Asha").file(
            "photo",
            vec![1, 2, 3],
            Some("home.jpg".to_string()),
            Some("image/jpeg".to_string()),
        );
        client.post("/upload", form.clone(), None).await.unwrap();

        let sent = transport.last_request().unwrap();
        assert_eq!(sent.config.header("Content-Type"), None);
        assert_eq!(sent.config.body, Some(Body::Multipart(form)));
    }

    fn content_type_keys(config: &RequestConfig) -> Vec<&str> {
        config
            .headers
            .keys()
            .filter(|name| name.eq_ignore_ascii_case(CONTENT_TYPE))
            .map(String::as_str)
            .collect()
    }

    #[tokio::test]
    async fn json_body_replaces_caller_content_type_in_any_case() {
        let transport = MockTransport::new();
        let client = client_with(&transport, "http://h");

        let headers = HashMap::from([
            ("content-type".to_string(), "text/plain".to_string()),
            ("CONTENT-TYPE".to_string(), "text/html".to_string()),
        ]);
        client
            .post("/items", json!({"name": "a"}), Some(headers))
            .await
            .unwrap();

        let sent = transport.last_request().unwrap();
        assert_eq!(content_type_keys(&sent.config), vec!["Content-Type"]);
        assert_eq!(sent.config.header("Content-Type"), Some("application/json"));
    }

    #[tokio::test]
    async fn multipart_body_strips_caller_content_type_in_any_case() {
        let transport = MockTransport::new();
        let client = HttpClient::new(
            HttpClientConfig::new("http://h").with_header("content-type", "text/plain"),
            Arc::new(transport.clone()),
        );

        let headers = HashMap::from([(
            "Content-type".to_string(),
            "multipart/form-data".to_string(),
        )]);
        let form = Form::new().text("owner", "Asha");
        client.post("/upload", form, Some(headers)).await.unwrap();

        let sent = transport.last_request().unwrap();
        assert!(content_type_keys(&sent.config).is_empty());
    }

    #[tokio::test]
    async fn raw_body_content_type_replaces_lowercase_default() {
        let transport = MockTransport::new();
        let client = HttpClient::new(
            HttpClientConfig::new("http://h").with_header("content-type", "text/plain"),
            Arc::new(transport.clone()),
        );

        client
            .put(
                "/blob",
                RequestBody::raw(vec![1], Some("image/png".to_string())),
                None,
            )
            .await
            .unwrap();

        let sent = transport.last_request().unwrap();
        assert_eq!(content_type_keys(&sent.config), vec!["Content-Type"]);
        assert_eq!(sent.config.header("Content-Type"), Some("image/png"));
    }

    #[tokio::test]
    async fn empty_object_and_absent_body_differ() {
        let transport = MockTransport::new();
        let client = client_with(&transport, "http://h");

        client.post("/touch", json!({}), None).await.unwrap();
        client
            .request(Method::POST, "/touch", None, None)
            .await
            .unwrap();

        let recorded = transport.recorded_requests();
        assert_eq!(recorded[0].config.body, Some(Body::Text("{}".to_string())));
        assert_eq!(recorded[1].config.body, None);
        assert_eq!(recorded[1].config.method, Method::POST);
    }

    #[tokio::test]
    async fn raw_and_text_bodies_keep_headers() {
        let transport = MockTransport::new();
        let client = client_with(&transport, "http://h");

        client
            .put(
                "/blob",
                RequestBody::raw(vec![9, 9], Some("image/png".to_string())),
                None,
            )
            .await
            .unwrap();
        client.patch("/note", "plain", None).await.unwrap();

        let recorded = transport.recorded_requests();
        assert_eq!(recorded[0].config.header("Content-Type"), Some("image/png"));
        assert_eq!(recorded[0].config.body, Some(Body::Bytes(vec![9, 9])));
        // Default header untouched for text
        assert_eq!(
            recorded[1].config.header("Content-Type"),
            Some("application/json")
        );
        assert_eq!(recorded[1].config.body, Some(Body::Text("plain".to_string())));
    }

    #[tokio::test]
    async fn per_call_headers_override_defaults() {
        let transport = MockTransport::new();
        let client = HttpClient::new(
            HttpClientConfig::new("http://h").with_header("X-App", "field"),
            Arc::new(transport.clone()),
        );
        client.set_default_header("Authorization", "Bearer one");

        let headers = HashMap::from([("Authorization".to_string(), "Bearer two".to_string())]);
        client.get("/me", Some(headers)).await.unwrap();

        let sent = transport.last_request().unwrap();
        assert_eq!(sent.config.header("Authorization"), Some("Bearer two"));
        assert_eq!(sent.config.header("X-App"), Some("field"));
        // Custom header set replaces the JSON default
        assert_eq!(sent.config.header("Content-Type"), None);
        // Keys are case-sensitive
        assert_eq!(sent.config.header("authorization"), None);
    }

    #[tokio::test]
    async fn default_header_mutation() {
        let client = client_with(&MockTransport::new(), "");
        assert_eq!(
            client.default_headers().get("Content-Type").map(String::as_str),
            Some("application/json")
        );
        client.remove_default_header("Content-Type");
        assert!(client.default_headers().is_empty());
    }

    #[tokio::test]
    async fn base_url_can_be_replaced() {
        let transport = MockTransport::new();
        let client = client_with(&transport, "http://old");
        client.set_base_url("http://new");
        assert_eq!(client.base_url(), "http://new");

        client.get("/x", None).await.unwrap();
        assert_eq!(transport.last_request().unwrap().url, "http://new/x");
    }

    #[tokio::test]
    async fn request_interceptors_fold_in_registration_order() {
        let transport = MockTransport::new();
        let client = client_with(&transport, "http://h");

        client.use_request_interceptor(request_fn(|url, _config| {
            Ok(Some(RequestOverride::url(format!("{url}?step=1"))))
        }));
        client.use_request_interceptor(request_fn(|url, config| {
            let mut config = config.clone();
            config
                .headers
                .insert("X-Seen-Url".to_string(), url.to_string());
            Ok(Some(RequestOverride::config(config)))
        }));
        client.use_request_interceptor(request_fn(|_url, _config| Ok(None)));

        client.get("/items", None).await.unwrap();

        let sent = transport.last_request().unwrap();
        assert_eq!(sent.url, "http://h/items?step=1");
        assert_eq!(
            sent.config.header("X-Seen-Url"),
            Some("http://h/items?step=1")
        );
    }

    struct SlowStamp {
        delay: Duration,
        stamp: &'static str,
    }

    #[async_trait]
    impl RequestInterceptor for SlowStamp {
        async fn on_request(
            &self,
            url: &str,
            _config: &RequestConfig,
        ) -> Result<Option<RequestOverride>> {
            tokio::time::sleep(self.delay).await;
            Ok(Some(RequestOverride::url(format!("{url}/{}", self.stamp))))
        }
    }

    #[tokio::test]
    async fn async_request_interceptors_are_awaited_in_turn() {
        let transport = MockTransport::new();
        let client = client_with(&transport, "http://h");

        client.use_request_interceptor(SlowStamp {
            delay: Duration::from_millis(30),
            stamp: "first",
        });
        client.use_request_interceptor(SlowStamp {
            delay: Duration::from_millis(1),
            stamp: "second",
        });

        client.get("", None).await.unwrap();
        assert_eq!(
            transport.last_request().unwrap().url,
            "http://h/first/second"
        );
    }

    #[tokio::test]
    async fn ejected_request_interceptor_no_longer_runs() {
        let transport = MockTransport::new();
        let client = client_with(&transport, "http://h");

        let id = client.use_request_interceptor(request_fn(|url, _config| {
            Ok(Some(RequestOverride::url(format!("{url}?tagged"))))
        }));
        client.eject_request_interceptor(id);

        client.get("/x", None).await.unwrap();
        assert_eq!(transport.last_request().unwrap().url, "http://h/x");
    }

    #[tokio::test]
    async fn request_interceptor_can_set_timeout() {
        let transport = MockTransport::new();
        let client = client_with(&transport, "http://h");
        client.use_request_interceptor(crate::interceptors::Timeout(Duration::from_secs(10)));

        client.get("/x", None).await.unwrap();
        assert_eq!(
            transport.last_request().unwrap().config.timeout,
            Some(Duration::from_secs(10))
        );
    }

    #[tokio::test]
    async fn failing_request_interceptor_aborts_before_sending() {
        let transport = MockTransport::new();
        let client = client_with(&transport, "http://h");
        client.use_request_interceptor(request_fn(|_url, _config| {
            Err(Error::InvalidRequest {
                message: "not signed in".to_string(),
            })
        }));

        let error = client.get("/x", None).await.unwrap_err();
        assert!(matches!(error, Error::InvalidRequest { .. }));
        assert!(transport.recorded_requests().is_empty());
    }

    #[tokio::test]
    async fn first_defined_response_value_wins() {
        let transport = MockTransport::new().with_default_response(MockTransport::json_response(
            200,
            json!({"data": {"id": 1}}),
        ));
        let client = client_with(&transport, "http://h");

        client.use_response_interceptor(response_fn(|_data, _meta| Ok(None)));
        client.use_response_interceptor(response_fn(|data, _meta| Ok(Some(data["data"].clone()))));
        client.use_response_interceptor(response_fn(|_data, _meta| {
            panic!("interceptor after a substitution must not run")
        }));

        let reply = client.get("/x", None).await.unwrap();
        assert_eq!(reply, Reply::Intercepted(json!({"id": 1})));
    }

    #[tokio::test]
    async fn response_interceptor_sees_metadata() {
        let transport =
            MockTransport::new().with_default_response(MockTransport::empty_response(404));
        let client = client_with(&transport, "http://h");

        client.use_response_interceptor(response_fn(|_data, meta: &ResponseMeta| {
            Ok(Some(json!(meta.status)))
        }));

        let reply = client.get("/x", None).await.unwrap();
        assert_eq!(reply.into_data(), json!(404));
    }

    #[tokio::test]
    async fn response_interceptor_error_propagates() {
        let transport =
            MockTransport::new().with_default_response(MockTransport::empty_response(401));
        let client = client_with(&transport, "http://h");

        client.use_response_interceptor(response_fn(|_data, meta| {
            Err(Error::application(meta.status, None, None, None))
        }));

        let error = client.get("/x", None).await.unwrap_err();
        assert_eq!(error.status_code(), 401);
    }

    #[tokio::test]
    async fn unwrap_interceptor_is_attached_once() {
        let transport = MockTransport::new().with_default_response(MockTransport::json_response(
            200,
            json!({"ok": true}),
        ));
        let client = client_with(&transport, "http://h");

        let first = client.ensure_unwrap_interceptor();
        let second = client.ensure_unwrap_interceptor();
        assert_eq!(first, second);
        assert_eq!(client.response_interceptors().len(), 1);

        let reply = client.get("/x", None).await.unwrap();
        assert_eq!(reply, Reply::Intercepted(json!({"ok": true})));
    }

    #[tokio::test]
    async fn ejecting_unwrap_interceptor_rearms_it() {
        let client = client_with(&MockTransport::new(), "http://h");

        let first = client.ensure_unwrap_interceptor();
        client.eject_response_interceptor(first);
        assert!(client.response_interceptors().is_empty());

        let second = client.ensure_unwrap_interceptor();
        assert_ne!(first, second);
        assert_eq!(client.response_interceptors().len(), 1);
    }

    #[test]
    fn config_deserializes_without_headers() {
        let config: HttpClientConfig =
            serde_json::from_value(json!({"base_url": "http://h:1"})).unwrap();
        assert_eq!(config, HttpClientConfig::new("http://h:1"));
    }
}
