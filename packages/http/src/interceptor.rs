//! Interceptor traits and the ordered registry that holds them.
//!
//! Request interceptors see the working `(url, config)` pair and may return a
//! partial [`RequestOverride`]. Response interceptors see the parsed data and
//! the response metadata; the first one that returns `Some(value)` decides
//! the result of the request.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;
use crate::types::{RequestConfig, RequestOverride, ResponseMeta};

#[async_trait]
pub trait RequestInterceptor: Send + Sync {
    /// Return `Ok(None)` to leave the request untouched.
    async fn on_request(
        &self,
        url: &str,
        config: &RequestConfig,
    ) -> Result<Option<RequestOverride>>;
}

#[async_trait]
pub trait ResponseInterceptor: Send + Sync {
    /// Return `Ok(Some(value))` to make `value` the result of the request.
    ///
    /// An `Err` propagates out of the request unchanged.
    async fn on_response(&self, data: &Value, meta: &ResponseMeta) -> Result<Option<Value>>;
}

/// Request interceptor backed by a synchronous closure. See [`request_fn`].
pub struct RequestFn<F>(F);

/// Response interceptor backed by a synchronous closure. See [`response_fn`].
pub struct ResponseFn<F>(F);

pub fn request_fn<F>(f: F) -> RequestFn<F>
where
    F: Fn(&str, &RequestConfig) -> Result<Option<RequestOverride>> + Send + Sync,
{
    RequestFn(f)
}

pub fn response_fn<F>(f: F) -> ResponseFn<F>
where
    F: Fn(&Value, &ResponseMeta) -> Result<Option<Value>> + Send + Sync,
{
    ResponseFn(f)
}

#[async_trait]
impl<F> RequestInterceptor for RequestFn<F>
where
    F: Fn(&str, &RequestConfig) -> Result<Option<RequestOverride>> + Send + Sync,
{
    async fn on_request(
        &self,
        url: &str,
        config: &RequestConfig,
    ) -> Result<Option<RequestOverride>> {
        (self.0)(url, config)
    }
}

#[async_trait]
impl<F> ResponseInterceptor for ResponseFn<F>
where
    F: Fn(&Value, &ResponseMeta) -> Result<Option<Value>> + Send + Sync,
{
    async fn on_response(&self, data: &Value, meta: &ResponseMeta) -> Result<Option<Value>> {
        (self.0)(data, meta)
    }
}

/// Handle returned when an interceptor is registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InterceptorId(u64);

impl InterceptorId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for InterceptorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

struct Registry<T: ?Sized> {
    last_id: u64,
    // Ids only grow, so key order is insertion order.
    handlers: BTreeMap<u64, Arc<T>>,
}

/// Ordered set of handlers, each removable by the id it was given.
///
/// Ids are never reused, not even after `clear`.
pub struct InterceptorManager<T: ?Sized> {
    registry: Mutex<Registry<T>>,
}

impl<T: ?Sized> InterceptorManager<T> {
    pub fn new() -> Self {
        Self {
            registry: Mutex::new(Registry {
                last_id: 0,
                handlers: BTreeMap::new(),
            }),
        }
    }

    fn registry(&self) -> MutexGuard<'_, Registry<T>> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a handler and return its id. The same handler may be added twice.
    pub fn add(&self, handler: Arc<T>) -> InterceptorId {
        let mut registry = self.registry();
        registry.last_id += 1;
        let id = registry.last_id;
        registry.handlers.insert(id, handler);
        InterceptorId(id)
    }

    /// Remove a handler. Unknown or already-removed ids are ignored.
    pub fn eject(&self, id: InterceptorId) {
        self.registry().handlers.remove(&id.0);
    }

    /// Snapshot of the current handlers in registration order.
    pub fn list(&self) -> Vec<Arc<T>> {
        self.registry().handlers.values().cloned().collect()
    }

    pub fn clear(&self) {
        self.registry().handlers.clear();
    }

    pub fn len(&self) -> usize {
        self.registry().handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry().handlers.is_empty()
    }

    pub fn contains(&self, id: InterceptorId) -> bool {
        self.registry().handlers.contains_key(&id.0)
    }
}

impl<T: ?Sized> Default for InterceptorManager<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> fmt::Debug for InterceptorManager<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registry = self.registry();
        f.debug_struct("InterceptorManager")
            .field("ids", &registry.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}
