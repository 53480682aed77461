//! Registry of named clients.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::client::{HttpClient, HttpClientConfig};
use crate::transport::{ReqwestTransport, Transport};

/// Holds at most one [`HttpClient`] per logical connection name.
///
/// Every client created here shares the provider's transport. Callers hold
/// `Arc`s; removing a name only unregisters it, existing holders keep a
/// working client.
pub struct HttpProvider {
    transport: Arc<dyn Transport>,
    instances: Mutex<HashMap<String, Arc<HttpClient>>>,
}

impl HttpProvider {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            instances: Mutex::new(HashMap::new()),
        }
    }

    fn instances(&self) -> MutexGuard<'_, HashMap<String, Arc<HttpClient>>> {
        self.instances.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Return the client registered under `name`, creating it from `config`
    /// if absent. `config` is ignored when the name already exists.
    pub fn create(&self, name: &str, config: HttpClientConfig) -> Arc<HttpClient> {
        let mut instances = self.instances();
        if let Some(client) = instances.get(name) {
            return client.clone();
        }

        debug!(name, base_url = %config.base_url, "creating http client");
        let client = Arc::new(HttpClient::new(config, self.transport.clone()));
        instances.insert(name.to_string(), client.clone());
        client
    }

    pub fn get(&self, name: &str) -> Option<Arc<HttpClient>> {
        self.instances().get(name).cloned()
    }

    pub fn remove(&self, name: &str) -> Option<Arc<HttpClient>> {
        self.instances().remove(name)
    }

    pub fn clear(&self) {
        self.instances().clear();
    }

    pub fn len(&self) -> usize {
        self.instances().len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances().is_empty()
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.instances().keys().cloned().collect();
        names.sort();
        names
    }
}

impl Default for HttpProvider {
    fn default() -> Self {
        Self::new(Arc::new(ReqwestTransport::new()))
    }
}

impl fmt::Debug for HttpProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpProvider")
            .field("names", &self.names())
            .finish_non_exhaustive()
    }
}
