//! Keeps the two logical clients in step with the connection state.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;
use tracing::debug;

use seva_http::{HttpClient, HttpClientConfig, HttpProvider};

use crate::connection::ConnectionState;

/// Registry name of the client bound to the user-selected server.
pub const PRIMARY_CONNECTION: &str = "gram-digital";

/// Registry name of the client bound to the central service.
pub const CENTRAL_CONNECTION: &str = "g-seva";

/// The clients derived from one observation.
#[derive(Debug, Clone, Default)]
pub struct Apis {
    /// Bound to `server_url`.
    pub api: Option<Arc<HttpClient>>,
    /// Bound to `main_url`.
    pub instance: Option<Arc<HttpClient>>,
}

struct Memo {
    url: Option<String>,
    client: Option<Arc<HttpClient>>,
}

/// One logical connection, recomputed only when its URL changes.
struct Slot {
    name: &'static str,
    memo: Mutex<Option<Memo>>,
}

impl Slot {
    fn new(name: &'static str) -> Self {
        Self {
            name,
            memo: Mutex::new(None),
        }
    }

    fn memo(&self) -> MutexGuard<'_, Option<Memo>> {
        self.memo.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn resolve(&self, provider: &HttpProvider, url: Option<&str>) -> Option<Arc<HttpClient>> {
        let url = url.filter(|u| !u.is_empty());

        let mut memo = self.memo();
        if let Some(current) = memo.as_ref() {
            if current.url.as_deref() == url {
                return current.client.clone();
            }
        }

        debug!(connection = self.name, url = ?url, "Rebinding connection");
        let client = url.map(|url| {
            let client = provider.create(self.name, HttpClientConfig::new(url));
            if client.base_url() != url {
                client.set_base_url(url);
            }
            client.ensure_unwrap_interceptor();
            client
        });

        *memo = Some(Memo {
            url: url.map(str::to_string),
            client: client.clone(),
        });
        client
    }

    fn reset(&self) {
        *self.memo() = None;
    }
}

/// Binds [`ConnectionState`] to registry entries.
///
/// Each observation returns the primary (`api`) and central (`instance`)
/// clients. A client is looked up again only when its URL differs from the
/// previous observation, and every client handed out carries exactly one
/// unwrap-to-data response interceptor.
pub struct ApiBinding {
    provider: Arc<HttpProvider>,
    primary: Slot,
    central: Slot,
}

impl ApiBinding {
    pub fn new(provider: Arc<HttpProvider>) -> Self {
        Self {
            provider,
            primary: Slot::new(PRIMARY_CONNECTION),
            central: Slot::new(CENTRAL_CONNECTION),
        }
    }

    pub fn provider(&self) -> &Arc<HttpProvider> {
        &self.provider
    }

    pub fn observe(&self, state: &ConnectionState) -> Apis {
        Apis {
            api: self
                .primary
                .resolve(&self.provider, state.server_url.as_deref()),
            instance: self
                .central
                .resolve(&self.provider, state.main_url.as_deref()),
        }
    }

    /// Observe the latest value published on a connection-state channel.
    pub fn observe_channel(&self, state: &watch::Receiver<ConnectionState>) -> Apis {
        let current = state.borrow().clone();
        self.observe(&current)
    }

    /// Forget memoized results so the next observation recomputes both slots.
    pub fn invalidate(&self) {
        self.primary.reset();
        self.central.reset();
    }
}

impl std::fmt::Debug for ApiBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiBinding")
            .field("provider", &self.provider)
            .finish()
    }
}
