//! Service endpoint discovery.
//!
//! The default candidate is probed first. If it does not answer, every
//! fallback is probed in parallel and the first one in declared order that
//! answered wins. If nothing answers, the default is used anyway. The result
//! is memoized until [`EndpointResolver::invalidate`] is called.

use crate::http::HttpClient;
use futures::future::join_all;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use todosync_protocol::{ApiRequest, EndpointConfig, Route};
use tracing::{debug, info, warn};

/// Resolves and memoizes the base URL of the service.
pub struct EndpointResolver<C: HttpClient> {
    endpoint: EndpointConfig,
    client: Arc<C>,
    probe_timeout: Duration,
    resolved: Mutex<Option<String>>,
    /// Serializes discovery so concurrent callers share one probe round.
    discovery: tokio::sync::Mutex<()>,
}

impl<C: HttpClient> EndpointResolver<C> {
    /// Creates a resolver over the given candidates.
    pub fn new(endpoint: EndpointConfig, client: Arc<C>, probe_timeout: Duration) -> Self {
        Self {
            endpoint,
            client,
            probe_timeout,
            resolved: Mutex::new(None),
            discovery: tokio::sync::Mutex::new(()),
        }
    }

    /// Returns the base URL, probing only on the first call after creation
    /// or invalidation.
    pub async fn resolve(&self) -> String {
        if let Some(url) = self.cached() {
            return url;
        }

        let _guard = self.discovery.lock().await;
        if let Some(url) = self.cached() {
            return url;
        }

        let url = self.discover().await;
        *self.resolved.lock() = Some(url.clone());
        url
    }

    /// Returns the memoized base URL, if any.
    pub fn cached(&self) -> Option<String> {
        self.resolved.lock().clone()
    }

    /// Forgets the memoized base URL. The next [`resolve`](Self::resolve)
    /// probes again.
    pub fn invalidate(&self) {
        if self.resolved.lock().take().is_some() {
            debug!("endpoint invalidated");
        }
    }

    /// Forgets the memoized base URL only if it is still `base_url`.
    ///
    /// A caller reporting a failed endpoint must not clear a newer
    /// resolution made by someone else in the meantime.
    pub fn invalidate_url(&self, base_url: &str) {
        let mut resolved = self.resolved.lock();
        if resolved.as_deref() == Some(base_url) {
            *resolved = None;
            debug!("endpoint {base_url} invalidated");
        }
    }

    async fn discover(&self) -> String {
        let default = self.endpoint.default_base_url();
        if self.probe(&default).await {
            info!("using service at {default}");
            return default;
        }

        let fallbacks: Vec<String> = self
            .endpoint
            .candidates()
            .into_iter()
            .skip(1)
            .map(|port| self.endpoint.base_url(port))
            .collect();
        let answers = join_all(fallbacks.iter().map(|url| self.probe(url))).await;

        match fallbacks
            .into_iter()
            .zip(answers)
            .find_map(|(url, alive)| alive.then_some(url))
        {
            Some(url) => {
                info!("using fallback service at {url}");
                url
            }
            None => {
                warn!("no candidate answered, using {default}");
                default
            }
        }
    }

    async fn probe(&self, base_url: &str) -> bool {
        let request = ApiRequest::to(Route::Liveness);
        match tokio::time::timeout(self.probe_timeout, self.client.send(base_url, &request)).await
        {
            Ok(Ok(response)) => response.is_success(),
            Ok(Err(e)) => {
                debug!("probe of {base_url} failed: {e}");
                false
            }
            Err(_) => {
                debug!("probe of {base_url} timed out");
                false
            }
        }
    }
}
