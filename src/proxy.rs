//! The offline cache proxy: install-time precache, activation sweep, and
//! cache-first fetch interception.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, trace, warn};

use crate::cache::{Cache, CacheStorage};
use crate::config::SwConfig;
use crate::fetch::{NetworkBackend, Request, Response};
use crate::scope::PendingTasks;
use crate::SwError;

/// Cache-first request filter with network fallback and opportunistic
/// cache population.
pub struct OfflineCacheProxy {
    config: SwConfig,
    caches: Arc<RwLock<CacheStorage>>,
    network: Arc<dyn NetworkBackend>,
}

impl OfflineCacheProxy {
    /// Create a proxy over empty cache storage.
    pub fn new(config: SwConfig, network: Arc<dyn NetworkBackend>) -> Self {
        Self {
            config,
            caches: Arc::new(RwLock::new(CacheStorage::new())),
            network,
        }
    }

    /// Shared handle to the cache storage.
    pub fn caches(&self) -> Arc<RwLock<CacheStorage>> {
        Arc::clone(&self.caches)
    }

    /// Install-time population: fetch every app-shell URL and commit them
    /// to the version-tagged store in one step. Any failed or uncacheable
    /// fetch aborts the install and leaves the store absent entirely.
    pub async fn install(&self) -> Result<(), SwError> {
        debug!(cache = %self.config.cache_name, "installing, precaching app shell");

        let mut staged = Cache::new(&self.config.cache_name);
        for url in &self.config.app_shell {
            let request = Request::get(url.as_str());
            let response = self
                .network
                .fetch(&request)
                .await
                .map_err(|e| SwError::InstallFailed(format!("{url}: {e}")))?;
            if !response.is_cacheable() {
                return Err(SwError::InstallFailed(format!(
                    "{url}: uncacheable response (status {})",
                    response.status
                )));
            }
            staged.put(&request, response)?;
        }

        let mut caches = self.caches.write().await;
        caches.insert(staged);
        debug!("cache opened, app shell populated");
        Ok(())
    }

    /// Activation sweep: delete every store whose name is not the current
    /// version tag. The sole eviction policy.
    pub async fn activate(&self) -> Result<(), SwError> {
        let mut caches = self.caches.write().await;
        for name in caches.keys() {
            if name != self.config.cache_name {
                debug!(cache = %name, "deleting stale cache store");
                caches.delete(&name);
            }
        }
        Ok(())
    }

    /// Intercept a fetch. Cache hit → stored response, no network. Miss →
    /// network; a basic 200 is returned immediately while a clone is
    /// written to the store without blocking delivery. A rejected network
    /// fetch falls back to the cached offline document for navigations and
    /// to `None` for everything else.
    pub async fn handle_fetch(
        &self,
        request: &Request,
        pending: &PendingTasks,
    ) -> Option<Response> {
        {
            let caches = self.caches.read().await;
            if let Some(hit) = caches.match_request(request) {
                trace!(url = %request.url, "serving from cache");
                return Some(hit.clone());
            }
        }

        match self.network.fetch(request).await {
            Ok(response) => {
                if !response.is_cacheable() {
                    trace!(url = %request.url, status = response.status, "pass-through, not cached");
                    return Some(response);
                }

                let copy = response.clone();
                let caches = Arc::clone(&self.caches);
                let cache_name = self.config.cache_name.clone();
                let key_request = request.clone();
                pending
                    .push(tokio::spawn(async move {
                        let mut caches = caches.write().await;
                        if let Err(e) = caches.open(&cache_name).put(&key_request, copy) {
                            warn!(url = %key_request.url, error = %e, "cache write failed");
                        }
                    }))
                    .await;

                Some(response)
            }
            Err(e) => {
                if request.is_navigation() {
                    debug!(url = %request.url, error = %e, "navigation fetch failed, serving offline fallback");
                    let fallback = Request::get(self.config.offline_fallback.as_str());
                    let caches = self.caches.read().await;
                    caches.match_request(&fallback).cloned()
                } else {
                    trace!(url = %request.url, error = %e, "fetch failed, no fallback for destination");
                    None
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use hashbrown::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Scripted network: URL → response, with a call counter and an
    /// optional set of URLs that reject outright.
    struct MockNetwork {
        routes: HashMap<String, Response>,
        failing: Vec<String>,
        calls: AtomicUsize,
    }

    impl MockNetwork {
        fn new() -> Self {
            Self {
                routes: HashMap::new(),
                failing: Vec::new(),
                calls: AtomicUsize::new(0),
            }
        }

        fn serving_app_shell(config: &SwConfig) -> Self {
            let mut network = Self::new();
            for url in &config.app_shell {
                network
                    .routes
                    .insert(url.clone(), Response::basic(format!("asset:{url}")));
            }
            network
        }

        fn route(mut self, url: &str, response: Response) -> Self {
            self.routes.insert(url.to_string(), response);
            self
        }

        fn failing(mut self, url: &str) -> Self {
            self.failing.push(url.to_string());
            self
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl NetworkBackend for MockNetwork {
        async fn fetch(&self, request: &Request) -> Result<Response, SwError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.failing.contains(&request.url) {
                return Err(SwError::Network(format!("offline: {}", request.url)));
            }
            self.routes
                .get(&request.url)
                .cloned()
                .ok_or_else(|| SwError::Network(format!("unroutable: {}", request.url)))
        }
    }

    fn proxy_with(network: MockNetwork) -> (OfflineCacheProxy, Arc<MockNetwork>) {
        let network = Arc::new(network);
        let proxy = OfflineCacheProxy::new(SwConfig::default(), network.clone());
        (proxy, network)
    }

    #[tokio::test]
    async fn test_install_populates_app_shell() {
        let config = SwConfig::default();
        let (proxy, _) = proxy_with(MockNetwork::serving_app_shell(&config));

        proxy.install().await.unwrap();

        let caches = proxy.caches();
        let caches = caches.read().await;
        let store = caches.get(&config.cache_name).unwrap();
        assert_eq!(store.len(), 5);
        for url in &config.app_shell {
            assert!(store.match_request(&Request::get(url.as_str())).is_some());
        }
    }

    #[tokio::test]
    async fn test_install_is_all_or_nothing() {
        let config = SwConfig::default();
        let network = MockNetwork::serving_app_shell(&config).failing("/manifest.json");
        let (proxy, _) = proxy_with(network);

        let result = proxy.install().await;
        assert!(matches!(result, Err(SwError::InstallFailed(_))));

        let caches = proxy.caches();
        let caches = caches.read().await;
        assert!(!caches.has(&config.cache_name));
    }

    #[tokio::test]
    async fn test_install_rejects_error_asset() {
        let config = SwConfig::default();
        let network = MockNetwork::serving_app_shell(&config)
            .route("/manifest.json", Response::with_status(500, "Server Error"));
        let (proxy, _) = proxy_with(network);

        assert!(proxy.install().await.is_err());
    }

    #[tokio::test]
    async fn test_activate_sweeps_stale_stores() {
        let config = SwConfig::default();
        let (proxy, _) = proxy_with(MockNetwork::serving_app_shell(&config));
        proxy.install().await.unwrap();

        {
            let caches = proxy.caches();
            let mut caches = caches.write().await;
            caches.open("mistake-collection-v0.9.0");
            caches.open("unrelated-cache");
        }

        proxy.activate().await.unwrap();

        let caches = proxy.caches();
        let caches = caches.read().await;
        assert_eq!(caches.keys(), vec![config.cache_name.clone()]);
    }

    #[tokio::test]
    async fn test_cached_request_skips_network() {
        let config = SwConfig::default();
        let (proxy, network) = proxy_with(MockNetwork::serving_app_shell(&config));
        proxy.install().await.unwrap();
        let installs = network.call_count();

        let pending = PendingTasks::default();
        let hit = proxy
            .handle_fetch(&Request::get("/index.html"), &pending)
            .await
            .unwrap();

        assert_eq!(hit.text().unwrap(), "asset:/index.html");
        assert_eq!(network.call_count(), installs);
    }

    #[tokio::test]
    async fn test_uncached_success_is_cached_after_settle() {
        let network = MockNetwork::new().route("/app.js", Response::basic("console.log(1)"));
        let (proxy, _) = proxy_with(network);

        let pending = PendingTasks::default();
        let request = Request::get("/app.js");
        let response = proxy.handle_fetch(&request, &pending).await.unwrap();

        // The returned original is still readable.
        assert_eq!(response.text().unwrap(), "console.log(1)");

        pending.settle().await;
        let caches = proxy.caches();
        let caches = caches.read().await;
        let stored = caches.match_request(&request).unwrap();
        assert_eq!(stored.text().unwrap(), "console.log(1)");
    }

    #[tokio::test]
    async fn test_not_found_passes_through_uncached() {
        let network = MockNetwork::new().route("/gone", Response::with_status(404, "Not Found"));
        let (proxy, _) = proxy_with(network);

        let pending = PendingTasks::default();
        let request = Request::get("/gone");
        let response = proxy.handle_fetch(&request, &pending).await.unwrap();
        assert_eq!(response.status, 404);

        pending.settle().await;
        let caches = proxy.caches();
        assert!(caches.read().await.match_request(&request).is_none());
    }

    #[tokio::test]
    async fn test_opaque_passes_through_uncached() {
        let network = MockNetwork::new().route("/cdn/lib.js", Response::opaque("minified"));
        let (proxy, _) = proxy_with(network);

        let pending = PendingTasks::default();
        let request = Request::get("/cdn/lib.js");
        let response = proxy.handle_fetch(&request, &pending).await.unwrap();
        assert_eq!(response.response_type, crate::ResponseType::Opaque);

        pending.settle().await;
        let caches = proxy.caches();
        assert!(caches.read().await.match_request(&request).is_none());
    }

    #[tokio::test]
    async fn test_navigation_failure_serves_offline_fallback() {
        let config = SwConfig::default();
        let network = MockNetwork::serving_app_shell(&config).failing("/questions/today");
        let (proxy, _) = proxy_with(network);
        proxy.install().await.unwrap();

        let pending = PendingTasks::default();
        let fallback = proxy
            .handle_fetch(&Request::navigation("/questions/today"), &pending)
            .await
            .unwrap();

        let caches = proxy.caches();
        let caches = caches.read().await;
        let root = caches.match_request(&Request::get("/index.html")).unwrap();
        assert_eq!(&fallback, root);
    }

    #[tokio::test]
    async fn test_non_navigation_failure_has_no_fallback() {
        let config = SwConfig::default();
        let network = MockNetwork::serving_app_shell(&config).failing("/charts.js");
        let (proxy, _) = proxy_with(network);
        proxy.install().await.unwrap();

        let pending = PendingTasks::default();
        let result = proxy
            .handle_fetch(&Request::get("/charts.js"), &pending)
            .await;
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_navigation_failure_without_fallback_cached() {
        let network = MockNetwork::new().failing("/anything");
        let (proxy, _) = proxy_with(network);

        let pending = PendingTasks::default();
        let result = proxy
            .handle_fetch(&Request::navigation("/anything"), &pending)
            .await;
        assert!(result.is_none());
    }
}
