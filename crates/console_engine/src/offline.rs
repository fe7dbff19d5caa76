//! Offline shell worker: pre-caches the console shell and answers GET
//! requests cache-first, falling back to the cached entry page when the
//! network is unreachable.
//!
//! Lifecycle: `Installing -> Installed -> Activating -> Active`. Install and
//! activate each return a [`WaitUntil`] token; the host must await it before
//! moving on, and [`ShellCacheWorker::settled`] waits for every token still
//! running. Invalidation only happens by bumping the cache version.
//!
//! A complete cache for the current version left by an earlier run is taken
//! over through [`ShellCacheWorker::resume`]: the worker serves from it right
//! away and a later install only refreshes it. A failed refresh never stops a
//! worker that is already serving.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use bytes::Bytes;
use console_logging::{console_debug, console_info, console_warn};
use futures_util::future::try_join_all;
use reqwest::header::CONTENT_TYPE;
use reqwest::Method;
use tokio::task::JoinHandle;
use tokio_util::task::TaskTracker;
use url::Url;

use crate::cache_storage::{CacheStorage, CachedResponse, DirCacheStorage};
use crate::{GatewaySettings, OfflineError, OfflineSettings};

pub const CACHE_PREFIX: &str = "cne-console-";
pub const ENTRY_PAGE: &str = "/app/";
pub const SHELL_MANIFEST: [&str; 5] = [
    ENTRY_PAGE,
    "/app/index.html",
    "/app/styles.css",
    "/app/app.js",
    "/app/manifest.webmanifest",
];

pub fn cache_name(version: &str) -> String {
    format!("{CACHE_PREFIX}{version}")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellRequest {
    pub method: Method,
    pub path: String,
}

impl ShellRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }
}

#[async_trait::async_trait]
pub trait ShellNetwork: Send + Sync {
    async fn fetch(&self, request: &ShellRequest) -> Result<CachedResponse, OfflineError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestShellNetwork {
    base_url: Url,
    client: reqwest::Client,
}

impl ReqwestShellNetwork {
    pub fn new(settings: &GatewaySettings) -> Result<Self, OfflineError> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .build()
            .map_err(|err| OfflineError::Network(err.to_string()))?;
        Ok(Self {
            base_url: settings.base_url.clone(),
            client,
        })
    }
}

#[async_trait::async_trait]
impl ShellNetwork for ReqwestShellNetwork {
    async fn fetch(&self, request: &ShellRequest) -> Result<CachedResponse, OfflineError> {
        let url = self
            .base_url
            .join(request.path.trim_start_matches('/'))
            .map_err(|err| OfflineError::Network(err.to_string()))?;
        let response = self
            .client
            .request(request.method.clone(), url)
            .send()
            .await
            .map_err(|err| OfflineError::Network(err.to_string()))?;
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body: Bytes = response
            .bytes()
            .await
            .map_err(|err| OfflineError::Network(err.to_string()))?;
        Ok(CachedResponse {
            status,
            content_type,
            body,
        })
    }
}

/// Progress of the most recent install. A worker that is already serving keeps
/// serving while a refresh goes through these states again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// Populating the versioned cache with the shell manifest.
    Installing,
    Installed,
    /// Deleting caches left by previous versions.
    Activating,
    Active,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchSource {
    Cache,
    Network,
    /// Network failed; the cached entry page was served instead.
    OfflineFallback,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchDecision {
    /// Not intercepted; the host sends the request to the network itself.
    Passthrough,
    Respond {
        source: FetchSource,
        response: CachedResponse,
    },
}

/// Completion token for a lifecycle event.
#[must_use = "lifecycle events are only complete once the token is awaited"]
pub struct WaitUntil {
    handle: JoinHandle<Result<(), OfflineError>>,
}

impl WaitUntil {
    pub async fn wait(self) -> Result<(), OfflineError> {
        match self.handle.await {
            Ok(result) => result,
            Err(err) => Err(OfflineError::Lifecycle(err.to_string())),
        }
    }
}

struct WorkerInner {
    cache_name: String,
    storage: Arc<dyn CacheStorage>,
    network: Arc<dyn ShellNetwork>,
    state: Mutex<WorkerState>,
    /// Set once a version is active; requests are intercepted from then on.
    serving: AtomicBool,
    tracker: TaskTracker,
}

#[derive(Clone)]
pub struct ShellCacheWorker {
    inner: Arc<WorkerInner>,
}

impl ShellCacheWorker {
    pub fn new(
        version: &str,
        storage: Arc<dyn CacheStorage>,
        network: Arc<dyn ShellNetwork>,
    ) -> Self {
        Self {
            inner: Arc::new(WorkerInner {
                cache_name: cache_name(version),
                storage,
                network,
                state: Mutex::new(WorkerState::Installing),
                serving: AtomicBool::new(false),
                tracker: TaskTracker::new(),
            }),
        }
    }

    pub fn cache_name(&self) -> &str {
        &self.inner.cache_name
    }

    pub fn state(&self) -> WorkerState {
        *self
            .inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether GET requests are currently answered from the cache.
    pub fn is_serving(&self) -> bool {
        self.inner.serving.load(Ordering::SeqCst)
    }

    /// Takes over a complete cache for the current version persisted by an
    /// earlier run. Returns whether the worker is now serving from it.
    pub async fn resume(&self) -> Result<bool, OfflineError> {
        let stored = self.inner.storage.entries(&self.inner.cache_name).await?;
        let complete = SHELL_MANIFEST
            .iter()
            .all(|path| stored.iter().any(|entry| entry == path));
        if complete {
            console_info!("resuming offline shell from {}", self.inner.cache_name);
            self.set_state(WorkerState::Active);
            self.inner.serving.store(true, Ordering::SeqCst);
        }
        Ok(complete)
    }

    fn set_state(&self, next: WorkerState) {
        *self
            .inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = next;
        console_info!("offline shell {} -> {:?}", self.inner.cache_name, next);
    }

    /// Starts populating the versioned cache. Must be called from within a
    /// tokio runtime.
    pub fn install(&self) -> WaitUntil {
        let worker = self.clone();
        WaitUntil {
            handle: self.inner.tracker.spawn(async move { worker.run_install().await }),
        }
    }

    /// Starts deleting every cache except the current version. Must be called
    /// from within a tokio runtime, after install completed.
    pub fn activate(&self) -> WaitUntil {
        let worker = self.clone();
        WaitUntil {
            handle: self.inner.tracker.spawn(async move { worker.run_activate().await }),
        }
    }

    /// Resolves once every lifecycle task started so far has finished.
    pub async fn settled(&self) {
        self.inner.tracker.close();
        self.inner.tracker.wait().await;
        self.inner.tracker.reopen();
    }

    async fn run_install(&self) -> Result<(), OfflineError> {
        self.set_state(WorkerState::Installing);
        let network = self.inner.network.clone();
        let fetches = SHELL_MANIFEST.iter().map(|path| {
            let network = network.clone();
            async move {
                let response = network.fetch(&ShellRequest::get(*path)).await?;
                if !response.is_success() {
                    return Err(OfflineError::Status {
                        path: path.to_string(),
                        status: response.status,
                    });
                }
                Ok::<_, OfflineError>((path.to_string(), response))
            }
        });
        // All or nothing: a single failed fetch leaves the cache untouched.
        let entries = try_join_all(fetches).await?;
        self.inner
            .storage
            .put_all(&self.inner.cache_name, entries)
            .await?;
        self.set_state(WorkerState::Installed);
        Ok(())
    }

    async fn run_activate(&self) -> Result<(), OfflineError> {
        let state = self.state();
        if !matches!(state, WorkerState::Installed | WorkerState::Active) {
            return Err(OfflineError::Lifecycle(format!(
                "cannot activate while {state:?}"
            )));
        }
        self.set_state(WorkerState::Activating);
        for name in self.inner.storage.cache_names().await? {
            if name != self.inner.cache_name {
                console_info!("deleting stale cache {}", name);
                self.inner.storage.delete(&name).await?;
            }
        }
        self.set_state(WorkerState::Active);
        self.inner.serving.store(true, Ordering::SeqCst);
        Ok(())
    }

    /// Cache-first handling of one request. Only GET is ever intercepted, and
    /// only once a version has been activated or resumed.
    pub async fn handle_fetch(&self, request: &ShellRequest) -> Result<FetchDecision, OfflineError> {
        if request.method != Method::GET || !self.is_serving() {
            return Ok(FetchDecision::Passthrough);
        }

        let cache = &self.inner.cache_name;
        if let Some(response) = self.inner.storage.lookup(cache, &request.path).await? {
            console_debug!("served {} from {}", request.path, cache);
            return Ok(FetchDecision::Respond {
                source: FetchSource::Cache,
                response,
            });
        }

        match self.inner.network.fetch(request).await {
            Ok(response) => Ok(FetchDecision::Respond {
                source: FetchSource::Network,
                response,
            }),
            Err(err) => {
                console_warn!("network failed for {}: {}", request.path, err);
                match self.inner.storage.lookup(cache, ENTRY_PAGE).await? {
                    Some(response) => Ok(FetchDecision::Respond {
                        source: FetchSource::OfflineFallback,
                        response,
                    }),
                    None => Err(OfflineError::NoFallback {
                        path: request.path.clone(),
                    }),
                }
            }
        }
    }
}

/// A registered offline worker running on its own runtime, independent of the
/// console's dispatch loop.
pub struct OfflineShell {
    worker: ShellCacheWorker,
    runtime: tokio::runtime::Runtime,
}

impl OfflineShell {
    /// Registers the worker, resumes a persisted cache for the current
    /// version if there is one, and kicks off install followed by activate in
    /// the background.
    pub fn register(
        settings: &OfflineSettings,
        gateway: &GatewaySettings,
    ) -> Result<Self, OfflineError> {
        let network = ReqwestShellNetwork::new(gateway)?;
        let storage = DirCacheStorage::new(PathBuf::from(&settings.cache_dir));
        let worker = ShellCacheWorker::new(
            &settings.cache_version,
            Arc::new(storage),
            Arc::new(network),
        );
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .thread_name("offline-shell")
            .build()
            .map_err(|err| OfflineError::Lifecycle(err.to_string()))?;

        match runtime.block_on(worker.resume()) {
            Ok(true) => {}
            Ok(false) => console_debug!("no complete {} cache to resume", worker.cache_name()),
            Err(err) => console_warn!("persisted offline shell unreadable: {}", err),
        }

        let lifecycle = worker.clone();
        let registration = async move {
            let outcome = async {
                lifecycle.install().wait().await?;
                lifecycle.activate().wait().await
            }
            .await;
            if let Err(err) = outcome {
                console_warn!("offline shell unavailable: {}", err);
            }
        };
        runtime.spawn(worker.inner.tracker.track_future(registration));

        Ok(Self { worker, runtime })
    }

    pub fn state(&self) -> WorkerState {
        self.worker.state()
    }

    pub fn cache_name(&self) -> &str {
        self.worker.cache_name()
    }

    pub fn fetch(&self, request: &ShellRequest) -> Result<FetchDecision, OfflineError> {
        self.runtime.block_on(self.worker.handle_fetch(request))
    }

    /// Waits for pending lifecycle work before the runtime is dropped.
    pub fn shutdown(self) {
        self.runtime.block_on(self.worker.settled());
    }
}
