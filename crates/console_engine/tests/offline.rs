use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use console_engine::{
    cache_name, CacheStorage, CachedResponse, DirCacheStorage, FetchDecision, FetchSource,
    InMemoryCacheStorage, OfflineError, ShellCacheWorker, ShellNetwork, ShellRequest, WorkerState,
    ENTRY_PAGE, SHELL_MANIFEST,
};
use pretty_assertions::assert_eq;
use reqwest::Method;

/// Serves `body of {path}` for every request while online.
#[derive(Default)]
struct FakeNetwork {
    offline: AtomicBool,
    failing_path: Option<&'static str>,
    calls: AtomicUsize,
}

impl FakeNetwork {
    fn failing_on(path: &'static str) -> Self {
        Self {
            failing_path: Some(path),
            ..Self::default()
        }
    }

    fn go_offline(&self) {
        self.offline.store(true, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl ShellNetwork for FakeNetwork {
    async fn fetch(&self, request: &ShellRequest) -> Result<CachedResponse, OfflineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.offline.load(Ordering::SeqCst) {
            return Err(OfflineError::Network("connection refused".into()));
        }
        let status = if self.failing_path == Some(request.path.as_str()) {
            404
        } else {
            200
        };
        Ok(CachedResponse {
            status,
            content_type: Some("text/plain".into()),
            body: Bytes::from(format!("body of {}", request.path)),
        })
    }
}

async fn active_worker(
    storage: Arc<dyn CacheStorage>,
    network: Arc<FakeNetwork>,
) -> ShellCacheWorker {
    let worker = ShellCacheWorker::new("v1", storage, network);
    worker.install().wait().await.expect("install");
    worker.activate().wait().await.expect("activate");
    worker
}

#[tokio::test]
async fn install_caches_exactly_the_manifest() {
    let storage = Arc::new(InMemoryCacheStorage::new());
    let network = Arc::new(FakeNetwork::default());
    let worker = ShellCacheWorker::new("v1", storage.clone(), network);

    assert_eq!(worker.state(), WorkerState::Installing);
    worker.install().wait().await.expect("install");
    assert_eq!(worker.state(), WorkerState::Installed);

    let mut expected: Vec<String> = SHELL_MANIFEST.iter().map(|p| p.to_string()).collect();
    expected.sort();
    assert_eq!(storage.entries("cne-console-v1").await.unwrap(), expected);
}

#[tokio::test]
async fn failed_manifest_fetch_leaves_cache_untouched() {
    let storage = Arc::new(InMemoryCacheStorage::new());
    let network = Arc::new(FakeNetwork::failing_on("/app/styles.css"));
    let worker = ShellCacheWorker::new("v1", storage.clone(), network);

    let err = worker.install().wait().await.unwrap_err();
    assert!(matches!(err, OfflineError::Status { status: 404, .. }));
    assert!(storage.cache_names().await.unwrap().is_empty());
    assert_eq!(worker.state(), WorkerState::Installing);
}

#[tokio::test]
async fn activate_before_install_is_rejected() {
    let worker = ShellCacheWorker::new(
        "v1",
        Arc::new(InMemoryCacheStorage::new()),
        Arc::new(FakeNetwork::default()),
    );
    let err = worker.activate().wait().await.unwrap_err();
    assert!(matches!(err, OfflineError::Lifecycle(_)));
}

#[tokio::test]
async fn activate_deletes_previous_versions() {
    let storage = Arc::new(InMemoryCacheStorage::new());
    let stale = CachedResponse {
        status: 200,
        content_type: None,
        body: Bytes::from_static(b"old"),
    };
    storage
        .put_all("cne-console-v0", vec![(ENTRY_PAGE.to_string(), stale)])
        .await
        .unwrap();

    let worker = active_worker(storage.clone(), Arc::new(FakeNetwork::default())).await;

    assert_eq!(worker.state(), WorkerState::Active);
    assert_eq!(
        storage.cache_names().await.unwrap(),
        vec![cache_name("v1")]
    );
}

#[tokio::test]
async fn non_get_requests_pass_through() {
    let network = Arc::new(FakeNetwork::default());
    let worker = active_worker(Arc::new(InMemoryCacheStorage::new()), network.clone()).await;
    let before = network.calls.load(Ordering::SeqCst);

    let decision = worker
        .handle_fetch(&ShellRequest::new(Method::POST, "/api/documents/1/stages/ocr"))
        .await
        .unwrap();

    assert_eq!(decision, FetchDecision::Passthrough);
    assert_eq!(network.calls.load(Ordering::SeqCst), before);
}

#[tokio::test]
async fn requests_before_activation_pass_through() {
    let worker = ShellCacheWorker::new(
        "v1",
        Arc::new(InMemoryCacheStorage::new()),
        Arc::new(FakeNetwork::default()),
    );
    let decision = worker
        .handle_fetch(&ShellRequest::get("/app/"))
        .await
        .unwrap();
    assert_eq!(decision, FetchDecision::Passthrough);
}

#[tokio::test]
async fn cached_get_is_served_without_network() {
    let network = Arc::new(FakeNetwork::default());
    let worker = active_worker(Arc::new(InMemoryCacheStorage::new()), network.clone()).await;
    network.go_offline();

    let decision = worker
        .handle_fetch(&ShellRequest::get("/app/app.js"))
        .await
        .unwrap();

    let FetchDecision::Respond { source, response } = decision else {
        panic!("expected a response");
    };
    assert_eq!(source, FetchSource::Cache);
    assert_eq!(response.body, Bytes::from("body of /app/app.js"));
}

#[tokio::test]
async fn uncached_get_goes_to_network_when_online() {
    let network = Arc::new(FakeNetwork::default());
    let worker = active_worker(Arc::new(InMemoryCacheStorage::new()), network).await;

    let decision = worker
        .handle_fetch(&ShellRequest::get("/api/documents/progress"))
        .await
        .unwrap();

    let FetchDecision::Respond { source, .. } = decision else {
        panic!("expected a response");
    };
    assert_eq!(source, FetchSource::Network);
}

#[tokio::test]
async fn offline_miss_falls_back_to_entry_page() {
    let network = Arc::new(FakeNetwork::default());
    let worker = active_worker(Arc::new(InMemoryCacheStorage::new()), network.clone()).await;
    network.go_offline();

    let decision = worker
        .handle_fetch(&ShellRequest::get("/app/reports/7"))
        .await
        .unwrap();

    let FetchDecision::Respond { source, response } = decision else {
        panic!("expected a response");
    };
    assert_eq!(source, FetchSource::OfflineFallback);
    assert_eq!(response.body, Bytes::from("body of /app/"));
}

#[tokio::test]
async fn offline_miss_without_entry_page_is_an_error() {
    let storage = Arc::new(InMemoryCacheStorage::new());
    let network = Arc::new(FakeNetwork::default());
    let worker = active_worker(storage.clone(), network.clone()).await;
    storage.delete(&cache_name("v1")).await.unwrap();
    network.go_offline();

    let err = worker
        .handle_fetch(&ShellRequest::get("/app/"))
        .await
        .unwrap_err();
    assert!(matches!(err, OfflineError::NoFallback { .. }));
}

#[tokio::test]
async fn settled_waits_for_pending_lifecycle_work() {
    let worker = ShellCacheWorker::new(
        "v1",
        Arc::new(InMemoryCacheStorage::new()),
        Arc::new(FakeNetwork::default()),
    );
    let _pending = worker.install();
    worker.settled().await;
    assert_eq!(worker.state(), WorkerState::Installed);
}

#[tokio::test]
async fn directory_storage_survives_a_new_worker() {
    let temp = tempfile::TempDir::new().unwrap();
    let network = Arc::new(FakeNetwork::default());
    let storage = Arc::new(DirCacheStorage::new(temp.path()));
    active_worker(storage, network.clone()).await;

    // Fresh handle over the same directory.
    let reopened = DirCacheStorage::new(temp.path());
    let cached = reopened
        .lookup(&cache_name("v1"), "/app/index.html")
        .await
        .unwrap()
        .expect("persisted entry");
    assert_eq!(cached.status, 200);
    assert_eq!(cached.content_type.as_deref(), Some("text/plain"));
    assert_eq!(cached.body, Bytes::from("body of /app/index.html"));
    assert_eq!(reopened.entries(&cache_name("v1")).await.unwrap().len(), 5);

    assert!(reopened.delete(&cache_name("v1")).await.unwrap());
    assert!(!reopened.delete(&cache_name("v1")).await.unwrap());
    assert!(reopened.cache_names().await.unwrap().is_empty());
}

#[tokio::test]
async fn restart_while_offline_serves_persisted_shell() {
    let temp = tempfile::TempDir::new().unwrap();
    active_worker(
        Arc::new(DirCacheStorage::new(temp.path())),
        Arc::new(FakeNetwork::default()),
    )
    .await;

    let network = Arc::new(FakeNetwork::default());
    network.go_offline();
    let restarted = ShellCacheWorker::new(
        "v1",
        Arc::new(DirCacheStorage::new(temp.path())),
        network,
    );

    assert!(restarted.resume().await.unwrap());
    assert!(restarted.is_serving());
    assert_eq!(restarted.state(), WorkerState::Active);

    // The refresh fails without network; the persisted shell keeps serving.
    assert!(restarted.install().wait().await.is_err());
    assert!(restarted.is_serving());

    let FetchDecision::Respond { source, response } = restarted
        .handle_fetch(&ShellRequest::get("/app/"))
        .await
        .unwrap()
    else {
        panic!("expected a cached response");
    };
    assert_eq!(source, FetchSource::Cache);
    assert_eq!(response.body, Bytes::from("body of /app/"));

    let FetchDecision::Respond { source, .. } = restarted
        .handle_fetch(&ShellRequest::get("/app/reports/7"))
        .await
        .unwrap()
    else {
        panic!("expected the entry page");
    };
    assert_eq!(source, FetchSource::OfflineFallback);
}

#[tokio::test]
async fn incomplete_or_other_version_cache_is_not_resumed() {
    let storage = Arc::new(InMemoryCacheStorage::new());
    let page = CachedResponse {
        status: 200,
        content_type: None,
        body: Bytes::from_static(b"shell"),
    };
    storage
        .put_all(&cache_name("v1"), vec![(ENTRY_PAGE.to_string(), page.clone())])
        .await
        .unwrap();
    let full: Vec<_> = SHELL_MANIFEST
        .iter()
        .map(|path| (path.to_string(), page.clone()))
        .collect();
    storage.put_all(&cache_name("v0"), full).await.unwrap();

    let worker = ShellCacheWorker::new("v1", storage, Arc::new(FakeNetwork::default()));
    assert!(!worker.resume().await.unwrap());
    assert!(!worker.is_serving());
    assert_eq!(
        worker.handle_fetch(&ShellRequest::get("/app/")).await.unwrap(),
        FetchDecision::Passthrough
    );
}
