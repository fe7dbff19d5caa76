//! Console engine: HTTP gateway, background effect execution and the offline
//! shell cache.
mod cache_storage;
mod engine;
mod gateway;
mod offline;
mod persist;
mod settings;
mod types;

pub use cache_storage::{CacheStorage, CachedResponse, DirCacheStorage, InMemoryCacheStorage};
pub use engine::EngineHandle;
pub use gateway::{ApiGateway, ReqwestGateway, PROGRESS_PATH};
pub use offline::{
    cache_name, FetchDecision, FetchSource, OfflineShell, ReqwestShellNetwork, ShellCacheWorker,
    ShellNetwork, ShellRequest, WaitUntil, WorkerState, CACHE_PREFIX, ENTRY_PAGE, SHELL_MANIFEST,
};
pub use persist::{ensure_cache_dir, AtomicFileWriter, PersistError};
pub use settings::{GatewaySettings, OfflineSettings, DEFAULT_BASE_URL, DEFAULT_CACHE_VERSION};
pub use types::{EngineEvent, GatewayError, OfflineError};

pub use reqwest::Method;
