//! Named key-value caches holding shell responses keyed by request path.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::sync::RwLock;

use crate::persist::{ensure_cache_dir, AtomicFileWriter};
use crate::OfflineError;

const BODY_SUFFIX: &str = ".body";
const META_SUFFIX: &str = ".meta.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Bytes,
}

impl CachedResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[async_trait::async_trait]
pub trait CacheStorage: Send + Sync {
    async fn cache_names(&self) -> Result<Vec<String>, OfflineError>;

    /// Creates `cache` if needed and stores every entry in it.
    async fn put_all(
        &self,
        cache: &str,
        entries: Vec<(String, CachedResponse)>,
    ) -> Result<(), OfflineError>;

    async fn lookup(&self, cache: &str, path: &str)
        -> Result<Option<CachedResponse>, OfflineError>;

    /// Request paths stored in `cache`, sorted.
    async fn entries(&self, cache: &str) -> Result<Vec<String>, OfflineError>;

    /// Removes `cache`; returns whether it existed.
    async fn delete(&self, cache: &str) -> Result<bool, OfflineError>;
}

#[derive(Debug, Default)]
pub struct InMemoryCacheStorage {
    caches: RwLock<BTreeMap<String, BTreeMap<String, CachedResponse>>>,
}

impl InMemoryCacheStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl CacheStorage for InMemoryCacheStorage {
    async fn cache_names(&self) -> Result<Vec<String>, OfflineError> {
        Ok(self.caches.read().await.keys().cloned().collect())
    }

    async fn put_all(
        &self,
        cache: &str,
        entries: Vec<(String, CachedResponse)>,
    ) -> Result<(), OfflineError> {
        let mut caches = self.caches.write().await;
        let target = caches.entry(cache.to_string()).or_default();
        target.extend(entries);
        Ok(())
    }

    async fn lookup(
        &self,
        cache: &str,
        path: &str,
    ) -> Result<Option<CachedResponse>, OfflineError> {
        Ok(self
            .caches
            .read()
            .await
            .get(cache)
            .and_then(|entries| entries.get(path))
            .cloned())
    }

    async fn entries(&self, cache: &str) -> Result<Vec<String>, OfflineError> {
        Ok(self
            .caches
            .read()
            .await
            .get(cache)
            .map(|entries| entries.keys().cloned().collect())
            .unwrap_or_default())
    }

    async fn delete(&self, cache: &str) -> Result<bool, OfflineError> {
        Ok(self.caches.write().await.remove(cache).is_some())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct EntryMeta {
    path: String,
    status: u16,
    content_type: Option<String>,
}

fn entry_key(path: &str) -> String {
    let digest = Sha256::digest(path.as_bytes());
    let mut hex = String::with_capacity(digest.len() * 2);
    for byte in digest.iter() {
        use std::fmt::Write;
        let _ = write!(&mut hex, "{byte:02x}");
    }
    hex
}

fn storage_error(err: impl std::fmt::Display) -> OfflineError {
    OfflineError::Storage(err.to_string())
}

fn read_meta(path: &Path) -> Result<EntryMeta, OfflineError> {
    let raw = fs::read(path).map_err(storage_error)?;
    serde_json::from_slice(&raw).map_err(storage_error)
}

/// Directory-backed storage: one sub-directory per cache, each entry stored
/// as `{sha256(path)}.body` plus a `.meta.json` sidecar written last.
#[derive(Debug, Clone)]
pub struct DirCacheStorage {
    root: PathBuf,
}

impl DirCacheStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn cache_dir(&self, cache: &str) -> Result<PathBuf, OfflineError> {
        let valid = !cache.is_empty()
            && cache
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
            && cache != "."
            && cache != "..";
        if !valid {
            return Err(OfflineError::Storage(format!("invalid cache name {cache:?}")));
        }
        Ok(self.root.join(cache))
    }

    fn cache_names_sync(&self) -> Result<Vec<String>, OfflineError> {
        let listing = match fs::read_dir(&self.root) {
            Ok(listing) => listing,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(storage_error(err)),
        };
        let mut names: Vec<String> = listing
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().map(|ft| ft.is_dir()).unwrap_or(false))
            .filter_map(|entry| entry.file_name().to_str().map(str::to_string))
            .collect();
        names.sort();
        Ok(names)
    }

    fn put_all_sync(
        &self,
        cache: &str,
        entries: Vec<(String, CachedResponse)>,
    ) -> Result<(), OfflineError> {
        let dir = self.cache_dir(cache)?;
        ensure_cache_dir(&dir)?;
        let writer = AtomicFileWriter::new(dir);
        for (path, response) in entries {
            let key = entry_key(&path);
            writer.write(&format!("{key}{BODY_SUFFIX}"), &response.body)?;
            let meta = EntryMeta {
                path,
                status: response.status,
                content_type: response.content_type,
            };
            let encoded = serde_json::to_vec_pretty(&meta).map_err(storage_error)?;
            writer.write(&format!("{key}{META_SUFFIX}"), &encoded)?;
        }
        Ok(())
    }

    fn lookup_sync(&self, cache: &str, path: &str) -> Result<Option<CachedResponse>, OfflineError> {
        let dir = self.cache_dir(cache)?;
        let key = entry_key(path);
        let meta_path = dir.join(format!("{key}{META_SUFFIX}"));
        if !meta_path.is_file() {
            return Ok(None);
        }
        let meta = read_meta(&meta_path)?;
        let body = fs::read(dir.join(format!("{key}{BODY_SUFFIX}"))).map_err(storage_error)?;
        Ok(Some(CachedResponse {
            status: meta.status,
            content_type: meta.content_type,
            body: Bytes::from(body),
        }))
    }

    fn entries_sync(&self, cache: &str) -> Result<Vec<String>, OfflineError> {
        let dir = self.cache_dir(cache)?;
        let listing = match fs::read_dir(&dir) {
            Ok(listing) => listing,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(storage_error(err)),
        };
        let mut paths = Vec::new();
        for entry in listing.filter_map(|entry| entry.ok()) {
            let name = entry.file_name();
            if name.to_string_lossy().ends_with(META_SUFFIX) {
                paths.push(read_meta(&entry.path())?.path);
            }
        }
        paths.sort();
        Ok(paths)
    }

    fn delete_sync(&self, cache: &str) -> Result<bool, OfflineError> {
        let dir = self.cache_dir(cache)?;
        match fs::remove_dir_all(&dir) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(storage_error(err)),
        }
    }
}

/// Runs filesystem work on tokio's blocking pool.
async fn blocking<T, F>(task: F) -> Result<T, OfflineError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, OfflineError> + Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|err| OfflineError::Storage(format!("storage task failed: {err}")))?
}

#[async_trait::async_trait]
impl CacheStorage for DirCacheStorage {
    async fn cache_names(&self) -> Result<Vec<String>, OfflineError> {
        let storage = self.clone();
        blocking(move || storage.cache_names_sync()).await
    }

    async fn put_all(
        &self,
        cache: &str,
        entries: Vec<(String, CachedResponse)>,
    ) -> Result<(), OfflineError> {
        let storage = self.clone();
        let cache = cache.to_string();
        blocking(move || storage.put_all_sync(&cache, entries)).await
    }

    async fn lookup(
        &self,
        cache: &str,
        path: &str,
    ) -> Result<Option<CachedResponse>, OfflineError> {
        let storage = self.clone();
        let (cache, path) = (cache.to_string(), path.to_string());
        blocking(move || storage.lookup_sync(&cache, &path)).await
    }

    async fn entries(&self, cache: &str) -> Result<Vec<String>, OfflineError> {
        let storage = self.clone();
        let cache = cache.to_string();
        blocking(move || storage.entries_sync(&cache)).await
    }

    async fn delete(&self, cache: &str) -> Result<bool, OfflineError> {
        let storage = self.clone();
        let cache = cache.to_string();
        blocking(move || storage.delete_sync(&cache)).await
    }
}
