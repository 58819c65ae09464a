//! Durable per-stage memoization keyed by (fingerprint, stage name).

use crate::error::OutreachError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Generate the cache partition key for a video URL.
///
/// The same URL always yields the same fingerprint, so repeated runs land
/// in the same partition.
pub fn fingerprint(video_url: &str) -> String {
    format!("{:x}", md5::compute(video_url.as_bytes()))
}

/// Durable key-value store for pipeline stage results.
///
/// Each (fingerprint, stage) pair resolves to one JSON artifact under
/// `cache_dir/<fingerprint>/<stage>.json`. Entries have no TTL and are
/// never revalidated against external state: a recorded result is
/// authoritative until it is explicitly invalidated.
///
/// Concurrent first-writers for the same key are not de-duplicated. The
/// pipeline issues at most one compute per key at a time, so this is a
/// documented limitation rather than a guarded invariant.
#[derive(Clone)]
pub struct ContentStore {
    cache_dir: PathBuf,
}

impl ContentStore {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
        }
    }

    /// Initialize the cache root directory
    pub async fn initialize(&self) -> Result<(), OutreachError> {
        tokio::fs::create_dir_all(&self.cache_dir)
            .await
            .map_err(|e| OutreachError::Cache(e.into()))?;
        debug!("Cache directory initialized: {}", self.cache_dir.display());
        Ok(())
    }

    fn entry_path(&self, fingerprint: &str, stage: &str) -> PathBuf {
        self.cache_dir.join(fingerprint).join(format!("{}.json", stage))
    }

    /// Return the cached result for (fingerprint, stage), or run `compute`
    /// and persist its result.
    ///
    /// Nothing is persisted when `compute` fails; the failure propagates to
    /// the caller. Unreadable or corrupt entries are treated as misses and
    /// overwritten on the next successful compute.
    pub async fn get_or_compute<T, F, Fut>(
        &self,
        fingerprint: &str,
        stage: &str,
        compute: F,
    ) -> Result<T, OutreachError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, OutreachError>>,
    {
        let path = self.entry_path(fingerprint, stage);

        if path.exists() {
            match tokio::fs::read_to_string(&path).await {
                Ok(content) => match serde_json::from_str::<T>(&content) {
                    Ok(result) => {
                        debug!("Cache hit for stage '{}' ({})", stage, fingerprint);
                        return Ok(result);
                    }
                    Err(e) => {
                        warn!("Corrupt cache entry {}: {}", path.display(), e);
                    }
                },
                Err(e) => {
                    warn!("Failed to read cache entry {}: {}", path.display(), e);
                }
            }
        }

        debug!("Cache miss for stage '{}' ({})", stage, fingerprint);
        let result = compute().await?;

        self.persist(&path, &result).await?;
        debug!("Cached stage '{}' result to {}", stage, path.display());

        Ok(result)
    }

    async fn persist<T: Serialize>(&self, path: &Path, result: &T) -> Result<(), OutreachError> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| OutreachError::Cache(e.into()))?;
        }
        let json = serde_json::to_string_pretty(result).map_err(|e| OutreachError::Cache(e.into()))?;
        tokio::fs::write(path, json)
            .await
            .map_err(|e| OutreachError::Cache(e.into()))?;
        Ok(())
    }

    /// Remove all cached stage results for a fingerprint.
    ///
    /// Returns true if a partition existed and was removed.
    pub async fn invalidate(&self, fingerprint: &str) -> Result<bool, OutreachError> {
        let partition = self.cache_dir.join(fingerprint);
        if partition.is_dir() {
            tokio::fs::remove_dir_all(&partition)
                .await
                .map_err(|e| OutreachError::Cache(e.into()))?;
            info!("Invalidated cache partition for {}", fingerprint);
            Ok(true)
        } else {
            debug!("No cache partition found for {}", fingerprint);
            Ok(false)
        }
    }
}
