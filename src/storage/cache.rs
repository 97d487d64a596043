// src/storage/cache.rs

//! TTL file cache for previously-fetched API payloads.
//!
//! One JSON file per key; the file's modification time doubles as the
//! entry's write timestamp, so there is no separate metadata to keep in
//! sync. Concurrent writers to the same key race at the filesystem level
//! and the last writer wins; callers needing stronger guarantees must
//! serialize their own writes.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};

/// Default freshness window: one day.
pub const DEFAULT_EXPIRY: Duration = Duration::from_secs(24 * 60 * 60);

/// File-backed cache with age-based invalidation.
#[derive(Debug, Clone)]
pub struct TtlCache {
    root: PathBuf,
}

impl TtlCache {
    /// Create a cache rooted at the given directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Create a cache namespaced under one academic year so independent
    /// scrape runs do not collide on keys.
    pub fn for_year(data_root: impl AsRef<Path>, acad_year: &str) -> Self {
        let year_dir = acad_year.replace('/', "-");
        Self::new(data_root.as_ref().join(year_dir).join("cache"))
    }

    /// Path of the file backing a key.
    fn path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.json"))
    }

    /// Serialize a payload under the key, creating or overwriting the
    /// entry and refreshing its write timestamp.
    pub async fn write<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let path = self.path(key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        // Write to a temp file then rename so readers never observe a
        // half-written entry
        let bytes = serde_json::to_vec(value)?;
        let tmp = path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(&bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    /// Read the payload under the key if it was written within
    /// `max_age`, otherwise signal expiry.
    pub async fn read<T: DeserializeOwned>(&self, key: &str, max_age: Duration) -> Result<T> {
        let path = self.path(key);
        let bytes = tokio::fs::read(&path).await?;
        let written = tokio::fs::metadata(&path).await?.modified()?;

        let age = SystemTime::now()
            .duration_since(written)
            .unwrap_or_default();
        if age > max_age {
            return Err(AppError::CacheExpired {
                key: key.to_string(),
                written: DateTime::<Utc>::from(written),
            });
        }

        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Read with the default one-day freshness window.
    pub async fn read_fresh<T: DeserializeOwned>(&self, key: &str) -> Result<T> {
        self.read(key, DEFAULT_EXPIRY).await
    }
}
