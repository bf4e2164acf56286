//! Content-addressed on-disk cache of collection results.
//!
//! One file per canonical query string, named by the hex SHA-256 of that
//! string. Entries never expire; callers force a refresh when they want fresh
//! data. Anything that prevents an entry from being read back exactly
//! (missing file, I/O error, bad JSON, other schema version, misaligned
//! table) is treated as a miss.

use crate::assembler::CollectionResult;
use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Version of the on-disk envelope. Bump when `CollectionResult` changes shape.
pub const SCHEMA_VERSION: u32 = 2;

#[derive(Debug, Serialize, Deserialize)]
struct CacheEnvelope {
    schema_version: u32,
    query: String,
    collected_at: DateTime<Utc>,
    result: CollectionResult,
}

/// Derive the cache key for a canonical query string.
#[must_use]
pub fn cache_key(canonical: &str) -> String {
    hex::encode(Sha256::digest(canonical.as_bytes()))
}

/// A cache hit with the time the result was collected.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedResult {
    pub result: CollectionResult,
    pub collected_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CacheStore {
    dir: PathBuf,
}

impl CacheStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the entry for `canonical`, whether or not it exists.
    #[must_use]
    pub fn entry_path(&self, canonical: &str) -> PathBuf {
        self.dir.join(cache_key(canonical))
    }

    /// Read the entry for `canonical`; `None` on any kind of miss.
    pub async fn lookup(&self, canonical: &str) -> Option<CollectionResult> {
        self.lookup_entry(canonical).await.map(|hit| hit.result)
    }

    /// Like [`lookup`](Self::lookup), also returning when the entry was collected.
    pub async fn lookup_entry(&self, canonical: &str) -> Option<CachedResult> {
        let path = self.entry_path(canonical);

        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!("Cache miss for '{}' ({})", canonical, path.display());
                return None;
            }
            Err(e) => {
                tracing::warn!("Cache entry {} unreadable: {}", path.display(), e);
                return None;
            }
        };

        let envelope: CacheEnvelope = match serde_json::from_slice(&bytes) {
            Ok(envelope) => envelope,
            Err(e) => {
                tracing::warn!("Cache entry {} is corrupt: {}", path.display(), e);
                return None;
            }
        };

        if envelope.schema_version != SCHEMA_VERSION {
            tracing::warn!(
                "Cache entry {} has schema version {}, expected {}",
                path.display(),
                envelope.schema_version,
                SCHEMA_VERSION
            );
            return None;
        }
        if envelope.query != canonical {
            tracing::warn!(
                "Cache entry {} belongs to query '{}', not '{}'",
                path.display(),
                envelope.query,
                canonical
            );
            return None;
        }
        if !envelope.result.is_aligned() {
            tracing::warn!("Cache entry {} has misaligned columns", path.display());
            return None;
        }

        tracing::debug!(
            "Cache hit for '{}': {} records collected at {}",
            canonical,
            envelope.result.len(),
            envelope.collected_at
        );
        Some(CachedResult {
            result: envelope.result,
            collected_at: envelope.collected_at,
        })
    }

    /// Write the entry for `canonical`, replacing any existing one.
    ///
    /// The entry is written to a temporary file and renamed into place so a
    /// crash never leaves a half-written entry under the real key.
    pub async fn store(&self, canonical: &str, result: &CollectionResult) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let envelope = CacheEnvelope {
            schema_version: SCHEMA_VERSION,
            query: canonical.to_string(),
            collected_at: Utc::now(),
            result: result.clone(),
        };
        let bytes = serde_json::to_vec(&envelope)?;

        let path = self.entry_path(canonical);
        let tmp_path = path.with_extension("tmp");
        tokio::fs::write(&tmp_path, bytes).await?;
        tokio::fs::rename(&tmp_path, &path).await?;

        tracing::debug!(
            "Cached {} records for '{}' at {}",
            result.len(),
            canonical,
            path.display()
        );
        Ok(())
    }
}
