use crate::error::Result;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Hit and miss counters for a [`CommitMessageCache`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    pub hits: usize,
    pub misses: usize,
}

impl CacheStats {
    /// Fraction of lookups served from the cache, 0.0 when there were none
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Commit messages keyed by repository and changeset id
///
/// Shared by all workers of a repository-wide blame so that a changeset's
/// message is fetched at most once per session. Entries are never evicted.
/// The lock is held only to read or insert, never while the message is being
/// computed, so two workers may race to compute the same entry; the first
/// insert wins and both get the same value.
#[derive(Debug, Default)]
pub struct CommitMessageCache {
    entries: Mutex<HashMap<(PathBuf, String), String>>,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

impl CommitMessageCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached message, or compute and store it
    ///
    /// Errors from `compute` are returned as-is and nothing is cached.
    pub fn get_or_try_insert_with<F>(&self, repo: &Path, changeset: &str, compute: F) -> Result<String>
    where
        F: FnOnce() -> Result<String>,
    {
        let key = (repo.to_path_buf(), changeset.to_string());

        if let Some(message) = self.lock().get(&key) {
            let hits = self.hits.fetch_add(1, Ordering::Relaxed) + 1;
            tracing::trace!("Commit message cache hit for {} ({} hits)", changeset, hits);
            return Ok(message.clone());
        }

        let message = compute()?;
        let misses = self.misses.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::trace!("Commit message cache miss for {} ({} misses)", changeset, misses);

        Ok(self.lock().entry(key).or_insert(message).clone())
    }

    /// Number of cached messages
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    /// Drop all cached messages for one repository
    pub fn remove_repo(&self, repo: &Path) {
        self.lock().retain(|(path, _), _| path != repo);
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<(PathBuf, String), String>> {
        // A panic while holding the lock cannot leave a half-written entry behind.
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
