//! Process-wide cache of the latest configuration.
//!
//! # Responsibilities
//! - Hold exactly one current snapshot per namespace
//! - Serve whole snapshots to any number of concurrent readers
//! - Mirror the cache to a local JSON file
//!
//! # Design Decisions
//! - Each namespace owns an `ArcSwap<ConfigSnapshot>`; a replacement is one
//!   pointer swap, so readers see the old or the new snapshot, never a mix
//! - Namespace slots are created once; later updates never touch the map lock
//! - A single writer (the sync loop) applies snapshots

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use arc_swap::ArcSwap;
use dashmap::DashMap;

use crate::client::ConfigSnapshot;

/// A thread-safe cache of configuration snapshots keyed by namespace.
#[derive(Clone, Default)]
pub struct ConfigCache {
    inner: Arc<DashMap<String, Arc<ArcSwap<ConfigSnapshot>>>>,
    persistence_path: Option<PathBuf>,
}

impl ConfigCache {
    /// Create a new empty cache.
    pub fn new(persistence_path: Option<PathBuf>) -> Self {
        Self {
            inner: Arc::new(DashMap::new()),
            persistence_path,
        }
    }

    /// Current snapshot of `namespace`.
    pub fn get(&self, namespace: &str) -> Option<Arc<ConfigSnapshot>> {
        let slot = self.inner.get(namespace).map(|r| r.value().clone())?;
        Some(slot.load_full())
    }

    /// Release key of the current snapshot of `namespace`.
    pub fn release_key(&self, namespace: &str) -> Option<String> {
        self.get(namespace).map(|s| s.release_key.clone())
    }

    /// One value from the current snapshot of `namespace`.
    pub fn value(&self, namespace: &str, key: &str) -> Option<String> {
        self.get(namespace).and_then(|s| s.get(key).map(str::to_string))
    }

    /// Atomically replace the snapshot of its namespace.
    ///
    /// Returns the snapshot that was current before.
    pub fn apply(&self, snapshot: ConfigSnapshot) -> Option<Arc<ConfigSnapshot>> {
        let snapshot = Arc::new(snapshot);
        if let Some(slot) = self.inner.get(&snapshot.namespace).map(|r| r.value().clone()) {
            return Some(slot.swap(snapshot));
        }

        let namespace = snapshot.namespace.clone();
        match self.inner.entry(namespace) {
            dashmap::mapref::entry::Entry::Occupied(entry) => Some(entry.get().swap(snapshot)),
            dashmap::mapref::entry::Entry::Vacant(entry) => {
                entry.insert(Arc::new(ArcSwap::new(snapshot)));
                None
            }
        }
    }

    /// Namespaces that hold a snapshot.
    pub fn namespaces(&self) -> Vec<String> {
        let mut names: Vec<String> = self.inner.iter().map(|r| r.key().clone()).collect();
        names.sort();
        names
    }

    pub fn count(&self) -> usize {
        self.inner.len()
    }

    /// Load a backup written by [`ConfigCache::save_to_file`].
    pub fn load_from_file(path: &Path) -> std::io::Result<Self> {
        let cache = Self::new(Some(path.to_path_buf()));
        if path.exists() {
            let reader = BufReader::new(File::open(path)?);
            let map: HashMap<String, ConfigSnapshot> = serde_json::from_reader(reader)?;
            for (namespace, mut snapshot) in map {
                snapshot.namespace = namespace;
                cache.apply(snapshot);
            }
            tracing::info!(path = %path.display(), namespaces = cache.count(), "Loaded config backup");
        }
        Ok(cache)
    }

    /// Write every namespace to the backup file, if one is configured.
    pub fn save_to_file(&self) -> std::io::Result<()> {
        if let Some(path) = &self.persistence_path {
            let map: HashMap<String, ConfigSnapshot> = self.inner.iter()
                .map(|r| (r.key().clone(), ConfigSnapshot::clone(&r.value().load())))
                .collect();

            // Write beside the target, then rename over it.
            let tmp = path.with_extension("tmp");
            {
                let writer = BufWriter::new(File::create(&tmp)?);
                serde_json::to_writer_pretty(writer, &map)?;
            }
            std::fs::rename(&tmp, path)?;
            tracing::debug!(path = %path.display(), namespaces = map.len(), "Saved config backup");
        }
        Ok(())
    }
}

impl std::fmt::Debug for ConfigCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigCache")
            .field("namespaces", &self.namespaces())
            .field("persistence_path", &self.persistence_path)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn snapshot(namespace: &str, release: &str, pairs: &[(&str, &str)]) -> ConfigSnapshot {
        let kv: BTreeMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        ConfigSnapshot::new(namespace, release, kv)
    }

    #[test]
    fn test_cache_operations() {
        let cache = ConfigCache::new(None);
        assert!(cache.get("application").is_none());

        assert!(cache.apply(snapshot("application", "R1", &[("k", "v1")])).is_none());
        assert_eq!(cache.release_key("application").as_deref(), Some("R1"));

        let previous = cache.apply(snapshot("application", "R2", &[("k", "v2")])).unwrap();
        assert_eq!(previous.release_key, "R1");
        assert_eq!(cache.value("application", "k").as_deref(), Some("v2"));

        cache.apply(snapshot("db", "D1", &[("url", "postgres://db")]));
        assert_eq!(cache.namespaces(), vec!["application", "db"]);
        assert_eq!(cache.release_key("application").as_deref(), Some("R2"));
    }

    #[test]
    fn test_replacement_is_wholesale() {
        let cache = ConfigCache::new(None);
        cache.apply(snapshot("application", "R1", &[("a", "1"), ("b", "1")]));
        cache.apply(snapshot("application", "R2", &[("a", "2")]));

        let current = cache.get("application").unwrap();
        assert_eq!(current.release_key, "R2");
        assert_eq!(current.get("a"), Some("2"));
        assert_eq!(current.get("b"), None);
    }

    #[test]
    fn test_concurrent_readers_never_see_torn_snapshot() {
        let cache = ConfigCache::new(None);
        cache.apply(snapshot("application", "0", &[("x", "0"), ("y", "0"), ("z", "0")]));
        let done = Arc::new(AtomicBool::new(false));

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let cache = cache.clone();
                let done = done.clone();
                std::thread::spawn(move || {
                    let mut last_seen = 0u64;
                    while !done.load(Ordering::Acquire) {
                        let s = cache.get("application").unwrap();
                        let release: u64 = s.release_key.parse().unwrap();
                        // Every value carries the release it was written with.
                        for key in ["x", "y", "z"] {
                            assert_eq!(s.get(key), Some(s.release_key.as_str()));
                        }
                        assert!(release >= last_seen, "went back from {} to {}", last_seen, release);
                        last_seen = release;
                    }
                })
            })
            .collect();

        for i in 1..=5_000u64 {
            let r = i.to_string();
            cache.apply(snapshot("application", &r, &[("x", &r), ("y", &r), ("z", &r)]));
        }
        done.store(true, Ordering::Release);

        for reader in readers {
            reader.join().unwrap();
        }
        assert_eq!(cache.release_key("application").as_deref(), Some("5000"));
    }

    #[test]
    fn test_persistence() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("backup.json");

        let cache = ConfigCache::new(Some(path.clone()));
        cache.apply(snapshot("application", "R7", &[("k", "v")]));
        cache.save_to_file().unwrap();

        let loaded = ConfigCache::load_from_file(&path).unwrap();
        assert_eq!(loaded.release_key("application").as_deref(), Some("R7"));
        assert_eq!(loaded.value("application", "k").as_deref(), Some("v"));

        let missing = ConfigCache::load_from_file(&dir.path().join("absent.json")).unwrap();
        assert_eq!(missing.count(), 0);
    }
}
