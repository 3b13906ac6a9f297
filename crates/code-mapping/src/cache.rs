//! Reloadable snapshot cache.
//!
//! A [`ReloadableCache`] holds one immutable [`CacheSnapshot`] that is
//! replaced as a whole whenever the injected loader produces fresh, non-empty
//! data. Readers load the current snapshot through an [`ArcSwapOption`] and
//! never block a reload; a reader keeps its snapshot alive for as long as it
//! holds the `Arc`, even if a newer one is published meanwhile.
//!
//! A snapshot is never cleared once published. Loader failures and empty
//! loads keep whatever is currently installed.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt::{self, Debug};
use std::hash::Hash;
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use chrono::{DateTime, Utc};
use tracing::{error, info, warn};

use crate::error::CodeMappingResult;

/// Loader invoked on every reload.
pub type CacheLoader<K, V> = Box<dyn Fn() -> CodeMappingResult<HashMap<K, V>> + Send + Sync>;

/// Immutable key/value data published by a [`ReloadableCache`].
#[derive(Debug, Clone)]
pub struct CacheSnapshot<K, V> {
    entries: HashMap<K, V>,
    loaded_at: DateTime<Utc>,
}

impl<K: Eq + Hash, V> CacheSnapshot<K, V> {
    fn new(entries: HashMap<K, V>) -> Self {
        Self {
            entries,
            loaded_at: Utc::now(),
        }
    }

    /// Looks up a single key.
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.get(key)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the snapshot has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// When this snapshot was installed.
    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    /// All entries of the snapshot.
    pub fn entries(&self) -> &HashMap<K, V> {
        &self.entries
    }
}

/// Named cache holding an atomically replaceable snapshot.
///
/// # Example
///
/// ```rust
/// use code_mapping::ReloadableCache;
/// use std::collections::HashMap;
///
/// let cache: ReloadableCache = ReloadableCache::new("disease", || {
///     Ok(HashMap::from([("A01".to_string(), "cholera".to_string())]))
/// });
///
/// assert!(!cache.has_entries());
/// assert_eq!(cache.get_value("A01").as_deref(), Some("cholera"));
/// assert!(cache.has_entries());
/// ```
pub struct ReloadableCache<K = String, V = String> {
    name: String,
    loader: CacheLoader<K, V>,
    snapshot: ArcSwapOption<CacheSnapshot<K, V>>,
}

impl<K, V> ReloadableCache<K, V>
where
    K: Eq + Hash + Debug,
    V: Clone,
{
    /// Creates an empty cache; nothing is loaded until the first reload or lookup.
    pub fn new<F>(name: impl Into<String>, loader: F) -> Self
    where
        F: Fn() -> CodeMappingResult<HashMap<K, V>> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            loader: Box::new(loader),
            snapshot: ArcSwapOption::empty(),
        }
    }

    /// Runs the loader and installs its result if it is non-empty.
    ///
    /// Loader errors are logged and swallowed; the current snapshot stays.
    pub fn load_cache(&self) {
        match (self.loader)() {
            Ok(entries) if !entries.is_empty() => {
                let count = entries.len();
                self.snapshot
                    .store(Some(Arc::new(CacheSnapshot::new(entries))));
                info!(cache = %self.name, entries = count, "Concept map cache (re)loaded");
            }
            Ok(_) => {
                if self.snapshot.load().is_none() {
                    warn!(cache = %self.name, "No entries loaded for concept map cache");
                }
            }
            Err(err) => {
                error!(cache = %self.name, error = %err, "Error fetching code map");
            }
        }
    }

    /// Returns the value for `key`, loading synchronously if nothing was
    /// loaded yet.
    pub fn get_value<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + Debug + ?Sized,
    {
        let mut current = self.snapshot.load_full();
        if current.is_none() {
            self.load_cache();
            current = self.snapshot.load_full();
        }

        let value = current
            .as_ref()
            .and_then(|snapshot| snapshot.get(key).cloned());
        if value.is_none() {
            let size = current
                .as_ref()
                .map_or_else(|| "n/a".to_string(), |snapshot| snapshot.len().to_string());
            info!(cache = %self.name, key = ?key, size = %size, "No entry found for key");
        }
        value
    }

    /// Returns true if a non-empty snapshot is installed.
    pub fn has_entries(&self) -> bool {
        let snapshot = self.snapshot.load();
        match &*snapshot {
            Some(snapshot) => !snapshot.is_empty(),
            None => false,
        }
    }

    /// Number of entries in the current snapshot (0 when nothing is loaded).
    pub fn len(&self) -> usize {
        let snapshot = self.snapshot.load();
        (*snapshot).as_ref().map_or(0, |snapshot| snapshot.len())
    }

    /// Returns true if no entries are available.
    pub fn is_empty(&self) -> bool {
        !self.has_entries()
    }

    /// The current snapshot, for consistent multi-key reads.
    pub fn snapshot(&self) -> Option<Arc<CacheSnapshot<K, V>>> {
        self.snapshot.load_full()
    }

    /// When the current snapshot was installed.
    pub fn loaded_at(&self) -> Option<DateTime<Utc>> {
        self.snapshot().map(|snapshot| snapshot.loaded_at())
    }

    /// The diagnostic name of this cache.
    pub fn cache_name(&self) -> &str {
        &self.name
    }
}

impl<K, V> Debug for ReloadableCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let snapshot = self.snapshot.load();
        f.debug_struct("ReloadableCache")
            .field("name", &self.name)
            .field("entries", &(*snapshot).as_ref().map(|s| s.entries.len()))
            .finish_non_exhaustive()
    }
}
