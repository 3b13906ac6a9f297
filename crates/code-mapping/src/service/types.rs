//! Types for the code mapping service.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Outcome of reloading one category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReloadOutcome {
    /// Category that was reloaded.
    pub category: String,
    /// Entries in the category cache after the reload.
    pub entries: usize,
    /// Whether the cache holds data (false means the retry budget ran out).
    pub populated: bool,
}

/// Counters describing how lookups were served.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MappingStats {
    /// Lookups against a configured category.
    pub lookups: usize,
    /// Lookups that found a mapped value.
    pub hits: usize,
    /// Lookups whose code had no mapping.
    pub misses: usize,
    /// Synchronous reloads forced by a lookup on an empty cache.
    pub forced_reloads: usize,
    /// Lookups rejected because the category had no data at all.
    pub unavailable: usize,
}

impl MappingStats {
    /// Returns the hit rate as a percentage of answered lookups.
    pub fn hit_rate(&self) -> f64 {
        let answered = self.hits + self.misses;
        if answered == 0 {
            0.0
        } else {
            (self.hits as f64 / answered as f64) * 100.0
        }
    }
}

/// Lock-free lookup counters behind [`MappingStats`].
#[derive(Debug, Default)]
pub(crate) struct LookupCounters {
    lookups: AtomicUsize,
    hits: AtomicUsize,
    misses: AtomicUsize,
    forced_reloads: AtomicUsize,
    unavailable: AtomicUsize,
}

impl LookupCounters {
    pub(crate) fn record_lookup(&self) {
        self.lookups.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_forced_reload(&self) {
        self.forced_reloads.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_unavailable(&self) {
        self.unavailable.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> MappingStats {
        MappingStats {
            lookups: self.lookups.load(Ordering::Relaxed),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            forced_reloads: self.forced_reloads.load(Ordering::Relaxed),
            unavailable: self.unavailable.load(Ordering::Relaxed),
        }
    }

    pub(crate) fn reset(&self) {
        for counter in [
            &self.lookups,
            &self.hits,
            &self.misses,
            &self.forced_reloads,
            &self.unavailable,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

impl fmt::Display for MappingStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Code Mapping Statistics:")?;
        writeln!(f, "  Lookups:         {}", self.lookups)?;
        writeln!(f, "  Hits:            {}", self.hits)?;
        writeln!(f, "  Misses:          {}", self.misses)?;
        writeln!(f, "  Hit rate:        {:.1}%", self.hit_rate())?;
        writeln!(f, "  Forced reloads:  {}", self.forced_reloads)?;
        writeln!(f, "  Unavailable:     {}", self.unavailable)?;
        Ok(())
    }
}
