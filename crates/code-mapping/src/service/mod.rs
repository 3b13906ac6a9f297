//! Code mapping service.
//!
//! [`CodeMappingService`] owns one [`ReloadableCache`] per configured
//! category. Each cache is backed by a loader that fetches the category's
//! concept maps in configured order and merges them, keeping the first value
//! seen for a key.
//!
//! # Example
//!
//! ```ignore
//! use code_mapping::{CodeMappingConfig, CodeMappingService};
//! use code_mapping_client::HttpConceptMapClient;
//!
//! let config = CodeMappingConfig::builder()
//!     .with_base_url("http://terminology.local")
//!     .with_context_path("/")
//!     .with_cache_reload_cron("0 */5 * * * *")
//!     .with_category("disease", ["DiseaseA"])
//!     .with_category("laboratory", ["LabA"])
//!     .build();
//!
//! let client = HttpConceptMapClient::from_config(&config)?;
//! let service = CodeMappingService::new(client, config)?;
//!
//! // Called by the scheduler on its cadence; never fails.
//! service.load_concept_maps();
//!
//! let mapped = service.lookup("disease", "A01")?;
//! ```

mod types;

pub use types::{MappingStats, ReloadOutcome};

use types::LookupCounters;

use std::collections::hash_map::Entry;
use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::cache::ReloadableCache;
use crate::config::{CodeMappingConfig, DISEASE, LABORATORY};
use crate::error::{CodeMappingError, CodeMappingResult};
use crate::retry::{CancellationToken, ExponentialBackoffRetry};
use crate::traits::{ConceptMap, ConceptMapSource};

/// Lookup service over per-category reloadable caches.
#[derive(Debug)]
pub struct CodeMappingService {
    config: CodeMappingConfig,
    caches: BTreeMap<String, ReloadableCache>,
    retry: ExponentialBackoffRetry,
    counters: LookupCounters,
}

impl CodeMappingService {
    /// Creates the service with backoff taken from `config.retry`.
    ///
    /// # Errors
    ///
    /// Returns [`CodeMappingError::InvalidConfig`] if the configuration is
    /// incomplete.
    pub fn new<S>(source: S, config: CodeMappingConfig) -> CodeMappingResult<Self>
    where
        S: ConceptMapSource + 'static,
    {
        Self::with_cancellation(source, config, CancellationToken::new())
    }

    /// Creates the service; cancelling `token` aborts pending backoff waits.
    pub fn with_cancellation<S>(
        source: S,
        config: CodeMappingConfig,
        token: CancellationToken,
    ) -> CodeMappingResult<Self>
    where
        S: ConceptMapSource + 'static,
    {
        let retry = ExponentialBackoffRetry::with_cancellation(config.retry.clone(), token);
        Self::with_retry(source, config, retry)
    }

    /// Creates the service with an explicit retry executor.
    ///
    /// `retry` replaces whatever `config.retry` says.
    pub fn with_retry<S>(
        source: S,
        config: CodeMappingConfig,
        retry: ExponentialBackoffRetry,
    ) -> CodeMappingResult<Self>
    where
        S: ConceptMapSource + 'static,
    {
        config.validate()?;

        let source: Arc<dyn ConceptMapSource> = Arc::new(source);
        let caches: BTreeMap<String, ReloadableCache> = config
            .categories
            .iter()
            .map(|(category, settings)| {
                let loader_source = source.clone();
                let loader_category = category.clone();
                let concept_maps = settings.concept_maps.clone();
                let cache = ReloadableCache::new(category.clone(), move || {
                    merge_concept_maps(loader_source.as_ref(), &loader_category, &concept_maps)
                });
                (category.clone(), cache)
            })
            .collect();

        info!(
            categories = ?caches.keys().collect::<Vec<_>>(),
            base_url = %config.base_url,
            "Code mapping service configured"
        );

        Ok(Self {
            config,
            caches,
            retry,
            counters: LookupCounters::default(),
        })
    }

    /// Scheduled reload entry point.
    ///
    /// Reloads every category with backoff until it has entries or the retry
    /// budget is spent. Never fails: exhaustion and interruption are logged.
    pub fn load_concept_maps(&self) {
        if let Err(err) = self.try_load_concept_maps() {
            warn!(error = %err, "Concept map reload aborted");
        }
    }

    /// Reloads every category with backoff and reports the outcome.
    ///
    /// # Errors
    ///
    /// Returns [`CodeMappingError::RetryInterrupted`] if a backoff wait was
    /// cancelled. Every category still gets its reload attempts; only the
    /// interrupted waits are skipped.
    pub fn try_load_concept_maps(&self) -> CodeMappingResult<Vec<ReloadOutcome>> {
        let mut outcomes = Vec::with_capacity(self.caches.len());
        let mut interrupted = None;
        for (category, cache) in &self.caches {
            let populated = match self.retry.execute_with_retry(
                cache.cache_name(),
                || {
                    cache.load_cache();
                    Ok::<_, CodeMappingError>(cache.has_entries())
                },
                |has_entries| !has_entries,
            ) {
                Ok(populated) => populated,
                Err(err) => {
                    warn!(category = %category, error = %err, "Code mapping reload interrupted");
                    if interrupted.is_none() {
                        interrupted = Some(err);
                    }
                    cache.has_entries()
                }
            };

            if !populated && interrupted.is_none() {
                warn!(
                    category = %category,
                    "Code mapping cache still empty after exhausting retries"
                );
            }
            outcomes.push(ReloadOutcome {
                category: category.clone(),
                entries: cache.len(),
                populated,
            });
        }

        match interrupted {
            Some(err) => Err(err),
            None => Ok(outcomes),
        }
    }

    /// Maps `code` within `category`.
    ///
    /// An empty category cache is reloaded once, synchronously and without
    /// backoff, before giving up.
    ///
    /// # Errors
    ///
    /// - [`CodeMappingError::UnknownCategory`] for an unconfigured category.
    /// - [`CodeMappingError::MappingUnavailable`] if the category has no data
    ///   even after the forced reload.
    pub fn lookup(&self, category: &str, code: &str) -> CodeMappingResult<Option<String>> {
        let cache = self
            .caches
            .get(category)
            .ok_or_else(|| CodeMappingError::UnknownCategory(category.to_string()))?;

        self.counters.record_lookup();

        if !cache.has_entries() {
            self.counters.record_forced_reload();
            cache.load_cache();
            if !cache.has_entries() {
                self.counters.record_unavailable();
                return Err(CodeMappingError::MappingUnavailable {
                    category: category.to_string(),
                });
            }
        }

        let value = cache.get_value(code);
        if value.is_some() {
            self.counters.record_hit();
        } else {
            self.counters.record_miss();
        }
        Ok(value)
    }

    /// Maps a disease code.
    pub fn map_disease_code(&self, code: &str) -> CodeMappingResult<Option<String>> {
        self.lookup(DISEASE, code)
    }

    /// Maps a laboratory code.
    pub fn map_laboratory_code(&self, code: &str) -> CodeMappingResult<Option<String>> {
        self.lookup(LABORATORY, code)
    }

    /// Configured category names, in sorted order.
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.caches.keys().map(String::as_str)
    }

    /// The cache backing `category`.
    pub fn cache(&self, category: &str) -> Option<&ReloadableCache> {
        self.caches.get(category)
    }

    /// Returns the validated configuration.
    pub fn config(&self) -> &CodeMappingConfig {
        &self.config
    }

    /// Returns lookup statistics.
    pub fn stats(&self) -> MappingStats {
        self.counters.snapshot()
    }

    /// Resets statistics.
    pub fn reset_stats(&self) {
        self.counters.reset();
    }
}

/// Fetches `concept_maps` in order and merges them, first value wins.
///
/// A concept map that cannot be fetched is logged and skipped. Fails with
/// [`CodeMappingError::Loader`] only when no concept map could be fetched.
fn merge_concept_maps(
    source: &dyn ConceptMapSource,
    category: &str,
    concept_maps: &[String],
) -> CodeMappingResult<ConceptMap> {
    let mut merged = ConceptMap::new();
    let mut failures = Vec::new();
    for name in concept_maps {
        let map = match source.fetch(name) {
            Ok(map) => map,
            Err(err) => {
                failures.push(err.to_string());
                error!(
                    category,
                    concept_map = %name,
                    error = %err,
                    "Skipping concept map that could not be fetched"
                );
                continue;
            }
        };
        debug!(category, concept_map = %name, entries = map.len(), "Fetched concept map");

        for (key, value) in map {
            match merged.entry(key) {
                Entry::Vacant(slot) => {
                    slot.insert(value);
                }
                Entry::Occupied(existing) => {
                    warn!(
                        category,
                        concept_map = %name,
                        key = %existing.key(),
                        "Duplicate key encountered while loading concept map - existing value kept"
                    );
                }
            }
        }
    }

    if !concept_maps.is_empty() && failures.len() == concept_maps.len() {
        return Err(CodeMappingError::Loader {
            cache: category.to_string(),
            reason: failures.join("; "),
        });
    }
    Ok(merged)
}
