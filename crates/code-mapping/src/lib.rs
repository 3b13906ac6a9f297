//! # code-mapping
//!
//! Self-refreshing lookup cache mapping disease and laboratory codes to the
//! values published in remote concept maps.
//!
//! ## Key Features
//!
//! - **Lock-free reads** - lookups load an immutable snapshot; reloads swap it atomically
//! - **Graceful degradation** - failed or empty reloads keep the last good snapshot
//! - **Exponential backoff** - scheduled reloads retry with a capped, doubling delay
//! - **Cancellable waits** - a [`CancellationToken`] aborts pending backoff waits
//!
//! ## Quick Start
//!
//! ```ignore
//! use code_mapping::{CodeMappingConfig, CodeMappingService};
//!
//! let config = CodeMappingConfig::builder()
//!     .with_base_url("http://terminology.local")
//!     .with_context_path("/")
//!     .with_cache_reload_cron("0 */5 * * * *")
//!     .with_category("disease", ["DiseaseA", "DiseaseB"])
//!     .with_category("laboratory", ["LabA"])
//!     .build();
//!
//! let service = CodeMappingService::new(my_source, config)?;
//!
//! // Wire this to the scheduler.
//! service.load_concept_maps();
//!
//! match service.map_disease_code("A01")? {
//!     Some(mapped) => println!("A01 -> {mapped}"),
//!     None => println!("A01 has no mapping"),
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       code-mapping                           │
//! │                                                              │
//! │  CodeMappingService                                          │
//! │  ├── one ReloadableCache per category                        │
//! │  │   └── loader: fetch concept maps in order, first wins     │
//! │  ├── ExponentialBackoffRetry drives scheduled reloads        │
//! │  └── lookup(category, code) → Option<String>                 │
//! │                                                              │
//! │  ConceptMapSource (trait)                                    │
//! │  └── implemented by code-mapping-client (HTTP) or fakes      │
//! └─────────────────────────────────────────────────────────────┘
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod cache;
mod config;
mod error;
mod retry;
mod service;
mod traits;

// Public re-exports
pub use cache::{CacheLoader, CacheSnapshot, ReloadableCache};
pub use config::{
    CategoryConfig, CodeMappingConfig, CodeMappingConfigBuilder, RetryConfig, DISEASE, LABORATORY,
};
pub use error::{CodeMappingError, CodeMappingResult, RetryInterrupted};
pub use retry::{next_delay, CancellationToken, ExponentialBackoffRetry, Sleeper};
pub use service::{CodeMappingService, MappingStats, ReloadOutcome};
pub use traits::{ConceptMap, ConceptMapSource};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_api_accessible() {
        let _: Option<CodeMappingConfig> = None;
        let _: Option<RetryConfig> = None;
        let _: Option<ReloadOutcome> = None;
        let _: Option<MappingStats> = None;
        let _: Option<CodeMappingResult<()>> = None;
    }

    #[test]
    fn test_service_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<CodeMappingService>();
        assert_send_sync::<ReloadableCache>();
        assert_send_sync::<CancellationToken>();
    }
}
