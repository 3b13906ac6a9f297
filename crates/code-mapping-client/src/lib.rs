//! Concept Map HTTP Client
//!
//! Blocking [`ConceptMapSource`](code_mapping::ConceptMapSource) that loads
//! concept maps from the remote translation service.
//!
//! # Examples
//!
//! ```rust,no_run
//! use code_mapping::{CodeMappingConfig, CodeMappingService};
//! use code_mapping_client::HttpConceptMapClient;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = CodeMappingConfig::builder()
//!     .with_base_url("http://terminology.local")
//!     .with_context_path("/")
//!     .with_cache_reload_cron("0 */5 * * * *")
//!     .with_category("disease", ["DiseaseA"])
//!     .build();
//!
//! let client = HttpConceptMapClient::from_config(&config)?;
//! let service = CodeMappingService::new(client, config)?;
//! service.load_concept_maps();
//! # Ok(())
//! # }
//! ```
//!
pub mod client;
pub mod error;

pub use client::{
    concept_map_url, HttpConceptMapClient, DEFAULT_TIMEOUT, FHIR_PROFILE_HEADER,
    FHIR_PROFILE_SNAPSHOTS,
};
pub use error::{Error, Result};
