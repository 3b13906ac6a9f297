//! Blocking HTTP client for the concept map endpoint.

use std::time::Duration;

use code_mapping::{
    CodeMappingConfig, CodeMappingError, CodeMappingResult, ConceptMap, ConceptMapSource,
};
use reqwest::blocking::Client;
use reqwest::header::ACCEPT;
use tracing::debug;

use crate::error::{Error, Result};

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Header selecting the snapshot profile flavour on the remote side.
pub const FHIR_PROFILE_HEADER: &str = "x-fhir-profile";

/// Value sent in [`FHIR_PROFILE_HEADER`].
pub const FHIR_PROFILE_SNAPSHOTS: &str = "fhir-profile-snapshots";

/// Fetches concept maps from `GET {base_url}{context_path}conceptmap/{name}`.
///
/// The response body must be a flat JSON object of strings.
#[derive(Debug, Clone)]
pub struct HttpConceptMapClient {
    client: Client,
    base_url: String,
    context_path: String,
}

impl HttpConceptMapClient {
    /// Create a client with the default timeout.
    pub fn new(base_url: impl Into<String>, context_path: impl Into<String>) -> Result<Self> {
        Self::with_timeout(base_url, context_path, DEFAULT_TIMEOUT)
    }

    /// Create a client with a custom request timeout.
    pub fn with_timeout(
        base_url: impl Into<String>,
        context_path: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let base_url = base_url.into();
        if base_url.trim().is_empty() {
            return Err(Error::Config("base URL must not be blank".to_string()));
        }
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url,
            context_path: context_path.into(),
        })
    }

    /// Create a client for the endpoint named in a service configuration.
    pub fn from_config(config: &CodeMappingConfig) -> Result<Self> {
        Self::new(config.base_url.clone(), config.context_path.clone())
    }

    /// Full URL of the concept map called `name`.
    pub fn concept_map_url(&self, name: &str) -> String {
        concept_map_url(&self.base_url, &self.context_path, name)
    }

    /// Download one concept map.
    pub fn get_concept_map(&self, name: &str) -> Result<ConceptMap> {
        let url = self.concept_map_url(name);
        debug!(url = %url, "Fetching concept map");

        let response = self
            .client
            .get(&url)
            .header(ACCEPT, "application/json")
            .header(FHIR_PROFILE_HEADER, FHIR_PROFILE_SNAPSHOTS)
            .send()?;

        if !response.status().is_success() {
            return Err(Error::Status {
                name: name.to_string(),
                status: response.status().as_u16(),
            });
        }

        let map: ConceptMap = response.json()?;
        debug!(concept_map = name, entries = map.len(), "Concept map fetched");
        Ok(map)
    }
}

impl ConceptMapSource for HttpConceptMapClient {
    fn fetch(&self, name: &str) -> CodeMappingResult<ConceptMap> {
        self.get_concept_map(name)
            .map_err(|err| CodeMappingError::source_unavailable(name, err))
    }
}

/// Joins base URL, context path and the encoded concept map name.
///
/// The context path is normalised to start and end with a single `/`.
pub fn concept_map_url(base_url: &str, context_path: &str, name: &str) -> String {
    let base = base_url.trim().trim_end_matches('/');
    let path = context_path.trim().trim_matches('/');
    let prefix = if path.is_empty() {
        "/".to_string()
    } else {
        format!("/{path}/")
    };
    format!("{base}{prefix}conceptmap/{}", urlencoding::encode(name))
}
