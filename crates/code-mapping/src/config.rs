//! Configuration types for the code mapping service.

use std::collections::BTreeMap;
use std::time::Duration;

use crate::error::{CodeMappingError, CodeMappingResult};

/// Category key for disease code mappings.
pub const DISEASE: &str = "disease";

/// Category key for laboratory code mappings.
pub const LABORATORY: &str = "laboratory";

/// Configuration for the code mapping service.
///
/// Validated eagerly by [`CodeMappingService`](crate::CodeMappingService)
/// construction; an invalid configuration never produces a service.
///
/// # Example
///
/// ```rust
/// use code_mapping::{CodeMappingConfig, RetryConfig};
/// use std::time::Duration;
///
/// let config = CodeMappingConfig::builder()
///     .with_base_url("http://terminology.local")
///     .with_context_path("/fhir-ui-data-model-translation/")
///     .with_cache_reload_cron("0 */5 * * * *")
///     .with_category("disease", ["DiseaseA", "DiseaseB"])
///     .with_category("laboratory", ["LabA"])
///     .with_retry(RetryConfig {
///         initial_delay: Duration::from_secs(10),
///         max_delay: Duration::from_secs(300),
///         max_attempts: Some(5),
///     })
///     .build();
///
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CodeMappingConfig {
    /// Base URL of the remote concept map service.
    pub base_url: String,
    /// Context path prepended to `conceptmap/{name}`.
    pub context_path: String,
    /// Cron expression the external scheduler uses to trigger reloads.
    pub cache_reload_cron: String,
    /// Ordered concept map names per category.
    pub categories: BTreeMap<String, CategoryConfig>,
    /// Backoff settings for scheduled reloads.
    pub retry: RetryConfig,
}

impl CodeMappingConfig {
    /// Creates a new builder for CodeMappingConfig.
    pub fn builder() -> CodeMappingConfigBuilder {
        CodeMappingConfigBuilder::default()
    }

    /// Checks every constraint the service relies on.
    pub fn validate(&self) -> CodeMappingResult<()> {
        if is_blank(&self.base_url) {
            return Err(CodeMappingError::invalid_config(
                "Code mapping base URL must be configured",
            ));
        }
        if is_blank(&self.context_path) {
            return Err(CodeMappingError::invalid_config(
                "Code mapping context path must be configured",
            ));
        }
        if self.categories.is_empty() {
            return Err(CodeMappingError::invalid_config(
                "At least one code mapping category must be configured",
            ));
        }
        for (category, settings) in &self.categories {
            if is_blank(category) {
                return Err(CodeMappingError::invalid_config(
                    "Code mapping category names must not be blank",
                ));
            }
            if settings.concept_maps.is_empty() {
                return Err(CodeMappingError::invalid_config(format!(
                    "At least one {category} concept map must be configured"
                )));
            }
            if settings.concept_maps.iter().any(|name| is_blank(name)) {
                return Err(CodeMappingError::invalid_config(format!(
                    "Blank {category} concept map name configured"
                )));
            }
        }
        if is_blank(&self.cache_reload_cron) {
            return Err(CodeMappingError::invalid_config(
                "Cache reload cron expression must be configured",
            ));
        }
        Ok(())
    }
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// Builder for CodeMappingConfig.
#[derive(Debug, Clone, Default)]
pub struct CodeMappingConfigBuilder {
    config: CodeMappingConfig,
}

impl CodeMappingConfigBuilder {
    /// Sets the remote base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config.base_url = base_url.into();
        self
    }

    /// Sets the context path.
    pub fn with_context_path(mut self, context_path: impl Into<String>) -> Self {
        self.config.context_path = context_path.into();
        self
    }

    /// Sets the reload cron expression.
    pub fn with_cache_reload_cron(mut self, cron: impl Into<String>) -> Self {
        self.config.cache_reload_cron = cron.into();
        self
    }

    /// Adds (or replaces) a category with its ordered concept maps.
    pub fn with_category<I, S>(mut self, category: impl Into<String>, concept_maps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.categories.insert(
            category.into(),
            CategoryConfig {
                concept_maps: concept_maps.into_iter().map(Into::into).collect(),
            },
        );
        self
    }

    /// Sets the retry configuration.
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.config.retry = retry;
        self
    }

    /// Builds the CodeMappingConfig. Validation happens on use.
    pub fn build(self) -> CodeMappingConfig {
        self.config
    }
}

/// Concept maps backing one category.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CategoryConfig {
    /// Concept map names, in merge priority order.
    pub concept_maps: Vec<String>,
}

/// Exponential backoff settings.
///
/// # Example
///
/// ```rust
/// use code_mapping::RetryConfig;
/// use std::time::Duration;
///
/// let retry = RetryConfig::default();
/// assert_eq!(retry.initial_delay, Duration::from_secs(30));
/// assert_eq!(retry.max_delay, Duration::from_secs(15 * 60));
/// assert!(retry.max_attempts.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RetryConfig {
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Upper bound for the doubled delay.
    pub max_delay: Duration,
    /// Maximum number of retries after the initial attempt (None = unlimited).
    pub max_attempts: Option<u32>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(30),
            max_delay: Duration::from_secs(15 * 60),
            max_attempts: None,
        }
    }
}
