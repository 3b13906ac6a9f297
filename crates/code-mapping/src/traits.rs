//! Remote concept map source.
//!
//! This crate does not talk HTTP itself. The [`ConceptMapSource`] trait is
//! implemented by the transport (see the `code-mapping-client` crate) or by an
//! in-memory fake in tests.
//!
//! # Example: an in-memory source
//!
//! ```rust
//! use code_mapping::{CodeMappingError, CodeMappingResult, ConceptMap, ConceptMapSource};
//! use std::collections::HashMap;
//!
//! struct StaticSource(HashMap<String, ConceptMap>);
//!
//! impl ConceptMapSource for StaticSource {
//!     fn fetch(&self, name: &str) -> CodeMappingResult<ConceptMap> {
//!         self.0
//!             .get(name)
//!             .cloned()
//!             .ok_or_else(|| CodeMappingError::source_unavailable(name, "404 Not Found"))
//!     }
//! }
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::CodeMappingResult;

/// Flat code → mapped value table of one concept map.
pub type ConceptMap = HashMap<String, String>;

/// Anything that can fetch a named concept map.
///
/// Calls are blocking. Any error is treated as "this concept map is
/// unavailable right now"; timeouts are the implementation's concern.
pub trait ConceptMapSource: Send + Sync {
    /// Fetches the concept map called `name`.
    fn fetch(&self, name: &str) -> CodeMappingResult<ConceptMap>;
}

impl<T: ConceptMapSource + ?Sized> ConceptMapSource for Arc<T> {
    fn fetch(&self, name: &str) -> CodeMappingResult<ConceptMap> {
        (**self).fetch(name)
    }
}

impl<T: ConceptMapSource + ?Sized> ConceptMapSource for Box<T> {
    fn fetch(&self, name: &str) -> CodeMappingResult<ConceptMap> {
        (**self).fetch(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CodeMappingError;

    struct FixedSource;

    impl ConceptMapSource for FixedSource {
        fn fetch(&self, name: &str) -> CodeMappingResult<ConceptMap> {
            if name == "DiseaseA" {
                Ok(HashMap::from([("d1".to_string(), "mapped".to_string())]))
            } else {
                Err(CodeMappingError::source_unavailable(name, "404 Not Found"))
            }
        }
    }

    #[test]
    fn test_arc_and_box_forward() {
        let arc: Arc<dyn ConceptMapSource> = Arc::new(FixedSource);
        assert_eq!(arc.fetch("DiseaseA").unwrap()["d1"], "mapped");

        let boxed: Box<dyn ConceptMapSource> = Box::new(FixedSource);
        assert!(boxed.fetch("Missing").is_err());
    }
}
