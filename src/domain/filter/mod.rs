//! Skip predicates applied while ingesting ids.
//!
//! A filter decides whether an id is kept. Filters compose into a
//! [`FilterChain`] that short-circuits on the first skip and propagates the
//! first error.

mod blacklist;
mod image;

use std::sync::Arc;

use thiserror::Error;

use crate::domain::content::Content;

pub use blacklist::BlacklistFilter;
pub use image::ImageFilter;

/// Errors raised by a filter that cannot decide.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    #[error("No content body available to filter {uuid}")]
    MissingBody { uuid: String },
}

/// A skip predicate over an id and, optionally, its content.
pub trait UuidFilter: Send + Sync {
    /// Whether the filter needs the document content to decide.
    fn requires_content(&self) -> bool {
        false
    }

    /// Returns `true` to keep the id.
    fn keep(&self, uuid: &str, content: Option<&Content>) -> Result<bool, FilterError>;
}

/// Ordered composition of filters.
#[derive(Clone, Default)]
pub struct FilterChain {
    filters: Vec<Arc<dyn UuidFilter>>,
}

impl FilterChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a filter to the chain.
    pub fn with(mut self, filter: Arc<dyn UuidFilter>) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn requires_content(&self) -> bool {
        self.filters.iter().any(|f| f.requires_content())
    }

    pub fn keep(&self, uuid: &str, content: Option<&Content>) -> Result<bool, FilterError> {
        for filter in &self.filters {
            if !filter.keep(uuid, content)? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

impl std::fmt::Debug for FilterChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterChain")
            .field("filters", &self.filters.len())
            .finish()
    }
}
