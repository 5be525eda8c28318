//! Exact-match id blacklist.

use std::collections::HashSet;

use super::{FilterError, UuidFilter};
use crate::domain::content::Content;

/// Skips ids listed one per line.
#[derive(Debug, Clone, Default)]
pub struct BlacklistFilter {
    uuids: HashSet<String>,
}

impl BlacklistFilter {
    /// Builds a blacklist from file contents; blank lines are ignored.
    pub fn from_lines(text: &str) -> Self {
        let uuids = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();
        Self { uuids }
    }

    pub fn contains_line(&self, uuid: &str) -> bool {
        self.uuids.contains(uuid)
    }

    pub fn len(&self) -> usize {
        self.uuids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.uuids.is_empty()
    }
}

impl UuidFilter for BlacklistFilter {
    fn keep(&self, uuid: &str, _content: Option<&Content>) -> Result<bool, FilterError> {
        Ok(!self.contains_line(uuid))
    }
}
