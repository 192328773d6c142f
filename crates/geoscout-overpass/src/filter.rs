//! Structured search parameters.

use geoscout_core::BoundingBox;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Default number of elements kept from an Overpass response.
pub const DEFAULT_RESULT_LIMIT: usize = 5;

/// Tag value matching any value of the key.
pub const WILDCARD: &str = "*";

/// A single `key=value` (or `key=*`) tag condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagFilter {
    /// Tag key, e.g. `leisure`.
    pub key: String,
    /// Tag value, e.g. `marina`, or `*` for presence only.
    pub value: String,
}

impl TagFilter {
    /// Creates a tag condition.
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Returns whether this condition only requires the key to be present.
    pub fn is_wildcard(&self) -> bool {
        self.value == WILDCARD
    }
}

/// Parameters of one feature search.
///
/// At least one of the name pattern or the tags must be set; this is checked
/// by [`SearchFilter::validate`], which the query compiler calls before
/// producing any output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchFilter {
    name_pattern: Option<String>,
    tags: Vec<TagFilter>,
    bbox: Option<BoundingBox>,
    result_limit: usize,
}

impl Default for SearchFilter {
    fn default() -> Self {
        Self {
            name_pattern: None,
            tags: Vec::new(),
            bbox: None,
            result_limit: DEFAULT_RESULT_LIMIT,
        }
    }
}

impl SearchFilter {
    /// Creates an empty filter with the default result limit.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the case-insensitive name pattern.
    pub fn with_name(mut self, pattern: impl Into<String>) -> Self {
        self.name_pattern = Some(pattern.into());
        self
    }

    /// Appends a tag condition, keeping insertion order.
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.push(TagFilter::new(key, value));
        self
    }

    /// Appends several tag conditions in iteration order.
    pub fn with_tags<K, V>(mut self, tags: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.tags
            .extend(tags.into_iter().map(|(k, v)| TagFilter::new(k, v)));
        self
    }

    /// Restricts the search to a bounding box.
    pub fn with_bbox(mut self, bbox: BoundingBox) -> Self {
        self.bbox = Some(bbox);
        self
    }

    /// Sets the bounding box only if none was set yet.
    pub fn with_default_bbox(mut self, bbox: BoundingBox) -> Self {
        self.bbox.get_or_insert(bbox);
        self
    }

    /// Sets the maximum number of returned features.
    pub fn with_result_limit(mut self, limit: usize) -> Self {
        self.result_limit = limit;
        self
    }

    /// Returns the name pattern if it is non-blank.
    pub fn name_pattern(&self) -> Option<&str> {
        self.name_pattern
            .as_deref()
            .filter(|name| !name.trim().is_empty())
    }

    /// Returns the tag conditions in insertion order.
    pub fn tags(&self) -> &[TagFilter] {
        &self.tags
    }

    /// Returns the bounding box, if any.
    pub fn bbox(&self) -> Option<&BoundingBox> {
        self.bbox.as_ref()
    }

    /// Returns the maximum number of returned features.
    pub fn result_limit(&self) -> usize {
        self.result_limit
    }

    /// Checks that the filter can be compiled.
    pub fn validate(&self) -> Result<()> {
        if self.name_pattern().is_none() && self.tags.is_empty() {
            return Err(Error::invalid_filter(
                "either name or tags must be provided",
            ));
        }

        if let Some(tag) = self.tags.iter().find(|tag| tag.key.trim().is_empty()) {
            return Err(Error::invalid_filter(format!(
                "tag keys must not be empty (value {:?})",
                tag.value
            )));
        }

        if self.result_limit == 0 {
            return Err(Error::invalid_filter("result limit must be at least 1"));
        }

        if let Some(bbox) = &self.bbox {
            bbox.validate()?;
        }

        Ok(())
    }
}
