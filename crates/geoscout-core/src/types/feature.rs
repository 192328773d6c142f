//! Map features normalized from Overpass elements.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// OpenStreetMap element type.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ElementKind {
    /// A single point.
    Node,
    /// A polyline or closed area; coordinates come from its center.
    Way,
    /// A grouping of elements; coordinates come from its center.
    Relation,
}

/// A candidate feature location produced by a map search.
///
/// `index` is the position in the originating batch and is the only key used
/// to re-associate concurrent similarity results with their feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeaturePoint {
    /// Position in the originating batch.
    pub index: usize,
    /// WGS84 longitude.
    pub longitude: f64,
    /// WGS84 latitude.
    pub latitude: f64,
    /// Value of the `name` tag, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// All tags of the source element.
    #[serde(default)]
    pub raw_tags: BTreeMap<String, String>,
    /// Set when the source element carried no usable coordinates and the
    /// longitude/latitude were defaulted to 0.0.
    #[serde(default)]
    pub coordinates_missing: bool,
    /// OSM element type, when reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<ElementKind>,
    /// OSM element id, when reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub osm_id: Option<i64>,
}

impl FeaturePoint {
    /// Creates a feature point at the given coordinates.
    pub fn new(index: usize, longitude: f64, latitude: f64) -> Self {
        Self {
            index,
            longitude,
            latitude,
            name: None,
            raw_tags: BTreeMap::new(),
            coordinates_missing: false,
            kind: None,
            osm_id: None,
        }
    }

    /// Creates a feature point whose coordinates were absent upstream.
    pub fn without_coordinates(index: usize) -> Self {
        Self {
            coordinates_missing: true,
            ..Self::new(index, 0.0, 0.0)
        }
    }

    /// Sets the feature name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the raw tags.
    pub fn with_tags(mut self, tags: BTreeMap<String, String>) -> Self {
        self.raw_tags = tags;
        self
    }

    /// Sets the OSM element type and id.
    pub fn with_element(mut self, kind: ElementKind, osm_id: i64) -> Self {
        self.kind = Some(kind);
        self.osm_id = Some(osm_id);
        self
    }

    /// Returns the display name, empty when the feature is unnamed.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }
}
