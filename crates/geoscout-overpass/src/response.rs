//! Overpass JSON response shapes and normalization.

use std::collections::BTreeMap;

use geoscout_core::{ElementKind, FeaturePoint};
use serde::{Deserialize, Serialize};

/// Body of an `[out:json]` Overpass response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OverpassResponse {
    /// Matched elements in server order.
    #[serde(default)]
    pub elements: Vec<OverpassElement>,
}

/// Center point reported for ways and relations by `out center`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Center {
    /// Longitude of the center.
    pub lon: Option<f64>,
    /// Latitude of the center.
    pub lat: Option<f64>,
}

/// A single raw Overpass element.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverpassElement {
    /// Element type (`node`, `way`, `relation`).
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    /// OSM element id.
    #[serde(default)]
    pub id: Option<i64>,
    /// Longitude, present on nodes.
    #[serde(default)]
    pub lon: Option<f64>,
    /// Latitude, present on nodes.
    #[serde(default)]
    pub lat: Option<f64>,
    /// Center, present on ways and relations.
    #[serde(default)]
    pub center: Option<Center>,
    /// Element tags.
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

impl OverpassElement {
    /// Returns the representative coordinates as `(lon, lat)`.
    ///
    /// Node coordinates win over the center; a partial pair is treated as
    /// missing.
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        match (self.lon, self.lat) {
            (Some(lon), Some(lat)) => Some((lon, lat)),
            _ => self
                .center
                .and_then(|center| center.lon.zip(center.lat)),
        }
    }

    /// Normalizes this element into the feature at position `index`.
    ///
    /// Missing coordinates default to 0.0 and are flagged on the feature
    /// instead of dropping it.
    pub fn into_feature(self, index: usize) -> FeaturePoint {
        let mut feature = match self.coordinates() {
            Some((lon, lat)) => FeaturePoint::new(index, lon, lat),
            None => FeaturePoint::without_coordinates(index),
        };

        if let (Some(kind), Some(id)) = (
            self.kind.as_deref().and_then(|k| k.parse::<ElementKind>().ok()),
            self.id,
        ) {
            feature = feature.with_element(kind, id);
        }

        if let Some(name) = self.tags.get("name").filter(|n| !n.is_empty()) {
            feature = feature.with_name(name.clone());
        }

        feature.with_tags(self.tags)
    }
}
