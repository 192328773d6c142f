//! Axis-aligned geographic bounding box.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A WGS84 bounding box in Overpass order: south, west, north, east.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Minimum latitude.
    pub south: f64,
    /// Minimum longitude.
    pub west: f64,
    /// Maximum latitude.
    pub north: f64,
    /// Maximum longitude.
    pub east: f64,
}

impl BoundingBox {
    /// Creates a bounding box without validating it.
    pub const fn new(south: f64, west: f64, north: f64, east: f64) -> Self {
        Self {
            south,
            west,
            north,
            east,
        }
    }

    /// Creates a bounding box and validates it.
    pub fn try_new(south: f64, west: f64, north: f64, east: f64) -> Result<Self> {
        let bbox = Self::new(south, west, north, east);
        bbox.validate()?;
        Ok(bbox)
    }

    /// Builds a bounding box from a `[south, west, north, east]` array.
    pub fn from_array([south, west, north, east]: [f64; 4]) -> Result<Self> {
        Self::try_new(south, west, north, east)
    }

    /// Returns the box as a `[south, west, north, east]` array.
    pub fn to_array(&self) -> [f64; 4] {
        [self.south, self.west, self.north, self.east]
    }

    /// Checks coordinate ranges and corner ordering.
    pub fn validate(&self) -> Result<()> {
        let values = self.to_array();
        if values.iter().any(|v| !v.is_finite()) {
            return Err(Error::invalid_filter().with_message("bounding box must be finite"));
        }

        if !(-90.0..=90.0).contains(&self.south) || !(-90.0..=90.0).contains(&self.north) {
            return Err(Error::invalid_filter()
                .with_message("bounding box latitudes must be between -90 and 90"));
        }

        if !(-180.0..=180.0).contains(&self.west) || !(-180.0..=180.0).contains(&self.east) {
            return Err(Error::invalid_filter()
                .with_message("bounding box longitudes must be between -180 and 180"));
        }

        if self.south > self.north {
            return Err(Error::invalid_filter().with_message("bounding box south exceeds north"));
        }

        if self.west > self.east {
            return Err(Error::invalid_filter().with_message("bounding box west exceeds east"));
        }

        Ok(())
    }

    /// Returns whether the given point lies inside the box (edges included).
    pub fn contains(&self, longitude: f64, latitude: f64) -> bool {
        (self.south..=self.north).contains(&latitude) && (self.west..=self.east).contains(&longitude)
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{},{}", self.south, self.west, self.north, self.east)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_uses_overpass_order() {
        let bbox = BoundingBox::new(37.7, -122.6, 37.85, -122.3);
        assert_eq!(bbox.to_string(), "37.7,-122.6,37.85,-122.3");
    }

    #[test]
    fn rejects_inverted_corners() {
        assert!(BoundingBox::try_new(38.0, -122.6, 37.0, -122.3).is_err());
        assert!(BoundingBox::try_new(37.0, -122.3, 38.0, -122.6).is_err());
        assert!(BoundingBox::try_new(-91.0, 0.0, 0.0, 1.0).is_err());
        assert!(BoundingBox::try_new(f64::NAN, 0.0, 0.0, 1.0).is_err());
    }

    #[test]
    fn contains_includes_edges() {
        let bbox = BoundingBox::from_array([37.7, -122.6, 37.85, -122.3]).unwrap();
        assert!(bbox.contains(-122.6, 37.7));
        assert!(bbox.contains(-122.45, 37.8));
        assert!(!bbox.contains(-122.2, 37.8));
    }
}
