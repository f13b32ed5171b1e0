//! Geographic bounding box of the current map view.

use serde::{Deserialize, Serialize};

use crate::{FloodwatchError, FloodwatchResult};

/// A geographic bounding box in EPSG:4326 degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl BoundingBox {
    /// Create a new bounding box from its edges.
    pub fn new(west: f64, south: f64, east: f64, north: f64) -> Self {
        Self {
            west,
            south,
            east,
            north,
        }
    }

    /// Parse a WMS 1.1 BBOX parameter string: "west,south,east,north"
    pub fn from_wms_string(s: &str) -> FloodwatchResult<Self> {
        let parts: Vec<&str> = s.split(',').collect();
        if parts.len() != 4 {
            return Err(FloodwatchError::InvalidBbox(format!(
                "{}. Expected 'west,south,east,north'",
                s
            )));
        }

        let mut edges = [0.0f64; 4];
        for (edge, part) in edges.iter_mut().zip(&parts) {
            *edge = part
                .parse()
                .map_err(|_| FloodwatchError::InvalidBbox(format!("invalid number '{}'", part)))?;
        }

        let bbox = Self::new(edges[0], edges[1], edges[2], edges[3]);
        bbox.validate()?;
        Ok(bbox)
    }

    /// Format as the WMS BBOX parameter, in `west,south,east,north` order.
    pub fn to_wms_string(&self) -> String {
        format!("{},{},{},{}", self.west, self.south, self.east, self.north)
    }

    /// Reject inverted or non-finite boxes.
    pub fn validate(&self) -> FloodwatchResult<()> {
        let finite = [self.west, self.south, self.east, self.north]
            .iter()
            .all(|v| v.is_finite());
        if !finite {
            return Err(FloodwatchError::InvalidBbox(
                "coordinates must be finite".to_string(),
            ));
        }
        if self.west >= self.east || self.south >= self.north {
            return Err(FloodwatchError::InvalidBbox(format!(
                "inverted box {}",
                self.to_wms_string()
            )));
        }
        Ok(())
    }

    /// Longitudinal extent in degrees.
    pub fn width(&self) -> f64 {
        self.east - self.west
    }

    /// Latitudinal extent in degrees.
    pub fn height(&self) -> f64 {
        self.north - self.south
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_wms_bbox() {
        let bbox = BoundingBox::from_wms_string("21.8,-4.7,51.4,23.0").unwrap();
        assert_eq!(bbox.west, 21.8);
        assert_eq!(bbox.south, -4.7);
        assert_eq!(bbox.east, 51.4);
        assert_eq!(bbox.north, 23.0);
    }

    #[test]
    fn test_wms_string_order() {
        let bbox = BoundingBox::new(30.0, -2.5, 42.0, 5.0);
        assert_eq!(bbox.to_wms_string(), "30,-2.5,42,5");
    }
}
