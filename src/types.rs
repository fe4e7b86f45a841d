//! Geographic and screen coordinate types shared by commands and events

use serde::{Deserialize, Serialize};

/// Geographic coordinate in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LngLat {
    /// Longitude
    pub lng: f64,
    /// Latitude
    pub lat: f64,
}

impl LngLat {
    /// Create a coordinate from longitude and latitude
    pub fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }

    /// Whether both components are finite numbers
    pub fn is_finite(&self) -> bool {
        self.lng.is_finite() && self.lat.is_finite()
    }
}

/// Point in screen pixels relative to the map container
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreenPoint {
    /// Horizontal offset
    pub x: f64,
    /// Vertical offset
    pub y: f64,
}

impl ScreenPoint {
    /// Create a screen point
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Geographic bounding box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LngLatBounds {
    /// Western longitude
    pub west: f64,
    /// Southern latitude
    pub south: f64,
    /// Eastern longitude
    pub east: f64,
    /// Northern latitude
    pub north: f64,
}

impl LngLatBounds {
    /// South-west corner
    pub fn south_west(&self) -> LngLat {
        LngLat::new(self.west, self.south)
    }

    /// North-east corner
    pub fn north_east(&self) -> LngLat {
        LngLat::new(self.east, self.north)
    }
}
