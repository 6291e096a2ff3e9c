//! Geographic coordinate types.
//!
//! Provides the latitude/longitude point and bounding rectangle used
//! throughout tile selection. Rectangles are expressed the way the query
//! interface receives them: an upper-left and a lower-right corner.
//! Antimeridian-crossing rectangles are not handled; comparisons are on
//! raw degree values, matching the behavior of the tile extents stored
//! in the data itself.

/// A geographic position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatLonPoint {
    /// Latitude in degrees, positive north.
    pub lat: f64,
    /// Longitude in degrees, positive east.
    pub lon: f64,
}

impl LatLonPoint {
    /// Create a new point.
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// An axis-aligned geographic rectangle.
///
/// Stored as the upper-left (north-west) and lower-right (south-east)
/// corners, the same shape the viewport hands to a query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoRect {
    pub upper_left: LatLonPoint,
    pub lower_right: LatLonPoint,
}

impl GeoRect {
    /// Create a rectangle from its two corners.
    pub fn new(upper_left: LatLonPoint, lower_right: LatLonPoint) -> Self {
        Self {
            upper_left,
            lower_right,
        }
    }

    /// Create a rectangle from the bounding columns stored in VPF tables
    /// (`xmin`/`ymin`/`xmax`/`ymax`, longitude first).
    pub fn from_bounds(xmin: f64, ymin: f64, xmax: f64, ymax: f64) -> Self {
        Self {
            upper_left: LatLonPoint::new(ymax, xmin),
            lower_right: LatLonPoint::new(ymin, xmax),
        }
    }

    /// Northern edge latitude.
    pub fn north(&self) -> f64 {
        self.upper_left.lat
    }

    /// Southern edge latitude.
    pub fn south(&self) -> f64 {
        self.lower_right.lat
    }

    /// Western edge longitude.
    pub fn west(&self) -> f64 {
        self.upper_left.lon
    }

    /// Eastern edge longitude.
    pub fn east(&self) -> f64 {
        self.lower_right.lon
    }

    /// Whether two rectangles overlap (edge contact counts as overlap).
    pub fn intersects(&self, other: &GeoRect) -> bool {
        self.west() <= other.east()
            && other.west() <= self.east()
            && self.south() <= other.north()
            && other.south() <= self.north()
    }

    /// Whether a point lies inside the rectangle (edges inclusive).
    pub fn contains(&self, point: &LatLonPoint) -> bool {
        point.lat >= self.south()
            && point.lat <= self.north()
            && point.lon >= self.west()
            && point.lon <= self.east()
    }

    /// Smallest rectangle enclosing a vertex run.
    ///
    /// Returns `None` for an empty slice.
    pub fn bounding(points: &[LatLonPoint]) -> Option<GeoRect> {
        let first = points.first()?;
        let mut north = first.lat;
        let mut south = first.lat;
        let mut west = first.lon;
        let mut east = first.lon;
        for p in &points[1..] {
            north = north.max(p.lat);
            south = south.min(p.lat);
            west = west.min(p.lon);
            east = east.max(p.lon);
        }
        Some(GeoRect::from_bounds(west, south, east, north))
    }
}
