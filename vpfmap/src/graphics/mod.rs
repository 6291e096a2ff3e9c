//! Graphic primitives and the projection step.
//!
//! The warehouse builds `GraphicPrimitive` values carrying raw geographic
//! coordinates. Pixel coordinates exist only in the separate
//! `ProjectedGraphic` type, produced by an explicit projection pass, so a
//! primitive can never be projected twice by accident.

use crate::coord::LatLonPoint;

/// Drawing attributes applied uniformly to every primitive built for a
/// feature class.
///
/// Colors are packed ARGB words (`FF000000` is opaque black).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawingAttributes {
    pub line_color: u32,
    pub fill_color: u32,
    pub line_width: f32,
}

impl Default for DrawingAttributes {
    fn default() -> Self {
        // Black lines, clear fill, hairline width.
        Self {
            line_color: 0xFF00_0000,
            fill_color: 0x0000_0000,
            line_width: 1.0,
        }
    }
}

impl DrawingAttributes {
    pub fn with_line_color(mut self, argb: u32) -> Self {
        self.line_color = argb;
        self
    }

    pub fn with_fill_color(mut self, argb: u32) -> Self {
        self.fill_color = argb;
        self
    }

    pub fn with_line_width(mut self, width: f32) -> Self {
        self.line_width = width;
        self
    }
}

/// A graphic primitive in geographic coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum GraphicPrimitive {
    Polyline {
        vertices: Vec<LatLonPoint>,
        attributes: DrawingAttributes,
    },
    Polygon {
        /// Outer ring first, in the vertex order read from storage.
        rings: Vec<Vec<LatLonPoint>>,
        attributes: DrawingAttributes,
    },
    Point {
        position: LatLonPoint,
        attributes: DrawingAttributes,
    },
    Text {
        position: LatLonPoint,
        text: String,
        attributes: DrawingAttributes,
    },
}

impl GraphicPrimitive {
    pub fn is_polyline(&self) -> bool {
        matches!(self, GraphicPrimitive::Polyline { .. })
    }

    pub fn is_polygon(&self) -> bool {
        matches!(self, GraphicPrimitive::Polygon { .. })
    }

    pub fn is_point(&self) -> bool {
        matches!(self, GraphicPrimitive::Point { .. })
    }

    pub fn is_text(&self) -> bool {
        matches!(self, GraphicPrimitive::Text { .. })
    }
}

/// Caller-supplied projection from geographic to viewport pixel space.
///
/// The caller owns the viewport bounds, scale and pixel dimensions; the
/// core only applies the mapping uniformly over every vertex.
pub trait MapProjection {
    fn forward(&self, point: &LatLonPoint) -> (f32, f32);
}

/// A graphic primitive in viewport pixel coordinates, ready to render.
#[derive(Debug, Clone, PartialEq)]
pub enum ProjectedGraphic {
    Polyline {
        points: Vec<(f32, f32)>,
        attributes: DrawingAttributes,
    },
    Polygon {
        rings: Vec<Vec<(f32, f32)>>,
        attributes: DrawingAttributes,
    },
    Point {
        point: (f32, f32),
        attributes: DrawingAttributes,
    },
    Text {
        point: (f32, f32),
        text: String,
        attributes: DrawingAttributes,
    },
}

/// Project every primitive into pixel space.
///
/// Vertex order is preserved exactly, which keeps polygon winding intact
/// under any orientation-preserving projection.
pub fn project(primitives: &[GraphicPrimitive], projection: &dyn MapProjection) -> Vec<ProjectedGraphic> {
    primitives
        .iter()
        .map(|primitive| match primitive {
            GraphicPrimitive::Polyline {
                vertices,
                attributes,
            } => ProjectedGraphic::Polyline {
                points: vertices.iter().map(|v| projection.forward(v)).collect(),
                attributes: *attributes,
            },
            GraphicPrimitive::Polygon { rings, attributes } => ProjectedGraphic::Polygon {
                rings: rings
                    .iter()
                    .map(|ring| ring.iter().map(|v| projection.forward(v)).collect())
                    .collect(),
                attributes: *attributes,
            },
            GraphicPrimitive::Point {
                position,
                attributes,
            } => ProjectedGraphic::Point {
                point: projection.forward(position),
                attributes: *attributes,
            },
            GraphicPrimitive::Text {
                position,
                text,
                attributes,
            } => ProjectedGraphic::Text {
                point: projection.forward(position),
                text: text.clone(),
                attributes: *attributes,
            },
        })
        .collect()
}
