//! Graphic warehouse: turns feature records into graphic primitives.
//!
//! The warehouse is the sink the query engine feeds. It accumulates
//! primitives under the current per-feature-type enable flags and
//! drawing attributes. One warehouse serves exactly one in-flight query;
//! callers must `clear()` before each query cycle or results accumulate
//! across cycles.
//!
//! The variant is a `WarehouseMode` chosen once at construction. The
//! modes share all behavior and differ only in their defaults - DCW data
//! carries coarser feature classing, so the DCW mode starts with points
//! and text off.

use crate::feature::{FeatureType, FeatureTypeSet};
use crate::graphics::{DrawingAttributes, GraphicPrimitive};
use crate::tile::{AreaRecord, EdgeRecord, PointRecord, TextRecord};

/// Warehouse variant, fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarehouseMode {
    /// Fed in tile iteration order (the default search strategy).
    TileOrder,
    /// Fed in feature-table order (the by-feature fallback strategy).
    FeatureOrder,
    /// Digital Chart of the World defaults: coarser feature classing,
    /// edges and areas only.
    Dcw,
}

/// Accumulates graphic primitives for one query cycle.
#[derive(Debug)]
pub struct GraphicWarehouse {
    mode: WarehouseMode,
    attributes: DrawingAttributes,
    draw_edges: bool,
    draw_areas: bool,
    draw_epoints: bool,
    draw_cpoints: bool,
    draw_texts: bool,
    graphics: Vec<GraphicPrimitive>,
}

impl GraphicWarehouse {
    pub fn new(mode: WarehouseMode) -> Self {
        let coarse = matches!(mode, WarehouseMode::Dcw);
        Self {
            mode,
            attributes: DrawingAttributes::default(),
            draw_edges: true,
            draw_areas: true,
            draw_epoints: !coarse,
            draw_cpoints: !coarse,
            draw_texts: !coarse,
            graphics: Vec::new(),
        }
    }

    pub fn mode(&self) -> WarehouseMode {
        self.mode
    }

    /// Drop all accumulated primitives.
    ///
    /// Must be called before each new query cycle.
    pub fn clear(&mut self) {
        self.graphics.clear();
    }

    pub fn set_drawing_attributes(&mut self, attributes: DrawingAttributes) {
        self.attributes = attributes;
    }

    pub fn drawing_attributes(&self) -> DrawingAttributes {
        self.attributes
    }

    /// Enable exactly the feature types in `set`, disabling the rest.
    pub fn set_features(&mut self, set: FeatureTypeSet) {
        self.draw_edges = set.contains(FeatureType::Edge);
        self.draw_areas = set.contains(FeatureType::Area);
        self.draw_epoints = set.contains(FeatureType::EPoint);
        self.draw_cpoints = set.contains(FeatureType::CPoint);
        self.draw_texts = set.contains(FeatureType::Text);
    }

    pub fn set_edge_features(&mut self, enabled: bool) {
        self.draw_edges = enabled;
    }

    pub fn draw_edge_features(&self) -> bool {
        self.draw_edges
    }

    pub fn set_area_features(&mut self, enabled: bool) {
        self.draw_areas = enabled;
    }

    pub fn draw_area_features(&self) -> bool {
        self.draw_areas
    }

    pub fn set_epoint_features(&mut self, enabled: bool) {
        self.draw_epoints = enabled;
    }

    pub fn draw_epoint_features(&self) -> bool {
        self.draw_epoints
    }

    pub fn set_cpoint_features(&mut self, enabled: bool) {
        self.draw_cpoints = enabled;
    }

    pub fn draw_cpoint_features(&self) -> bool {
        self.draw_cpoints
    }

    pub fn set_text_features(&mut self, enabled: bool) {
        self.draw_texts = enabled;
    }

    pub fn draw_text_features(&self) -> bool {
        self.draw_texts
    }

    /// Whether the warehouse currently accepts a geometry kind.
    pub fn accepts(&self, feature_type: FeatureType) -> bool {
        match feature_type {
            FeatureType::Edge => self.draw_edges,
            FeatureType::Area => self.draw_areas,
            FeatureType::EPoint => self.draw_epoints,
            FeatureType::CPoint => self.draw_cpoints,
            FeatureType::Text => self.draw_texts,
        }
    }

    pub fn receive_edge(&mut self, record: &EdgeRecord) {
        if !self.draw_edges {
            return;
        }
        self.graphics.push(GraphicPrimitive::Polyline {
            vertices: record.vertices.clone(),
            attributes: self.attributes,
        });
    }

    pub fn receive_area(&mut self, record: &AreaRecord) {
        if !self.draw_areas {
            return;
        }
        self.graphics.push(GraphicPrimitive::Polygon {
            rings: record.rings.clone(),
            attributes: self.attributes,
        });
    }

    pub fn receive_epoint(&mut self, record: &PointRecord) {
        if !self.draw_epoints {
            return;
        }
        self.graphics.push(GraphicPrimitive::Point {
            position: record.position,
            attributes: self.attributes,
        });
    }

    pub fn receive_cpoint(&mut self, record: &PointRecord) {
        if !self.draw_cpoints {
            return;
        }
        self.graphics.push(GraphicPrimitive::Point {
            position: record.position,
            attributes: self.attributes,
        });
    }

    pub fn receive_text(&mut self, record: &TextRecord) {
        if !self.draw_texts {
            return;
        }
        self.graphics.push(GraphicPrimitive::Text {
            position: record.position,
            text: record.text.clone(),
            attributes: self.attributes,
        });
    }

    /// Accumulated primitives in discovery order.
    pub fn graphics(&self) -> &[GraphicPrimitive] {
        &self.graphics
    }
}
