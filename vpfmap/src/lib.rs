//! VPF (Vector Product Format, Mil-Std-2407) tile-selection and
//! feature-extraction pipeline.
//!
//! The pipeline reads a VPF database from disk, selects the tiles that
//! intersect a viewport, assembles feature geometry (polylines, polygons,
//! points, text) from the tile primitive tables, and projects it into
//! pixel space for rendering:
//!
//! 1. [`LibrarySelectionTable`] is built once from the database root
//!    paths and indexes libraries, coverages and tiles.
//! 2. A query feeds the records of the selected tiles (or, on the
//!    by-feature path, of the coverage's feature tables) into a
//!    [`GraphicWarehouse`], which builds [`GraphicPrimitive`] values in
//!    geographic coordinates.
//! 3. [`project`] maps the primitives through a caller-supplied
//!    [`MapProjection`] into [`ProjectedGraphic`] pixel-space output.
//!
//! [`VpfLayer`] wraps the three steps behind a configure/prepare facade
//! with an explicit lifecycle state.

pub mod config;
pub mod coord;
pub mod error;
pub mod feature;
pub mod graphics;
pub mod layer;
pub mod library;
pub mod logging;
pub mod table;
pub mod tile;
pub mod warehouse;

pub use config::VpfLayerConfig;
pub use coord::{GeoRect, LatLonPoint};
pub use error::{DataError, LayerError};
pub use feature::{FeatureType, FeatureTypeSet};
pub use graphics::{
    project, DrawingAttributes, GraphicPrimitive, MapProjection, ProjectedGraphic,
};
pub use layer::{LayerState, PreparedList, ViewportRequest, VpfLayer};
pub use library::{LibrarySelectionTable, QueryStatus, DEFAULT_BROWSE_CUTOFF};
pub use warehouse::{GraphicWarehouse, WarehouseMode};
