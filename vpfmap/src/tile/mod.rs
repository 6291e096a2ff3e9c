//! Tile index and tile primitive storage.
//!
//! A library's `tileref` coverage maps tile ids to tile directory names
//! (`tileref.aft`) and bounding rectangles (`fbr`). Tile selection walks
//! this index; tile contents are loaded lazily and cached by the
//! selection table.

mod primitives;

pub use primitives::{AreaRecord, EdgeRecord, PointRecord, TextRecord, TileData};

use std::path::Path;

use tracing::warn;

use crate::coord::GeoRect;
use crate::error::DataError;
use crate::table::Storage;

/// One spatial partition of a coverage's data.
#[derive(Debug, Clone)]
pub struct Tile {
    pub id: i32,
    /// Directory name under each coverage directory.
    pub name: String,
    pub extent: GeoRect,
}

/// The tile index of one library, read from its `tileref` coverage.
#[derive(Debug, Clone)]
pub struct TileIndex {
    tiles: Vec<Tile>,
}

impl TileIndex {
    /// Load the tile index from a library's `tileref` directory.
    ///
    /// Joins `tileref.aft` (tile names) with `fbr` (bounding rectangles)
    /// by id; tiles missing a bounding rectangle are skipped with a
    /// warning.
    pub fn load(storage: &Storage, tileref_dir: &Path) -> Result<Self, DataError> {
        let aft = storage.open_table(&tileref_dir.join("tileref.aft"))?;
        let fbr = storage.open_table(&tileref_dir.join("fbr"))?;

        let (Some(aft_id), Some(aft_name)) =
            (aft.column_index("id"), aft.column_index("tile_name"))
        else {
            return Err(DataError::parse(
                "tileref.aft",
                "missing id/tile_name columns",
            ));
        };
        let (Some(fbr_id), Some(xmin), Some(ymin), Some(xmax), Some(ymax)) = (
            fbr.column_index("id"),
            fbr.column_index("xmin"),
            fbr.column_index("ymin"),
            fbr.column_index("xmax"),
            fbr.column_index("ymax"),
        ) else {
            return Err(DataError::parse("fbr", "missing bounding columns"));
        };

        let mut extents = std::collections::HashMap::new();
        for row in fbr.rows() {
            let (Some(id), Some(x0), Some(y0), Some(x1), Some(y1)) = (
                row.int(fbr_id),
                row.float(xmin),
                row.float(ymin),
                row.float(xmax),
                row.float(ymax),
            ) else {
                continue;
            };
            extents.insert(id, GeoRect::from_bounds(x0, y0, x1, y1));
        }

        let mut tiles = Vec::new();
        for row in aft.rows() {
            let (Some(id), Some(name)) = (row.int(aft_id), row.text(aft_name)) else {
                warn!("skipping tileref row with missing id/tile_name");
                continue;
            };
            let Some(extent) = extents.get(&id) else {
                warn!(tile_id = id, "tile without bounding rectangle, skipping");
                continue;
            };
            tiles.push(Tile {
                id,
                name: name.to_string(),
                extent: *extent,
            });
        }
        tiles.sort_by_key(|t| t.id);

        Ok(TileIndex { tiles })
    }

    /// All tiles, sorted by id.
    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    /// Tile with the given id.
    pub fn by_id(&self, id: i32) -> Option<&Tile> {
        self.tiles
            .binary_search_by_key(&id, |t| t.id)
            .ok()
            .map(|i| &self.tiles[i])
    }

    /// Tiles whose extent intersects the query rectangle, in id order.
    pub fn intersecting<'a>(&'a self, rect: &'a GeoRect) -> impl Iterator<Item = &'a Tile> {
        self.tiles.iter().filter(move |t| t.extent.intersects(rect))
    }
}
