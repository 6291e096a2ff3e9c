//! Library selection table and the tile/feature query engine.
//!
//! The selection table is the long-lived entry point of the pipeline. It
//! is built once from one or more VPF root paths, holds the per-library
//! coverage and tile indexes, and answers viewport queries by feeding
//! feature records to a caller-supplied warehouse. Tile primitive data is
//! loaded lazily and cached for the lifetime of the table.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use tracing::{debug, warn};

use crate::coord::{GeoRect, LatLonPoint};
use crate::error::DataError;
use crate::feature::{
    discover_feature_tables, primitive_column, FeatureTableKind, FeatureType,
};
use crate::table::Storage;
use crate::tile::{TileData, TileIndex};
use crate::warehouse::GraphicWarehouse;

/// Default cutoff scale: queries zoomed out beyond 1:30,000,000 are
/// suppressed rather than flooding the map with browse-level detail.
pub const DEFAULT_BROWSE_CUTOFF: u32 = 30_000_000;

/// Outcome of a query cycle.
///
/// `Suppressed` is a success value: the query was declined by the cutoff
/// scale before any storage was touched, which is distinct from a query
/// that ran and simply found nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStatus {
    Completed,
    Suppressed,
}

/// One library found under a VPF root path.
#[derive(Debug)]
pub struct VpfLibrary {
    name: String,
    path: PathBuf,
    extent: GeoRect,
    coverages: Vec<String>,
    tile_index: Option<TileIndex>,
}

impl VpfLibrary {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn extent(&self) -> &GeoRect {
        &self.extent
    }

    /// Coverage codes present in this library, sorted.
    pub fn coverages(&self) -> &[String] {
        &self.coverages
    }

    /// Whether the library partitions its coverages into tiles.
    pub fn is_tiled(&self) -> bool {
        self.tile_index.is_some()
    }
}

/// Primitive ids referenced by a coverage's feature tables, grouped by
/// geometry kind and owning tile.
///
/// Tile primitive tables can hold rows no feature row points at (ring
/// boundary edges in particular); only referenced primitives are part of
/// the coverage's feature set, on either query path.
#[derive(Debug, Default)]
struct FeatureRefs {
    refs: HashMap<FeatureType, HashMap<Option<i32>, HashSet<i32>>>,
}

impl FeatureRefs {
    fn insert(&mut self, feature_type: FeatureType, tile: Option<i32>, id: i32) {
        self.refs
            .entry(feature_type)
            .or_default()
            .entry(tile)
            .or_default()
            .insert(id);
    }

    fn contains(&self, feature_type: FeatureType, tile: Option<i32>, id: i32) -> bool {
        self.refs
            .get(&feature_type)
            .and_then(|by_tile| by_tile.get(&tile))
            .is_some_and(|ids| ids.contains(&id))
    }
}

/// The library selection table: per-database index plus query engine.
#[derive(Debug)]
pub struct LibrarySelectionTable {
    database_name: String,
    libraries: Vec<VpfLibrary>,
    cutoff_scale: u32,
    storage: Storage,
    tile_cache: DashMap<PathBuf, Arc<TileData>>,
    ref_cache: DashMap<PathBuf, Arc<FeatureRefs>>,
}

impl LibrarySelectionTable {
    /// Build the selection table by scanning `paths` for VPF roots.
    ///
    /// A root is a directory containing a library attribute table (`lat`,
    /// or `lat.` as written by some producers). A root whose `lat` cannot
    /// be parsed is skipped with a warning; the remaining roots are still
    /// indexed. Fails only when no root is usable: with the first parse
    /// error when one occurred, with [`DataError::InvalidPath`] when no
    /// path had a `lat` at all.
    pub fn new(paths: &[PathBuf]) -> Result<Self, DataError> {
        let storage = Storage::new();
        let mut libraries = Vec::new();
        let mut database_name = String::new();
        let mut any_root = false;
        let mut first_error: Option<DataError> = None;

        for root in paths {
            let Some(lat_path) = find_lat(root) else {
                debug!(root = %root.display(), "no library attribute table, skipping path");
                continue;
            };

            match read_lat(&storage, &lat_path, root) {
                Ok(found) => {
                    any_root = true;
                    libraries.extend(found);
                    if database_name.is_empty() {
                        database_name = read_database_name(&storage, root);
                    }
                }
                Err(err) => {
                    warn!(root = %root.display(), %err, "unreadable library attribute table, skipping root");
                    first_error.get_or_insert(err);
                }
            }
        }

        if !any_root {
            return Err(match first_error {
                Some(err) => err,
                None => DataError::InvalidPath(paths.to_vec()),
            });
        }

        debug!(
            database = %database_name,
            libraries = libraries.len(),
            "selection table initialized"
        );
        Ok(Self {
            database_name,
            libraries,
            cutoff_scale: DEFAULT_BROWSE_CUTOFF,
            storage,
            tile_cache: DashMap::new(),
            ref_cache: DashMap::new(),
        })
    }

    /// Database name from the database header table, empty if absent.
    ///
    /// The name `DCW` selects the Digital Chart of the World warehouse
    /// defaults.
    pub fn database_name(&self) -> &str {
        &self.database_name
    }

    pub fn cutoff_scale(&self) -> u32 {
        self.cutoff_scale
    }

    pub fn set_cutoff_scale(&mut self, cutoff: u32) {
        self.cutoff_scale = cutoff;
    }

    /// Libraries in scan order.
    pub fn libraries(&self) -> &[VpfLibrary] {
        &self.libraries
    }

    /// Coverage codes of one library by name.
    pub fn coverages(&self, library: &str) -> Option<&[String]> {
        self.libraries
            .iter()
            .find(|l| l.name == library)
            .map(|l| l.coverages.as_slice())
    }

    /// Number of table files opened since construction.
    ///
    /// Monotonically increasing; a suppressed query leaves it unchanged.
    pub fn storage_reads(&self) -> u64 {
        self.storage.reads()
    }

    /// Query by tile: select intersecting tiles, feed the primitives the
    /// coverage's feature tables reference, filtered to the feature types
    /// the warehouse currently accepts.
    ///
    /// Records arrive in tile order (tile id ascending), then record order
    /// within each tile, which makes results deterministic for a fixed
    /// dataset.
    #[allow(clippy::too_many_arguments)]
    pub fn query_by_tile(
        &self,
        scale: u32,
        width_px: u32,
        height_px: u32,
        coverage: &str,
        warehouse: &mut GraphicWarehouse,
        upper_left: LatLonPoint,
        lower_right: LatLonPoint,
    ) -> Result<QueryStatus, DataError> {
        if scale > self.cutoff_scale {
            debug!(scale, cutoff = self.cutoff_scale, "query suppressed by cutoff scale");
            return Ok(QueryStatus::Suppressed);
        }
        let rect = GeoRect::new(upper_left, lower_right);
        debug!(scale, width_px, height_px, coverage, "tile query");

        let mut coverage_seen = false;
        for library in &self.libraries {
            if !library.extent.intersects(&rect) {
                continue;
            }
            if !library.coverages.iter().any(|c| c == coverage) {
                continue;
            }
            coverage_seen = true;
            let coverage_dir = library.path.join(coverage);
            let refs = self.feature_refs(&coverage_dir);

            match &library.tile_index {
                Some(index) => {
                    for tile in index.intersecting(&rect) {
                        let data = self.tile_data(&coverage_dir.join(&tile.name));
                        feed_referenced(&data, &refs, Some(tile.id), warehouse);
                    }
                }
                // Untiled library: the coverage directory is the single
                // partition, bounded by the library extent.
                None => {
                    let data = self.tile_data(&coverage_dir);
                    feed_referenced(&data, &refs, None, warehouse);
                }
            }
        }

        if !coverage_seen {
            warn!(coverage, "coverage not present in any intersecting library");
        }
        Ok(QueryStatus::Completed)
    }

    /// Query by feature: walk the coverage's feature tables directly,
    /// resolve each row's primitive and test it against the bounds.
    ///
    /// Fallback for coverages whose features are scattered across many
    /// tiles; touches every feature row, so it is the slower path.
    #[allow(clippy::too_many_arguments)]
    pub fn query_by_feature(
        &self,
        scale: u32,
        width_px: u32,
        height_px: u32,
        coverage: &str,
        warehouse: &mut GraphicWarehouse,
        upper_left: LatLonPoint,
        lower_right: LatLonPoint,
    ) -> Result<QueryStatus, DataError> {
        if scale > self.cutoff_scale {
            debug!(scale, cutoff = self.cutoff_scale, "query suppressed by cutoff scale");
            return Ok(QueryStatus::Suppressed);
        }
        let rect = GeoRect::new(upper_left, lower_right);
        debug!(scale, width_px, height_px, coverage, "feature query");

        let mut coverage_seen = false;
        for library in &self.libraries {
            if !library.extent.intersects(&rect) {
                continue;
            }
            if !library.coverages.iter().any(|c| c == coverage) {
                continue;
            }
            coverage_seen = true;
            let coverage_dir = library.path.join(coverage);

            for info in discover_feature_tables(&coverage_dir) {
                if !kind_wanted(info.kind, warehouse) {
                    continue;
                }
                let table = match self.storage.open_table(&info.path) {
                    Ok(table) => table,
                    Err(err) => {
                        warn!(table = %info.path.display(), %err, "unreadable feature table");
                        continue;
                    }
                };
                let Some((prim_col, feature_type)) = primitive_column(&table) else {
                    warn!(table = %info.path.display(), "no primitive reference column");
                    continue;
                };
                if !warehouse.accepts(feature_type) {
                    continue;
                }
                let tile_col = table.column_index("tile_id");

                for row in table.rows() {
                    let Some(prim_id) = row.int(prim_col) else {
                        continue;
                    };
                    let Some(tile_dir) =
                        self.resolve_tile_dir(library, &coverage_dir, tile_col.and_then(|c| row.int(c)))
                    else {
                        continue;
                    };
                    let data = self.tile_data(&tile_dir);
                    feed_if_within(&data, feature_type, prim_id, &rect, warehouse);
                }
            }
        }

        if !coverage_seen {
            warn!(coverage, "coverage not present in any intersecting library");
        }
        Ok(QueryStatus::Completed)
    }

    /// Directory holding the primitives a feature row points into.
    fn resolve_tile_dir(
        &self,
        library: &VpfLibrary,
        coverage_dir: &Path,
        tile_id: Option<i32>,
    ) -> Option<PathBuf> {
        match (&library.tile_index, tile_id) {
            (Some(index), Some(id)) => match index.by_id(id) {
                Some(tile) => Some(coverage_dir.join(&tile.name)),
                None => {
                    warn!(tile_id = id, "feature row references unknown tile");
                    None
                }
            },
            // No index, or no tile_id column: primitives live in the
            // coverage directory itself.
            _ => Some(coverage_dir.to_path_buf()),
        }
    }

    /// Primitive references of a coverage's feature tables, once per
    /// session.
    ///
    /// Indexes every feature table regardless of the current warehouse
    /// flags, so one cache entry serves any type selection.
    fn feature_refs(&self, coverage_dir: &Path) -> Arc<FeatureRefs> {
        self.ref_cache
            .entry(coverage_dir.to_path_buf())
            .or_insert_with(|| {
                let mut refs = FeatureRefs::default();
                for info in discover_feature_tables(coverage_dir) {
                    let table = match self.storage.open_table(&info.path) {
                        Ok(table) => table,
                        Err(err) => {
                            warn!(table = %info.path.display(), %err, "unreadable feature table");
                            continue;
                        }
                    };
                    let Some((prim_col, feature_type)) = primitive_column(&table) else {
                        warn!(table = %info.path.display(), "no primitive reference column");
                        continue;
                    };
                    let tile_col = table.column_index("tile_id");
                    for row in table.rows() {
                        if let Some(id) = row.int(prim_col) {
                            refs.insert(feature_type, tile_col.and_then(|c| row.int(c)), id);
                        }
                    }
                }
                Arc::new(refs)
            })
            .clone()
    }

    /// Load a tile directory's primitives, once per session.
    ///
    /// The cache entry is populated under the map's entry lock, so
    /// concurrent queries for the same tile perform a single load.
    fn tile_data(&self, dir: &Path) -> Arc<TileData> {
        self.tile_cache
            .entry(dir.to_path_buf())
            .or_insert_with(|| Arc::new(TileData::load(&self.storage, dir)))
            .clone()
    }
}

/// Whether a feature table of `kind` can contribute anything the
/// warehouse accepts, checked before the table is opened.
fn kind_wanted(kind: FeatureTableKind, warehouse: &GraphicWarehouse) -> bool {
    match kind {
        FeatureTableKind::Line => warehouse.accepts(FeatureType::Edge),
        FeatureTableKind::Area => warehouse.accepts(FeatureType::Area),
        FeatureTableKind::Point => {
            warehouse.accepts(FeatureType::EPoint) || warehouse.accepts(FeatureType::CPoint)
        }
        FeatureTableKind::Text => warehouse.accepts(FeatureType::Text),
    }
}

/// Feed a tile's feature-referenced records to the warehouse (tile-order
/// path). `tile` is the tile id the coverage's feature rows carry, `None`
/// for untiled coverages.
fn feed_referenced(
    data: &TileData,
    refs: &FeatureRefs,
    tile: Option<i32>,
    warehouse: &mut GraphicWarehouse,
) {
    if warehouse.accepts(FeatureType::Edge) {
        for record in data.edges() {
            if refs.contains(FeatureType::Edge, tile, record.id) {
                warehouse.receive_edge(record);
            }
        }
    }
    if warehouse.accepts(FeatureType::Area) {
        for record in data.areas() {
            if refs.contains(FeatureType::Area, tile, record.id) {
                warehouse.receive_area(record);
            }
        }
    }
    if warehouse.accepts(FeatureType::EPoint) {
        for record in data.entity_points() {
            if refs.contains(FeatureType::EPoint, tile, record.id) {
                warehouse.receive_epoint(record);
            }
        }
    }
    if warehouse.accepts(FeatureType::CPoint) {
        for record in data.connected_points() {
            if refs.contains(FeatureType::CPoint, tile, record.id) {
                warehouse.receive_cpoint(record);
            }
        }
    }
    if warehouse.accepts(FeatureType::Text) {
        for record in data.texts() {
            if refs.contains(FeatureType::Text, tile, record.id) {
                warehouse.receive_text(record);
            }
        }
    }
}

/// Feed one resolved primitive if its geometry touches the query rect
/// (feature-order path).
fn feed_if_within(
    data: &TileData,
    feature_type: FeatureType,
    prim_id: i32,
    rect: &GeoRect,
    warehouse: &mut GraphicWarehouse,
) {
    match feature_type {
        FeatureType::Edge => {
            if let Some(record) = data.edge(prim_id) {
                if GeoRect::bounding(&record.vertices)
                    .is_some_and(|b| b.intersects(rect))
                {
                    warehouse.receive_edge(record);
                }
            }
        }
        FeatureType::Area => {
            if let Some(record) = data.area(prim_id) {
                let touches = record.rings.iter().any(|ring| {
                    GeoRect::bounding(ring).is_some_and(|b| b.intersects(rect))
                });
                if touches {
                    warehouse.receive_area(record);
                }
            }
        }
        FeatureType::EPoint => {
            if let Some(record) = data.entity_point(prim_id) {
                if rect.contains(&record.position) {
                    warehouse.receive_epoint(record);
                }
            }
        }
        FeatureType::CPoint => {
            if let Some(record) = data.connected_point(prim_id) {
                if rect.contains(&record.position) {
                    warehouse.receive_cpoint(record);
                }
            }
        }
        FeatureType::Text => {
            if let Some(record) = data.text(prim_id) {
                if rect.contains(&record.position) {
                    warehouse.receive_text(record);
                }
            }
        }
    }
}

/// Locate the library attribute table under a candidate root.
fn find_lat(root: &Path) -> Option<PathBuf> {
    for name in ["lat", "lat."] {
        let candidate = root.join(name);
        if candidate.is_file() {
            return Some(candidate);
        }
    }
    None
}

/// Read the library attribute table: one library per row.
fn read_lat(
    storage: &Storage,
    lat_path: &Path,
    root: &Path,
) -> Result<Vec<VpfLibrary>, DataError> {
    let lat = storage.open_table(lat_path)?;
    let (Some(name_col), Some(xmin), Some(ymin), Some(xmax), Some(ymax)) = (
        lat.column_index("library_name"),
        lat.column_index("xmin"),
        lat.column_index("ymin"),
        lat.column_index("xmax"),
        lat.column_index("ymax"),
    ) else {
        return Err(DataError::parse("lat", "missing library_name/bounding columns"));
    };

    let mut libraries = Vec::new();
    for row in lat.rows() {
        let (Some(name), Some(x0), Some(y0), Some(x1), Some(y1)) = (
            row.text(name_col),
            row.float(xmin),
            row.float(ymin),
            row.float(xmax),
            row.float(ymax),
        ) else {
            warn!("skipping lat row with missing fields");
            continue;
        };
        let Some(path) = library_dir(root, name) else {
            warn!(library = name, "library directory not found under root");
            continue;
        };

        let coverages = match read_coverages(storage, &path) {
            Ok(coverages) => coverages,
            Err(err) => {
                warn!(library = name, %err, "unreadable coverage table, skipping library");
                continue;
            }
        };
        let tile_index = match TileIndex::load(storage, &path.join("tileref")) {
            Ok(index) => Some(index),
            Err(DataError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(err) => {
                // Keep the library usable as untiled so partial datasets
                // still render.
                warn!(library = name, %err, "unreadable tile index, treating as untiled");
                None
            }
        };

        libraries.push(VpfLibrary {
            name: name.to_string(),
            path,
            extent: GeoRect::from_bounds(x0, y0, x1, y1),
            coverages,
            tile_index,
        });
    }
    Ok(libraries)
}

/// Resolve a library name to its directory, tolerating the case mismatch
/// between attribute tables (often upper-case) and directories on disk.
fn library_dir(root: &Path, name: &str) -> Option<PathBuf> {
    for candidate in [name.to_string(), name.to_lowercase()] {
        let dir = root.join(&candidate);
        if dir.is_dir() {
            return Some(dir);
        }
    }
    None
}

/// Read the coverage attribute table of one library, sorted by code.
fn read_coverages(storage: &Storage, library_dir: &Path) -> Result<Vec<String>, DataError> {
    let cat = storage.open_table(&library_dir.join("cat"))?;
    let Some(name_col) = cat.column_index("coverage_name") else {
        return Err(DataError::parse("cat", "missing coverage_name column"));
    };

    let mut coverages: Vec<String> = cat
        .rows()
        .filter_map(|row| row.text(name_col).map(str::to_string))
        .collect();
    coverages.sort();
    Ok(coverages)
}

/// Read the database name from the root `dht` table, if present.
fn read_database_name(storage: &Storage, root: &Path) -> String {
    let dht = match storage.open_table(&root.join("dht")) {
        Ok(table) => table,
        Err(_) => return String::new(),
    };
    let Some(name_col) = dht.column_index("database_name") else {
        return String::new();
    };
    dht.rows()
        .next()
        .and_then(|row| row.text(name_col).map(str::to_string))
        .unwrap_or_default()
}
