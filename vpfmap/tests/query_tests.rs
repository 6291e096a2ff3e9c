//! End-to-end query tests against on-disk VPF fixtures.

mod common;

use std::path::PathBuf;

use tempfile::TempDir;
use vpfmap::{
    DataError, FeatureType, FeatureTypeSet, GraphicPrimitive, GraphicWarehouse, LatLonPoint,
    MapProjection, LibrarySelectionTable, ProjectedGraphic, QueryStatus, ViewportRequest,
    VpfLayer, VpfLayerConfig, WarehouseMode,
};

use common::{add_orphan_edge, write_dht, write_tiled_dataset, write_untiled_dataset, SQUARE};

fn tiled_dataset() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    write_tiled_dataset(dir.path());
    dir
}

fn lst_for(dir: &TempDir) -> LibrarySelectionTable {
    LibrarySelectionTable::new(&[dir.path().to_path_buf()]).unwrap()
}

fn full_view() -> (LatLonPoint, LatLonPoint) {
    (LatLonPoint::new(10.0, 0.0), LatLonPoint::new(0.0, 10.0))
}

fn query_tile(lst: &LibrarySelectionTable, warehouse: &mut GraphicWarehouse) -> QueryStatus {
    let (ul, lr) = full_view();
    lst.query_by_tile(500_000, 800, 600, "po", warehouse, ul, lr)
        .unwrap()
}

fn query_feature(lst: &LibrarySelectionTable, warehouse: &mut GraphicWarehouse) -> QueryStatus {
    let (ul, lr) = full_view();
    lst.query_by_feature(500_000, 800, 600, "po", warehouse, ul, lr)
        .unwrap()
}

/// Multiset view of a graphics list, for order-insensitive comparison.
fn sorted_debug(graphics: &[GraphicPrimitive]) -> Vec<String> {
    let mut repr: Vec<String> = graphics.iter().map(|g| format!("{:?}", g)).collect();
    repr.sort();
    repr
}

#[test]
fn test_init_indexes_database() {
    let dir = tiled_dataset();
    let lst = lst_for(&dir);

    assert_eq!(lst.database_name(), "VMAPLV0");
    assert_eq!(lst.libraries().len(), 1);
    let library = &lst.libraries()[0];
    assert_eq!(library.name(), "lib");
    assert!(library.is_tiled());
    assert_eq!(lst.coverages("lib"), Some(&["po".to_string()][..]));
}

#[test]
fn test_init_rejects_dataless_directory() {
    let dir = tempfile::tempdir().unwrap();
    assert!(LibrarySelectionTable::new(&[dir.path().to_path_buf()]).is_err());
}

#[test]
fn test_corrupt_root_does_not_block_valid_root() {
    let bad = tempfile::tempdir().unwrap();
    std::fs::write(bad.path().join("lat"), b"not a vpf table").unwrap();
    let good = tiled_dataset();

    let lst = LibrarySelectionTable::new(&[
        bad.path().to_path_buf(),
        good.path().to_path_buf(),
    ])
    .unwrap();
    assert_eq!(lst.libraries().len(), 1);
    assert_eq!(lst.database_name(), "VMAPLV0");
}

#[test]
fn test_all_roots_corrupt_is_fatal() {
    let bad = tempfile::tempdir().unwrap();
    std::fs::write(bad.path().join("lat"), b"not a vpf table").unwrap();

    let err = LibrarySelectionTable::new(&[bad.path().to_path_buf()]).unwrap_err();
    assert!(matches!(err, DataError::Parse { .. }));
}

#[test]
fn test_init_scans_multiple_paths() {
    // One bogus path plus one real root: the real one carries the day.
    let dir = tiled_dataset();
    let paths = vec![PathBuf::from("/no/such/place"), dir.path().to_path_buf()];
    let lst = LibrarySelectionTable::new(&paths).unwrap();
    assert_eq!(lst.libraries().len(), 1);
}

#[test]
fn test_tile_query_collects_every_kind() {
    let dir = tiled_dataset();
    let lst = lst_for(&dir);
    let mut warehouse = GraphicWarehouse::new(WarehouseMode::TileOrder);

    let status = query_tile(&lst, &mut warehouse);
    assert_eq!(status, QueryStatus::Completed);

    let graphics = warehouse.graphics();
    assert_eq!(graphics.len(), 4);
    assert_eq!(graphics.iter().filter(|g| g.is_polyline()).count(), 1);
    assert_eq!(graphics.iter().filter(|g| g.is_polygon()).count(), 1);
    assert_eq!(graphics.iter().filter(|g| g.is_point()).count(), 1);
    assert_eq!(graphics.iter().filter(|g| g.is_text()).count(), 1);

    let text = graphics
        .iter()
        .find_map(|g| match g {
            GraphicPrimitive::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
        .unwrap();
    assert_eq!(text, "Alpha");
}

#[test]
fn test_square_face_assembles_as_stored() {
    let dir = tiled_dataset();
    let lst = lst_for(&dir);
    let mut warehouse = GraphicWarehouse::new(WarehouseMode::TileOrder);
    warehouse.set_features(FeatureTypeSet::empty().with(FeatureType::Area));

    query_tile(&lst, &mut warehouse);

    assert_eq!(warehouse.graphics().len(), 1);
    let GraphicPrimitive::Polygon { rings, .. } = &warehouse.graphics()[0] else {
        panic!("expected polygon");
    };
    assert_eq!(rings.len(), 1);
    let ring = &rings[0];
    // The 4 square corners in stored order; the closing vertex is implicit.
    assert_eq!(ring.len(), 4);
    for (vertex, (lon, lat)) in ring.iter().zip(SQUARE) {
        assert_eq!(vertex.lon, lon as f64);
        assert_eq!(vertex.lat, lat as f64);
    }
}

#[test]
fn test_cutoff_suppresses_both_paths_without_reads() {
    let dir = tiled_dataset();
    let mut lst = lst_for(&dir);
    lst.set_cutoff_scale(1_000_000);
    let reads_after_init = lst.storage_reads();

    let (ul, lr) = full_view();
    for query in [
        LibrarySelectionTable::query_by_tile,
        LibrarySelectionTable::query_by_feature,
    ] {
        let mut warehouse = GraphicWarehouse::new(WarehouseMode::TileOrder);
        let status = query(&lst, 2_000_000, 800, 600, "po", &mut warehouse, ul, lr).unwrap();
        assert_eq!(status, QueryStatus::Suppressed);
        assert!(warehouse.graphics().is_empty());
    }
    assert_eq!(lst.storage_reads(), reads_after_init);
}

#[test]
fn test_by_tile_and_by_feature_agree() {
    let dir = tiled_dataset();
    let lst = lst_for(&dir);

    let mut by_tile = GraphicWarehouse::new(WarehouseMode::TileOrder);
    query_tile(&lst, &mut by_tile);

    let mut by_feature = GraphicWarehouse::new(WarehouseMode::FeatureOrder);
    query_feature(&lst, &mut by_feature);

    assert_eq!(
        sorted_debug(by_tile.graphics()),
        sorted_debug(by_feature.graphics())
    );
}

#[test]
fn test_face_boundary_edge_is_not_a_line_feature() {
    // An edge that only bounds a face carries no line-feature row, so
    // neither path may emit it as a polyline.
    let dir = tiled_dataset();
    add_orphan_edge(dir.path());
    let lst = lst_for(&dir);

    let mut by_tile = GraphicWarehouse::new(WarehouseMode::TileOrder);
    query_tile(&lst, &mut by_tile);
    assert_eq!(
        by_tile.graphics().iter().filter(|g| g.is_polyline()).count(),
        1
    );

    let mut by_feature = GraphicWarehouse::new(WarehouseMode::FeatureOrder);
    query_feature(&lst, &mut by_feature);
    assert_eq!(
        sorted_debug(by_tile.graphics()),
        sorted_debug(by_feature.graphics())
    );
}

#[test]
fn test_requery_is_idempotent() {
    let dir = tiled_dataset();
    let lst = lst_for(&dir);
    let mut warehouse = GraphicWarehouse::new(WarehouseMode::TileOrder);

    query_tile(&lst, &mut warehouse);
    let first: Vec<GraphicPrimitive> = warehouse.graphics().to_vec();

    warehouse.clear();
    query_tile(&lst, &mut warehouse);
    assert_eq!(warehouse.graphics(), first.as_slice());
}

#[test]
fn test_disabling_a_type_removes_exactly_that_kind() {
    let dir = tiled_dataset();
    let lst = lst_for(&dir);
    let mut warehouse = GraphicWarehouse::new(WarehouseMode::TileOrder);

    query_tile(&lst, &mut warehouse);
    let polygons_before = warehouse.graphics().iter().filter(|g| g.is_polygon()).count();
    let total_before = warehouse.graphics().len();

    warehouse.set_edge_features(false);
    warehouse.clear();
    query_tile(&lst, &mut warehouse);

    assert_eq!(warehouse.graphics().len(), total_before - 1);
    assert!(warehouse.graphics().iter().all(|g| !g.is_polyline()));
    assert_eq!(
        warehouse.graphics().iter().filter(|g| g.is_polygon()).count(),
        polygons_before
    );
}

#[test]
fn test_viewport_outside_library_finds_nothing() {
    let dir = tiled_dataset();
    let lst = lst_for(&dir);
    let mut warehouse = GraphicWarehouse::new(WarehouseMode::TileOrder);

    let status = lst
        .query_by_tile(
            500_000,
            800,
            600,
            "po",
            &mut warehouse,
            LatLonPoint::new(60.0, 40.0),
            LatLonPoint::new(50.0, 50.0),
        )
        .unwrap();
    assert_eq!(status, QueryStatus::Completed);
    assert!(warehouse.graphics().is_empty());
}

#[test]
fn test_unknown_coverage_completes_empty() {
    let dir = tiled_dataset();
    let lst = lst_for(&dir);
    let mut warehouse = GraphicWarehouse::new(WarehouseMode::TileOrder);

    let (ul, lr) = full_view();
    let status = lst
        .query_by_tile(500_000, 800, 600, "hydro", &mut warehouse, ul, lr)
        .unwrap();
    assert_eq!(status, QueryStatus::Completed);
    assert!(warehouse.graphics().is_empty());
}

#[test]
fn test_tile_cache_avoids_rereads() {
    let dir = tiled_dataset();
    let lst = lst_for(&dir);
    let mut warehouse = GraphicWarehouse::new(WarehouseMode::TileOrder);

    query_tile(&lst, &mut warehouse);
    let reads_after_first = lst.storage_reads();

    warehouse.clear();
    query_tile(&lst, &mut warehouse);
    assert_eq!(lst.storage_reads(), reads_after_first);
}

#[test]
fn test_untiled_library_serves_both_paths() {
    let dir = tempfile::tempdir().unwrap();
    write_untiled_dataset(dir.path());
    let lst = LibrarySelectionTable::new(&[dir.path().to_path_buf()]).unwrap();
    assert!(!lst.libraries()[0].is_tiled());

    let mut by_tile = GraphicWarehouse::new(WarehouseMode::TileOrder);
    query_tile(&lst, &mut by_tile);
    assert_eq!(by_tile.graphics().len(), 4);

    let mut by_feature = GraphicWarehouse::new(WarehouseMode::FeatureOrder);
    query_feature(&lst, &mut by_feature);
    assert_eq!(
        sorted_debug(by_tile.graphics()),
        sorted_debug(by_feature.graphics())
    );
}

struct PixelProjection;

impl MapProjection for PixelProjection {
    fn forward(&self, point: &LatLonPoint) -> (f32, f32) {
        (point.lon as f32 * 10.0, (10.0 - point.lat as f32) * 10.0)
    }
}

fn viewport(scale: u32) -> ViewportRequest {
    let (upper_left, lower_right) = full_view();
    ViewportRequest {
        scale,
        width_px: 100,
        height_px: 100,
        upper_left,
        lower_right,
    }
}

#[test]
fn test_layer_square_scenario() {
    // One "po" coverage, cutoff 1:1,000,000, areas only. Zoomed in the
    // square arrives as a single polygon; zoomed out the query is
    // suppressed rather than empty-for-no-reason.
    let dir = tiled_dataset();
    let mut layer = VpfLayer::new();
    layer.configure(
        VpfLayerConfig::new()
            .with_path(dir.path())
            .with_coverage("po")
            .with_cutoff_scale(1_000_000)
            .with_feature_types(FeatureTypeSet::from_names("area")),
    );
    assert!(layer.is_ready());

    let prepared = layer.prepare(&viewport(500_000), &PixelProjection).unwrap();
    assert_eq!(prepared.status, QueryStatus::Completed);
    assert_eq!(prepared.graphics.len(), 1);
    let ProjectedGraphic::Polygon { rings, .. } = &prepared.graphics[0] else {
        panic!("expected polygon");
    };
    assert_eq!(rings[0].len(), 4);
    // (lon 2, lat 2) lands at pixel (20, 80) under the test projection.
    assert_eq!(rings[0][0], (20.0, 80.0));

    let suppressed = layer
        .prepare(&viewport(2_000_000), &PixelProjection)
        .unwrap();
    assert_eq!(suppressed.status, QueryStatus::Suppressed);
    assert!(suppressed.graphics.is_empty());
}

#[test]
fn test_layer_reprepare_is_stable() {
    let dir = tiled_dataset();
    let mut layer = VpfLayer::new();
    layer.configure(
        VpfLayerConfig::new()
            .with_path(dir.path())
            .with_coverage("po"),
    );

    let first = layer.prepare(&viewport(500_000), &PixelProjection).unwrap();
    let second = layer.prepare(&viewport(500_000), &PixelProjection).unwrap();
    assert_eq!(first.graphics, second.graphics);
}

#[test]
fn test_dcw_database_name_detected() {
    let dir = tiled_dataset();
    write_dht(dir.path(), "DCW");

    let lst = LibrarySelectionTable::new(&[dir.path().to_path_buf()]).unwrap();
    assert_eq!(lst.database_name(), "DCW");
}
