//! Primitive record loading for a single tile directory.
//!
//! A tile directory holds the primitive tables of one spatial partition:
//! `edg` (edges), `fac`/`rng` (faces and their rings), `end`/`cnd`
//! (entity and connected nodes) and `txt` (text). Face geometry is not
//! stored directly; rings are assembled by walking the winged-edge
//! topology carried on each edge row.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::Path;

use tracing::{debug, warn};

use crate::coord::LatLonPoint;
use crate::error::DataError;
use crate::table::{Storage, TableFile};

/// An edge (polyline) primitive.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeRecord {
    pub id: i32,
    pub vertices: Vec<LatLonPoint>,
}

/// An area (polygon) primitive: one or more rings of vertices.
///
/// Ring vertex order is exactly as assembled from storage; winding is
/// preserved through to the projected output.
#[derive(Debug, Clone, PartialEq)]
pub struct AreaRecord {
    pub id: i32,
    pub rings: Vec<Vec<LatLonPoint>>,
}

/// An entity or connected node primitive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointRecord {
    pub id: i32,
    pub position: LatLonPoint,
}

/// A text primitive: a label anchored at a position.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRecord {
    pub id: i32,
    pub text: String,
    pub position: LatLonPoint,
}

/// Winged-edge topology of one `edg` row, used only for ring assembly.
struct EdgeTopology {
    right_face: i32,
    left_face: i32,
    right_edge: i32,
    left_edge: i32,
    vertices: Vec<LatLonPoint>,
}

/// All primitive records of one tile, immutable once loaded.
#[derive(Debug, Default)]
pub struct TileData {
    edges: Vec<EdgeRecord>,
    areas: Vec<AreaRecord>,
    entity_points: Vec<PointRecord>,
    connected_points: Vec<PointRecord>,
    texts: Vec<TextRecord>,
    edge_index: HashMap<i32, usize>,
    area_index: HashMap<i32, usize>,
    entity_index: HashMap<i32, usize>,
    connected_index: HashMap<i32, usize>,
    text_index: HashMap<i32, usize>,
}

/// Open a primitive table that may legitimately be absent.
///
/// A missing file means the tile simply has no primitives of that kind;
/// a damaged file is reported and treated the same way so the rest of
/// the coverage still renders.
fn open_optional(storage: &Storage, dir: &Path, name: &str) -> Option<TableFile> {
    match storage.open_table(&dir.join(name)) {
        Ok(table) => Some(table),
        Err(DataError::Io(e)) if e.kind() == ErrorKind::NotFound => None,
        Err(err) => {
            warn!(table = name, dir = %dir.display(), %err, "unreadable primitive table");
            None
        }
    }
}

fn coords_to_points(coords: &[(f64, f64)]) -> Vec<LatLonPoint> {
    coords
        .iter()
        .map(|(lon, lat)| LatLonPoint::new(*lat, *lon))
        .collect()
}

impl TileData {
    /// Load every primitive table present in a tile directory.
    pub fn load(storage: &Storage, dir: &Path) -> Self {
        let mut data = TileData::default();
        let topology = data.load_edges(storage, dir);
        data.load_areas(storage, dir, &topology);
        data.load_points(storage, dir, "end", PointKind::Entity);
        data.load_points(storage, dir, "cnd", PointKind::Connected);
        data.load_texts(storage, dir);
        debug!(
            dir = %dir.display(),
            edges = data.edges.len(),
            areas = data.areas.len(),
            "loaded tile primitives"
        );
        data
    }

    fn load_edges(&mut self, storage: &Storage, dir: &Path) -> HashMap<i32, EdgeTopology> {
        let mut topology = HashMap::new();
        let Some(table) = open_optional(storage, dir, "edg") else {
            return topology;
        };

        let Some(id_col) = table.column_index("id") else {
            warn!(dir = %dir.display(), "edg table missing id column");
            return topology;
        };
        let Some(coord_col) = table.column_index("coordinates") else {
            warn!(dir = %dir.display(), "edg table missing coordinates column");
            return topology;
        };
        let right_face = table.column_index("right_face");
        let left_face = table.column_index("left_face");
        let right_edge = table.column_index("right_edge");
        let left_edge = table.column_index("left_edge");

        for row in table.rows() {
            let (Some(id), Some(coords)) = (row.int(id_col), row.coords(coord_col)) else {
                warn!(dir = %dir.display(), "skipping edge row with missing id/coordinates");
                continue;
            };
            let vertices = coords_to_points(coords);

            if let (Some(rf), Some(lf), Some(re), Some(le)) =
                (right_face, left_face, right_edge, left_edge)
            {
                if let (Some(rf), Some(lf), Some(re), Some(le)) =
                    (row.int(rf), row.int(lf), row.int(re), row.int(le))
                {
                    topology.insert(
                        id,
                        EdgeTopology {
                            right_face: rf,
                            left_face: lf,
                            right_edge: re,
                            left_edge: le,
                            vertices: vertices.clone(),
                        },
                    );
                }
            }

            self.edge_index.insert(id, self.edges.len());
            self.edges.push(EdgeRecord { id, vertices });
        }
        topology
    }

    fn load_areas(&mut self, storage: &Storage, dir: &Path, topology: &HashMap<i32, EdgeTopology>) {
        let Some(fac) = open_optional(storage, dir, "fac") else {
            return;
        };
        let Some(rng) = open_optional(storage, dir, "rng") else {
            return;
        };

        let (Some(fac_id_col), Some(rng_face_col), Some(rng_edge_col)) = (
            fac.column_index("id"),
            rng.column_index("face_id"),
            rng.column_index("start_edge"),
        ) else {
            warn!(dir = %dir.display(), "fac/rng tables missing expected columns");
            return;
        };

        // Ring rows grouped by owning face, in table order.
        let mut rings_by_face: HashMap<i32, Vec<i32>> = HashMap::new();
        for row in rng.rows() {
            if let (Some(face), Some(start)) = (row.int(rng_face_col), row.int(rng_edge_col)) {
                rings_by_face.entry(face).or_default().push(start);
            }
        }

        for row in fac.rows() {
            let Some(face_id) = row.int(fac_id_col) else {
                continue;
            };
            // Face 1 is the universe face enclosing everything else.
            if face_id == 1 {
                continue;
            }
            let Some(starts) = rings_by_face.get(&face_id) else {
                warn!(dir = %dir.display(), face_id, "face without ring rows, skipping");
                continue;
            };

            let mut rings = Vec::with_capacity(starts.len());
            for &start_edge in starts {
                match assemble_ring(face_id, start_edge, topology) {
                    Some(ring) => rings.push(ring),
                    None => {
                        warn!(
                            dir = %dir.display(),
                            face_id,
                            start_edge,
                            "broken ring topology, skipping face"
                        );
                        rings.clear();
                        break;
                    }
                }
            }
            if rings.is_empty() {
                continue;
            }

            self.area_index.insert(face_id, self.areas.len());
            self.areas.push(AreaRecord { id: face_id, rings });
        }
    }

    fn load_points(&mut self, storage: &Storage, dir: &Path, name: &str, kind: PointKind) {
        let Some(table) = open_optional(storage, dir, name) else {
            return;
        };
        let (Some(id_col), Some(coord_col)) =
            (table.column_index("id"), table.column_index("coordinate"))
        else {
            warn!(table = name, dir = %dir.display(), "node table missing expected columns");
            return;
        };

        for row in table.rows() {
            let (Some(id), Some(coords)) = (row.int(id_col), row.coords(coord_col)) else {
                continue;
            };
            let Some((lon, lat)) = coords.first() else {
                warn!(table = name, dir = %dir.display(), "skipping node row without coordinate");
                continue;
            };
            let record = PointRecord {
                id,
                position: LatLonPoint::new(*lat, *lon),
            };
            match kind {
                PointKind::Entity => {
                    self.entity_index.insert(id, self.entity_points.len());
                    self.entity_points.push(record);
                }
                PointKind::Connected => {
                    self.connected_index.insert(id, self.connected_points.len());
                    self.connected_points.push(record);
                }
            }
        }
    }

    fn load_texts(&mut self, storage: &Storage, dir: &Path) {
        let Some(table) = open_optional(storage, dir, "txt") else {
            return;
        };
        let (Some(id_col), Some(string_col), Some(shape_col)) = (
            table.column_index("id"),
            table.column_index("string"),
            table.column_index("shape_line"),
        ) else {
            warn!(dir = %dir.display(), "txt table missing expected columns");
            return;
        };

        for row in table.rows() {
            let (Some(id), Some(text), Some(shape)) = (
                row.int(id_col),
                row.text(string_col),
                row.coords(shape_col),
            ) else {
                continue;
            };
            // The first shape point anchors the label.
            let Some((lon, lat)) = shape.first() else {
                warn!(dir = %dir.display(), id, "skipping text row without anchor point");
                continue;
            };
            self.text_index.insert(id, self.texts.len());
            self.texts.push(TextRecord {
                id,
                text: text.to_string(),
                position: LatLonPoint::new(*lat, *lon),
            });
        }
    }

    pub fn edges(&self) -> &[EdgeRecord] {
        &self.edges
    }

    pub fn areas(&self) -> &[AreaRecord] {
        &self.areas
    }

    pub fn entity_points(&self) -> &[PointRecord] {
        &self.entity_points
    }

    pub fn connected_points(&self) -> &[PointRecord] {
        &self.connected_points
    }

    pub fn texts(&self) -> &[TextRecord] {
        &self.texts
    }

    pub fn edge(&self, id: i32) -> Option<&EdgeRecord> {
        self.edge_index.get(&id).map(|&i| &self.edges[i])
    }

    pub fn area(&self, id: i32) -> Option<&AreaRecord> {
        self.area_index.get(&id).map(|&i| &self.areas[i])
    }

    pub fn entity_point(&self, id: i32) -> Option<&PointRecord> {
        self.entity_index.get(&id).map(|&i| &self.entity_points[i])
    }

    pub fn connected_point(&self, id: i32) -> Option<&PointRecord> {
        self.connected_index
            .get(&id)
            .map(|&i| &self.connected_points[i])
    }

    pub fn text(&self, id: i32) -> Option<&TextRecord> {
        self.text_index.get(&id).map(|&i| &self.texts[i])
    }
}

#[derive(Clone, Copy)]
enum PointKind {
    Entity,
    Connected,
}

/// Walk the winged-edge topology of one ring.
///
/// Starting from `start_edge`, each edge contributes its vertices in edge
/// direction when the face lies to its right, reversed when to its left,
/// and the walk continues along the corresponding next-edge pointer until
/// it returns to the start. `None` on any break in the topology.
fn assemble_ring(
    face_id: i32,
    start_edge: i32,
    topology: &HashMap<i32, EdgeTopology>,
) -> Option<Vec<LatLonPoint>> {
    let mut ring: Vec<LatLonPoint> = Vec::new();
    let mut current = start_edge;

    // Each edge appears at most twice in a ring (once per side).
    let max_steps = topology.len().saturating_mul(2).max(1);
    for _ in 0..max_steps {
        let edge = topology.get(&current)?;
        let (vertices, next): (Box<dyn Iterator<Item = &LatLonPoint>>, i32) =
            if edge.right_face == face_id {
                (Box::new(edge.vertices.iter()), edge.right_edge)
            } else if edge.left_face == face_id {
                (Box::new(edge.vertices.iter().rev()), edge.left_edge)
            } else {
                return None;
            };

        for vertex in vertices {
            // Junction vertices are shared between consecutive edges.
            if ring.last() != Some(vertex) {
                ring.push(*vertex);
            }
        }

        if next == start_edge {
            // Open-ring form: the closing vertex is implicit.
            if ring.len() > 1 && ring.first() == ring.last() {
                ring.pop();
            }
            return Some(ring);
        }
        current = next;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pt(lat: f64, lon: f64) -> LatLonPoint {
        LatLonPoint::new(lat, lon)
    }

    fn topo(
        entries: &[(i32, i32, i32, i32, i32, &[LatLonPoint])],
    ) -> HashMap<i32, EdgeTopology> {
        entries
            .iter()
            .map(|(id, rf, lf, re, le, verts)| {
                (
                    *id,
                    EdgeTopology {
                        right_face: *rf,
                        left_face: *lf,
                        right_edge: *re,
                        left_edge: *le,
                        vertices: verts.to_vec(),
                    },
                )
            })
            .collect()
    }

    #[test]
    fn test_single_closed_edge_ring() {
        // One edge closing on itself around face 2, clockwise.
        let verts = [pt(0.0, 0.0), pt(1.0, 0.0), pt(1.0, 1.0), pt(0.0, 1.0), pt(0.0, 0.0)];
        let edges = topo(&[(10, 2, 1, 10, 10, &verts)]);

        let ring = assemble_ring(2, 10, &edges).unwrap();
        // Closing vertex dropped, stored order otherwise preserved.
        assert_eq!(ring.len(), 4);
        assert_eq!(ring.first(), Some(&pt(0.0, 0.0)));
        assert_eq!(ring[1], pt(1.0, 0.0));
        assert_eq!(ring[3], pt(0.0, 1.0));
    }

    #[test]
    fn test_two_edge_ring_with_reversal() {
        // Face 2 is right of edge 10 and left of edge 11, so edge 11's
        // vertices are traversed in reverse.
        let e10 = [pt(0.0, 0.0), pt(0.0, 1.0)];
        let e11 = [pt(0.0, 0.0), pt(1.0, 0.5), pt(0.0, 1.0)];
        let edges = topo(&[
            (10, 2, 1, 11, 10, &e10),
            (11, 1, 2, 11, 10, &e11),
        ]);

        let ring = assemble_ring(2, 10, &edges).unwrap();
        assert_eq!(ring, vec![pt(0.0, 0.0), pt(0.0, 1.0), pt(1.0, 0.5)]);
    }

    #[test]
    fn test_ring_with_dangling_reference() {
        let e10 = [pt(0.0, 0.0), pt(0.0, 1.0)];
        let edges = topo(&[(10, 2, 1, 99, 10, &e10)]); // edge 99 does not exist
        assert!(assemble_ring(2, 10, &edges).is_none());
    }

    #[test]
    fn test_ring_wrong_face() {
        let e10 = [pt(0.0, 0.0), pt(0.0, 1.0)];
        let edges = topo(&[(10, 3, 4, 10, 10, &e10)]);
        assert!(assemble_ring(2, 10, &edges).is_none());
    }

    #[test]
    fn test_empty_tile_directory() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::new();
        let data = TileData::load(&storage, dir.path());
        assert!(data.edges().is_empty());
        assert!(data.areas().is_empty());
        assert!(data.texts().is_empty());
    }
}
