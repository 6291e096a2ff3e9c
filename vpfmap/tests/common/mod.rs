//! Test support: writes VPF datasets byte by byte.
//!
//! Tables are emitted in the exact on-disk format the reader parses (4-byte
//! little-endian header length, text header, packed rows), so integration
//! tests exercise the real parser end to end.

use std::fs;
use std::path::Path;

/// Builds one VPF table file.
pub struct TableWriter {
    header: String,
    rows: Vec<u8>,
}

impl TableWriter {
    /// `columns` is the raw column definition text, e.g.
    /// `"id=I,1,P,-,:tile_name=T,8,N,-,:"`.
    pub fn new(description: &str, columns: &str) -> Self {
        Self {
            header: format!("L;{};-;{};", description, columns),
            rows: Vec::new(),
        }
    }

    pub fn i16(&mut self, v: i16) -> &mut Self {
        self.rows.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn i32(&mut self, v: i32) -> &mut Self {
        self.rows.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn f32(&mut self, v: f32) -> &mut Self {
        self.rows.extend_from_slice(&v.to_le_bytes());
        self
    }

    /// Fixed-width text, padded with spaces to `width`.
    pub fn text(&mut self, s: &str, width: usize) -> &mut Self {
        assert!(s.len() <= width, "text {:?} wider than column", s);
        self.rows.extend_from_slice(s.as_bytes());
        self.rows.extend(std::iter::repeat(b' ').take(width - s.len()));
        self
    }

    /// Variable-width text: u32 length prefix then the bytes.
    pub fn var_text(&mut self, s: &str) -> &mut Self {
        self.rows.extend_from_slice(&(s.len() as u32).to_le_bytes());
        self.rows.extend_from_slice(s.as_bytes());
        self
    }

    /// One fixed (lon, lat) coordinate pair.
    pub fn coord(&mut self, lon: f32, lat: f32) -> &mut Self {
        self.f32(lon).f32(lat)
    }

    /// Variable coordinate array: u32 pair count then the pairs.
    pub fn var_coords(&mut self, pairs: &[(f32, f32)]) -> &mut Self {
        self.rows
            .extend_from_slice(&(pairs.len() as u32).to_le_bytes());
        for (lon, lat) in pairs {
            self.coord(*lon, *lat);
        }
        self
    }

    pub fn write(&self, path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        let mut data = (self.header.len() as u32).to_le_bytes().to_vec();
        data.extend_from_slice(self.header.as_bytes());
        data.extend_from_slice(&self.rows);
        fs::write(path, data).unwrap();
    }
}

/// The square corners of the tiled dataset, as (lon, lat).
pub const SQUARE: [(f32, f32); 5] = [(2.0, 2.0), (2.0, 8.0), (8.0, 8.0), (8.0, 2.0), (2.0, 2.0)];

/// Write a tiled single-library dataset under `root`:
///
/// - library `lib`, extent 0..10 in both axes, one tile `a` covering it
/// - coverage `po` with one of each feature class: a line (the square's
///   boundary edge), an area (the square face), an entity point at (5, 5)
///   and a label "Alpha" at (3, 3)
pub fn write_tiled_dataset(root: &Path) {
    write_lat(root, "lib");
    write_dht(root, "VMAPLV0");

    let lib = root.join("lib");
    write_cat(&lib);

    let mut aft = TableWriter::new("Tile Reference", "id=I,1,P,-,:tile_name=T,8,N,-,:");
    aft.i32(1).text("a", 8);
    aft.write(&lib.join("tileref").join("tileref.aft"));

    let mut fbr = TableWriter::new(
        "Face Bounding Rectangle",
        "id=I,1,P,-,:xmin=F,1,N,-,:ymin=F,1,N,-,:xmax=F,1,N,-,:ymax=F,1,N,-,:",
    );
    fbr.i32(1).f32(0.0).f32(0.0).f32(10.0).f32(10.0);
    fbr.write(&lib.join("tileref").join("fbr"));

    let po = lib.join("po");
    write_feature_tables(&po, true);
    write_primitives(&po.join("a"));
}

/// Write an untiled single-library dataset: no tileref index, primitives
/// directly in the coverage directory, feature tables without a tile_id
/// column.
pub fn write_untiled_dataset(root: &Path) {
    write_lat(root, "lib");
    write_dht(root, "VMAPLV0");

    let lib = root.join("lib");
    write_cat(&lib);

    let po = lib.join("po");
    write_feature_tables(&po, false);
    write_primitives(&po);
}

/// Overwrite the database header table with a different database name.
pub fn write_dht(root: &Path, name: &str) {
    let mut dht = TableWriter::new(
        "Database Header",
        "id=I,1,P,-,:database_name=T,8,N,-,:",
    );
    dht.i32(1).text(name, 8);
    dht.write(&root.join("dht"));
}

fn write_lat(root: &Path, library: &str) {
    let mut lat = TableWriter::new(
        "Library Attribute",
        "id=I,1,P,-,:library_name=T,8,N,-,:xmin=F,1,N,-,:ymin=F,1,N,-,:xmax=F,1,N,-,:ymax=F,1,N,-,:",
    );
    lat.i32(1)
        .text(library, 8)
        .f32(0.0)
        .f32(0.0)
        .f32(10.0)
        .f32(10.0);
    lat.write(&root.join("lat"));
}

fn write_cat(lib: &Path) {
    let mut cat = TableWriter::new(
        "Coverage Attribute",
        "id=I,1,P,-,:coverage_name=T,8,N,-,:description=T,12,N,-,:",
    );
    cat.i32(1).text("po", 8).text("Political", 12);
    cat.write(&lib.join("cat"));
}

fn write_feature_tables(po: &Path, tiled: bool) {
    let tile_col = if tiled { "tile_id=S,1,N,-,:" } else { "" };

    let mut lft = TableWriter::new(
        "Line Features",
        &format!("id=I,1,P,-,:{}edg_id=I,1,N,-,:f_code=T,5,N,-,:", tile_col),
    );
    lft.i32(1);
    if tiled {
        lft.i16(1);
    }
    lft.i32(10).text("BA010", 5);
    lft.write(&po.join("po.lft"));

    let mut aft = TableWriter::new(
        "Area Features",
        &format!("id=I,1,P,-,:{}fac_id=I,1,N,-,:f_code=T,5,N,-,:", tile_col),
    );
    aft.i32(1);
    if tiled {
        aft.i16(1);
    }
    aft.i32(2).text("BA040", 5);
    aft.write(&po.join("po.aft"));

    let mut pft = TableWriter::new(
        "Point Features",
        &format!("id=I,1,P,-,:{}end_id=I,1,N,-,:f_code=T,5,N,-,:", tile_col),
    );
    pft.i32(1);
    if tiled {
        pft.i16(1);
    }
    pft.i32(1).text("ZD045", 5);
    pft.write(&po.join("po.pft"));

    let mut tft = TableWriter::new(
        "Text Features",
        &format!("id=I,1,P,-,:{}txt_id=I,1,N,-,:f_code=T,5,N,-,:", tile_col),
    );
    tft.i32(1);
    if tiled {
        tft.i16(1);
    }
    tft.i32(1).text("ZD040", 5);
    tft.write(&po.join("po.tft"));
}

const EDG_COLUMNS: &str = "id=I,1,P,-,:start_node=I,1,N,-,:end_node=I,1,N,-,:right_face=I,1,N,-,:left_face=I,1,N,-,:right_edge=I,1,N,-,:left_edge=I,1,N,-,:coordinates=C,*,N,-,:";

fn square_edge(edg: &mut TableWriter) {
    // One edge closing on itself around face 2 (face 1 is the universe).
    edg.i32(10)
        .i32(1)
        .i32(1)
        .i32(2)
        .i32(1)
        .i32(10)
        .i32(10)
        .var_coords(&SQUARE);
}

/// Rewrite the tiled dataset's `edg` table with an extra edge that bounds
/// no face and is referenced by no feature row.
pub fn add_orphan_edge(root: &Path) {
    let tile = root.join("lib").join("po").join("a");
    let mut edg = TableWriter::new("Edges", EDG_COLUMNS);
    square_edge(&mut edg);
    edg.i32(11)
        .i32(2)
        .i32(2)
        .i32(0)
        .i32(0)
        .i32(11)
        .i32(11)
        .var_coords(&[(1.0, 1.0), (9.0, 1.0)]);
    edg.write(&tile.join("edg"));
}

fn write_primitives(tile: &Path) {
    let mut edg = TableWriter::new("Edges", EDG_COLUMNS);
    square_edge(&mut edg);
    edg.write(&tile.join("edg"));

    let mut fac = TableWriter::new("Faces", "id=I,1,P,-,:ring_ptr=I,1,N,-,:");
    fac.i32(1).i32(1);
    fac.i32(2).i32(1);
    fac.write(&tile.join("fac"));

    let mut rng = TableWriter::new(
        "Rings",
        "id=I,1,P,-,:face_id=I,1,N,-,:start_edge=I,1,N,-,:",
    );
    rng.i32(1).i32(2).i32(10);
    rng.write(&tile.join("rng"));

    let mut end = TableWriter::new("Entity Nodes", "id=I,1,P,-,:coordinate=C,1,N,-,:");
    end.i32(1).coord(5.0, 5.0);
    end.write(&tile.join("end"));

    let mut txt = TableWriter::new(
        "Text",
        "id=I,1,P,-,:string=T,*,N,-,:shape_line=C,*,N,-,:",
    );
    txt.i32(1).var_text("Alpha").var_coords(&[(3.0, 3.0)]);
    txt.write(&tile.join("txt"));
}
