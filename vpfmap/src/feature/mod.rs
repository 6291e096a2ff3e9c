//! Feature types, selection sets and feature-table discovery.
//!
//! A coverage directory holds one feature (attribute) table per feature
//! class, named `<class>.lft` (lines), `.aft` (areas), `.pft` (points) or
//! `.tft` (text). Point tables reference either entity nodes (`end_id`
//! column) or connected nodes (`cnd_id`), which is how the two point
//! kinds are told apart.

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;

use crate::table::TableFile;

/// The five VPF feature geometry kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeatureType {
    Edge,
    Area,
    EPoint,
    CPoint,
    Text,
}

impl FromStr for FeatureType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, ()> {
        match s {
            "edge" => Ok(FeatureType::Edge),
            "area" => Ok(FeatureType::Area),
            "epoint" => Ok(FeatureType::EPoint),
            "cpoint" => Ok(FeatureType::CPoint),
            "text" => Ok(FeatureType::Text),
            _ => Err(()),
        }
    }
}

/// A subset of the feature geometry kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureTypeSet {
    bits: u8,
}

impl FeatureTypeSet {
    const ALL: u8 = 0b1_1111;

    fn bit(feature_type: FeatureType) -> u8 {
        match feature_type {
            FeatureType::Edge => 1 << 0,
            FeatureType::Area => 1 << 1,
            FeatureType::EPoint => 1 << 2,
            FeatureType::CPoint => 1 << 3,
            FeatureType::Text => 1 << 4,
        }
    }

    pub fn empty() -> Self {
        Self { bits: 0 }
    }

    pub fn all() -> Self {
        Self { bits: Self::ALL }
    }

    pub fn with(mut self, feature_type: FeatureType) -> Self {
        self.bits |= Self::bit(feature_type);
        self
    }

    pub fn contains(&self, feature_type: FeatureType) -> bool {
        self.bits & Self::bit(feature_type) != 0
    }

    /// Parse a whitespace-separated list like `"edge area text"`.
    ///
    /// Unknown names are ignored; a stray entry never disables the rest
    /// of the selection.
    pub fn from_names(names: &str) -> Self {
        let mut set = Self::empty();
        for name in names.split_whitespace() {
            if let Ok(ft) = name.parse::<FeatureType>() {
                set = set.with(ft);
            }
        }
        set
    }
}

/// Table file classification by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureTableKind {
    Line,
    Area,
    Point,
    Text,
}

/// One discovered feature table of a coverage.
#[derive(Debug, Clone)]
pub struct FeatureTableInfo {
    /// Feature class name, e.g. `polbndl`.
    pub class: String,
    pub kind: FeatureTableKind,
    pub path: PathBuf,
}

/// Feature table filename pattern: `<class>.<kind>ft`.
fn feature_table_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        // (\w+)       - feature class name
        // \.          - separator
        // ([lapt]ft)  - line/area/point/text feature table extension
        Regex::new(r"^(\w+)\.([lapt])ft$").unwrap()
    })
}

/// Discover the feature tables in a coverage directory, sorted by file
/// name so iteration order is deterministic for a fixed dataset.
pub fn discover_feature_tables(dir: &Path) -> Vec<FeatureTableInfo> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };

    let mut tables = Vec::new();
    for entry in entries.flatten() {
        let file_name = entry.file_name();
        let name = file_name.to_string_lossy().to_lowercase();
        let Some(captures) = feature_table_pattern().captures(&name) else {
            continue;
        };
        let kind = match &captures[2] {
            "l" => FeatureTableKind::Line,
            "a" => FeatureTableKind::Area,
            "p" => FeatureTableKind::Point,
            "t" => FeatureTableKind::Text,
            _ => continue,
        };
        tables.push(FeatureTableInfo {
            class: captures[1].to_string(),
            kind,
            path: entry.path(),
        });
    }
    tables.sort_by(|a, b| a.path.file_name().cmp(&b.path.file_name()));
    tables
}

/// Locate the primitive reference column of an open feature table.
///
/// Returns the column index and the geometry kind it implies. For point
/// feature tables this is where `end_id` vs `cnd_id` resolves the entity
/// vs connected distinction.
pub fn primitive_column(table: &TableFile) -> Option<(usize, FeatureType)> {
    const CANDIDATES: [(&str, FeatureType); 5] = [
        ("edg_id", FeatureType::Edge),
        ("fac_id", FeatureType::Area),
        ("end_id", FeatureType::EPoint),
        ("cnd_id", FeatureType::CPoint),
        ("txt_id", FeatureType::Text),
    ];
    CANDIDATES
        .iter()
        .find_map(|(name, ft)| table.column_index(name).map(|i| (i, *ft)))
}
