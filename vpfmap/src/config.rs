//! Layer configuration.
//!
//! A plain value the caller constructs and hands to the layer facade
//! exactly once per configuration cycle. There is no global defaults
//! cache; two layers never share configuration state.

use std::path::PathBuf;

use crate::feature::FeatureTypeSet;
use crate::graphics::DrawingAttributes;
use crate::library::DEFAULT_BROWSE_CUTOFF;

/// Configuration for one VPF layer.
#[derive(Debug, Clone)]
pub struct VpfLayerConfig {
    /// VPF root paths, each containing a library attribute table.
    pub paths: Vec<PathBuf>,
    /// Coverage code to draw, e.g. `"po"` or `"bnd"`.
    pub coverage: String,
    /// Feature geometry kinds to draw.
    pub feature_types: FeatureTypeSet,
    /// Use the by-feature search path instead of tile selection.
    pub search_by_feature: bool,
    /// Scale denominator above which queries are suppressed.
    pub cutoff_scale: u32,
    /// Drawing attributes applied to every built primitive.
    pub attributes: DrawingAttributes,
}

impl Default for VpfLayerConfig {
    fn default() -> Self {
        Self {
            paths: Vec::new(),
            coverage: String::new(),
            feature_types: FeatureTypeSet::all(),
            search_by_feature: false,
            cutoff_scale: DEFAULT_BROWSE_CUTOFF,
            attributes: DrawingAttributes::default(),
        }
    }
}

impl VpfLayerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.paths.push(path.into());
        self
    }

    pub fn with_coverage(mut self, coverage: impl Into<String>) -> Self {
        self.coverage = coverage.into();
        self
    }

    pub fn with_feature_types(mut self, feature_types: FeatureTypeSet) -> Self {
        self.feature_types = feature_types;
        self
    }

    pub fn with_search_by_feature(mut self, enabled: bool) -> Self {
        self.search_by_feature = enabled;
        self
    }

    pub fn with_cutoff_scale(mut self, cutoff: u32) -> Self {
        self.cutoff_scale = cutoff;
        self
    }

    pub fn with_attributes(mut self, attributes: DrawingAttributes) -> Self {
        self.attributes = attributes;
        self
    }
}
