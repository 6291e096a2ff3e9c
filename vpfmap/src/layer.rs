//! Layer facade: configuration state machine and per-repaint orchestration.
//!
//! A layer is either unconfigured, ready, or failed; the state is explicit
//! and every reconfiguration passes through `Unconfigured` first, so a
//! half-configured layer can never serve a query. `prepare()` runs one
//! complete repaint cycle: clear the warehouse, query by tile or by
//! feature per the configuration, project, hand back the primitives.

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::config::VpfLayerConfig;
use crate::coord::LatLonPoint;
use crate::error::LayerError;
use crate::graphics::{project, MapProjection, ProjectedGraphic};
use crate::library::{LibrarySelectionTable, QueryStatus};
use crate::warehouse::{GraphicWarehouse, WarehouseMode};

/// One viewport repaint request.
#[derive(Debug, Clone, Copy)]
pub struct ViewportRequest {
    /// Map scale denominator (1:n).
    pub scale: u32,
    pub width_px: u32,
    pub height_px: u32,
    pub upper_left: LatLonPoint,
    pub lower_right: LatLonPoint,
}

/// The outcome of one repaint cycle.
///
/// `status` distinguishes a query suppressed by the cutoff scale from a
/// query that ran and found nothing; both carry an empty graphics list.
#[derive(Debug)]
pub struct PreparedList {
    pub status: QueryStatus,
    pub graphics: Vec<ProjectedGraphic>,
}

/// Explicit layer lifecycle state.
pub enum LayerState {
    Unconfigured,
    Ready(ReadyLayer),
    Failed(String),
}

/// The working state of a successfully configured layer.
pub struct ReadyLayer {
    lst: LibrarySelectionTable,
    warehouse: Mutex<GraphicWarehouse>,
    config: VpfLayerConfig,
}

/// A VPF map layer.
pub struct VpfLayer {
    state: LayerState,
}

impl Default for VpfLayer {
    fn default() -> Self {
        Self::new()
    }
}

impl VpfLayer {
    pub fn new() -> Self {
        Self {
            state: LayerState::Unconfigured,
        }
    }

    pub fn state(&self) -> &LayerState {
        &self.state
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.state, LayerState::Ready(_))
    }

    /// (Re)configure the layer.
    ///
    /// Always passes through `Unconfigured`: a failed reconfiguration
    /// leaves the layer in `Failed`, never silently serving the old
    /// dataset.
    pub fn configure(&mut self, config: VpfLayerConfig) {
        self.state = LayerState::Unconfigured;

        let mut lst = match LibrarySelectionTable::new(&config.paths) {
            Ok(lst) => lst,
            Err(err) => {
                warn!(%err, "layer configuration failed");
                self.state = LayerState::Failed(err.to_string());
                return;
            }
        };
        lst.set_cutoff_scale(config.cutoff_scale);

        let mode = if lst.database_name() == "DCW" {
            WarehouseMode::Dcw
        } else if config.search_by_feature {
            WarehouseMode::FeatureOrder
        } else {
            WarehouseMode::TileOrder
        };
        let mut warehouse = GraphicWarehouse::new(mode);
        warehouse.set_features(config.feature_types);
        warehouse.set_drawing_attributes(config.attributes);

        info!(
            database = lst.database_name(),
            coverage = %config.coverage,
            ?mode,
            "layer configured"
        );
        self.state = LayerState::Ready(ReadyLayer {
            lst,
            warehouse: Mutex::new(warehouse),
            config,
        });
    }

    /// Run one repaint cycle for the given viewport.
    pub fn prepare(
        &self,
        request: &ViewportRequest,
        projection: &dyn MapProjection,
    ) -> Result<PreparedList, LayerError> {
        let ready = match &self.state {
            LayerState::Ready(ready) => ready,
            LayerState::Unconfigured | LayerState::Failed(_) => {
                return Err(LayerError::NotConfigured)
            }
        };

        let mut warehouse = ready.warehouse.lock();
        warehouse.clear();

        let query = if ready.config.search_by_feature {
            LibrarySelectionTable::query_by_feature
        } else {
            LibrarySelectionTable::query_by_tile
        };
        let status = query(
            &ready.lst,
            request.scale,
            request.width_px,
            request.height_px,
            &ready.config.coverage,
            &mut *warehouse,
            request.upper_left,
            request.lower_right,
        )?;

        let graphics = project(warehouse.graphics(), projection);
        debug!(?status, graphics = graphics.len(), "repaint cycle complete");
        Ok(PreparedList { status, graphics })
    }

    /// Selection table of a ready layer, for inspection.
    pub fn selection_table(&self) -> Option<&LibrarySelectionTable> {
        match &self.state {
            LayerState::Ready(ready) => Some(&ready.lst),
            _ => None,
        }
    }
}
