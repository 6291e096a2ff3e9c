//! The `query` subcommand: run one viewport query and summarize it.

use std::path::PathBuf;

use clap::Args;
use vpfmap::{
    FeatureTypeSet, LatLonPoint, MapProjection, ProjectedGraphic, QueryStatus, ViewportRequest,
    VpfLayer, VpfLayerConfig,
};

use crate::error::CliError;

#[derive(Debug, Args)]
pub struct QueryArgs {
    /// VPF root paths, each containing a library attribute table ("lat")
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Coverage code to query, e.g. "po"
    #[arg(short, long)]
    pub coverage: String,

    /// Map scale denominator (1:n)
    #[arg(short, long, default_value_t = 1_000_000)]
    pub scale: u32,

    /// Viewport width in pixels
    #[arg(long, default_value_t = 800)]
    pub width: u32,

    /// Viewport height in pixels
    #[arg(long, default_value_t = 600)]
    pub height: u32,

    /// Northern edge of the viewport, degrees
    #[arg(long)]
    pub north: f64,

    /// Western edge of the viewport, degrees
    #[arg(long)]
    pub west: f64,

    /// Southern edge of the viewport, degrees
    #[arg(long)]
    pub south: f64,

    /// Eastern edge of the viewport, degrees
    #[arg(long)]
    pub east: f64,

    /// Search feature tables directly instead of selecting tiles
    #[arg(long)]
    pub by_feature: bool,

    /// Feature types to draw, e.g. "edge area text" (default: all)
    #[arg(long)]
    pub types: Option<String>,

    /// Cutoff scale denominator overriding the database default
    #[arg(long)]
    pub cutoff: Option<u32>,
}

/// Plate carree mapping of the viewport rectangle onto the pixel grid.
struct ViewportProjection {
    north: f64,
    west: f64,
    lon_span: f64,
    lat_span: f64,
    width: f64,
    height: f64,
}

impl MapProjection for ViewportProjection {
    fn forward(&self, point: &LatLonPoint) -> (f32, f32) {
        let x = (point.lon - self.west) / self.lon_span * self.width;
        let y = (self.north - point.lat) / self.lat_span * self.height;
        (x as f32, y as f32)
    }
}

pub fn run(args: QueryArgs) -> Result<(), CliError> {
    if args.north <= args.south || args.east <= args.west {
        return Err(CliError::InvalidBounds(format!(
            "north {} / south {} / east {} / west {}",
            args.north, args.south, args.east, args.west
        )));
    }

    let mut config = VpfLayerConfig::new()
        .with_coverage(args.coverage.clone())
        .with_search_by_feature(args.by_feature);
    for path in &args.paths {
        config = config.with_path(path);
    }
    if let Some(types) = &args.types {
        config = config.with_feature_types(FeatureTypeSet::from_names(types));
    }
    if let Some(cutoff) = args.cutoff {
        config = config.with_cutoff_scale(cutoff);
    }

    let mut layer = VpfLayer::new();
    layer.configure(config);

    let projection = ViewportProjection {
        north: args.north,
        west: args.west,
        lon_span: args.east - args.west,
        lat_span: args.north - args.south,
        width: args.width as f64,
        height: args.height as f64,
    };
    let request = ViewportRequest {
        scale: args.scale,
        width_px: args.width,
        height_px: args.height,
        upper_left: LatLonPoint::new(args.north, args.west),
        lower_right: LatLonPoint::new(args.south, args.east),
    };

    let started = std::time::Instant::now();
    let prepared = layer.prepare(&request, &projection)?;
    tracing::debug!(elapsed = ?started.elapsed(), "query complete");
    if prepared.status == QueryStatus::Suppressed {
        println!(
            "Query suppressed: scale 1:{} is beyond the cutoff",
            args.scale
        );
        return Ok(());
    }

    let mut polylines = 0usize;
    let mut polygons = 0usize;
    let mut points = 0usize;
    let mut texts = 0usize;
    for graphic in &prepared.graphics {
        match graphic {
            ProjectedGraphic::Polyline { .. } => polylines += 1,
            ProjectedGraphic::Polygon { .. } => polygons += 1,
            ProjectedGraphic::Point { .. } => points += 1,
            ProjectedGraphic::Text { .. } => texts += 1,
        }
    }

    println!("Graphics: {}", prepared.graphics.len());
    println!("  polylines: {}", polylines);
    println!("  polygons:  {}", polygons);
    println!("  points:    {}", points);
    println!("  texts:     {}", texts);
    if let Some(lst) = layer.selection_table() {
        println!("Table files read: {}", lst.storage_reads());
    }

    Ok(())
}
