use clap::{Args, Parser, ValueEnum};
use std::path::PathBuf;

/// Extract elevation profiles along linearly referenced routes.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub enum Cli {
    /// Profile the selected routes and write a single
    /// measure/route_id/elevation table.
    Extract(Extract),

    /// Print the segment-group or system names available for
    /// selection.
    List(List),
}

#[derive(Debug, Clone, Args)]
pub struct Extract {
    /// Route features (GeoJSON).
    #[arg(long)]
    pub routes: PathBuf,

    #[arg(short, long, value_enum)]
    pub method: MethodArg,

    #[arg(short, long, value_enum, default_value_t = CategoryArg::All)]
    pub category: CategoryArg,

    /// Segment-group name to profile. May be repeated.
    #[arg(long = "segment")]
    pub segments: Vec<String>,

    /// System name to profile. May be repeated.
    #[arg(long = "system")]
    pub systems: Vec<String>,

    /// DEM station spacing, in feet.
    #[arg(short, long)]
    pub interval: Option<f64>,

    /// Contour line features (GeoJSON) with a `Contour` elevation
    /// property, in feet. Required by the contour method.
    #[arg(long)]
    pub contours: Option<PathBuf>,

    /// Directory of NASADEM height files. Required by the DEM
    /// method.
    #[arg(long)]
    pub tile_dir: Option<PathBuf>,

    /// Load whole tiles into memory instead of mapping them.
    #[arg(long)]
    pub in_mem: bool,

    /// Output table.
    #[arg(short, long)]
    pub out: PathBuf,

    /// Replace the output table if it already exists.
    #[arg(short = 'O', long)]
    pub overwrite: bool,

    /// Keep per-route tables in this directory.
    #[arg(long)]
    pub workspace: Option<PathBuf>,

    /// Per-call timeout for geometry and raster lookups.
    #[arg(long, default_value_t = 30)]
    pub timeout_secs: u64,

    /// Attempts per geometry or raster lookup.
    #[arg(long, default_value_t = 3)]
    pub attempts: u32,

    /// Distance routes are buffered by before clipping contours, in
    /// feet.
    #[arg(long, default_value_t = 1.0)]
    pub buffer_ft: f64,

    /// How far a contour crossing may lie from its route and still
    /// be located on it, in feet.
    #[arg(long, default_value_t = 50.0)]
    pub search_radius_ft: f64,
}

#[derive(Debug, Clone, Args)]
pub struct List {
    /// Route features (GeoJSON).
    #[arg(long)]
    pub routes: PathBuf,

    #[arg(value_enum)]
    pub field: ListField,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MethodArg {
    Contour,
    Dem,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CategoryArg {
    SegmentGroup,
    System,
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ListField {
    Segments,
    Systems,
}

impl From<MethodArg> for routeprof::Method {
    fn from(method: MethodArg) -> Self {
        match method {
            MethodArg::Contour => Self::Contour,
            MethodArg::Dem => Self::Dem,
        }
    }
}

impl From<CategoryArg> for routeprof::FeatureCategory {
    fn from(category: CategoryArg) -> Self {
        match category {
            CategoryArg::SegmentGroup => Self::SegmentGroup,
            CategoryArg::System => Self::System,
            CategoryArg::All => Self::AllSystemsSegments,
        }
    }
}
