//! # Route Elevation Profiles
//!
//! `routeprof` extracts measure/elevation profiles along linearly
//! referenced routes, from contour lines or from a digital elevation
//! model, and merges them into a single table.

pub mod assemble;
mod cancel;
pub mod config;
mod error;
pub mod merge;
pub mod pipeline;
pub mod route;
pub mod select;
pub mod service;
pub mod sink;
pub mod stations;
pub mod workspace;

pub use crate::{
    assemble::{assemble, ProfileRow, ProfileSeries, RawSample},
    cancel::CancelToken,
    config::{ExtractionConfig, FeatureCategory, Method},
    error::{ConfigError, ProfileError, ServiceError},
    merge::{merge, MergedTable},
    pipeline::{Observer, Pipeline, Report, RouteStatus},
    route::{Route, RouteId, RouteQuery, Stage},
    service::{Budget, CallPolicy, ContourService, Event, OutputSink, RasterService, RouteStore},
    sink::CsvSink,
    stations::{FEET_PER_METER, MAX_STATIONS},
    workspace::Workspace,
};
