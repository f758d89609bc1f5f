use crate::route::RouteId;
use std::{path::PathBuf, time::Duration};
use thiserror::Error;

/// Invalid run configuration, detected before any external call.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("DEM sampling interval must be a positive number of feet, got {0}")]
    Interval(f64),

    #[error("DEM method requires a sampling interval")]
    MissingInterval,

    #[error("no segment groups selected")]
    NoSegments,

    #[error("no systems selected")]
    NoSystems,

    #[error("output path is empty")]
    EmptyOutput,

    #[error("output directory {0} does not exist")]
    OutputDir(PathBuf),

    #[error("output {0} already exists, pass overwrite to replace it")]
    OutputExists(PathBuf),

    #[error("sampling every {interval} ft needs {count} stations, the limit is {max}")]
    TooManyStations { interval: f64, count: f64, max: u64 },

    #[error("missing required parameter '{0}'")]
    Builder(&'static str),
}

/// Failure of an external route, geometry, or raster call.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("{op} timed out after {elapsed:?}")]
    Timeout { op: &'static str, elapsed: Duration },

    #[error("route {0} has no geometry")]
    NoGeometry(RouteId),

    #[error("measure {measure} is not on route {route}")]
    OffRoute { route: RouteId, measure: f64 },

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Backend(Box<dyn std::error::Error + Send + Sync>),
}

impl ServiceError {
    pub fn backend<E>(err: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::Backend(err.into())
    }

    /// Whether retrying the same call could succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::Io(_) | Self::Backend(_))
    }
}


#[derive(Error, Debug)]
pub enum ProfileError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Service(#[from] ServiceError),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Csv(#[from] csv::Error),

    #[error("{0}")]
    Json(#[from] serde_json::Error),

    #[error("extraction cancelled")]
    Cancelled,
}
