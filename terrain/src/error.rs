use nasadem::NasademError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TerrainError {
    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("no height files in {0}")]
    Path(PathBuf),

    #[error("{0}")]
    Nasadem(#[from] NasademError),

    #[error("line needs at least two coordinates, got {0}")]
    Degenerate(usize),

    #[error("invalid measure range {begin}..{end}")]
    Measures { begin: f64, end: f64 },
}
