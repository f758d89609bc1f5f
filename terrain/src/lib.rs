mod error;
mod measure;
mod tiles;

pub use crate::{
    error::TerrainError,
    measure::MeasuredLine,
    tiles::{TileMode, Tiles},
};
pub use geo;
