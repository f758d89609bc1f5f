//! Elevation lookups across a directory of NASADEM height files.

use crate::TerrainError;
use dashmap::DashMap;
use geo::geometry::Coord;
use log::debug;
use nasadem::{NasademError, Tile};
use std::{ffi::OsStr, fs, io::ErrorKind, path::PathBuf, sync::Arc};

/// Lazily opened height tiles, keyed by the whole-degree corner they
/// start at. Cells with no file on disk read as void.
pub struct Tiles {
    dir: PathBuf,
    mode: TileMode,
    open: DashMap<Coord<i16>, Arc<Tile>>,
}

impl Tiles {
    /// Fails unless `dir` holds at least one `.hgt` file.
    pub fn new(dir: PathBuf, mode: TileMode) -> Result<Self, TerrainError> {
        let mut entries = fs::read_dir(&dir)?;
        let has_heights = entries.try_fold(false, |found, entry| {
            let path = entry?.path();
            let hgt = path
                .extension()
                .and_then(OsStr::to_str)
                .is_some_and(|ext| ext.eq_ignore_ascii_case("hgt"));
            Ok::<_, std::io::Error>(found || hgt)
        })?;
        if !has_heights {
            return Err(TerrainError::Path(dir));
        }
        Ok(Self {
            dir,
            mode,
            open: DashMap::new(),
        })
    }

    /// Raw elevation in meters at `coord`, `None` for void samples
    /// and cells without a file.
    pub fn elevation(&self, coord: Coord<f64>) -> Result<Option<i16>, TerrainError> {
        Ok(self.tile(coord)?.get(coord))
    }
}

impl Tiles {
    fn tile(&self, coord: Coord<f64>) -> Result<Arc<Tile>, TerrainError> {
        let corner = corner(coord);
        let tile = self
            .open
            .entry(corner)
            .or_try_insert_with(|| self.open_tile(corner).map(Arc::new))?;
        Ok(Arc::clone(&tile))
    }

    fn open_tile(&self, corner: Coord<i16>) -> Result<Tile, TerrainError> {
        let name = file_name(corner);
        let path = [name.clone(), name.to_lowercase()]
            .into_iter()
            .map(|name| self.dir.join(name))
            .find(|path| path.exists())
            .unwrap_or_else(|| self.dir.join(&name));
        let opened = match self.mode {
            TileMode::InMem => Tile::load(&path),
            TileMode::MemMap => Tile::memmap(&path),
        };
        match opened {
            Ok(tile) => {
                debug!("opened {path:?}");
                Ok(tile)
            }
            Err(NasademError::Io(e)) if e.kind() == ErrorKind::NotFound => {
                debug!("no tile for {corner:?}, reading as void");
                Ok(Tile::void(corner))
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Whether tile samples are read into memory or mapped from disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TileMode {
    /// Read each tile fully on first use. Uses about 2.8 MB per
    /// 3-arcsecond tile.
    InMem,

    #[default]
    MemMap,
}

fn corner(Coord { x, y }: Coord<f64>) -> Coord<i16> {
    #[allow(clippy::cast_possible_truncation)]
    Coord {
        x: x.floor() as i16,
        y: y.floor() as i16,
    }
}

/// `N44W072.hgt` style name for the tile starting at `corner`.
fn file_name(Coord { x, y }: Coord<i16>) -> String {
    let ns = if y < 0 { 'S' } else { 'N' };
    let ew = if x < 0 { 'W' } else { 'E' };
    format!("{ns}{:02}{ew}{:03}.hgt", y.unsigned_abs(), x.unsigned_abs())
}
