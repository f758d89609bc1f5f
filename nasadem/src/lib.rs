//! NASADEM evelation (`.hgt`) file format.
//!
//! A tile covers one square degree. Samples are big-endian `i16`
//! meters, stored row-major from the northernmost row down, with the
//! center of the southwest sample sitting exactly on the integer
//! corner named by the file (e.g. `N44W072.hgt`).
//!
//! # References
//!
//! 1. [HGT file layout](http://fileformats.archiveteam.org/index.php?title=HGT&oldid=17250)
//! 1. [SRTM Collection User Guide](https://lpdaac.usgs.gov/documents/179/SRTM_User_Guide_V3.pdf)

mod error;

pub use crate::error::NasademError;
use byteorder::{BigEndian as BE, ReadBytesExt};
use geo::geometry::Coord;
use memmap2::Mmap;
use std::{fs::File, io::BufReader, mem::size_of, path::Path};

/// Base floating point type used for all coordinates.
pub type C = f64;

/// Raw sample value SRTM uses to mark a hole in the data.
pub const VOID: i16 = i16::MIN;

const ARCSEC_PER_DEG: C = 3600.0;

pub struct Tile {
    /// Southwest corner of the tile.
    ///
    /// Specificlly, the _center_ of the SW most sample of the tile.
    sw_corner_center: Coord<C>,

    /// Arcseconds per sample.
    resolution: u8,

    /// Number of (columns, rows) in this tile.
    dimensions: (usize, usize),

    /// Elevation samples.
    samples: SampleStore,
}

enum SampleStore {
    /// Stand-in for a tile that doesn't exist on disk (e.g. ocean).
    Void,
    InMem(Box<[i16]>),
    MemMap(Mmap),
}

impl SampleStore {
    fn get(&self, index: usize) -> Option<i16> {
        let raw = match self {
            Self::Void => return None,
            Self::InMem(samples) => *samples.get(index)?,
            Self::MemMap(raw) => {
                let start = index * size_of::<i16>();
                let bytes = &mut raw.get(start..start + size_of::<i16>())?;
                bytes.read_i16::<BE>().ok()?
            }
        };
        (raw != VOID).then_some(raw)
    }
}

impl Tile {
    /// Returns a Tile read into memory from the file at `path`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, NasademError> {
        let (resolution, dimensions @ (cols, rows)) = extract_resolution(&path)?;
        let sw_corner_center = sw_corner_center(&path)?;

        let mut file = BufReader::new(File::open(path)?);
        let mut samples = Vec::with_capacity(cols * rows);
        for _ in 0..(cols * rows) {
            samples.push(file.read_i16::<BE>()?);
        }

        Ok(Self {
            sw_corner_center,
            resolution,
            dimensions,
            samples: SampleStore::InMem(samples.into_boxed_slice()),
        })
    }

    /// Returns a Tile using the memory-mapped file as storage.
    pub fn memmap<P: AsRef<Path>>(path: P) -> Result<Self, NasademError> {
        let (resolution, dimensions) = extract_resolution(&path)?;
        let sw_corner_center = sw_corner_center(&path)?;

        let samples = {
            let file = File::open(path)?;
            // Safety: tiles are read-only inputs; nothing in this
            // process writes to them while mapped.
            let mmap = unsafe { Mmap::map(&file)? };
            SampleStore::MemMap(mmap)
        };

        Ok(Self {
            sw_corner_center,
            resolution,
            dimensions,
            samples,
        })
    }

    /// Returns a tile where every sample is missing.
    pub fn void(sw_corner: Coord<i16>) -> Self {
        Self {
            sw_corner_center: Coord {
                x: C::from(sw_corner.x),
                y: C::from(sw_corner.y),
            },
            resolution: 3,
            dimensions: (1201, 1201),
            samples: SampleStore::Void,
        }
    }

    /// Returns the number of samples in this tile.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        let (x, y) = self.dimensions;
        x * y
    }

    /// Rreturns this tile's resolution in arcseconds per sample.
    pub fn resolution(&self) -> u8 {
        self.resolution
    }

    /// Returns `true` if `coord` falls on one of this tile's samples.
    pub fn contains(&self, coord: Coord<C>) -> bool {
        self.coord_to_xy(coord).is_some()
    }

    /// Returns the sample nearest to the given geo coordinates.
    ///
    /// `None` when `coord` is outside this tile or the sample is void.
    pub fn get(&self, coord: Coord<C>) -> Option<i16> {
        let xy = self.coord_to_xy(coord)?;
        self.samples.get(self.xy_to_linear_index(xy))
    }
}

/// Private API
impl Tile {
    fn coord_to_xy(&self, coord: Coord<C>) -> Option<(usize, usize)> {
        let samples_per_deg = ARCSEC_PER_DEG / C::from(self.resolution);
        let x = ((coord.x - self.sw_corner_center.x) * samples_per_deg).round();
        let y = ((coord.y - self.sw_corner_center.y) * samples_per_deg).round();
        let (cols, rows) = self.dimensions;
        #[allow(clippy::cast_precision_loss)]
        if 0.0 <= x && x < cols as C && 0.0 <= y && y < rows as C {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            Some((x as usize, y as usize))
        } else {
            None
        }
    }

    fn xy_to_linear_index(&self, (x, y): (usize, usize)) -> usize {
        let (cols, rows) = self.dimensions;
        cols * (rows - y - 1) + x
    }
}

fn extract_resolution<P: AsRef<Path>>(path: P) -> Result<(u8, (usize, usize)), NasademError> {
    const RES_1_ARCSECONDS_FILE_LEN: u64 = 3601 * 3601 * size_of::<u16>() as u64;
    const RES_3_ARCSECONDS_FILE_LEN: u64 = 1201 * 1201 * size_of::<u16>() as u64;
    match path.as_ref().metadata().map(|m| m.len())? {
        RES_1_ARCSECONDS_FILE_LEN => Ok((1, (3601, 3601))),
        RES_3_ARCSECONDS_FILE_LEN => Ok((3, (1201, 1201))),
        invalid_len => Err(NasademError::HgtLen(invalid_len, path.as_ref().to_owned())),
    }
}

fn sw_corner_center<P: AsRef<Path>>(path: P) -> Result<Coord<C>, NasademError> {
    let Coord { x, y } = parse_sw_corner(path)?;
    Ok(Coord {
        x: C::from(x),
        y: C::from(y),
    })
}

/// Parses the integer southwest corner out of a name like `N44W072`.
pub fn parse_sw_corner<P: AsRef<Path>>(path: P) -> Result<Coord<i16>, NasademError> {
    let mk_err = || NasademError::HgtName(path.as_ref().to_owned());
    let name = path
        .as_ref()
        .file_stem()
        .and_then(std::ffi::OsStr::to_str)
        .ok_or_else(mk_err)?;
    if name.len() != 7 || !name.is_ascii() {
        return Err(mk_err());
    }
    let lat_sign = match &name[0..1] {
        "N" | "n" => 1,
        "S" | "s" => -1,
        _ => return Err(mk_err()),
    };
    let lat = lat_sign * name[1..3].parse::<i16>().map_err(|_| mk_err())?;
    let lon_sign = match &name[3..4] {
        "E" | "e" => 1,
        "W" | "w" => -1,
        _ => return Err(mk_err()),
    };
    let lon = lon_sign * name[4..7].parse::<i16>().map_err(|_| mk_err())?;
    Ok(Coord { x: lon, y: lat })
}
