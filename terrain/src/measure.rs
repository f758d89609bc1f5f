//! Linear referencing: converting between route measures and
//! geographic positions along a route's polyline.
//!
//! Measures are spread proportionally over the great-circle length of
//! the line, so a measure's unit is whatever the route's begin/end
//! measures use.

use crate::TerrainError;
use geo::{
    algorithm::HaversineDistance,
    geometry::{Coord, LineString, Point, Rect},
    BoundingRect,
};

#[derive(Debug, Clone, PartialEq)]
pub struct MeasuredLine {
    coords: Vec<Coord<f64>>,

    /// Great-circle distance, in meters, from the first coordinate to
    /// each coordinate.
    cumulative_m: Vec<f64>,

    begin: f64,

    end: f64,
}

impl MeasuredLine {
    pub fn new(line: &LineString<f64>, begin: f64, end: f64) -> Result<Self, TerrainError> {
        if line.0.len() < 2 {
            return Err(TerrainError::Degenerate(line.0.len()));
        }
        if !(begin.is_finite() && end.is_finite() && begin <= end) {
            return Err(TerrainError::Measures { begin, end });
        }
        let mut cumulative_m = Vec::with_capacity(line.0.len());
        let mut total = 0.0;
        cumulative_m.push(total);
        for segment in line.lines() {
            total += Point::from(segment.start).haversine_distance(&Point::from(segment.end));
            cumulative_m.push(total);
        }
        Ok(Self {
            coords: line.0.clone(),
            cumulative_m,
            begin,
            end,
        })
    }

    /// Total great-circle length in meters.
    pub fn length_m(&self) -> f64 {
        self.cumulative_m.last().copied().unwrap_or_default()
    }

    pub fn begin(&self) -> f64 {
        self.begin
    }

    pub fn end(&self) -> f64 {
        self.end
    }

    /// Bounding box of the line.
    pub fn envelope(&self) -> Rect<f64> {
        // `new` guarantees at least two coordinates.
        LineString::from(self.coords.clone())
            .bounding_rect()
            .unwrap_or_else(|| Rect::new(self.coords[0], self.coords[0]))
    }

    pub fn coords(&self) -> &[Coord<f64>] {
        &self.coords
    }

    /// Returns the position of `measure`, or `None` when `measure`
    /// lies outside the route.
    pub fn point_at(&self, measure: f64) -> Option<Coord<f64>> {
        let slack = 1e-9 * self.end.abs().max(1.0);
        if !measure.is_finite() || measure < self.begin - slack || measure > self.end + slack {
            return None;
        }
        let span = self.end - self.begin;
        let fraction = if span > 0.0 {
            ((measure - self.begin) / span).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let target = fraction * self.length_m();

        let idx = self.cumulative_m.partition_point(|&d| d < target);
        if idx == 0 {
            return Some(self.coords[0]);
        }
        let idx = idx.min(self.coords.len() - 1);
        let (a, b) = (self.coords[idx - 1], self.coords[idx]);
        let seg_len = self.cumulative_m[idx] - self.cumulative_m[idx - 1];
        if seg_len <= 0.0 {
            return Some(b);
        }
        let t = ((target - self.cumulative_m[idx - 1]) / seg_len).clamp(0.0, 1.0);
        Some(Coord {
            x: a.x + (b.x - a.x) * t,
            y: a.y + (b.y - a.y) * t,
        })
    }

    /// Projects `coord` onto the line and returns its measure, if the
    /// line passes within `tolerance_m` meters of it.
    ///
    /// When several segments are equally close, the first one wins.
    pub fn locate(&self, coord: Coord<f64>, tolerance_m: f64) -> Option<f64> {
        // Longitude degrees shrink with latitude; scale them so the
        // planar projection below is roughly conformal.
        let k = coord.y.to_radians().cos();
        let mut best: Option<(f64, f64)> = None;
        for (i, pair) in self.coords.windows(2).enumerate() {
            let (a, b) = (pair[0], pair[1]);
            let (dx, dy) = ((b.x - a.x) * k, b.y - a.y);
            let (px, py) = ((coord.x - a.x) * k, coord.y - a.y);
            let len2 = dx * dx + dy * dy;
            let u = if len2 > 0.0 {
                ((px * dx + py * dy) / len2).clamp(0.0, 1.0)
            } else {
                0.0
            };
            let closest = Coord {
                x: a.x + (b.x - a.x) * u,
                y: a.y + (b.y - a.y) * u,
            };
            let dist_m = Point::from(coord).haversine_distance(&Point::from(closest));
            let along_m =
                self.cumulative_m[i] + u * (self.cumulative_m[i + 1] - self.cumulative_m[i]);
            if best.map_or(true, |(best_dist, _)| dist_m < best_dist) {
                best = Some((dist_m, along_m));
            }
        }
        let (dist_m, along_m) = best?;
        if dist_m > tolerance_m {
            return None;
        }
        let length = self.length_m();
        let fraction = if length > 0.0 { along_m / length } else { 0.0 };
        Some(self.begin + fraction * (self.end - self.begin))
    }
}
