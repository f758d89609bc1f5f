//! Profile Assembler: builds one route's ordered, deduplicated
//! measure/elevation series from raw samples.

use crate::route::{Route, RouteId};
use log::warn;
use serde::Serialize;
use std::cmp::Ordering;

/// Decimal places kept on elevations.
pub const ELEVATION_DECIMALS: i32 = 2;

/// A sample before assembly; elevation in feet, when known.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawSample {
    pub measure: f64,
    pub elevation: Option<f64>,
}

impl RawSample {
    pub fn new(measure: f64, elevation: Option<f64>) -> Self {
        Self { measure, elevation }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProfileRow {
    pub measure: f64,
    pub route_id: RouteId,
    pub elevation: Option<f64>,
}

/// One route's profile, ascending by measure with distinct measures.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileSeries {
    pub route_id: RouteId,
    pub rows: Vec<ProfileRow>,
}

impl ProfileSeries {
    /// Number of rows without an elevation.
    pub fn missing(&self) -> usize {
        self.rows.iter().filter(|row| row.elevation.is_none()).count()
    }
}

/// Assembles `route`'s profile series from `samples`.
///
/// Boundary rows at the route's begin and end measures are added and
/// given the elevation of their immediate neighbor. Samples whose
/// measure is not finite are dropped.
pub fn assemble(route: &Route, samples: &[RawSample]) -> ProfileSeries {
    let dropped = samples.iter().filter(|s| !s.measure.is_finite()).count();
    if dropped > 0 {
        warn!("route {}: dropped {dropped} samples without a measure", route.id);
    }

    // Begin row first and end row last, so that after the stable sort
    // a boundary sharing a measure with a real sample sits outside it.
    let mut union = Vec::with_capacity(samples.len() + 2);
    union.push(RawSample::new(route.begin_measure, None));
    union.extend(samples.iter().copied().filter(|s| s.measure.is_finite()));
    union.push(RawSample::new(route.end_measure, None));
    union.sort_by(|a, b| a.measure.total_cmp(&b.measure));

    let mut rows: Vec<ProfileRow> = repair_boundaries(union)
        .into_iter()
        .map(|sample| ProfileRow {
            measure: sample.measure,
            route_id: route.id,
            elevation: sample.elevation.map(round_elevation),
        })
        .collect();
    dedup_rows(&mut rows);

    ProfileSeries {
        route_id: route.id,
        rows,
    }
}

/// Returns `samples` with the first sample's elevation copied from the
/// second, and the last sample's from the next-to-last.
///
/// Elevations are copied, not interpolated. A neighbor without an
/// elevation leaves the boundary without one too.
pub fn repair_boundaries(mut samples: Vec<RawSample>) -> Vec<RawSample> {
    if let Some(next) = samples.get(1).map(|s| s.elevation) {
        samples[0].elevation = next;
    }
    let len = samples.len();
    if len >= 2 {
        samples[len - 1].elevation = samples[len - 2].elevation;
    }
    samples
}

/// Rounds an elevation to [`ELEVATION_DECIMALS`] places.
pub fn round_elevation(elevation: f64) -> f64 {
    let scale = 10_f64.powi(ELEVATION_DECIMALS);
    (elevation * scale).round() / scale
}

/// Orders rows by (route, measure).
pub(crate) fn cmp_rows(a: &ProfileRow, b: &ProfileRow) -> Ordering {
    a.route_id
        .cmp(&b.route_id)
        .then_with(|| a.measure.total_cmp(&b.measure))
}

/// Drops rows repeating the previous row's (route, measure), keeping
/// the first. Expects rows sorted by [`cmp_rows`].
pub(crate) fn dedup_rows(rows: &mut Vec<ProfileRow>) {
    rows.dedup_by(|later, earlier| {
        later.route_id == earlier.route_id && later.measure == earlier.measure
    });
}
