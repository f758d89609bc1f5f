//! Contour crossings computed from a GeoJSON contour layer.

use crate::store::{coord, GeoJsonRoutes};
use anyhow::{bail, Context, Result};
use geo::{
    algorithm::line_intersection::{line_intersection, LineIntersection},
    geometry::{Coord, LineString, MultiLineString, Rect},
    BoundingRect, Intersects,
};
use geojson::GeoJson;
use log::{debug, warn};
use routeprof::{ContourService, RawSample, Route, ServiceError, FEET_PER_METER};
use std::{fs::File, io::BufReader, path::Path};
use terrain::MeasuredLine;

/// Meters per degree of latitude.
const METERS_PER_DEGREE: f64 = 111_319.49;

struct Contour {
    lines: MultiLineString<f64>,
    bbox: Rect<f64>,
    /// Feet.
    elevation: f64,
}

pub struct GeoContours<'a> {
    routes: &'a GeoJsonRoutes,
    contours: Vec<Contour>,
    buffer_m: f64,
    search_radius_m: f64,
}

impl<'a> GeoContours<'a> {
    pub fn open(
        path: &Path,
        routes: &'a GeoJsonRoutes,
        buffer_ft: f64,
        search_radius_ft: f64,
    ) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("opening {path:?}"))?;
        let geojson = GeoJson::from_reader(BufReader::new(file))?;
        let contours = read_contours(geojson).with_context(|| format!("reading {path:?}"))?;
        Ok(Self::new(contours, routes, buffer_ft, search_radius_ft))
    }

    fn new(
        contours: Vec<Contour>,
        routes: &'a GeoJsonRoutes,
        buffer_ft: f64,
        search_radius_ft: f64,
    ) -> Self {
        debug!("{} contour features", contours.len());
        Self {
            routes,
            contours,
            buffer_m: buffer_ft / FEET_PER_METER,
            search_radius_m: search_radius_ft / FEET_PER_METER,
        }
    }
}

impl<'a> ContourService for GeoContours<'a> {
    fn crossings(&self, route: &Route) -> Result<Vec<RawSample>, ServiceError> {
        let line = self
            .routes
            .line(route.id)
            .ok_or(ServiceError::NoGeometry(route.id))?;
        let measured = MeasuredLine::new(line, route.begin_measure, route.end_measure)
            .map_err(ServiceError::backend)?;

        let buffer = grow(measured.envelope(), self.buffer_m);
        let mut samples = Vec::new();
        for contour in self.contours.iter().filter(|c| c.bbox.intersects(&buffer)) {
            for point in intersections(line, &contour.lines) {
                match measured.locate(point, self.search_radius_m) {
                    Some(measure) => samples.push(RawSample::new(measure, Some(contour.elevation))),
                    None => debug!("route {}: crossing {point:?} not on route", route.id),
                }
            }
        }
        Ok(samples)
    }
}

/// Returns every point where `route` meets `contour`. Collinear
/// overlaps contribute both of their endpoints.
fn intersections(route: &LineString<f64>, contour: &MultiLineString<f64>) -> Vec<Coord<f64>> {
    let mut points = Vec::new();
    for route_seg in route.lines() {
        for contour_seg in contour.iter().flat_map(LineString::lines) {
            match line_intersection(route_seg, contour_seg) {
                Some(LineIntersection::SinglePoint { intersection, .. }) => {
                    points.push(intersection);
                }
                Some(LineIntersection::Collinear { intersection }) => {
                    points.push(intersection.start);
                    points.push(intersection.end);
                }
                None => (),
            }
        }
    }
    points
}

/// Grows `rect` by `meters` on every side.
fn grow(rect: Rect<f64>, meters: f64) -> Rect<f64> {
    let dy = meters / METERS_PER_DEGREE;
    let lat = rect.min().y.abs().max(rect.max().y.abs()).min(89.0);
    let dx = dy / lat.to_radians().cos();
    Rect::new(
        Coord {
            x: rect.min().x - dx,
            y: rect.min().y - dy,
        },
        Coord {
            x: rect.max().x + dx,
            y: rect.max().y + dy,
        },
    )
}

fn read_contours(geojson: GeoJson) -> Result<Vec<Contour>> {
    let GeoJson::FeatureCollection(collection) = geojson else {
        bail!("expected a feature collection");
    };
    let mut contours = Vec::with_capacity(collection.features.len());
    for (idx, feature) in collection.features.iter().enumerate() {
        let Some(elevation) = feature.property("Contour").and_then(|v| v.as_f64()) else {
            warn!("contour feature {idx} has no Contour value, skipping");
            continue;
        };
        let lines = match feature.geometry.as_ref().map(|g| &g.value) {
            Some(geojson::Value::LineString(positions)) => vec![line(positions)],
            Some(geojson::Value::MultiLineString(parts)) => {
                parts.iter().map(|part| line(part)).collect()
            }
            _ => {
                warn!("contour feature {idx} is not a line, skipping");
                continue;
            }
        };
        let lines = MultiLineString::new(lines);
        if let Some(bbox) = lines.bounding_rect() {
            contours.push(Contour {
                lines,
                bbox,
                elevation,
            });
        }
    }
    Ok(contours)
}

fn line(positions: &[Vec<f64>]) -> LineString<f64> {
    positions.iter().filter_map(|p| coord(p)).collect()
}
