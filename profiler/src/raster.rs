//! DEM sampling backed by NASADEM tiles.

use crate::store::GeoJsonRoutes;
use log::debug;
use routeprof::{Event, RasterService, Route, ServiceError};
use terrain::{MeasuredLine, Tiles};

pub struct DemRaster<'a> {
    routes: &'a GeoJsonRoutes,
    tiles: Tiles,
}

impl<'a> DemRaster<'a> {
    pub fn new(routes: &'a GeoJsonRoutes, tiles: Tiles) -> Self {
        Self { routes, tiles }
    }
}

impl<'a> RasterService for DemRaster<'a> {
    fn locate(&self, route: &Route, stations: &[f64]) -> Result<Vec<Event>, ServiceError> {
        let line = self
            .routes
            .line(route.id)
            .ok_or(ServiceError::NoGeometry(route.id))?;
        let measured = MeasuredLine::new(line, route.begin_measure, route.end_measure)
            .map_err(ServiceError::backend)?;
        let events: Vec<Event> = stations
            .iter()
            .map(|&measure| Event {
                route_id: route.id,
                measure,
                location: measured.point_at(measure),
            })
            .collect();
        debug!(
            "route {}: located {} of {} stations",
            route.id,
            events.iter().filter(|e| e.location.is_some()).count(),
            events.len()
        );
        Ok(events)
    }

    fn sample(&self, event: &Event) -> Result<Option<f64>, ServiceError> {
        let coord = event.location.ok_or(ServiceError::OffRoute {
            route: event.route_id,
            measure: event.measure,
        })?;
        let raw = self
            .tiles
            .elevation(coord)
            .map_err(ServiceError::backend)?;
        Ok(raw.map(f64::from))
    }
}
