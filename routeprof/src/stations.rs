//! Sample Generator: raw (measure, elevation) samples for a route,
//! either from contour crossings or from DEM stations.

use crate::{
    assemble::RawSample,
    error::{ConfigError, ServiceError},
    route::Route,
    service::{CallPolicy, ContourService, RasterService},
};
use log::{debug, warn};

/// Raster values are meters; profiles are feet.
pub const FEET_PER_METER: f64 = 3.28084;

/// Most stations one route may be sampled at.
pub const MAX_STATIONS: u64 = 1_000_000;

/// Converts a raw raster value to feet.
pub fn to_feet(raster_value: f64) -> f64 {
    raster_value * FEET_PER_METER
}

/// Returns the DEM stations for a route spanning `begin..=end`.
///
/// Stations are the route start, every multiple of `interval` up to
/// `floor(end / interval) * interval` that lies past the start, and
/// the route end. The end is always included, even when it coincides
/// with the last multiple. Fails without allocating when the route
/// would need more than [`MAX_STATIONS`].
pub fn dem_stations(begin: f64, end: f64, interval: f64) -> Result<Vec<f64>, ConfigError> {
    let mut stations = vec![begin];
    if interval > 0.0 && end.is_finite() {
        let count = (end / interval).floor().max(0.0);
        #[allow(clippy::cast_precision_loss)]
        let max = MAX_STATIONS as f64;
        if count + 2.0 > max {
            return Err(ConfigError::TooManyStations {
                interval,
                count: count + 2.0,
                max: MAX_STATIONS,
            });
        }
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let n = count as u64;
        #[allow(clippy::cast_precision_loss)]
        let multiples = (1..=n).map(|i| interval * i as f64);
        stations.extend(multiples.filter(|&station| station > begin));
    }
    stations.push(end);
    Ok(stations)
}

/// Contour mode: the service's located crossings, passed through.
pub fn contour_samples(
    contours: &dyn ContourService,
    route: &Route,
    policy: &CallPolicy,
) -> Result<Vec<RawSample>, ServiceError> {
    let samples = policy.run("contour crossings", || contours.crossings(route))?;
    debug!("route {}: {} contour crossings", route.id, samples.len());
    Ok(samples)
}

/// DEM mode: places `stations` on the route and samples the raster
/// under each one, converting to feet.
///
/// Failing to build the event layer fails the route. A failed lookup
/// only leaves that one station without an elevation. All calls for
/// the route share one time budget; stations left when it is spent get
/// no elevation.
pub fn dem_samples(
    raster: &dyn RasterService,
    route: &Route,
    stations: &[f64],
    policy: &CallPolicy,
) -> Result<Vec<RawSample>, ServiceError> {
    let budget = policy.budget();
    let events = policy.run_within("locate events", &budget, || raster.locate(route, stations))?;
    let mut skipped = 0_usize;
    let samples = events
        .iter()
        .map(|event| {
            if budget.is_spent() {
                skipped += 1;
                return RawSample::new(event.measure, None);
            }
            let lookup = policy.run_within("sample raster", &budget, || raster.sample(event));
            let elevation = match lookup {
                Ok(raw) => raw.map(to_feet),
                Err(e) => {
                    warn!(
                        "route {}: no elevation at measure {}: {e}",
                        route.id, event.measure
                    );
                    None
                }
            };
            RawSample::new(event.measure, elevation)
        })
        .collect();
    if skipped > 0 {
        warn!(
            "route {}: time budget spent after {:?}, {skipped} stations not sampled",
            route.id,
            budget.elapsed()
        );
    }
    Ok(samples)
}

#[cfg(test)]
mod tests {
    use super::{dem_samples, dem_stations, to_feet, MAX_STATIONS};
    use crate::{
        error::{ConfigError, ServiceError},
        route::{Route, RouteId, Stage},
        service::{CallPolicy, Event, RasterService},
    };
    use approx::assert_relative_eq;
    use std::{cell::Cell, time::Duration};

    #[test]
    fn test_stations_with_multiples() {
        assert_eq!(
            dem_stations(0.0, 120.0, 50.0).unwrap(),
            vec![0.0, 50.0, 100.0, 120.0]
        );
    }

    #[test]
    fn test_stations_shorter_than_interval() {
        assert_eq!(dem_stations(0.0, 40.0, 50.0).unwrap(), vec![0.0, 40.0]);
    }

    #[test]
    fn test_end_on_multiple_kept() {
        assert_eq!(
            dem_stations(0.0, 100.0, 50.0).unwrap(),
            vec![0.0, 50.0, 100.0, 100.0]
        );
        assert_eq!(dem_stations(0.0, 50.0, 50.0).unwrap(), vec![0.0, 50.0, 50.0]);
    }

    #[test]
    fn test_stations_start_at_begin() {
        assert_eq!(
            dem_stations(60.0, 220.0, 50.0).unwrap(),
            vec![60.0, 100.0, 150.0, 200.0, 220.0]
        );
    }

    #[test]
    fn test_station_count_is_capped() {
        let err = dem_stations(0.0, 1e6, 1e-6).unwrap_err();
        assert!(matches!(err, ConfigError::TooManyStations { max: MAX_STATIONS, .. }));
        #[allow(clippy::cast_precision_loss)]
        let longest = (MAX_STATIONS - 2) as f64;
        assert_eq!(dem_stations(0.0, longest, 1.0).unwrap().len() as u64, MAX_STATIONS);
    }

    #[test]
    fn test_to_feet() {
        assert_relative_eq!(to_feet(100.0), 328.084);
    }

    /// Raster that fails on odd multiples of 50 and has no data past 100.
    struct Patchy;

    impl RasterService for Patchy {
        fn locate(&self, route: &Route, stations: &[f64]) -> Result<Vec<Event>, ServiceError> {
            Ok(stations
                .iter()
                .map(|&measure| Event {
                    route_id: route.id,
                    measure,
                    location: None,
                })
                .collect())
        }

        fn sample(&self, event: &Event) -> Result<Option<f64>, ServiceError> {
            if event.measure > 100.0 {
                Ok(None)
            } else if (event.measure / 50.0) as u64 % 2 == 1 {
                Err(ServiceError::OffRoute {
                    route: event.route_id,
                    measure: event.measure,
                })
            } else {
                Ok(Some(event.measure))
            }
        }
    }

    #[test]
    fn test_station_failures_are_local() {
        let route = Route {
            id: RouteId(1),
            stage: Stage::new("1"),
            segment_group: None,
            system: None,
            begin_measure: 0.0,
            end_measure: 120.0,
        };
        let policy = CallPolicy {
            timeout: Duration::from_secs(1),
            attempts: 2,
            backoff: Duration::ZERO,
        };
        let stations = dem_stations(0.0, 120.0, 50.0).unwrap();
        let samples = dem_samples(&Patchy, &route, &stations, &policy).unwrap();
        let elevations: Vec<Option<f64>> = samples.iter().map(|s| s.elevation).collect();
        assert_eq!(elevations, vec![Some(0.0), None, Some(to_feet(100.0)), None]);
    }

    /// Raster whose lookups each take longer than the whole budget.
    struct Sluggish {
        calls: Cell<u32>,
    }

    impl RasterService for Sluggish {
        fn locate(&self, route: &Route, stations: &[f64]) -> Result<Vec<Event>, ServiceError> {
            Patchy.locate(route, stations)
        }

        fn sample(&self, _event: &Event) -> Result<Option<f64>, ServiceError> {
            self.calls.set(self.calls.get() + 1);
            std::thread::sleep(Duration::from_millis(30));
            Ok(Some(10.0))
        }
    }

    #[test]
    fn test_spent_budget_leaves_stations_unsampled() {
        let route = Route {
            id: RouteId(2),
            stage: Stage::new("3"),
            segment_group: None,
            system: None,
            begin_measure: 0.0,
            end_measure: 120.0,
        };
        let policy = CallPolicy {
            timeout: Duration::from_millis(20),
            attempts: 3,
            backoff: Duration::ZERO,
        };
        let raster = Sluggish { calls: Cell::new(0) };
        let stations = dem_stations(0.0, 120.0, 50.0).unwrap();
        let samples = dem_samples(&raster, &route, &stations, &policy).unwrap();
        let elevations: Vec<Option<f64>> = samples.iter().map(|s| s.elevation).collect();
        // The first lookup finishes late but keeps its value.
        assert_eq!(elevations, vec![Some(to_feet(10.0)), None, None, None]);
        assert_eq!(raster.calls.get(), 1);
    }
}
