//! Interfaces to the external route store, geometry, and raster
//! services, plus the timeout/retry policy applied to every call.

use crate::{
    assemble::RawSample,
    error::ServiceError,
    merge::MergedTable,
    route::{Route, RouteId, RouteQuery},
    ProfileError,
};
use geo::geometry::Coord;
use log::warn;
use std::{
    thread,
    time::{Duration, Instant},
};

pub trait RouteStore {
    /// Returns every route record.
    fn scan(&self) -> Result<Vec<Route>, ServiceError>;

    /// Returns the routes matching `query`, in any order.
    fn fetch(&self, query: &RouteQuery) -> Result<Vec<Route>, ServiceError>;
}

/// Contour-line geometry: buffer, clip, intersect, explode, and
/// locate for one route.
pub trait ContourService {
    /// Returns the route's contour crossings as (measure, elevation)
    /// samples.
    fn crossings(&self, route: &Route) -> Result<Vec<RawSample>, ServiceError>;
}

/// A station placed on a route.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Event {
    pub route_id: RouteId,
    pub measure: f64,
    /// `None` when the station could not be placed on the route.
    pub location: Option<Coord<f64>>,
}

pub trait RasterService {
    /// Builds an event layer: one event per station, in order.
    fn locate(&self, route: &Route, stations: &[f64]) -> Result<Vec<Event>, ServiceError>;

    /// Returns the raw raster value under `event`, or `None` where
    /// the raster has no data.
    fn sample(&self, event: &Event) -> Result<Option<f64>, ServiceError>;
}

pub trait OutputSink {
    fn write(&self, table: &MergedTable) -> Result<(), ProfileError>;
}

/// Timeout and retry policy for external calls.
///
/// Calls are synchronous and cannot be interrupted, so `timeout` is a
/// time budget: no new attempt starts once it is spent. A call that
/// returns late keeps its result. Only transient errors are retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallPolicy {
    pub timeout: Duration,
    pub attempts: u32,
    pub backoff: Duration,
}

impl Default for CallPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            attempts: 3,
            backoff: Duration::from_millis(250),
        }
    }
}

/// Time allowed for every call made on behalf of one unit of work.
#[derive(Debug, Clone, Copy)]
pub struct Budget {
    started: Instant,
    limit: Duration,
}

impl Budget {
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn is_spent(&self) -> bool {
        self.elapsed() >= self.limit
    }
}

impl CallPolicy {
    /// Starts a new budget of `timeout`.
    pub fn budget(&self) -> Budget {
        Budget {
            started: Instant::now(),
            limit: self.timeout,
        }
    }

    /// Runs `call` under a budget of its own.
    pub fn run<T>(
        &self,
        op: &'static str,
        call: impl FnMut() -> Result<T, ServiceError>,
    ) -> Result<T, ServiceError> {
        self.run_within(op, &self.budget(), call)
    }

    /// Runs `call` until it succeeds, fails permanently, runs out of
    /// attempts, or `budget` is spent.
    pub fn run_within<T>(
        &self,
        op: &'static str,
        budget: &Budget,
        mut call: impl FnMut() -> Result<T, ServiceError>,
    ) -> Result<T, ServiceError> {
        let attempts = self.attempts.max(1);
        let mut attempt = 1;
        loop {
            if budget.is_spent() {
                return Err(ServiceError::Timeout {
                    op,
                    elapsed: budget.elapsed(),
                });
            }
            let err = match call() {
                Ok(val) => {
                    if budget.is_spent() {
                        warn!("{op}: finished after {:?}", budget.elapsed());
                    }
                    return Ok(val);
                }
                Err(e) => e,
            };
            if attempt >= attempts || !err.is_transient() {
                return Err(err);
            }
            warn!("{op}: attempt {attempt}/{attempts} failed: {err}");
            attempt += 1;
            thread::sleep(self.backoff);
        }
    }
}
