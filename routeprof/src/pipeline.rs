//! End-to-end extraction: select, sample, assemble, merge, write.

use crate::{
    assemble::{assemble, ProfileSeries},
    cancel::CancelToken,
    config::{ExtractionConfig, Method},
    error::ConfigError,
    merge::{merge, MergedTable},
    route::{Route, RouteId, RouteQuery},
    select::select_routes,
    service::{CallPolicy, ContourService, OutputSink, RasterService, RouteStore},
    stations::{contour_samples, dem_samples, dem_stations},
    workspace::Workspace,
    ProfileError,
};
use log::{info, warn};
use std::{collections::HashMap, fmt};

/// Outcome for one selected route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteStatus {
    /// Every row has an elevation.
    Profiled,
    /// Some rows lack an elevation.
    Partial { missing: usize },
    /// No row has an elevation; only boundary rows were written when
    /// sampling failed outright, none when the measures are unusable.
    Unprofiled { reason: String },
    /// Selected, but the store returned no such route.
    Missing,
}

impl fmt::Display for RouteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Profiled => f.write_str("profiled"),
            Self::Partial { missing } => write!(f, "partially profiled, {missing} rows without elevation"),
            Self::Unprofiled { reason } => write!(f, "unprofiled, {reason}"),
            Self::Missing => f.write_str("not found in route store"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Report {
    /// Per-route outcome, in selection order.
    pub routes: Vec<(RouteId, RouteStatus)>,
    /// Rows written to the output.
    pub rows: usize,
}

impl Report {
    /// Returns `true` if every selected route was fully profiled.
    pub fn is_complete(&self) -> bool {
        self.routes
            .iter()
            .all(|(_, status)| *status == RouteStatus::Profiled)
    }

    pub fn incomplete(&self) -> impl Iterator<Item = &(RouteId, RouteStatus)> {
        self.routes
            .iter()
            .filter(|(_, status)| *status != RouteStatus::Profiled)
    }
}

/// Progress hooks. All methods default to doing nothing.
pub trait Observer {
    fn routes_selected(&self, _ids: &[RouteId]) {}

    fn route_finished(&self, _id: RouteId, _status: &RouteStatus) {}
}

/// An [`Observer`] that ignores everything.
pub struct Quiet;

impl Observer for Quiet {}

#[derive(Clone, Copy)]
enum Sampler<'a> {
    Contour(&'a dyn ContourService),
    Dem {
        raster: &'a dyn RasterService,
        interval: f64,
    },
}

pub struct Pipeline<'a> {
    config: ExtractionConfig,
    routes: &'a dyn RouteStore,
    sampler: Sampler<'a>,
    sink: &'a dyn OutputSink,
    workspace: Option<&'a mut Workspace>,
    observer: &'a dyn Observer,
    policy: CallPolicy,
    cancel: CancelToken,
}

impl<'a> Pipeline<'a> {
    pub fn builder() -> PipelineBuilder<'a> {
        PipelineBuilder {
            config: None,
            routes: None,
            contours: None,
            raster: None,
            sink: None,
            workspace: None,
            observer: &Quiet,
            policy: CallPolicy::default(),
            cancel: CancelToken::default(),
        }
    }

    /// Runs the extraction to completion.
    ///
    /// Route store failures and output failures abort the run. Geometry
    /// and raster failures only mark the affected route in the
    /// returned [`Report`].
    pub fn run(&mut self) -> Result<Report, ProfileError> {
        if let Some(workspace) = self.workspace.as_deref_mut() {
            workspace.clear_out()?;
            workspace.record_config(&self.config)?;
        }

        let routes = self.routes;
        let records = self.policy.run("scan routes", || routes.scan())?;
        let ids = select_routes(self.config.selection(), &records);
        self.observer.routes_selected(&ids);
        if ids.is_empty() {
            warn!("no routes matched the selection");
            self.sink.write(&MergedTable::default())?;
            return Ok(Report::default());
        }

        let query = RouteQuery::by_ids(&ids);
        let mut fetched: HashMap<RouteId, Route> = HashMap::with_capacity(ids.len());
        for route in self.policy.run("fetch routes", || routes.fetch(&query))? {
            fetched.entry(route.id).or_insert(route);
        }
        info!("route query complete, {} of {} found", fetched.len(), ids.len());

        let mut report = Report::default();
        let mut profiles = Vec::with_capacity(ids.len());
        for id in ids {
            if self.cancel.is_cancelled() {
                warn!("cancelled before route {id}");
                return Err(ProfileError::Cancelled);
            }
            let status = match fetched.remove(&id) {
                None => RouteStatus::Missing,
                Some(route) => {
                    let (series, status) = self.profile_route(&route)?;
                    profiles.push(series);
                    status
                }
            };
            info!("route {id}: {status}");
            self.observer.route_finished(id, &status);
            report.routes.push((id, status));
        }

        let table = merge(profiles);
        report.rows = table.len();
        self.sink.write(&table)?;
        if let Some(workspace) = self.workspace.as_deref_mut() {
            workspace.discard_scratch()?;
        }
        Ok(report)
    }
}

/// Private API.
impl<'a> Pipeline<'a> {
    fn profile_route(
        &mut self,
        route: &Route,
    ) -> Result<(ProfileSeries, RouteStatus), ProfileError> {
        if !route.has_valid_measures() {
            let reason = format!(
                "invalid measures {}..{}",
                route.begin_measure, route.end_measure
            );
            warn!("route {}: {reason}", route.id);
            let series = ProfileSeries {
                route_id: route.id,
                rows: Vec::new(),
            };
            return Ok((series, RouteStatus::Unprofiled { reason }));
        }
        let sampled = match self.sampler {
            Sampler::Contour(contours) => contour_samples(contours, route, &self.policy),
            Sampler::Dem { raster, interval } => {
                let stations =
                    match dem_stations(route.begin_measure, route.end_measure, interval) {
                        Ok(stations) => stations,
                        Err(e) => {
                            warn!("route {}: {e}", route.id);
                            let series = assemble(route, &[]);
                            let reason = e.to_string();
                            return Ok((series, RouteStatus::Unprofiled { reason }));
                        }
                    };
                if let Some(workspace) = self.workspace.as_deref_mut() {
                    workspace.write_stations(route.id, &stations)?;
                }
                dem_samples(raster, route, &stations, &self.policy)
            }
        };
        let (samples, failure) = match sampled {
            Ok(samples) => (samples, None),
            Err(e) => {
                warn!("route {}: {e}", route.id);
                (Vec::new(), Some(e.to_string()))
            }
        };

        let series = assemble(route, &samples);
        if let Some(workspace) = self.workspace.as_deref_mut() {
            workspace.write_profile(&series)?;
        }

        let missing = series.missing();
        let status = match failure {
            Some(reason) => RouteStatus::Unprofiled { reason },
            None if missing == 0 => RouteStatus::Profiled,
            None if missing == series.rows.len() => RouteStatus::Unprofiled {
                reason: "no elevation samples".to_string(),
            },
            None => RouteStatus::Partial { missing },
        };
        Ok((series, status))
    }
}

pub struct PipelineBuilder<'a> {
    config: Option<ExtractionConfig>,
    routes: Option<&'a dyn RouteStore>,
    contours: Option<&'a dyn ContourService>,
    raster: Option<&'a dyn RasterService>,
    sink: Option<&'a dyn OutputSink>,
    workspace: Option<&'a mut Workspace>,
    observer: &'a dyn Observer,
    policy: CallPolicy,
    cancel: CancelToken,
}

impl<'a> PipelineBuilder<'a> {
    /// Run configuration (required).
    #[must_use]
    pub fn config(mut self, config: ExtractionConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Route store (required).
    #[must_use]
    pub fn routes(mut self, routes: &'a dyn RouteStore) -> Self {
        self.routes = Some(routes);
        self
    }

    /// Contour geometry service (required for the contour method).
    #[must_use]
    pub fn contours(mut self, contours: &'a dyn ContourService) -> Self {
        self.contours = Some(contours);
        self
    }

    /// Raster service (required for the DEM method).
    #[must_use]
    pub fn raster(mut self, raster: &'a dyn RasterService) -> Self {
        self.raster = Some(raster);
        self
    }

    /// Where the merged table goes (required).
    #[must_use]
    pub fn sink(mut self, sink: &'a dyn OutputSink) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Scratch workspace for per-route tables (optional).
    #[must_use]
    pub fn workspace(mut self, workspace: &'a mut Workspace) -> Self {
        self.workspace = Some(workspace);
        self
    }

    /// Progress hooks (defaults to [`Quiet`]).
    #[must_use]
    pub fn observer(mut self, observer: &'a dyn Observer) -> Self {
        self.observer = observer;
        self
    }

    /// Timeout and retry policy for external calls.
    #[must_use]
    pub fn policy(mut self, policy: CallPolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub fn cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Validates the configuration and checks that the services the
    /// configured method needs were provided.
    pub fn build(self) -> Result<Pipeline<'a>, ConfigError> {
        let config = self.config.ok_or(ConfigError::Builder("config"))?;
        config.validate()?;
        let routes = self.routes.ok_or(ConfigError::Builder("routes"))?;
        let sink = self.sink.ok_or(ConfigError::Builder("sink"))?;
        let sampler = match config.method {
            Method::Contour => {
                Sampler::Contour(self.contours.ok_or(ConfigError::Builder("contours"))?)
            }
            Method::Dem => Sampler::Dem {
                raster: self.raster.ok_or(ConfigError::Builder("raster"))?,
                interval: config.interval()?,
            },
        };
        Ok(Pipeline {
            config,
            routes,
            sampler,
            sink,
            workspace: self.workspace,
            observer: self.observer,
            policy: self.policy,
            cancel: self.cancel,
        })
    }
}
