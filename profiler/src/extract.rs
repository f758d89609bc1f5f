use crate::{
    contour::GeoContours,
    options::{Extract, MethodArg},
    progress::RouteProgress,
    raster::DemRaster,
    store::GeoJsonRoutes,
};
use anyhow::{anyhow, Result};
use log::{info, warn};
use routeprof::{CallPolicy, CsvSink, ExtractionConfig, Pipeline, Workspace};
use std::time::Duration;
use terrain::{TileMode, Tiles};

impl Extract {
    pub fn run(&self) -> Result<()> {
        let config = self.config();
        // Fail before reading any input.
        config.validate()?;

        let routes = GeoJsonRoutes::open(&self.routes)?;
        let sink = CsvSink::new(&self.out, self.overwrite);
        let progress = RouteProgress::new("Profile routes");
        let mut workspace = self.workspace.as_deref().map(Workspace::open).transpose()?;

        let contours;
        let raster;
        let mut builder = Pipeline::builder()
            .config(config)
            .routes(&routes)
            .sink(&sink)
            .observer(&progress)
            .policy(self.policy());
        match self.method {
            MethodArg::Contour => {
                let path = self
                    .contours
                    .as_deref()
                    .ok_or_else(|| anyhow!("the contour method needs --contours"))?;
                contours = GeoContours::open(path, &routes, self.buffer_ft, self.search_radius_ft)?;
                builder = builder.contours(&contours);
            }
            MethodArg::Dem => {
                let tile_dir = self
                    .tile_dir
                    .clone()
                    .ok_or_else(|| anyhow!("the DEM method needs --tile-dir"))?;
                let mode = if self.in_mem {
                    TileMode::InMem
                } else {
                    TileMode::MemMap
                };
                raster = DemRaster::new(&routes, Tiles::new(tile_dir, mode)?);
                builder = builder.raster(&raster);
            }
        }
        if let Some(workspace) = workspace.as_mut() {
            builder = builder.workspace(workspace);
        }

        let report = builder.build()?.run()?;
        progress.finish();
        for (id, status) in report.incomplete() {
            warn!("route {id}: {status}");
        }
        info!(
            "{} of {} routes fully profiled, {} rows written to {:?}",
            report.routes.len() - report.incomplete().count(),
            report.routes.len(),
            report.rows,
            self.out
        );
        Ok(())
    }

    fn config(&self) -> ExtractionConfig {
        ExtractionConfig {
            method: self.method.into(),
            feature_category: self.category.into(),
            output_file_path: self.out.clone(),
            segments: self.segments.clone(),
            systems: self.systems.clone(),
            dem_intersect_interval: self.interval,
            overwrite: self.overwrite,
        }
    }

    fn policy(&self) -> CallPolicy {
        CallPolicy {
            timeout: Duration::from_secs(self.timeout_secs),
            attempts: self.attempts,
            ..CallPolicy::default()
        }
    }
}
