//! Scratch directory for per-route tables.
//!
//! Every file the pipeline leaves here is recorded in a manifest with
//! its role, so stale files from a previous run can be cleared and
//! scratch files discarded without guessing from file names.

use crate::{
    assemble::{ProfileRow, ProfileSeries},
    config::ExtractionConfig,
    route::RouteId,
    sink::write_csv,
    ProfileError,
};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::{
    fs::{self, File},
    io::{BufReader, BufWriter, ErrorKind, Write},
    path::{Path, PathBuf},
};

const MANIFEST: &str = "manifest.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactRole {
    /// Intermediate data, discarded once the merged output exists.
    Scratch,
    /// A single route's finished profile.
    Profile,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    /// File name relative to the workspace directory.
    pub name: String,
    pub role: ArtifactRole,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Manifest {
    config: Option<ExtractionConfig>,
    artifacts: Vec<Artifact>,
}

#[derive(Debug)]
pub struct Workspace {
    dir: PathBuf,
    manifest: Manifest,
}

impl Workspace {
    /// Opens (creating if needed) the workspace at `dir`.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, ProfileError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        let manifest = match File::open(dir.join(MANIFEST)) {
            Ok(file) => serde_json::from_reader(BufReader::new(file))?,
            Err(e) if e.kind() == ErrorKind::NotFound => Manifest::default(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self { dir, manifest })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn artifacts(&self) -> &[Artifact] {
        &self.manifest.artifacts
    }

    /// Deletes everything recorded by previous runs.
    pub fn clear_out(&mut self) -> Result<usize, ProfileError> {
        let removed = self.remove_where(|_| true)?;
        self.manifest.config = None;
        self.save()?;
        info!("workspace {:?} reset, removed {removed} files", self.dir);
        Ok(removed)
    }

    /// Deletes scratch artifacts, keeping per-route profiles.
    pub fn discard_scratch(&mut self) -> Result<usize, ProfileError> {
        let removed = self.remove_where(|role| role == ArtifactRole::Scratch)?;
        self.save()?;
        debug!("discarded {removed} scratch files");
        Ok(removed)
    }

    pub fn record_config(&mut self, config: &ExtractionConfig) -> Result<(), ProfileError> {
        self.manifest.config = Some(config.clone());
        self.save()
    }

    /// Writes a route's DEM station table.
    pub fn write_stations(
        &mut self,
        route_id: RouteId,
        stations: &[f64],
    ) -> Result<PathBuf, ProfileError> {
        let rows: Vec<ProfileRow> = stations
            .iter()
            .map(|&measure| ProfileRow {
                measure,
                route_id,
                elevation: None,
            })
            .collect();
        self.write(format!("stations_{route_id}.csv"), ArtifactRole::Scratch, &rows)
    }

    /// Writes a route's assembled profile.
    pub fn write_profile(&mut self, series: &ProfileSeries) -> Result<PathBuf, ProfileError> {
        let name = format!("profile_{}.csv", series.route_id);
        self.write(name, ArtifactRole::Profile, &series.rows)
    }
}

/// Private API.
impl Workspace {
    fn write(
        &mut self,
        name: String,
        role: ArtifactRole,
        rows: &[ProfileRow],
    ) -> Result<PathBuf, ProfileError> {
        let path = self.dir.join(&name);
        write_csv(&path, rows)?;
        let artifact = Artifact { name, role };
        if !self.manifest.artifacts.contains(&artifact) {
            self.manifest.artifacts.push(artifact);
            self.save()?;
        }
        Ok(path)
    }

    fn remove_where(&mut self, pred: impl Fn(ArtifactRole) -> bool) -> Result<usize, ProfileError> {
        let mut removed = 0;
        let mut kept = Vec::new();
        for artifact in self.manifest.artifacts.drain(..) {
            if !pred(artifact.role) {
                kept.push(artifact);
                continue;
            }
            match fs::remove_file(self.dir.join(&artifact.name)) {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == ErrorKind::NotFound => (),
                Err(e) => return Err(e.into()),
            }
        }
        self.manifest.artifacts = kept;
        Ok(removed)
    }

    fn save(&self) -> Result<(), ProfileError> {
        let mut wtr = BufWriter::new(File::create(self.dir.join(MANIFEST))?);
        serde_json::to_writer_pretty(&mut wtr, &self.manifest)?;
        wtr.flush()?;
        Ok(())
    }
}
