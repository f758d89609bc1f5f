//! Delimited-text output.

use crate::{
    assemble::ProfileRow, error::ConfigError, merge::MergedTable, service::OutputSink,
    ProfileError,
};
use log::{debug, info};
use std::{
    ffi::OsString,
    fs,
    io::Write,
    path::{Path, PathBuf},
};

pub const HEADER: [&str; 3] = ["measure", "route_id", "elevation"];

/// Writes the merged table as CSV.
///
/// The table is written next to its destination and renamed into
/// place, so a failed run never leaves a truncated file behind.
#[derive(Debug, Clone)]
pub struct CsvSink {
    path: PathBuf,
    overwrite: bool,
}

impl CsvSink {
    pub fn new(path: impl Into<PathBuf>, overwrite: bool) -> Self {
        Self {
            path: path.into(),
            overwrite,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl OutputSink for CsvSink {
    fn write(&self, table: &MergedTable) -> Result<(), ProfileError> {
        if self.path.exists() && !self.overwrite {
            return Err(ConfigError::OutputExists(self.path.clone()).into());
        }
        let tmp_path = {
            let mut name = self
                .path
                .file_name()
                .map(OsString::from)
                .ok_or(ConfigError::EmptyOutput)?;
            name.push(".tmp");
            self.path.with_file_name(name)
        };
        debug!("writing {} rows to {tmp_path:?}", table.len());
        let written = write_csv(&tmp_path, table.rows());
        if let Err(e) = written {
            // Best effort; the write error is what matters.
            let _ = fs::remove_file(&tmp_path);
            return Err(e);
        }
        fs::rename(&tmp_path, &self.path)?;
        info!("wrote {} rows to {:?}", table.len(), self.path);
        Ok(())
    }
}

/// Writes `rows` with a header to a new file at `path`.
pub(crate) fn write_csv(path: &Path, rows: &[ProfileRow]) -> Result<(), ProfileError> {
    let mut wtr = csv::Writer::from_path(path)?;
    write_rows(&mut wtr, rows)?;
    wtr.flush()?;
    Ok(())
}

/// Writes the header and one record per row.
///
/// Measures are written as-is; elevations with two decimals, or empty
/// when unknown.
pub fn write_rows<W: Write>(wtr: &mut csv::Writer<W>, rows: &[ProfileRow]) -> csv::Result<()> {
    wtr.write_record(HEADER)?;
    for row in rows {
        let elevation = row
            .elevation
            .map(|elev| format!("{elev:.2}"))
            .unwrap_or_default();
        wtr.write_record([
            row.measure.to_string(),
            row.route_id.to_string(),
            elevation,
        ])?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{write_rows, CsvSink};
    use crate::{
        assemble::{ProfileRow, ProfileSeries},
        error::ConfigError,
        merge::merge,
        route::RouteId,
        service::OutputSink,
        ProfileError,
    };
    use tempfile::TempDir;

    fn table() -> crate::merge::MergedTable {
        let rows = vec![
            ProfileRow {
                measure: 0.0,
                route_id: RouteId(7),
                elevation: Some(328.084),
            },
            ProfileRow {
                measure: 12.5,
                route_id: RouteId(7),
                elevation: None,
            },
            ProfileRow {
                measure: 40.0,
                route_id: RouteId(7),
                elevation: Some(330.0),
            },
        ];
        merge(vec![ProfileSeries {
            route_id: RouteId(7),
            rows,
        }])
    }

    #[test]
    fn test_format() {
        let mut wtr = csv::Writer::from_writer(Vec::new());
        write_rows(&mut wtr, table().rows()).unwrap();
        let text = String::from_utf8(wtr.into_inner().unwrap()).unwrap();
        assert_eq!(
            text,
            "measure,route_id,elevation\n0,7,328.08\n12.5,7,\n40,7,330.00\n"
        );
    }

    #[test]
    fn test_sink_overwrite() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("profile.csv");
        std::fs::write(&path, "stale").unwrap();

        let err = CsvSink::new(&path, false).write(&table()).unwrap_err();
        assert!(matches!(
            err,
            ProfileError::Config(ConfigError::OutputExists(_))
        ));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "stale");

        CsvSink::new(&path, true).write(&table()).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("measure,route_id,elevation\n"));
        assert!(!dir.path().join("profile.csv.tmp").exists());
    }

    #[test]
    fn test_rewrite_is_identical() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("profile.csv");
        let sink = CsvSink::new(&path, true);
        sink.write(&table()).unwrap();
        let first = std::fs::read(&path).unwrap();
        sink.write(&table()).unwrap();
        assert_eq!(first, std::fs::read(&path).unwrap());
    }
}
