use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// How elevations are obtained along each route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Method {
    /// Intersect routes with elevation contour lines.
    Contour,
    /// Sample a digital elevation model at fixed-interval stations.
    Dem,
}

/// Which routes a run covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureCategory {
    SegmentGroup,
    System,
    AllSystemsSegments,
}

/// A resolved route selection, borrowed from an [`ExtractionConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection<'a> {
    SegmentGroups(&'a [String]),
    Systems(&'a [String]),
    All,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionConfig {
    pub method: Method,
    pub feature_category: FeatureCategory,
    pub output_file_path: PathBuf,
    /// Segment-group names, used iff category is `SegmentGroup`.
    #[serde(default)]
    pub segments: Vec<String>,
    /// System names, used iff category is `System`.
    #[serde(default)]
    pub systems: Vec<String>,
    /// Station spacing in feet, used iff method is `Dem`.
    #[serde(default)]
    pub dem_intersect_interval: Option<f64>,
    /// Replace `output_file_path` if it already exists.
    #[serde(default)]
    pub overwrite: bool,
}

impl ExtractionConfig {
    /// Checks everything that can be checked without touching a
    /// route store or geometry service.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.method == Method::Dem {
            self.interval()?;
        }
        match self.feature_category {
            FeatureCategory::SegmentGroup if self.segments.is_empty() => {
                return Err(ConfigError::NoSegments)
            }
            FeatureCategory::System if self.systems.is_empty() => {
                return Err(ConfigError::NoSystems)
            }
            _ => (),
        }

        let out = &self.output_file_path;
        if out.as_os_str().is_empty() {
            return Err(ConfigError::EmptyOutput);
        }
        if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
            if !parent.is_dir() {
                return Err(ConfigError::OutputDir(parent.to_owned()));
            }
        }
        if out.exists() && !self.overwrite {
            return Err(ConfigError::OutputExists(out.clone()));
        }
        Ok(())
    }

    /// The DEM station interval, in feet.
    pub fn interval(&self) -> Result<f64, ConfigError> {
        match self.dem_intersect_interval {
            None => Err(ConfigError::MissingInterval),
            Some(interval) if interval.is_finite() && interval > 0.0 => Ok(interval),
            Some(interval) => Err(ConfigError::Interval(interval)),
        }
    }

    pub fn selection(&self) -> Selection<'_> {
        match self.feature_category {
            FeatureCategory::SegmentGroup => Selection::SegmentGroups(&self.segments),
            FeatureCategory::System => Selection::Systems(&self.systems),
            FeatureCategory::AllSystemsSegments => Selection::All,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, ExtractionConfig, FeatureCategory, Method, Selection};
    use tempfile::TempDir;

    fn config(dir: &TempDir) -> ExtractionConfig {
        ExtractionConfig {
            method: Method::Dem,
            feature_category: FeatureCategory::SegmentGroup,
            output_file_path: dir.path().join("profile.csv"),
            segments: vec!["North".to_string()],
            systems: vec![],
            dem_intersect_interval: Some(50.0),
            overwrite: false,
        }
    }

    #[test]
    fn test_valid() {
        let dir = TempDir::new().unwrap();
        let cfg = config(&dir);
        assert_eq!(cfg.validate(), Ok(()));
        assert_eq!(cfg.interval(), Ok(50.0));
        assert_eq!(
            cfg.selection(),
            Selection::SegmentGroups(&["North".to_string()])
        );
    }

    #[test]
    fn test_interval_rules() {
        let dir = TempDir::new().unwrap();
        for bad in [0.0, -5.0, f64::INFINITY] {
            let cfg = ExtractionConfig {
                dem_intersect_interval: Some(bad),
                ..config(&dir)
            };
            assert_eq!(cfg.validate(), Err(ConfigError::Interval(bad)));
        }
        let cfg = ExtractionConfig {
            dem_intersect_interval: None,
            ..config(&dir)
        };
        assert_eq!(cfg.validate(), Err(ConfigError::MissingInterval));

        // Contour runs ignore the interval.
        let cfg = ExtractionConfig {
            method: Method::Contour,
            dem_intersect_interval: None,
            ..config(&dir)
        };
        assert_eq!(cfg.validate(), Ok(()));
    }

    #[test]
    fn test_empty_selection() {
        let dir = TempDir::new().unwrap();
        let cfg = ExtractionConfig {
            segments: vec![],
            ..config(&dir)
        };
        assert_eq!(cfg.validate(), Err(ConfigError::NoSegments));

        let cfg = ExtractionConfig {
            feature_category: FeatureCategory::System,
            ..config(&dir)
        };
        assert_eq!(cfg.validate(), Err(ConfigError::NoSystems));

        let cfg = ExtractionConfig {
            feature_category: FeatureCategory::AllSystemsSegments,
            segments: vec![],
            ..config(&dir)
        };
        assert_eq!(cfg.validate(), Ok(()));
        assert_eq!(cfg.selection(), Selection::All);
    }

    #[test]
    fn test_output_rules() {
        let dir = TempDir::new().unwrap();
        let cfg = ExtractionConfig {
            output_file_path: dir.path().join("missing").join("out.csv"),
            ..config(&dir)
        };
        assert!(matches!(cfg.validate(), Err(ConfigError::OutputDir(_))));

        let cfg = config(&dir);
        std::fs::write(&cfg.output_file_path, "stale").unwrap();
        assert!(matches!(cfg.validate(), Err(ConfigError::OutputExists(_))));
        let cfg = ExtractionConfig {
            overwrite: true,
            ..cfg
        };
        assert_eq!(cfg.validate(), Ok(()));
    }

    #[test]
    fn test_serde_names() {
        let dir = TempDir::new().unwrap();
        let json = serde_json::to_value(config(&dir)).unwrap();
        assert_eq!(json["method"], "dem");
        assert_eq!(json["feature_category"], "segment_group");
    }
}
