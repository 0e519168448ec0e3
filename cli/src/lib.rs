use coast_common::{RoiSettings, Settings};
use detection::{DetectorConfig, DetectorError};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use shoreline::{ExtractionPipeline, ExtractionPipelineBuilder, ShorelineError};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    SerdeError(#[from] serde_json::Error),
    #[error(transparent)]
    TomlDeError(#[from] toml::de::Error),
    #[error(transparent)]
    TomlSerError(#[from] toml::ser::Error),
    #[error(transparent)]
    IoError(#[from] std::io::Error),
    #[error(transparent)]
    Shoreline(#[from] ShorelineError),
    #[error(transparent)]
    Detector(#[from] DetectorError),
    #[error("ROI '{0}' is listed in roi_ids but has no settings")]
    UnknownRoi(String),
    #[error("Unsupported file format. Please use .toml or .json files")]
    UnsupportedFileFormat,
}

fn default_georef_threshold() -> f64 {
    10.0
}

fn default_duplicate_window() -> i64 {
    5
}

/// An extraction job: which ROIs to extract, with what, and where to save
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct ExtractionConfig {
    /// Directory receiving one sub-directory per ROI
    pub session_dir: String,
    pub detector: DetectorConfig,
    pub settings: Settings,
    /// Path to the reference shoreline GeoJSON
    pub reference_shoreline: String,
    pub rois: Vec<RoiSettings>,
    /// ROIs to extract, every ROI in `rois` when empty
    #[serde(default)]
    pub roi_ids: Vec<String>,
    /// Maximum georeferencing RMSE in metres
    #[serde(default = "default_georef_threshold")]
    pub georef_threshold: f64,
    /// Images closer in time than this are treated as duplicates
    #[serde(default = "default_duplicate_window")]
    pub duplicate_window_minutes: i64,
}

impl ExtractionConfig {
    /// Load ExtractionConfig from a TOML file
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self, CliError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, CliError> {
        Ok(toml::from_str(content)?)
    }

    /// Load ExtractionConfig from a JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, CliError> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, CliError> {
        Ok(serde_json::from_str(content)?)
    }

    /// Auto-detect file format and load configuration
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, CliError> {
        let path_ref = path.as_ref();
        match path_ref.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml_file(path),
            Some("json") => Self::from_json_file(path),
            _ => Err(CliError::UnsupportedFileFormat),
        }
    }

    /// Save to `.toml` or `.json` depending on the extension
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), CliError> {
        let path_ref = path.as_ref();
        let content = match path_ref.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => self.to_toml()?,
            Some("json") => self.to_json()?,
            _ => return Err(CliError::UnsupportedFileFormat),
        };
        fs::write(path, content)?;
        Ok(())
    }

    pub fn to_toml(&self) -> Result<String, CliError> {
        Ok(toml::to_string_pretty(&self)?)
    }

    pub fn to_json(&self) -> Result<String, CliError> {
        Ok(serde_json::to_string_pretty(&self)?)
    }

    /// ROI ids to extract, checked against `rois`
    pub fn selected_roi_ids(&self) -> Result<Vec<String>, CliError> {
        if self.roi_ids.is_empty() {
            return Ok(self.rois.iter().map(|roi| roi.roi_id.clone()).collect());
        }
        for id in &self.roi_ids {
            if !self.rois.iter().any(|roi| &roi.roi_id == id) {
                return Err(CliError::UnknownRoi(id.clone()));
            }
        }
        Ok(self.roi_ids.clone())
    }

    /// Detector plus the configured duplicate and georeferencing filters
    pub fn build_pipeline(&self) -> Result<ExtractionPipeline, CliError> {
        let detector = self.detector.build()?;
        Ok(ExtractionPipelineBuilder::new(detector)
            .with_duplicate_window(chrono::Duration::minutes(self.duplicate_window_minutes))
            .with_georef_threshold(self.georef_threshold)
            .build())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const JOB_TOML: &str = r#"
session_dir = "sessions/santa_cruz"
reference_shoreline = "reference.geojson"
roi_ids = ["17"]

[detector]
program = "sh"
args = ["-c", "exit 0", "detector"]

[settings]
output_epsg = 4326
cloud_thresh = 0.4
min_points = 3

[[rois]]
roi_id = "17"
sitename = "ID_17_datetime06-05-23__04_16_45"
filepath = "data"
dates = ["2018-12-01", "2019-03-01"]
sat_list = ["L8", "S2"]
polygon = [[[-117.5, 33.1], [-117.4, 33.1], [-117.4, 33.2], [-117.5, 33.1]]]
"#;

    #[test]
    fn test_job_from_toml() {
        let job = ExtractionConfig::from_toml(JOB_TOML).unwrap();
        assert_eq!(job.settings.output_epsg, 4326);
        assert_eq!(job.settings.cloud_thresh, 0.4);
        assert_eq!(job.settings.dist_clouds, 300.0);
        assert!(job.settings.extra.contains_key("min_points"));
        assert_eq!(job.georef_threshold, 10.0);
        assert_eq!(job.duplicate_window_minutes, 5);
        assert_eq!(job.rois[0].sat_list.len(), 2);
        assert_eq!(job.selected_roi_ids().unwrap(), vec!["17".to_string()]);
    }

    #[test]
    fn test_job_json_round_trip() {
        let job = ExtractionConfig::from_toml(JOB_TOML).unwrap();
        let parsed = ExtractionConfig::from_json(&job.to_json().unwrap()).unwrap();
        assert_eq!(parsed, job);
    }

    #[test]
    fn test_unknown_roi_rejected() {
        let mut job = ExtractionConfig::from_toml(JOB_TOML).unwrap();
        job.roi_ids = vec!["99".to_string()];
        assert!(matches!(job.selected_roi_ids(), Err(CliError::UnknownRoi(id)) if id == "99"));

        job.roi_ids.clear();
        assert_eq!(job.selected_roi_ids().unwrap(), vec!["17".to_string()]);
    }

    #[test]
    fn test_unsupported_extension() {
        assert!(matches!(
            ExtractionConfig::from_file("job.yaml"),
            Err(CliError::UnsupportedFileFormat)
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_pipeline_from_job() {
        let job = ExtractionConfig::from_toml(JOB_TOML).unwrap();
        let pipeline = job.build_pipeline().unwrap();
        assert!(pipeline.info().contains("remove_duplicates"));
        assert!(pipeline.info().contains("remove_inaccurate_georef"));
    }
}
