//! Shorelines extracted for a single region of interest.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use coast_common::{
    DateTime, RoiSettings, Settings, ShorelineRecord, ShorelineSettings, ShorelineTimeSeries, Utc, utils,
};
use serde_json::Value;
use tracing::{info, warn};

use crate::{
    collection::ShorelineCollection,
    crs::{Crs, MAP_CRS},
    error::{Result, ShorelineError},
    layer::{self, GeoJsonLayer, get_colors},
    pipeline::ExtractionPipeline,
    reference::{ReferenceShoreline, get_reference_shoreline},
};

/// Map layer name of extracted shorelines
pub const LAYER_NAME: &str = "extracted_shoreline";
/// Extracted shoreline lines, EPSG:4326
pub const FILE_NAME: &str = "extracted_shorelines.geojson";
/// Detector settings the shorelines were extracted with
pub const SETTINGS_FILE_NAME: &str = "shoreline_settings.json";
/// Filtered time series as returned by the detector
pub const DICT_FILE_NAME: &str = "extracted_shorelines_dict.json";
/// Extracted shoreline vertices as points, EPSG:4326
pub const POINTS_FILE_NAME: &str = "extracted_shorelines_points.geojson";

const SESSION_FILES: [&str; 4] = [FILE_NAME, POINTS_FILE_NAME, SETTINGS_FILE_NAME, DICT_FILE_NAME];

/// Shorelines extracted for one ROI.
///
/// Holds the filtered records in the detector's output CRS, the settings
/// they were extracted with and the feature collection in [`MAP_CRS`].
#[derive(Debug, Clone)]
pub struct ExtractedShoreline {
    roi_id: String,
    records: Vec<ShorelineRecord>,
    shoreline_settings: ShorelineSettings,
    collection: ShorelineCollection,
}

impl ExtractedShoreline {
    /// Extract shorelines for `roi_id`.
    ///
    /// Fails with [`ShorelineError::NoExtractedShoreline`] when nothing
    /// survives detection and filtering.
    pub fn new(
        roi_id: &str,
        shoreline: &ReferenceShoreline,
        roi_settings: &RoiSettings,
        settings: &Settings,
        pipeline: &ExtractionPipeline,
    ) -> Result<Self> {
        Self::validate_input(roi_id, shoreline, roi_settings, settings)?;

        info!(roi_id, "Extracting shorelines");
        let (shoreline_settings, records) =
            Self::extract_shorelines(shoreline, roi_settings, settings, pipeline)?;
        if records.is_empty() {
            return Err(ShorelineError::NoExtractedShoreline(roi_id.to_string()));
        }

        Self::from_parts(roi_id, records, shoreline_settings)
    }

    /// Rebuild from already extracted records
    pub fn from_parts(
        roi_id: &str,
        records: Vec<ShorelineRecord>,
        shoreline_settings: ShorelineSettings,
    ) -> Result<Self> {
        let mut extracted = Self {
            roi_id: roi_id.to_string(),
            records,
            shoreline_settings,
            collection: ShorelineCollection::new(MAP_CRS),
        };
        extracted.collection = extracted.create_feature_collection(extracted.input_crs()?, Some(MAP_CRS))?;
        if extracted.collection.is_empty() {
            return Err(ShorelineError::NoExtractedShoreline(roi_id.to_string()));
        }
        Ok(extracted)
    }

    fn validate_input(
        roi_id: &str,
        shoreline: &ReferenceShoreline,
        roi_settings: &RoiSettings,
        settings: &Settings,
    ) -> Result<()> {
        if roi_id.trim().is_empty() {
            return Err(ShorelineError::InvalidInput("roi_id cannot be empty".to_string()));
        }
        if shoreline.is_empty() {
            return Err(ShorelineError::InvalidInput(format!(
                "Reference shoreline for ROI {roi_id} cannot be empty"
            )));
        }
        roi_settings
            .validate()
            .map_err(|e| ShorelineError::InvalidInput(format!("roi_settings: {e}")))?;
        settings
            .validate()
            .map_err(|e| ShorelineError::InvalidInput(format!("settings: {e}")))?;
        Crs::from_epsg(settings.output_epsg)
            .map_err(|e| ShorelineError::InvalidInput(format!("settings: {e}")))?;
        Ok(())
    }

    /// Assemble the detector settings and run the pipeline
    pub fn extract_shorelines(
        shoreline: &ReferenceShoreline,
        roi_settings: &RoiSettings,
        settings: &Settings,
        pipeline: &ExtractionPipeline,
    ) -> Result<(ShorelineSettings, Vec<ShorelineRecord>)> {
        let output_crs = Crs::from_epsg(settings.output_epsg)?;
        let reference = get_reference_shoreline(shoreline, &output_crs)?;
        if reference.is_empty() {
            return Err(ShorelineError::InvalidInput(
                "Reference shoreline has no line vertices".to_string(),
            ));
        }
        let shoreline_settings = ShorelineSettings::assemble(settings, roi_settings, reference);
        let records = pipeline.run(&shoreline_settings)?;
        Ok((shoreline_settings, records))
    }

    /// Lines for every record with at least two points, in `output_crs` if given
    pub fn create_feature_collection(&self, input_crs: Crs, output_crs: Option<Crs>) -> Result<ShorelineCollection> {
        let collection = ShorelineCollection::from_records(&self.records, input_crs);
        match output_crs {
            Some(crs) => collection.to_crs(crs),
            None => Ok(collection),
        }
    }

    pub fn roi_id(&self) -> &str {
        &self.roi_id
    }

    pub fn records(&self) -> &[ShorelineRecord] {
        &self.records
    }

    pub fn shoreline_settings(&self) -> &ShorelineSettings {
        &self.shoreline_settings
    }

    /// Extracted shorelines in the map CRS
    pub fn collection(&self) -> &ShorelineCollection {
        &self.collection
    }

    /// CRS the detector returned the records in
    pub fn input_crs(&self) -> Result<Crs> {
        Crs::from_epsg(self.shoreline_settings.output_epsg())
    }

    /// True once every shoreline has been removed
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn sitename(&self) -> &str {
        &self.shoreline_settings.inputs.sitename
    }

    pub fn time_series(&self) -> ShorelineTimeSeries {
        ShorelineTimeSeries::from_records(&self.records)
    }

    /// Write the map CRS collection to `<filepath>/<sitename>/extracted_shorelines.geojson`
    pub fn save_to_file(&self, sitename: &str, filepath: impl AsRef<Path>) -> Result<PathBuf> {
        let dir = filepath.as_ref().join(sitename);
        std::fs::create_dir_all(&dir)?;
        let path = dir.join(FILE_NAME);
        self.collection.save_geojson(&path)?;
        Ok(path)
    }

    /// Write lines, points, settings and time series into `dir`
    pub fn save_session(&self, dir: impl AsRef<Path>) -> Result<()> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        self.collection.save_geojson(dir.join(FILE_NAME))?;
        self.collection.to_multipoints().save_geojson(dir.join(POINTS_FILE_NAME))?;
        self.shoreline_settings.to_json_file(dir.join(SETTINGS_FILE_NAME))?;
        self.time_series().to_json_file(dir.join(DICT_FILE_NAME))?;
        info!(roi_id = %self.roi_id, "Saved extracted shorelines to {}", dir.display());
        Ok(())
    }

    /// Save the session into `dir`, or delete its files when no shoreline is
    /// left. An emptied session could not be loaded back.
    ///
    /// Returns whether the session was saved.
    pub fn update_session(&self, dir: impl AsRef<Path>) -> Result<bool> {
        if self.is_empty() {
            Self::delete_session(dir)?;
            return Ok(false);
        }
        self.save_session(dir)?;
        Ok(true)
    }

    /// Delete the files written by [`ExtractedShoreline::save_session`]
    pub fn delete_session(dir: impl AsRef<Path>) -> Result<()> {
        let dir = dir.as_ref();
        for name in SESSION_FILES {
            match std::fs::remove_file(dir.join(name)) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        info!("Deleted extracted shoreline session in {}", dir.display());
        Ok(())
    }

    /// Load a session written by [`ExtractedShoreline::save_session`]
    pub fn load_from_directory(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let shoreline_settings = ShorelineSettings::from_json_file(dir.join(SETTINGS_FILE_NAME))?;
        let records = ShorelineTimeSeries::from_json_file(dir.join(DICT_FILE_NAME))?.records()?;
        let roi_id = shoreline_settings.inputs.roi_id.clone();
        if roi_id.is_empty() {
            warn!("No roi_id recorded in {}", dir.join(SETTINGS_FILE_NAME).display());
        }
        Self::from_parts(&roi_id, records, shoreline_settings)
    }

    /// Wrap GeoJSON in a styled shoreline layer
    pub fn style_layer(geojson: Value, layer_name: &str, color: &str) -> Result<GeoJsonLayer> {
        layer::style_layer(geojson, layer_name, color)
    }

    /// `ID<roi_id>_<date>` for every feature
    pub fn get_layer_names(&self) -> Vec<String> {
        self.collection
            .dates()
            .iter()
            .map(|date| format!("ID{}_{}", self.roi_id, utils::format_date(date)))
            .collect()
    }

    /// One layer per shoreline, colored along plasma in feature order
    pub fn get_styled_layers(&self) -> Result<Vec<GeoJsonLayer>> {
        let names = self.get_layer_names();
        let colors = get_colors(self.collection.len());

        names
            .iter()
            .zip(colors.iter())
            .enumerate()
            .map(|(i, (name, color))| {
                let single = ShorelineCollection {
                    crs: self.collection.crs,
                    features: vec![self.collection.features[i].clone()],
                };
                Self::style_layer(single.to_geojson_value()?, name, color)
            })
            .collect()
    }

    /// Remove the shorelines acquired at `dates[i]` by `satellites[i]`.
    ///
    /// Returns how many records were removed.
    pub fn remove_selected(&mut self, dates: &[DateTime<Utc>], satellites: &[String]) -> Result<usize> {
        if dates.len() != satellites.len() {
            return Err(ShorelineError::InvalidInput(format!(
                "{} dates but {} satellites",
                dates.len(),
                satellites.len()
            )));
        }
        let selected: HashSet<(DateTime<Utc>, &str)> = dates
            .iter()
            .copied()
            .zip(satellites.iter().map(String::as_str))
            .collect();

        let before = self.records.len();
        self.records
            .retain(|r| !selected.contains(&(r.date, r.satname.as_str())));
        self.collection
            .retain(|f| !selected.contains(&(f.properties.date, f.properties.satname.as_str())));

        let removed = before - self.records.len();
        info!(roi_id = %self.roi_id, "Removed {} shoreline(s)", removed);
        Ok(removed)
    }

    /// Remove shorelines named `"<satname>_<date>"`
    pub fn remove_items(&mut self, items: &[String]) -> Result<usize> {
        let (satellites, dates) = parse_items(items)?;
        self.remove_selected(&dates, &satellites)
    }

    /// Shorelines named `"<satname>_<date>"`, in the map CRS
    pub fn select(&self, items: &[String]) -> Result<ShorelineCollection> {
        let (satellites, dates) = parse_items(items)?;
        let selected: HashSet<(DateTime<Utc>, &str)> = dates
            .into_iter()
            .zip(satellites.iter().map(String::as_str))
            .collect();

        let mut collection = self.collection.clone();
        collection.retain(|f| selected.contains(&(f.properties.date, f.properties.satname.as_str())));
        Ok(collection)
    }
}

fn parse_items(items: &[String]) -> Result<(Vec<String>, Vec<DateTime<Utc>>)> {
    let mut satellites = Vec::with_capacity(items.len());
    let mut dates = Vec::with_capacity(items.len());
    for item in items {
        let (satname, date) = utils::split_selection(item)?;
        satellites.push(satname);
        dates.push(date);
    }
    Ok((satellites, dates))
}
