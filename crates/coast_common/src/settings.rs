use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{CommonError, DateRange, JsonObject, LandsatCollection, Result, Satellite};

/// Acquisition settings for a single region of interest.
///
/// These are the `inputs` of the detection program. Keys that are not
/// modelled here are kept in `extra` and passed through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RoiSettings {
    /// Identifier of the ROI these settings belong to
    #[serde(default)]
    pub roi_id: String,
    /// Directory name of the ROI's downloaded imagery
    pub sitename: String,
    /// Directory containing the ROI directories
    pub filepath: String,
    pub dates: DateRange,
    pub sat_list: Vec<Satellite>,
    /// ROI outline as a list of rings in EPSG:4326
    pub polygon: Vec<Vec<[f64; 2]>>,
    #[serde(default)]
    pub landsat_collection: LandsatCollection,
    #[serde(flatten)]
    pub extra: JsonObject,
}

impl RoiSettings {
    /// Parse ROI settings from a JSON object, rejecting `{}`
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        reject_empty(&value, "roi_settings")?;
        Ok(serde_json::from_value(value)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.sitename.trim().is_empty() {
            return Err(CommonError::Empty { name: "roi_settings.sitename" });
        }
        if self.filepath.trim().is_empty() {
            return Err(CommonError::Empty { name: "roi_settings.filepath" });
        }
        if self.sat_list.is_empty() {
            return Err(CommonError::Empty { name: "roi_settings.sat_list" });
        }
        if self.polygon.iter().all(|ring| ring.is_empty()) {
            return Err(CommonError::Empty { name: "roi_settings.polygon" });
        }
        self.dates.validate()
    }

    /// Directory holding this ROI's imagery: `<filepath>/<sitename>`
    pub fn site_path(&self) -> std::path::PathBuf {
        std::path::Path::new(&self.filepath).join(&self.sitename)
    }
}

/// Global shoreline extraction settings shared by every ROI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Settings {
    /// EPSG code of the projected CRS the detector works in
    pub output_epsg: u32,
    #[serde(default = "defaults::cloud_thresh")]
    pub cloud_thresh: f64,
    /// Distance around clouds where shorelines are discarded (m)
    #[serde(default = "defaults::dist_clouds")]
    pub dist_clouds: f64,
    #[serde(default = "defaults::enabled")]
    pub save_figure: bool,
    /// Minimum area of sand blobs kept by the classifier (m^2)
    #[serde(default = "defaults::min_beach_area")]
    pub min_beach_area: f64,
    /// Minimum length of a shoreline contour (m)
    #[serde(default = "defaults::min_length_sl")]
    pub min_length_sl: f64,
    #[serde(default)]
    pub cloud_mask_issue: bool,
    #[serde(default = "defaults::sand_color")]
    pub sand_color: String,
    #[serde(default)]
    pub pan_off: bool,
    /// Maximum distance from the reference shoreline (m)
    #[serde(default = "defaults::max_dist_ref")]
    pub max_dist_ref: f64,
    #[serde(default)]
    pub adjust_detection: bool,
    #[serde(default)]
    pub check_detection: bool,
    #[serde(flatten)]
    pub extra: JsonObject,
}

mod defaults {
    pub fn cloud_thresh() -> f64 {
        0.5
    }
    pub fn dist_clouds() -> f64 {
        300.0
    }
    pub fn enabled() -> bool {
        true
    }
    pub fn min_beach_area() -> f64 {
        4500.0
    }
    pub fn min_length_sl() -> f64 {
        100.0
    }
    pub fn sand_color() -> String {
        "default".to_string()
    }
    pub fn max_dist_ref() -> f64 {
        25.0
    }
}

impl Settings {
    pub fn new(output_epsg: u32) -> Self {
        Self {
            output_epsg,
            cloud_thresh: defaults::cloud_thresh(),
            dist_clouds: defaults::dist_clouds(),
            save_figure: defaults::enabled(),
            min_beach_area: defaults::min_beach_area(),
            min_length_sl: defaults::min_length_sl(),
            cloud_mask_issue: false,
            sand_color: defaults::sand_color(),
            pan_off: false,
            max_dist_ref: defaults::max_dist_ref(),
            adjust_detection: false,
            check_detection: false,
            extra: JsonObject::new(),
        }
    }

    /// Parse settings from a JSON object, rejecting `{}`
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        reject_empty(&value, "settings")?;
        Ok(serde_json::from_value(value)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.output_epsg == 0 {
            return Err(CommonError::ValidationFailed {
                details: "output_epsg must be a valid EPSG code".to_string(),
            });
        }
        if !(0.0..=1.0).contains(&self.cloud_thresh) {
            return Err(CommonError::ValidationFailed {
                details: format!("cloud_thresh must be within 0..=1, got {}", self.cloud_thresh),
            });
        }
        Ok(())
    }
}

/// Settings handed to the detection program for one ROI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ShorelineSettings {
    #[serde(flatten)]
    pub settings: Settings,
    /// Reference shoreline vertices in `output_epsg`, third column is 0 (MSL)
    pub reference_shoreline: Vec<[f64; 3]>,
    pub inputs: RoiSettings,
}

impl ShorelineSettings {
    /// Combine global settings, ROI settings and the reference shoreline.
    ///
    /// The global settings are copied, never modified. Manual adjustment and
    /// visual checking of detections are always switched off.
    pub fn assemble(
        settings: &Settings,
        roi_settings: &RoiSettings,
        reference_shoreline: Vec<[f64; 3]>,
    ) -> Self {
        let mut settings = settings.clone();
        settings.adjust_detection = false;
        settings.check_detection = false;
        let assembled = Self {
            settings,
            reference_shoreline,
            inputs: roi_settings.clone(),
        };
        debug!(
            roi_id = %assembled.inputs.roi_id,
            output_epsg = assembled.settings.output_epsg,
            reference_points = assembled.reference_shoreline.len(),
            "Assembled shoreline settings"
        );
        assembled
    }

    pub fn output_epsg(&self) -> u32 {
        self.settings.output_epsg
    }

    pub fn to_json_file(&self, path: impl AsRef<std::path::Path>) -> Result<()> {
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn from_json_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

fn reject_empty(value: &serde_json::Value, name: &'static str) -> Result<()> {
    match value {
        serde_json::Value::Object(map) if map.is_empty() => Err(CommonError::Empty { name }),
        serde_json::Value::Object(_) => Ok(()),
        other => Err(CommonError::ValidationFailed {
            details: format!("{name} must be a JSON object, got {other}"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn roi_settings_json() -> serde_json::Value {
        json!({
            "roi_id": "17",
            "sitename": "ID_17_datetime06-05-23__04_16_45",
            "filepath": "/data",
            "dates": ["2018-12-01", "2019-03-01"],
            "sat_list": ["L8", "S2"],
            "polygon": [[[-117.5, 33.1], [-117.4, 33.1], [-117.4, 33.2], [-117.5, 33.1]]],
            "landsat_collection": "C02",
            "include_T2": false
        })
    }

    #[test]
    fn test_roi_settings_keep_unknown_keys() {
        let roi = RoiSettings::from_value(roi_settings_json()).unwrap();
        roi.validate().unwrap();
        assert_eq!(roi.sat_list, vec![Satellite::L8, Satellite::S2]);
        assert_eq!(roi.extra.get("include_T2"), Some(&json!(false)));
        assert_eq!(roi.site_path(), std::path::Path::new("/data/ID_17_datetime06-05-23__04_16_45"));

        let back = serde_json::to_value(&roi).unwrap();
        assert_eq!(back["include_T2"], json!(false));
    }

    #[test]
    fn test_empty_objects_rejected() {
        assert!(matches!(
            RoiSettings::from_value(json!({})),
            Err(CommonError::Empty { name: "roi_settings" })
        ));
        assert!(matches!(
            Settings::from_value(json!({})),
            Err(CommonError::Empty { name: "settings" })
        ));
        assert!(Settings::from_value(json!([1, 2])).is_err());
    }

    #[test]
    fn test_roi_settings_validation() {
        let mut roi = RoiSettings::from_value(roi_settings_json()).unwrap();
        roi.sat_list.clear();
        assert!(roi.validate().is_err());

        let mut roi = RoiSettings::from_value(roi_settings_json()).unwrap();
        roi.sitename = "  ".to_string();
        assert!(roi.validate().is_err());
    }

    #[test]
    fn test_settings_defaults() {
        let settings = Settings::from_value(json!({ "output_epsg": 32611, "min_points": 3 })).unwrap();
        assert_eq!(settings.cloud_thresh, 0.5);
        assert_eq!(settings.dist_clouds, 300.0);
        assert_eq!(settings.sand_color, "default");
        assert_eq!(settings.extra.get("min_points"), Some(&json!(3)));
        settings.validate().unwrap();

        let mut bad = settings.clone();
        bad.cloud_thresh = 1.5;
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_assemble_does_not_touch_input() {
        let mut settings = Settings::new(32611);
        settings.adjust_detection = true;
        settings.check_detection = true;
        let roi = RoiSettings::from_value(roi_settings_json()).unwrap();

        let assembled = ShorelineSettings::assemble(&settings, &roi, vec![[1.0, 2.0, 0.0]]);

        assert!(!assembled.settings.adjust_detection);
        assert!(!assembled.settings.check_detection);
        assert!(settings.adjust_detection);
        assert!(settings.check_detection);
        assert_eq!(assembled.inputs, roi);
        assert_eq!(assembled.output_epsg(), 32611);
    }

    #[test]
    fn test_assembled_settings_are_flat() {
        let roi = RoiSettings::from_value(roi_settings_json()).unwrap();
        let assembled = ShorelineSettings::assemble(&Settings::new(32611), &roi, vec![[1.0, 2.0, 0.0]]);
        let value = serde_json::to_value(&assembled).unwrap();

        assert_eq!(value["output_epsg"], json!(32611));
        assert_eq!(value["adjust_detection"], json!(false));
        assert_eq!(value["reference_shoreline"], json!([[1.0, 2.0, 0.0]]));
        assert_eq!(value["inputs"]["sitename"], json!("ID_17_datetime06-05-23__04_16_45"));

        let parsed: ShorelineSettings = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, assembled);
    }
}
