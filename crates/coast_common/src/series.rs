use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{CommonError, DateTime, GeoAccuracy, Result, Utc, date_serde, utils};

/// Image metadata for one satellite mission, as returned by the detector
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SatelliteMetadata {
    #[serde(default)]
    pub filenames: Vec<String>,
    #[serde(default)]
    pub epsg: Vec<u32>,
    #[serde(default)]
    pub dates: Vec<String>,
    #[serde(default)]
    pub acc_georef: Vec<GeoAccuracy>,
    #[serde(default)]
    pub im_dimensions: Vec<Vec<u32>>,
}

/// Metadata keyed by satellite name (`"L8"`, `"S2"`, ...)
pub type Metadata = BTreeMap<String, SatelliteMetadata>;

/// Column-oriented shoreline time series produced by the detection program
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShorelineTimeSeries {
    #[serde(deserialize_with = "date_serde::deserialize_vec")]
    pub dates: Vec<DateTime<Utc>>,
    /// Shoreline vertices per image in the output CRS
    pub shorelines: Vec<Vec<[f64; 2]>>,
    #[serde(default)]
    pub filename: Vec<String>,
    pub cloud_cover: Vec<f64>,
    pub geoaccuracy: Vec<GeoAccuracy>,
    #[serde(default)]
    pub idx: Vec<usize>,
    pub satname: Vec<String>,
    #[serde(rename = "MNDWI_threshold", default, skip_serializing_if = "Vec::is_empty")]
    pub mndwi_threshold: Vec<f64>,
}

/// One image's worth of extracted shoreline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShorelineRecord {
    pub date: DateTime<Utc>,
    pub satname: String,
    pub shoreline: Vec<[f64; 2]>,
    pub cloud_cover: f64,
    pub geoaccuracy: GeoAccuracy,
    pub filename: Option<String>,
    pub idx: Option<usize>,
    pub mndwi_threshold: Option<f64>,
}

impl ShorelineRecord {
    /// `"<satname>_<date>"`, the key used to select individual shorelines
    pub fn selection_key(&self) -> String {
        format!("{}_{}", self.satname, utils::format_date(&self.date))
    }
}

impl ShorelineTimeSeries {
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// True when every image produced an empty shoreline (or there are none)
    pub fn has_no_shorelines(&self) -> bool {
        self.shorelines.iter().all(|shoreline| shoreline.is_empty())
    }

    /// Convert to one record per image.
    ///
    /// Required columns must all match `dates` in length. Optional columns
    /// (`filename`, `idx`, `MNDWI_threshold`) may be absent but not partial.
    pub fn records(&self) -> Result<Vec<ShorelineRecord>> {
        let expected = self.dates.len();
        check_column("shorelines", expected, self.shorelines.len(), false)?;
        check_column("cloud_cover", expected, self.cloud_cover.len(), false)?;
        check_column("geoaccuracy", expected, self.geoaccuracy.len(), false)?;
        check_column("satname", expected, self.satname.len(), false)?;
        check_column("filename", expected, self.filename.len(), true)?;
        check_column("idx", expected, self.idx.len(), true)?;
        check_column("MNDWI_threshold", expected, self.mndwi_threshold.len(), true)?;

        Ok((0..expected)
            .map(|i| ShorelineRecord {
                date: self.dates[i],
                satname: self.satname[i].clone(),
                shoreline: self.shorelines[i].clone(),
                cloud_cover: self.cloud_cover[i],
                geoaccuracy: self.geoaccuracy[i],
                filename: self.filename.get(i).cloned(),
                idx: self.idx.get(i).copied(),
                mndwi_threshold: self.mndwi_threshold.get(i).copied(),
            })
            .collect())
    }

    /// Rebuild the column form. Optional columns are only written when every
    /// record carries a value.
    pub fn from_records(records: &[ShorelineRecord]) -> Self {
        let filename = records.iter().map(|r| r.filename.clone()).collect::<Option<Vec<_>>>();
        let idx = records.iter().map(|r| r.idx).collect::<Option<Vec<_>>>();
        let mndwi = records.iter().map(|r| r.mndwi_threshold).collect::<Option<Vec<_>>>();

        Self {
            dates: records.iter().map(|r| r.date).collect(),
            shorelines: records.iter().map(|r| r.shoreline.clone()).collect(),
            filename: filename.unwrap_or_default(),
            cloud_cover: records.iter().map(|r| r.cloud_cover).collect(),
            geoaccuracy: records.iter().map(|r| r.geoaccuracy).collect(),
            idx: idx.unwrap_or_default(),
            satname: records.iter().map(|r| r.satname.clone()).collect(),
            mndwi_threshold: mndwi.unwrap_or_default(),
        }
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

fn check_column(column: &'static str, expected: usize, actual: usize, optional: bool) -> Result<()> {
    if actual == expected || (optional && actual == 0) {
        Ok(())
    } else {
        Err(CommonError::ColumnLength { column, expected, actual })
    }
}
