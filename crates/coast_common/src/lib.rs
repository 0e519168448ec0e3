//! # Coast Common - Shared Settings and Wire Types
//!
//! Data structures shared between the shoreline crates and the external
//! shoreline-detection program: per-ROI acquisition settings, global
//! extraction settings, the assembled settings handed to the detector and
//! the time series it hands back.
//!
//! ## Example
//!
//! ```rust
//! use coast_common::{DateRange, Satellite};
//! use chrono::NaiveDate;
//!
//! let range = DateRange::new(
//!     NaiveDate::from_ymd_opt(2018, 12, 1).unwrap(),
//!     NaiveDate::from_ymd_opt(2019, 3, 1).unwrap(),
//! ).unwrap();
//! assert_eq!(range.days(), 90);
//!
//! let sat: Satellite = "L8".parse().unwrap();
//! assert_eq!(sat.to_string(), "L8");
//! ```

pub mod series;
pub mod settings;

use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr, VariantNames};
use thiserror::Error;
use ts_rs::TS;

// Re-exports for convenience
pub use chrono::{DateTime, Utc};
pub use series::{Metadata, SatelliteMetadata, ShorelineRecord, ShorelineTimeSeries};
pub use settings::{RoiSettings, Settings, ShorelineSettings};

/// Result type for shared coast operations
pub type Result<T> = std::result::Result<T, CommonError>;

/// JSON object used for settings keys this crate does not model explicitly
pub type JsonObject = serde_json::Map<String, serde_json::Value>;

/// Standard error type for settings and wire data
#[derive(Error, Debug)]
pub enum CommonError {
    #[error("Invalid date range: start {start} >= end {end}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    #[error("{name} cannot be empty")]
    Empty { name: &'static str },

    #[error("Configuration validation failed: {details}")]
    ValidationFailed { details: String },

    #[error("Time series column '{column}' has {actual} entries, expected {expected}")]
    ColumnLength {
        column: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Parse error: {0}")]
    Parse(String),
}

/// Inclusive acquisition window, serialized as `["YYYY-MM-DD", "YYYY-MM-DD"]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct DateRange(pub NaiveDate, pub NaiveDate);

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        let range = Self(start, end);
        range.validate()?;
        Ok(range)
    }

    pub fn start(&self) -> NaiveDate {
        self.0
    }

    pub fn end(&self) -> NaiveDate {
        self.1
    }

    /// Number of days spanned by the window
    pub fn days(&self) -> i64 {
        (self.1 - self.0).num_days()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.0 && date <= self.1
    }

    pub fn validate(&self) -> Result<()> {
        if self.0 >= self.1 {
            return Err(CommonError::InvalidDateRange {
                start: self.0,
                end: self.1,
            });
        }
        Ok(())
    }
}

/// Satellite missions understood by the detection program
#[derive(
    Debug, Clone, Copy,
    Serialize, Deserialize, JsonSchema,
    Display, EnumString, EnumIter, VariantNames, IntoStaticStr,
    PartialEq, Eq, Hash, PartialOrd, Ord
)]
pub enum Satellite {
    /// Landsat 5
    L5,
    /// Landsat 7
    L7,
    /// Landsat 8
    L8,
    /// Landsat 9
    L9,
    /// Sentinel-2
    S2,
}

impl Satellite {
    pub fn is_landsat(&self) -> bool {
        !matches!(self, Satellite::S2)
    }
}

/// Landsat collection to query
#[derive(
    Debug, Clone, Copy, Default,
    Serialize, Deserialize, JsonSchema,
    Display, EnumString, PartialEq, Eq
)]
pub enum LandsatCollection {
    C01,
    #[default]
    C02,
}

/// Georeferencing status reported for imagery without an RMSE value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, TS)]
#[serde(rename_all = "UPPERCASE")]
pub enum GeorefStatus {
    Passed,
    Failed,
}

/// Georeferencing accuracy of a single image.
///
/// Landsat scenes report an RMSE in metres, with `-1` meaning the value is
/// unknown. Sentinel-2 scenes report a quality flag instead.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema, TS)]
#[serde(untagged)]
pub enum GeoAccuracy {
    Rmse(f64),
    Status(GeorefStatus),
}

impl GeoAccuracy {
    pub const UNKNOWN: GeoAccuracy = GeoAccuracy::Rmse(-1.0);

    /// True when the image passes a georeferencing threshold in metres
    pub fn is_within(&self, threshold_m: f64) -> bool {
        match *self {
            GeoAccuracy::Rmse(rmse) => rmse >= 0.0 && rmse < threshold_m,
            GeoAccuracy::Status(status) => status == GeorefStatus::Passed,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(*self, GeoAccuracy::Rmse(rmse) if rmse < 0.0)
    }
}

impl Default for GeoAccuracy {
    fn default() -> Self {
        Self::UNKNOWN
    }
}

impl std::fmt::Display for GeoAccuracy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GeoAccuracy::Rmse(rmse) => write!(f, "{rmse}"),
            GeoAccuracy::Status(GeorefStatus::Passed) => f.write_str("PASSED"),
            GeoAccuracy::Status(GeorefStatus::Failed) => f.write_str("FAILED"),
        }
    }
}

/// Date formatting shared by feature properties, layer names and file edits
pub mod utils {
    use super::*;
    use chrono::{NaiveDateTime, TimeZone};

    /// Format used for the `date` property of extracted shorelines
    pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    pub fn format_date(date: &DateTime<Utc>) -> String {
        date.format(DATE_FORMAT).to_string()
    }

    /// Parse a date written as `%Y-%m-%d %H:%M:%S` (UTC) or RFC 3339
    pub fn parse_date(value: &str) -> Result<DateTime<Utc>> {
        let value = value.trim();
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, DATE_FORMAT) {
            return Ok(Utc.from_utc_datetime(&naive));
        }
        DateTime::parse_from_rfc3339(value)
            .map(|date| date.with_timezone(&Utc))
            .map_err(|e| CommonError::Parse(format!("Invalid date '{value}': {e}")))
    }

    /// Split a `"<satname>_<date>"` selection item
    pub fn split_selection(item: &str) -> Result<(String, DateTime<Utc>)> {
        let (satname, date) = item
            .split_once('_')
            .ok_or_else(|| CommonError::Parse(format!("Expected '<satname>_<date>', got '{item}'")))?;
        Ok((satname.to_string(), parse_date(date)?))
    }
}

/// Serde helpers for dates written as `%Y-%m-%d %H:%M:%S`
pub mod date_serde {
    use super::{DateTime, Utc, utils};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(date: &DateTime<Utc>, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&utils::format_date(date))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> std::result::Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        utils::parse_date(&raw).map_err(serde::de::Error::custom)
    }

    pub fn deserialize_vec<'de, D>(deserializer: D) -> std::result::Result<Vec<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Vec::<String>::deserialize(deserializer)?;
        raw.iter()
            .map(|value| utils::parse_date(value).map_err(serde::de::Error::custom))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_date_range() {
        let range = DateRange::new(date(2018, 12, 1), date(2019, 3, 1)).unwrap();
        assert!(range.contains(date(2019, 1, 15)));
        assert!(!range.contains(date(2019, 3, 2)));
        assert_eq!(range.days(), 90);
    }

    #[test]
    fn test_invalid_date_range() {
        assert!(DateRange::new(date(2019, 3, 1), date(2018, 12, 1)).is_err());
        assert!(DateRange::new(date(2019, 3, 1), date(2019, 3, 1)).is_err());
    }

    #[test]
    fn test_date_range_wire_format() {
        let range: DateRange = serde_json::from_str(r#"["2018-12-01", "2019-03-01"]"#).unwrap();
        assert_eq!(range.start(), date(2018, 12, 1));
        assert_eq!(
            serde_json::to_string(&range).unwrap(),
            r#"["2018-12-01","2019-03-01"]"#
        );
    }

    #[test]
    fn test_geoaccuracy_threshold() {
        assert!(GeoAccuracy::Rmse(4.2).is_within(10.0));
        assert!(!GeoAccuracy::Rmse(10.0).is_within(10.0));
        assert!(!GeoAccuracy::UNKNOWN.is_within(10.0));
        assert!(GeoAccuracy::Status(GeorefStatus::Passed).is_within(10.0));
        assert!(!GeoAccuracy::Status(GeorefStatus::Failed).is_within(10.0));
    }

    #[test]
    fn test_geoaccuracy_untagged_json() {
        let values: Vec<GeoAccuracy> = serde_json::from_str(r#"[5.1, -1, "PASSED", "FAILED"]"#).unwrap();
        assert_eq!(values[0], GeoAccuracy::Rmse(5.1));
        assert!(values[1].is_unknown());
        assert_eq!(values[2], GeoAccuracy::Status(GeorefStatus::Passed));
        assert_eq!(values[3].to_string(), "FAILED");
    }

    #[test]
    fn test_parse_date_formats() {
        let a = utils::parse_date("2019-01-05 10:30:00").unwrap();
        let b = utils::parse_date("2019-01-05T10:30:00+00:00").unwrap();
        assert_eq!(a, b);
        assert_eq!(utils::format_date(&a), "2019-01-05 10:30:00");
        assert!(utils::parse_date("yesterday").is_err());
    }

    #[test]
    fn test_split_selection() {
        let (sat, when) = utils::split_selection("L8_2019-01-05 10:30:00").unwrap();
        assert_eq!(sat, "L8");
        assert_eq!(utils::format_date(&when), "2019-01-05 10:30:00");
        assert!(utils::split_selection("L8").is_err());
    }

    #[test]
    fn test_satellite_names() {
        assert_eq!("S2".parse::<Satellite>().unwrap(), Satellite::S2);
        assert!(!Satellite::S2.is_landsat());
        assert!(Satellite::L9.is_landsat());
        assert!("L6".parse::<Satellite>().is_err());
    }
}
