//! Fixtures shared by the unit tests

use std::sync::Mutex;

use chrono::NaiveDate;
use coast_common::{
    DateRange, GeoAccuracy, LandsatCollection, Metadata, RoiSettings, Satellite, SatelliteMetadata,
    ShorelineRecord, ShorelineSettings, ShorelineTimeSeries, utils,
};
use detection::{Detector, DetectorError};

/// A record in EPSG:32611 with `points` vertices along the ROI's beach
pub fn record(date: &str, satname: &str, points: usize, rmse: f64) -> ShorelineRecord {
    ShorelineRecord {
        date: utils::parse_date(date).unwrap(),
        satname: satname.to_string(),
        shoreline: (0..points)
            .map(|k| [458_000.0 + 10.0 * k as f64, 3_668_500.0 + 5.0 * k as f64])
            .collect(),
        cloud_cover: 0.1,
        geoaccuracy: GeoAccuracy::Rmse(rmse),
        filename: Some(format!("{date}_{satname}.tif")),
        idx: Some(0),
        mndwi_threshold: None,
    }
}

pub fn roi_settings(roi_id: &str) -> RoiSettings {
    RoiSettings {
        roi_id: roi_id.to_string(),
        sitename: format!("ID_{roi_id}_datetime06-05-23__04_16_45"),
        filepath: "/data".to_string(),
        dates: DateRange::new(
            NaiveDate::from_ymd_opt(2018, 12, 1).unwrap(),
            NaiveDate::from_ymd_opt(2019, 3, 1).unwrap(),
        )
        .unwrap(),
        sat_list: vec![Satellite::L8, Satellite::S2],
        polygon: vec![vec![
            [-117.50, 33.10],
            [-117.40, 33.10],
            [-117.40, 33.20],
            [-117.50, 33.20],
            [-117.50, 33.10],
        ]],
        landsat_collection: LandsatCollection::C02,
        extra: Default::default(),
    }
}

/// Reference shoreline crossing the test ROI, in EPSG:4326
pub fn reference_geojson() -> String {
    serde_json::json!({
        "type": "FeatureCollection",
        "features": [{
            "type": "Feature",
            "properties": { "id": "ref" },
            "geometry": {
                "type": "LineString",
                "coordinates": [[-117.46, 33.12], [-117.45, 33.15], [-117.44, 33.18]]
            }
        }]
    })
    .to_string()
}

/// In-memory detector returning a canned time series
pub struct StaticDetector {
    series: ShorelineTimeSeries,
    failure: Option<String>,
    last_settings: Mutex<Option<ShorelineSettings>>,
}

impl StaticDetector {
    pub fn new(series: ShorelineTimeSeries) -> Self {
        Self {
            series,
            failure: None,
            last_settings: Mutex::new(None),
        }
    }

    pub fn from_records(records: &[ShorelineRecord]) -> Self {
        Self::new(ShorelineTimeSeries::from_records(records))
    }

    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Self::new(ShorelineTimeSeries::default())
        }
    }

    pub fn last_settings(&self) -> Option<ShorelineSettings> {
        self.last_settings.lock().unwrap().clone()
    }
}

impl Detector for StaticDetector {
    fn get_metadata(&self, inputs: &RoiSettings) -> detection::Result<Metadata> {
        if let Some(message) = &self.failure {
            return Err(DetectorError::Execution(message.clone()));
        }
        Ok(inputs
            .sat_list
            .iter()
            .map(|sat| (sat.to_string(), SatelliteMetadata::default()))
            .collect())
    }

    fn extract_shorelines(
        &self,
        _metadata: &Metadata,
        settings: &ShorelineSettings,
    ) -> detection::Result<ShorelineTimeSeries> {
        *self.last_settings.lock().unwrap() = Some(settings.clone());
        Ok(self.series.clone())
    }

    fn description(&self) -> String {
        "static test detector".to_string()
    }
}
