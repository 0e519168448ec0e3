use coast_common::ShorelineRecord;
use tracing::info;

use crate::{error::Result, traits::RecordFilter};

/// Default georeferencing threshold in metres
pub const DEFAULT_GEOREF_THRESHOLD_M: f64 = 10.0;

/// Removes shorelines from images with poor or unknown georeferencing
#[derive(Debug, Clone, Copy)]
pub struct GeorefFilter {
    pub threshold_m: f64,
}

impl Default for GeorefFilter {
    fn default() -> Self {
        Self {
            threshold_m: DEFAULT_GEOREF_THRESHOLD_M,
        }
    }
}

impl GeorefFilter {
    pub fn new(threshold_m: f64) -> Self {
        Self { threshold_m }
    }
}

impl RecordFilter for GeorefFilter {
    fn name(&self) -> &'static str {
        "remove_inaccurate_georef"
    }

    fn filter(&self, mut records: Vec<ShorelineRecord>) -> Result<Vec<ShorelineRecord>> {
        let before = records.len();
        records.retain(|record| record.geoaccuracy.is_within(self.threshold_m));
        info!(
            "{} bad georef (threshold {} m)",
            before - records.len(),
            self.threshold_m
        );
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::record;
    use coast_common::{GeoAccuracy, GeorefStatus};

    #[test]
    fn test_threshold_is_exclusive() {
        let records = vec![
            record("2019-01-01 10:00:00", "L8", 3, 9.9),
            record("2019-01-02 10:00:00", "L8", 3, 10.0),
            record("2019-01-03 10:00:00", "L8", 3, 25.0),
        ];
        let kept = GeorefFilter::default().filter(records).unwrap();
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].geoaccuracy, GeoAccuracy::Rmse(9.9));
    }

    #[test]
    fn test_unknown_accuracy_removed() {
        let records = vec![
            record("2019-01-01 10:00:00", "L8", 3, -1.0),
            record("2019-01-02 10:00:00", "L8", 3, 0.0),
        ];
        let kept = GeorefFilter::default().filter(records).unwrap();
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].geoaccuracy, GeoAccuracy::Rmse(0.0));
    }

    #[test]
    fn test_sentinel_quality_flags() {
        let mut passed = record("2019-01-01 10:00:00", "S2", 3, 0.0);
        passed.geoaccuracy = GeoAccuracy::Status(GeorefStatus::Passed);
        let mut failed = record("2019-01-02 10:00:00", "S2", 3, 0.0);
        failed.geoaccuracy = GeoAccuracy::Status(GeorefStatus::Failed);

        let kept = GeorefFilter::new(5.0).filter(vec![passed.clone(), failed]).unwrap();
        assert_eq!(kept, vec![passed]);
    }
}
