use coast_common::ShorelineRecord;
use crate::error::Result;

/// Trait for post-filters applied to the detector's shoreline time series
pub trait RecordFilter: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Return the records that survive the filter, in their original order
    fn filter(&self, records: Vec<ShorelineRecord>) -> Result<Vec<ShorelineRecord>>;
}
