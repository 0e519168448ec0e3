pub mod duplicates;
pub mod georef;

pub use duplicates::*;
pub use georef::*;

use coast_common::ShorelineRecord;
use crate::{error::Result, traits::RecordFilter};

/// Drops records whose shoreline has no vertices
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyShorelineFilter;

impl RecordFilter for EmptyShorelineFilter {
    fn name(&self) -> &'static str {
        "empty_shoreline"
    }

    fn filter(&self, mut records: Vec<ShorelineRecord>) -> Result<Vec<ShorelineRecord>> {
        records.retain(|record| !record.shoreline.is_empty());
        Ok(records)
    }
}
