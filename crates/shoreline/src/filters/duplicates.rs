use std::collections::BTreeSet;

use chrono::Duration;
use coast_common::ShorelineRecord;
use tracing::info;

use crate::{error::Result, traits::RecordFilter};

/// Removes shorelines extracted twice from the same acquisition.
///
/// Overlapping tiles of one satellite pass produce images a few seconds
/// apart. Each record is paired with the first later record acquired within
/// `window`; of the pair, the shoreline with fewer points is dropped.
#[derive(Debug, Clone, Copy)]
pub struct DuplicateFilter {
    pub window: Duration,
}

impl Default for DuplicateFilter {
    fn default() -> Self {
        Self {
            window: Duration::minutes(5),
        }
    }
}

impl DuplicateFilter {
    pub fn new(window: Duration) -> Self {
        Self { window }
    }

    fn duplicate_indices(&self, records: &[ShorelineRecord]) -> BTreeSet<usize> {
        let mut remove = BTreeSet::new();
        for (i, current) in records.iter().enumerate() {
            let partner = records
                .iter()
                .enumerate()
                .skip(i + 1)
                .find(|(_, other)| {
                    let delta = if other.date > current.date {
                        other.date - current.date
                    } else {
                        current.date - other.date
                    };
                    delta <= self.window
                })
                .map(|(j, _)| j);

            if let Some(j) = partner {
                // Ties drop the earlier record
                if current.shoreline.len() > records[j].shoreline.len() {
                    remove.insert(j);
                } else {
                    remove.insert(i);
                }
            }
        }
        remove
    }
}

impl RecordFilter for DuplicateFilter {
    fn name(&self) -> &'static str {
        "remove_duplicates"
    }

    fn filter(&self, records: Vec<ShorelineRecord>) -> Result<Vec<ShorelineRecord>> {
        let remove = self.duplicate_indices(&records);
        info!("{} duplicates", remove.len());
        Ok(records
            .into_iter()
            .enumerate()
            .filter(|(i, _)| !remove.contains(i))
            .map(|(_, record)| record)
            .collect())
    }
}
