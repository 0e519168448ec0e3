pub mod builder;

use coast_common::{ShorelineRecord, ShorelineSettings};
use detection::Detector;
use tracing::{debug, info};

use crate::{error::Result, traits::RecordFilter};

/// Runs the detector for one ROI and post-filters its time series
pub struct ExtractionPipeline {
    detector: Box<dyn Detector>,
    filters: Vec<Box<dyn RecordFilter>>,
}

impl ExtractionPipeline {
    /// Create a new pipeline builder around `detector`
    pub fn builder<D>(detector: D) -> builder::ExtractionPipelineBuilder
    where
        D: Detector + 'static,
    {
        builder::ExtractionPipelineBuilder::new(detector)
    }

    pub fn new(detector: Box<dyn Detector>, filters: Vec<Box<dyn RecordFilter>>) -> Self {
        Self { detector, filters }
    }

    pub fn detector(&self) -> &dyn Detector {
        self.detector.as_ref()
    }

    /// Names of the filters in the order they are applied
    pub fn filter_names(&self) -> Vec<&'static str> {
        self.filters.iter().map(|filter| filter.name()).collect()
    }

    /// Extract and filter shorelines for the ROI described by `settings.inputs`
    pub fn run(&self, settings: &ShorelineSettings) -> Result<Vec<ShorelineRecord>> {
        info!(
            roi_id = %settings.inputs.roi_id,
            "Extracting shorelines with {}",
            self.detector.description()
        );

        // Step 1: metadata for the downloaded imagery
        let metadata = self.detector.get_metadata(&settings.inputs)?;

        // Step 2: one shoreline per image
        let series = self.detector.extract_shorelines(&metadata, settings)?;
        let mut records = series.records()?;

        // Step 3: post-filters in sequence
        for filter in &self.filters {
            let before = records.len();
            records = filter.filter(records)?;
            debug!(filter = filter.name(), before, after = records.len(), "Applied filter");
        }

        info!(
            roi_id = %settings.inputs.roi_id,
            "{} shoreline(s) kept of {}",
            records.len(),
            series.len()
        );
        Ok(records)
    }

    /// Get information about the pipeline configuration
    pub fn info(&self) -> String {
        format!(
            "ExtractionPipeline: {}, filters [{}]",
            self.detector.description(),
            self.filter_names().join(", ")
        )
    }
}
