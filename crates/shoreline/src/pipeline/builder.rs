use chrono::Duration;
use detection::Detector;

use crate::{
    filters::{DEFAULT_GEOREF_THRESHOLD_M, DuplicateFilter, EmptyShorelineFilter, GeorefFilter},
    pipeline::ExtractionPipeline,
    traits::RecordFilter,
};

/// Builder for extraction pipelines with a fluent API
pub struct ExtractionPipelineBuilder {
    detector: Box<dyn Detector>,
    filters: Vec<Box<dyn RecordFilter>>,
}

impl ExtractionPipelineBuilder {
    pub fn new<D>(detector: D) -> Self
    where
        D: Detector + 'static,
    {
        Self {
            detector: Box::new(detector),
            filters: Vec::new(),
        }
    }

    /// Add a filter to the end of the chain
    pub fn add_filter<F>(mut self, filter: F) -> Self
    where
        F: RecordFilter + 'static,
    {
        self.filters.push(Box::new(filter));
        self
    }

    /// Remove duplicates acquired within 5 minutes of each other
    pub fn with_duplicate_removal(self) -> Self {
        self.add_filter(DuplicateFilter::default())
    }

    /// Remove duplicates acquired within `window` of each other
    pub fn with_duplicate_window(self, window: Duration) -> Self {
        self.add_filter(DuplicateFilter::new(window))
    }

    /// Remove shorelines whose georeferencing error is not below `threshold_m`
    pub fn with_georef_threshold(self, threshold_m: f64) -> Self {
        self.add_filter(GeorefFilter::new(threshold_m))
    }

    pub fn with_empty_removal(self) -> Self {
        self.add_filter(EmptyShorelineFilter)
    }

    pub fn build(self) -> ExtractionPipeline {
        ExtractionPipeline::new(self.detector, self.filters)
    }

    /// Duplicate removal followed by the 10 m georeferencing filter
    pub fn build_default<D>(detector: D) -> ExtractionPipeline
    where
        D: Detector + 'static,
    {
        Self::new(detector)
            .with_duplicate_removal()
            .with_georef_threshold(DEFAULT_GEOREF_THRESHOLD_M)
            .build()
    }
}
