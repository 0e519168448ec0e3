//! # Detection
//!
//! The seam between shoreline orchestration and the external shoreline
//! detection library. Image retrieval, metadata extraction and pixel-level
//! shoreline delineation all live behind [`Detector`]; this crate only
//! defines the call/return contract and a driver that reaches an external
//! detection program over stdin/stdout.

#[cfg(feature = "process")]
pub mod process;

use std::sync::Arc;

use coast_common::{Metadata, RoiSettings, ShorelineSettings, ShorelineTimeSeries};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr, VariantNames};

#[cfg(feature = "process")]
pub use process::{DetectorConfig, ProcessDetector};

pub type Result<T> = std::result::Result<T, DetectorError>;

#[derive(thiserror::Error, Debug)]
pub enum DetectorError {
    #[error("Failed to initialize detector: {0}")]
    Initialization(String),
    #[error("Detector execution failed: {0}")]
    Execution(String),
    #[error("Invalid detector response: {0}")]
    InvalidResponse(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// The steps a detection backend performs, in call order
#[derive(
    Debug, Clone, Copy,
    Serialize, Deserialize, JsonSchema,
    Display, EnumString, EnumIter, VariantNames, IntoStaticStr,
    PartialEq, Eq
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DetectorStep {
    /// Collect metadata for the downloaded imagery of one ROI
    Metadata,
    /// Map every image of the ROI to a shoreline
    Extract,
}

/// Request body of the [`DetectorStep::Extract`] step
#[derive(Debug, Serialize)]
pub struct ExtractRequest<'a> {
    pub metadata: &'a Metadata,
    pub settings: &'a ShorelineSettings,
}

/// A shoreline detection backend.
///
/// Implementations own image access and shoreline delineation. Callers only
/// see the two call/return steps.
pub trait Detector: Send + Sync {
    /// Gather metadata for the imagery described by `inputs`
    fn get_metadata(&self, inputs: &RoiSettings) -> Result<Metadata>;

    /// Detect shorelines in every image listed in `metadata`
    fn extract_shorelines(
        &self,
        metadata: &Metadata,
        settings: &ShorelineSettings,
    ) -> Result<ShorelineTimeSeries>;

    /// Human-readable description used in logs
    fn description(&self) -> String {
        "shoreline detector".to_string()
    }
}

impl<D: Detector + ?Sized> Detector for Box<D> {
    fn get_metadata(&self, inputs: &RoiSettings) -> Result<Metadata> {
        (**self).get_metadata(inputs)
    }

    fn extract_shorelines(
        &self,
        metadata: &Metadata,
        settings: &ShorelineSettings,
    ) -> Result<ShorelineTimeSeries> {
        (**self).extract_shorelines(metadata, settings)
    }

    fn description(&self) -> String {
        (**self).description()
    }
}

impl<D: Detector + ?Sized> Detector for Arc<D> {
    fn get_metadata(&self, inputs: &RoiSettings) -> Result<Metadata> {
        (**self).get_metadata(inputs)
    }

    fn extract_shorelines(
        &self,
        metadata: &Metadata,
        settings: &ShorelineSettings,
    ) -> Result<ShorelineTimeSeries> {
        (**self).extract_shorelines(metadata, settings)
    }

    fn description(&self) -> String {
        (**self).description()
    }
}
