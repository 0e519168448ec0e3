use thiserror::Error;

#[derive(Error, Debug)]
pub enum ShorelineError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("No shorelines were extracted for ROI {0}")]
    NoExtractedShoreline(String),

    #[error("ROI id {0} was not found")]
    RoiNotFound(String),

    #[error("Empty GeoJSON cannot be drawn onto the map")]
    EmptyLayer,

    #[error("Unsupported coordinate reference system: {0}")]
    UnsupportedCrs(String),

    #[error("Projection error: {0}")]
    Projection(String),

    #[error("Invalid feature collection: {0}")]
    InvalidCollection(String),

    #[error("Settings error: {0}")]
    Settings(#[from] coast_common::CommonError),

    #[error("Detector error: {0}")]
    Detector(#[from] detection::DetectorError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),
}

pub type Result<T> = std::result::Result<T, ShorelineError>;
