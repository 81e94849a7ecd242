// src/error.rs
use chrono::NaiveDate;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("GDAL error: {0}")]
    Gdal(#[from] gdal::errors::GdalError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("band '{band}' not found in image '{image}'")]
    MissingBand { band: String, image: String },

    #[error("band '{band}' already exists in image '{image}'")]
    DuplicateBand { band: String, image: String },

    #[error("shape mismatch: expected {expected:?}, found {found:?}")]
    ShapeMismatch {
        expected: (usize, usize),
        found: (usize, usize),
    },

    #[error("scene '{scene}' is missing source band '{band}'")]
    MissingSceneBand { scene: String, band: String },

    #[error("image collection is empty: {0}")]
    EmptyCollection(String),

    #[error("invalid date range: start {start} is not before end {end}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    #[error("invalid area of interest: {0}")]
    InvalidAoi(String),

    #[error("invalid export description '{0}': use 1-100 characters from [A-Za-z0-9.,:;_-]")]
    InvalidDescription(String),

    #[error("export of {pixels} pixels exceeds maxPixels {max}")]
    TooManyPixels { pixels: f64, max: f64 },

    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
