// src/processing/indices/ndvi.rs
use gdal::raster::Buffer;

use super::{ratio, zip_map2};
use crate::processing::parallel::IndexCalculator;

/// NDVI = (NIR - RED) / (NIR + RED)
#[inline]
pub fn ndvi(nir: f32, red: f32) -> f32 {
    ratio(nir - red, nir + red)
}

/// Normalized Difference Vegetation Index (NDVI) calculator
pub struct NDVI {
    nir: String,
    red: String,
    name: String,
}

impl NDVI {
    pub fn new(name: Option<String>) -> Self {
        Self::with_bands("nir", "red", name)
    }

    pub fn with_bands(nir: &str, red: &str, name: Option<String>) -> Self {
        Self {
            nir: nir.to_string(),
            red: red.to_string(),
            name: name.unwrap_or_else(|| "NDVI".to_string()),
        }
    }
}

impl IndexCalculator for NDVI {
    fn calculate(&self, inputs: &[&Buffer<f32>]) -> Buffer<f32> {
        zip_map2(inputs[0], inputs[1], ndvi)
    }

    fn input_bands(&self) -> Vec<&str> {
        vec![self.nir.as_str(), self.red.as_str()]
    }

    fn name(&self) -> &str {
        &self.name
    }
}
