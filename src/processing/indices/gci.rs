// src/processing/indices/gci.rs
use gdal::raster::Buffer;

use super::{ratio, zip_map2};
use crate::processing::parallel::IndexCalculator;

/// GCI = NIR / GREEN - 1
#[inline]
pub fn gci(nir: f32, green: f32) -> f32 {
    ratio(nir, green) - 1.0
}

/// Green Chlorophyll Index (GCI) calculator
pub struct GCI {
    name: String,
}

impl GCI {
    pub fn new(name: Option<String>) -> Self {
        Self {
            name: name.unwrap_or_else(|| "GCI".to_string()),
        }
    }
}

impl IndexCalculator for GCI {
    fn calculate(&self, inputs: &[&Buffer<f32>]) -> Buffer<f32> {
        zip_map2(inputs[0], inputs[1], gci)
    }

    fn input_bands(&self) -> Vec<&str> {
        vec!["nir", "green"]
    }

    fn name(&self) -> &str {
        &self.name
    }
}
