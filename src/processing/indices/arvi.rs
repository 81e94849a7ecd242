// src/processing/indices/arvi.rs
use gdal::raster::Buffer;

use super::{ratio, zip_map3};
use crate::processing::parallel::IndexCalculator;

/// ARVI = (NIR - RB) / (NIR + RB), with RB = RED - (BLUE - RED)
#[inline]
pub fn arvi(nir: f32, red: f32, blue: f32) -> f32 {
    let rb = red - (blue - red);
    ratio(nir - rb, nir + rb)
}

/// Atmospherically Resistant Vegetation Index (ARVI) calculator
pub struct ARVI {
    name: String,
}

impl ARVI {
    pub fn new(name: Option<String>) -> Self {
        Self {
            name: name.unwrap_or_else(|| "ARVI".to_string()),
        }
    }
}

impl IndexCalculator for ARVI {
    fn calculate(&self, inputs: &[&Buffer<f32>]) -> Buffer<f32> {
        zip_map3(inputs[0], inputs[1], inputs[2], arvi)
    }

    fn input_bands(&self) -> Vec<&str> {
        vec!["nir", "red", "blue"]
    }

    fn name(&self) -> &str {
        &self.name
    }
}
