// src/processing/indices/vari.rs
use gdal::raster::Buffer;

use super::{ratio, zip_map3};
use crate::processing::parallel::IndexCalculator;

/// VARI = (GREEN - RED) / (GREEN + RED - BLUE)
#[inline]
pub fn vari(green: f32, red: f32, blue: f32) -> f32 {
    ratio(green - red, green + red - blue)
}

/// Visible Atmospherically Resistant Index (VARI) calculator
pub struct VARI {
    name: String,
}

impl VARI {
    pub fn new(name: Option<String>) -> Self {
        Self {
            name: name.unwrap_or_else(|| "VARI".to_string()),
        }
    }
}

impl IndexCalculator for VARI {
    fn calculate(&self, inputs: &[&Buffer<f32>]) -> Buffer<f32> {
        zip_map3(inputs[0], inputs[1], inputs[2], vari)
    }

    fn input_bands(&self) -> Vec<&str> {
        vec!["green", "red", "blue"]
    }

    fn name(&self) -> &str {
        &self.name
    }
}
