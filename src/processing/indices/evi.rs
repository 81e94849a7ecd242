// src/processing/indices/evi.rs
use gdal::raster::Buffer;

use super::{ratio, zip_map3};
use crate::processing::parallel::IndexCalculator;

// EVI coefficients from MODIS documentation
const G: f32 = 2.5; // Gain factor
const L: f32 = 1.0; // Canopy background adjustment
const C1: f32 = 6.0; // Aerosol resistance (red)
const C2: f32 = 7.5; // Aerosol resistance (blue)

/// EVI = 2.5 * (NIR - RED) / (NIR + 6*RED - 7.5*BLUE + 1)
#[inline]
pub fn evi(nir: f32, red: f32, blue: f32) -> f32 {
    G * ratio(nir - red, nir + C1 * red - C2 * blue + L)
}

/// Enhanced Vegetation Index (EVI) calculator
pub struct EVI {
    name: String,
}

impl EVI {
    pub fn new(name: Option<String>) -> Self {
        Self {
            name: name.unwrap_or_else(|| "EVI".to_string()),
        }
    }
}

impl IndexCalculator for EVI {
    fn calculate(&self, inputs: &[&Buffer<f32>]) -> Buffer<f32> {
        zip_map3(inputs[0], inputs[1], inputs[2], evi)
    }

    fn input_bands(&self) -> Vec<&str> {
        vec!["nir", "red", "blue"]
    }

    fn name(&self) -> &str {
        &self.name
    }
}
