// src/processing/indices/savi.rs
use gdal::raster::Buffer;

use super::{ratio, zip_map2};
use crate::processing::parallel::IndexCalculator;

/// SAVI = ((NIR - RED) / (NIR + RED + L)) * (1 + L)
///
/// With the usual `L = 0.5` this is `1.5 * (NIR - RED) / (NIR + RED + 0.5)`.
#[inline]
pub fn savi(nir: f32, red: f32, soil_factor: f32) -> f32 {
    (1.0 + soil_factor) * ratio(nir - red, nir + red + soil_factor)
}

/// Soil Adjusted Vegetation Index (SAVI) calculator
pub struct SAVI {
    nir: String,
    red: String,
    soil_factor: f32,
    name: String,
}

impl SAVI {
    pub fn new(soil_factor: f32, name: Option<String>) -> Self {
        Self {
            nir: "nir".to_string(),
            red: "red".to_string(),
            soil_factor,
            name: name.unwrap_or_else(|| "SAVI".to_string()),
        }
    }

    pub fn soil_factor(&self) -> f32 {
        self.soil_factor
    }
}

impl IndexCalculator for SAVI {
    fn calculate(&self, inputs: &[&Buffer<f32>]) -> Buffer<f32> {
        // Inputs must already be reflectance: L only makes sense on a 0-1 scale
        let l = self.soil_factor;
        zip_map2(inputs[0], inputs[1], |nir, red| savi(nir, red, l))
    }

    fn input_bands(&self) -> Vec<&str> {
        vec![self.nir.as_str(), self.red.as_str()]
    }

    fn name(&self) -> &str {
        &self.name
    }
}
