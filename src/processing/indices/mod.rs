// src/processing/indices/mod.rs
pub mod arvi;
pub mod evi;
pub mod gci;
pub mod ndvi;
pub mod savi;
pub mod vari;

use gdal::raster::Buffer;
use rayon::prelude::*;

use crate::processing::parallel::IndexCalculator;

// Re-export indices
pub use arvi::ARVI;
pub use evi::EVI;
pub use gci::GCI;
pub use ndvi::NDVI;
pub use savi::SAVI;
pub use vari::VARI;

/// The six indices appended to every scene, in output order.
pub fn default_indices() -> Vec<Box<dyn IndexCalculator>> {
    vec![
        Box::new(NDVI::new(None)),
        Box::new(SAVI::new(0.5, None)),
        Box::new(EVI::new(None)),
        Box::new(GCI::new(None)),
        Box::new(ARVI::new(None)),
        Box::new(VARI::new(None)),
    ]
}

/// `numerator / denominator`, or 0 when the denominator is zero.
/// Masked (NaN) inputs stay masked.
#[inline]
pub(crate) fn ratio(numerator: f32, denominator: f32) -> f32 {
    if denominator == 0.0 && !numerator.is_nan() {
        0.0
    } else {
        numerator / denominator
    }
}

pub(crate) fn zip_map2<F>(a: &Buffer<f32>, b: &Buffer<f32>, f: F) -> Buffer<f32>
where
    F: Fn(f32, f32) -> f32 + Sync,
{
    let data = a
        .data()
        .par_iter()
        .zip(b.data().par_iter())
        .map(|(&a, &b)| f(a, b))
        .collect();
    Buffer::new(a.shape(), data)
}

pub(crate) fn zip_map3<F>(a: &Buffer<f32>, b: &Buffer<f32>, c: &Buffer<f32>, f: F) -> Buffer<f32>
where
    F: Fn(f32, f32, f32) -> f32 + Sync,
{
    let data = a
        .data()
        .par_iter()
        .zip(b.data().par_iter())
        .zip(c.data().par_iter())
        .map(|((&a, &b), &c)| f(a, b, c))
        .collect();
    Buffer::new(a.shape(), data)
}
