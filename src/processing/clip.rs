// src/processing/clip.rs
use geo::{BoundingRect, Contains, Point};
use rayon::prelude::*;

use crate::aoi::Aoi;
use crate::error::Result;
use crate::image::Image;
use crate::spatial;

/// Mask every pixel whose centre falls outside the AOI.
pub fn clip(mut image: Image, aoi: &Aoi) -> Result<Image> {
    let srs = spatial::parse_srs(&image.geo().projection)?;
    let polygon = aoi.polygon_in(&srs)?;
    let Some(rect) = polygon.bounding_rect() else {
        image.update_mask(&vec![false; image.geo().len()])?;
        return Ok(image);
    };

    let geo = image.geo().clone();
    let keep: Vec<bool> = (0..geo.len())
        .into_par_iter()
        .map(|i| {
            let (x, y) = geo.pixel_center(i % geo.width, i / geo.width);
            x >= rect.min().x
                && x <= rect.max().x
                && y >= rect.min().y
                && y <= rect.max().y
                && polygon.contains(&Point::new(x, y))
        })
        .collect();

    let inside = keep.iter().filter(|k| **k).count();
    log::debug!("clip keeps {inside} of {} pixels in {}", keep.len(), image.id());

    image.update_mask(&keep)?;
    Ok(image)
}
