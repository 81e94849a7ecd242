// src/collection/catalog.rs
//! Local scene catalog standing in for a hosted image collection.
//!
//! A catalog is a JSON manifest:
//!
//! ```json
//! {
//!   "platform": "landsat8",
//!   "scenes": [
//!     {
//!       "id": "LC08_026031_20210604",
//!       "date": "2021-06-04",
//!       "cloud_cover": 3.2,
//!       "footprint": [-94.1, 41.5, -91.2, 43.6],
//!       "bands": { "SR_B2": "LC08_026031_20210604/SR_B2.tif" }
//!     }
//!   ]
//! }
//! ```
//!
//! Relative band paths are resolved against the manifest's directory.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::aoi::Aoi;
use crate::collection::Platform;
use crate::error::{Error, Result};
use crate::io::reader;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneEntry {
    pub id: String,
    pub date: NaiveDate,
    pub cloud_cover: f64,
    /// `[min_lon, min_lat, max_lon, max_lat]`
    #[serde(default)]
    pub footprint: Option<[f64; 4]>,
    pub bands: BTreeMap<String, PathBuf>,
}

impl SceneEntry {
    pub fn band_path(&self, band: &str) -> Result<&Path> {
        self.bands
            .get(band)
            .map(PathBuf::as_path)
            .ok_or_else(|| Error::MissingSceneBand {
                scene: self.id.clone(),
                band: band.to_string(),
            })
    }

    /// Footprint from the manifest, or from the first band's raster extent.
    pub fn footprint(&self) -> Result<[f64; 4]> {
        if let Some(fp) = self.footprint {
            return Ok(fp);
        }
        let path = self.bands.values().next().ok_or_else(|| Error::MissingSceneBand {
            scene: self.id.clone(),
            band: "<any>".to_string(),
        })?;
        reader::footprint_wgs84(path)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneCatalog {
    pub platform: Platform,
    pub scenes: Vec<SceneEntry>,
}

impl SceneCatalog {
    pub fn new(platform: Platform, scenes: Vec<SceneEntry>) -> Self {
        Self { platform, scenes }
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        log::info!("Reading scene catalog: {}", path.display());
        let mut catalog: SceneCatalog = serde_json::from_str(&fs::read_to_string(path)?)?;

        let base = path.parent().unwrap_or_else(|| Path::new("."));
        for scene in &mut catalog.scenes {
            for band_path in scene.bands.values_mut() {
                if band_path.is_relative() {
                    *band_path = base.join(&*band_path);
                }
            }
        }
        log::debug!("catalog lists {} scenes", catalog.scenes.len());
        Ok(catalog)
    }

    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }

    /// Keep scenes acquired in `[start, end)`.
    pub fn filter_date(self, start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start >= end {
            return Err(Error::InvalidDateRange { start, end });
        }
        Ok(self.retain(|s| s.date >= start && s.date < end))
    }

    /// Keep scenes with cloud cover at or below `max_percent`.
    pub fn filter_cloud_cover(self, max_percent: f64) -> Self {
        self.retain(|s| s.cloud_cover <= max_percent)
    }

    /// Keep scenes whose footprint intersects the AOI.
    pub fn filter_bounds(self, aoi: &Aoi) -> Result<Self> {
        let mut kept = Vec::with_capacity(self.scenes.len());
        for scene in self.scenes {
            if aoi.intersects_bounds(scene.footprint()?) {
                kept.push(scene);
            }
        }
        Ok(Self {
            platform: self.platform,
            scenes: kept,
        })
    }

    /// Fail on the first scene lacking a band the platform needs.
    pub fn check_bands(&self) -> Result<()> {
        let required = self.platform.required_source_bands();
        for scene in &self.scenes {
            for band in &required {
                scene.band_path(band)?;
            }
        }
        Ok(())
    }

    /// Scenes sorted by acquisition date, then id.
    pub fn sorted(self) -> Self {
        let scenes = self
            .scenes
            .into_iter()
            .sorted_by(|a, b| a.date.cmp(&b.date).then_with(|| a.id.cmp(&b.id)))
            .collect();
        Self {
            platform: self.platform,
            scenes,
        }
    }

    fn retain<F: Fn(&SceneEntry) -> bool>(mut self, keep: F) -> Self {
        self.scenes.retain(|s| keep(s));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scene(id: &str, date: &str, cloud: f64) -> SceneEntry {
        SceneEntry {
            id: id.to_string(),
            date: date.parse().unwrap(),
            cloud_cover: cloud,
            footprint: Some([0.0, 0.0, 1.0, 1.0]),
            bands: BTreeMap::new(),
        }
    }

    #[test]
    fn date_filter_excludes_end_date() {
        let catalog = SceneCatalog::new(
            Platform::Sentinel2,
            vec![
                scene("a", "2021-01-01", 1.0),
                scene("b", "2021-01-15", 1.0),
                scene("c", "2021-01-31", 1.0),
            ],
        );
        let start = "2021-01-01".parse().unwrap();
        let end = "2021-01-31".parse().unwrap();
        let kept = catalog.filter_date(start, end).unwrap();
        let ids: Vec<_> = kept.scenes.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, ["a", "b"]);
    }

    #[test]
    fn cloud_filter_is_inclusive() {
        let catalog = SceneCatalog::new(
            Platform::Landsat8,
            vec![scene("a", "2021-01-01", 10.0), scene("b", "2021-01-02", 10.5)],
        );
        let kept = catalog.filter_cloud_cover(10.0);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept.scenes[0].id, "a");
    }

    #[test]
    fn missing_band_is_reported() {
        let catalog = SceneCatalog::new(Platform::Sentinel2, vec![scene("a", "2021-01-01", 0.0)]);
        match catalog.check_bands() {
            Err(Error::MissingSceneBand { scene, band }) => {
                assert_eq!(scene, "a");
                assert_eq!(band, "QA60");
            }
            other => panic!("expected MissingSceneBand, got {other:?}"),
        }
    }
}
