// src/pipeline.rs
//! Scene selection, per-scene preparation, compositing, export and preview.

use std::path::PathBuf;
use std::sync::Arc;

use itertools::Itertools;

use crate::aoi::Aoi;
use crate::collection::{Platform, SceneCatalog, SceneEntry};
use crate::config::{ExportSettings, PipelineConfig, PreviewSettings};
use crate::error::{Error, Result};
use crate::export::{validate_description, ExportQueue, ExportTask, TaskStatus};
use crate::image::Image;
use crate::io::{read_scene, resample};
use crate::processing::clip::clip;
use crate::processing::indices::default_indices;
use crate::processing::mask::mask_and_scale;
use crate::processing::{ParallelProcessor, Reducer};
use crate::preview;

/// One reduced, clipped image.
#[derive(Debug, Clone)]
pub struct Composite {
    pub reducer: Reducer,
    pub image: Arc<Image>,
}

#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub scenes: Vec<String>,
    pub composites: Vec<Composite>,
    pub exports: Vec<TaskStatus>,
    pub previews: Vec<PathBuf>,
}

impl PipelineReport {
    pub fn failed_exports(&self) -> Vec<&TaskStatus> {
        self.exports.iter().filter(|s| !s.is_completed()).collect()
    }
}

/// Load the catalog and apply the date, cloud cover and bounds filters.
pub fn select_scenes(config: &PipelineConfig, aoi: &Aoi) -> Result<SceneCatalog> {
    let catalog = SceneCatalog::load(&config.catalog)?;
    if catalog.platform != config.platform {
        return Err(Error::Config(format!(
            "catalog holds {} scenes but the run asks for {}",
            catalog.platform, config.platform
        )));
    }

    let total = catalog.len();
    let selected = catalog
        .filter_date(config.start_date, config.end_date)?
        .filter_cloud_cover(config.cloud_cover())
        .filter_bounds(aoi)?
        .sorted();
    selected.check_bands()?;

    log::info!(
        "{}: {} of {} scenes between {} and {} with {} <= {}",
        config.platform.collection_id(),
        selected.len(),
        total,
        config.start_date,
        config.end_date,
        config.platform.cloud_property(),
        config.cloud_cover()
    );
    Ok(selected)
}

/// Read a scene, mask clouds, rescale and rename its bands.
pub fn prepare_scene(platform: Platform, scene: &SceneEntry) -> Result<Image> {
    let raw = read_scene(scene, &platform.required_source_bands())?;
    let masked = mask_and_scale(&platform.qa_mask(), &platform.reflectance_scale(), raw)?;
    masked.select_rename(platform.band_table())
}

/// Prepare every scene, add the indices and apply the output gain.
pub fn build_collection(
    platform: Platform,
    scenes: &SceneCatalog,
    output_gain: f32,
    processor: &ParallelProcessor,
) -> Result<Vec<Image>> {
    let prepared = processor.process(scenes.scenes.iter().collect(), |scene| {
        prepare_scene(platform, scene)
    })?;

    let mut images = processor.add_indices(prepared, &default_indices())?;
    if (output_gain - 1.0).abs() > f32::EPSILON {
        for image in &mut images {
            image.map_all(|v| v * output_gain);
        }
    }

    if let Some(first) = images.first() {
        log::info!(
            "collection of {} images, bands [{}]",
            images.len(),
            first.band_names().iter().join(", ")
        );
    }
    Ok(images)
}

/// Put every image on the grid of the first one.
pub fn align(images: Vec<Image>) -> Result<Vec<Image>> {
    let Some(reference) = images.first().map(|img| img.geo().clone()) else {
        return Ok(images);
    };
    images
        .into_iter()
        .map(|img| {
            if img.geo().same_grid(&reference) {
                Ok(img)
            } else {
                resample(&img, &reference)
            }
        })
        .collect()
}

/// Reduce `bands` with each reducer and clip the results to the AOI.
pub fn build_composites(
    images: &[Image],
    bands: &[&str],
    reducers: &[Reducer],
    aoi: &Aoi,
) -> Result<Vec<Composite>> {
    if images.is_empty() {
        return Err(Error::EmptyCollection(
            "no scenes left after filtering".to_string(),
        ));
    }
    reducers
        .iter()
        .map(|&reducer| {
            let reduced = reducer.reduce(images, bands)?;
            let clipped = clip(reduced, aoi)?;
            Ok(Composite {
                reducer,
                image: Arc::new(clipped),
            })
        })
        .collect()
}

fn export_tasks(composites: &[Composite], settings: &ExportSettings, aoi: &Aoi) -> Vec<ExportTask> {
    composites
        .iter()
        .map(|c| ExportTask {
            image: Arc::clone(&c.image),
            description: format!("{}_{}", settings.description, c.reducer),
            scale: settings.scale,
            folder: settings.folder.clone(),
            crs: settings.crs.clone(),
            region: aoi.clone(),
            max_pixels: settings.max_pixels,
            output_dir: settings.output_dir.clone(),
            write: settings.write.clone(),
        })
        .collect()
}

fn render_previews(
    composites: &[Composite],
    export: &ExportSettings,
    preview: &PreviewSettings,
) -> Result<Vec<PathBuf>> {
    let mut previews = Vec::new();
    for composite in composites {
        preview::log_summary(&composite.image);
        if preview.enabled {
            let path = export.output_dir.join(&export.folder).join(format!(
                "{}_{}_{}.png",
                export.description, composite.reducer, preview.band
            ));
            previews.push(preview::render_png(
                &composite.image,
                &preview.band,
                &preview.vis,
                &path,
            )?);
        }
    }
    Ok(previews)
}

/// Run one composite job end to end on the processor's thread pool.
pub fn run(config: &PipelineConfig, processor: &ParallelProcessor) -> Result<PipelineReport> {
    processor.install(|| run_job(config, processor))
}

fn run_job(config: &PipelineConfig, processor: &ParallelProcessor) -> Result<PipelineReport> {
    config.validate()?;
    let settings = config.export.resolve(config.platform);
    let preview_settings = config.preview.resolve(config.platform);
    for reducer in &config.reducers {
        validate_description(&format!("{}_{}", settings.description, reducer))?;
    }

    let aoi = Aoi::from_path(&config.aoi)?;
    let scenes = select_scenes(config, &aoi)?;
    if scenes.is_empty() {
        return Err(Error::EmptyCollection(format!(
            "no {} scenes match the filters",
            config.platform
        )));
    }

    let images = align(build_collection(
        config.platform,
        &scenes,
        config.output_gain(),
        processor,
    )?)?;
    let bands = config.platform.export_bands();
    let composites = build_composites(&images, &bands, &config.reducers, &aoi)?;
    drop(images);

    let queue = ExportQueue::new(settings.workers);
    for task in export_tasks(&composites, &settings, &aoi) {
        queue.submit(task);
    }

    // exports finish even when a preview fails
    let previews = render_previews(&composites, &settings, &preview_settings);
    let exports = queue.join();
    let previews = previews?;

    Ok(PipelineReport {
        scenes: scenes.scenes.into_iter().map(|s| s.id).collect(),
        composites,
        exports,
        previews,
    })
}
