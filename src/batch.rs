// src/batch.rs
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::config::{ExportConfig, PipelineConfig};
use crate::pipeline::{self, PipelineReport};
use crate::processing::ParallelProcessor;

#[derive(Deserialize, Serialize, Debug)]
pub struct BatchConfig {
    /// Export settings shared by every job; job values win
    #[serde(default)]
    pub global: ExportConfig,
    pub jobs: Vec<PipelineConfig>,
}

impl BatchConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read batch config {}", path.display()))?;
        let mut config: BatchConfig = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse batch config {}", path.display()))?;

        let base = path.parent().unwrap_or_else(|| Path::new("."));
        if let Some(dir) = config.global.output_dir.as_mut() {
            if dir.is_relative() {
                *dir = base.join(&*dir);
            }
        }
        for job in &mut config.jobs {
            job.resolve_paths(base);
            job.export = std::mem::take(&mut job.export).or(&config.global);
        }
        Ok(config)
    }
}

pub fn process_batch(config_path: &PathBuf, processor: &ParallelProcessor) -> Result<Vec<PipelineReport>> {
    let config = BatchConfig::load(config_path)?;

    log::info!("Starting batch processing with {} jobs...", config.jobs.len());

    let mut reports = Vec::with_capacity(config.jobs.len());
    for (i, job) in config.jobs.iter().enumerate() {
        log::info!(
            "[{}/{}] {} {} -> {}",
            i + 1,
            config.jobs.len(),
            job.platform,
            job.start_date,
            job.end_date
        );
        let report = pipeline::run(job, processor)
            .with_context(|| format!("batch job {} ({}) failed", i + 1, job.platform))?;
        reports.push(report);
    }

    log::info!("Batch processing complete!");
    Ok(reports)
}
