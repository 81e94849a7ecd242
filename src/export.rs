// src/export.rs
//! Export task descriptors and the worker queue that runs them.

use std::fs;
use std::panic;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use flume::{Receiver, Sender};
use parking_lot::Mutex;

use crate::aoi::Aoi;
use crate::error::{Error, Result};
use crate::image::{cell_count, GeoInfo, Image};
use crate::io::{resample, write_raster, WriteOptions};
use crate::spatial;

pub const DEFAULT_SCALE: f64 = 10.0;
pub const DEFAULT_FOLDER: &str = "AGRON665X";
pub const DEFAULT_CRS: &str = "EPSG:4326";
pub const DEFAULT_MAX_PIXELS: f64 = 1e13;

/// Task names follow the hosted platform's rules.
pub fn validate_description(description: &str) -> Result<()> {
    let valid_chars = description
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || ".,:;_-".contains(c));
    if description.is_empty() || description.len() > 100 || !valid_chars {
        return Err(Error::InvalidDescription(description.to_string()));
    }
    Ok(())
}

/// One raster export: `{image, description, scale, folder, crs, region, maxPixels}`.
#[derive(Debug, Clone)]
pub struct ExportTask {
    pub image: Arc<Image>,
    pub description: String,
    /// Nominal pixel size in metres
    pub scale: f64,
    pub folder: String,
    pub crs: String,
    pub region: Aoi,
    pub max_pixels: f64,
    /// Local root standing in for the storage target
    pub output_dir: PathBuf,
    pub write: WriteOptions,
}

impl ExportTask {
    pub fn validate(&self) -> Result<()> {
        validate_description(&self.description)?;
        if !(self.scale.is_finite() && self.scale > 0.0) {
            return Err(Error::Config(format!("scale must be positive, got {}", self.scale)));
        }
        if self.folder.is_empty() {
            return Err(Error::Config("export folder is empty".to_string()));
        }
        Ok(())
    }

    pub fn output_path(&self) -> PathBuf {
        self.output_dir
            .join(&self.folder)
            .join(format!("{}.tif", self.description))
    }

    /// Grid covering the region in the target CRS at the requested scale.
    pub fn output_grid(&self) -> Result<GeoInfo> {
        let srs = spatial::parse_srs(&self.crs)?;
        let bounds = spatial::transform_bounds(self.region.bounds(), &spatial::wgs84()?, &srs)?;
        let pixel_size = spatial::pixel_size_for_scale(self.scale, &srs);

        let cols = cell_count(bounds[2] - bounds[0], pixel_size);
        let rows = cell_count(bounds[3] - bounds[1], pixel_size);
        let pixels = cols * rows;
        if pixels > self.max_pixels {
            return Err(Error::TooManyPixels {
                pixels,
                max: self.max_pixels,
            });
        }

        Ok(GeoInfo::from_bounds(bounds, pixel_size, srs.to_wkt()?))
    }

    pub fn run(&self) -> Result<TaskState> {
        self.validate()?;
        let grid = self.output_grid()?;
        let output = resample(&self.image, &grid)?;

        let path = self.output_path();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        write_raster(&output, &path, &self.write)?;

        Ok(TaskState::Completed {
            path,
            width: grid.width,
            height: grid.height,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TaskState {
    Ready,
    Running,
    Completed {
        path: PathBuf,
        width: usize,
        height: usize,
    },
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TaskStatus {
    pub id: usize,
    pub description: String,
    pub state: TaskState,
}

impl TaskStatus {
    pub fn is_completed(&self) -> bool {
        matches!(self.state, TaskState::Completed { .. })
    }
}

struct ExportRequest {
    id: usize,
    task: ExportTask,
}

/// Runs export tasks on a fixed set of worker threads.
pub struct ExportQueue {
    statuses: Arc<Mutex<Vec<TaskStatus>>>,
    workers: Vec<JoinHandle<()>>,
    req_tx: Sender<ExportRequest>,
}

impl ExportQueue {
    pub fn new(workers: Option<usize>) -> Self {
        let workers = workers.unwrap_or_else(num_cpus::get).max(1);
        let statuses = Arc::new(Mutex::new(Vec::new()));
        let (req_tx, req_rx) = flume::unbounded();

        let workers = (0..workers)
            .map(|_| {
                let req_rx: Receiver<ExportRequest> = req_rx.clone();
                let statuses = Arc::clone(&statuses);
                thread::spawn(move || {
                    for ExportRequest { id, task } in req_rx {
                        set_state(&statuses, id, TaskState::Running);
                        log::info!("export {} started", task.description);

                        let state = match task.run() {
                            Ok(state) => state,
                            Err(e) => {
                                log::error!("export {} failed: {}", task.description, e);
                                TaskState::Failed(e.to_string())
                            }
                        };
                        set_state(&statuses, id, state);
                    }
                })
            })
            .collect();

        Self {
            statuses,
            workers,
            req_tx,
        }
    }

    /// Queue a task and return its id.
    pub fn submit(&self, task: ExportTask) -> usize {
        let id = {
            let mut statuses = self.statuses.lock();
            let id = statuses.len();
            statuses.push(TaskStatus {
                id,
                description: task.description.clone(),
                state: TaskState::Ready,
            });
            id
        };

        if self.req_tx.send(ExportRequest { id, task }).is_err() {
            set_state(
                &self.statuses,
                id,
                TaskState::Failed("export workers are gone".to_string()),
            );
        }
        id
    }

    /// Wait for every queued task and return the final statuses.
    pub fn join(self) -> Vec<TaskStatus> {
        drop(self.req_tx);

        let mut errors = Vec::new();
        for worker in self.workers {
            if let Err(e) = worker.join() {
                errors.push(e);
            }
        }

        if !errors.is_empty() {
            panic::resume_unwind(Box::new(errors));
        }

        let statuses = self.statuses.lock().clone();
        statuses
    }
}

fn set_state(statuses: &Mutex<Vec<TaskStatus>>, id: usize, state: TaskState) {
    if let Some(status) = statuses.lock().get_mut(id) {
        status.state = state;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn description_rules() {
        assert!(validate_description("L8_mean").is_ok());
        assert!(validate_description("S2-2021.01:median;v1,a").is_ok());
        assert!(validate_description("").is_err());
        assert!(validate_description("has space").is_err());
        assert!(validate_description("slash/name").is_err());
        assert!(validate_description(&"x".repeat(101)).is_err());
    }
}
