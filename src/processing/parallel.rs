// src/processing/parallel.rs
use std::num::NonZero;

use gdal::raster::Buffer;
use rayon::prelude::*;

use crate::error::{Error, Result};
use crate::image::{Band, Image};

/// Trait for spectral index calculators
pub trait IndexCalculator: Send + Sync {
    /// Calculate the index from input bands, given in `input_bands()` order
    fn calculate(&self, inputs: &[&Buffer<f32>]) -> Buffer<f32>;

    /// Names of the bands the index reads
    fn input_bands(&self) -> Vec<&str>;

    /// Return the number of required input bands
    fn required_bands(&self) -> usize {
        self.input_bands().len()
    }

    /// Return the name of the index, used as the output band name
    fn name(&self) -> &str;
}

/// Append the band computed by `calculator`, leaving existing bands untouched.
pub fn add_index<I: IndexCalculator + ?Sized>(mut image: Image, calculator: &I) -> Result<Image> {
    if image.has_band(calculator.name()) {
        return Err(Error::DuplicateBand {
            band: calculator.name().to_string(),
            image: image.id().to_string(),
        });
    }

    let result = {
        let inputs = calculator
            .input_bands()
            .into_iter()
            .map(|name| image.band(name).map(Band::buffer))
            .collect::<Result<Vec<_>>>()?;
        calculator.calculate(&inputs)
    };

    image.add_band(Band::new(calculator.name(), result))?;
    Ok(image)
}

/// Runs per-image work on a dedicated rayon pool.
pub struct ParallelProcessor {
    pool: rayon::ThreadPool,
}

impl ParallelProcessor {
    pub fn new(threads: Option<usize>) -> Result<Self> {
        let threads = threads.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(NonZero::get)
                .unwrap_or_else(|_| num_cpus::get())
        });

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads.max(1))
            .thread_name(|i| format!("sr-composite-{i}"))
            .build()
            .map_err(|e| Error::Config(format!("failed to build thread pool: {e}")))?;

        Ok(Self { pool })
    }

    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Run `f` inside the pool, so nested rayon work uses these threads too.
    pub fn install<R, F>(&self, f: F) -> R
    where
        R: Send,
        F: FnOnce() -> R + Send,
    {
        self.pool.install(f)
    }

    /// Apply every calculator in order to each image.
    pub fn add_indices(
        &self,
        images: Vec<Image>,
        calculators: &[Box<dyn IndexCalculator>],
    ) -> Result<Vec<Image>> {
        self.process(images, |image| {
            calculators
                .iter()
                .try_fold(image, |image, calc| add_index(image, calc.as_ref()))
        })
    }

    /// Map `f` over `items` in parallel, keeping input order.
    pub fn process<T, U, F>(&self, items: Vec<T>, f: F) -> Result<Vec<U>>
    where
        T: Send,
        U: Send,
        F: Fn(T) -> Result<U> + Send + Sync,
    {
        self.pool
            .install(|| items.into_par_iter().map(&f).collect::<Result<Vec<_>>>())
    }
}
