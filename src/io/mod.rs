// src/io/mod.rs
pub mod reader;
pub mod warp;
pub mod writer;

pub use reader::{read_bands_parallel, read_scene};
pub use warp::resample;
pub use writer::{write_raster, WriteOptions};
