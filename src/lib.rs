// src/lib.rs
pub mod aoi;
pub mod batch;
pub mod cli;
pub mod collection;
pub mod config;
pub mod error;
pub mod export;
pub mod image;
pub mod io;
pub mod pipeline;
pub mod preview;
pub mod processing;
pub mod spatial;

pub use error::{Error, Result};

// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
