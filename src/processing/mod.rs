// src/processing/mod.rs
pub mod clip;
pub mod indices;
pub mod mask;
pub mod parallel;
pub mod reduce;

// Re-export main components
pub use parallel::{add_index, IndexCalculator, ParallelProcessor};
pub use reduce::Reducer;
