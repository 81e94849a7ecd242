// src/collection/mod.rs
pub mod catalog;
pub mod platform;

pub use catalog::{SceneCatalog, SceneEntry};
pub use platform::{Platform, INDEX_BANDS};
