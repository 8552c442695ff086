//! Utility modules for tangent_bug

pub mod visualization;

pub use visualization::{colors, PathStyle, PointStyle, Visualizer};
