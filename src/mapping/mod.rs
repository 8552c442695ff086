// Mapping module

pub mod obstacle_memory;

pub use obstacle_memory::{ObstacleEntry, ObstacleMemory, SegmentSampler};
