//! tangent_bug - reactive obstacle avoidance for drones
//!
//! A tangent bug planner that steers a vehicle toward a goal on a horizontal
//! plane using a range sensor and a short-lived obstacle memory.

// Core modules
pub mod common;
pub mod utils;

// Algorithm modules
pub mod mapping;
pub mod aerial_navigation;

// Re-export common types for convenience
pub use common::{GridCell, Point3D, Pose2D, Vec2};
pub use common::VehicleClient;
pub use common::{NavigationError, NavigationResult};
