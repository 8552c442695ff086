//! Common traits defining the boundary between the planner and the vehicle

use crate::common::error::NavigationResult;
use crate::common::types::*;

/// Command/telemetry interface of the flying vehicle.
///
/// Every call may block on the transport. Errors are fatal to the current
/// planner run.
#[cfg_attr(test, mockall::automock)]
pub trait VehicleClient {
    /// World-frame position and heading
    fn get_pose(&mut self) -> NavigationResult<Pose2D>;

    /// Range returns in body frame, meters
    fn get_range_scan(&mut self) -> NavigationResult<Vec<Point3D>>;

    /// Fly toward a world-frame point at fixed altitude `z`, bounded by `velocity`.
    /// Fire-and-forget: returns once the command is issued.
    fn fly_to_position(&mut self, x: f64, y: f64, z: f64, velocity: f64) -> NavigationResult<()>;

    /// Whether the vehicle has collided since the last reset
    fn check_collision(&mut self) -> NavigationResult<bool>;

    /// Reset the vehicle after a collision
    fn reset(&mut self) -> NavigationResult<()>;
}
