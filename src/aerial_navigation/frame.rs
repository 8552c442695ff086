//! World / body frame bookkeeping
//!
//! The body frame has the drone at the origin facing +x. All planning happens
//! in the body frame; commands are converted back to world coordinates before
//! they reach the vehicle.

use nalgebra::{Isometry2, Vector2};

use crate::common::{Pose2D, Vec2};
use crate::mapping::obstacle_memory::ObstacleMemory;

use super::config::TangentBugConfig;

/// Rigid transform between world frame and the drone's body frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTransform {
    iso: Isometry2<f64>,
}

impl FrameTransform {
    pub fn new(position: Vec2, heading: f64) -> Self {
        Self {
            iso: Isometry2::new(Vector2::new(position.x, position.y), heading),
        }
    }

    pub fn from_pose(pose: &Pose2D) -> Self {
        Self::new(pose.position, pose.yaw)
    }

    pub fn identity() -> Self {
        Self { iso: Isometry2::identity() }
    }

    /// Drone position in world frame
    pub fn position(&self) -> Vec2 {
        self.iso.translation.vector.into()
    }

    /// Drone heading in world frame
    pub fn heading(&self) -> f64 {
        self.iso.rotation.angle()
    }

    pub fn to_body(&self, world: Vec2) -> Vec2 {
        self.iso.inverse_transform_point(&world.to_point()).into()
    }

    pub fn to_world(&self, body: Vec2) -> Vec2 {
        self.iso.transform_point(&body.to_point()).into()
    }

    /// Rotate a free vector (direction) from world into body frame
    pub fn direction_to_body(&self, world: Vec2) -> Vec2 {
        self.iso.inverse_transform_vector(&world.to_vector()).into()
    }

    /// Rotate a free vector (direction) from body into world frame
    pub fn direction_to_world(&self, body: Vec2) -> Vec2 {
        self.iso.transform_vector(&body.to_vector()).into()
    }
}

impl Default for FrameTransform {
    fn default() -> Self {
        Self::identity()
    }
}

/// All mutable planner state owned by the driver loop.
///
/// Planning modes only ever see a shared reference to it.
#[derive(Debug, Clone)]
pub struct PlannerContext {
    pub config: TangentBugConfig,
    frame: FrameTransform,
    goal_world: Vec2,
    goal_body: Vec2,
    memory: ObstacleMemory,
}

impl PlannerContext {
    pub fn new(config: TangentBugConfig, goal_world: Vec2) -> Self {
        let memory = ObstacleMemory::new(
            config.grid_size,
            config.collision_radius,
            config.max_memory_age(),
        );
        Self {
            config,
            frame: FrameTransform::identity(),
            goal_world,
            goal_body: goal_world,
            memory,
        }
    }

    pub fn frame(&self) -> &FrameTransform {
        &self.frame
    }

    pub fn position(&self) -> Vec2 {
        self.frame.position()
    }

    pub fn heading(&self) -> f64 {
        self.frame.heading()
    }

    /// Goal relative to the drone, body frame
    pub fn goal(&self) -> Vec2 {
        self.goal_body
    }

    pub fn goal_world(&self) -> Vec2 {
        self.goal_world
    }

    pub fn distance_to_goal(&self) -> f64 {
        self.goal_body.length()
    }

    pub fn memory(&self) -> &ObstacleMemory {
        &self.memory
    }

    pub fn memory_mut(&mut self) -> &mut ObstacleMemory {
        &mut self.memory
    }

    /// Move the body frame; the body-frame goal follows
    pub fn update_pose(&mut self, pose: &Pose2D) {
        self.frame = FrameTransform::from_pose(pose);
        self.goal_body = self.frame.to_body(self.goal_world);
    }

    pub fn to_body(&self, world: Vec2) -> Vec2 {
        self.frame.to_body(world)
    }

    pub fn to_world(&self, body: Vec2) -> Vec2 {
        self.frame.to_world(body)
    }

    /// Memory points within sensor range, body frame
    pub fn query_nearby(&self) -> Vec<Vec2> {
        self.memory.query_nearby(&self.frame, self.config.sensor_range)
    }
}
