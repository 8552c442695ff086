//! Values exchanged between the planning modes and the driver loop

use std::fmt;

use crate::common::Vec2;

/// Planner mode, exactly one is active at a time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlannerMode {
    MotionToGoal,
    BoundaryFollowing,
}

impl fmt::Display for PlannerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlannerMode::MotionToGoal => write!(f, "motion-to-goal"),
            PlannerMode::BoundaryFollowing => write!(f, "boundary-following"),
        }
    }
}

/// Velocity-bounded flight toward a world-frame point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlightCommand {
    pub target: Vec2,
    pub velocity: f64,
}

impl FlightCommand {
    pub fn new(target: Vec2, velocity: f64) -> Self {
        Self { target, velocity }
    }
}

/// Result of advancing a planning mode by one control cycle
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    /// Stay in the current mode and fly
    Fly(FlightCommand),
    /// Path is blocked and no longer improving.
    ///
    /// `cluster` is the blocking obstacle, `hint` the preferred direction of
    /// travel around it; both in world frame.
    SwitchToBoundaryFollowing { cluster: Vec<Vec2>, hint: Option<Vec2> },
    /// The followed boundary no longer obstructs the goal
    SwitchToMotionToGoal,
}
