//! Reactive navigation for aerial vehicles

pub mod boundary_following;
pub mod command;
pub mod config;
pub mod connectivity;
pub mod frame;
pub mod motion_to_goal;
pub mod simulation;
pub mod tangent_bug;

pub use boundary_following::BoundaryFollowing;
pub use command::{FlightCommand, PlannerMode, StepOutcome};
pub use config::TangentBugConfig;
pub use frame::{FrameTransform, PlannerContext};
pub use motion_to_goal::MotionToGoal;
pub use simulation::{CircleObstacle, SimObstacle, SimulatedDrone, SimulationConfig};
pub use tangent_bug::{CycleReport, RunOutcome, RunReport, TangentBug};
