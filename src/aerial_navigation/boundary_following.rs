//! Boundary-following mode
//!
//! Circles the obstacle cluster that stopped motion-to-goal, keeping a fixed
//! standoff from its closest point. The cluster and the direction of travel
//! are kept in world frame so they survive the drone's own motion.

use std::f64::consts::FRAC_PI_2;

use log::{debug, info};

use crate::common::{NavigationResult, Vec2};

use super::command::{FlightCommand, StepOutcome};
use super::connectivity::{find_connected_points, nearest_point};
use super::frame::PlannerContext;

/// Persistent state of the boundary-following process
#[derive(Debug, Clone)]
pub struct BoundaryFollowing {
    cluster: Vec<Vec2>,
    hint: Option<Vec2>,
    min_followed_distance: f64,
}

impl BoundaryFollowing {
    /// Follow `cluster` (world frame), circling in the direction of `hint`
    /// (world frame) when given
    pub fn new(cluster: Vec<Vec2>, hint: Option<Vec2>) -> Self {
        Self {
            cluster,
            hint,
            min_followed_distance: f64::INFINITY,
        }
    }

    /// Followed cluster in world frame
    pub fn cluster(&self) -> &[Vec2] {
        &self.cluster
    }

    /// Current direction of travel in world frame
    pub fn hint(&self) -> Option<Vec2> {
        self.hint
    }

    /// Smallest followed-point-to-goal distance seen since this process started
    pub fn min_followed_distance(&self) -> f64 {
        self.min_followed_distance
    }

    /// Advance by one control cycle
    pub fn step(&mut self, ctx: &PlannerContext, nearby: &[Vec2]) -> StepOutcome {
        let config = &ctx.config;
        let goal = ctx.goal();
        let reachable_distance = goal.length();

        let seeds: Vec<Vec2> = self.cluster.iter().map(|p| ctx.to_body(*p)).collect();
        let cluster = find_connected_points(&seeds, nearby, config.collision_radius);
        self.cluster = cluster.iter().map(|p| ctx.to_world(*p)).collect();

        let followed = match nearest_point(&cluster) {
            Some(p) => p,
            None => {
                info!("followed obstacle left sensor range");
                return StepOutcome::SwitchToMotionToGoal;
            }
        };

        self.min_followed_distance = self.min_followed_distance.min(followed.distance(&goal));
        if self.min_followed_distance > reachable_distance {
            info!(
                "goal reachable ({:.2} < {:.2}), leaving boundary",
                reachable_distance, self.min_followed_distance
            );
            return StepOutcome::SwitchToMotionToGoal;
        }

        let direction = match self.steer(ctx, followed) {
            Ok(direction) => direction,
            Err(e) => {
                debug!("holding position: {}", e);
                Vec2::origin()
            }
        };
        StepOutcome::Fly(FlightCommand::new(
            ctx.to_world(direction),
            config.cruise_velocity / 2.0,
        ))
    }

    /// Body-frame waypoint along the boundary around `followed`
    fn steer(&mut self, ctx: &PlannerContext, followed: Vec2) -> NavigationResult<Vec2> {
        let config = &ctx.config;
        let frame = ctx.frame();

        let mut tangent = followed.perpendicular().normalize()?;
        let keep = match self.hint {
            Some(hint) => tangent.angle_to(&frame.direction_to_body(hint)).abs() <= FRAC_PI_2,
            None => {
                let goal = ctx.goal();
                tangent.angle_to(&goal).abs() <= (-tangent).angle_to(&goal).abs()
            }
        };
        if !keep {
            tangent = -tangent;
        }
        self.hint = Some(frame.direction_to_world(tangent));

        let standoff_error = followed.length() - config.boundary_distance;
        let correction = followed.normalize()? * standoff_error;
        let blended = if standoff_error.abs() > config.collision_radius {
            correction
        } else {
            tangent + correction
        };

        blended
            .with_length(config.boundary_distance)
            .or_else(|_| correction.with_length(config.boundary_distance))
    }
}
