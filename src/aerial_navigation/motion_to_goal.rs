//! Motion-to-goal mode
//!
//! Flies straight at the goal while the path is clear. When an obstacle
//! blocks the path it heads for the obstacle edge with the smallest
//! heuristic distance, as long as that distance keeps shrinking; once it
//! stops shrinking the drone is in a local minimum and hands over to
//! boundary following.

use log::{debug, info};
use ordered_float::OrderedFloat;

use crate::common::Vec2;

use super::command::{FlightCommand, StepOutcome};
use super::connectivity::{check_obstacles_in_path, find_discontinuity_points, get_blocking_obstacle};
use super::frame::PlannerContext;

/// Persistent state of the motion-to-goal process
#[derive(Debug, Clone)]
pub struct MotionToGoal {
    min_heuristic_distance: f64,
}

impl MotionToGoal {
    pub fn new() -> Self {
        Self { min_heuristic_distance: f64::INFINITY }
    }

    /// Smallest heuristic distance seen since this process started
    pub fn min_heuristic_distance(&self) -> f64 {
        self.min_heuristic_distance
    }

    /// Advance by one control cycle
    pub fn step(&mut self, ctx: &PlannerContext, nearby: &[Vec2]) -> StepOutcome {
        let config = &ctx.config;
        let goal = ctx.goal();

        if !check_obstacles_in_path(goal, nearby, config.collision_radius) {
            return StepOutcome::Fly(FlightCommand::new(ctx.goal_world(), config.cruise_velocity));
        }

        let candidates = find_discontinuity_points(goal, nearby, config);
        let best = candidates
            .iter()
            .map(|c| (heuristic_distance(*c, goal), *c))
            .min_by_key(|(h, _)| OrderedFloat(*h));

        let (heuristic, point) = match best {
            Some(best) => best,
            None => {
                debug!("path blocked but no usable discontinuity point, heading for goal");
                return StepOutcome::Fly(FlightCommand::new(
                    ctx.goal_world(),
                    config.cruise_velocity,
                ));
            }
        };

        if heuristic >= self.min_heuristic_distance {
            info!(
                "heuristic distance stopped improving ({:.2} >= {:.2})",
                heuristic, self.min_heuristic_distance
            );
            let cluster = get_blocking_obstacle(goal, nearby, config.collision_radius)
                .into_iter()
                .map(|p| ctx.to_world(p))
                .collect();
            return StepOutcome::SwitchToBoundaryFollowing {
                cluster,
                hint: Some(ctx.frame().direction_to_world(point)),
            };
        }

        debug!("heading for discontinuity point {:?}, heuristic {:.2}", point, heuristic);
        self.min_heuristic_distance = heuristic;
        StepOutcome::Fly(FlightCommand::new(ctx.to_world(point), config.cruise_velocity))
    }
}

impl Default for MotionToGoal {
    fn default() -> Self {
        Self::new()
    }
}

/// Drone-to-candidate plus candidate-to-goal distance, body frame
pub fn heuristic_distance(candidate: Vec2, goal: Vec2) -> f64 {
    candidate.length() + candidate.distance(&goal)
}
