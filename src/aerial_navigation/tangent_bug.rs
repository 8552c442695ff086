/*!
 * Tangent bug reactive planner
 *
 * Drives a vehicle toward a goal on a horizontal plane using only a range
 * sensor and a short-lived obstacle memory. Two modes alternate:
 * motion-to-goal heads for the goal or for the best obstacle edge, and
 * boundary-following circles an obstacle until the goal is closer than any
 * point seen on its boundary.
 *
 * Every cycle the driver refreshes the pose, checks the goal and collision
 * state, feeds the range scan into memory and advances the active mode once.
 */

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, info, warn};

use crate::common::{NavigationResult, Vec2, VehicleClient};

use super::boundary_following::BoundaryFollowing;
use super::command::{FlightCommand, PlannerMode, StepOutcome};
use super::config::TangentBugConfig;
use super::frame::PlannerContext;
use super::motion_to_goal::MotionToGoal;

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    GoalReached,
    Collided,
    Cancelled,
    CycleLimit,
}

/// What a single control cycle did
#[derive(Debug, Clone, PartialEq)]
pub enum CycleReport {
    Flying { mode: PlannerMode, command: FlightCommand },
    Switched { from: PlannerMode, to: PlannerMode },
    Finished(RunOutcome),
}

/// Summary of a complete run
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub outcome: RunOutcome,
    pub cycles: u64,
    pub mode_switches: usize,
    /// World-frame position at the start of every cycle
    pub trajectory: Vec<Vec2>,
}

enum ActiveMode {
    MotionToGoal(MotionToGoal),
    BoundaryFollowing(BoundaryFollowing),
}

impl ActiveMode {
    fn mode(&self) -> PlannerMode {
        match self {
            ActiveMode::MotionToGoal(_) => PlannerMode::MotionToGoal,
            ActiveMode::BoundaryFollowing(_) => PlannerMode::BoundaryFollowing,
        }
    }

    fn step(&mut self, ctx: &PlannerContext, nearby: &[Vec2]) -> StepOutcome {
        match self {
            ActiveMode::MotionToGoal(process) => process.step(ctx, nearby),
            ActiveMode::BoundaryFollowing(process) => process.step(ctx, nearby),
        }
    }
}

pub struct TangentBug<V: VehicleClient> {
    vehicle: V,
    ctx: PlannerContext,
    active: ActiveMode,
    nearby: Vec<Vec2>,
    stop: Arc<AtomicBool>,
    cycles: u64,
    mode_switches: usize,
    trajectory: Vec<Vec2>,
}

impl<V: VehicleClient> TangentBug<V> {
    pub fn new(vehicle: V, config: TangentBugConfig, goal: Vec2) -> NavigationResult<Self> {
        config.validate()?;
        Ok(Self {
            vehicle,
            ctx: PlannerContext::new(config, goal),
            active: ActiveMode::MotionToGoal(MotionToGoal::new()),
            nearby: Vec::new(),
            stop: Arc::new(AtomicBool::new(false)),
            cycles: 0,
            mode_switches: 0,
            trajectory: Vec::new(),
        })
    }

    pub fn mode(&self) -> PlannerMode {
        self.active.mode()
    }

    pub fn context(&self) -> &PlannerContext {
        &self.ctx
    }

    /// Body-frame memory points used in the last cycle
    pub fn nearby_points(&self) -> &[Vec2] {
        &self.nearby
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn vehicle(&self) -> &V {
        &self.vehicle
    }

    pub fn into_vehicle(self) -> V {
        self.vehicle
    }

    /// Flag polled once per cycle by [`TangentBug::run`]; setting it ends the run
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    /// Run one control cycle
    pub fn step(&mut self) -> NavigationResult<CycleReport> {
        self.cycles += 1;
        let pose = self.vehicle.get_pose()?;
        self.ctx.update_pose(&pose);
        self.trajectory.push(pose.position);

        if self.ctx.distance_to_goal() <= self.ctx.config.goal_epsilon {
            info!(
                "goal {:?} reached after {} cycles",
                self.ctx.goal_world(),
                self.cycles
            );
            let position = self.ctx.position();
            self.hover_at(position)?;
            return Ok(CycleReport::Finished(RunOutcome::GoalReached));
        }

        if self.vehicle.check_collision()? {
            warn!("collision at {:?}, resetting vehicle", pose.position);
            self.vehicle.reset()?;
            return Ok(CycleReport::Finished(RunOutcome::Collided));
        }

        self.sense()?;

        let from = self.active.mode();
        match self.active.step(&self.ctx, &self.nearby) {
            StepOutcome::Fly(command) => {
                debug!("{}: flying to {:?}", from, command.target);
                self.execute(&command)?;
                Ok(CycleReport::Flying { mode: from, command })
            }
            StepOutcome::SwitchToBoundaryFollowing { cluster, hint } => {
                self.active = ActiveMode::BoundaryFollowing(BoundaryFollowing::new(cluster, hint));
                Ok(self.switched(from))
            }
            StepOutcome::SwitchToMotionToGoal => {
                self.active = ActiveMode::MotionToGoal(MotionToGoal::new());
                Ok(self.switched(from))
            }
        }
    }

    /// Cycle until the goal is reached, a collision happens, the stop flag is
    /// set or the cycle limit is hit.
    ///
    /// A vehicle error ends the run after one attempt to hover.
    pub fn run(&mut self) -> NavigationResult<RunReport> {
        info!(
            "tangent bug run toward {:?} (realtime: {})",
            self.ctx.goal_world(),
            self.ctx.config.realtime
        );
        let period = Duration::from_secs_f64(self.ctx.config.time_step);
        let mut next_cycle = Instant::now();

        loop {
            if self.stop.load(Ordering::Relaxed) {
                info!("run cancelled after {} cycles", self.cycles);
                self.hold_position();
                return Ok(self.report(RunOutcome::Cancelled));
            }
            if let Some(max_cycles) = self.ctx.config.max_cycles {
                if self.cycles >= max_cycles {
                    warn!("cycle limit {} reached", max_cycles);
                    self.hold_position();
                    return Ok(self.report(RunOutcome::CycleLimit));
                }
            }

            match self.step() {
                Ok(CycleReport::Finished(outcome)) => {
                    info!("run finished: {:?}", outcome);
                    return Ok(self.report(outcome));
                }
                Ok(_) => {}
                Err(e) => {
                    warn!("vehicle failure: {}", e);
                    self.hold_position();
                    return Err(e);
                }
            }

            if self.ctx.config.realtime {
                next_cycle += period;
                let now = Instant::now();
                if next_cycle > now {
                    thread::sleep(next_cycle - now);
                } else {
                    next_cycle = now;
                }
            }
        }
    }

    fn sense(&mut self) -> NavigationResult<()> {
        let scan = self.vehicle.get_range_scan()?;
        let plane_epsilon = self.ctx.config.plane_epsilon;
        let in_plane: Vec<Vec2> = scan
            .iter()
            .filter(|p| p.z.abs() < plane_epsilon)
            .map(|p| self.ctx.to_world(p.planar()))
            .collect();
        debug!("{} of {} scan points in plane", in_plane.len(), scan.len());

        let memory = self.ctx.memory_mut();
        for p in in_plane {
            memory.add_obstacle_point(p);
        }
        let forgotten = memory.forget_old_points();
        if forgotten > 0 {
            debug!("forgot {} obstacle points", forgotten);
        }
        self.nearby = self.ctx.query_nearby();
        Ok(())
    }

    fn execute(&mut self, command: &FlightCommand) -> NavigationResult<()> {
        self.vehicle.fly_to_position(
            command.target.x,
            command.target.y,
            self.ctx.config.altitude,
            command.velocity,
        )
    }

    fn hover_at(&mut self, position: Vec2) -> NavigationResult<()> {
        let command = FlightCommand::new(position, self.ctx.config.cruise_velocity);
        self.execute(&command)
    }

    /// Best-effort hover at the freshest known position
    fn hold_position(&mut self) {
        let position = match self.vehicle.get_pose() {
            Ok(pose) => pose.position,
            Err(_) => self.ctx.position(),
        };
        if let Err(e) = self.hover_at(position) {
            warn!("hover command failed: {}", e);
        }
    }

    fn switched(&mut self, from: PlannerMode) -> CycleReport {
        let to = self.active.mode();
        self.mode_switches += 1;
        info!("switching {} -> {} at {:?}", from, to, self.ctx.position());
        CycleReport::Switched { from, to }
    }

    fn report(&self, outcome: RunOutcome) -> RunReport {
        RunReport {
            outcome,
            cycles: self.cycles,
            mode_switches: self.mode_switches,
            trajectory: self.trajectory.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aerial_navigation::simulation::{SimObstacle, SimulatedDrone, SimulationConfig};
    use crate::common::{MockVehicleClient, NavigationError, Point3D, Pose2D};

    fn offline_config() -> TangentBugConfig {
        TangentBugConfig {
            realtime: false,
            max_cycles: Some(20_000),
            ..Default::default()
        }
    }

    fn wall_scan() -> Vec<Point3D> {
        (-10..=10).map(|y| Point3D::new(20.0, y as f64, 0.0)).collect()
    }

    #[test]
    fn test_goal_at_start_hovers_without_scanning() {
        let mut vehicle = MockVehicleClient::new();
        vehicle
            .expect_get_pose()
            .returning(|| Ok(Pose2D::new(99.5, 0.0, 0.0)));
        vehicle.expect_get_range_scan().times(0);
        vehicle.expect_check_collision().times(0);
        vehicle
            .expect_fly_to_position()
            .withf(|x, y, z, v| *x == 99.5 && *y == 0.0 && *z == -50.0 && *v == 5.0)
            .times(1)
            .returning(|_, _, _, _| Ok(()));

        let mut planner =
            TangentBug::new(vehicle, offline_config(), Vec2::new(100.0, 0.0)).unwrap();
        let report = planner.run().unwrap();
        assert_eq!(report.outcome, RunOutcome::GoalReached);
        assert_eq!(report.cycles, 1);
        assert_eq!(report.trajectory, vec![Vec2::new(99.5, 0.0)]);
    }

    #[test]
    fn test_collision_resets_vehicle() {
        let mut vehicle = MockVehicleClient::new();
        vehicle.expect_get_pose().returning(|| Ok(Pose2D::origin()));
        vehicle.expect_check_collision().times(1).returning(|| Ok(true));
        vehicle.expect_reset().times(1).returning(|| Ok(()));
        vehicle.expect_get_range_scan().times(0);
        vehicle.expect_fly_to_position().times(0);

        let mut planner =
            TangentBug::new(vehicle, offline_config(), Vec2::new(100.0, 0.0)).unwrap();
        assert_eq!(planner.run().unwrap().outcome, RunOutcome::Collided);
    }

    #[test]
    fn test_vehicle_error_attempts_hover_and_propagates() {
        let mut vehicle = MockVehicleClient::new();
        vehicle
            .expect_get_pose()
            .returning(|| Ok(Pose2D::new(3.0, 4.0, 0.0)));
        vehicle.expect_check_collision().returning(|| Ok(false));
        vehicle
            .expect_get_range_scan()
            .times(1)
            .returning(|| Err(NavigationError::Vehicle("lidar offline".to_string())));
        vehicle
            .expect_fly_to_position()
            .withf(|x, y, _, _| *x == 3.0 && *y == 4.0)
            .times(1)
            .returning(|_, _, _, _| Err(NavigationError::Vehicle("link lost".to_string())));

        let mut planner =
            TangentBug::new(vehicle, offline_config(), Vec2::new(100.0, 0.0)).unwrap();
        match planner.run() {
            Err(NavigationError::Vehicle(msg)) => assert_eq!(msg, "lidar offline"),
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn test_off_plane_points_are_ignored() {
        let mut vehicle = MockVehicleClient::new();
        vehicle.expect_get_pose().returning(|| Ok(Pose2D::origin()));
        vehicle.expect_check_collision().returning(|| Ok(false));
        vehicle.expect_get_range_scan().returning(|| {
            Ok(vec![
                Point3D::new(10.0, 0.0, 0.0),
                Point3D::new(10.0, 5.0, 0.5),
                Point3D::new(20.0, 0.0, 3.0),
                Point3D::new(20.0, 5.0, -1.0),
            ])
        });
        vehicle.expect_fly_to_position().returning(|_, _, _, _| Ok(()));

        let mut planner =
            TangentBug::new(vehicle, offline_config(), Vec2::new(100.0, 0.0)).unwrap();
        planner.step().unwrap();
        let memory = planner.context().memory();
        assert!(memory.contains(Vec2::new(10.0, 0.0)));
        assert!(memory.contains(Vec2::new(10.0, 5.0)));
        assert!(!memory.contains(Vec2::new(20.0, 0.0)));
        assert!(!memory.contains(Vec2::new(20.0, 5.0)));
        assert!(planner.nearby_points().iter().all(|p| p.x < 15.0));
    }

    #[test]
    fn test_stop_handle_cancels_run() {
        let mut vehicle = MockVehicleClient::new();
        vehicle
            .expect_get_pose()
            .returning(|| Ok(Pose2D::new(5.0, 5.0, 0.0)));
        vehicle
            .expect_fly_to_position()
            .withf(|x, y, _, _| *x == 5.0 && *y == 5.0)
            .times(1)
            .returning(|_, _, _, _| Ok(()));

        let mut planner =
            TangentBug::new(vehicle, offline_config(), Vec2::new(100.0, 0.0)).unwrap();
        planner.stop_handle().store(true, Ordering::Relaxed);
        let report = planner.run().unwrap();
        assert_eq!(report.outcome, RunOutcome::Cancelled);
        assert_eq!(report.cycles, 0);
    }

    #[test]
    fn test_cycle_limit() {
        let mut vehicle = MockVehicleClient::new();
        vehicle.expect_get_pose().returning(|| Ok(Pose2D::origin()));
        vehicle.expect_check_collision().returning(|| Ok(false));
        vehicle.expect_get_range_scan().returning(|| Ok(Vec::new()));
        // three flights to the goal and the final hover
        vehicle
            .expect_fly_to_position()
            .times(4)
            .returning(|_, _, _, _| Ok(()));

        let config = TangentBugConfig { max_cycles: Some(3), ..offline_config() };
        let mut planner = TangentBug::new(vehicle, config, Vec2::new(100.0, 0.0)).unwrap();
        let report = planner.run().unwrap();
        assert_eq!(report.outcome, RunOutcome::CycleLimit);
        assert_eq!(report.cycles, 3);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = TangentBugConfig { collision_radius: -1.0, ..Default::default() };
        let result = TangentBug::new(MockVehicleClient::new(), config, Vec2::origin());
        assert!(matches!(result, Err(NavigationError::InvalidParameter(_))));
    }

    #[test]
    fn test_mode_switches_without_flying() {
        let mut vehicle = MockVehicleClient::new();
        let mut pose_calls = 0;
        vehicle.expect_get_pose().returning(move || {
            pose_calls += 1;
            if pose_calls <= 3 {
                Ok(Pose2D::origin())
            } else {
                Ok(Pose2D::new(30.0, 0.0, 0.0))
            }
        });
        vehicle.expect_check_collision().returning(|| Ok(false));
        vehicle.expect_get_range_scan().returning(|| Ok(wall_scan()));
        vehicle
            .expect_fly_to_position()
            .times(2)
            .returning(|_, _, _, _| Ok(()));

        let mut planner =
            TangentBug::new(vehicle, offline_config(), Vec2::new(100.0, 0.0)).unwrap();

        assert!(matches!(
            planner.step().unwrap(),
            CycleReport::Flying { mode: PlannerMode::MotionToGoal, .. }
        ));
        // same view, no improvement
        assert_eq!(
            planner.step().unwrap(),
            CycleReport::Switched {
                from: PlannerMode::MotionToGoal,
                to: PlannerMode::BoundaryFollowing,
            }
        );
        assert_eq!(planner.mode(), PlannerMode::BoundaryFollowing);

        match planner.step().unwrap() {
            CycleReport::Flying { mode, command } => {
                assert_eq!(mode, PlannerMode::BoundaryFollowing);
                assert_eq!(command.velocity, 2.5);
                assert!((command.target.x - 6.0).abs() < 1e-9);
                assert!(command.target.y.abs() < 1e-9);
            }
            other => panic!("unexpected report {:?}", other),
        }

        // past the wall the goal is closer than the followed boundary
        assert_eq!(
            planner.step().unwrap(),
            CycleReport::Switched {
                from: PlannerMode::BoundaryFollowing,
                to: PlannerMode::MotionToGoal,
            }
        );
        assert_eq!(planner.mode(), PlannerMode::MotionToGoal);
    }

    #[test]
    fn test_obstacle_free_flight() {
        let sim = SimulatedDrone::new(Pose2D::origin(), vec![], SimulationConfig::default())
            .unwrap();
        let goal = Vec2::new(100.0, 0.0);
        let mut planner = TangentBug::new(sim, offline_config(), goal).unwrap();
        let report = planner.run().unwrap();

        assert_eq!(report.outcome, RunOutcome::GoalReached);
        assert_eq!(report.mode_switches, 0);
        assert!(report.cycles > 900 && report.cycles < 1100);

        let sim = planner.into_vehicle();
        let (hover, flights) = sim.commands().split_last().unwrap();
        assert!(flights.iter().all(|c| *c == FlightCommand::new(goal, 5.0)));
        assert_eq!(hover.target, sim.pose().position);
        assert_eq!(sim.altitude(), -50.0);
    }

    #[test]
    fn test_single_obstacle_is_avoided() {
        let sim = SimulatedDrone::new(
            Pose2D::origin(),
            vec![SimObstacle::circle(50.0, 0.0, 0.5)],
            SimulationConfig::default(),
        )
        .unwrap();
        let mut planner = TangentBug::new(sim, offline_config(), Vec2::new(100.0, 0.0)).unwrap();
        let report = planner.run().unwrap();
        assert_eq!(report.outcome, RunOutcome::GoalReached);

        let sim = planner.into_vehicle();
        assert!(!sim.commands().iter().all(|c| c.target.y == 0.0));
        let clearance = sim
            .trajectory()
            .iter()
            .map(|p| sim.clearance(*p))
            .fold(f64::INFINITY, f64::min);
        assert!(clearance > SimulationConfig::default().drone_radius);
    }

    fn lagging_single_obstacle() -> SimulatedDrone {
        let config = SimulationConfig {
            settle_cycles: 3,
            ..Default::default()
        };
        SimulatedDrone::new(
            Pose2D::origin(),
            vec![SimObstacle::circle(50.0, 0.0, 0.5)],
            config,
        )
        .unwrap()
    }

    #[test]
    fn test_single_obstacle_follows_boundary_and_leaves() {
        let mut planner =
            TangentBug::new(lagging_single_obstacle(), offline_config(), Vec2::new(100.0, 0.0))
                .unwrap();
        let mut switches = Vec::new();
        let outcome = loop {
            assert!(planner.cycles() < 20_000);
            match planner.step().unwrap() {
                CycleReport::Switched { from, to } => switches.push((from, to)),
                CycleReport::Finished(outcome) => break outcome,
                CycleReport::Flying { .. } => {}
            }
        };

        assert_eq!(outcome, RunOutcome::GoalReached);
        assert!(switches.len() >= 2);
        assert_eq!(
            switches.first(),
            Some(&(PlannerMode::MotionToGoal, PlannerMode::BoundaryFollowing))
        );
        assert!(switches.contains(&(PlannerMode::BoundaryFollowing, PlannerMode::MotionToGoal)));
        assert_eq!(planner.mode(), PlannerMode::MotionToGoal);

        let sim = planner.vehicle();
        assert!(!sim.collided());
        let clearance = sim
            .trajectory()
            .iter()
            .map(|p| sim.clearance(*p))
            .fold(f64::INFINITY, f64::min);
        assert!(clearance > SimulationConfig::default().drone_radius);
    }

    #[test]
    fn test_run_counts_round_trip_switches() {
        let mut planner =
            TangentBug::new(lagging_single_obstacle(), offline_config(), Vec2::new(100.0, 0.0))
                .unwrap();
        let report = planner.run().unwrap();
        assert_eq!(report.outcome, RunOutcome::GoalReached);
        assert!(report.mode_switches >= 2);
    }

    #[test]
    fn test_noisy_cluttered_scan_still_reaches_goal() {
        let config = SimulationConfig {
            range_noise_std: 0.05,
            clutter_per_scan: 5,
            seed: 42,
            ..Default::default()
        };
        let sim = SimulatedDrone::new(
            Pose2D::new(0.0, 0.0, 0.0),
            vec![SimObstacle::circle(50.0, 0.0, 0.5)],
            config,
        )
        .unwrap();
        let mut planner = TangentBug::new(sim, offline_config(), Vec2::new(100.0, 0.0)).unwrap();
        let report = planner.run().unwrap();
        assert_eq!(report.outcome, RunOutcome::GoalReached);
        assert!(!planner.vehicle().collided());
    }
}
