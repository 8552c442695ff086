//! Kinematic drone simulator
//!
//! A point-mass drone on a plane with circular and wall obstacles and a
//! ray-casting 2D lidar. Every flight command advances the simulation by one
//! time step, so a planner issuing one command per cycle drives the clock.

use std::f64::consts::PI;

use log::{info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};

use crate::common::{
    NavigationError, NavigationResult, Point3D, Pose2D, Vec2, VehicleClient, SPACING_EPSILON,
};

use super::command::FlightCommand;

/// Circular obstacle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CircleObstacle {
    pub center: Vec2,
    pub radius: f64,
}

impl CircleObstacle {
    pub fn new(x: f64, y: f64, radius: f64) -> Self {
        Self { center: Vec2::new(x, y), radius }
    }
}

/// Obstacle shapes known to the simulator
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SimObstacle {
    Circle(CircleObstacle),
    Wall { start: Vec2, end: Vec2 },
}

impl SimObstacle {
    pub fn circle(x: f64, y: f64, radius: f64) -> Self {
        SimObstacle::Circle(CircleObstacle::new(x, y, radius))
    }

    pub fn wall(start: (f64, f64), end: (f64, f64)) -> Self {
        SimObstacle::Wall { start: start.into(), end: end.into() }
    }

    /// Distance from `point` to the obstacle surface (negative inside circles)
    pub fn distance(&self, point: Vec2) -> f64 {
        match self {
            SimObstacle::Circle(c) => point.distance(&c.center) - c.radius,
            SimObstacle::Wall { start, end } => {
                let seg = *end - *start;
                let len_sq = seg.dot(&seg);
                if len_sq < SPACING_EPSILON {
                    return point.distance(start);
                }
                let t = ((point - *start).dot(&seg) / len_sq).clamp(0.0, 1.0);
                point.distance(&(*start + seg * t))
            }
        }
    }

    /// Distance along a unit ray to the first surface hit
    pub fn ray_intersection(&self, origin: Vec2, direction: Vec2) -> Option<f64> {
        match self {
            SimObstacle::Circle(c) => {
                let f = origin - c.center;
                let b = f.dot(&direction);
                let disc = b * b - (f.dot(&f) - c.radius * c.radius);
                if disc < 0.0 {
                    return None;
                }
                let sqrt_disc = disc.sqrt();
                [-b - sqrt_disc, -b + sqrt_disc].into_iter().find(|t| *t >= 0.0)
            }
            SimObstacle::Wall { start, end } => {
                let e = *end - *start;
                let denom = direction.cross(&e);
                if denom.abs() < SPACING_EPSILON {
                    return None;
                }
                let w = *start - origin;
                let t = w.cross(&e) / denom;
                let s = w.cross(&direction) / denom;
                if t >= 0.0 && (0.0..=1.0).contains(&s) {
                    Some(t)
                } else {
                    None
                }
            }
        }
    }
}

/// Configuration for the simulator
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    /// Seconds advanced per flight command
    pub time_step: f64,
    /// Maximum lidar range [m]
    pub lidar_range: f64,
    /// Angle between lidar beams [rad]
    pub angular_resolution: f64,
    /// Standard deviation of range noise [m], 0 disables noise
    pub range_noise_std: f64,
    /// Off-plane returns added to every scan
    pub clutter_per_scan: usize,
    /// Height of off-plane returns [m]
    pub clutter_height: f64,
    /// Drone body radius used for collision detection [m]
    pub drone_radius: f64,
    /// Commands held in place before a sharp turn, 0 turns instantly
    pub settle_cycles: u32,
    /// Heading change above which the drone settles before turning [rad]
    pub settle_angle: f64,
    pub seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            time_step: 0.02,
            lidar_range: 40.0,
            angular_resolution: PI / 180.0,
            range_noise_std: 0.0,
            clutter_per_scan: 0,
            clutter_height: 5.0,
            drone_radius: 1.0,
            settle_cycles: 0,
            settle_angle: PI / 8.0,
            seed: 0,
        }
    }
}

/// Simulated drone implementing [`VehicleClient`]
pub struct SimulatedDrone {
    config: SimulationConfig,
    start: Pose2D,
    pose: Pose2D,
    altitude: f64,
    obstacles: Vec<SimObstacle>,
    collided: bool,
    settled: u32,
    rng: StdRng,
    noise: Option<Normal<f64>>,
    commands: Vec<FlightCommand>,
    trajectory: Vec<Vec2>,
}

impl SimulatedDrone {
    pub fn new(
        start: Pose2D,
        obstacles: Vec<SimObstacle>,
        config: SimulationConfig,
    ) -> NavigationResult<Self> {
        if !(config.time_step > 0.0) || !(config.angular_resolution > 0.0) {
            return Err(NavigationError::InvalidParameter(
                "simulation time_step and angular_resolution must be positive".to_string(),
            ));
        }
        let noise = if config.range_noise_std > 0.0 {
            let normal = Normal::new(0.0, config.range_noise_std)
                .map_err(|e| NavigationError::InvalidParameter(e.to_string()))?;
            Some(normal)
        } else {
            None
        };
        let rng = StdRng::seed_from_u64(config.seed);
        Ok(Self {
            config,
            start,
            pose: start,
            altitude: 0.0,
            obstacles,
            collided: false,
            settled: 0,
            rng,
            noise,
            commands: Vec::new(),
            trajectory: vec![start.position],
        })
    }

    pub fn pose(&self) -> Pose2D {
        self.pose
    }

    pub fn altitude(&self) -> f64 {
        self.altitude
    }

    pub fn collided(&self) -> bool {
        self.collided
    }

    pub fn obstacles(&self) -> &[SimObstacle] {
        &self.obstacles
    }

    /// Every flight command received, oldest first
    pub fn commands(&self) -> &[FlightCommand] {
        &self.commands
    }

    /// Positions visited, one per flight command plus the start
    pub fn trajectory(&self) -> &[Vec2] {
        &self.trajectory
    }

    /// Closest approach of the drone center to any obstacle surface
    pub fn clearance(&self, point: Vec2) -> f64 {
        self.obstacles
            .iter()
            .map(|o| o.distance(point))
            .fold(f64::INFINITY, f64::min)
    }

    fn cast_ray(&self, direction: Vec2) -> Option<f64> {
        self.obstacles
            .iter()
            .filter_map(|o| o.ray_intersection(self.pose.position, direction))
            .filter(|t| *t <= self.config.lidar_range)
            .fold(None, |best: Option<f64>, t| Some(best.map_or(t, |b| b.min(t))))
    }
}

impl VehicleClient for SimulatedDrone {
    fn get_pose(&mut self) -> NavigationResult<Pose2D> {
        Ok(self.pose)
    }

    fn get_range_scan(&mut self) -> NavigationResult<Vec<Point3D>> {
        let beams = (2.0 * PI / self.config.angular_resolution).round() as usize;
        let mut scan = Vec::with_capacity(beams + self.config.clutter_per_scan);

        for k in 0..beams {
            let body_angle = -PI + k as f64 * self.config.angular_resolution;
            let direction = Vec2::from_polar(1.0, self.pose.yaw + body_angle);
            if let Some(range) = self.cast_ray(direction) {
                let noise = match &self.noise {
                    Some(normal) => normal.sample(&mut self.rng),
                    None => 0.0,
                };
                let p = Vec2::from_polar((range + noise).max(0.0), body_angle);
                scan.push(Point3D::new(p.x, p.y, 0.0));
            }
        }

        for _ in 0..self.config.clutter_per_scan {
            let range = self.rng.gen_range(0.0..self.config.lidar_range);
            let angle = self.rng.gen_range(-PI..PI);
            let sign = if self.rng.gen_bool(0.5) { 1.0 } else { -1.0 };
            let p = Vec2::from_polar(range, angle);
            scan.push(Point3D::new(p.x, p.y, sign * self.config.clutter_height));
        }
        Ok(scan)
    }

    fn fly_to_position(&mut self, x: f64, y: f64, z: f64, velocity: f64) -> NavigationResult<()> {
        let target = Vec2::new(x, y);
        self.commands.push(FlightCommand::new(target, velocity));
        self.altitude = z;

        let offset = target - self.pose.position;
        let step = (velocity * self.config.time_step).min(offset.length());
        if let Ok(direction) = offset.normalize() {
            let turn = Vec2::from_polar(1.0, self.pose.yaw).angle_to(&direction).abs();
            if turn > self.config.settle_angle && self.settled < self.config.settle_cycles {
                // hover in place, heading unchanged
                self.settled += 1;
            } else if step > 0.0 {
                self.settled = 0;
                self.pose.position = self.pose.position + direction * step;
                self.pose.yaw = direction.heading();
            }
        }
        self.trajectory.push(self.pose.position);

        if !self.collided && self.clearance(self.pose.position) < self.config.drone_radius {
            warn!("simulated drone collided at {:?}", self.pose.position);
            self.collided = true;
        }
        Ok(())
    }

    fn check_collision(&mut self) -> NavigationResult<bool> {
        Ok(self.collided)
    }

    fn reset(&mut self) -> NavigationResult<()> {
        info!("resetting simulated drone to {:?}", self.start.position);
        self.pose = self.start;
        self.collided = false;
        self.settled = 0;
        Ok(())
    }
}
