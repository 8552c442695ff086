//! Planner parameters

use std::f64::consts::PI;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::common::{NavigationError, NavigationResult};

/// Configuration for the tangent bug planner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TangentBugConfig {
    /// Edge of an obstacle memory cell [m]
    pub grid_size: f64,
    /// Scan returns with |z| at or above this are off-plane [m]
    pub plane_epsilon: f64,
    /// Goal is reached within this distance [m]
    pub goal_epsilon: f64,
    /// Radius of the drone's collision footprint [m]
    pub collision_radius: f64,
    /// Standoff kept from a followed obstacle [m]
    pub boundary_distance: f64,
    /// Outward rotation applied to discontinuity points [rad]
    pub avoidance_angle: f64,
    /// Memory points further than this are not considered [m]
    pub sensor_range: f64,
    /// Velocity bound of motion-to-goal commands [m/s]
    pub cruise_velocity: f64,
    /// Altitude of the operating plane [m]
    pub altitude: f64,
    /// Control period [s]
    pub time_step: f64,
    /// How long an unobserved obstacle point is remembered [s]
    pub memory_duration: f64,
    /// Stop after this many cycles
    pub max_cycles: Option<u64>,
    /// Sleep to the next cycle boundary between cycles
    pub realtime: bool,
}

impl Default for TangentBugConfig {
    fn default() -> Self {
        Self {
            grid_size: 1.0,
            plane_epsilon: 1.0,
            goal_epsilon: 1.0,
            collision_radius: 3.0,
            boundary_distance: 6.0,
            avoidance_angle: PI / 6.0,
            sensor_range: 35.0,
            cruise_velocity: 5.0,
            altitude: -50.0,
            time_step: 0.02,
            memory_duration: 5.0,
            max_cycles: None,
            realtime: true,
        }
    }
}

impl TangentBugConfig {
    pub fn from_yaml_str(yaml: &str) -> NavigationResult<Self> {
        let config: TangentBugConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> NavigationResult<Self> {
        let yaml = fs::read_to_string(path)?;
        Self::from_yaml_str(&yaml)
    }

    /// Cycles an unobserved memory point survives
    pub fn max_memory_age(&self) -> f64 {
        self.memory_duration / self.time_step
    }

    pub fn validate(&self) -> NavigationResult<()> {
        let positive = [
            ("grid_size", self.grid_size),
            ("plane_epsilon", self.plane_epsilon),
            ("goal_epsilon", self.goal_epsilon),
            ("collision_radius", self.collision_radius),
            ("boundary_distance", self.boundary_distance),
            ("sensor_range", self.sensor_range),
            ("cruise_velocity", self.cruise_velocity),
            ("time_step", self.time_step),
        ];
        for (name, value) in positive {
            if !(value > 0.0) || !value.is_finite() {
                return Err(NavigationError::InvalidParameter(format!(
                    "{} must be positive and finite, got {}",
                    name, value
                )));
            }
        }
        if !(self.memory_duration >= 0.0) {
            return Err(NavigationError::InvalidParameter(format!(
                "memory_duration must not be negative, got {}",
                self.memory_duration
            )));
        }
        if !(0.0..PI).contains(&self.avoidance_angle) {
            return Err(NavigationError::InvalidParameter(format!(
                "avoidance_angle must be in [0, pi), got {}",
                self.avoidance_angle
            )));
        }
        Ok(())
    }
}
