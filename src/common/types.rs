//! Common types used throughout tangent_bug

use std::f64::consts::PI;
use std::ops::{Add, Mul, Neg, Sub};

use nalgebra::{Point2, Vector2};
use serde::{Deserialize, Serialize};

use crate::common::error::{NavigationError, NavigationResult};

/// Segments and vectors shorter than this are treated as degenerate
pub const SPACING_EPSILON: f64 = 1e-6;

/// 2D vector / point on the operating plane
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn origin() -> Self {
        Self { x: 0.0, y: 0.0 }
    }

    pub fn from_polar(length: f64, angle: f64) -> Self {
        Self::new(length * angle.cos(), length * angle.sin())
    }

    pub fn length(&self) -> f64 {
        self.x.hypot(self.y)
    }

    pub fn distance(&self, other: &Vec2) -> f64 {
        (*self - *other).length()
    }

    pub fn dot(&self, other: &Vec2) -> f64 {
        self.x * other.x + self.y * other.y
    }

    pub fn cross(&self, other: &Vec2) -> f64 {
        self.x * other.y - self.y * other.x
    }

    /// Rotate counter-clockwise by `angle` radians
    pub fn rotate(&self, angle: f64) -> Vec2 {
        let (s, c) = angle.sin_cos();
        Vec2::new(c * self.x - s * self.y, s * self.x + c * self.y)
    }

    /// Unit vector with the same direction.
    ///
    /// Fails on a zero-length vector instead of producing NaNs.
    pub fn normalize(&self) -> NavigationResult<Vec2> {
        let len = self.length();
        if len < f64::EPSILON {
            return Err(NavigationError::DegenerateGeometry(format!(
                "cannot normalize zero-length vector ({}, {})",
                self.x, self.y
            )));
        }
        Ok(*self * (1.0 / len))
    }

    /// Same direction, given length
    pub fn with_length(&self, length: f64) -> NavigationResult<Vec2> {
        Ok(self.normalize()? * length)
    }

    /// Signed angle from `self` to `other`, in (-pi, pi]
    pub fn angle_to(&self, other: &Vec2) -> f64 {
        let angle = self.cross(other).atan2(self.dot(other));
        if angle <= -PI {
            PI
        } else {
            angle
        }
    }

    /// Heading of the vector in world terms, in (-pi, pi]
    pub fn heading(&self) -> f64 {
        Vec2::new(1.0, 0.0).angle_to(self)
    }

    /// Counter-clockwise perpendicular
    pub fn perpendicular(&self) -> Vec2 {
        Vec2::new(-self.y, self.x)
    }

    /// Integer grid cell containing this point
    pub fn to_cell(&self, grid_size: f64) -> GridCell {
        GridCell::new(
            (self.x / grid_size).round() as i64,
            (self.y / grid_size).round() as i64,
        )
    }

    pub fn to_vector(&self) -> Vector2<f64> {
        Vector2::new(self.x, self.y)
    }

    pub fn to_point(&self) -> Point2<f64> {
        Point2::new(self.x, self.y)
    }
}

impl Add for Vec2 {
    type Output = Vec2;

    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vec2 {
    type Output = Vec2;

    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Vec2 {
    type Output = Vec2;

    fn mul(self, rhs: f64) -> Vec2 {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}

impl Neg for Vec2 {
    type Output = Vec2;

    fn neg(self) -> Vec2 {
        Vec2::new(-self.x, -self.y)
    }
}

impl From<(f64, f64)> for Vec2 {
    fn from(tuple: (f64, f64)) -> Self {
        Self { x: tuple.0, y: tuple.1 }
    }
}

impl From<Vector2<f64>> for Vec2 {
    fn from(v: Vector2<f64>) -> Self {
        Self { x: v[0], y: v[1] }
    }
}

impl From<Point2<f64>> for Vec2 {
    fn from(p: Point2<f64>) -> Self {
        Self { x: p.x, y: p.y }
    }
}

/// Rounded integer cell, the key of the obstacle memory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GridCell {
    pub x: i64,
    pub y: i64,
}

impl GridCell {
    pub fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    /// World position of the cell center
    pub fn center(&self, grid_size: f64) -> Vec2 {
        Vec2::new(self.x as f64 * grid_size, self.y as f64 * grid_size)
    }
}

/// 3D point representation, as returned by range sensors
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point3D {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3D {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn planar(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }
}

/// 2D pose (position + heading)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose2D {
    pub position: Vec2,
    pub yaw: f64,
}

impl Pose2D {
    pub fn new(x: f64, y: f64, yaw: f64) -> Self {
        Self { position: Vec2::new(x, y), yaw }
    }

    pub fn origin() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }
}

/// True when a circle of `radius` around `point` touches the segment
/// `seg_start`-`seg_end`.
///
/// Only the part of the line covered by the segment's projection counts:
/// points beside the segment's ends never overlap. A segment shorter than
/// [`SPACING_EPSILON`] is treated as a single point.
pub fn check_overlap_circle(seg_start: Vec2, seg_end: Vec2, point: Vec2, radius: f64) -> bool {
    let seg = seg_end - seg_start;
    let len_sq = seg.dot(&seg);
    if len_sq < SPACING_EPSILON * SPACING_EPSILON {
        return point.distance(&seg_start) <= radius;
    }
    let t = (point - seg_start).dot(&seg) / len_sq;
    if !(0.0..=1.0).contains(&t) {
        return false;
    }
    let distance = (point - seg_start).cross(&seg).abs() / len_sq.sqrt();
    distance <= radius
}
