//! Decaying obstacle memory
//!
//! Range returns are stored as rounded world-frame cells with an age counted
//! in control cycles. Cells that are not re-observed for longer than the
//! memory duration are forgotten. Nearby cells are joined by interpolated
//! points so that sparse scans still yield continuous obstacle boundaries.

use std::collections::BTreeMap;
use std::ops::RangeInclusive;

use log::{debug, trace};

use crate::aerial_navigation::frame::FrameTransform;
use crate::common::{GridCell, Vec2, SPACING_EPSILON};

/// Age bookkeeping of one remembered cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObstacleEntry {
    /// Cycles since the cell was last observed
    pub age: u32,
    /// Observed during the current cycle
    pub refreshed: bool,
}

impl ObstacleEntry {
    fn fresh() -> Self {
        Self { age: 0, refreshed: true }
    }
}

/// Finite sequence of evenly spaced points strictly between two endpoints.
///
/// The parameter `t` advances by `1 / length`, so consecutive samples are one
/// unit apart. Cloning or calling [`SegmentSampler::restart`] replays the
/// sequence from the beginning.
#[derive(Debug, Clone)]
pub struct SegmentSampler {
    start: Vec2,
    end: Vec2,
    step: f64,
    index: usize,
}

impl SegmentSampler {
    /// `None` when the segment is too short to sample
    pub fn new(start: Vec2, end: Vec2) -> Option<Self> {
        let length = start.distance(&end);
        if length < SPACING_EPSILON {
            return None;
        }
        Some(Self { start, end, step: 1.0 / length, index: 0 })
    }

    pub fn restart(&mut self) {
        self.index = 0;
    }
}

impl Iterator for SegmentSampler {
    type Item = Vec2;

    fn next(&mut self) -> Option<Vec2> {
        let t = (self.index + 1) as f64 * self.step;
        if t >= 1.0 {
            return None;
        }
        self.index += 1;
        Some(self.start + (self.end - self.start) * t)
    }
}

/// Obstacle points keyed by grid cell, aged once per control cycle
#[derive(Debug, Clone)]
pub struct ObstacleMemory {
    cells: BTreeMap<GridCell, ObstacleEntry>,
    grid_size: f64,
    connect_distance: f64,
    max_age: f64,
}

impl ObstacleMemory {
    /// Create an empty memory.
    ///
    /// * `grid_size` - edge of a rounding cell [m]
    /// * `collision_radius` - points closer than twice this are joined
    /// * `max_age` - cycles a cell survives without observation
    ///   (`memory_duration / time_step`)
    pub fn new(grid_size: f64, collision_radius: f64, max_age: f64) -> Self {
        Self {
            cells: BTreeMap::new(),
            grid_size,
            connect_distance: 2.0 * collision_radius,
            max_age,
        }
    }

    pub fn clear(&mut self) {
        self.cells.clear();
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn grid_size(&self) -> f64 {
        self.grid_size
    }

    /// Whether the cell containing `point` is remembered
    pub fn contains(&self, point: Vec2) -> bool {
        self.cells.contains_key(&point.to_cell(self.grid_size))
    }

    /// Age of the cell containing `point`
    pub fn age_of(&self, point: Vec2) -> Option<u32> {
        self.cells.get(&point.to_cell(self.grid_size)).map(|e| e.age)
    }

    /// All remembered points in world frame, in key order
    pub fn points(&self) -> Vec<Vec2> {
        self.cells.keys().map(|c| c.center(self.grid_size)).collect()
    }

    /// Remember an observed world-frame point and densify its surroundings
    pub fn add_obstacle_point(&mut self, point: Vec2) {
        let cell = point.to_cell(self.grid_size);
        let center = cell.center(self.grid_size);

        let neighbours: Vec<Vec2> = self
            .cells_around(center, self.connect_distance)
            .filter(|&(other, _)| other != cell)
            .map(|(other, _)| other.center(self.grid_size))
            .filter(|p| p.distance(&center) <= self.connect_distance)
            .collect();

        self.cells.insert(cell, ObstacleEntry::fresh());

        for end in neighbours {
            let sampler = match SegmentSampler::new(center, end) {
                Some(sampler) => sampler,
                None => {
                    trace!("skipping degenerate segment at {:?}", center);
                    continue;
                }
            };
            // samples landing on a remembered cell leave its age alone
            for sample in sampler.map(|p| p.to_cell(self.grid_size)) {
                self.cells.entry(sample).or_insert_with(ObstacleEntry::fresh);
            }
        }
    }

    /// Age every cell not observed this cycle and evict stale ones.
    ///
    /// Returns the number of evicted cells.
    pub fn forget_old_points(&mut self) -> usize {
        let before = self.cells.len();
        let max_age = self.max_age;
        self.cells.retain(|_, entry| {
            if entry.refreshed {
                entry.refreshed = false;
            } else {
                entry.age += 1;
            }
            entry.age as f64 <= max_age
        });
        let evicted = before - self.cells.len();
        if evicted > 0 {
            debug!("forgot {} obstacle cells, {} remain", evicted, self.cells.len());
        }
        evicted
    }

    /// Remembered points within `range` of the frame origin, in body frame
    pub fn query_nearby(&self, frame: &FrameTransform, range: f64) -> Vec<Vec2> {
        let position = frame.position();
        self.cells_around(position, range)
            .map(|(cell, _)| cell.center(self.grid_size))
            .filter(|p| p.distance(&position) <= range)
            .map(|p| frame.to_body(p))
            .collect()
    }

    fn cells_around(
        &self,
        center: Vec2,
        range: f64,
    ) -> impl Iterator<Item = (GridCell, &ObstacleEntry)> + '_ {
        let (xs, ys) = self.cell_bounds(center, range);
        self.cells
            .range(GridCell::new(*xs.start(), i64::MIN)..=GridCell::new(*xs.end(), i64::MAX))
            .filter(move |(cell, _)| ys.contains(&cell.y))
            .map(|(cell, entry)| (*cell, entry))
    }

    fn cell_bounds(&self, center: Vec2, range: f64) -> (RangeInclusive<i64>, RangeInclusive<i64>) {
        let lo = (center - Vec2::new(range, range)).to_cell(self.grid_size);
        let hi = (center + Vec2::new(range, range)).to_cell(self.grid_size);
        (lo.x - 1..=hi.x + 1, lo.y - 1..=hi.y + 1)
    }
}
