//! Obstacle connectivity and discontinuity points
//!
//! All functions work on body-frame points: the drone sits at the origin and
//! a path is the segment from the origin to a body-frame target. Two points
//! belong to the same obstacle when they are no further apart than twice the
//! collision radius.

use std::collections::VecDeque;

use itertools::Itertools;
use log::debug;
use ordered_float::OrderedFloat;

use crate::common::{check_overlap_circle, Vec2};

use super::config::TangentBugConfig;

/// Whether the collision circle of any point touches the straight path
pub fn check_obstacles_in_path(path: Vec2, points: &[Vec2], collision_radius: f64) -> bool {
    points
        .iter()
        .any(|p| check_overlap_circle(Vec2::origin(), path, *p, collision_radius))
}

/// The obstacle cluster blocking `path`.
///
/// Starts from the points whose collision circle touches the path and grows
/// sideways through connected points. Points on the counter-clockwise side
/// are appended, points on the clockwise side prepended, so the first and
/// last elements are the two edges of the obstacle as seen from the drone.
/// Empty when the path is clear.
pub fn get_blocking_obstacle(path: Vec2, points: &[Vec2], collision_radius: f64) -> Vec<Vec2> {
    let link = 2.0 * collision_radius;
    let by_angle = points
        .iter()
        .map(|p| (path.angle_to(p), *p))
        .sorted_by_key(|(angle, _)| OrderedFloat(*angle));

    let mut on_path = VecDeque::new();
    let mut ccw = Vec::new();
    let mut cw = Vec::new();
    for (angle, p) in by_angle {
        if check_overlap_circle(Vec2::origin(), path, p, collision_radius) {
            on_path.push_back(p);
        } else if angle > 0.0 {
            ccw.push(p);
        } else {
            cw.push(p);
        }
    }
    if on_path.is_empty() {
        return Vec::new();
    }
    // clockwise side is scanned starting next to the path
    cw.reverse();

    let mut cluster = on_path;
    loop {
        let grew_ccw = absorb_connected(&mut cluster, &mut ccw, link, VecDeque::push_back);
        let grew_cw = absorb_connected(&mut cluster, &mut cw, link, VecDeque::push_front);
        if !grew_ccw && !grew_cw {
            break;
        }
    }
    cluster.into()
}

fn absorb_connected(
    cluster: &mut VecDeque<Vec2>,
    candidates: &mut Vec<Vec2>,
    link: f64,
    insert: fn(&mut VecDeque<Vec2>, Vec2),
) -> bool {
    let before = cluster.len();
    candidates.retain(|p| {
        if cluster.iter().any(|q| q.distance(p) <= link) {
            insert(cluster, *p);
            false
        } else {
            true
        }
    });
    cluster.len() > before
}

/// Waypoints routing around the edges of the obstacle blocking the goal.
///
/// Each edge of the blocking cluster is rotated away from the obstacle by
/// `avoidance_angle` and rescaled to `boundary_distance`. Returned clockwise
/// edge first; edges at the drone's own position are skipped.
pub fn find_discontinuity_points(
    goal: Vec2,
    points: &[Vec2],
    config: &TangentBugConfig,
) -> Vec<Vec2> {
    let blocking = get_blocking_obstacle(goal, points, config.collision_radius);
    let (first, last) = match (blocking.first(), blocking.last()) {
        (Some(first), Some(last)) => (*first, *last),
        _ => return Vec::new(),
    };

    [(first, -config.avoidance_angle), (last, config.avoidance_angle)]
        .iter()
        .filter_map(|(edge, angle)| match edge.rotate(*angle).with_length(config.boundary_distance) {
            Ok(p) => Some(p),
            Err(e) => {
                debug!("skipping discontinuity point: {}", e);
                None
            }
        })
        .collect()
}

/// Nearby points connected to any of `seeds`, transitively.
///
/// The result is a subset of `points` in discovery order, closed under the
/// connectivity relation; seeding again with the result returns the same set.
pub fn find_connected_points(seeds: &[Vec2], points: &[Vec2], collision_radius: f64) -> Vec<Vec2> {
    let link = 2.0 * collision_radius;
    let mut remaining = points.to_vec();
    let mut connected = Vec::new();

    remaining.retain(|p| {
        if seeds.iter().any(|s| s.distance(p) <= link) {
            connected.push(*p);
            false
        } else {
            true
        }
    });

    loop {
        let before = connected.len();
        remaining.retain(|p| {
            if connected.iter().any(|q: &Vec2| q.distance(p) <= link) {
                connected.push(*p);
                false
            } else {
                true
            }
        });
        if connected.len() == before {
            break;
        }
    }
    connected
}

/// Point closest to the drone
pub fn nearest_point(points: &[Vec2]) -> Option<Vec2> {
    points.iter().copied().min_by_key(|p| OrderedFloat(p.length()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn wall(x: f64, ys: std::ops::RangeInclusive<i32>) -> Vec<Vec2> {
        ys.map(|y| Vec2::new(x, y as f64)).collect()
    }

    fn sorted(mut points: Vec<Vec2>) -> Vec<Vec2> {
        points.sort_by_key(|p| (OrderedFloat(p.x), OrderedFloat(p.y)));
        points
    }

    #[test]
    fn test_clear_path() {
        let points = wall(20.0, 5..=10);
        assert!(!check_obstacles_in_path(Vec2::new(40.0, 0.0), &points, 3.0));
        assert!(get_blocking_obstacle(Vec2::new(40.0, 0.0), &points, 3.0).is_empty());
    }

    #[test]
    fn test_obstacle_behind_goal_does_not_block() {
        let points = vec![Vec2::new(50.0, 0.0)];
        assert!(!check_obstacles_in_path(Vec2::new(40.0, 0.0), &points, 3.0));
    }

    #[test]
    fn test_blocking_wall_extremities() {
        let points = wall(20.0, -10..=10);
        let blocking = get_blocking_obstacle(Vec2::new(40.0, 0.0), &points, 3.0);
        assert_eq!(blocking.len(), points.len());
        assert_eq!(blocking.first(), Some(&Vec2::new(20.0, -10.0)));
        assert_eq!(blocking.last(), Some(&Vec2::new(20.0, 10.0)));
    }

    #[test]
    fn test_blocking_ignores_disconnected_points() {
        let mut points = wall(20.0, -4..=4);
        points.push(Vec2::new(20.0, 15.0));
        points.push(Vec2::new(-5.0, -30.0));
        let blocking = get_blocking_obstacle(Vec2::new(40.0, 0.0), &points, 3.0);
        assert_eq!(blocking.len(), 9);
        assert_eq!(blocking.last(), Some(&Vec2::new(20.0, 4.0)));
    }

    #[test]
    fn test_discontinuity_points_single_obstacle() {
        let config = TangentBugConfig::default();
        let points = vec![Vec2::new(50.0, 0.0)];
        let goal = Vec2::new(100.0, 0.0);
        assert!(check_obstacles_in_path(goal, &points, config.collision_radius));

        let candidates = find_discontinuity_points(goal, &points, &config);
        assert_eq!(candidates.len(), 2);
        assert!(candidates[0].y < 0.0);
        assert!(candidates[1].y > 0.0);
        for c in &candidates {
            assert!((c.length() - config.boundary_distance).abs() < 1e-9);
            assert!((c.heading().abs() - config.avoidance_angle).abs() < 1e-9);
        }
    }

    #[test]
    fn test_discontinuity_points_route_outside_wall() {
        let config = TangentBugConfig::default();
        let points = wall(20.0, -10..=10);
        let candidates = find_discontinuity_points(Vec2::new(40.0, 0.0), &points, &config);
        let edge_angle = Vec2::new(20.0, 10.0).heading();
        assert!((candidates[1].heading() - (edge_angle + config.avoidance_angle)).abs() < 1e-9);
        assert!((candidates[0].heading() + (edge_angle + config.avoidance_angle)).abs() < 1e-9);
    }

    #[test]
    fn test_degenerate_edge_is_skipped() {
        let config = TangentBugConfig::default();
        let candidates = find_discontinuity_points(Vec2::new(10.0, 0.0), &[Vec2::origin()], &config);
        assert!(candidates.is_empty());
    }

    #[test]
    fn test_connected_points_follow_chain() {
        let mut points = wall(10.0, -3..=3);
        points.extend(wall(30.0, 0..=2));
        let connected = find_connected_points(&[Vec2::new(10.0, 4.0)], &points, 1.0);
        assert_eq!(sorted(connected), wall(10.0, -3..=3));
    }

    #[test]
    fn test_connected_points_idempotent() {
        let mut points: Vec<Vec2> = (0..24)
            .map(|i| Vec2::from_polar(12.0, i as f64 * PI / 12.0) + Vec2::new(20.0, 0.0))
            .collect();
        points.extend(wall(-15.0, -2..=2));
        let once = find_connected_points(&[Vec2::new(32.0, 0.0)], &points, 2.0);
        assert_eq!(once.len(), 24);
        let twice = find_connected_points(&once, &points, 2.0);
        assert_eq!(sorted(once), sorted(twice));
    }

    #[test]
    fn test_connected_points_empty_when_out_of_range() {
        let points = wall(10.0, -3..=3);
        assert!(find_connected_points(&[Vec2::new(50.0, 50.0)], &points, 1.0).is_empty());
        assert!(find_connected_points(&[], &points, 1.0).is_empty());
    }

    #[test]
    fn test_nearest_point() {
        let points = vec![Vec2::new(5.0, 5.0), Vec2::new(-1.0, 2.0), Vec2::new(0.0, 9.0)];
        assert_eq!(nearest_point(&points), Some(Vec2::new(-1.0, 2.0)));
        assert_eq!(nearest_point(&[]), None);
    }
}
