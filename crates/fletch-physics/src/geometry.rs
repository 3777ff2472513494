//! Geometry primitives for collision detection.
//!
//! Axis-aligned boxes and circles, discrete overlap tests, minimum
//! translation vectors, and a swept box-vs-box test that reports the time of
//! impact within one frame of motion.
//!
//! Overlap tests use strict inequalities everywhere: shapes that only share an
//! edge do not overlap.

use fletch_common::Vec2;
use serde::{Deserialize, Serialize};

/// Axis-aligned box stored as center and half extents.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// Center of the box
    pub center: Vec2,
    /// Half width and half height
    pub half: Vec2,
}

impl Rect {
    /// Creates a box from its center and half extents.
    #[must_use]
    pub const fn new(center: Vec2, half: Vec2) -> Self {
        Self { center, half }
    }

    /// Creates a box from its bottom-left corner and full size.
    #[must_use]
    pub fn from_corner(min: Vec2, size: Vec2) -> Self {
        let half = size * 0.5;
        Self {
            center: min + half,
            half,
        }
    }

    /// Bottom-left corner.
    #[must_use]
    pub fn min(&self) -> Vec2 {
        self.center - self.half
    }

    /// Top-right corner.
    #[must_use]
    pub fn max(&self) -> Vec2 {
        self.center + self.half
    }

    /// Full width.
    #[must_use]
    pub fn width(&self) -> f32 {
        self.half.x * 2.0
    }

    /// Full height.
    #[must_use]
    pub fn height(&self) -> f32 {
        self.half.y * 2.0
    }

    /// Returns the box moved by `offset`.
    #[must_use]
    pub fn translated(&self, offset: Vec2) -> Self {
        Self {
            center: self.center + offset,
            half: self.half,
        }
    }

    /// Returns the box grown by `half` on every side (Minkowski sum with a
    /// box of those half extents).
    #[must_use]
    pub fn expanded_by(&self, half: Vec2) -> Self {
        Self {
            center: self.center,
            half: self.half + half,
        }
    }

    /// Checks if a point lies strictly inside the box.
    #[must_use]
    pub fn contains_point(&self, point: Vec2) -> bool {
        point_in_rect(point, self)
    }

    /// Checks if this box overlaps another.
    #[must_use]
    pub fn overlaps(&self, other: &Rect) -> bool {
        rect_overlap(self, other)
    }
}

/// Circle stored as center and radius.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    /// Center of the circle
    pub center: Vec2,
    /// Radius
    pub radius: f32,
}

impl Circle {
    /// Creates a circle.
    #[must_use]
    pub const fn new(center: Vec2, radius: f32) -> Self {
        Self { center, radius }
    }

    /// Bounding box of the circle.
    #[must_use]
    pub fn bounds(&self) -> Rect {
        Rect::new(self.center, Vec2::splat(self.radius))
    }
}

/// Result of a swept test.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hit {
    /// Fraction of the motion at which contact first occurs, in `[0, 1]`
    pub time: f32,
    /// Unit normal of the face that was hit
    pub normal: Vec2,
    /// Displacement that brings the collider to the contact point
    pub delta: Vec2,
}

/// Checks if two boxes overlap. Edge-touching boxes do not.
#[must_use]
pub fn rect_overlap(a: &Rect, b: &Rect) -> bool {
    let (a_min, a_max) = (a.min(), a.max());
    let (b_min, b_max) = (b.min(), b.max());
    a_min.x < b_max.x && a_max.x > b_min.x && a_min.y < b_max.y && a_max.y > b_min.y
}

/// Checks if a point lies strictly inside a box.
#[must_use]
pub fn point_in_rect(point: Vec2, rect: &Rect) -> bool {
    let (min, max) = (rect.min(), rect.max());
    point.x > min.x && point.x < max.x && point.y > min.y && point.y < max.y
}

/// Contact skin for swept tests, in world units.
///
/// Float error can leave a collider that was stopped on a face a few ulps
/// inside it. Penetration up to this depth still counts as resting on the
/// face rather than overlapping it.
pub const CONTACT_EPSILON: f32 = 1e-3;

/// Entry and exit times of a ray against one slab of a box.
///
/// With no motion on the axis the origin must already be inside the slab by
/// more than [`CONTACT_EPSILON`], otherwise the ray can never enter it.
fn slab(origin: f32, motion: f32, min: f32, max: f32) -> Option<(f32, f32)> {
    if motion == 0.0 {
        if origin > min + CONTACT_EPSILON && origin < max - CONTACT_EPSILON {
            Some((f32::NEG_INFINITY, f32::INFINITY))
        } else {
            None
        }
    } else {
        let t1 = (min - origin) / motion;
        let t2 = (max - origin) / motion;
        Some((t1.min(t2), t1.max(t2)))
    }
}

/// Sweeps `collider` along `delta` against a static `obstacle`.
///
/// The obstacle is expanded by the collider's half extents and the collider's
/// center is cast as a ray against the result. Returns the earliest entry
/// time in `[0, 1]` and the normal of the entered face, or `None` when the
/// boxes are already overlapping, moving apart, or do not meet this frame.
///
/// A collider sitting within [`CONTACT_EPSILON`] past the entered face and
/// moving into it hits at time zero. On an exact corner the X face wins.
#[must_use]
pub fn sweep_rect_rect(collider: &Rect, obstacle: &Rect, delta: Vec2) -> Option<Hit> {
    let expanded = obstacle.expanded_by(collider.half);
    let (min, max) = (expanded.min(), expanded.max());
    let origin = collider.center;

    let (x_entry, x_exit) = slab(origin.x, delta.x, min.x, max.x)?;
    let (y_entry, y_exit) = slab(origin.y, delta.y, min.y, max.y)?;

    let (mut entry, speed, normal) = if x_entry >= y_entry {
        (x_entry, delta.x.abs(), Vec2::new(-delta.x.signum(), 0.0))
    } else {
        (y_entry, delta.y.abs(), Vec2::new(0.0, -delta.y.signum()))
    };
    let exit = x_exit.min(y_exit);

    if entry < 0.0 && -entry * speed <= CONTACT_EPSILON {
        entry = 0.0;
    }
    if entry >= exit || !(0.0..=1.0).contains(&entry) {
        return None;
    }

    Some(Hit {
        time: entry,
        normal,
        delta: delta * entry,
    })
}

/// Offset that puts `collider` exactly on the face of `obstacle` named by
/// `normal`.
///
/// Applied after moving to a hit, so the leading face lands on the obstacle
/// face instead of wherever `start + motion * time` rounded to.
#[must_use]
pub fn contact_offset(collider: &Rect, obstacle: &Rect, normal: Vec2) -> Vec2 {
    let (c_min, c_max) = (collider.min(), collider.max());
    let (o_min, o_max) = (obstacle.min(), obstacle.max());

    let x = if normal.x < 0.0 {
        o_min.x - c_max.x
    } else if normal.x > 0.0 {
        o_max.x - c_min.x
    } else {
        0.0
    };
    let y = if normal.y < 0.0 {
        o_min.y - c_max.y
    } else if normal.y > 0.0 {
        o_max.y - c_min.y
    } else {
        0.0
    };
    Vec2::new(x, y)
}

/// Velocity left over after a swept hit.
///
/// The component along the surface survives, scaled by the unused part of
/// the frame; the component into the surface is dropped.
#[must_use]
pub fn slide_velocity(velocity: Vec2, hit: &Hit) -> Vec2 {
    let remaining = 1.0 - hit.time;
    Vec2::new(
        velocity.x * hit.normal.y.abs() * remaining,
        velocity.y * hit.normal.x.abs() * remaining,
    )
}

/// Closest point of a box to `point`.
fn closest_point(rect: &Rect, point: Vec2) -> Vec2 {
    point.clamp(rect.min(), rect.max())
}

/// Checks if a circle overlaps a box.
#[must_use]
pub fn circle_rect_check(circle: &Circle, rect: &Rect) -> bool {
    let closest = closest_point(rect, circle.center);
    circle.center.distance_squared(closest) < circle.radius * circle.radius
}

/// Checks if two circles overlap.
#[must_use]
pub fn circle_circle_check(a: &Circle, b: &Circle) -> bool {
    let reach = a.radius + b.radius;
    a.center.distance_squared(b.center) < reach * reach
}

/// Displacement that pushes `circle` out of `rect`.
///
/// Zero when they do not overlap.
#[must_use]
pub fn circle_rect_solve(circle: &Circle, rect: &Rect) -> Vec2 {
    if !circle_rect_check(circle, rect) {
        return Vec2::ZERO;
    }

    let closest = closest_point(rect, circle.center);
    let offset = circle.center - closest;
    let distance = offset.length();

    if distance > 0.0 {
        return offset / distance * (circle.radius - distance);
    }

    // Center inside the box: leave through the nearest face.
    let (min, max) = (rect.min(), rect.max());
    let faces = [
        (circle.center.x - min.x, Vec2::NEG_X),
        (max.x - circle.center.x, Vec2::X),
        (circle.center.y - min.y, Vec2::NEG_Y),
        (max.y - circle.center.y, Vec2::Y),
    ];
    let mut best = faces[0];
    for face in &faces[1..] {
        if face.0 < best.0 {
            best = *face;
        }
    }
    best.1 * (best.0 + circle.radius)
}

/// Displacement that pushes circle `a` out of circle `b`.
///
/// Zero when they do not overlap. Coincident centers separate along `+x`.
#[must_use]
pub fn circle_circle_solve(a: &Circle, b: &Circle) -> Vec2 {
    if !circle_circle_check(a, b) {
        return Vec2::ZERO;
    }

    let offset = a.center - b.center;
    let distance = offset.length();
    let direction = if distance > 0.0 {
        offset / distance
    } else {
        Vec2::X
    };
    direction * (a.radius + b.radius - distance)
}

/// Displacement that pushes box `a` out of box `b` along the axis of least
/// penetration.
///
/// Zero when they do not overlap.
#[must_use]
pub fn rect_rect_solve(a: &Rect, b: &Rect) -> Vec2 {
    let offset = a.center - b.center;
    let overlap = a.half + b.half - offset.abs();

    if overlap.x <= 0.0 || overlap.y <= 0.0 {
        return Vec2::ZERO;
    }

    if overlap.x < overlap.y {
        Vec2::new(offset.x.signum() * overlap.x, 0.0)
    } else {
        Vec2::new(0.0, offset.y.signum() * overlap.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(x: f32, y: f32, size: f32) -> Rect {
        Rect::from_corner(Vec2::new(x, y), Vec2::splat(size))
    }

    #[test]
    fn test_rect_from_corner() {
        let rect = square(8.0, 0.0, 4.0);
        assert_eq!(rect.center, Vec2::new(10.0, 2.0));
        assert_eq!(rect.min(), Vec2::new(8.0, 0.0));
        assert_eq!(rect.max(), Vec2::new(12.0, 4.0));
        assert_eq!(rect.width(), 4.0);
        assert_eq!(rect.height(), 4.0);
    }

    #[test]
    fn test_rect_overlap() {
        let a = square(0.0, 0.0, 10.0);
        let b = square(5.0, 5.0, 10.0);
        let c = square(20.0, 20.0, 10.0);

        assert!(rect_overlap(&a, &b));
        assert!(rect_overlap(&b, &a));
        assert!(!rect_overlap(&a, &c));
    }

    #[test]
    fn test_edge_touching_rects_do_not_overlap() {
        let a = square(0.0, 0.0, 4.0);
        let b = square(4.0, 0.0, 4.0);
        assert!(!a.overlaps(&b));
    }

    #[test]
    fn test_point_in_rect() {
        let rect = square(0.0, 0.0, 4.0);
        assert!(rect.contains_point(Vec2::new(2.0, 2.0)));
        assert!(!rect.contains_point(Vec2::new(4.0, 2.0)));
        assert!(!rect.contains_point(Vec2::new(5.0, 2.0)));
    }

    #[test]
    fn test_sweep_hits_left_face() {
        let actor = square(0.0, 0.0, 4.0);
        let wall = square(8.0, 0.0, 4.0);

        let hit = sweep_rect_rect(&actor, &wall, Vec2::new(10.0, 0.0)).expect("should hit");
        assert!((hit.time - 0.4).abs() < 1e-5);
        assert_eq!(hit.normal, Vec2::new(-1.0, 0.0));
        assert!((hit.delta.x - 4.0).abs() < 1e-5);
    }

    #[test]
    fn test_sweep_hits_top_face() {
        let actor = square(0.0, 40.0, 4.0);
        let floor = square(-10.0, 0.0, 30.0);

        let hit = sweep_rect_rect(&actor, &floor, Vec2::new(0.0, -20.0)).expect("should hit");
        assert!((hit.time - 0.5).abs() < 1e-5);
        assert_eq!(hit.normal, Vec2::new(0.0, 1.0));
    }

    #[test]
    fn test_sweep_misses_short_motion() {
        let actor = square(0.0, 0.0, 4.0);
        let wall = square(8.0, 0.0, 4.0);
        assert!(sweep_rect_rect(&actor, &wall, Vec2::new(3.0, 0.0)).is_none());
    }

    #[test]
    fn test_sweep_rejects_moving_away() {
        let actor = square(0.0, 0.0, 4.0);
        let wall = square(8.0, 0.0, 4.0);
        assert!(sweep_rect_rect(&actor, &wall, Vec2::new(-10.0, 0.0)).is_none());
    }

    #[test]
    fn test_sweep_rejects_parallel_outside_slab() {
        let actor = square(0.0, 10.0, 4.0);
        let wall = square(8.0, 0.0, 4.0);
        assert!(sweep_rect_rect(&actor, &wall, Vec2::new(20.0, 0.0)).is_none());
    }

    #[test]
    fn test_sweep_slides_past_shared_edge() {
        // Actor sits exactly on top of the wall and moves along it.
        let actor = square(0.0, 4.0, 4.0);
        let wall = square(0.0, 0.0, 40.0).translated(Vec2::new(0.0, -36.0));
        assert!(sweep_rect_rect(&actor, &wall, Vec2::new(10.0, 0.0)).is_none());
    }

    #[test]
    fn test_sweep_resting_contact_is_time_zero() {
        let actor = square(4.0, 0.0, 4.0);
        let wall = square(8.0, 0.0, 4.0);

        let hit = sweep_rect_rect(&actor, &wall, Vec2::new(5.0, 0.0)).expect("should hit");
        assert_eq!(hit.time, 0.0);
        assert_eq!(hit.normal, Vec2::new(-1.0, 0.0));
    }

    #[test]
    fn test_sweep_ignores_existing_overlap() {
        let actor = square(9.0, 0.0, 4.0);
        let wall = square(8.0, 0.0, 4.0);
        assert!(sweep_rect_rect(&actor, &wall, Vec2::new(1.0, 0.0)).is_none());
    }

    #[test]
    fn test_sweep_accepts_contact_within_skin() {
        // A hair inside the wall's left face, still pushing right.
        let actor = square(4.0 + 1e-4, 0.0, 4.0);
        let wall = square(8.0, 0.0, 4.0);

        let hit = sweep_rect_rect(&actor, &wall, Vec2::new(7.7, 0.0)).expect("should hit");
        assert_eq!(hit.time, 0.0);
        assert_eq!(hit.normal, Vec2::new(-1.0, 0.0));
        assert_eq!(hit.delta, Vec2::ZERO);

        // Same spot moving away is free to leave.
        assert!(sweep_rect_rect(&actor, &wall, Vec2::new(-7.7, 0.0)).is_none());
    }

    #[test]
    fn test_sweep_ignores_neighbour_within_skin() {
        // Resting a hair inside the top of one tile must not catch the side
        // of the next tile along.
        let actor = square(4.0, 8.0 - 1e-4, 4.0);
        let next_tile = square(8.0, 0.0, 8.0);
        assert!(sweep_rect_rect(&actor, &next_tile, Vec2::new(3.0, 0.0)).is_none());
    }

    #[test]
    fn test_contact_offset_lands_on_face() {
        let wall = Rect::from_corner(Vec2::new(10.5272, -50.0), Vec2::new(0.5, 100.0));
        let actor = Rect::from_corner(Vec2::new(6.5272 + 1e-4, 0.0), Vec2::splat(4.0));

        let offset = contact_offset(&actor, &wall, Vec2::NEG_X);
        assert_eq!(offset.y, 0.0);
        assert!((actor.translated(offset).max().x - 10.5272).abs() < 1e-5);

        let floor = square(0.0, 0.0, 8.0);
        let resting = square(2.0, 7.9999, 4.0);
        let offset = contact_offset(&resting, &floor, Vec2::Y);
        assert_eq!(offset.x, 0.0);
        assert!((resting.translated(offset).min().y - 8.0).abs() < 1e-5);
    }

    #[test]
    fn test_sweep_without_motion_never_hits() {
        let actor = square(4.0, 0.0, 4.0);
        let wall = square(8.0, 0.0, 4.0);
        assert!(sweep_rect_rect(&actor, &wall, Vec2::ZERO).is_none());
    }

    #[test]
    fn test_slide_velocity_vertical_normal() {
        let hit = Hit {
            time: 0.5,
            normal: Vec2::new(0.0, 1.0),
            delta: Vec2::ZERO,
        };
        let slid = slide_velocity(Vec2::new(6.0, -8.0), &hit);
        assert_eq!(slid.x, 6.0 * 0.5);
        assert_eq!(slid.y, 0.0);
    }

    #[test]
    fn test_slide_velocity_horizontal_normal() {
        let hit = Hit {
            time: 0.25,
            normal: Vec2::new(-1.0, 0.0),
            delta: Vec2::ZERO,
        };
        let slid = slide_velocity(Vec2::new(10.0, 4.0), &hit);
        assert_eq!(slid.x, 0.0);
        assert_eq!(slid.y, 4.0 * 0.75);
    }

    #[test]
    fn test_circle_checks() {
        let circle = Circle::new(Vec2::new(0.0, 0.0), 2.0);
        let near = Circle::new(Vec2::new(3.0, 0.0), 2.0);
        let far = Circle::new(Vec2::new(5.0, 0.0), 1.0);

        assert!(circle_circle_check(&circle, &near));
        assert!(!circle_circle_check(&circle, &far));

        assert!(circle_rect_check(&circle, &square(1.0, -1.0, 2.0)));
        assert!(!circle_rect_check(&circle, &square(2.0, 0.0, 2.0)));
    }

    #[test]
    fn test_circle_circle_solve() {
        let a = Circle::new(Vec2::new(3.0, 0.0), 2.0);
        let b = Circle::new(Vec2::ZERO, 2.0);
        let push = circle_circle_solve(&a, &b);
        assert!((push.x - 1.0).abs() < 1e-5);
        assert_eq!(push.y, 0.0);

        let apart = Circle::new(Vec2::new(10.0, 0.0), 1.0);
        assert_eq!(circle_circle_solve(&apart, &b), Vec2::ZERO);
    }

    #[test]
    fn test_circle_circle_solve_coincident() {
        let a = Circle::new(Vec2::ZERO, 1.0);
        let b = Circle::new(Vec2::ZERO, 1.0);
        assert_eq!(circle_circle_solve(&a, &b), Vec2::new(2.0, 0.0));
    }

    #[test]
    fn test_circle_rect_solve_outside_center() {
        let circle = Circle::new(Vec2::new(5.0, 2.0), 2.0);
        let rect = square(0.0, 0.0, 4.0);
        let push = circle_rect_solve(&circle, &rect);
        assert!((push.x - 1.0).abs() < 1e-5);
        assert!(push.y.abs() < 1e-5);
    }

    #[test]
    fn test_circle_rect_solve_inside_center() {
        let circle = Circle::new(Vec2::new(3.0, 2.0), 1.0);
        let rect = square(0.0, 0.0, 4.0);
        let push = circle_rect_solve(&circle, &rect);
        // Nearest face is x = 4, one unit away; plus the radius.
        assert!((push.x - 2.0).abs() < 1e-5);
        assert_eq!(push.y, 0.0);
    }

    #[test]
    fn test_rect_rect_solve_least_axis() {
        let a = square(3.0, 1.0, 4.0);
        let b = square(0.0, 0.0, 4.0);
        let push = rect_rect_solve(&a, &b);
        assert_eq!(push, Vec2::new(1.0, 0.0));

        let still_overlapping = rect_overlap(&a.translated(push), &b);
        assert!(!still_overlapping);
    }

    #[test]
    fn test_rect_rect_solve_disjoint() {
        let a = square(10.0, 0.0, 4.0);
        let b = square(0.0, 0.0, 4.0);
        assert_eq!(rect_rect_solve(&a, &b), Vec2::ZERO);
    }
}
