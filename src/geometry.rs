//! Velocity-space geometry shared by the obstacle graph, the constraint builders and the LP.

use bevy::math::Vec2;

/// Tolerance for parallel-line and coverage tests (matches RVO2).
pub const RVO_EPSILON: f32 = 1e-5;

/// A half-plane constraint in velocity space.
/// Valid velocities lie on the left side of the directed line (where `direction.perp()` points).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrcaLine {
    /// A point on the boundary line in velocity space.
    pub point: Vec2,
    /// Unit direction vector along the line.
    pub direction: Vec2,
}

impl OrcaLine {
    /// Signed violation of `velocity` against this constraint.
    /// Positive means `velocity` lies in the forbidden half-plane.
    #[must_use]
    pub fn violation(&self, velocity: Vec2) -> f32 {
        det(self.direction, self.point - velocity)
    }

    /// Whether `velocity` satisfies this constraint.
    #[must_use]
    pub fn permits(&self, velocity: Vec2) -> bool {
        self.violation(velocity) <= 0.0
    }
}

/// 2D cross product (determinant of 2x2 matrix).
#[inline]
#[must_use]
pub fn det(a: Vec2, b: Vec2) -> f32 {
    a.x.mul_add(b.y, -(a.y * b.x))
}

/// Signed area test: positive when `c` lies to the left of the directed line `a → b`.
#[inline]
#[must_use]
pub fn left_of(a: Vec2, b: Vec2, c: Vec2) -> f32 {
    det(a - c, b - a)
}

/// Squared distance from `c` to the segment `a`–`b`.
#[must_use]
pub fn dist_sq_point_segment(a: Vec2, b: Vec2, c: Vec2) -> f32 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq <= f32::EPSILON {
        return c.distance_squared(a);
    }

    let r = (c - a).dot(ab) / len_sq;
    if r < 0.0 {
        c.distance_squared(a)
    } else if r > 1.0 {
        c.distance_squared(b)
    } else {
        c.distance_squared(a + r * ab)
    }
}

/// Direction of the left tangent from the origin to the circle of `radius` around `relative`.
/// `dist_sq` is `relative.length_squared()` and must exceed `radius²`.
#[must_use]
pub fn left_tangent(relative: Vec2, dist_sq: f32, radius: f32) -> Vec2 {
    let leg = radius.mul_add(-radius, dist_sq).sqrt();
    Vec2::new(
        relative.x.mul_add(leg, -(relative.y * radius)),
        relative.x.mul_add(radius, relative.y * leg),
    ) / dist_sq
}

/// Direction of the right tangent from the origin to the circle of `radius` around `relative`.
#[must_use]
pub fn right_tangent(relative: Vec2, dist_sq: f32, radius: f32) -> Vec2 {
    let leg = radius.mul_add(-radius, dist_sq).sqrt();
    Vec2::new(
        relative.x.mul_add(leg, relative.y * radius),
        (-relative.x).mul_add(radius, relative.y * leg),
    ) / dist_sq
}

/// Shoelace area of a closed vertex loop. Positive when counter-clockwise.
#[must_use]
pub fn signed_area(vertices: &[Vec2]) -> f32 {
    let n = vertices.len();
    0.5 * (0..n)
        .map(|i| det(vertices[i], vertices[(i + 1) % n]))
        .sum::<f32>()
}

/// Clamp `velocity` into the disc of radius `max_speed`.
#[must_use]
pub fn clamp_to_speed(velocity: Vec2, max_speed: f32) -> Vec2 {
    if velocity.length_squared() > max_speed * max_speed {
        velocity.normalize_or_zero() * max_speed
    } else {
        velocity
    }
}
