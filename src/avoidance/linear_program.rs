//! Incremental 2D linear program over ORCA half-planes, with the 3-line fallback.
//!
//! Translated in spirit from the RVO2 reference implementation.

use bevy::math::Vec2;

use crate::geometry::{OrcaLine, RVO_EPSILON, clamp_to_speed, det};

/// Compute the best collision-free velocity for an agent given ORCA constraints.
///
/// Finds the velocity closest to `preferred` that satisfies all half-plane
/// constraints and lies within the `max_speed` disc. When that is infeasible,
/// the first `num_obstacle_lines` lines stay hard and the remaining agent lines
/// are relaxed in order. `projected` is scratch space for the fallback.
pub fn compute_avoiding_velocity(
    lines: &[OrcaLine],
    num_obstacle_lines: usize,
    preferred: Vec2,
    max_speed: f32,
    projected: &mut Vec<OrcaLine>,
) -> Vec2 {
    let (mut result, fail_line) = linear_program_2(lines, max_speed, preferred, false);
    if fail_line < lines.len() {
        result = linear_program_3(
            lines,
            num_obstacle_lines,
            fail_line,
            max_speed,
            result,
            projected,
        );
    }
    result
}

/// 1D optimization along constraint line `line_idx`, respecting all prior constraints.
///
/// Returns the optimal point along `lines[line_idx]` that is closest to
/// `opt_velocity` (or furthest along `opt_velocity` if `direction_opt`)
/// while satisfying constraints `0..line_idx` and the max-speed disc.
///
/// Returns `None` if infeasible.
fn linear_program_1(
    lines: &[OrcaLine],
    line_idx: usize,
    max_speed: f32,
    opt_velocity: Vec2,
    direction_opt: bool,
) -> Option<Vec2> {
    let line = &lines[line_idx];
    let dot_product = line.point.dot(line.direction);
    let discriminant = dot_product.mul_add(
        dot_product,
        max_speed.mul_add(max_speed, -line.point.length_squared()),
    );

    if discriminant < 0.0 {
        // Max speed disc doesn't intersect with this constraint line.
        return None;
    }

    let sqrt_discriminant = discriminant.sqrt();
    let mut t_left = -dot_product - sqrt_discriminant;
    let mut t_right = -dot_product + sqrt_discriminant;

    for prior in &lines[..line_idx] {
        let denominator = det(line.direction, prior.direction);
        let numerator = det(prior.direction, line.point - prior.point);

        if denominator.abs() <= RVO_EPSILON {
            // Lines are (near-)parallel.
            if numerator < 0.0 {
                return None;
            }
            continue;
        }

        let t = numerator / denominator;
        if denominator >= 0.0 {
            t_right = t_right.min(t);
        } else {
            t_left = t_left.max(t);
        }

        if t_left > t_right {
            return None;
        }
    }

    let t = if direction_opt {
        if opt_velocity.dot(line.direction) > 0.0 {
            t_right
        } else {
            t_left
        }
    } else {
        line.direction
            .dot(opt_velocity - line.point)
            .clamp(t_left, t_right)
    };

    Some(line.point + t * line.direction)
}

/// 2D incremental linear program.
///
/// Processes constraints one by one. If the current solution violates a new
/// constraint, projects onto that constraint via [`linear_program_1`].
///
/// When `direction_opt` is `true`, `opt_velocity` is treated as a unit direction
/// and the initial result is placed on the max-speed disc boundary in that direction.
///
/// Returns `(result, fail_index)` where `fail_index == lines.len()` means all
/// constraints were satisfied. On failure `result` is the solution of the
/// lines before `fail_index`.
pub(crate) fn linear_program_2(
    lines: &[OrcaLine],
    max_speed: f32,
    opt_velocity: Vec2,
    direction_opt: bool,
) -> (Vec2, usize) {
    let mut result = if direction_opt {
        opt_velocity * max_speed
    } else {
        clamp_to_speed(opt_velocity, max_speed)
    };

    for (i, line) in lines.iter().enumerate() {
        if line.violation(result) > 0.0 {
            match linear_program_1(lines, i, max_speed, opt_velocity, direction_opt) {
                Some(new_result) => result = new_result,
                None => return (result, i),
            }
        }
    }

    (result, lines.len())
}

/// Infeasible fallback: minimizes the maximum violation of the agent lines.
///
/// Starting at `begin_line`, each line still violated by more than the current
/// penetration depth is resolved by a 1D problem projected onto its boundary.
/// Obstacle lines (the first `num_obstacle_lines`) are carried over unchanged
/// so obstacle avoidance is never traded away.
pub(crate) fn linear_program_3(
    lines: &[OrcaLine],
    num_obstacle_lines: usize,
    begin_line: usize,
    max_speed: f32,
    current: Vec2,
    projected: &mut Vec<OrcaLine>,
) -> Vec2 {
    let mut result = current;
    let mut distance = 0.0_f32;

    for i in begin_line..lines.len() {
        let line_i = lines[i];
        if line_i.violation(result) <= distance {
            continue;
        }

        projected.clear();
        projected.extend_from_slice(&lines[..num_obstacle_lines]);

        // Empty when line i is itself an obstacle line.
        for line_j in lines.iter().take(i).skip(num_obstacle_lines) {
            let determinant = det(line_i.direction, line_j.direction);

            let point = if determinant.abs() <= RVO_EPSILON {
                // Nearly parallel lines.
                if line_i.direction.dot(line_j.direction) > 0.0 {
                    // Same direction, redundant.
                    continue;
                }
                // Opposite direction, take the midpoint.
                0.5 * (line_i.point + line_j.point)
            } else {
                line_i.point
                    + (det(line_j.direction, line_i.point - line_j.point) / determinant)
                        * line_i.direction
            };

            projected.push(OrcaLine {
                point,
                direction: (line_j.direction - line_i.direction).normalize_or_zero(),
            });
        }

        // Optimize along the perpendicular of line i (pointing into the valid half-plane).
        let opt_direction = Vec2::new(-line_i.direction.y, line_i.direction.x);
        let (new_result, fail) = linear_program_2(projected, max_speed, opt_direction, true);

        // A failure here is a floating-point artifact; keep the previous best.
        if fail == projected.len() {
            result = new_result;
        }

        distance = line_i.violation(result);
    }

    result
}
