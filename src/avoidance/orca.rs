//! Agent-agent ORCA constraints. Pure math, no ECS access.
//!
//! Each neighbour contributes one half-plane; both agents absorb half of the
//! velocity change needed to leave the truncated velocity obstacle.
//!
//! Based on the RVO2 reference implementation (Agent.cpp).

use bevy::math::Vec2;

use crate::geometry::{OrcaLine, RVO_EPSILON, det, left_tangent, right_tangent};

/// Share of the avoidance effort each agent of a pair takes on.
const RECIPROCAL_SHARE: f32 = 0.5;

/// Snapshot of one agent's state for ORCA computation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AgentSnapshot {
    pub position: Vec2,
    /// Current velocity (from last frame's ORCA output).
    pub velocity: Vec2,
    /// Desired velocity (from steering).
    pub preferred: Vec2,
    pub radius: f32,
    pub max_speed: f32,
}

impl AgentSnapshot {
    /// Whether every field is finite. Non-finite agents are left out of the solve.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.position.is_finite()
            && self.velocity.is_finite()
            && self.preferred.is_finite()
            && self.radius.is_finite()
            && self.max_speed.is_finite()
    }
}

/// Compute the ORCA half-plane constraint for agent `a` avoiding agent `b`.
///
/// `time_horizon` bounds how far ahead collisions are anticipated. When the
/// agents already overlap, the cutoff is taken at `delta_time` instead so the
/// constraint separates them within a single step.
#[must_use]
pub fn compute_orca_line(
    a: &AgentSnapshot,
    b: &AgentSnapshot,
    time_horizon: f32,
    delta_time: f32,
) -> OrcaLine {
    let rel_pos = b.position - a.position;
    let rel_vel = a.velocity - b.velocity;
    let dist_sq = rel_pos.length_squared();
    let combined_radius = a.radius + b.radius;
    let combined_radius_sq = combined_radius * combined_radius;

    let direction;
    let u;

    if dist_sq > combined_radius_sq {
        let inv_time_horizon = 1.0 / time_horizon;
        // Relative velocity measured from the cutoff circle center.
        let w = rel_vel - inv_time_horizon * rel_pos;
        let w_length_sq = w.length_squared();
        let dot_product_1 = w.dot(rel_pos);

        #[allow(clippy::suspicious_operation_groupings)]
        let on_cutoff_circle =
            dot_product_1 < 0.0 && dot_product_1 * dot_product_1 > combined_radius_sq * w_length_sq;

        if on_cutoff_circle {
            let w_length = w_length_sq.sqrt();
            let unit_w = w / w_length;
            direction = Vec2::new(unit_w.y, -unit_w.x);
            u = combined_radius.mul_add(inv_time_horizon, -w_length) * unit_w;
        } else {
            direction = if det(rel_pos, w) > 0.0 {
                left_tangent(rel_pos, dist_sq, combined_radius)
            } else {
                -right_tangent(rel_pos, dist_sq, combined_radius)
            };
            u = rel_vel.dot(direction) * direction - rel_vel;
        }
    } else {
        // Already overlapping: project on the cutoff circle of one time step.
        let inv_time_step = 1.0 / delta_time;
        let w = rel_vel - inv_time_step * rel_pos;
        let w_length = w.length();
        let unit_w = if w_length > RVO_EPSILON {
            w / w_length
        } else {
            // No relative motion to project: push straight away from the neighbour.
            (-rel_pos).try_normalize().unwrap_or(Vec2::X)
        };
        direction = Vec2::new(unit_w.y, -unit_w.x);
        u = combined_radius.mul_add(inv_time_step, -w_length) * unit_w;
    }

    OrcaLine {
        point: a.velocity + RECIPROCAL_SHARE * u,
        direction,
    }
}
