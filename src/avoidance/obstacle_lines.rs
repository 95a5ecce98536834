//! Agent-obstacle ORCA constraints.
//!
//! Obstacles do not move and do not cooperate, so each edge yields a line that
//! takes the full avoidance effort. Edges are processed nearest first and an
//! edge already fenced off by earlier lines is skipped.
//!
//! Based on the RVO2 reference implementation (Agent.cpp).

use bevy::math::Vec2;

use super::orca::AgentSnapshot;
use crate::geometry::{OrcaLine, RVO_EPSILON, det, left_tangent, right_tangent};
use crate::obstacles::{EdgeId, ObstacleNeighbor, Obstacles};

/// Append one constraint per relevant obstacle edge to `lines`.
///
/// `lines` must hold only obstacle lines when this is called, since every
/// line already present is used to detect covered edges.
pub fn append_obstacle_lines(
    agent: &AgentSnapshot,
    obstacles: &Obstacles,
    neighbors: &[ObstacleNeighbor],
    obstacle_time_horizon: f32,
    lines: &mut Vec<OrcaLine>,
) {
    let inv_time_horizon = 1.0 / obstacle_time_horizon;
    for neighbor in neighbors {
        if let Some(line) = obstacle_line(agent, obstacles, neighbor.edge, inv_time_horizon, lines)
        {
            lines.push(line);
        }
    }
}

/// Constraint induced by the edge starting at `edge_id`, or `None` if the edge
/// needs no new line.
fn obstacle_line(
    agent: &AgentSnapshot,
    obstacles: &Obstacles,
    edge_id: EdgeId,
    inv_time_horizon: f32,
    accepted: &[OrcaLine],
) -> Option<OrcaLine> {
    let mut left_id = edge_id;
    let mut right_id = obstacles.edge(edge_id).next;
    let left = obstacles.edge(left_id);
    let right = obstacles.edge(right_id);
    let edge_direction = left.direction;

    let rel_left = left.point - agent.position;
    let rel_right = right.point - agent.position;

    if already_covered(rel_left, rel_right, agent.radius, inv_time_horizon, accepted) {
        return None;
    }

    let radius = agent.radius;
    let radius_sq = radius * radius;
    let dist_sq_left = rel_left.length_squared();
    let dist_sq_right = rel_right.length_squared();

    let edge_vector = right.point - left.point;
    let s = (-rel_left).dot(edge_vector) / edge_vector.length_squared();
    let dist_sq_line = (-rel_left - s * edge_vector).length_squared();

    // Already colliding with the left vertex.
    if s < 0.0 && dist_sq_left <= radius_sq {
        if !left.is_convex {
            return None;
        }
        return Some(through_origin(rel_left.perp(), edge_direction));
    }

    // Already colliding with the right vertex. The next edge handles it when it
    // turns away from the agent.
    if s > 1.0 && dist_sq_right <= radius_sq {
        if !right.is_convex || det(rel_right, right.direction) < 0.0 {
            return None;
        }
        return Some(through_origin(rel_right.perp(), edge_direction));
    }

    // Already colliding with the segment interior.
    if (0.0..=1.0).contains(&s) && dist_sq_line <= radius_sq {
        return Some(OrcaLine {
            point: Vec2::ZERO,
            direction: -left.direction,
        });
    }

    // No collision yet. Build the legs of the velocity obstacle.
    let (mut left_leg, mut right_leg) = if s < 0.0 && dist_sq_line <= radius_sq {
        // Viewed obliquely from the left: only the left vertex matters.
        if !left.is_convex {
            return None;
        }
        right_id = left_id;
        (
            left_tangent(rel_left, dist_sq_left, radius),
            right_tangent(rel_left, dist_sq_left, radius),
        )
    } else if s > 1.0 && dist_sq_line <= radius_sq {
        // Viewed obliquely from the right: only the right vertex matters.
        if !right.is_convex {
            return None;
        }
        left_id = right_id;
        (
            left_tangent(rel_right, dist_sq_right, radius),
            right_tangent(rel_right, dist_sq_right, radius),
        )
    } else {
        let left_leg = if left.is_convex {
            left_tangent(rel_left, dist_sq_left, radius)
        } else {
            -left.direction
        };
        let right_leg = if right.is_convex {
            right_tangent(rel_right, dist_sq_right, radius)
        } else {
            left.direction
        };
        (left_leg, right_leg)
    };

    let left = obstacles.edge(left_id);
    let right = obstacles.edge(right_id);
    let same_vertex = left_id == right_id;

    // A leg pointing back into a neighbouring edge is replaced by that edge.
    // Such foreign legs never produce a constraint of their own.
    let mut left_foreign = false;
    let mut right_foreign = false;

    let left_neighbor = obstacles.edge(left.prev);
    if left.is_convex && det(left_leg, -left_neighbor.direction) >= 0.0 {
        left_leg = -left_neighbor.direction;
        left_foreign = true;
    }
    if right.is_convex && det(right_leg, right.direction) <= 0.0 {
        right_leg = right.direction;
        right_foreign = true;
    }

    let left_cutoff = inv_time_horizon * (left.point - agent.position);
    let right_cutoff = inv_time_horizon * (right.point - agent.position);
    let cutoff_vector = right_cutoff - left_cutoff;
    let inflation = radius * inv_time_horizon;
    let velocity = agent.velocity;

    let t = if same_vertex {
        0.5
    } else {
        (velocity - left_cutoff).dot(cutoff_vector) / cutoff_vector.length_squared()
    };
    let t_left = (velocity - left_cutoff).dot(left_leg);
    let t_right = (velocity - right_cutoff).dot(right_leg);

    // Project on the left or right cutoff circle.
    if (t < 0.0 && t_left < 0.0) || (same_vertex && t_left < 0.0 && t_right < 0.0) {
        return Some(cutoff_circle_line(velocity, left_cutoff, inflation, edge_direction));
    }
    if t > 1.0 && t_right < 0.0 {
        return Some(cutoff_circle_line(velocity, right_cutoff, inflation, edge_direction));
    }

    // Otherwise project on the nearest of the cutoff segment and the two legs.
    let dist_sq_cutoff = if t < 0.0 || t > 1.0 || same_vertex {
        f32::INFINITY
    } else {
        velocity.distance_squared(left_cutoff + t * cutoff_vector)
    };
    let dist_sq_left_leg = if t_left < 0.0 {
        f32::INFINITY
    } else {
        velocity.distance_squared(left_cutoff + t_left * left_leg)
    };
    let dist_sq_right_leg = if t_right < 0.0 {
        f32::INFINITY
    } else {
        velocity.distance_squared(right_cutoff + t_right * right_leg)
    };

    if dist_sq_cutoff <= dist_sq_left_leg && dist_sq_cutoff <= dist_sq_right_leg {
        Some(offset_line(left_cutoff, -left.direction, inflation))
    } else if dist_sq_left_leg <= dist_sq_right_leg {
        (!left_foreign).then(|| offset_line(left_cutoff, left_leg, inflation))
    } else {
        (!right_foreign).then(|| offset_line(right_cutoff, -right_leg, inflation))
    }
}

/// Whether both endpoints, scaled into velocity space, are already excluded by
/// an accepted line with at least the agent radius to spare.
fn already_covered(
    rel_left: Vec2,
    rel_right: Vec2,
    radius: f32,
    inv_time_horizon: f32,
    accepted: &[OrcaLine],
) -> bool {
    let margin = inv_time_horizon * radius;
    let clear_of = |line: &OrcaLine, rel: Vec2| {
        det(inv_time_horizon * rel - line.point, line.direction) - margin >= -RVO_EPSILON
    };
    accepted
        .iter()
        .any(|line| clear_of(line, rel_left) && clear_of(line, rel_right))
}

/// Line through the origin along `direction`, or along the edge when the
/// agent sits exactly on the vertex.
fn through_origin(direction: Vec2, edge_direction: Vec2) -> OrcaLine {
    OrcaLine {
        point: Vec2::ZERO,
        direction: direction.try_normalize().unwrap_or(-edge_direction),
    }
}

/// Tangent to the cutoff circle at the point nearest `velocity`. A velocity at
/// the centre is pushed out along the edge's outward normal.
fn cutoff_circle_line(
    velocity: Vec2,
    cutoff: Vec2,
    inflation: f32,
    edge_direction: Vec2,
) -> OrcaLine {
    let unit_w = (velocity - cutoff)
        .try_normalize()
        .unwrap_or(-edge_direction.perp());
    OrcaLine {
        point: cutoff + inflation * unit_w,
        direction: Vec2::new(unit_w.y, -unit_w.x),
    }
}

/// Line along `direction`, pushed out from `anchor` by the inflated agent radius.
fn offset_line(anchor: Vec2, direction: Vec2, inflation: f32) -> OrcaLine {
    OrcaLine {
        point: anchor + inflation * direction.perp(),
        direction,
    }
}
