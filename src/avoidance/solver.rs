//! Per-agent ORCA solve: constraints from obstacles and neighbours, then the LP.

use bevy::prelude::*;

use super::linear_program::compute_avoiding_velocity;
use super::obstacle_lines::append_obstacle_lines;
use super::orca::{AgentSnapshot, compute_orca_line};
use crate::geometry::OrcaLine;
use crate::obstacles::{ObstacleNeighbor, Obstacles};

/// Reusable ORCA solver. Owns the constraint buffers so repeated solves do not
/// allocate once the buffers have grown.
#[derive(Debug, Default)]
pub struct OrcaSolver {
    lines: Vec<OrcaLine>,
    projected: Vec<OrcaLine>,
    obstacle_line_count: usize,
}

impl OrcaSolver {
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            lines: Vec::with_capacity(capacity),
            projected: Vec::with_capacity(capacity),
            obstacle_line_count: 0,
        }
    }

    /// Compute the new velocity of `agent`.
    ///
    /// `obstacle_neighbors` index into `obstacles` and should be nearest first.
    /// Non-finite input or output is reported and yields a zero velocity.
    pub fn solve<'a>(
        &mut self,
        agent: &AgentSnapshot,
        agent_neighbors: impl IntoIterator<Item = &'a AgentSnapshot>,
        obstacles: &Obstacles,
        obstacle_neighbors: &[ObstacleNeighbor],
        time_horizon: f32,
        obstacle_time_horizon: f32,
        delta_time: f32,
    ) -> Vec2 {
        self.lines.clear();
        self.obstacle_line_count = 0;

        if !agent.is_finite() {
            warn!(
                "avoidance agent at {} has non-finite state (velocity {}, preferred {}); stopping it",
                agent.position, agent.velocity, agent.preferred
            );
            return Vec2::ZERO;
        }

        append_obstacle_lines(
            agent,
            obstacles,
            obstacle_neighbors,
            obstacle_time_horizon,
            &mut self.lines,
        );
        self.obstacle_line_count = self.lines.len();

        self.lines.extend(
            agent_neighbors
                .into_iter()
                .map(|other| compute_orca_line(agent, other, time_horizon, delta_time)),
        );

        let result = compute_avoiding_velocity(
            &self.lines,
            self.obstacle_line_count,
            agent.preferred,
            agent.max_speed,
            &mut self.projected,
        );

        if result.is_finite() {
            result
        } else {
            warn!(
                "avoidance solve for agent at {} produced {result} from {} constraints; stopping it",
                agent.position,
                self.lines.len()
            );
            Vec2::ZERO
        }
    }

    /// Constraints of the last solve: obstacle lines first, then agent lines.
    #[must_use]
    pub fn lines(&self) -> &[OrcaLine] {
        &self.lines
    }

    #[must_use]
    pub const fn obstacle_line_count(&self) -> usize {
        self.obstacle_line_count
    }
}
