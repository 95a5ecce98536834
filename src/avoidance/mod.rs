//! ORCA local avoidance: per-tick velocity solve for every agent.

mod linear_program;
mod neighbors;
mod obstacle_lines;
mod orca;
mod solver;
mod spatial_hash;

pub use self::linear_program::compute_avoiding_velocity;
pub use self::neighbors::{AgentNeighbor, select_agent_neighbors};
pub use self::obstacle_lines::append_obstacle_lines;
pub use self::orca::{AgentSnapshot, compute_orca_line};
pub use self::solver::OrcaSolver;
pub use self::spatial_hash::SpatialHash;

use std::collections::HashMap;

use avian2d::prelude::*;
use bevy::prelude::*;

use crate::SimSet;
use crate::obstacles::{ObstacleNeighbor, Obstacles};

// === Constants ===

/// Default ORCA time horizon for agent pairs, in seconds.
const DEFAULT_TIME_HORIZON: f32 = 2.0;
/// Default ORCA time horizon for obstacles, in seconds.
const DEFAULT_OBSTACLE_TIME_HORIZON: f32 = 2.0;
/// Default neighbour search radius.
const DEFAULT_NEIGHBOR_DISTANCE: f32 = 90.0;
/// Maximum neighbours to consider per agent.
const DEFAULT_MAX_NEIGHBORS: usize = 10;
/// Step used for overlap resolution when `Time` reports no elapsed time.
const DEFAULT_FALLBACK_TIME_STEP: f32 = 1.0 / 60.0;

// === Components ===

/// The velocity the agent wants to move at. Written by steering, read by
/// `compute_avoidance`.
#[derive(Component, Debug, Clone, Copy, Reflect, Default)]
#[reflect(Component)]
pub struct PreferredVelocity(pub Vec2);

/// Per-agent ORCA parameters.
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
#[require(PreferredVelocity, LinearVelocity)]
pub struct AvoidanceAgent {
    /// Avoidance radius (typically matches the collider radius).
    pub radius: f32,
    /// Upper bound on the solved speed.
    pub max_speed: f32,
}

// === Resources ===

/// Global ORCA tuning parameters.
#[derive(Resource, Debug, Clone, Reflect)]
#[reflect(Resource)]
pub struct AvoidanceConfig {
    /// How far ahead (seconds) agents predict collisions with each other.
    pub time_horizon: f32,
    /// How far ahead (seconds) agents predict collisions with obstacles.
    pub obstacle_time_horizon: f32,
    /// Search radius for agent neighbours. Also the spatial hash cell size.
    pub neighbor_distance: f32,
    /// Max agent neighbours per solve. Caps the agent constraint count.
    pub max_neighbors: usize,
    /// Delta used when the frame reports zero elapsed time.
    pub fallback_time_step: f32,
}

impl Default for AvoidanceConfig {
    fn default() -> Self {
        Self {
            time_horizon: DEFAULT_TIME_HORIZON,
            obstacle_time_horizon: DEFAULT_OBSTACLE_TIME_HORIZON,
            neighbor_distance: DEFAULT_NEIGHBOR_DISTANCE,
            max_neighbors: DEFAULT_MAX_NEIGHBORS,
            fallback_time_step: DEFAULT_FALLBACK_TIME_STEP,
        }
    }
}

/// Per-system scratch space, kept across frames to avoid reallocating.
#[derive(Default)]
pub struct AvoidanceScratch {
    solver: OrcaSolver,
    entities: Vec<Entity>,
    snapshots: Vec<AgentSnapshot>,
    index_map: HashMap<Entity, usize>,
    candidates: Vec<Entity>,
    agent_neighbors: Vec<AgentNeighbor>,
    obstacle_neighbors: Vec<ObstacleNeighbor>,
    results: Vec<Vec2>,
}

// === Systems ===

/// Rebuild the spatial hash with all agent positions. Runs every frame.
pub fn rebuild_spatial_hash(
    config: Res<AvoidanceConfig>,
    mut hash: ResMut<SpatialHash>,
    agents: Query<(Entity, &GlobalTransform), With<AvoidanceAgent>>,
) {
    #[allow(clippy::float_cmp)]
    if config.is_changed() && hash.cell_size() != config.neighbor_distance {
        *hash = SpatialHash::new(config.neighbor_distance);
    }

    hash.clear();
    for (entity, transform) in &agents {
        hash.insert(entity, transform.translation().xy());
    }
}

/// Compute ORCA velocities for all agents.
///
/// Every agent is solved against the same frozen snapshot of positions and
/// velocities; results are written to `LinearVelocity` only after all solves.
pub fn compute_avoidance(
    config: Res<AvoidanceConfig>,
    time: Res<Time>,
    hash: Res<SpatialHash>,
    obstacles: Res<Obstacles>,
    mut scratch: Local<AvoidanceScratch>,
    mut agents: Query<(
        Entity,
        &GlobalTransform,
        &mut LinearVelocity,
        &PreferredVelocity,
        &AvoidanceAgent,
    )>,
) {
    let delta_time = match time.delta_secs() {
        dt if dt > 0.0 => dt,
        _ => config.fallback_time_step,
    };

    let AvoidanceScratch {
        solver,
        entities,
        snapshots,
        index_map,
        candidates,
        agent_neighbors,
        obstacle_neighbors,
        results,
    } = &mut *scratch;

    // Phase 1: snapshot.
    entities.clear();
    snapshots.clear();
    index_map.clear();
    for (entity, transform, velocity, preferred, agent) in &agents {
        index_map.insert(entity, snapshots.len());
        entities.push(entity);
        snapshots.push(AgentSnapshot {
            position: transform.translation().xy(),
            velocity: velocity.0,
            preferred: preferred.0,
            radius: agent.radius,
            max_speed: agent.max_speed,
        });
    }

    // Phase 2: solve.
    results.clear();
    for (index, agent) in snapshots.iter().enumerate() {
        hash.query_neighbors(agent.position, config.neighbor_distance, candidates);
        select_agent_neighbors(
            snapshots,
            index,
            candidates.iter().filter_map(|e| index_map.get(e).copied()),
            config.neighbor_distance,
            config.max_neighbors,
            agent_neighbors,
        );

        let obstacle_range = config
            .obstacle_time_horizon
            .mul_add(agent.max_speed, agent.radius);
        obstacles.query_edges(agent.position, obstacle_range, obstacle_neighbors);

        results.push(solver.solve(
            agent,
            agent_neighbors.iter().map(|n| &snapshots[n.index]),
            &obstacles,
            obstacle_neighbors,
            config.time_horizon,
            config.obstacle_time_horizon,
            delta_time,
        ));
    }

    // Phase 3: commit.
    for (entity, new_velocity) in entities.iter().zip(results.iter()) {
        if let Ok((_, _, mut linear_velocity, _, _)) = agents.get_mut(*entity) {
            linear_velocity.0 = *new_velocity;
        }
    }
}

// === Plugin ===

pub(super) fn plugin(app: &mut App) {
    app.register_type::<PreferredVelocity>()
        .register_type::<AvoidanceAgent>()
        .register_type::<AvoidanceConfig>()
        .init_resource::<AvoidanceConfig>()
        .init_resource::<Obstacles>();

    let neighbor_distance = app.world().resource::<AvoidanceConfig>().neighbor_distance;
    app.insert_resource(SpatialHash::new(neighbor_distance));

    app.add_systems(
        Update,
        (rebuild_spatial_hash, compute_avoidance)
            .chain()
            .in_set(SimSet::Avoidance),
    );
}
