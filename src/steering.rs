//! Goal seeking: turns each agent's goal into a preferred velocity.

use std::f32::consts::TAU;

use bevy::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::SimSet;
use crate::avoidance::{AvoidanceAgent, PreferredVelocity};

// === Constants ===

/// Distance at which an agent counts as having reached its goal.
const DEFAULT_ARRIVAL_DISTANCE: f32 = 1.0;
/// Magnitude of the random nudge added to moving agents' preferred velocity.
const DEFAULT_PERTURBATION: f32 = 1e-4;
const DEFAULT_SEED: u64 = 0x5eed;

// === Components ===

/// World position the agent is heading for.
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct Goal(pub Vec2);

// === Resources ===

#[derive(Resource, Debug, Clone, Reflect)]
#[reflect(Resource)]
pub struct SteeringConfig {
    pub arrival_distance: f32,
    /// Perfectly symmetric crowds can deadlock. A tiny random offset breaks the tie.
    /// Zero disables it.
    pub perturbation: f32,
    /// Seed for [`SteeringRng`] when the plugin is added.
    pub seed: u64,
}

impl Default for SteeringConfig {
    fn default() -> Self {
        Self {
            arrival_distance: DEFAULT_ARRIVAL_DISTANCE,
            perturbation: DEFAULT_PERTURBATION,
            seed: DEFAULT_SEED,
        }
    }
}

/// Seeded generator for the steering perturbation, so runs are reproducible.
#[derive(Resource, Debug, Clone)]
pub struct SteeringRng(pub StdRng);

impl SteeringRng {
    #[must_use]
    pub fn from_seed(seed: u64) -> Self {
        Self(StdRng::seed_from_u64(seed))
    }
}

// === Helpers ===

/// Velocity from `position` toward `goal`, capped at `max_speed`.
///
/// Within one second of travel the speed drops so the agent does not overshoot.
/// Zero once the goal is within `arrival_distance`.
#[must_use]
pub fn preferred_velocity_toward(
    position: Vec2,
    goal: Vec2,
    max_speed: f32,
    arrival_distance: f32,
) -> Vec2 {
    let to_goal = goal - position;
    if to_goal.length_squared() <= arrival_distance * arrival_distance {
        return Vec2::ZERO;
    }
    to_goal.clamp_length_max(max_speed)
}

// === Systems ===

/// Sets `PreferredVelocity` toward each agent's `Goal`.
///
/// Runs in `SimSet::Steering`, before avoidance reads the result.
pub fn steer_toward_goals(
    config: Res<SteeringConfig>,
    mut rng: ResMut<SteeringRng>,
    mut agents: Query<(&GlobalTransform, &Goal, &AvoidanceAgent, &mut PreferredVelocity)>,
) {
    for (transform, goal, agent, mut preferred) in &mut agents {
        let mut velocity = preferred_velocity_toward(
            transform.translation().xy(),
            goal.0,
            agent.max_speed,
            config.arrival_distance,
        );

        if config.perturbation > 0.0 && velocity != Vec2::ZERO {
            let angle = rng.0.random::<f32>() * TAU;
            let distance = rng.0.random::<f32>() * config.perturbation;
            velocity += distance * Vec2::from_angle(angle);
        }

        preferred.0 = velocity;
    }
}

// === Plugin ===

pub(super) fn plugin(app: &mut App) {
    app.register_type::<Goal>()
        .register_type::<SteeringConfig>()
        .init_resource::<SteeringConfig>();

    let seed = app.world().resource::<SteeringConfig>().seed;
    app.insert_resource(SteeringRng::from_seed(seed));

    app.add_systems(Update, steer_toward_goals.in_set(SimSet::Steering));
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn far_goal_gives_full_speed_toward_it() {
        let v = preferred_velocity_toward(Vec2::ZERO, Vec2::new(100.0, 0.0), 5.0, 1.0);
        assert_eq!(v, Vec2::new(5.0, 0.0));
    }

    #[test]
    fn near_goal_slows_down() {
        let v = preferred_velocity_toward(Vec2::ZERO, Vec2::new(0.0, 3.0), 5.0, 1.0);
        assert_eq!(v, Vec2::new(0.0, 3.0));
    }

    #[test]
    fn arrived_agent_stops() {
        let v = preferred_velocity_toward(Vec2::new(10.0, 10.0), Vec2::new(10.5, 10.0), 5.0, 1.0);
        assert_eq!(v, Vec2::ZERO);
    }

    #[test]
    fn same_seed_same_sequence() {
        let mut a = SteeringRng::from_seed(3);
        let mut b = SteeringRng::from_seed(3);
        let xs: Vec<f32> = (0..4).map(|_| a.0.random()).collect();
        let ys: Vec<f32> = (0..4).map(|_| b.0.random()).collect();
        assert_eq!(xs, ys);
    }
}
