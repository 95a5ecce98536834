//! ORCA crowd simulation library.
//!
//! The solver core ([`geometry`], [`obstacles`], [`avoidance`]) is plain math over
//! [`Vec2`](bevy::math::Vec2). [`plugin`] runs it every frame over all
//! [`AvoidanceAgent`](avoidance::AvoidanceAgent) entities.

pub mod avoidance;
pub mod geometry;
pub mod obstacles;
pub mod prelude;
pub mod steering;
pub mod third_party;
#[cfg(test)]
pub mod testing;

use bevy::prelude::*;

/// Per-frame simulation phases, run in this order in `Update`.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SimSet {
    /// Goals are turned into preferred velocities.
    Steering,
    /// Preferred velocities are turned into collision-free velocities.
    Avoidance,
}

/// Adds steering and avoidance. Position integration is left to the caller.
pub fn plugin(app: &mut App) {
    app.configure_sets(Update, (SimSet::Steering, SimSet::Avoidance).chain());
    app.add_plugins((steering::plugin, avoidance::plugin));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::avoidance::{AvoidanceConfig, SpatialHash};
    use crate::obstacles::Obstacles;
    use crate::steering::{SteeringConfig, SteeringRng};
    use crate::testing::create_test_app;
    use pretty_assertions::assert_eq;

    #[test]
    fn plugin_installs_resources() {
        let mut app = create_test_app();
        app.add_plugins(plugin);
        let world = app.world();
        assert!(world.contains_resource::<AvoidanceConfig>());
        assert!(world.contains_resource::<SteeringConfig>());
        assert!(world.contains_resource::<SteeringRng>());
        assert!(world.resource::<Obstacles>().is_empty());
        assert_eq!(
            world.resource::<SpatialHash>().cell_size(),
            AvoidanceConfig::default().neighbor_distance
        );
    }

    #[test]
    fn sim_sets_are_distinct() {
        assert_ne!(SimSet::Steering, SimSet::Avoidance);
    }
}
