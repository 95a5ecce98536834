//! Avian2d physics configuration for a top-down crowd.

use avian2d::prelude::*;
use bevy::prelude::*;

/// Typical agent diameter in world units, used to scale physics tolerances.
const LENGTH_UNIT: f32 = 2.0;

// === Helpers ===

/// Physics components for an avoidance agent.
///
/// Kinematic bodies move exactly by their `LinearVelocity`, which is what the
/// avoidance solver writes; contacts never push them off the solved path.
#[must_use]
pub fn agent_body(radius: f32) -> impl Bundle {
    (
        RigidBody::Kinematic,
        Collider::circle(radius),
        LockedAxes::ROTATION_LOCKED,
        LinearVelocity::ZERO,
    )
}

// === Plugin ===

pub(super) fn plugin(app: &mut App) {
    app.add_plugins(PhysicsPlugins::default().with_length_unit(LENGTH_UNIT));
    app.insert_resource(Gravity::ZERO);
}
