//! Testing utilities for Bevy systems.

#![cfg(test)]

use std::time::Duration;

use avian2d::prelude::LinearVelocity;
use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;

use crate::avoidance::{AvoidanceAgent, PreferredVelocity};

/// Fixed frame length used by test apps.
pub const TEST_FRAME: Duration = Duration::from_millis(16);

/// Creates a minimal app whose clock advances by [`TEST_FRAME`] every update.
pub fn create_test_app() -> App {
    let mut app = App::new();
    app.add_plugins(MinimalPlugins);
    app.insert_resource(TimeUpdateStrategy::ManualDuration(TEST_FRAME));
    app
}

/// Helper to advance the app by one frame.
pub fn tick(app: &mut App) {
    app.update();
}

/// Spawn an agent with radius 1 and max speed 5, at rest.
///
/// Both transforms are set because `MinimalPlugins` does not propagate them.
pub fn spawn_test_agent(world: &mut World, position: Vec2, preferred: Vec2) -> Entity {
    let transform = Transform::from_translation(position.extend(0.0));
    world
        .spawn((
            AvoidanceAgent {
                radius: 1.0,
                max_speed: 5.0,
            },
            transform,
            GlobalTransform::from(transform),
            PreferredVelocity(preferred),
            LinearVelocity::ZERO,
        ))
        .id()
}
