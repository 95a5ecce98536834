//! Multi-tick crowd scenarios driven through the public plugin.

mod crowd;
mod walls;

use std::time::Duration;

use avian2d::prelude::LinearVelocity;
use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use orca_crowd::SimSet;
use orca_crowd::avoidance::AvoidanceAgent;
use orca_crowd::obstacles::Obstacles;
use orca_crowd::steering::Goal;

pub const FRAME: Duration = Duration::from_micros(16_667);
pub const RADIUS: f32 = 1.0;
pub const MAX_SPEED: f32 = 5.0;

/// App with the crowd plugin and a plain Euler integrator standing in for physics.
pub fn create_crowd_app(obstacles: Obstacles) -> App {
    let mut app = App::new();
    app.add_plugins(MinimalPlugins);
    app.insert_resource(TimeUpdateStrategy::ManualDuration(FRAME));
    app.add_plugins(orca_crowd::plugin);
    app.insert_resource(obstacles);
    app.add_systems(Update, integrate.after(SimSet::Avoidance));
    app
}

fn integrate(
    time: Res<Time>,
    mut agents: Query<(&LinearVelocity, &mut Transform, &mut GlobalTransform)>,
) {
    let dt = time.delta_secs();
    for (velocity, mut transform, mut global) in &mut agents {
        transform.translation += (velocity.0 * dt).extend(0.0);
        *global = GlobalTransform::from(*transform);
    }
}

pub fn spawn_agent(app: &mut App, position: Vec2, goal: Vec2) -> Entity {
    let transform = Transform::from_translation(position.extend(0.0));
    app.world_mut()
        .spawn((
            AvoidanceAgent {
                radius: RADIUS,
                max_speed: MAX_SPEED,
            },
            Goal(goal),
            transform,
            GlobalTransform::from(transform),
        ))
        .id()
}

pub fn position(app: &App, entity: Entity) -> Vec2 {
    app.world()
        .get::<GlobalTransform>(entity)
        .unwrap()
        .translation()
        .xy()
}
