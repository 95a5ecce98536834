//! Crowd demo: agents on a circle swap to the opposite side around four blocks.

use std::f32::consts::TAU;

use bevy::camera::ScalingMode;
use orca_crowd::obstacles::ObstacleError;
use orca_crowd::prelude::*;
use orca_crowd::third_party::{self, agent_body};
use rand::Rng;

const AGENT_COUNT: usize = 64;
const AGENT_RADIUS: f32 = 2.0;
const AGENT_MAX_SPEED: f32 = 12.0;
const RING_RADIUS: f32 = 120.0;
/// Random offset applied to each start position.
const SPAWN_JITTER: f32 = 0.5;
/// World height kept visible regardless of window size.
const VIEW_HEIGHT: f32 = 2.0 * RING_RADIUS + 40.0;

const AGENT_COLOR: Color = Color::srgb(0.3, 0.7, 1.0);
const GOAL_COLOR: Color = Color::srgba(1.0, 1.0, 1.0, 0.15);
const OBSTACLE_COLOR: Color = Color::srgb(0.9, 0.5, 0.2);

fn main() {
    App::new()
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "ORCA Crowd".to_string(),
                resolution: (1280, 720).into(),
                resizable: true,
                ..default()
            }),
            ..default()
        }))
        .add_plugins((third_party::plugin, orca_crowd::plugin))
        .add_systems(Startup, (setup_obstacles, spawn_agents))
        .add_systems(Update, (draw_agents, draw_obstacles))
        .run();
}

/// Four blocks around the origin, leaving a cross-shaped corridor.
fn build_obstacles() -> Result<Obstacles, ObstacleError> {
    let mut builder = Obstacles::builder();
    for (x, y) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
        builder.add_shape(&ObstacleShape::Rect {
            center: Vec2::new(x, y) * 30.0,
            half_size: Vec2::splat(18.0),
        })?;
    }
    builder.add_shape(&ObstacleShape::Circle {
        center: Vec2::ZERO,
        radius: 4.0,
    })?;
    Ok(builder.build())
}

fn setup_obstacles(mut commands: Commands) {
    match build_obstacles() {
        Ok(obstacles) => commands.insert_resource(obstacles),
        Err(err) => error!("demo obstacles rejected, running without them: {err}"),
    }
}

fn spawn_agents(mut commands: Commands) {
    commands.spawn((
        Camera2d,
        Projection::Orthographic(OrthographicProjection {
            scaling_mode: ScalingMode::FixedVertical {
                viewport_height: VIEW_HEIGHT,
            },
            ..OrthographicProjection::default_2d()
        }),
    ));

    let mut rng = rand::rng();
    for i in 0..AGENT_COUNT {
        #[allow(clippy::cast_precision_loss)]
        let angle = TAU * i as f32 / AGENT_COUNT as f32;
        let start = RING_RADIUS * Vec2::from_angle(angle);
        let jitter = Vec2::new(
            rng.random_range(-SPAWN_JITTER..=SPAWN_JITTER),
            rng.random_range(-SPAWN_JITTER..=SPAWN_JITTER),
        );
        let position = start + jitter;

        commands.spawn((
            Name::new(format!("Agent {i}")),
            AvoidanceAgent {
                radius: AGENT_RADIUS,
                max_speed: AGENT_MAX_SPEED,
            },
            Goal(-start),
            Transform::from_translation(position.extend(0.0)),
            agent_body(AGENT_RADIUS),
        ));
    }
}

fn draw_agents(mut gizmos: Gizmos, agents: Query<(&GlobalTransform, &AvoidanceAgent, &Goal)>) {
    for (transform, agent, goal) in &agents {
        let position = transform.translation().xy();
        gizmos.circle_2d(position, agent.radius, AGENT_COLOR);
        gizmos.line_2d(position, goal.0, GOAL_COLOR);
    }
}

fn draw_obstacles(mut gizmos: Gizmos, obstacles: Res<Obstacles>) {
    for obstacle_loop in obstacles.loops() {
        let points = obstacles
            .loop_edges(obstacle_loop)
            .chain(obstacles.loop_edges(obstacle_loop).take(1))
            .map(|id| obstacles.edge(id).point);
        gizmos.linestrip_2d(points, OBSTACLE_COLOR);
    }
}
