//! Agents pushing against static obstacles.

use bevy::prelude::*;
use orca_crowd::geometry::dist_sq_point_segment;
use orca_crowd::obstacles::{ObstacleShape, Obstacles};

use super::{RADIUS, create_crowd_app, position, spawn_agent};

const HALF_SIZE: Vec2 = Vec2::new(10.0, 2.0);

fn wall() -> Obstacles {
    let mut builder = Obstacles::builder();
    builder
        .add_shape(&ObstacleShape::Rect {
            center: Vec2::ZERO,
            half_size: HALF_SIZE,
        })
        .unwrap();
    builder.build()
}

/// Distance from `point` to the wall outline, negative inside.
fn clearance(obstacles: &Obstacles, point: Vec2) -> f32 {
    let outline = obstacles
        .edges()
        .map(|(_, e)| dist_sq_point_segment(e.point, obstacles.edge(e.next).point, point))
        .fold(f32::MAX, f32::min)
        .sqrt();
    if point.abs().cmplt(HALF_SIZE).all() {
        -outline
    } else {
        outline
    }
}

#[test]
fn agent_does_not_walk_through_wall() {
    let obstacles = wall();
    let mut app = create_crowd_app(obstacles.clone());
    let agent = spawn_agent(&mut app, Vec2::new(0.5, -10.0), Vec2::new(0.5, 10.0));

    for frame in 0..600 {
        app.update();
        let gap = clearance(&obstacles, position(&app, agent));
        assert!(
            gap >= RADIUS * 0.9,
            "agent reached the wall at frame {frame}: clearance {gap}"
        );
    }
}

#[test]
fn agents_slide_along_wall_without_entering() {
    let obstacles = wall();
    let mut app = create_crowd_app(obstacles.clone());
    let agents = [
        spawn_agent(&mut app, Vec2::new(-4.0, -6.0), Vec2::new(20.0, 6.0)),
        spawn_agent(&mut app, Vec2::new(4.0, 6.0), Vec2::new(-20.0, -6.0)),
    ];

    for _ in 0..900 {
        app.update();
        for agent in agents {
            assert!(clearance(&obstacles, position(&app, agent)) >= RADIUS * 0.9);
        }
    }
}
