//! Agents crossing through each other.

use std::f32::consts::TAU;

use bevy::prelude::*;
use orca_crowd::obstacles::Obstacles;
use pretty_assertions::assert_eq;

use super::{RADIUS, create_crowd_app, position, spawn_agent};

const RING: f32 = 20.0;
const AGENTS: usize = 8;

fn circle_swap() -> (App, Vec<(Entity, Vec2)>) {
    let mut app = create_crowd_app(Obstacles::default());
    let agents = (0..AGENTS)
        .map(|i| {
            #[allow(clippy::cast_precision_loss)]
            let start = RING * Vec2::from_angle(TAU * i as f32 / AGENTS as f32);
            (spawn_agent(&mut app, start, -start), -start)
        })
        .collect();
    (app, agents)
}

fn min_separation(app: &App, agents: &[(Entity, Vec2)]) -> f32 {
    let positions: Vec<Vec2> = agents.iter().map(|(e, _)| position(app, *e)).collect();
    let mut min = f32::MAX;
    for (i, a) in positions.iter().enumerate() {
        for b in &positions[i + 1..] {
            min = min.min(a.distance(*b));
        }
    }
    min
}

#[test]
fn circle_swap_keeps_agents_apart() {
    let (mut app, agents) = circle_swap();

    for frame in 0..900 {
        app.update();
        let separation = min_separation(&app, &agents);
        assert!(
            separation >= 2.0 * RADIUS * 0.8,
            "agents overlapped at frame {frame}: {separation}"
        );
    }
}

#[test]
fn circle_swap_makes_progress() {
    let (mut app, agents) = circle_swap();
    for _ in 0..1200 {
        app.update();
    }
    for (entity, goal) in &agents {
        let remaining = position(&app, *entity).distance(*goal);
        assert!(
            remaining < RING,
            "agent {entity} still {remaining} from its goal"
        );
    }
}

#[test]
fn circle_swap_is_deterministic() {
    let (mut first, first_agents) = circle_swap();
    let (mut second, second_agents) = circle_swap();
    for _ in 0..300 {
        first.update();
        second.update();
    }
    let a: Vec<Vec2> = first_agents.iter().map(|(e, _)| position(&first, *e)).collect();
    let b: Vec<Vec2> = second_agents
        .iter()
        .map(|(e, _)| position(&second, *e))
        .collect();
    assert_eq!(a, b);
}
