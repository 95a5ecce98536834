//! Static obstacle shapes and their bounding-box capabilities.

use std::f32::consts::{PI, TAU};

use bevy::math::bounding::{Aabb2d, IntersectsVolume};
use bevy::prelude::*;

/// A static obstacle outline. Every variant converts to a counter-clockwise vertex loop
/// (solid inside, agents outside).
#[derive(Debug, Clone, PartialEq, Reflect)]
pub enum ObstacleShape {
    /// Approximated by a regular polygon that circumscribes the circle.
    Circle { center: Vec2, radius: f32 },
    /// Axis-aligned rectangle.
    Rect { center: Vec2, half_size: Vec2 },
    /// Rectangle rotated by `rotation` radians (counter-clockwise) about its center.
    OrientedRect {
        center: Vec2,
        half_size: Vec2,
        rotation: f32,
    },
    /// Arbitrary loop, used as given. Must be wound counter-clockwise to keep agents out.
    Polygon { vertices: Vec<Vec2> },
}

impl ObstacleShape {
    /// Axis-aligned bounds of the shape.
    #[must_use]
    pub fn aabb(&self) -> Aabb2d {
        match self {
            Self::Circle { center, radius } => Aabb2d::new(*center, Vec2::splat(*radius)),
            Self::Rect { center, half_size } => Aabb2d::new(*center, *half_size),
            Self::OrientedRect {
                center,
                half_size,
                rotation,
            } => {
                let rot = Vec2::from_angle(*rotation);
                let x = rot.rotate(Vec2::new(half_size.x, 0.0)).abs();
                let y = rot.rotate(Vec2::new(0.0, half_size.y)).abs();
                Aabb2d::new(*center, x + y)
            }
            Self::Polygon { vertices } => bounds_of(vertices),
        }
    }

    /// Whether `point` lies inside the shape's bounding box.
    #[must_use]
    pub fn bounds_contain(&self, point: Vec2) -> bool {
        aabb_contains_point(&self.aabb(), point)
    }

    /// Whether the shape's bounding box overlaps `other`.
    #[must_use]
    pub fn bounds_intersect(&self, other: &Aabb2d) -> bool {
        self.aabb().intersects(other)
    }

    /// Vertex loop for this shape. Circles use `circle_segments` vertices.
    #[must_use]
    pub fn vertices(&self, circle_segments: usize) -> Vec<Vec2> {
        match self {
            Self::Circle { center, radius } => {
                #[allow(clippy::cast_precision_loss)]
                let step = TAU / circle_segments as f32;
                #[allow(clippy::cast_precision_loss)]
                let circumradius = radius / (PI / circle_segments as f32).cos();
                (0..circle_segments)
                    .map(|k| {
                        #[allow(clippy::cast_precision_loss)]
                        let angle = step * k as f32;
                        *center + circumradius * Vec2::from_angle(angle)
                    })
                    .collect()
            }
            Self::Rect { center, half_size } => rect_corners(*half_size)
                .into_iter()
                .map(|corner| *center + corner)
                .collect(),
            Self::OrientedRect {
                center,
                half_size,
                rotation,
            } => {
                let rot = Vec2::from_angle(*rotation);
                rect_corners(*half_size)
                    .into_iter()
                    .map(|corner| *center + rot.rotate(corner))
                    .collect()
            }
            Self::Polygon { vertices } => vertices.clone(),
        }
    }
}

/// Rectangle corners around the origin, counter-clockwise from bottom-left.
const fn rect_corners(half_size: Vec2) -> [Vec2; 4] {
    [
        Vec2::new(-half_size.x, -half_size.y),
        Vec2::new(half_size.x, -half_size.y),
        Vec2::new(half_size.x, half_size.y),
        Vec2::new(-half_size.x, half_size.y),
    ]
}

/// Tight bounds of a point set. An empty set yields a zero-sized box at the origin.
#[must_use]
pub fn bounds_of(points: &[Vec2]) -> Aabb2d {
    let Some(&first) = points.first() else {
        return Aabb2d::new(Vec2::ZERO, Vec2::ZERO);
    };
    let (min, max) = points
        .iter()
        .fold((first, first), |(min, max), &p| (min.min(p), max.max(p)));
    Aabb2d { min, max }
}

/// Point-in-box test (boundary inclusive).
#[must_use]
pub fn aabb_contains_point(aabb: &Aabb2d, point: Vec2) -> bool {
    point.cmpge(aabb.min).all() && point.cmple(aabb.max).all()
}
