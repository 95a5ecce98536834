//! Static obstacle edge graph, built once at load time and read by every agent solve.

mod shape;

pub use self::shape::{ObstacleShape, aabb_contains_point, bounds_of};

use bevy::math::bounding::{Aabb2d, IntersectsVolume};
use bevy::prelude::*;
use thiserror::Error;

use crate::geometry::{RVO_EPSILON, dist_sq_point_segment, left_of, signed_area};

// === Constants ===

/// Default number of polygon segments used to approximate circle obstacles.
pub const DEFAULT_CIRCLE_SEGMENTS: usize = 16;

/// Consecutive vertices closer than this (squared) are treated as coincident.
const MIN_EDGE_LENGTH_SQ: f32 = RVO_EPSILON;

// === Types ===

/// Index of an edge in an [`Obstacles`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Reflect)]
pub struct EdgeId(usize);

impl EdgeId {
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// One directed edge of an obstacle loop, starting at `point`.
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct ObstacleEdge {
    pub point: Vec2,
    /// Unit direction toward `next`'s point.
    pub direction: Vec2,
    pub next: EdgeId,
    pub prev: EdgeId,
    /// Whether the vertex at `point` is convex.
    pub is_convex: bool,
}

/// A closed loop of edges occupying a contiguous range of the arena.
#[derive(Debug, Clone, Copy)]
pub struct ObstacleLoop {
    pub first: usize,
    pub len: usize,
    pub bounds: Aabb2d,
}

/// An obstacle edge near an agent, as reported by [`Obstacles::query_edges`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObstacleNeighbor {
    /// Squared distance from the agent to the edge segment.
    pub dist_sq: f32,
    pub edge: EdgeId,
}

/// Errors raised while building the obstacle graph.
#[derive(Debug, Error, PartialEq)]
pub enum ObstacleError {
    #[error("obstacle loop needs at least 2 vertices, got {count}")]
    TooFewVertices { count: usize },
    #[error("obstacle vertex {index} is not finite: {vertex}")]
    NonFiniteVertex { index: usize, vertex: Vec2 },
    #[error("obstacle vertices {index} and {next} coincide")]
    CoincidentVertices { index: usize, next: usize },
    #[error("circle obstacle needs at least 3 segments, got {segments}")]
    TooFewSegments { segments: usize },
    #[error("obstacle extent must be positive and finite, got {extent}")]
    InvalidExtent { extent: f32 },
}

// === Resources ===

/// Flat arena of obstacle edges. `next`/`prev` are indices into the same arena.
/// Empty by default; insert a built graph to enable obstacle avoidance.
#[derive(Resource, Debug, Clone, Default)]
pub struct Obstacles {
    edges: Vec<ObstacleEdge>,
    loops: Vec<ObstacleLoop>,
}

impl Obstacles {
    #[must_use]
    pub fn builder() -> ObstaclesBuilder {
        ObstaclesBuilder::default()
    }

    /// Look up an edge. Ids only come from this arena, so the index is always valid.
    #[must_use]
    pub fn edge(&self, id: EdgeId) -> &ObstacleEdge {
        &self.edges[id.0]
    }

    pub fn edges(&self) -> impl Iterator<Item = (EdgeId, &ObstacleEdge)> {
        self.edges.iter().enumerate().map(|(i, e)| (EdgeId(i), e))
    }

    #[must_use]
    pub fn loops(&self) -> &[ObstacleLoop] {
        &self.loops
    }

    /// Edge ids of one loop, in winding order.
    pub fn loop_edges(&self, obstacle_loop: &ObstacleLoop) -> impl Iterator<Item = EdgeId> {
        (obstacle_loop.first..obstacle_loop.first + obstacle_loop.len).map(EdgeId)
    }

    /// Collect the edges within `range` of `position` that face it, nearest first.
    ///
    /// Only loops whose bounds overlap the query box are scanned. An edge is kept
    /// when `position` lies strictly on its outer (right) side, so edges seen
    /// from inside a polygon are culled. Ties are broken by edge id.
    pub fn query_edges(&self, position: Vec2, range: f32, out: &mut Vec<ObstacleNeighbor>) {
        out.clear();
        let range_sq = range * range;
        let query = Aabb2d::new(position, Vec2::splat(range));

        for obstacle_loop in self.loops.iter().filter(|l| l.bounds.intersects(&query)) {
            for id in self.loop_edges(obstacle_loop) {
                let edge = self.edge(id);
                let end = self.edge(edge.next).point;
                if left_of(edge.point, end, position) >= 0.0 {
                    continue;
                }
                let dist_sq = dist_sq_point_segment(edge.point, end, position);
                if dist_sq < range_sq {
                    out.push(ObstacleNeighbor { dist_sq, edge: id });
                }
            }
        }

        out.sort_by(|a, b| a.dist_sq.total_cmp(&b.dist_sq).then(a.edge.cmp(&b.edge)));
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}

// === Builder ===

/// Accumulates vertex loops and shapes into an [`Obstacles`] arena.
#[derive(Debug, Clone)]
pub struct ObstaclesBuilder {
    obstacles: Obstacles,
    circle_segments: usize,
}

impl Default for ObstaclesBuilder {
    fn default() -> Self {
        Self {
            obstacles: Obstacles::default(),
            circle_segments: DEFAULT_CIRCLE_SEGMENTS,
        }
    }
}

impl ObstaclesBuilder {
    /// Segment count for circles added after this call.
    #[must_use]
    pub fn with_circle_segments(mut self, segments: usize) -> Self {
        self.circle_segments = segments;
        self
    }

    /// Add a shape, converting it to a counter-clockwise loop.
    pub fn add_shape(&mut self, shape: &ObstacleShape) -> Result<&mut Self, ObstacleError> {
        match shape {
            ObstacleShape::Circle { radius, .. } => {
                check_extent(*radius)?;
                if self.circle_segments < 3 {
                    return Err(ObstacleError::TooFewSegments {
                        segments: self.circle_segments,
                    });
                }
            }
            ObstacleShape::Rect { half_size, .. }
            | ObstacleShape::OrientedRect { half_size, .. } => {
                check_extent(half_size.x)?;
                check_extent(half_size.y)?;
            }
            ObstacleShape::Polygon { .. } => {}
        }
        self.add_polygon(&shape.vertices(self.circle_segments))
    }

    /// Add a closed vertex loop. Two vertices form a line segment obstacle.
    ///
    /// Clockwise loops are reversed so every stored loop winds counter-clockwise
    /// around a solid interior. Error indices refer to `vertices` as given.
    pub fn add_polygon(&mut self, vertices: &[Vec2]) -> Result<&mut Self, ObstacleError> {
        let n = vertices.len();
        if n < 2 {
            return Err(ObstacleError::TooFewVertices { count: n });
        }
        if let Some((index, &vertex)) = vertices.iter().enumerate().find(|(_, v)| !v.is_finite())
        {
            return Err(ObstacleError::NonFiniteVertex { index, vertex });
        }
        for index in 0..n {
            let next = (index + 1) % n;
            if vertices[index].distance_squared(vertices[next]) <= MIN_EDGE_LENGTH_SQ {
                return Err(ObstacleError::CoincidentVertices { index, next });
            }
        }

        let mut vertices = vertices.to_vec();
        if signed_area(&vertices) < 0.0 {
            vertices.reverse();
        }

        let first = self.obstacles.edges.len();
        for i in 0..n {
            let next = (i + 1) % n;
            let prev = (i + n - 1) % n;
            let is_convex = n == 2
                || left_of(vertices[prev], vertices[i], vertices[next]) >= -RVO_EPSILON;

            self.obstacles.edges.push(ObstacleEdge {
                point: vertices[i],
                direction: (vertices[next] - vertices[i]).normalize_or_zero(),
                next: EdgeId(first + next),
                prev: EdgeId(first + prev),
                is_convex,
            });
        }
        self.obstacles.loops.push(ObstacleLoop {
            first,
            len: n,
            bounds: bounds_of(&vertices),
        });
        Ok(self)
    }

    #[must_use]
    pub fn build(self) -> Obstacles {
        debug!(
            "built obstacle graph: {} loops, {} edges",
            self.obstacles.loops.len(),
            self.obstacles.edges.len()
        );
        self.obstacles
    }
}

fn check_extent(extent: f32) -> Result<(), ObstacleError> {
    if extent.is_finite() && extent > 0.0 {
        Ok(())
    } else {
        Err(ObstacleError::InvalidExtent { extent })
    }
}
