//! Uniform-grid broad phase for agent neighbour queries.

use bevy::prelude::*;
use std::collections::HashMap;

/// Buckets agents by grid cell. Rebuilt every frame from agent positions.
#[derive(Resource, Debug)]
pub struct SpatialHash {
    cell_size: f32,
    cells: HashMap<(i32, i32), Vec<Entity>>,
}

impl SpatialHash {
    /// `cell_size` is normally the neighbour distance, so a query touches a 3x3 block.
    #[must_use]
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size: cell_size.max(f32::EPSILON),
            cells: HashMap::new(),
        }
    }

    #[must_use]
    pub const fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Empty every bucket, keeping their allocations.
    pub fn clear(&mut self) {
        for bucket in self.cells.values_mut() {
            bucket.clear();
        }
    }

    /// Insert an entity at a world position. Non-finite positions are ignored,
    /// which keeps faulted agents out of everyone's candidate list.
    pub fn insert(&mut self, entity: Entity, position: Vec2) {
        if !position.is_finite() {
            return;
        }
        let coords = self.cell_coords(position);
        self.cells.entry(coords).or_default().push(entity);
    }

    /// Collect every entity in the cells overlapping the square of half-width
    /// `radius` around `position`. Candidates still need an exact distance check.
    pub fn query_neighbors(&self, position: Vec2, radius: f32, out: &mut Vec<Entity>) {
        out.clear();
        if !position.is_finite() {
            return;
        }
        let min = self.cell_coords(position - Vec2::splat(radius));
        let max = self.cell_coords(position + Vec2::splat(radius));
        for x in min.0..=max.0 {
            for y in min.1..=max.1 {
                if let Some(entities) = self.cells.get(&(x, y)) {
                    out.extend(entities);
                }
            }
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    fn cell_coords(&self, position: Vec2) -> (i32, i32) {
        (
            (position.x / self.cell_size).floor() as i32,
            (position.y / self.cell_size).floor() as i32,
        )
    }
}
