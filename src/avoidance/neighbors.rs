//! Exact neighbour selection on top of the broad-phase candidates.

use super::orca::AgentSnapshot;

/// A nearby agent, identified by its index in the tick's snapshot list.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AgentNeighbor {
    pub dist_sq: f32,
    pub index: usize,
}

/// Keep the closest `max_neighbors` candidates strictly within `range` of agent
/// `agent_index`.
///
/// The agent itself, duplicates and non-finite agents are dropped. Results are
/// ordered by distance, then by index, so equal inputs give equal outputs.
pub fn select_agent_neighbors(
    snapshots: &[AgentSnapshot],
    agent_index: usize,
    candidates: impl IntoIterator<Item = usize>,
    range: f32,
    max_neighbors: usize,
    out: &mut Vec<AgentNeighbor>,
) {
    out.clear();
    let position = snapshots[agent_index].position;
    let range_sq = range * range;

    out.extend(
        candidates
            .into_iter()
            .filter(|&index| index != agent_index)
            .filter_map(|index| {
                let other = snapshots.get(index)?;
                if !other.is_finite() {
                    return None;
                }
                let dist_sq = position.distance_squared(other.position);
                (dist_sq < range_sq).then_some(AgentNeighbor { dist_sq, index })
            }),
    );

    out.sort_by(|a, b| a.dist_sq.total_cmp(&b.dist_sq).then(a.index.cmp(&b.index)));
    out.dedup_by_key(|n| n.index);
    out.truncate(max_neighbors);
}

#[cfg(test)]
mod tests {
    use bevy::math::Vec2;

    use super::*;
    use pretty_assertions::assert_eq;

    fn at(x: f32, y: f32) -> AgentSnapshot {
        AgentSnapshot {
            position: Vec2::new(x, y),
            velocity: Vec2::ZERO,
            preferred: Vec2::ZERO,
            radius: 1.0,
            max_speed: 1.0,
        }
    }

    fn indices(out: &[AgentNeighbor]) -> Vec<usize> {
        out.iter().map(|n| n.index).collect()
    }

    #[test]
    fn sorts_by_distance_and_excludes_self() {
        let snapshots = [at(0.0, 0.0), at(5.0, 0.0), at(2.0, 0.0), at(0.0, -3.0)];
        let mut out = Vec::new();
        select_agent_neighbors(&snapshots, 0, 0..4, 10.0, 10, &mut out);
        assert_eq!(indices(&out), vec![2, 3, 1]);
        assert_eq!(out[0].dist_sq, 4.0);
    }

    #[test]
    fn range_is_exclusive() {
        let snapshots = [at(0.0, 0.0), at(10.0, 0.0), at(9.0, 0.0)];
        let mut out = Vec::new();
        select_agent_neighbors(&snapshots, 0, 0..3, 10.0, 10, &mut out);
        assert_eq!(indices(&out), vec![2]);
    }

    #[test]
    fn truncates_to_closest_and_breaks_ties_by_index() {
        let snapshots = [
            at(0.0, 0.0),
            at(0.0, 3.0),
            at(3.0, 0.0),
            at(-3.0, 0.0),
            at(1.0, 0.0),
        ];
        let mut out = Vec::new();
        select_agent_neighbors(&snapshots, 0, [3, 2, 1, 4], 10.0, 3, &mut out);
        assert_eq!(indices(&out), vec![4, 1, 2]);
    }

    #[test]
    fn drops_duplicates_and_non_finite_agents() {
        let snapshots = [at(0.0, 0.0), at(1.0, 0.0), at(f32::NAN, 0.0)];
        let mut out = Vec::new();
        select_agent_neighbors(&snapshots, 0, [1, 2, 1, 7], 10.0, 10, &mut out);
        assert_eq!(indices(&out), vec![1]);
    }
}
