//! Scoped mutation API handed to replicators while they step.
//!
//! Agents never hold a reference back to the world. Instead the scheduler
//! lends them this context, which owns every piece of shared mutable state a
//! step may touch: the grid, the RNG stream, the pending-removal queue and
//! the lineage birth counters.

use crate::agent::ReplicatorAgent;
use crate::grid::Grid;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use replicator_core::{AgentId, ChildPlacement, Direction, EnergyConfig, LineageId, Position};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::warn;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldContext {
    grid: Grid,
    rng: ChaCha8Rng,
    energy: EnergyConfig,
    placement: ChildPlacement,
    pending_removal: BTreeSet<AgentId>,
    lineage_births: BTreeMap<LineageId, u64>,
    newborns: Vec<(AgentId, ReplicatorAgent)>,
    next_agent_id: u64,
    births_this_tick: u64,
}

impl WorldContext {
    pub fn new(grid: Grid, rng: ChaCha8Rng, energy: EnergyConfig, placement: ChildPlacement) -> Self {
        Self {
            grid,
            rng,
            energy,
            placement,
            pending_removal: BTreeSet::new(),
            lineage_births: BTreeMap::new(),
            newborns: Vec::new(),
            next_agent_id: 0,
            births_this_tick: 0,
        }
    }

    pub fn rng(&mut self) -> &mut ChaCha8Rng {
        &mut self.rng
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn grid_mut(&mut self) -> &mut Grid {
        &mut self.grid
    }

    pub fn energy(&self) -> &EnergyConfig {
        &self.energy
    }

    /// Open a birth counter for a founder lineage.
    pub fn register_lineage(&mut self, lineage_id: LineageId) {
        self.lineage_births.entry(lineage_id).or_insert(0);
    }

    pub fn allocate_agent_id(&mut self) -> AgentId {
        let id = AgentId(self.next_agent_id);
        self.next_agent_id += 1;
        id
    }

    /// Id the next allocation will hand out
    pub fn peek_next_agent_id(&self) -> AgentId {
        AgentId(self.next_agent_id)
    }

    /// Step `id` one cell in `dir` and return the wrapped destination.
    pub fn move_agent(&mut self, id: AgentId, from: Position, dir: Direction) -> Position {
        let (dx, dy) = dir.to_delta();
        let to = from.add(dx, dy).wrap(self.grid.width, self.grid.height);
        self.grid.move_agent(id, from, to);
        to
    }

    /// Take up to `want` from the patch under `pos`.
    pub fn harvest(&mut self, pos: Position, want: f64) -> f64 {
        self.grid.patch_mut(pos).take(want)
    }

    pub fn flag_for_removal(&mut self, id: AgentId) {
        self.pending_removal.insert(id);
    }

    pub fn is_flagged(&self, id: AgentId) -> bool {
        self.pending_removal.contains(&id)
    }

    pub fn pending_removals(&self) -> usize {
        self.pending_removal.len()
    }

    /// Drain the removal queue, in ascending id order.
    pub fn take_pending_removals(&mut self) -> Vec<AgentId> {
        std::mem::take(&mut self.pending_removal).into_iter().collect()
    }

    pub fn register_birth(&mut self, lineage_id: LineageId) {
        match self.lineage_births.get_mut(&lineage_id) {
            Some(count) => {
                *count += 1;
                self.births_this_tick += 1;
            }
            None => warn!(
                event = "unknown_lineage_birth",
                lineage_id = %lineage_id,
                "Birth registered for a lineage that was never seeded"
            ),
        }
    }

    pub fn lineage_births(&self) -> &BTreeMap<LineageId, u64> {
        &self.lineage_births
    }

    pub fn births_this_tick(&self) -> u64 {
        self.births_this_tick
    }

    pub fn begin_tick(&mut self) {
        self.births_this_tick = 0;
    }

    /// Choose the cell a child of a replicator at `parent` is born into.
    pub fn pick_child_cell(&mut self, parent: Position) -> Position {
        let mut neighbors = parent.moore_neighborhood(false, self.grid.width, self.grid.height);
        neighbors.shuffle(&mut self.rng);

        let chosen = match self.placement {
            ChildPlacement::RandomNeighbor => neighbors.first().copied(),
            ChildPlacement::PreferEmpty => neighbors
                .iter()
                .copied()
                .find(|pos| !self.grid.has_occupants(*pos))
                .or_else(|| neighbors.first().copied()),
        };
        chosen.unwrap_or(parent)
    }

    /// Place a newborn on the grid and queue it for insertion into the
    /// population once the parent's step returns.
    pub fn spawn_child(&mut self, child: ReplicatorAgent) -> AgentId {
        let id = self.allocate_agent_id();
        self.grid.place_agent(id, child.position);
        self.newborns.push((id, child));
        id
    }

    pub fn take_newborns(&mut self) -> Vec<(AgentId, ReplicatorAgent)> {
        std::mem::take(&mut self.newborns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patch::ResourcePatch;
    use rand::SeedableRng;

    fn context(placement: ChildPlacement) -> WorldContext {
        WorldContext::new(
            Grid::new(5, 5, ResourcePatch::new(10.0, 0.1, 5.0)).unwrap(),
            ChaCha8Rng::seed_from_u64(8),
            EnergyConfig::default(),
            placement,
        )
    }

    #[test]
    fn test_ids_are_monotonic() {
        let mut ctx = context(ChildPlacement::RandomNeighbor);
        assert_eq!(ctx.allocate_agent_id(), AgentId(0));
        assert_eq!(ctx.allocate_agent_id(), AgentId(1));
    }

    #[test]
    fn test_move_wraps_and_updates_occupancy() {
        let mut ctx = context(ChildPlacement::RandomNeighbor);
        let start = Position::new(0, 0);
        ctx.grid_mut().place_agent(AgentId(4), start);

        let to = ctx.move_agent(AgentId(4), start, Direction::NorthWest);
        assert_eq!(to, Position::new(4, 4));
        assert!(!ctx.grid().has_occupants(start));
        assert_eq!(ctx.grid().occupants(to), &[AgentId(4)]);
    }

    #[test]
    fn test_births_only_count_for_known_lineages() {
        let mut ctx = context(ChildPlacement::RandomNeighbor);
        ctx.register_lineage(LineageId(0));
        ctx.register_birth(LineageId(0));
        ctx.register_birth(LineageId(0));
        ctx.register_birth(LineageId(9));

        assert_eq!(ctx.lineage_births().get(&LineageId(0)), Some(&2));
        assert!(!ctx.lineage_births().contains_key(&LineageId(9)));
        assert_eq!(ctx.births_this_tick(), 2);

        ctx.begin_tick();
        assert_eq!(ctx.births_this_tick(), 0);
    }

    #[test]
    fn test_removal_queue_drains() {
        let mut ctx = context(ChildPlacement::RandomNeighbor);
        ctx.flag_for_removal(AgentId(3));
        ctx.flag_for_removal(AgentId(1));
        ctx.flag_for_removal(AgentId(3));
        assert!(ctx.is_flagged(AgentId(3)));
        assert_eq!(ctx.pending_removals(), 2);

        assert_eq!(ctx.take_pending_removals(), vec![AgentId(1), AgentId(3)]);
        assert_eq!(ctx.pending_removals(), 0);
    }

    #[test]
    fn test_child_cell_is_a_neighbor() {
        let mut ctx = context(ChildPlacement::RandomNeighbor);
        let parent = Position::new(2, 2);
        let neighbors = parent.moore_neighborhood(false, 5, 5);
        for _ in 0..50 {
            let cell = ctx.pick_child_cell(parent);
            assert!(neighbors.contains(&cell));
        }
    }

    #[test]
    fn test_prefer_empty_skips_occupied_cells() {
        let mut ctx = context(ChildPlacement::PreferEmpty);
        let parent = Position::new(2, 2);
        let free = Position::new(3, 3);
        for (i, pos) in parent.moore_neighborhood(false, 5, 5).into_iter().enumerate() {
            if pos != free {
                ctx.grid_mut().place_agent(AgentId(i as u64 + 100), pos);
            }
        }
        for _ in 0..20 {
            assert_eq!(ctx.pick_child_cell(parent), free);
        }
    }
}
