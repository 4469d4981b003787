//! 2D grid for the world.

use crate::patch::ResourcePatch;
use replicator_core::{grid_cell_count, AgentId, Error, Position, Result};
use serde::{Deserialize, Serialize};

/// A 2D toroidal grid holding one resource patch per cell and any number of
/// replicators per cell.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Grid {
    pub width: i32,
    pub height: i32,
    patches: Vec<ResourcePatch>,
    occupants: Vec<Vec<AgentId>>,
}

impl Grid {
    /// Fill every cell with a copy of `patch`.
    pub fn new(width: i32, height: i32, patch: ResourcePatch) -> Result<Self> {
        let size = grid_cell_count(width, height)?;
        Ok(Self {
            width,
            height,
            patches: vec![patch; size],
            occupants: vec![Vec::new(); size],
        })
    }

    /// Check that the cell vectors match the declared dimensions.
    pub fn check_shape(&self) -> Result<()> {
        let expected = grid_cell_count(self.width, self.height)
            .map_err(|e| Error::InvalidState(format!("grid: {}", e)))?;
        if self.patches.len() != expected || self.occupants.len() != expected {
            return Err(Error::InvalidState(format!(
                "grid {}x{} holds {} patches and {} occupant lists",
                self.width,
                self.height,
                self.patches.len(),
                self.occupants.len()
            )));
        }
        Ok(())
    }

    /// Total number of occupant entries across all cells
    pub fn occupant_count(&self) -> usize {
        self.occupants.iter().map(|cell| cell.len()).sum()
    }

    pub fn cell_count(&self) -> usize {
        self.patches.len()
    }

    /// Get the patch at position (with toroidal wrapping)
    pub fn patch(&self, pos: Position) -> &ResourcePatch {
        let index = self.pos_to_index(pos);
        &self.patches[index]
    }

    /// Get mutable patch at position
    pub fn patch_mut(&mut self, pos: Position) -> &mut ResourcePatch {
        let index = self.pos_to_index(pos);
        &mut self.patches[index]
    }

    /// Get mutable patch by cell index
    pub fn patch_at_index_mut(&mut self, index: usize) -> &mut ResourcePatch {
        &mut self.patches[index]
    }

    /// Replicators currently on the cell, in arrival order
    pub fn occupants(&self, pos: Position) -> &[AgentId] {
        let index = self.pos_to_index(pos);
        &self.occupants[index]
    }

    pub fn has_occupants(&self, pos: Position) -> bool {
        !self.occupants(pos).is_empty()
    }

    pub fn place_agent(&mut self, id: AgentId, pos: Position) {
        let index = self.pos_to_index(pos);
        self.occupants[index].push(id);
    }

    pub fn remove_agent(&mut self, id: AgentId, pos: Position) {
        let index = self.pos_to_index(pos);
        self.occupants[index].retain(|occupant| *occupant != id);
    }

    pub fn move_agent(&mut self, id: AgentId, from: Position, to: Position) {
        if from.wrap(self.width, self.height) == to.wrap(self.width, self.height) {
            return;
        }
        self.remove_agent(id, from);
        self.place_agent(id, to);
    }

    fn pos_to_index(&self, pos: Position) -> usize {
        let wrapped = pos.wrap(self.width, self.height);
        (wrapped.y * self.width + wrapped.x) as usize
    }

    /// Get position from index
    pub fn index_to_pos(&self, index: usize) -> Position {
        let x = (index as i32) % self.width;
        let y = (index as i32) / self.width;
        Position::new(x, y)
    }

    /// Iterator over all patches with positions
    pub fn patches(&self) -> impl Iterator<Item = (Position, &ResourcePatch)> + '_ {
        self.patches
            .iter()
            .enumerate()
            .map(move |(i, patch)| (self.index_to_pos(i), patch))
    }

    /// Total resource standing on the grid
    pub fn total_resource(&self) -> f64 {
        self.patches.iter().map(|p| p.amount()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> Grid {
        Grid::new(10, 10, ResourcePatch::new(10.0, 0.1, 5.0)).unwrap()
    }

    #[test]
    fn test_grid_creation() {
        let grid = grid();
        assert_eq!(grid.width, 10);
        assert_eq!(grid.height, 10);
        assert_eq!(grid.cell_count(), 100);
        assert!((grid.total_resource() - 500.0).abs() < 1e-9);
    }

    #[test]
    fn test_rejects_oversized_grid() {
        let patch = ResourcePatch::new(10.0, 0.1, 5.0);
        assert!(matches!(Grid::new(50_000, 50_000, patch.clone()), Err(Error::InvalidConfig(_))));
        assert!(Grid::new(0, 10, patch).is_err());
    }

    #[test]
    fn test_check_shape_catches_mismatch() {
        let mut grid = grid();
        assert!(grid.check_shape().is_ok());

        grid.width = 11;
        assert!(matches!(grid.check_shape(), Err(Error::InvalidState(_))));
        grid.width = 0;
        assert!(matches!(grid.check_shape(), Err(Error::InvalidState(_))));
    }

    #[test]
    fn test_toroidal_wrapping() {
        let mut grid = grid();
        grid.patch_mut(Position::new(9, 9)).take(2.0);

        // (-1, -1) wraps to (9, 9)
        assert_eq!(grid.patch(Position::new(-1, -1)).amount(), 3.0);
        // (10, 10) wraps to (0, 0)
        assert_eq!(grid.patch(Position::new(10, 10)).amount(), 5.0);
    }

    #[test]
    fn test_index_round_trip() {
        let grid = grid();
        for (i, (pos, _)) in grid.patches().enumerate() {
            assert_eq!(grid.pos_to_index(pos), i);
        }
    }

    #[test]
    fn test_cells_hold_many_agents() {
        let mut grid = grid();
        let pos = Position::new(3, 4);
        grid.place_agent(AgentId(1), pos);
        grid.place_agent(AgentId(2), pos);
        assert_eq!(grid.occupants(pos), &[AgentId(1), AgentId(2)]);

        grid.move_agent(AgentId(1), pos, Position::new(4, 4));
        assert_eq!(grid.occupants(pos), &[AgentId(2)]);
        assert_eq!(grid.occupants(Position::new(4, 4)), &[AgentId(1)]);

        grid.remove_agent(AgentId(2), pos);
        assert!(!grid.has_occupants(pos));
    }

    #[test]
    fn test_move_in_place_keeps_order() {
        let mut grid = grid();
        let pos = Position::new(0, 0);
        grid.place_agent(AgentId(1), pos);
        grid.place_agent(AgentId(2), pos);
        grid.move_agent(AgentId(1), pos, Position::new(10, 0));
        assert_eq!(grid.occupants(pos), &[AgentId(1), AgentId(2)]);
    }
}
