//! Checkpoint and restore of a whole world, RNG state included.

use crate::world::World;
use replicator_core::{Error, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

const CHECKPOINT_VERSION: u32 = 1;

#[derive(Serialize)]
struct CheckpointRef<'a> {
    version: u32,
    tick: u64,
    world: &'a World,
}

#[derive(Deserialize)]
struct Checkpoint {
    version: u32,
    tick: u64,
    world: World,
}

impl World {
    /// Serialize the full world so a run can be resumed bit-for-bit.
    pub fn checkpoint(&self) -> Result<Vec<u8>> {
        let checkpoint = CheckpointRef {
            version: CHECKPOINT_VERSION,
            tick: self.tick(),
            world: self,
        };
        let bytes = bincode::serialize(&checkpoint)
            .map_err(|e| Error::Serialization(format!("Failed to serialize checkpoint: {}", e)))?;

        info!(event = "checkpoint_created", tick = self.tick(), bytes = bytes.len(), "Checkpoint created");
        Ok(bytes)
    }

    pub fn restore(bytes: &[u8]) -> Result<World> {
        let checkpoint: Checkpoint = bincode::deserialize(bytes)?;
        if checkpoint.version != CHECKPOINT_VERSION {
            return Err(Error::InvalidState(format!(
                "unsupported checkpoint version {}",
                checkpoint.version
            )));
        }
        if checkpoint.tick != checkpoint.world.tick() {
            return Err(Error::InvalidState(format!(
                "checkpoint header says tick {} but world is at tick {}",
                checkpoint.tick,
                checkpoint.world.tick()
            )));
        }

        checkpoint.world.check_consistency()?;

        info!(event = "checkpoint_restored", tick = checkpoint.tick, "Restored from checkpoint");
        Ok(checkpoint.world)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use replicator_core::SimulationConfig;

    fn config() -> SimulationConfig {
        SimulationConfig {
            width: 10,
            height: 10,
            founders: 3,
            steps: 30,
            seed: 99,
            ..Default::default()
        }
    }

    #[test]
    fn test_restored_world_continues_identically() {
        let mut original = World::new(config()).unwrap();
        for _ in 0..10 {
            original.step();
        }

        let bytes = original.checkpoint().unwrap();
        let mut restored = World::restore(&bytes).unwrap();
        assert_eq!(restored.tick(), 10);
        assert_eq!(restored.population(), original.population());

        let a = original.run();
        let b = restored.run();
        assert_eq!(a, b);
        assert_eq!(original.lineage_births(), restored.lineage_births());
    }

    #[test]
    fn test_rejects_wrong_version() {
        let world = World::new(config()).unwrap();
        let mut bytes = world.checkpoint().unwrap();
        // bincode writes the u32 version little-endian first
        bytes[0] = 42;
        assert!(matches!(World::restore(&bytes), Err(Error::InvalidState(_))));
    }

    #[test]
    fn test_rejects_tampered_grid_dimensions() {
        let mut world = World::new(config()).unwrap();
        world.step();

        world.grid_mut().width = 11;
        let bytes = world.checkpoint().unwrap();
        assert!(matches!(World::restore(&bytes), Err(Error::InvalidState(_))));

        world.grid_mut().width = 0;
        let bytes = world.checkpoint().unwrap();
        assert!(matches!(World::restore(&bytes), Err(Error::InvalidState(_))));
    }

    #[test]
    fn test_rejects_agent_missing_from_grid() {
        let mut world = World::new(config()).unwrap();
        let (id, position) = world.agents().map(|(id, a)| (id, a.position)).next().unwrap();
        world.grid_mut().remove_agent(id, position);

        let bytes = world.checkpoint().unwrap();
        let err = World::restore(&bytes).unwrap_err();
        assert!(matches!(err, Error::InvalidState(_)));
        assert!(err.to_string().contains("missing"));
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(matches!(World::restore(&[1, 2, 3]), Err(Error::Serialization(_))));
    }
}
