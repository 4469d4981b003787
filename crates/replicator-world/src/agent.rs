//! Replicator state and per-tick behavior.

use crate::context::WorldContext;
use rand::Rng;
use replicator_core::{AgentId, Direction, EnergyConfig, LineageId, Position};
use replicator_genome::{Genome, Phenotype};
use serde::{Deserialize, Serialize};

/// A replicator in the simulation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplicatorAgent {
    pub genome: Genome,
    pub energy: f64,
    pub lineage_id: LineageId,
    pub position: Position,
}

/// What happened to a replicator during one step
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    /// Entered the step with no energy left; flagged without acting.
    Starved,
    /// Failed the death draw or ran out of energy after metabolism; flagged.
    Died,
    /// Alive and did not replicate.
    Survived,
    /// Alive and produced a child.
    Replicated(Birth),
}

impl StepOutcome {
    pub fn is_removal(&self) -> bool {
        matches!(self, StepOutcome::Starved | StepOutcome::Died)
    }
}

/// Record of a single replication event
#[derive(Debug, Clone, PartialEq)]
pub struct Birth {
    pub child_id: AgentId,
    pub lineage_id: LineageId,
    pub position: Position,
    pub parent_energy_before: f64,
    pub parent_energy_after: f64,
    pub child_energy: f64,
}

/// How far surplus energy has ramped replication up, in `[0, 1]`.
///
/// Zero at the threshold, one once the surplus reaches the ramp width.
pub fn replication_factor(energy: f64, config: &EnergyConfig) -> f64 {
    ((energy - config.replication_threshold) / config.replication_ramp).clamp(0.0, 1.0)
}

/// Per-step replication probability for a replicator with this energy.
pub fn replication_probability(replication_rate: f64, energy: f64, config: &EnergyConfig) -> f64 {
    replication_rate * replication_factor(energy, config)
}

impl ReplicatorAgent {
    pub fn new(genome: Genome, energy: f64, lineage_id: LineageId, position: Position) -> Self {
        Self {
            genome,
            energy,
            lineage_id,
            position,
        }
    }

    pub fn traits(&self) -> Phenotype {
        self.genome.phenotype()
    }

    /// Move, harvest, metabolize, then either die or maybe replicate.
    ///
    /// Removal is never immediate: a dying replicator is only flagged, and
    /// stays on the grid until the next tick begins.
    pub fn step(&mut self, id: AgentId, ctx: &mut WorldContext) -> StepOutcome {
        if self.energy <= 0.0 {
            ctx.flag_for_removal(id);
            return StepOutcome::Starved;
        }

        let traits = self.traits();
        let energy_config = ctx.energy().clone();

        let directions = Direction::all();
        let dir = directions[ctx.rng().gen_range(0..directions.len())];
        self.position = ctx.move_agent(id, self.position, dir);

        let base_intake = 1.0 / (1.0 + traits.metabolism);
        let jitter = ctx
            .rng()
            .gen_range(energy_config.intake_jitter_min..=energy_config.intake_jitter_max);
        self.energy += ctx.harvest(self.position, base_intake * jitter);

        self.energy -= traits.metabolism;

        let roll: f64 = ctx.rng().gen();
        if roll < traits.death_rate || self.energy <= 0.0 {
            ctx.flag_for_removal(id);
            return StepOutcome::Died;
        }

        if self.energy > energy_config.replication_threshold {
            let p = replication_probability(traits.replication_rate, self.energy, &energy_config);
            if ctx.rng().gen::<f64>() < p {
                return StepOutcome::Replicated(self.replicate(ctx, &energy_config));
            }
        }

        StepOutcome::Survived
    }

    fn replicate(&mut self, ctx: &mut WorldContext, config: &EnergyConfig) -> Birth {
        let child_pos = ctx.pick_child_cell(self.position);
        let child_genome = self.genome.mutated_copy(ctx.rng());

        let parent_energy_before = self.energy;
        let child_energy = parent_energy_before * config.offspring_share;
        self.energy = parent_energy_before - child_energy;

        let child = ReplicatorAgent::new(child_genome, child_energy, self.lineage_id, child_pos);
        let child_id = ctx.spawn_child(child);
        ctx.register_birth(self.lineage_id);

        Birth {
            child_id,
            lineage_id: self.lineage_id,
            position: child_pos,
            parent_energy_before,
            parent_energy_after: self.energy,
            child_energy,
        }
    }
}
