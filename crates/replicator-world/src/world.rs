//! Tick scheduler that owns the grid and the replicator population.

use crate::agent::{ReplicatorAgent, StepOutcome};
use crate::context::WorldContext;
use crate::grid::Grid;
use crate::history::{PopulationHistory, TickRecord, TickSink};
use crate::patch::ResourcePatch;
use rand::seq::SliceRandom;
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use replicator_core::{AgentId, Error, LineageId, Position, Result, SimulationConfig, TraitStats};
use replicator_genome::{Gene, Genome, Phenotype};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info, instrument, trace};

/// Handle to one steppable entity in the tick order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityRef {
    /// Resource patch by cell index
    Patch(usize),
    Replicator(AgentId),
}

/// Why `run` stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    BudgetExhausted,
    Extinct,
    PopulationCeiling,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct World {
    config: SimulationConfig,
    ctx: WorldContext,
    agents: BTreeMap<AgentId, ReplicatorAgent>,
    founder_genomes: BTreeMap<LineageId, Genome>,
    history: PopulationHistory,
    tick: u64,
    stop_reason: Option<StopReason>,
}

impl World {
    /// Validate the configuration, lay out the patches and seed one founder
    /// per lineage at a random cell.
    pub fn new(config: SimulationConfig) -> Result<Self> {
        config.validate()?;

        let rng = ChaCha8Rng::seed_from_u64(config.seed);
        let patch = ResourcePatch::new(config.patch_cap, config.patch_regrowth, config.init_patch);
        let grid = Grid::new(config.width, config.height, patch)?;
        let ctx = WorldContext::new(grid, rng, config.energy.clone(), config.placement);

        let lineages: Vec<LineageId> = (0..config.founders).map(LineageId).collect();
        let mut world = Self {
            history: PopulationHistory::new(lineages.iter().copied()),
            config,
            ctx,
            agents: BTreeMap::new(),
            founder_genomes: BTreeMap::new(),
            tick: 0,
            stop_reason: None,
        };

        for lineage_id in lineages {
            world.seed_founder(lineage_id);
        }

        info!(
            event = "world_seeded",
            width = world.config.width,
            height = world.config.height,
            founders = world.config.founders,
            seed = world.config.seed,
            "World seeded"
        );

        Ok(world)
    }

    /// Verify the invariants a deserialized world relies on before it may
    /// step: a valid configuration, a grid shaped like it, and every agent
    /// listed in exactly the cell it stands on.
    pub(crate) fn check_consistency(&self) -> Result<()> {
        self.config
            .validate()
            .map_err(|e| Error::InvalidState(format!("config: {}", e)))?;

        let grid = self.ctx.grid();
        grid.check_shape()?;
        if grid.width != self.config.width || grid.height != self.config.height {
            return Err(Error::InvalidState(format!(
                "grid is {}x{} but config says {}x{}",
                grid.width, grid.height, self.config.width, self.config.height
            )));
        }

        for (id, agent) in &self.agents {
            let pos = agent.position;
            if pos.x < 0 || pos.x >= grid.width || pos.y < 0 || pos.y >= grid.height {
                return Err(Error::InvalidState(format!("agent {} is off the grid at {}", id, pos)));
            }
            if !grid.occupants(pos).contains(id) {
                return Err(Error::InvalidState(format!("agent {} missing from cell {}", id, pos)));
            }
            if *id >= self.ctx.peek_next_agent_id() {
                return Err(Error::InvalidState(format!("agent {} was never allocated", id)));
            }
        }
        if grid.occupant_count() != self.agents.len() {
            return Err(Error::InvalidState(format!(
                "grid lists {} occupants for {} agents",
                grid.occupant_count(),
                self.agents.len()
            )));
        }
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn grid_mut(&mut self) -> &mut Grid {
        self.ctx.grid_mut()
    }

    fn seed_founder(&mut self, lineage_id: LineageId) {
        let genome = Genome::random(self.ctx.rng());
        self.founder_genomes.insert(lineage_id, genome.clone());
        self.ctx.register_lineage(lineage_id);

        let x = self.ctx.rng().gen_range(0..self.config.width);
        let y = self.ctx.rng().gen_range(0..self.config.height);
        let position = Position::new(x, y);

        let id = self.ctx.allocate_agent_id();
        let founder = ReplicatorAgent::new(genome, self.config.energy.founder_energy, lineage_id, position);
        self.ctx.grid_mut().place_agent(id, position);
        self.agents.insert(id, founder);
    }

    /// Run until the tick budget is spent, the population dies out, or it
    /// grows past the ceiling.
    #[instrument(skip(self), fields(steps = self.config.steps, seed = self.config.seed))]
    pub fn run(&mut self) -> Vec<TickRecord> {
        self.run_with(&mut |_: &World| {})
    }

    /// Like [`World::run`], handing the world to `sink` after every tick.
    pub fn run_with(&mut self, sink: &mut dyn TickSink) -> Vec<TickRecord> {
        info!(
            event = "run_started",
            start_tick = self.tick,
            population = self.agents.len(),
            "Starting run for {} ticks",
            self.config.steps
        );

        let mut stop = StopReason::BudgetExhausted;
        while self.tick < self.config.steps {
            let alive = self.agents.len();
            if alive == 0 {
                stop = StopReason::Extinct;
                break;
            }
            if alive > self.config.max_agents {
                stop = StopReason::PopulationCeiling;
                break;
            }

            self.step();
            sink.on_tick(self);

            if self.tick % 100 == 0 {
                self.emit_population_snapshot();
            }
        }

        self.stop_reason = Some(stop);
        info!(
            event = "run_stopped",
            reason = ?stop,
            final_tick = self.tick,
            population = self.agents.len(),
            "Run stopped"
        );

        self.history.records().to_vec()
    }

    /// Execute one tick: drain last tick's removals, step every entity once
    /// in a fresh random order, then record lineage counts.
    pub fn step(&mut self) {
        self.tick += 1;
        self.ctx.begin_tick();
        self.remove_flagged();

        let mut order: Vec<EntityRef> = (0..self.ctx.grid().cell_count())
            .map(EntityRef::Patch)
            .chain(self.agents.keys().copied().map(EntityRef::Replicator))
            .collect();
        order.shuffle(self.ctx.rng());

        for entity in order {
            self.step_entity(entity);
        }

        let counts = self.lineage_counts();
        self.history.record(self.tick, &counts, self.ctx.births_this_tick());
    }

    fn step_entity(&mut self, entity: EntityRef) {
        match entity {
            EntityRef::Patch(cell) => self.ctx.grid_mut().patch_at_index_mut(cell).step(),
            EntityRef::Replicator(id) => {
                let Some(agent) = self.agents.get_mut(&id) else {
                    return;
                };
                let outcome = agent.step(id, &mut self.ctx);

                match &outcome {
                    StepOutcome::Replicated(birth) => trace!(
                        event = "birth",
                        parent = %id,
                        child = %birth.child_id,
                        lineage_id = %birth.lineage_id,
                        tick = self.tick,
                        "Replicator reproduced"
                    ),
                    outcome if outcome.is_removal() => trace!(
                        event = "death",
                        agent = %id,
                        lineage_id = %agent.lineage_id,
                        energy = agent.energy,
                        tick = self.tick,
                        "Replicator flagged for removal"
                    ),
                    _ => {}
                }

                for (child_id, child) in self.ctx.take_newborns() {
                    self.agents.insert(child_id, child);
                }
            }
        }
    }

    fn remove_flagged(&mut self) {
        for id in self.ctx.take_pending_removals() {
            if let Some(agent) = self.agents.remove(&id) {
                self.ctx.grid_mut().remove_agent(id, agent.position);
            }
        }
    }

    fn emit_population_snapshot(&self) {
        let stats = self.trait_stats();
        let mean = |gene: Gene| stats.get(&gene).map(|s| s.mean).unwrap_or(0.0);
        debug!(
            event = "population_snapshot",
            tick = self.tick,
            population = self.agents.len(),
            living_lineages = self.lineage_counts().len(),
            resource_total = self.ctx.grid().total_resource(),
            mean_replication_rate = mean(Gene::Rep),
            mean_death_rate = mean(Gene::Death),
            mean_mutation_rate = mean(Gene::Mut),
            mean_metabolism = mean(Gene::Met),
            "Population snapshot"
        );
    }

    /// Increment the cumulative birth counter of a seeded lineage.
    pub fn register_birth(&mut self, lineage_id: LineageId) {
        self.ctx.register_birth(lineage_id);
    }

    /// Alive replicators per lineage, counting those flagged this tick.
    pub fn lineage_counts(&self) -> BTreeMap<LineageId, usize> {
        let mut counts = BTreeMap::new();
        for agent in self.agents.values() {
            *counts.entry(agent.lineage_id).or_insert(0) += 1;
        }
        counts
    }

    /// Phenotype statistics of the current population, per gene.
    pub fn trait_stats(&self) -> BTreeMap<Gene, TraitStats> {
        let phenotypes: Vec<Phenotype> = self.agents.values().map(|a| a.traits()).collect();
        Gene::ALL
            .into_iter()
            .map(|gene| {
                let stats = TraitStats::from_values(phenotypes.iter().map(|p| p.value(gene)));
                (gene, stats)
            })
            .collect()
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn population(&self) -> usize {
        self.agents.len()
    }

    pub fn agent(&self, id: AgentId) -> Option<&ReplicatorAgent> {
        self.agents.get(&id)
    }

    pub fn agents(&self) -> impl Iterator<Item = (AgentId, &ReplicatorAgent)> + '_ {
        self.agents.iter().map(|(id, agent)| (*id, agent))
    }

    pub fn grid(&self) -> &Grid {
        self.ctx.grid()
    }

    pub fn is_flagged(&self, id: AgentId) -> bool {
        self.ctx.is_flagged(id)
    }

    pub fn lineage_births(&self) -> &BTreeMap<LineageId, u64> {
        self.ctx.lineage_births()
    }

    pub fn history(&self) -> &PopulationHistory {
        &self.history
    }

    pub fn lineage_history(&self) -> &BTreeMap<LineageId, Vec<usize>> {
        self.history.lineage_counts()
    }

    pub fn founder_genomes(&self) -> &BTreeMap<LineageId, Genome> {
        &self.founder_genomes
    }

    /// Traits each lineage had at its founding.
    pub fn founder_phenotypes(&self) -> BTreeMap<LineageId, Phenotype> {
        self.founder_genomes
            .iter()
            .map(|(id, genome)| (*id, genome.phenotype()))
            .collect()
    }

    pub fn stop_reason(&self) -> Option<StopReason> {
        self.stop_reason
    }
}
