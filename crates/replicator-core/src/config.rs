//! Configuration types for the simulation.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Largest grid the simulation will allocate
pub const MAX_GRID_CELLS: usize = 1 << 26;

/// Number of cells in a `width` x `height` torus, or an error when either
/// dimension is non-positive or the product cannot be allocated.
pub fn grid_cell_count(width: i32, height: i32) -> Result<usize> {
    if width <= 0 || height <= 0 {
        return Err(Error::InvalidConfig(format!(
            "grid dimensions must be positive, got {}x{}",
            width, height
        )));
    }
    match width.checked_mul(height) {
        Some(cells) if cells as usize <= MAX_GRID_CELLS => Ok(cells as usize),
        _ => Err(Error::InvalidConfig(format!(
            "grid {}x{} exceeds the limit of {} cells",
            width, height, MAX_GRID_CELLS
        ))),
    }
}

/// Where a newborn replicator is placed relative to its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChildPlacement {
    /// First entry of the shuffled 8-neighborhood, occupied or not.
    #[default]
    RandomNeighbor,
    /// First unoccupied entry of the shuffled 8-neighborhood, falling back to
    /// the first entry when every neighbor already holds a replicator.
    PreferEmpty,
}

/// Energy budget and replication constants
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnergyConfig {
    /// Starting energy for founders
    pub founder_energy: f64,
    /// Energy a replicator must exceed before it may replicate
    pub replication_threshold: f64,
    /// Surplus above the threshold at which replication reaches full rate
    pub replication_ramp: f64,
    /// Fraction of the parent's energy handed to the child
    pub offspring_share: f64,
    /// Lower bound of the uniform harvest jitter
    pub intake_jitter_min: f64,
    /// Upper bound of the uniform harvest jitter
    pub intake_jitter_max: f64,
}

impl Default for EnergyConfig {
    fn default() -> Self {
        Self {
            founder_energy: 2.0,
            replication_threshold: 1.5,
            replication_ramp: 2.0,
            offspring_share: 0.5,
            intake_jitter_min: 0.8,
            intake_jitter_max: 1.2,
        }
    }
}

impl EnergyConfig {
    pub fn validate(&self) -> Result<()> {
        non_negative("founder_energy", self.founder_energy)?;
        non_negative("replication_threshold", self.replication_threshold)?;
        if !(self.replication_ramp.is_finite() && self.replication_ramp > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "replication_ramp must be positive, got {}",
                self.replication_ramp
            )));
        }
        if !(self.offspring_share > 0.0 && self.offspring_share < 1.0) {
            return Err(Error::InvalidConfig(format!(
                "offspring_share must lie in (0, 1), got {}",
                self.offspring_share
            )));
        }
        non_negative("intake_jitter_min", self.intake_jitter_min)?;
        non_negative("intake_jitter_max", self.intake_jitter_max)?;
        if self.intake_jitter_min > self.intake_jitter_max {
            return Err(Error::InvalidConfig(format!(
                "intake jitter range is inverted: [{}, {}]",
                self.intake_jitter_min, self.intake_jitter_max
            )));
        }
        Ok(())
    }
}

/// Everything needed to build a world
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Width of the toroidal grid
    pub width: i32,
    /// Height of the toroidal grid
    pub height: i32,
    /// Random seed for reproducibility
    pub seed: u64,
    /// Number of founder lineages
    pub founders: u32,
    /// Tick budget for `run`
    pub steps: u64,
    /// Carrying capacity of each resource patch
    pub patch_cap: f64,
    /// Per-tick regrowth rate toward capacity
    pub patch_regrowth: f64,
    /// Initial resource amount per patch (clamped into `[0, patch_cap]`)
    pub init_patch: f64,
    /// Population ceiling; a run stops early once the count exceeds it
    pub max_agents: usize,
    /// Energy constants
    pub energy: EnergyConfig,
    /// Child placement rule
    pub placement: ChildPlacement,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            width: 40,
            height: 40,
            seed: 7,
            founders: 10,
            steps: 600,
            patch_cap: 10.0,
            patch_regrowth: 0.10,
            init_patch: 5.0,
            max_agents: 20_000,
            energy: EnergyConfig::default(),
            placement: ChildPlacement::default(),
        }
    }
}

impl SimulationConfig {
    /// Reject degenerate setups before any world state is built.
    pub fn validate(&self) -> Result<()> {
        grid_cell_count(self.width, self.height)?;
        if self.founders == 0 {
            return Err(Error::InvalidConfig(
                "at least one founder is required".to_string(),
            ));
        }
        non_negative("patch_cap", self.patch_cap)?;
        non_negative("patch_regrowth", self.patch_regrowth)?;
        non_negative("init_patch", self.init_patch)?;
        self.energy.validate()
    }
}

fn non_negative(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidConfig(format!(
            "{} must be a non-negative finite number, got {}",
            name, value
        )))
    }
}
