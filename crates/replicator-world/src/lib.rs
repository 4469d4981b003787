//! World simulation engine.
//!
//! This module implements the toroidal grid where replicator lineages forage
//! on regenerating resource patches, replicate with mutation and die out.

pub mod agent;
pub mod checkpoint;
pub mod context;
pub mod grid;
pub mod history;
pub mod patch;
pub mod summary;
pub mod world;

pub use agent::{replication_factor, replication_probability, Birth, ReplicatorAgent, StepOutcome};
pub use context::WorldContext;
pub use grid::Grid;
pub use history::{PopulationHistory, TickRecord, TickSink};
pub use patch::ResourcePatch;
pub use summary::{RunSummary, SuccessMetric};
pub use world::{EntityRef, StopReason, World};
