//! Population time series collected once per tick.

use crate::world::World;
use replicator_core::LineageId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Model-level counts after one tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickRecord {
    pub tick: u64,
    /// Replicators present at the end of the tick, flagged ones included
    pub n: usize,
    /// Successful replications during the tick
    pub births: u64,
    /// Alive count for each lineage that still has members
    pub lineages: BTreeMap<LineageId, usize>,
}

/// Per-tick records plus aligned per-lineage alive-count series
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PopulationHistory {
    records: Vec<TickRecord>,
    lineage_counts: BTreeMap<LineageId, Vec<usize>>,
}

impl PopulationHistory {
    /// Start with an empty series for every founder lineage.
    pub fn new<I: IntoIterator<Item = LineageId>>(lineages: I) -> Self {
        Self {
            records: Vec::new(),
            lineage_counts: lineages.into_iter().map(|id| (id, Vec::new())).collect(),
        }
    }

    /// Append one tick. Tracked lineages missing from `counts` get a 0 so
    /// every series keeps the same length; lineages that are not tracked are
    /// ignored.
    pub fn record(&mut self, tick: u64, counts: &BTreeMap<LineageId, usize>, births: u64) {
        for (lineage_id, series) in self.lineage_counts.iter_mut() {
            series.push(counts.get(lineage_id).copied().unwrap_or(0));
        }

        let lineages: BTreeMap<LineageId, usize> = counts
            .iter()
            .filter(|(id, count)| **count > 0 && self.lineage_counts.contains_key(*id))
            .map(|(id, count)| (*id, *count))
            .collect();

        self.records.push(TickRecord {
            tick,
            n: counts.values().sum(),
            births,
            lineages,
        });
    }

    pub fn records(&self) -> &[TickRecord] {
        &self.records
    }

    pub fn lineage_counts(&self) -> &BTreeMap<LineageId, Vec<usize>> {
        &self.lineage_counts
    }

    pub fn lineage_series(&self, lineage_id: LineageId) -> Option<&[usize]> {
        self.lineage_counts.get(&lineage_id).map(|s| s.as_slice())
    }

    /// Last recorded alive count per lineage (0 before the first tick).
    pub fn final_alive(&self) -> BTreeMap<LineageId, usize> {
        self.lineage_counts
            .iter()
            .map(|(id, series)| (*id, series.last().copied().unwrap_or(0)))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// External collector invoked with the world after every tick
pub trait TickSink {
    fn on_tick(&mut self, world: &World);
}

impl<F: FnMut(&World)> TickSink for F {
    fn on_tick(&mut self, world: &World) {
        self(world)
    }
}
