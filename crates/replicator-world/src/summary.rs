//! Read-only digest of a finished run for downstream reporting.

use crate::world::{StopReason, World};
use replicator_core::{rank_standings, LineageId, LineageStanding};
use replicator_genome::Phenotype;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How the winning lineage is chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuccessMetric {
    #[default]
    FinalAlive,
    TotalBirths,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub ticks_run: u64,
    pub stop_reason: Option<StopReason>,
    pub success_metric: SuccessMetric,
    pub top_lineage: Option<LineageId>,
    pub final_alive: BTreeMap<LineageId, usize>,
    pub total_births: BTreeMap<LineageId, u64>,
    pub founder_phenotypes: BTreeMap<LineageId, Phenotype>,
}

impl RunSummary {
    pub fn from_world(world: &World, metric: SuccessMetric) -> Self {
        let final_alive = world.history().final_alive();
        let total_births = world.lineage_births().clone();

        let top_lineage = match metric {
            SuccessMetric::FinalAlive => top_by(&final_alive, |c| *c as u64),
            SuccessMetric::TotalBirths => top_by(&total_births, |b| *b),
        };

        Self {
            ticks_run: world.tick(),
            stop_reason: world.stop_reason(),
            success_metric: metric,
            top_lineage,
            final_alive,
            total_births,
            founder_phenotypes: world.founder_phenotypes(),
        }
    }

    /// Lineages ranked by final population.
    pub fn standings(&self) -> Vec<LineageStanding> {
        let mut standings: Vec<LineageStanding> = self
            .founder_phenotypes
            .keys()
            .map(|id| {
                LineageStanding::new(
                    *id,
                    self.final_alive.get(id).copied().unwrap_or(0),
                    self.total_births.get(id).copied().unwrap_or(0),
                )
            })
            .collect();
        rank_standings(&mut standings);
        standings
    }
}

// Highest value wins; ties go to the lowest lineage id.
fn top_by<V>(values: &BTreeMap<LineageId, V>, key: impl Fn(&V) -> u64) -> Option<LineageId> {
    let mut best: Option<(LineageId, u64)> = None;
    for (id, value) in values {
        let score = key(value);
        if best.map_or(true, |(_, top)| score > top) {
            best = Some((*id, score));
        }
    }
    best.map(|(id, _)| id)
}
