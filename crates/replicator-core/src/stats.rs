//! Statistics over lineages and trait values.

use crate::LineageId;
use serde::{Deserialize, Serialize};

/// Mean/min/max of a set of trait values
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TraitStats {
    pub count: usize,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
}

impl TraitStats {
    /// Summarize the values; an empty input yields all zeros.
    pub fn from_values<I: IntoIterator<Item = f64>>(values: I) -> Self {
        let mut count = 0usize;
        let mut sum = 0.0;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;

        for v in values {
            count += 1;
            sum += v;
            min = min.min(v);
            max = max.max(v);
        }

        if count == 0 {
            return Self::default();
        }

        Self {
            count,
            mean: sum / count as f64,
            min,
            max,
        }
    }
}

/// How a lineage fared over a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineageStanding {
    pub lineage_id: LineageId,
    pub final_alive: usize,
    pub births: u64,
    /// `final_alive / births`, or 0 when the lineage never replicated
    pub survival_ratio: f64,
}

impl LineageStanding {
    pub fn new(lineage_id: LineageId, final_alive: usize, births: u64) -> Self {
        let survival_ratio = if births > 0 {
            final_alive as f64 / births as f64
        } else {
            0.0
        };
        Self {
            lineage_id,
            final_alive,
            births,
            survival_ratio,
        }
    }
}

/// Sort standings by final population, largest first, lowest id on ties.
pub fn rank_standings(standings: &mut [LineageStanding]) {
    standings.sort_by(|a, b| {
        b.final_alive
            .cmp(&a.final_alive)
            .then(a.lineage_id.cmp(&b.lineage_id))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trait_stats() {
        let stats = TraitStats::from_values([1.0, 2.0, 6.0]);
        assert_eq!(stats.count, 3);
        assert_eq!(stats.mean, 3.0);
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.max, 6.0);
    }

    #[test]
    fn test_trait_stats_empty() {
        let stats = TraitStats::from_values(std::iter::empty());
        assert_eq!(stats, TraitStats::default());
    }

    #[test]
    fn test_survival_ratio() {
        assert_eq!(LineageStanding::new(LineageId(0), 4, 8).survival_ratio, 0.5);
        assert_eq!(LineageStanding::new(LineageId(1), 1, 0).survival_ratio, 0.0);
    }

    #[test]
    fn test_ranking_breaks_ties_by_id() {
        let mut standings = vec![
            LineageStanding::new(LineageId(2), 5, 10),
            LineageStanding::new(LineageId(0), 1, 3),
            LineageStanding::new(LineageId(1), 5, 7),
        ];
        rank_standings(&mut standings);
        let order: Vec<u32> = standings.iter().map(|s| s.lineage_id.0).collect();
        assert_eq!(order, vec![1, 2, 0]);
    }
}
