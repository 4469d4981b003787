//! The gene table: initialization distribution and phenotype bounds per locus.

use serde::{Deserialize, Serialize};
use std::fmt;

pub const GENE_COUNT: usize = 4;

/// Map any real `x` into `(lo, hi)` with a logistic squash.
///
/// Saturates to exactly `lo` or `hi` for very large `|x|` instead of
/// producing NaN.
pub fn logistic_bounded(x: f64, lo: f64, hi: f64) -> f64 {
    lo + (hi - lo) * (1.0 / (1.0 + (-x).exp()))
}

/// A locus in the genome
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Gene {
    /// Drives `replication_rate`
    Rep,
    /// Drives `death_rate`
    Death,
    /// Drives `mutation_rate`
    Mut,
    /// Drives `metabolism`
    Met,
}

/// Initialization distribution and expression bounds of one gene
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeneSpec {
    pub init_mean: f64,
    pub init_std_dev: f64,
    pub lo: f64,
    pub hi: f64,
}

impl GeneSpec {
    /// Express a raw allele as a bounded trait value.
    pub fn express(&self, allele: f64) -> f64 {
        logistic_bounded(allele, self.lo, self.hi)
    }
}

impl Gene {
    pub const ALL: [Gene; GENE_COUNT] = [Gene::Rep, Gene::Death, Gene::Mut, Gene::Met];

    pub fn index(self) -> usize {
        match self {
            Gene::Rep => 0,
            Gene::Death => 1,
            Gene::Mut => 2,
            Gene::Met => 3,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Gene::Rep => "rep_gene",
            Gene::Death => "death_gene",
            Gene::Mut => "mut_gene",
            Gene::Met => "met_gene",
        }
    }

    /// Name of the trait this gene expresses.
    pub fn trait_name(self) -> &'static str {
        match self {
            Gene::Rep => "replication_rate",
            Gene::Death => "death_rate",
            Gene::Mut => "mutation_rate",
            Gene::Met => "metabolism",
        }
    }

    pub fn spec(self) -> GeneSpec {
        match self {
            Gene::Rep => GeneSpec {
                init_mean: 0.0,
                init_std_dev: 1.0,
                lo: 0.02,
                hi: 0.50,
            },
            Gene::Death => GeneSpec {
                init_mean: -3.0,
                init_std_dev: 1.0,
                lo: 0.000,
                hi: 0.05,
            },
            Gene::Mut => GeneSpec {
                init_mean: -2.0,
                init_std_dev: 1.0,
                lo: 0.001,
                hi: 0.20,
            },
            Gene::Met => GeneSpec {
                init_mean: 0.0,
                init_std_dev: 1.0,
                lo: 0.05,
                hi: 0.60,
            },
        }
    }

    /// Noise scale relative to the parent's mutation rate.
    ///
    /// The mutation-rate locus mutates at 0.35x so hypermutation cannot run away.
    pub fn mutation_scale(self) -> f64 {
        match self {
            Gene::Mut => 0.35,
            _ => 1.0,
        }
    }
}

impl fmt::Display for Gene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
