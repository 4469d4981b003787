//! Genome and phenotype for replicators.

use crate::gene::{Gene, GENE_COUNT};
use crate::noise::gaussian;
use rand_chacha::ChaCha8Rng;
use replicator_core::Error;
use serde::{Deserialize, Serialize};
use std::ops::Index;

/// Raw allele per gene, indexed by [`Gene::index`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Genome {
    raw: [f64; GENE_COUNT],
}

/// Bounded traits expressed from a genome
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Phenotype {
    /// Per-step maximum replication probability
    pub replication_rate: f64,
    /// Per-step baseline death probability
    pub death_rate: f64,
    /// Standard deviation scale of offspring allele noise
    pub mutation_rate: f64,
    /// Per-step energy upkeep
    pub metabolism: f64,
}

impl Phenotype {
    /// Trait value expressed by the given gene.
    pub fn value(&self, gene: Gene) -> f64 {
        match gene {
            Gene::Rep => self.replication_rate,
            Gene::Death => self.death_rate,
            Gene::Mut => self.mutation_rate,
            Gene::Met => self.metabolism,
        }
    }
}

impl Genome {
    /// Draw every allele from its gene's initialization distribution.
    pub fn random(rng: &mut ChaCha8Rng) -> Self {
        let mut raw = [0.0; GENE_COUNT];
        for gene in Gene::ALL {
            let spec = gene.spec();
            raw[gene.index()] = gaussian(rng, spec.init_mean, spec.init_std_dev);
        }
        Self { raw }
    }

    pub fn from_alleles(raw: [f64; GENE_COUNT]) -> Self {
        Self { raw }
    }

    pub fn allele(&self, gene: Gene) -> f64 {
        self.raw[gene.index()]
    }

    pub fn alleles(&self) -> &[f64; GENE_COUNT] {
        &self.raw
    }

    pub fn phenotype(&self) -> Phenotype {
        let express = |gene: Gene| gene.spec().express(self.allele(gene));
        Phenotype {
            replication_rate: express(Gene::Rep),
            death_rate: express(Gene::Death),
            mutation_rate: express(Gene::Mut),
            metabolism: express(Gene::Met),
        }
    }

    /// Copy this genome and perturb every allele with Gaussian noise.
    ///
    /// The noise scale is this (parent) genome's own mutation rate, damped
    /// for the mutation-rate locus itself.
    pub fn mutated_copy(&self, rng: &mut ChaCha8Rng) -> Genome {
        let mr = self.phenotype().mutation_rate;
        let mut child = self.clone();
        for gene in Gene::ALL {
            let std_dev = gene.mutation_scale() * mr;
            child.raw[gene.index()] += gaussian(rng, 0.0, std_dev);
        }
        child
    }

    /// Serialize the genome to bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>, Error> {
        bincode::serialize(self).map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Deserialize a genome from bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        bincode::deserialize(bytes).map_err(|e| Error::Serialization(e.to_string()))
    }
}

impl Index<Gene> for Genome {
    type Output = f64;

    fn index(&self, gene: Gene) -> &f64 {
        &self.raw[gene.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;

    fn within(value: f64, gene: Gene) -> bool {
        let spec = gene.spec();
        value >= spec.lo && value <= spec.hi
    }

    #[test]
    fn test_random_genome_is_seeded() {
        let a = Genome::random(&mut ChaCha8Rng::seed_from_u64(3));
        let b = Genome::random(&mut ChaCha8Rng::seed_from_u64(3));
        let c = Genome::random(&mut ChaCha8Rng::seed_from_u64(4));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_phenotype_is_pure() {
        let genome = Genome::random(&mut ChaCha8Rng::seed_from_u64(9));
        let before = genome.clone();
        let first = genome.phenotype();
        let second = genome.phenotype();
        assert_eq!(first, second);
        assert_eq!(genome, before);
    }

    #[test]
    fn test_extreme_alleles_stay_bounded() {
        for extreme in [1e6, -1e6] {
            let genome = Genome::from_alleles([extreme; GENE_COUNT]);
            let phenotype = genome.phenotype();
            for gene in Gene::ALL {
                assert!(within(phenotype.value(gene), gene), "{} at {}", gene, extreme);
            }
        }
    }

    #[test]
    fn test_mutated_copy_leaves_parent_untouched() {
        let mut rng = ChaCha8Rng::seed_from_u64(21);
        let parent = Genome::random(&mut rng);
        let snapshot = parent.clone();
        let child = parent.mutated_copy(&mut rng);
        assert_eq!(parent, snapshot);
        assert_ne!(child, parent);
    }

    #[test]
    fn test_mutation_noise_scales_with_parent_rate() {
        // Saturated mut_gene gives mutation_rate == 0.20.
        let parent = Genome::from_alleles([0.0, 0.0, 1e6, 0.0]);
        let mr = parent.phenotype().mutation_rate;
        let mut rng = ChaCha8Rng::seed_from_u64(77);

        let n = 5_000;
        let mut rep_sq = 0.0;
        let mut mut_sq = 0.0;
        for _ in 0..n {
            let child = parent.mutated_copy(&mut rng);
            rep_sq += (child[Gene::Rep] - parent[Gene::Rep]).powi(2);
            mut_sq += (child[Gene::Mut] - parent[Gene::Mut]).powi(2);
        }
        let rep_sd = (rep_sq / n as f64).sqrt();
        let mut_sd = (mut_sq / n as f64).sqrt();

        assert!((rep_sd - mr).abs() < 0.01, "rep sd {}", rep_sd);
        assert!((mut_sd - 0.35 * mr).abs() < 0.01, "mut sd {}", mut_sd);
    }

    #[test]
    fn test_genome_bytes() {
        let genome = Genome::random(&mut ChaCha8Rng::seed_from_u64(1));
        let bytes = genome.to_bytes().unwrap();
        assert_eq!(Genome::from_bytes(&bytes).unwrap(), genome);
        assert!(Genome::from_bytes(&bytes[..3]).is_err());
    }

    proptest! {
        #[test]
        fn phenotype_bounded_for_any_allele(
            rep in -1e6f64..1e6,
            death in -1e6f64..1e6,
            mutation in -1e6f64..1e6,
            met in -1e6f64..1e6,
        ) {
            let phenotype = Genome::from_alleles([rep, death, mutation, met]).phenotype();
            for gene in Gene::ALL {
                prop_assert!(within(phenotype.value(gene), gene));
            }
        }
    }
}
