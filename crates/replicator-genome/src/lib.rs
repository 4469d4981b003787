//! Genotype storage and the genotype-to-phenotype map for replicators.
//!
//! A genome is four unbounded real-valued alleles. Each allele is squashed
//! through a logistic curve into a bounded trait, so genetic drift in the raw
//! values can never push a phenotype outside its sane range.

pub mod gene;
pub mod genome;
pub mod noise;

pub use gene::{logistic_bounded, Gene, GeneSpec, GENE_COUNT};
pub use genome::{Genome, Phenotype};
