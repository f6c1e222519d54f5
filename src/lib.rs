//! # NEAT Genome
//!
//! Genotype representation and evolutionary operators for NeuroEvolution of
//! Augmenting Topologies (NEAT): a layered graph of nodes and weighted
//! connections that can be grown, mutated, evaluated and recombined while
//! keeping gene identity aligned across independent lineages.
//!
//! ## Features
//!
//! - **Innovation Ledger**: an explicit, caller-owned registry that hands out
//!   innovation numbers and reuses them for equivalent structural mutations
//! - **Arena-Graph Model**: `SlotMap` storage for nodes and connections;
//!   connections refer to endpoints by key, so cloning is a key remap
//! - **Layered Evaluation**: every connection runs to a strictly higher layer,
//!   so nodes are evaluated in ascending layer order
//! - **Reproducible**: every stochastic operator takes an explicit RNG
//!
//! ## Quick Start
//!
//! ```rust
//! use neat_genome::{Genome, InnovationLedger, NeatConfig};
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha8Rng;
//!
//! let mut rng = ChaCha8Rng::seed_from_u64(42);
//! let mut ledger = InnovationLedger::new();
//!
//! let mut genome = Genome::with_initial_wiring(NeatConfig::new(3, 1), &mut ledger, &mut rng);
//! for _ in 0..10 {
//!     genome.mutate(&mut ledger, &mut rng).unwrap();
//! }
//!
//! let output = genome.feed_forward(&[0.5, -0.2, 1.0]).unwrap();
//! assert_eq!(output.len(), 1);
//! ```
//!
//! ## Architecture
//!
//! ### Innovation numbers
//!
//! Each new connection asks the [`InnovationLedger`] for a number, passing
//! its endpoint node ids and the innovation numbers the genome already has.
//! If an earlier request had the same endpoints and the same genome shape,
//! the earlier number is returned; otherwise a new one is minted. Crossover
//! then lines up genes by that number.
//!
//! ### Derived caches
//!
//! A genome keeps two derived caches: the outgoing-edge list of every node
//! and the layer-ordered evaluation sequence. [`Genome::generate_network`]
//! rebuilds both. Structural operators leave the evaluation order stale and
//! [`Genome::feed_forward`] regenerates it before running.

pub mod activation;
pub mod error;
pub mod gene;
pub mod genome;
pub mod innovation;
pub mod topology;

// Re-exports for convenience
pub use activation::Activation;
pub use error::GenomeError;
pub use gene::{ConnectionGene, ConnectionKey, NodeGene, NodeId, NodeKey, NodeType};
pub use genome::{Genome, NeatConfig};
pub use innovation::{InnovationLedger, InnovationRecord};
pub use topology::{evaluation_order, LayerCensus};

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_mutate_and_crossover_cycle() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let mut ledger = InnovationLedger::new();
        let config = NeatConfig {
            add_connection_prob: 0.5,
            add_node_prob: 0.3,
            ..NeatConfig::new(2, 1)
        };

        let mut genome = Genome::with_initial_wiring(config, &mut ledger, &mut rng);
        genome.mutate(&mut ledger, &mut rng).unwrap();

        let mut genome2 = genome.clone();
        genome2.mutate(&mut ledger, &mut rng).unwrap();

        let mut child = genome.crossover(&genome2, &mut rng).unwrap();
        assert_eq!(child.num_inputs(), 2);
        assert_eq!(child.num_outputs(), 1);
        assert_eq!(child.feed_forward(&[0.1, 0.9]).unwrap().len(), 1);
    }

    #[test]
    fn test_serialization_roundtrip() {
        let mut rng = ChaCha8Rng::seed_from_u64(123);
        let mut ledger = InnovationLedger::new();
        let mut genome = Genome::with_initial_wiring(NeatConfig::new(3, 2), &mut ledger, &mut rng);

        // Add some structure
        genome.add_node(&mut ledger, &mut rng).unwrap();
        genome.add_connection(&mut ledger, &mut rng).unwrap();
        let expected = genome.feed_forward(&[0.2, -0.4, 0.9]).unwrap();

        let json = serde_json::to_string(&genome).expect("Serialization failed");
        let mut restored: Genome = serde_json::from_str(&json).expect("Deserialization failed");

        assert_eq!(genome.node_count(), restored.node_count());
        assert_eq!(genome.connection_innovations(), restored.connection_innovations());
        assert_eq!(genome.layers(), restored.layers());
        assert_eq!(genome.next_node_id(), restored.next_node_id());
        assert!(!restored.is_network_current());

        let output = restored.feed_forward(&[0.2, -0.4, 0.9]).unwrap();
        assert_eq!(expected, output);
    }

    #[test]
    fn test_ledger_roundtrip_keeps_numbering() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut ledger = InnovationLedger::new();
        let _ = Genome::with_initial_wiring(NeatConfig::new(2, 2), &mut ledger, &mut rng);

        let json = serde_json::to_string(&ledger).expect("Serialization failed");
        let mut restored: InnovationLedger =
            serde_json::from_str(&json).expect("Deserialization failed");

        assert_eq!(restored.records(), ledger.records());
        let mut replay = Genome::new(NeatConfig::new(2, 2));
        replay.connect_initial(&mut restored, &mut rng);
        assert_eq!(restored.next_innovation(), ledger.next_innovation());
    }
}
