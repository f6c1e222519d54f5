use std::collections::HashSet;

use neat_genome::{Genome, InnovationLedger, LayerCensus, NeatConfig};
use proptest::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

prop_compose! {
    fn arb_config()(
        num_inputs in 1usize..5,
        num_outputs in 1usize..4,
        add_connection_prob in 0.0f32..1.0f32,
        add_node_prob in 0.0f32..0.6f32,
        connect_bias_to_outputs in any::<bool>()
    ) -> NeatConfig {
        NeatConfig {
            add_connection_prob,
            add_node_prob,
            connect_bias_to_outputs,
            ..NeatConfig::new(num_inputs, num_outputs)
        }
    }
}

/// Grow a genome from a seed with a fresh ledger.
fn evolve(config: NeatConfig, seed: u64, steps: usize) -> Genome {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut ledger = InnovationLedger::new();
    let mut genome = Genome::with_initial_wiring(config, &mut ledger, &mut rng);
    for _ in 0..steps {
        genome.mutate(&mut ledger, &mut rng).unwrap();
    }
    genome
}

fn vision_for(genome: &Genome) -> Vec<f32> {
    (0..genome.num_inputs()).map(|i| (i as f32 * 0.37).sin()).collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn test_network_order_is_layer_sorted_and_complete(
        config in arb_config(),
        seed in any::<u64>(),
        steps in 0usize..40
    ) {
        let mut genome = evolve(config, seed, steps);
        genome.generate_network();

        let layers: Vec<u32> = genome
            .network()
            .iter()
            .map(|&key| genome.node(key).unwrap().layer)
            .collect();
        prop_assert!(layers.windows(2).all(|w| w[0] <= w[1]));

        let unique: HashSet<_> = genome.network().iter().collect();
        prop_assert_eq!(unique.len(), genome.node_count());
        prop_assert_eq!(genome.network().len(), genome.node_count());
    }

    #[test]
    fn test_node_ids_unique_and_below_counter(
        config in arb_config(),
        seed in any::<u64>(),
        steps in 0usize..40
    ) {
        let genome = evolve(config, seed, steps);
        let ids: HashSet<_> = genome.nodes().map(|(_, n)| n.id).collect();
        prop_assert_eq!(ids.len(), genome.node_count());
        prop_assert!(ids.iter().all(|id| *id < genome.next_node_id()));
    }

    #[test]
    fn test_connections_point_to_higher_layers(
        config in arb_config(),
        seed in any::<u64>(),
        steps in 0usize..40
    ) {
        let genome = evolve(config, seed, steps);
        for (_, conn) in genome.connections() {
            let from = genome.node(conn.from()).unwrap();
            let to = genome.node(conn.to()).unwrap();
            prop_assert!(from.layer < to.layer, "{} -> {}", from.layer, to.layer);
        }
        for &key in genome.input_keys().iter().chain([genome.bias_key()].iter()) {
            prop_assert_eq!(genome.node(key).unwrap().layer, 0);
        }
        for &key in genome.output_keys() {
            prop_assert_eq!(genome.node(key).unwrap().layer, genome.layers() - 1);
        }
    }

    #[test]
    fn test_fully_connected_means_maximal(
        config in arb_config(),
        seed in any::<u64>(),
        steps in 0usize..40
    ) {
        let genome = evolve(config, seed, steps);
        let max = LayerCensus::from_genome(&genome).max_connections();
        prop_assert!(genome.connection_count() <= max);
        if genome.fully_connected() {
            prop_assert_eq!(genome.connection_count(), max);
        }
    }

    #[test]
    fn test_feed_forward_deterministic(
        config in arb_config(),
        seed in any::<u64>(),
        steps in 0usize..40
    ) {
        let mut first = evolve(config.clone(), seed, steps);
        let mut second = evolve(config, seed, steps);
        let vision = vision_for(&first);

        let a = first.feed_forward(&vision).unwrap();
        let b = first.feed_forward(&vision).unwrap();
        let c = second.feed_forward(&vision).unwrap();
        prop_assert_eq!(&a, &b);
        prop_assert_eq!(&a, &c);
        prop_assert!(a.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_crossover_keeps_primary_shape(
        config in arb_config(),
        seed in any::<u64>(),
        steps in 1usize..20
    ) {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut ledger = InnovationLedger::new();
        let base = Genome::with_initial_wiring(config, &mut ledger, &mut rng);
        let mut primary = base.clone();
        let mut other = base;
        for _ in 0..steps {
            primary.mutate(&mut ledger, &mut rng).unwrap();
            other.mutate(&mut ledger, &mut rng).unwrap();
        }

        let child = primary.crossover(&other, &mut rng).unwrap();
        let ids = |g: &Genome| g.nodes().map(|(_, n)| n.id).collect::<Vec<_>>();
        prop_assert_eq!(ids(&child), ids(&primary));
        prop_assert_eq!(child.connection_count(), primary.connection_count());
    }
}
