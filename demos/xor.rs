//! XOR example using a small NEAT population loop.
//!
//! This example demonstrates evolving a neural network to solve the XOR problem,
//! a classic benchmark for neuroevolution algorithms. Selection here is plain
//! truncation; speciation is left to the caller.
//!
//! Run with: `cargo run --example xor`
//! Set `RUST_LOG=neat_genome=debug` to watch structural mutations.

use neat_genome::{Activation, Genome, GenomeError, InnovationLedger, NeatConfig};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing_subscriber::EnvFilter;

const TEST_CASES: [([f32; 2], f32); 4] = [
    ([0.0, 0.0], 0.0),
    ([0.0, 1.0], 1.0),
    ([1.0, 0.0], 1.0),
    ([1.0, 1.0], 0.0),
];

/// Maximum fitness is 4.0 (perfect solution).
fn xor_fitness(genome: &mut Genome) -> Result<f32, GenomeError> {
    let mut total_error = 0.0;
    for (inputs, expected) in &TEST_CASES {
        let output = genome.feed_forward(inputs)?[0];
        total_error += (output - expected).powi(2);
    }
    Ok(4.0 - total_error)
}

fn main() -> Result<(), GenomeError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    println!("NEAT XOR Example");
    println!("================\n");

    // Configuration
    let config = NeatConfig {
        activation: Activation::SteepenedSigmoid,
        add_connection_prob: 0.3,
        add_node_prob: 0.1,
        weight_mutation_prob: 0.8,
        weight_replace_prob: 0.1,
        weight_perturb_scale: 0.2,
        connect_bias_to_outputs: true,
        ..NeatConfig::new(2, 1)
    };
    config.validate()?;

    let population_size = 150;
    let generations = 200;
    let elite_count = 5;
    let parent_pool = 30;

    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let mut ledger = InnovationLedger::new();

    // Create initial population
    let mut population: Vec<Genome> = (0..population_size)
        .map(|_| Genome::with_initial_wiring(config.clone(), &mut ledger, &mut rng))
        .collect();

    println!("Population: {}", population_size);
    println!("Generations: {}", generations);
    println!("Elite count: {}", elite_count);
    println!();

    let mut solution_generation = None;
    let mut scored: Vec<(f32, Genome)> = Vec::new();

    for gen in 0..generations {
        // Evaluate and rank
        scored = population
            .into_iter()
            .map(|mut genome| xor_fitness(&mut genome).map(|fitness| (fitness, genome)))
            .collect::<Result<_, _>>()?;
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));

        let (best_fitness, best) = &scored[0];
        if *best_fitness >= 3.9 && solution_generation.is_none() {
            solution_generation = Some(gen);
        }

        // Print progress every 10 generations
        if gen % 10 == 0 || gen == generations - 1 {
            let avg_fitness: f32 =
                scored.iter().map(|(f, _)| f).sum::<f32>() / scored.len() as f32;
            println!(
                "Gen {:3}: best={:.4}, avg={:.4}, nodes={}, connections={}",
                gen,
                best_fitness,
                avg_fitness,
                best.node_count(),
                best.num_enabled_connections()
            );
        }

        if gen == generations - 1 {
            break;
        }

        // Innovation reuse is scoped to one generation
        ledger.begin_epoch();

        // Breed the next generation from the top of the ranking
        let mut next: Vec<Genome> = scored
            .iter()
            .take(elite_count)
            .map(|(_, g)| g.clone())
            .collect();
        while next.len() < population_size {
            let a = rng.random_range(0..parent_pool);
            let b = rng.random_range(0..parent_pool);
            // The lower index ranks higher and acts as the fitter parent
            let (fitter, other) = (&scored[a.min(b)].1, &scored[a.max(b)].1);
            let mut child = fitter.crossover(other, &mut rng)?;
            child.mutate(&mut ledger, &mut rng)?;
            next.push(child);
        }
        population = next;
    }

    println!();

    // Final results
    let (champion_fitness, mut champion) = scored.swap_remove(0);

    println!("Evolution Complete!");
    println!("==================");
    println!("Best fitness: {:.4}", champion_fitness);
    println!("Nodes: {}", champion.node_count());
    println!("Connections: {}", champion.num_enabled_connections());
    println!("Hidden nodes: {}", champion.hidden_keys().len());
    println!("Layers: {}", champion.layers());

    if let Some(gen) = solution_generation {
        println!("Solution found at generation: {}", gen);
    }

    // Test the champion
    println!("\nChampion XOR outputs:");
    for (inputs, expected) in &TEST_CASES {
        let output = champion.feed_forward(inputs)?[0];
        let rounded = if output > 0.5 { 1.0 } else { 0.0 };
        let status = if (rounded - expected).abs() < 0.1 {
            "✓"
        } else {
            "✗"
        };
        println!(
            "  {} XOR {} = {:.4} (expected {}) {}",
            inputs[0] as i32, inputs[1] as i32, output, *expected as i32, status
        );
    }

    Ok(())
}
