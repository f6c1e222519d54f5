//! Benchmarks for neat-genome.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use neat_genome::{Genome, InnovationLedger, NeatConfig};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// A genome with some hidden structure, plus the ledger and RNG that grew it.
fn grown_genome(config: NeatConfig, steps: usize) -> (Genome, InnovationLedger, ChaCha8Rng) {
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let mut ledger = InnovationLedger::new();
    let mut genome = Genome::with_initial_wiring(config, &mut ledger, &mut rng);
    for _ in 0..steps {
        genome.add_node(&mut ledger, &mut rng).unwrap();
        genome.add_connection(&mut ledger, &mut rng).unwrap();
    }
    genome.generate_network();
    (genome, ledger, rng)
}

fn bench_genome_creation(c: &mut Criterion) {
    let config = NeatConfig::new(8, 4);

    c.bench_function("genome_initial_wiring", |b| {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let mut ledger = InnovationLedger::new();
        b.iter(|| {
            black_box(Genome::with_initial_wiring(
                config.clone(),
                &mut ledger,
                &mut rng,
            ));
        });
    });
}

fn bench_mutation(c: &mut Criterion) {
    let config = NeatConfig {
        add_connection_prob: 0.3,
        add_node_prob: 0.1,
        weight_mutation_prob: 0.8,
        ..NeatConfig::new(4, 2)
    };
    let (genome, mut ledger, mut rng) = grown_genome(config, 5);

    c.bench_function("genome_mutation", |b| {
        b.iter_batched(
            || genome.clone(),
            |mut g| {
                g.mutate(&mut ledger, &mut rng).unwrap();
                black_box(g)
            },
            BatchSize::SmallInput,
        );
    });
}

fn bench_crossover(c: &mut Criterion) {
    let config = NeatConfig {
        add_connection_prob: 0.5,
        add_node_prob: 0.3,
        ..NeatConfig::new(4, 2)
    };
    let (base, mut ledger, mut rng) = grown_genome(config, 3);

    let mut parent1 = base.clone();
    let mut parent2 = base;
    // Add some divergent structure
    for _ in 0..10 {
        parent1.mutate(&mut ledger, &mut rng).unwrap();
        parent2.mutate(&mut ledger, &mut rng).unwrap();
    }

    c.bench_function("genome_crossover", |b| {
        b.iter(|| {
            black_box(parent1.crossover(&parent2, &mut rng).unwrap());
        });
    });
}

fn bench_clone(c: &mut Criterion) {
    let (genome, _, _) = grown_genome(NeatConfig::new(8, 4), 20);

    c.bench_function("genome_clone", |b| {
        b.iter(|| {
            black_box(genome.clone());
        });
    });
}

fn bench_feed_forward(c: &mut Criterion) {
    let (mut small, _, _) = grown_genome(NeatConfig::new(2, 1), 5);
    c.bench_function("feed_forward_small", |b| {
        b.iter(|| {
            black_box(small.feed_forward(black_box(&[0.5, -0.5])).unwrap());
        });
    });

    let (mut large, _, _) = grown_genome(NeatConfig::new(16, 4), 40);
    let vision: Vec<f32> = (0..16).map(|i| i as f32 / 16.0).collect();
    c.bench_function("feed_forward_large", |b| {
        b.iter(|| {
            black_box(large.feed_forward(black_box(&vision)).unwrap());
        });
    });
}

fn bench_generate_network(c: &mut Criterion) {
    let (mut genome, _, _) = grown_genome(NeatConfig::new(16, 4), 40);

    c.bench_function("generate_network", |b| {
        b.iter(|| {
            genome.generate_network();
            black_box(genome.network().len());
        });
    });
}

criterion_group!(
    benches,
    bench_genome_creation,
    bench_mutation,
    bench_crossover,
    bench_clone,
    bench_feed_forward,
    bench_generate_network,
);
criterion_main!(benches);
