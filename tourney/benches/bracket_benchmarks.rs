use chrono::Utc;
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::hint::black_box;
use tourney::tournament::{BracketBuilder, RegisteredTeam, RoundRobinScheduler};

/// Helper to create a roster of N registered teams
fn roster(n: usize) -> Vec<RegisteredTeam> {
    (0..n)
        .map(|i| RegisteredTeam {
            id: format!("team{i}"),
            name: format!("Team {i}"),
            avatar: None,
            registered_at: Utc::now(),
        })
        .collect()
}

/// Benchmark bracket construction across roster sizes, byes included
fn bench_bracket_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("bracket_build");

    for n in [4, 13, 64, 257] {
        let teams = roster(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &teams, |b, teams| {
            let mut builder = BracketBuilder::with_rng(StdRng::seed_from_u64(7));
            b.iter(|| builder.build(black_box(teams)));
        });
    }

    group.finish();
}

/// Benchmark round-robin schedule construction
fn bench_round_robin_schedule(c: &mut Criterion) {
    let mut group = c.benchmark_group("round_robin_schedule");

    for n in [4, 16, 64] {
        let teams = roster(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &teams, |b, teams| {
            b.iter(|| RoundRobinScheduler::build_schedule(black_box(teams)));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_bracket_build, bench_round_robin_schedule);
criterion_main!(benches);
