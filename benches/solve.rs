//! Benchmarks for propagation and search on small inline grids.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use crossword::{find_fill, Domains, Puzzle, Solver, SolverConfig};

const STRUCTURE: &str = "\
#___#
#_##_
#____
#_##_
#____
";

const WORDS: &str = "\
one
two
three
four
five
six
seven
eight
nine
ten
area
arena
earn
near
nest
tent
tenet
teen
seen
rate
tear
tone
note
neon
eon
ore
ton
net
ant
tan
";

const SQUARE: &str = "\
____
____
____
____
";

const SQUARE_WORDS: &str = "\
card
area
rear
dart
care
arer
read
tern
crab
roar
abet
best
ante
tent
";

fn puzzle(structure: &str, words: &str) -> Puzzle {
    Puzzle::from_template(structure, words).expect("bad bench template")
}

/// Benchmark node consistency plus AC-3 from a full dictionary.
fn bench_propagate(c: &mut Criterion) {
    let puzzle = puzzle(STRUCTURE, WORDS);

    c.bench_function("propagate", |b| {
        b.iter(|| {
            let mut solver = Solver::new(black_box(&puzzle));
            let _ = solver.propagate();
            solver.domains().sizes()
        })
    });
}

/// Benchmark the whole fill pipeline, with and without maintained arc consistency.
fn bench_fill(c: &mut Criterion) {
    let puzzle = puzzle(SQUARE, SQUARE_WORDS);

    let mut group = c.benchmark_group("fill_square");
    group.bench_function("plain", |b| {
        b.iter(|| find_fill(black_box(&puzzle), SolverConfig::default()).is_ok())
    });
    group.bench_function("inference", |b| {
        let config = SolverConfig {
            maintain_arc_consistency: true,
            ..SolverConfig::default()
        };
        b.iter(|| find_fill(black_box(&puzzle), config.clone()).is_ok())
    });
    group.finish();
}

/// Benchmark building the per-variable domains.
fn bench_domains(c: &mut Criterion) {
    let puzzle = puzzle(STRUCTURE, WORDS);

    c.bench_function("domains_new", |b| b.iter(|| Domains::new(black_box(&puzzle))));
}

criterion_group!(benches, bench_propagate, bench_fill, bench_domains);
criterion_main!(benches);
