use criterion::{criterion_group, criterion_main, Criterion};
use tinyrand::{Rand, Seeded, StdRand};

use korfball::data::{Dataset, MatchRecord};
use korfball::objective::Objective;
use korfball::params::Layout;

const TEAMS: [&str; 10] = [
    "Fortuna", "PKC", "TOP", "DVO", "KCC", "LDODK", "Dalto", "Groen Geel", "KZ", "Blauw Wit",
];

/// A double round robin with pseudo-random korfball scores.
fn double_round_robin(rand: &mut impl Rand) -> Vec<MatchRecord> {
    let mut records = vec![];
    for home in TEAMS {
        for away in TEAMS {
            if home != away {
                let home_score = 14 + (rand.next_u64() % 12) as u16;
                let away_score = 12 + (rand.next_u64() % 12) as u16;
                records.push(MatchRecord::new(home, home_score, away, away_score));
            }
        }
    }
    records
}

fn criterion_benchmark(c: &mut Criterion) {
    let mut rand = StdRand::seed(42);
    let records = double_round_robin(&mut rand);
    let dataset = Dataset::try_from(records.as_slice()).unwrap();
    let objective = Objective::unweighted(&dataset);
    let mut values = Layout::new(TEAMS.len()).random(&mut rand);
    values[Layout::new(TEAMS.len()).rho()] = -0.02;

    // sanity check
    assert!(objective.evaluate(&values).is_finite());

    c.bench_function("cri_objective_90", |b| {
        b.iter(|| objective.evaluate(&values));
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
