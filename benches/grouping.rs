//! Performance benchmarks for campgroups.
//!
//! Run with: `cargo bench --features synthetic`
//!
//! Rosters come from the seeded synthetic generator so every run measures
//! the same input.

use chrono::NaiveDate;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use campgroups::synthetic::SyntheticRoster;
use campgroups::{
    cluster, insert_late, run, standardize_roster, Camper, GroupingConfig, GroupingInput,
};

#[cfg(feature = "parallel")]
use campgroups::standardize_roster_parallel;

fn config_for(camper_count: usize) -> GroupingConfig {
    GroupingConfig {
        num_groups: (camper_count + 9) / 10,
        ..GroupingConfig::default()
    }
}

fn roster(camper_count: usize) -> SyntheticRoster {
    SyntheticRoster {
        camper_count,
        min_grade: 0,
        max_grade: 8,
        seed: 42,
        ..SyntheticRoster::default()
    }
}

fn camp_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 17).unwrap()
}

/// Standardization including friend-name matching (quadratic in roster size).
fn bench_standardize(c: &mut Criterion) {
    let mut group = c.benchmark_group("standardize");
    group.sample_size(20);

    for count in [50, 200, 500].iter() {
        let config = config_for(*count);
        let raws = roster(*count).generate_raw(camp_start(), config.cutoff_month);

        group.bench_with_input(BenchmarkId::new("sequential", count), &raws, |b, raws| {
            b.iter(|| standardize_roster(black_box(raws), camp_start(), &config))
        });

        #[cfg(feature = "parallel")]
        group.bench_with_input(BenchmarkId::new("parallel", count), &raws, |b, raws| {
            b.iter(|| standardize_roster_parallel(black_box(raws), camp_start(), &config))
        });
    }

    group.finish();
}

/// Clustering plus the full placement run.
fn bench_full_run(c: &mut Criterion) {
    let mut group = c.benchmark_group("full_run");
    group.sample_size(20);

    // Realistic camps are tens to low hundreds of campers
    for count in [50, 100, 300].iter() {
        let config = config_for(*count);
        let campers = roster(*count).generate_campers();

        group.bench_with_input(BenchmarkId::new("cluster_and_run", count), &campers, |b, campers| {
            b.iter(|| {
                let mut campers: Vec<Camper> = campers.clone();
                let clusters = cluster(&mut campers, &config);
                let input = GroupingInput::new(&campers, &clusters.friend_groups, &config);
                run(black_box(&input))
            })
        });
    }

    group.finish();
}

/// Late insertion into committed groups.
fn bench_insert_late(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert_late");

    let config = config_for(300);
    let mut campers = roster(300).generate_campers();
    let clusters = cluster(&mut campers, &config);
    let input = GroupingInput::new(&campers, &clusters.friend_groups, &config);
    let output = run(&input).unwrap();
    let late = Camper::new("late-1", "Late", "Registrant", 4);

    group.bench_function("into_300", |b| {
        b.iter(|| {
            let mut groups = output.groups.clone();
            insert_late(black_box(&late), &mut groups, &config)
        })
    });

    group.finish();
}

criterion_group!(benches, bench_standardize, bench_full_run, bench_insert_late);
criterion_main!(benches);
