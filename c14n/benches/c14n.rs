//! Benchmark RDFC-1.0 on datasets of increasing symmetry,
//! and the number formatter.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ldtk_api::{Dataset, Term};
use ldtk_c14n::number::format_number;
use ldtk_c14n::rdfc10::canonical_nquads;
use ldtk_c14n::hash::Sha256;

/// A chain of `n` blank nodes, each with a distinct label.
fn chain(n: usize) -> Dataset {
    let p = Term::new_iri_unchecked("http://example.org/next");
    let label = Term::new_iri_unchecked("http://example.org/label");
    let mut d = Dataset::new();
    for i in 0..n {
        d.insert_spog(
            Term::new_bnode_unchecked(format!("n{i}")),
            p.clone(),
            Term::new_bnode_unchecked(format!("n{}", i + 1)),
            None,
        );
        d.insert_spog(
            Term::new_bnode_unchecked(format!("n{i}")),
            label.clone(),
            Term::new_literal_dt(i.to_string(), ldtk_api::ns::xsd::integer),
            None,
        );
    }
    d
}

/// A cycle of `n` undistinguishable blank nodes.
fn cycle(n: usize) -> Dataset {
    let p = Term::new_iri_unchecked("http://example.org/next");
    let mut d = Dataset::new();
    for i in 0..n {
        d.insert_spog(
            Term::new_bnode_unchecked(format!("n{i}")),
            p.clone(),
            Term::new_bnode_unchecked(format!("n{}", (i + 1) % n)),
            None,
        );
    }
    d
}

fn c14n(c: &mut Criterion) {
    for n in [10, 100] {
        let d = chain(n);
        c.bench_with_input(BenchmarkId::new("chain", n), &d, |b, d| {
            b.iter(|| black_box(canonical_nquads::<Sha256>(d, 1.0, 6).unwrap()))
        });
    }
    for n in [5, 10] {
        let d = cycle(n);
        c.bench_with_input(BenchmarkId::new("cycle", n), &d, |b, d| {
            b.iter(|| black_box(canonical_nquads::<Sha256>(d, 1.0, 6).unwrap()))
        });
    }
}

fn numbers(c: &mut Criterion) {
    let values = [0.0, 1.0, 0.1, 5.3, 1e21, 1e-7, 333333333.33333329, f64::MAX];
    c.bench_function("format_number", |b| {
        b.iter(|| {
            for v in values {
                black_box(format_number(v).unwrap());
            }
        })
    });
}

criterion_group!(benches, c14n, numbers);
criterion_main!(benches);
