use criterion::{black_box, criterion_group, criterion_main, Criterion};

use urlguard_core::hostglob::{HostGlob, HostGlobMatcher};
use urlguard_core::psl::DomainName;

fn build_matcher(count: usize) -> HostGlobMatcher {
    let globs: Vec<HostGlob> = (0..count)
        .map(|i| HostGlob::parse(&format!("**.tracker{i}.example")).unwrap())
        .collect();
    HostGlobMatcher::build(&globs, false)
}

fn bench_hostglob(c: &mut Criterion) {
    let matcher = build_matcher(500);
    let hit = DomainName::parse("cdn.tracker250.example").unwrap();
    let miss = DomainName::parse("cdn.unrelated.example").unwrap();

    c.bench_function("hostglob_match_hit", |b| {
        b.iter(|| matcher.matches(black_box(&hit)));
    });

    c.bench_function("hostglob_match_miss", |b| {
        b.iter(|| matcher.matches(black_box(&miss)));
    });
}

criterion_group!(benches, bench_hostglob);
criterion_main!(benches);
