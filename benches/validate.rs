use std::hint::black_box;
use std::sync::Arc;

use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use rpki_rov::{
    Asn, InMemoryRoaStore, InMemorySlurmStore, Prefix, Roa, RouteValidator, SlurmAssertion,
    SlurmFilter,
};

fn random_v4(rng: &mut StdRng, length: u8) -> Prefix {
    let address: [u8; 4] = rng.gen();
    Prefix::new(&address, 32).unwrap().truncate(length).unwrap()
}

fn make_validator() -> (RouteValidator, Vec<(Asn, Prefix)>) {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    let roas = InMemoryRoaStore::new();

    // 64k ROAs spread over /16../24 so every tier sees realistic candidate sets.
    let mut announced = Vec::new();
    for _ in 0..65_536u32 {
        let length = rng.gen_range(16..=24u8);
        let prefix = random_v4(&mut rng, length);
        let asn = Asn::new(rng.gen_range(64_496..65_536));
        let max_length = rng.gen_range(length..=24);
        if roas.insert(Roa::new(asn, prefix, max_length).unwrap()).is_ok() {
            announced.push((asn, prefix));
        }
    }

    let slurm = InMemorySlurmStore::new();
    for _ in 0..256 {
        let prefix = random_v4(&mut rng, 20);
        let asn = Asn::new(rng.gen_range(64_496..65_536));
        let _ = slurm.add_assertion(SlurmAssertion::new(Some(asn), prefix, Some(24)).unwrap());
        let _ = slurm.add_filter(SlurmFilter::new(None, prefix.truncate(18)).unwrap());
    }

    // Mix of exact hits, more-specifics, wrong origins and unannounced space.
    let mut queries = Vec::with_capacity(4096);
    for i in 0..4096usize {
        let (asn, prefix) = announced[rng.gen_range(0..announced.len())];
        let query = match i % 4 {
            0 => (asn, prefix),
            1 => (Asn::new(asn.value() ^ 1), prefix),
            2 => (asn, prefix.truncate(prefix.length() - 4).unwrap()),
            _ => (asn, random_v4(&mut rng, 24)),
        };
        queries.push(query);
    }

    let validator = RouteValidator::new(Arc::new(roas), Arc::new(slurm));
    (validator, queries)
}

fn bench_validate(c: &mut Criterion) {
    let (validator, queries) = make_validator();

    let mut group = c.benchmark_group("validate");
    group.throughput(Throughput::Elements(queries.len() as u64));
    group.bench_function("mixed_ipv4", |b| {
        b.iter(|| {
            for (asn, prefix) in &queries {
                black_box(validator.validate(*asn, prefix).unwrap());
            }
        });
    });
    group.finish();
}

criterion_group!(validate, bench_validate);
criterion_main!(validate);
