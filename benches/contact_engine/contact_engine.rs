use std::hint::black_box;
use std::sync::Arc;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use stride::cluster::{Cluster, ClusterType, ContactProfiles, GeoCoordinate};
use stride::disease::DiseaseProfile;
use stride::health::Health;
use stride::infector::{Infector, InfectorPolicy, Strategy};
use stride::people::Population;
use stride::random::RandomStream;

static SEED: u64 = 123;
static CLUSTER_SIZES: [u32; 3] = [4, 100, 1000];

/// One community with every tenth member infectious and every fifth one in the survey.
fn community(size: u32) -> (Population, Cluster) {
    let profiles = Arc::new(ContactProfiles::uniform(20.0).expect("valid contact rate"));
    let mut population = Population::new();
    let mut cluster = Cluster::new(
        1,
        ClusterType::PrimaryCommunity,
        GeoCoordinate::default(),
        profiles,
    );
    for i in 0..size {
        let person_id =
            population.add_person(f64::from(i % 80), [0, 0, 0, 1, 0], Health::new(1, 2, 5, 5));
        let person = population.get_mut(person_id);
        if i % 10 == 0 {
            person.health_mut().start_infection();
            person.health_mut().update();
        }
        if i % 5 == 0 {
            person.participate_in_survey();
        }
        cluster.add_member(person_id);
    }
    (population, cluster)
}

pub fn criterion_benchmark(c: &mut Criterion) {
    let disease = DiseaseProfile::new(0.2).expect("valid transmission rate");
    let mut group = c.benchmark_group("contact round");
    for strategy in [Strategy::AllPairs, Strategy::Partitioned, Strategy::Survey] {
        let infector = Infector::new(InfectorPolicy::default(), &disease)
            .with_strategy(strategy)
            .expect("strategy compatible with the default policy");
        for size in CLUSTER_SIZES {
            let (population, mut cluster) = community(size);
            let mut rng = RandomStream::new(SEED, 1, 0);
            group.bench_with_input(
                BenchmarkId::new(strategy.to_string(), size),
                &size,
                |bencher, _| {
                    bencher.iter(|| {
                        black_box(infector.execute(&mut cluster, &population, 0, &mut rng))
                    });
                },
            );
        }
    }
    group.finish();
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
