//! Fork-join execution of one contact round.
//!
//! The clusters of one type are cut into at most `W` contiguous chunks and chunk `k` always
//! runs on worker `k` with random stream `k`. Which stream a cluster draws from only depends
//! on the number of clusters and workers, so a run is reproducible for a given seed and
//! worker count no matter how the threads are scheduled.
use log::{debug, trace};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::cluster::Cluster;
use crate::error::StrideError;
use crate::infector::{ClusterOutcome, Infector};
use crate::people::Population;
use crate::random::RandomStream;

pub struct Scheduler {
    pool: ThreadPool,
    streams: Vec<RandomStream>,
}

impl Scheduler {
    pub fn new(seed: u64, num_workers: usize) -> Result<Scheduler, StrideError> {
        if num_workers == 0 {
            return Err(StrideError::ConfigError(
                "at least one worker is required".to_string(),
            ));
        }
        let pool = ThreadPoolBuilder::new()
            .num_threads(num_workers)
            .thread_name(|index| format!("stride-worker-{index}"))
            .build()?;
        debug!("created scheduler with {num_workers} workers (seed={seed})");
        Ok(Scheduler {
            pool,
            streams: RandomStream::for_workers(seed, num_workers),
        })
    }

    pub fn num_workers(&self) -> usize {
        self.streams.len()
    }

    pub fn streams(&self) -> &[RandomStream] {
        &self.streams
    }

    pub fn streams_mut(&mut self) -> &mut [RandomStream] {
        &mut self.streams
    }

    /// Runs `op` inside the worker pool.
    pub fn install<OP, R>(&self, op: OP) -> R
    where
        OP: FnOnce() -> R + Send,
        R: Send,
    {
        self.pool.install(op)
    }

    /// Runs the contact engine over every cluster in `clusters`. The outcomes are returned
    /// in cluster order.
    pub fn run_round(
        &mut self,
        clusters: &mut [Cluster],
        population: &Population,
        infector: &Infector,
        simulation_day: u32,
    ) -> Vec<ClusterOutcome> {
        if clusters.is_empty() {
            return Vec::new();
        }
        let Scheduler { pool, streams } = self;
        let chunk_size = clusters.len().div_ceil(streams.len());
        trace!(
            "round over {} clusters in chunks of {chunk_size}",
            clusters.len()
        );

        let outcomes: Vec<Vec<ClusterOutcome>> = pool.install(|| {
            clusters
                .par_chunks_mut(chunk_size)
                .zip(streams.par_iter_mut())
                .map(|(chunk, stream)| {
                    chunk
                        .iter_mut()
                        .map(|cluster| infector.execute(cluster, population, simulation_day, &mut *stream))
                        .collect()
                })
                .collect()
        });
        outcomes.into_iter().flatten().collect()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::cluster::{ClusterType, ContactProfiles, GeoCoordinate};
    use crate::disease::DiseaseProfile;
    use crate::health::Health;
    use crate::infector::{InfectorPolicy, NullObserver};

    fn world(num_clusters: u32, size: usize) -> (Population, Vec<Cluster>) {
        let profiles = Arc::new(ContactProfiles::uniform(3.0).unwrap());
        let mut population = Population::new();
        let mut clusters = Vec::new();
        for id in 0..num_clusters {
            let mut cluster = Cluster::new(id, ClusterType::Household, GeoCoordinate::default(), profiles.clone());
            for member in 0..size {
                let mut health = Health::new(1, 2, 3, 4);
                if member == 0 {
                    health.start_infection();
                    health.update();
                }
                let person_id = population.add_person(40.0, [id, 0, 0, 0, 0], health);
                cluster.add_member(person_id);
            }
            clusters.push(cluster);
        }
        (population, clusters)
    }

    fn infected_after_round(num_workers: usize, seed: u64) -> Vec<bool> {
        let (mut population, mut clusters) = world(37, 6);
        let infector = Infector::new(InfectorPolicy::default(), &DiseaseProfile::new(0.4).unwrap());
        let mut scheduler = Scheduler::new(seed, num_workers).unwrap();
        let outcomes = scheduler.run_round(&mut clusters, &population, &infector, 0);
        assert_eq!(outcomes.len(), clusters.len());
        for outcome in outcomes {
            outcome.apply(&mut population, &mut NullObserver);
        }
        population
            .iter()
            .map(|person| person.health().is_exposed())
            .collect()
    }

    #[test]
    fn zero_workers_is_an_error() {
        assert!(matches!(
            Scheduler::new(1, 0),
            Err(StrideError::ConfigError(_))
        ));
    }

    #[test]
    fn rounds_are_reproducible() {
        for num_workers in [1, 3, 8] {
            assert_eq!(
                infected_after_round(num_workers, 11),
                infected_after_round(num_workers, 11)
            );
        }
    }

    #[test]
    fn round_infects_someone() {
        let infected = infected_after_round(4, 5);
        assert!(infected.iter().any(|&exposed| exposed));
    }

    #[test]
    fn more_workers_than_clusters() {
        let (population, mut clusters) = world(2, 3);
        let infector = Infector::new(InfectorPolicy::default(), &DiseaseProfile::new(0.4).unwrap());
        let mut scheduler = Scheduler::new(1, 8).unwrap();
        let outcomes = scheduler.run_round(&mut clusters, &population, &infector, 0);
        assert_eq!(outcomes.len(), 2);
        assert!(scheduler
            .run_round(&mut [], &population, &infector, 0)
            .is_empty());
    }
}
