//! The day loop.
//!
//! A day starts with the person update (disease progression, behaviour, presence), then runs
//! one contact round per cluster type in the order of [`ClusterType::ALL`], and ends by
//! advancing the calendar. Each round finishes, and its outcomes are applied, before the next
//! one starts, so a person infected in their household is already exposed at school.
use log::{debug, info, trace};
use strum::EnumCount;

use crate::calendar::{Calendar, DaysOff};
use crate::cluster::{Cluster, ClusterType, ContactProfiles, GeoCoordinate};
use crate::error::StrideError;
use crate::health::Health;
use crate::infector::{ContactObserver, Infector};
use crate::people::{BehaviourPolicy, PersonId, Population};
use crate::scheduler::Scheduler;

use std::sync::Arc;

pub struct Simulator {
    population: Population,
    /// Clusters by type, indexed by cluster id. Id 0 stands for "no cluster" and is never
    /// joined.
    clusters: [Vec<Cluster>; ClusterType::COUNT],
    profiles: Arc<ContactProfiles>,
    calendar: Calendar,
    days_off: DaysOff,
    behaviour: BehaviourPolicy,
    infector: Infector,
    scheduler: Scheduler,
    observer: Box<dyn ContactObserver>,
}

impl Simulator {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        population: Population,
        clusters: [Vec<Cluster>; ClusterType::COUNT],
        profiles: Arc<ContactProfiles>,
        calendar: Calendar,
        days_off: DaysOff,
        behaviour: BehaviourPolicy,
        infector: Infector,
        scheduler: Scheduler,
        observer: Box<dyn ContactObserver>,
    ) -> Simulator {
        Simulator {
            population,
            clusters,
            profiles,
            calendar,
            days_off,
            behaviour,
            infector,
            scheduler,
            observer,
        }
    }

    pub fn population(&self) -> &Population {
        &self.population
    }

    pub fn population_mut(&mut self) -> &mut Population {
        &mut self.population
    }

    pub fn calendar(&self) -> &Calendar {
        &self.calendar
    }

    pub fn calendar_mut(&mut self) -> &mut Calendar {
        &mut self.calendar
    }

    pub fn clusters(&self, cluster_type: ClusterType) -> &[Cluster] {
        &self.clusters[cluster_type.index()]
    }

    pub fn clusters_mut(&mut self, cluster_type: ClusterType) -> &mut [Cluster] {
        &mut self.clusters[cluster_type.index()]
    }

    pub fn infector(&self) -> &Infector {
        &self.infector
    }

    pub fn num_workers(&self) -> usize {
        self.scheduler.num_workers()
    }

    pub fn set_observer(&mut self, observer: Box<dyn ContactObserver>) {
        self.observer = observer;
    }

    /// Simulates one day.
    pub fn time_step(&mut self) {
        let simulation_day = self.calendar.simulation_day();
        let is_work_off = self.days_off.is_work_off(&self.calendar);
        let is_school_off = self.days_off.is_school_off(&self.calendar);
        trace!(
            "day {simulation_day} ({}): work off {is_work_off}, school off {is_school_off}",
            self.calendar.date()
        );

        let Simulator {
            population,
            clusters,
            scheduler,
            infector,
            observer,
            behaviour,
            ..
        } = self;

        scheduler.install(|| population.update(is_work_off, is_school_off, *behaviour));

        for cluster_type in ClusterType::ALL {
            let outcomes = scheduler.run_round(
                &mut clusters[cluster_type.index()],
                population,
                infector,
                simulation_day,
            );
            for outcome in outcomes {
                outcome.apply(population, observer.as_mut());
            }
        }

        self.calendar.advance_day();
    }

    /// Simulates `num_days` days.
    pub fn run(&mut self, num_days: u32) {
        info!(
            "Simulating {num_days} days for {} people on {} workers",
            self.population.len(),
            self.num_workers()
        );
        for _ in 0..num_days {
            self.time_step();
        }
        debug!(
            "finished day {} with {} cases",
            self.calendar.simulation_day(),
            self.population.infected_count()
        );
    }

    /// Adds a person, e.g. someone arriving from another region, and makes them a member of
    /// the clusters named by `cluster_ids`. Clusters that do not exist yet are created.
    ///
    /// # Errors
    /// Cluster ids index dense vectors, so an id above the new population size is a
    /// `PopulationError` and nothing is added.
    pub fn add_person(
        &mut self,
        age: f64,
        cluster_ids: [u32; ClusterType::COUNT],
        health: Health,
    ) -> Result<PersonId, StrideError> {
        let max_id = self.population.len() + 1;
        if let Some(cluster_id) = cluster_ids.iter().find(|id| **id as usize > max_id) {
            return Err(StrideError::PopulationError(format!(
                "cluster id {cluster_id} exceeds the population size {max_id}"
            )));
        }

        let person_id = self.population.add_person(age, cluster_ids, health);
        for cluster_type in ClusterType::ALL {
            let cluster_id = cluster_ids[cluster_type.index()];
            if cluster_id == 0 {
                continue;
            }
            let clusters = &mut self.clusters[cluster_type.index()];
            while clusters.len() <= cluster_id as usize {
                let id = u32::try_from(clusters.len()).unwrap_or(u32::MAX);
                clusters.push(Cluster::new(
                    id,
                    cluster_type,
                    GeoCoordinate::default(),
                    Arc::clone(&self.profiles),
                ));
            }
            clusters[cluster_id as usize].add_member(person_id);
        }
        Ok(person_id)
    }

    /// Takes a person out of all their clusters, e.g. when they leave for another region. The
    /// person stays in the population; mark them with [`Population::set_on_leave()`].
    pub fn remove_person_from_clusters(&mut self, person_id: PersonId) {
        let cluster_ids = *self.population.get(person_id).cluster_ids();
        for cluster_type in ClusterType::ALL {
            let cluster_id = cluster_ids[cluster_type.index()] as usize;
            if cluster_id == 0 {
                continue;
            }
            if let Some(cluster) = self.clusters[cluster_type.index()].get_mut(cluster_id) {
                cluster.remove_member(person_id);
            }
        }
    }

    /// The positions of all worker random streams, in worker order.
    pub fn rng_states(&self) -> Vec<String> {
        self.scheduler
            .streams()
            .iter()
            .map(|stream| stream.state())
            .collect()
    }

    /// Restores positions exported with [`Simulator::rng_states()`]. Only valid between days.
    pub fn set_rng_states(&mut self, states: &[String]) -> Result<(), StrideError> {
        let streams = self.scheduler.streams_mut();
        if states.len() != streams.len() {
            return Err(StrideError::CheckpointError(format!(
                "expected {} random stream states, got {}",
                streams.len(),
                states.len()
            )));
        }
        for (stream, state) in streams.iter_mut().zip(states) {
            stream.set_state(state)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::SimulatorBuilder;
    use crate::config::SimulationConfig;
    use crate::infector::{ContactRecord, LogMode, TransmissionRecord};
    use crate::population_loader::PersonRecord;
    use rustc_hash::FxHashSet;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn config(num_workers: usize) -> SimulationConfig {
        let json = serde_json::json!({
            "rng_seed": 11,
            "num_days": 10,
            "num_workers": num_workers,
            "r0": 8.0,
            "seeding_rate": 0.05,
            "immunity_rate": 0.2,
            "disease": {
                "b0": 0.0, "b1": 10.0,
                "start_infectiousness": [0.0, 1.0],
                "start_symptomatic": [0.0, 0.0, 1.0],
                "time_infectious": [0.0, 0.0, 0.0, 0.5, 1.0],
                "time_symptomatic": [0.0, 0.0, 0.0, 1.0]
            },
            "contact_matrix": { "Household": [4.0], "Work": [6.0], "PrimaryCommunity": [2.0] }
        });
        SimulationConfig::from_json(&json.to_string()).unwrap()
    }

    fn people() -> Vec<PersonRecord> {
        (0..200)
            .map(|i| PersonRecord {
                age: f64::from(20 + i % 50),
                household_id: i / 4 + 1,
                school_id: 0,
                work_id: i % 10 + 1,
                primary_community: i % 2 + 1,
                secondary_community: 0,
                risk_averseness: 0.0,
            })
            .collect()
    }

    fn simulator(num_workers: usize) -> Simulator {
        SimulatorBuilder::new(config(num_workers))
            .people(people())
            .build()
            .unwrap()
    }

    #[derive(Default)]
    struct SharedObserver {
        transmissions: Rc<RefCell<Vec<TransmissionRecord>>>,
    }

    impl ContactObserver for SharedObserver {
        fn transmission(&mut self, record: &TransmissionRecord) {
            self.transmissions.borrow_mut().push(*record);
        }

        fn contact(&mut self, _record: &ContactRecord) {}
    }

    #[test]
    fn time_step_advances_calendar() {
        let mut simulator = simulator(1);
        let start = simulator.calendar().date();
        simulator.time_step();
        assert_eq!(simulator.calendar().simulation_day(), 1);
        assert_eq!(simulator.calendar().date(), start.succ_opt().unwrap());
    }

    #[test]
    fn epidemic_spreads() {
        let mut simulator = simulator(2);
        let seeded = simulator.population().infected_count();
        simulator.run(10);
        assert!(simulator.population().infected_count() > seeded);
        assert_eq!(simulator.population().immune_count(), 40);
    }

    #[test]
    fn same_seed_and_workers_are_reproducible() {
        let mut first = simulator(3);
        let mut second = simulator(3);
        for _ in 0..10 {
            first.time_step();
            second.time_step();
            assert_eq!(
                first.population().health_counts(),
                second.population().health_counts()
            );
        }
        let health = |simulator: &Simulator| -> Vec<Health> {
            simulator.population().iter().map(|person| *person.health()).collect()
        };
        assert_eq!(health(&first), health(&second));
    }

    #[test]
    fn nobody_is_infected_twice() {
        let mut config = config(2);
        config.log_mode = LogMode::Transmissions;
        let mut simulator = SimulatorBuilder::new(config)
            .people(people())
            .build()
            .unwrap();
        let transmissions = Rc::new(RefCell::new(Vec::new()));
        simulator.set_observer(Box::new(SharedObserver {
            transmissions: Rc::clone(&transmissions),
        }));
        let seeded = simulator.population().infected_count();
        simulator.run(10);

        let transmissions = transmissions.borrow();
        let infected: FxHashSet<PersonId> =
            transmissions.iter().map(|record| record.infected).collect();
        assert_eq!(infected.len(), transmissions.len());
        assert_eq!(
            seeded + transmissions.len(),
            simulator.population().infected_count()
        );
        assert!(transmissions.iter().all(|record| record.simulation_day < 10));
    }

    #[test]
    fn added_person_joins_new_clusters() {
        let mut simulator = simulator(1);
        let households = simulator.clusters(ClusterType::Household).len();
        let person_id = simulator.add_person(
            40.0,
            [households as u32 + 2, 0, 1, 0, 0],
            Health::new(1, 1, 1, 1),
        )
        .unwrap();
        let households = simulator.clusters(ClusterType::Household);
        assert_eq!(households.last().unwrap().members(), &[(person_id, true)]);
        assert_eq!(households[households.len() - 2].size(), 0);
        assert!(simulator.clusters(ClusterType::Work)[1]
            .members()
            .iter()
            .any(|(id, _)| *id == person_id));
        simulator.time_step();
    }

    #[test]
    fn added_person_with_oversized_cluster_id_is_rejected() {
        let mut simulator = simulator(1);
        let result =
            simulator.add_person(40.0, [4_000_000_000, 0, 0, 0, 0], Health::new(1, 1, 1, 1));
        assert!(matches!(result, Err(StrideError::PopulationError(_))));
        assert_eq!(simulator.population().len(), 200);
        assert_eq!(simulator.clusters(ClusterType::Household).len(), 51);
    }

    #[test]
    fn removed_person_leaves_all_clusters() {
        let mut simulator = simulator(1);
        let person_id = PersonId::new(5);
        simulator.remove_person_from_clusters(person_id);
        for cluster_type in ClusterType::ALL {
            assert!(simulator
                .clusters(cluster_type)
                .iter()
                .all(|cluster| cluster.members().iter().all(|(id, _)| *id != person_id)));
        }
        simulator.population_mut().set_on_leave(person_id, true);
        simulator.time_step();
    }

    #[test]
    fn rng_states_round_trip() {
        let mut simulator = simulator(2);
        let states = simulator.rng_states();
        assert_eq!(states.len(), 2);
        simulator.run(3);
        assert_ne!(simulator.rng_states(), states);
        simulator.set_rng_states(&states).unwrap();
        assert_eq!(simulator.rng_states(), states);
    }

    #[test]
    fn rng_state_count_must_match_workers() {
        let mut simulator = simulator(2);
        let mut states = simulator.rng_states();
        states.pop();
        assert!(matches!(
            simulator.set_rng_states(&states),
            Err(StrideError::CheckpointError(_))
        ));
    }
}
