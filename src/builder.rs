//! Assembles a [`Simulator`] from a [`SimulationConfig`] and a list of people.
//!
//! All randomness of the build step (disease timers, survey participants, immunity and
//! seeding) comes from one stream seeded with the configured seed. The worker streams use a
//! seed drawn from that stream.
use std::sync::Arc;

use log::{debug, info};
use strum::EnumCount;

use crate::calendar::Calendar;
use crate::cluster::{Cluster, ClusterType, ContactProfiles, GeoCoordinate};
use crate::config::SimulationConfig;
use crate::error::StrideError;
use crate::infector::{ContactObserver, Infector, LogMode, LogObserver, NullObserver};
use crate::people::{Belief, BeliefPolicy, PersonId, Population};
use crate::population_loader::{check_cluster_ids, load_people, PersonRecord};
use crate::random::RandomStream;
use crate::scheduler::Scheduler;
use crate::simulator::Simulator;

pub struct SimulatorBuilder {
    config: SimulationConfig,
    people: Option<Vec<PersonRecord>>,
    observer: Option<Box<dyn ContactObserver>>,
}

impl SimulatorBuilder {
    pub fn new(config: SimulationConfig) -> SimulatorBuilder {
        SimulatorBuilder {
            config,
            people: None,
            observer: None,
        }
    }

    /// Uses these people instead of reading the configured population file.
    #[must_use]
    pub fn people(mut self, people: Vec<PersonRecord>) -> SimulatorBuilder {
        self.people = Some(people);
        self
    }

    /// Receives the contact and transmission records. Defaults to writing them to the contact
    /// log when a log mode is configured.
    #[must_use]
    pub fn observer(mut self, observer: Box<dyn ContactObserver>) -> SimulatorBuilder {
        self.observer = Some(observer);
        self
    }

    pub fn build(self) -> Result<Simulator, StrideError> {
        let SimulatorBuilder {
            config,
            people,
            observer,
        } = self;
        config.validate()?;

        let people = match people {
            Some(people) => people,
            None => {
                let path = config.population_file.as_deref().ok_or_else(|| {
                    StrideError::ConfigError("no population_file configured".to_string())
                })?;
                load_people(path)?
            }
        };
        if people.is_empty() {
            return Err(StrideError::PopulationError(
                "the population is empty".to_string(),
            ));
        }
        check_cluster_ids(&people)?;

        let mut rng = RandomStream::new(config.rng_seed, 1, 0);
        let population = build_population(&config, &people, &mut rng)?;

        let profiles = Arc::new(config.contact_profiles()?);
        let clusters = build_clusters(&population, &profiles);
        for cluster_type in ClusterType::ALL {
            debug!(
                "{} {cluster_type} clusters",
                clusters[cluster_type.index()].len().saturating_sub(1)
            );
        }

        let disease = config.disease_profile()?;
        let infector = Infector::new(config.infector_policy(), &disease);
        info!(
            "transmission rate {} using the {} strategy",
            disease.transmission_rate(),
            infector.strategy()
        );

        let worker_seed = u64::from(rng.next_u32());
        let scheduler = Scheduler::new(worker_seed, config.num_workers)?;

        let calendar = Calendar::new(
            config.start_date,
            config.holidays.clone(),
            config.school_holidays.clone(),
        );

        let observer = observer.unwrap_or_else(|| match config.log_mode {
            LogMode::None => Box::new(NullObserver),
            LogMode::Transmissions | LogMode::Contacts => Box::new(LogObserver),
        });

        Ok(Simulator::new(
            population,
            clusters,
            profiles,
            calendar,
            config.days_off,
            config.behaviour_policy,
            infector,
            scheduler,
            observer,
        ))
    }
}

fn build_population(
    config: &SimulationConfig,
    people: &[PersonRecord],
    rng: &mut RandomStream,
) -> Result<Population, StrideError> {
    let mut population = Population::new();
    for record in people {
        let health = config.disease.durations.sample_health(rng);
        let person_id = population.add_person(record.age, record.cluster_ids(), health);
        if config.belief_policy != BeliefPolicy::NoBelief {
            population
                .get_mut(person_id)
                .set_belief(Belief::new(config.belief_policy, record.risk_averseness));
        }
    }

    let size = population.len();
    let max_index = u32::try_from(size).map_err(|_| {
        StrideError::PopulationError(format!("population of {size} people is too large"))
    })?;
    let mut random_person = || PersonId::new(rng.next_below(max_index) as usize);

    if config.log_mode == LogMode::Contacts {
        if config.num_participants_survey > size {
            return Err(StrideError::ConfigError(format!(
                "{} survey participants requested from a population of {size}",
                config.num_participants_survey
            )));
        }
        let mut num_participants = 0;
        while num_participants < config.num_participants_survey {
            let person_id = random_person();
            let person = population.get_mut(person_id);
            if !person.is_participating_in_survey() {
                person.participate_in_survey();
                num_participants += 1;
            }
        }
    }

    // Both counts together never exceed the population, so the loops below end.
    let mut num_immune = (size as f64 * config.immunity_rate).floor() as usize;
    while num_immune > 0 {
        let person_id = random_person();
        let health = population.get_mut(person_id).health_mut();
        if health.is_susceptible() {
            health.set_immune();
            num_immune -= 1;
        }
    }

    let mut num_infected = (size as f64 * config.seeding_rate).floor() as usize;
    while num_infected > 0 {
        let person_id = random_person();
        let health = population.get_mut(person_id).health_mut();
        if health.is_susceptible() {
            health.start_infection();
            num_infected -= 1;
        }
    }

    info!(
        "built population of {size} people, {} immune, {} infected",
        population.immune_count(),
        population.infected_count()
    );
    Ok(population)
}

/// One vector of clusters per type, indexed by id, with the members in population order.
fn build_clusters(
    population: &Population,
    profiles: &Arc<ContactProfiles>,
) -> [Vec<Cluster>; ClusterType::COUNT] {
    ClusterType::ALL.map(|cluster_type| {
        let max_id = population
            .iter()
            .map(|person| person.cluster_id(cluster_type))
            .max()
            .unwrap_or(0);
        let mut clusters: Vec<Cluster> = (0..=max_id)
            .map(|id| Cluster::new(id, cluster_type, GeoCoordinate::default(), Arc::clone(profiles)))
            .collect();
        for person in population.iter() {
            let cluster_id = person.cluster_id(cluster_type);
            if cluster_id != 0 {
                clusters[cluster_id as usize].add_member(person.id());
            }
        }
        clusters
    })
}
