use log::trace;
use rayon::prelude::*;
use serde::Serialize;
use strum::EnumCount;

use crate::cluster::ClusterType;
use crate::health::Health;
use crate::people::belief::BehaviourPolicy;
use crate::people::person::{Person, PersonId};

/// Health counts over the active population on a given day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct HealthCounts {
    /// Everyone who is or has been infected.
    pub infected: usize,
    pub infectious: usize,
    pub symptomatic: usize,
    pub immune: usize,
}

/// The arena that owns every individual. A `PersonId` is an index into it, and the arena is
/// only ever appended to: people who leave the simulation are marked as on leave instead.
#[derive(Debug, Default, Clone)]
pub struct Population {
    people: Vec<Person>,
}

impl Population {
    pub fn new() -> Population {
        Population::default()
    }

    pub fn add_person(
        &mut self,
        age: f64,
        cluster_ids: [u32; ClusterType::COUNT],
        health: Health,
    ) -> PersonId {
        let person_id = PersonId(self.people.len());
        trace!("adding {person_id:?} aged {age}");
        self.people
            .push(Person::new(person_id, age, cluster_ids, health));
        person_id
    }

    pub fn len(&self) -> usize {
        self.people.len()
    }

    pub fn is_empty(&self) -> bool {
        self.people.is_empty()
    }

    /// Panics if `person_id` was not issued by this population.
    pub fn get(&self, person_id: PersonId) -> &Person {
        match self.people.get(person_id.0) {
            Some(person) => person,
            None => panic!("{person_id:?} is not part of the population"),
        }
    }

    /// Panics if `person_id` was not issued by this population.
    pub fn get_mut(&mut self, person_id: PersonId) -> &mut Person {
        match self.people.get_mut(person_id.0) {
            Some(person) => person,
            None => panic!("{person_id:?} is not part of the population"),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Person> {
        self.people.iter()
    }

    /// Everyone who is not on leave.
    pub fn iter_active(&self) -> impl Iterator<Item = &Person> {
        self.people.iter().filter(|person| !person.is_on_leave())
    }

    pub fn cluster_id(&self, person_id: PersonId, cluster_type: ClusterType) -> u32 {
        self.get(person_id).cluster_id(cluster_type)
    }

    pub fn health(&self, person_id: PersonId) -> Health {
        *self.get(person_id).health()
    }

    pub fn set_health(&mut self, person_id: PersonId, health: Health) {
        *self.get_mut(person_id).health_mut() = health;
    }

    pub fn set_on_leave(&mut self, person_id: PersonId, on_leave: bool) {
        self.get_mut(person_id).set_on_leave(on_leave);
    }

    /// Number of active people who are infected or have recovered.
    pub fn infected_count(&self) -> usize {
        self.iter_active()
            .filter(|person| person.health().is_infected() || person.health().is_recovered())
            .count()
    }

    pub fn immune_count(&self) -> usize {
        self.iter_active()
            .filter(|person| person.health().is_immune())
            .count()
    }

    pub fn health_counts(&self) -> HealthCounts {
        self.iter_active()
            .fold(HealthCounts::default(), |mut counts, person| {
                let health = person.health();
                if health.is_infected() || health.is_recovered() {
                    counts.infected += 1;
                }
                if health.is_infectious() {
                    counts.infectious += 1;
                }
                if health.is_symptomatic() {
                    counts.symptomatic += 1;
                }
                if health.is_immune() {
                    counts.immune += 1;
                }
                counts
            })
    }

    /// Runs the daily person update for everyone who is not on leave. Every person only
    /// touches their own state, so this runs in parallel on the current rayon pool.
    pub fn update(&mut self, is_work_off: bool, is_school_off: bool, behaviour: BehaviourPolicy) {
        self.people
            .par_iter_mut()
            .filter(|person| !person.is_on_leave())
            .for_each(|person| person.update(is_work_off, is_school_off, behaviour));
    }
}
