use std::fmt::{self, Debug, Display, Formatter};

use serde::{Deserialize, Serialize};
use strum::EnumCount;

use crate::cluster::ClusterType;
use crate::health::Health;
use crate::people::belief::{BehaviourPolicy, Belief};

/// People up to this age are subject to school days off.
pub const MIN_ADULT_AGE: f64 = 18.0;

/// A handle to an individual in the [`Population`](crate::people::Population). It stays valid
/// for the lifetime of the population because individuals are never removed.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PersonId(pub(crate) usize);

impl PersonId {
    pub fn new(index: usize) -> PersonId {
        PersonId(index)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

impl Display for PersonId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Debug for PersonId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Person {}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Person {
    id: PersonId,
    age: f64,
    /// Cluster id per cluster type. Id 0 means "not a member of a cluster of this type".
    cluster_ids: [u32; ClusterType::COUNT],
    /// Presence per cluster type, recomputed every day.
    presence: [bool; ClusterType::COUNT],
    health: Health,
    belief: Belief,
    is_participant: bool,
    on_leave: bool,
}

impl Person {
    pub fn new(
        id: PersonId,
        age: f64,
        cluster_ids: [u32; ClusterType::COUNT],
        health: Health,
    ) -> Person {
        Person {
            id,
            age,
            cluster_ids,
            presence: [true; ClusterType::COUNT],
            health,
            belief: Belief::default(),
            is_participant: false,
            on_leave: false,
        }
    }

    pub fn id(&self) -> PersonId {
        self.id
    }

    pub fn age(&self) -> f64 {
        self.age
    }

    pub fn cluster_id(&self, cluster_type: ClusterType) -> u32 {
        self.cluster_ids[cluster_type.index()]
    }

    pub fn cluster_ids(&self) -> &[u32; ClusterType::COUNT] {
        &self.cluster_ids
    }

    pub fn health(&self) -> &Health {
        &self.health
    }

    pub fn health_mut(&mut self) -> &mut Health {
        &mut self.health
    }

    pub fn belief(&self) -> &Belief {
        &self.belief
    }

    pub fn belief_mut(&mut self) -> &mut Belief {
        &mut self.belief
    }

    pub fn set_belief(&mut self, belief: Belief) {
        self.belief = belief;
    }

    /// Whether the person attends their cluster of the given type today.
    pub fn is_in_cluster(&self, cluster_type: ClusterType) -> bool {
        self.presence[cluster_type.index()] && !self.on_leave
    }

    pub fn is_participating_in_survey(&self) -> bool {
        self.is_participant
    }

    pub fn participate_in_survey(&mut self) {
        self.is_participant = true;
    }

    pub fn is_on_leave(&self) -> bool {
        self.on_leave
    }

    pub fn set_on_leave(&mut self, on_leave: bool) {
        self.on_leave = on_leave;
    }

    /// The daily update that runs before any contacts: disease progression, behaviour and
    /// presence in clusters.
    pub fn update(&mut self, is_work_off: bool, is_school_off: bool, behaviour: BehaviourPolicy) {
        self.health.update();

        // Susceptible people, and infected people who do not know it yet, may get vaccinated.
        let unaware = self.health.is_susceptible()
            || (self.health.is_infected() && !self.health.is_symptomatic());
        if unaware && behaviour.practices_vaccination(&self.belief) {
            self.health.set_immune();
        }

        let stays_home = is_work_off || (self.age <= MIN_ADULT_AGE && is_school_off);
        self.presence[ClusterType::School.index()] = !stays_home;
        self.presence[ClusterType::Work.index()] = !stays_home;
        self.presence[ClusterType::SecondaryCommunity.index()] = !stays_home;
        self.presence[ClusterType::PrimaryCommunity.index()] = stays_home;
        self.presence[ClusterType::Household.index()] = true;
    }
}
