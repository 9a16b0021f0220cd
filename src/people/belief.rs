//! Health beliefs and the behaviour they drive.
//!
//! A person with a threshold belief adopts the belief once the fraction of their contacts
//! who were symptomatic (or who had adopted the belief themselves) exceeds a personal
//! threshold of `1 - risk_averseness`. Beliefs only change through the local-discussion
//! information policy, which reports every contact to both sides.
use serde::{Deserialize, Serialize};

use crate::health::Health;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BeliefPolicy {
    #[default]
    NoBelief,
    /// Adoption is triggered by symptomatic contacts, adopting contacts, or both.
    Threshold { infected: bool, adopted: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BehaviourPolicy {
    #[default]
    NoBehaviour,
    /// Persons who adopted the belief get vaccinated while they can still benefit from it.
    Vaccination,
}

impl BehaviourPolicy {
    pub fn practices_vaccination(self, belief: &Belief) -> bool {
        match self {
            BehaviourPolicy::NoBehaviour => false,
            BehaviourPolicy::Vaccination => belief.has_adopted(),
        }
    }
}

/// What one side of a contact observes about the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Observation {
    pub symptomatic: bool,
    pub adopted: bool,
}

impl Observation {
    pub fn of(health: &Health, belief: &Belief) -> Observation {
        Observation {
            symptomatic: health.is_symptomatic(),
            adopted: belief.has_adopted(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Belief {
    policy: BeliefPolicy,
    num_contacts: u32,
    num_contacts_infected: u32,
    num_contacts_adopted: u32,
    threshold_infected: f64,
    threshold_adopted: f64,
}

impl Default for Belief {
    fn default() -> Self {
        Belief::new(BeliefPolicy::NoBelief, 0.0)
    }
}

impl Belief {
    pub fn new(policy: BeliefPolicy, risk_averseness: f64) -> Belief {
        let mut belief = Belief {
            policy,
            num_contacts: 0,
            num_contacts_infected: 0,
            num_contacts_adopted: 0,
            threshold_infected: 1.0,
            threshold_adopted: 1.0,
        };
        if let BeliefPolicy::Threshold { infected, adopted } = policy {
            if infected {
                belief.threshold_infected = 1.0 - risk_averseness;
            }
            if adopted {
                belief.threshold_adopted = 1.0 - risk_averseness;
            }
        }
        belief
    }

    pub fn policy(&self) -> BeliefPolicy {
        self.policy
    }

    pub fn num_contacts(&self) -> u32 {
        self.num_contacts
    }

    pub fn fraction_infected(&self) -> f64 {
        if self.num_contacts == 0 {
            return 0.0;
        }
        f64::from(self.num_contacts_infected) / f64::from(self.num_contacts)
    }

    pub fn fraction_adopted(&self) -> f64 {
        if self.num_contacts == 0 {
            return 0.0;
        }
        f64::from(self.num_contacts_adopted) / f64::from(self.num_contacts)
    }

    pub fn has_adopted(&self) -> bool {
        match self.policy {
            BeliefPolicy::NoBelief => false,
            BeliefPolicy::Threshold { infected, adopted } => {
                (infected && self.fraction_infected() > self.threshold_infected)
                    || (adopted && self.fraction_adopted() > self.threshold_adopted)
            }
        }
    }

    /// Records a contact with someone in the observed state.
    pub fn observe(&mut self, other: Observation) {
        if self.policy == BeliefPolicy::NoBelief {
            return;
        }
        self.num_contacts += 1;
        if other.symptomatic {
            self.num_contacts_infected += 1;
        }
        if other.adopted {
            self.num_contacts_adopted += 1;
        }
    }
}
