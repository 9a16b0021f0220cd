//! Individuals and the population arena that owns them.
//!
//! Everything outside this module refers to individuals through [`PersonId`], a plain index
//! into the [`Population`]. Clusters hold ids, never references, so the population can be
//! borrowed immutably by many clusters at once while the contact rounds run.
mod belief;
mod person;
mod population;

pub use belief::{BehaviourPolicy, Belief, BeliefPolicy, Observation};
pub use person::{Person, PersonId, MIN_ADULT_AGE};
pub use population::{HealthCounts, Population};
