use std::fmt::{self, Display, Formatter};

use log::info;
use serde::Serialize;

use crate::cluster::ClusterType;
use crate::health::Health;
use crate::people::{Belief, PersonId, Population};

/// The `log` target contact and transmission records are written to.
pub const CONTACT_LOG_TARGET: &str = "contact_logger";

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TransmissionRecord {
    pub infector: PersonId,
    pub infected: PersonId,
    pub cluster_type: ClusterType,
    pub simulation_day: u32,
}

impl Display for TransmissionRecord {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[TRAN] {} {} {} {}",
            self.infector, self.infected, self.cluster_type, self.simulation_day
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ContactRecord {
    pub person: PersonId,
    pub person_age: f64,
    pub contact_age: f64,
    pub cluster_type: ClusterType,
    pub simulation_day: u32,
}

impl Display for ContactRecord {
    /// One indicator column per cluster type, in the order household, school, work, primary
    /// community, secondary community.
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "[CONT] {} {} {}", self.person, self.person_age, self.contact_age)?;
        for cluster_type in ClusterType::ALL {
            write!(f, " {}", u8::from(cluster_type == self.cluster_type))?;
        }
        write!(f, " {}", self.simulation_day)
    }
}

/// Receives the records of every round, in cluster order, on the orchestrating thread.
pub trait ContactObserver {
    fn transmission(&mut self, record: &TransmissionRecord);
    fn contact(&mut self, record: &ContactRecord);
}

/// Discards all records.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl ContactObserver for NullObserver {
    fn transmission(&mut self, _record: &TransmissionRecord) {}
    fn contact(&mut self, _record: &ContactRecord) {}
}

/// Writes records as text lines to the [`CONTACT_LOG_TARGET`] log target.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl ContactObserver for LogObserver {
    fn transmission(&mut self, record: &TransmissionRecord) {
        info!(target: CONTACT_LOG_TARGET, "{record}");
    }

    fn contact(&mut self, record: &ContactRecord) {
        info!(target: CONTACT_LOG_TARGET, "{record}");
    }
}

/// Keeps every record in memory.
#[derive(Debug, Default, Clone)]
pub struct RecordingObserver {
    pub transmissions: Vec<TransmissionRecord>,
    pub contacts: Vec<ContactRecord>,
}

impl ContactObserver for RecordingObserver {
    fn transmission(&mut self, record: &TransmissionRecord) {
        self.transmissions.push(*record);
    }

    fn contact(&mut self, record: &ContactRecord) {
        self.contacts.push(*record);
    }
}

/// The new state of one member after a contact round.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MemberUpdate {
    pub person_id: PersonId,
    pub health: Health,
    pub belief: Belief,
}

/// Everything a contact round changed in one cluster. Computed while the population is
/// shared, applied afterwards.
#[derive(Debug, Default, Clone)]
pub struct ClusterOutcome {
    pub updates: Vec<MemberUpdate>,
    pub transmissions: Vec<TransmissionRecord>,
    pub contacts: Vec<ContactRecord>,
}

impl ClusterOutcome {
    pub fn is_empty(&self) -> bool {
        self.updates.is_empty() && self.transmissions.is_empty() && self.contacts.is_empty()
    }

    /// Writes the changed members back and forwards the records to `observer`.
    pub fn apply(self, population: &mut Population, observer: &mut dyn ContactObserver) {
        for update in self.updates {
            let person = population.get_mut(update.person_id);
            *person.health_mut() = update.health;
            person.set_belief(update.belief);
        }
        for record in &self.transmissions {
            observer.transmission(record);
        }
        for record in &self.contacts {
            observer.contact(record);
        }
    }
}
