//! The contact and transmission engine.
//!
//! For one cluster and one day, the engine decides which present members make contact and
//! whether a contact passes the disease on. It runs with shared access to the
//! [`Population`], so it never writes to it: the health and belief of the members are copied
//! into a working set, every change is applied to the copies (later pairs in the same cluster
//! see earlier infections), and the changed members come back in a [`ClusterOutcome`] that
//! the caller applies once the round is over.
//!
//! Three strategies exist, see [`Strategy`]. With logging off and draws that always or never
//! succeed, [`Strategy::AllPairs`] and [`Strategy::Partitioned`] infect exactly the same
//! people.
mod policy;
mod records;

pub use policy::{InfectorPolicy, InformationPolicy, LogMode, Strategy};
pub use records::{
    ClusterOutcome, ContactObserver, ContactRecord, LogObserver, MemberUpdate, NullObserver,
    RecordingObserver, TransmissionRecord, CONTACT_LOG_TARGET,
};

use crate::cluster::{Cluster, ClusterType};
use crate::disease::DiseaseProfile;
use crate::error::StrideError;
use crate::health::Health;
use crate::people::{Belief, Observation, PersonId, Population};
use crate::random::ContactDraws;

/// The working copy of one member.
#[derive(Debug, Clone, Copy)]
struct MemberState {
    person_id: PersonId,
    present: bool,
    age: f64,
    contact_rate: f64,
    is_participant: bool,
    health: Health,
    belief: Belief,
    changed: bool,
}

fn gather(cluster: &Cluster, population: &Population) -> Vec<MemberState> {
    cluster
        .members()
        .iter()
        .map(|&(person_id, present)| {
            let person = population.get(person_id);
            MemberState {
                person_id,
                present,
                age: person.age(),
                contact_rate: cluster.contact_rate(person),
                is_participant: person.is_participating_in_survey(),
                health: *person.health(),
                belief: *person.belief(),
                changed: false,
            }
        })
        .collect()
}

fn scatter(members: Vec<MemberState>, outcome: &mut ClusterOutcome) {
    outcome.updates.extend(
        members
            .into_iter()
            .filter(|member| member.changed)
            .map(|member| MemberUpdate {
                person_id: member.person_id,
                health: member.health,
                belief: member.belief,
            }),
    );
}

#[derive(Debug, Clone, Copy)]
pub struct Infector {
    policy: InfectorPolicy,
    strategy: Strategy,
    transmission_rate: f64,
}

impl Infector {
    pub fn new(policy: InfectorPolicy, disease: &DiseaseProfile) -> Infector {
        Infector {
            policy,
            strategy: policy.strategy(),
            transmission_rate: disease.transmission_rate(),
        }
    }

    /// Uses `strategy` instead of the one the policy resolves to, e.g. to compare strategies.
    ///
    /// Only [`Strategy::AllPairs`] exchanges information, so any other strategy is rejected
    /// for a [`InformationPolicy::LocalDiscussion`] policy. [`Strategy::Survey`] only records
    /// contacts when the log mode is [`LogMode::Contacts`]; with any other log mode it still
    /// infects but emits no contact records.
    pub fn with_strategy(mut self, strategy: Strategy) -> Result<Infector, StrideError> {
        if self.policy.information_policy == InformationPolicy::LocalDiscussion
            && strategy != Strategy::AllPairs
        {
            return Err(StrideError::ConfigError(format!(
                "the {strategy} strategy cannot exchange information"
            )));
        }
        self.strategy = strategy;
        Ok(self)
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    pub fn policy(&self) -> InfectorPolicy {
        self.policy
    }

    pub fn transmission_rate(&self) -> f64 {
        self.transmission_rate
    }

    /// Runs one day of contacts in `cluster`.
    pub fn execute<R: ContactDraws>(
        &self,
        cluster: &mut Cluster,
        population: &Population,
        simulation_day: u32,
        rng: &mut R,
    ) -> ClusterOutcome {
        match self.strategy {
            Strategy::AllPairs => self.all_pairs(cluster, population, simulation_day, rng),
            Strategy::Partitioned => self.partitioned(cluster, population, simulation_day, rng),
            Strategy::Survey => self.survey(cluster, population, simulation_day, rng),
        }
    }

    /// Every unordered pair of present members. The contact draw uses the contact rate of
    /// the first member of the pair only.
    pub fn all_pairs<R: ContactDraws>(
        &self,
        cluster: &mut Cluster,
        population: &Population,
        simulation_day: u32,
        rng: &mut R,
    ) -> ClusterOutcome {
        cluster.update_presence(population);
        let cluster_type = cluster.cluster_type();
        let mut members = gather(cluster, population);
        let mut outcome = ClusterOutcome::default();

        for i in 0..members.len() {
            if !members[i].present {
                continue;
            }
            for j in i + 1..members.len() {
                if !members[j].present || !rng.has_contact(members[i].contact_rate) {
                    continue;
                }
                if self.policy.information_policy == InformationPolicy::LocalDiscussion {
                    exchange_information(&mut members, i, j);
                }
                if rng.has_transmission(self.transmission_rate) {
                    self.transmit(&mut members, i, j, cluster_type, simulation_day, &mut outcome);
                }
                if self.policy.logs_contacts() {
                    outcome.contacts.push(contact_record(
                        &members[i],
                        &members[j],
                        cluster_type,
                        simulation_day,
                    ));
                }
            }
        }

        scatter(members, &mut outcome);
        outcome
    }

    /// Infectious cases against susceptible members only, with a single combined contact
    /// and transmission draw per pair. Clusters without an infectious case are skipped.
    pub fn partitioned<R: ContactDraws>(
        &self,
        cluster: &mut Cluster,
        population: &Population,
        simulation_day: u32,
        rng: &mut R,
    ) -> ClusterOutcome {
        let (infectious_cases, num_cases) = cluster.sort_by_health(population);
        if !infectious_cases {
            return ClusterOutcome::default();
        }

        cluster.update_presence(population);
        let cluster_type = cluster.cluster_type();
        let immune_boundary = cluster.immune_boundary();
        let mut members = gather(cluster, population);
        let mut outcome = ClusterOutcome::default();

        for i in 0..num_cases {
            let infector = members[i];
            if !infector.present || !infector.health.is_infectious() {
                continue;
            }
            for target in &mut members[num_cases..immune_boundary] {
                if !target.present
                    || !rng.has_contact_and_transmission(infector.contact_rate, self.transmission_rate)
                {
                    continue;
                }
                // Someone infected earlier in this pass is drawn for, but not infected twice.
                if target.health.is_susceptible() {
                    self.infect(target);
                    if self.policy.logs_transmissions() {
                        outcome.transmissions.push(TransmissionRecord {
                            infector: infector.person_id,
                            infected: target.person_id,
                            cluster_type,
                            simulation_day,
                        });
                    }
                }
            }
        }

        scatter(members, &mut outcome);
        outcome
    }

    /// Survey participants against every other present member, with separate contact and
    /// transmission draws. Every contact of a participant is recorded.
    pub fn survey<R: ContactDraws>(
        &self,
        cluster: &mut Cluster,
        population: &Population,
        simulation_day: u32,
        rng: &mut R,
    ) -> ClusterOutcome {
        cluster.update_presence(population);
        let cluster_type = cluster.cluster_type();
        let mut members = gather(cluster, population);
        let mut outcome = ClusterOutcome::default();

        for i in 0..members.len() {
            if !members[i].present || !members[i].is_participant {
                continue;
            }
            for j in 0..members.len() {
                if i == j || !members[j].present || !rng.has_contact(members[i].contact_rate) {
                    continue;
                }
                if rng.has_transmission(self.transmission_rate) {
                    self.transmit(&mut members, i, j, cluster_type, simulation_day, &mut outcome);
                }
                if self.policy.logs_contacts() {
                    outcome.contacts.push(contact_record(
                        &members[i],
                        &members[j],
                        cluster_type,
                        simulation_day,
                    ));
                }
            }
        }

        scatter(members, &mut outcome);
        outcome
    }

    fn infect(&self, member: &mut MemberState) {
        member.health.start_infection();
        if self.policy.track_index_case {
            member.health.stop_infection();
        }
        member.changed = true;
    }

    /// A transmitting contact infects whichever side is susceptible if the other side is
    /// infectious.
    fn transmit(
        &self,
        members: &mut [MemberState],
        i: usize,
        j: usize,
        cluster_type: ClusterType,
        simulation_day: u32,
        outcome: &mut ClusterOutcome,
    ) {
        let (infector, infected) =
            if members[i].health.is_infectious() && members[j].health.is_susceptible() {
                (i, j)
            } else if members[j].health.is_infectious() && members[i].health.is_susceptible() {
                (j, i)
            } else {
                return;
            };

        self.infect(&mut members[infected]);
        if self.policy.logs_transmissions() {
            outcome.transmissions.push(TransmissionRecord {
                infector: members[infector].person_id,
                infected: members[infected].person_id,
                cluster_type,
                simulation_day,
            });
        }
    }
}

/// Both sides observe each other as they were before the exchange.
fn exchange_information(members: &mut [MemberState], i: usize, j: usize) {
    let seen_by_i = Observation::of(&members[j].health, &members[j].belief);
    let seen_by_j = Observation::of(&members[i].health, &members[i].belief);
    for (index, observation) in [(i, seen_by_i), (j, seen_by_j)] {
        let member = &mut members[index];
        let before = member.belief;
        member.belief.observe(observation);
        member.changed |= member.belief != before;
    }
}

fn contact_record(
    person: &MemberState,
    contact: &MemberState,
    cluster_type: ClusterType,
    simulation_day: u32,
) -> ContactRecord {
    ContactRecord {
        person: person.person_id,
        person_age: person.age,
        contact_age: contact.age,
        cluster_type,
        simulation_day,
    }
}
