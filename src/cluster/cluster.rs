use std::sync::Arc;

use log::trace;
use serde::{Deserialize, Serialize};

use crate::cluster::{ClusterType, ContactProfiles};
use crate::people::{Person, PersonId, Population};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GeoCoordinate {
    pub latitude: f64,
    pub longitude: f64,
}

/// A group of people who meet each other, e.g. a household or a school.
///
/// Members are kept as `(PersonId, present today)` pairs. After
/// [`Cluster::sort_by_health()`] the member sequence is partitioned into three regions:
///
/// ```text
/// [0, num_cases)                   infected or recovered
/// [num_cases, immune_boundary)     susceptible
/// [immune_boundary, size)          immune
/// ```
#[derive(Debug, Clone)]
pub struct Cluster {
    id: u32,
    cluster_type: ClusterType,
    coordinate: GeoCoordinate,
    profiles: Arc<ContactProfiles>,
    members: Vec<(PersonId, bool)>,
    immune_boundary: usize,
}

impl Cluster {
    pub fn new(
        id: u32,
        cluster_type: ClusterType,
        coordinate: GeoCoordinate,
        profiles: Arc<ContactProfiles>,
    ) -> Cluster {
        Cluster {
            id,
            cluster_type,
            coordinate,
            profiles,
            members: Vec::new(),
            immune_boundary: 0,
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn cluster_type(&self) -> ClusterType {
        self.cluster_type
    }

    pub fn coordinate(&self) -> GeoCoordinate {
        self.coordinate
    }

    pub fn size(&self) -> usize {
        self.members.len()
    }

    pub fn members(&self) -> &[(PersonId, bool)] {
        &self.members
    }

    /// Replaces the member sequence, e.g. when restoring a checkpoint. The health partition
    /// is rebuilt by the next call to [`Cluster::sort_by_health()`].
    pub fn set_members(&mut self, members: Vec<(PersonId, bool)>) {
        self.immune_boundary = members.len();
        self.members = members;
    }

    pub fn immune_boundary(&self) -> usize {
        self.immune_boundary
    }

    /// Adds a present member in front of the immune region. Until the next
    /// [`Cluster::sort_by_health()`] the member is counted as non-immune.
    pub fn add_member(&mut self, person_id: PersonId) {
        self.members.push((person_id, true));
        let last = self.members.len() - 1;
        self.members.swap(self.immune_boundary, last);
        self.immune_boundary += 1;
    }

    /// Removes a member in O(1) after a linear search. Does nothing if the person is not a
    /// member.
    pub fn remove_member(&mut self, person_id: PersonId) {
        let Some(mut position) = self.members.iter().position(|(id, _)| *id == person_id) else {
            return;
        };
        if position < self.immune_boundary {
            // Shrink the non-immune region so the immune tail stays contiguous.
            self.immune_boundary -= 1;
            self.members.swap(position, self.immune_boundary);
            position = self.immune_boundary;
        }
        self.members.swap_remove(position);
        trace!(
            "removed {person_id:?} from {} cluster {}",
            self.cluster_type,
            self.id
        );
    }

    /// Contacts per day for `person` with any one other member. Panics on an empty cluster,
    /// where nobody can be contacted.
    pub fn contact_rate(&self, person: &Person) -> f64 {
        assert!(
            !self.members.is_empty(),
            "contact rate requested for empty {} cluster {}",
            self.cluster_type,
            self.id
        );
        self.profiles.rate(self.cluster_type, person.age()) / self.members.len() as f64
    }

    /// Partitions the members by health in one pass, in place. Returns whether any member of
    /// the cases region is infectious, and the size of that region.
    pub fn sort_by_health(&mut self, population: &Population) -> (bool, usize) {
        let mut infectious_cases = false;
        let mut num_cases = 0;
        let mut next = 0;
        let mut immune_boundary = self.members.len();

        while next < immune_boundary {
            let health = population.get(self.members[next].0).health();
            if health.is_immune() {
                immune_boundary -= 1;
                self.members.swap(next, immune_boundary);
            } else if health.is_susceptible() {
                next += 1;
            } else {
                infectious_cases |= health.is_infectious();
                self.members.swap(num_cases, next);
                num_cases += 1;
                next += 1;
            }
        }

        self.immune_boundary = immune_boundary;
        (infectious_cases, num_cases)
    }

    /// Records for every member whether they attend this cluster today.
    pub fn update_presence(&mut self, population: &Population) {
        let cluster_type = self.cluster_type;
        for (person_id, present) in &mut self.members {
            *present = population.get(*person_id).is_in_cluster(cluster_type);
        }
    }

    /// Members who are infected or have recovered.
    pub fn infected_count(&self, population: &Population) -> usize {
        self.members
            .iter()
            .filter(|(person_id, _)| {
                let health = population.get(*person_id).health();
                health.is_infected() || health.is_recovered()
            })
            .count()
    }

    pub fn active_member_count(&self, population: &Population) -> usize {
        self.members
            .iter()
            .filter(|(person_id, _)| !population.get(*person_id).is_on_leave())
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::{Health, HealthStatus};
    use assert_approx_eq::assert_approx_eq;

    fn profiles() -> Arc<ContactProfiles> {
        Arc::new(ContactProfiles::uniform(10.0).unwrap())
    }

    fn household() -> Cluster {
        Cluster::new(1, ClusterType::Household, GeoCoordinate::default(), profiles())
    }

    fn add(population: &mut Population, cluster: &mut Cluster, status: HealthStatus) -> PersonId {
        let person_id = population.add_person(30.0, [1, 0, 0, 0, 0], Health::new(1, 2, 3, 4));
        let health = population.get_mut(person_id).health_mut();
        match status {
            HealthStatus::Susceptible => {}
            HealthStatus::Immune => health.set_immune(),
            HealthStatus::Recovered => {
                health.start_infection();
                health.stop_infection();
            }
            HealthStatus::Exposed => health.start_infection(),
            HealthStatus::Infectious => {
                health.start_infection();
                health.update();
            }
            _ => panic!("unsupported status in test"),
        }
        cluster.add_member(person_id);
        person_id
    }

    fn assert_partitioned(cluster: &Cluster, population: &Population, num_cases: usize) {
        let boundary = cluster.immune_boundary();
        assert!(num_cases <= boundary && boundary <= cluster.size());
        for (index, (person_id, _)) in cluster.members().iter().enumerate() {
            let health = population.get(*person_id).health();
            if index < num_cases {
                assert!(!health.is_susceptible() && !health.is_immune());
            } else if index < boundary {
                assert!(health.is_susceptible());
            } else {
                assert!(health.is_immune());
            }
        }
    }

    #[test]
    fn partitions_any_order() {
        use HealthStatus::*;
        let mut population = Population::new();
        let mut cluster = household();
        for status in [
            Immune,
            Susceptible,
            Recovered,
            Immune,
            Infectious,
            Susceptible,
            Exposed,
            Immune,
            Susceptible,
        ] {
            add(&mut population, &mut cluster, status);
        }
        let (infectious, num_cases) = cluster.sort_by_health(&population);
        assert!(infectious);
        assert_eq!(num_cases, 3);
        assert_eq!(cluster.immune_boundary(), 6);
        assert_partitioned(&cluster, &population, num_cases);
    }

    #[test]
    fn cases_without_infectious_members() {
        let mut population = Population::new();
        let mut cluster = household();
        add(&mut population, &mut cluster, HealthStatus::Exposed);
        add(&mut population, &mut cluster, HealthStatus::Susceptible);
        let (infectious, num_cases) = cluster.sort_by_health(&population);
        assert!(!infectious);
        assert_eq!(num_cases, 1);
    }

    #[test]
    fn empty_cluster() {
        let population = Population::new();
        let mut cluster = household();
        assert_eq!(cluster.sort_by_health(&population), (false, 0));
        assert_eq!(cluster.immune_boundary(), 0);
    }

    #[test]
    fn all_immune_and_all_susceptible() {
        let mut population = Population::new();
        let mut immune = household();
        let mut susceptible = household();
        for _ in 0..4 {
            add(&mut population, &mut immune, HealthStatus::Immune);
            add(&mut population, &mut susceptible, HealthStatus::Susceptible);
        }
        assert_eq!(immune.sort_by_health(&population), (false, 0));
        assert_eq!(immune.immune_boundary(), 0);
        assert_eq!(susceptible.sort_by_health(&population), (false, 0));
        assert_eq!(susceptible.immune_boundary(), 4);
    }

    #[test]
    fn newly_immune_members_move_behind_boundary() {
        let mut population = Population::new();
        let mut cluster = household();
        let ids: Vec<_> = (0..4)
            .map(|_| add(&mut population, &mut cluster, HealthStatus::Susceptible))
            .collect();
        cluster.sort_by_health(&population);
        assert_eq!(cluster.immune_boundary(), 4);

        population.get_mut(ids[1]).health_mut().set_immune();
        let (_, num_cases) = cluster.sort_by_health(&population);
        assert_eq!(cluster.immune_boundary(), 3);
        assert_partitioned(&cluster, &population, num_cases);
    }

    #[test]
    fn added_member_stays_in_front_of_immune_region() {
        use HealthStatus::*;
        let mut population = Population::new();
        let mut cluster = household();
        for status in [Susceptible, Immune, Immune, Exposed] {
            add(&mut population, &mut cluster, status);
        }
        let (_, num_cases) = cluster.sort_by_health(&population);
        assert_eq!(cluster.immune_boundary(), 2);

        let newcomer = add(&mut population, &mut cluster, Susceptible);
        assert_eq!(cluster.size(), 5);
        assert_eq!(cluster.immune_boundary(), 3);
        assert_partitioned(&cluster, &population, num_cases);
        assert!(cluster.members()[..3].contains(&(newcomer, true)));
    }

    #[test]
    fn removal_keeps_immune_region_contiguous() {
        use HealthStatus::*;
        let mut population = Population::new();
        let mut cluster = household();
        let first = add(&mut population, &mut cluster, Susceptible);
        for status in [Exposed, Immune, Immune] {
            add(&mut population, &mut cluster, status);
        }
        cluster.sort_by_health(&population);
        cluster.remove_member(first);
        assert_eq!(cluster.size(), 3);
        assert_eq!(cluster.immune_boundary(), 1);
        assert_partitioned(&cluster, &population, 1);
    }

    #[test]
    fn remove_last_member() {
        let mut population = Population::new();
        let mut cluster = household();
        let person_id = add(&mut population, &mut cluster, HealthStatus::Susceptible);
        cluster.remove_member(person_id);
        assert_eq!(cluster.size(), 0);
        assert_eq!(cluster.immune_boundary(), 0);
    }

    #[test]
    fn remove_unknown_member_is_noop() {
        let mut population = Population::new();
        let mut cluster = household();
        add(&mut population, &mut cluster, HealthStatus::Susceptible);
        cluster.remove_member(PersonId::new(42));
        assert_eq!(cluster.size(), 1);
    }

    #[test]
    fn remove_keeps_other_members() {
        let mut population = Population::new();
        let mut cluster = household();
        let ids: Vec<_> = (0..3)
            .map(|_| add(&mut population, &mut cluster, HealthStatus::Susceptible))
            .collect();
        cluster.remove_member(ids[0]);
        let remaining: Vec<_> = cluster.members().iter().map(|(id, _)| *id).collect();
        assert_eq!(remaining.len(), 2);
        assert!(remaining.contains(&ids[1]) && remaining.contains(&ids[2]));
    }

    #[test]
    fn contact_rate_divides_by_size() {
        let mut population = Population::new();
        let mut cluster = household();
        let person_id = add(&mut population, &mut cluster, HealthStatus::Susceptible);
        add(&mut population, &mut cluster, HealthStatus::Susceptible);
        assert_approx_eq!(cluster.contact_rate(population.get(person_id)), 5.0);
    }

    #[test]
    #[should_panic(expected = "contact rate requested for empty")]
    fn contact_rate_of_empty_cluster_panics() {
        let mut population = Population::new();
        let person_id = population.add_person(30.0, [1, 0, 0, 0, 0], Health::new(1, 2, 3, 4));
        household().contact_rate(population.get(person_id));
    }

    #[test]
    fn presence_follows_people() {
        let mut population = Population::new();
        let mut cluster = household();
        let present = add(&mut population, &mut cluster, HealthStatus::Susceptible);
        let away = add(&mut population, &mut cluster, HealthStatus::Susceptible);
        population.set_on_leave(away, true);
        cluster.update_presence(&population);
        let presence: Vec<_> = cluster.members().to_vec();
        assert!(presence.contains(&(present, true)));
        assert!(presence.contains(&(away, false)));
        assert_eq!(cluster.active_member_count(&population), 1);
    }

    #[test]
    fn infected_count_includes_recovered() {
        let mut population = Population::new();
        let mut cluster = household();
        add(&mut population, &mut cluster, HealthStatus::Recovered);
        add(&mut population, &mut cluster, HealthStatus::Exposed);
        add(&mut population, &mut cluster, HealthStatus::Immune);
        add(&mut population, &mut cluster, HealthStatus::Susceptible);
        assert_eq!(cluster.infected_count(&population), 2);
    }
}
