//! Reads the people file: one row per person with their age and the id of the cluster they
//! belong to for every cluster type. An id of 0 means no membership of that type.
//!
//! ```text
//! age,household_id,school_id,work_id,primary_community,secondary_community,risk_averseness
//! 34,1,0,12,1,4,0.2
//! ```
//!
//! The `risk_averseness` column is optional.
use std::io::Read;
use std::path::Path;

use log::info;
use serde::Deserialize;
use strum::EnumCount;

use crate::cluster::ClusterType;
use crate::error::StrideError;

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct PersonRecord {
    pub age: f64,
    pub household_id: u32,
    pub school_id: u32,
    pub work_id: u32,
    pub primary_community: u32,
    pub secondary_community: u32,
    #[serde(default)]
    pub risk_averseness: f64,
}

impl PersonRecord {
    /// Cluster ids in the order of [`ClusterType::ALL`].
    pub fn cluster_ids(&self) -> [u32; ClusterType::COUNT] {
        [
            self.household_id,
            self.school_id,
            self.work_id,
            self.primary_community,
            self.secondary_community,
        ]
    }
}

pub fn read_people<R: Read>(reader: R) -> Result<Vec<PersonRecord>, StrideError> {
    let mut reader = csv::Reader::from_reader(reader);
    let mut people = Vec::new();
    for result in reader.deserialize() {
        let record: PersonRecord = result?;
        if !record.age.is_finite() || record.age < 0.0 {
            return Err(StrideError::PopulationError(format!(
                "invalid age {} on row {}",
                record.age,
                people.len() + 1
            )));
        }
        people.push(record);
    }
    Ok(people)
}

/// Cluster ids index dense per-type vectors, so no id may exceed the number of people.
pub fn check_cluster_ids(people: &[PersonRecord]) -> Result<(), StrideError> {
    let max_id = people.len();
    for (row, record) in people.iter().enumerate() {
        for (cluster_type, cluster_id) in ClusterType::ALL.into_iter().zip(record.cluster_ids()) {
            if cluster_id as usize > max_id {
                return Err(StrideError::PopulationError(format!(
                    "{cluster_type} id {cluster_id} on row {} exceeds the population size {max_id}",
                    row + 1
                )));
            }
        }
    }
    Ok(())
}

pub fn load_people(path: &Path) -> Result<Vec<PersonRecord>, StrideError> {
    let file = std::fs::File::open(path).map_err(|error| {
        StrideError::PopulationError(format!(
            "could not open people file {}: {error}",
            path.display()
        ))
    })?;
    let people = read_people(file)?;
    info!("loaded {} people from {}", people.len(), path.display());
    Ok(people)
}
