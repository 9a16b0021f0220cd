//! Run configuration, read from a JSON file.
//!
//! ```json
//! {
//!   "rng_seed": 1,
//!   "num_days": 30,
//!   "num_workers": 4,
//!   "r0": 11.0,
//!   "seeding_rate": 0.002,
//!   "immunity_rate": 0.8,
//!   "log_mode": "Transmissions",
//!   "start_date": "2017-01-01",
//!   "holidays": ["2017-04-17"],
//!   "population_file": "people.csv",
//!   "disease": {
//!     "b0": 0.0, "b1": 50.0,
//!     "start_infectiousness": [0.0, 0.5, 1.0],
//!     "start_symptomatic": [0.0, 0.2, 1.0],
//!     "time_infectious": [0.0, 0.0, 0.6, 1.0],
//!     "time_symptomatic": [0.0, 0.0, 0.3, 1.0]
//!   },
//!   "contact_matrix": {
//!     "Household": [3.0],
//!     "School": [10.0, 12.0, 15.0]
//!   }
//! }
//! ```
//!
//! A relative `population_file` is resolved against the directory of the configuration file.
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use log::{debug, info};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::calendar::DaysOff;
use crate::cluster::{ClusterType, ContactProfile, ContactProfiles};
use crate::disease::{DiseaseDurations, DiseaseProfile};
use crate::error::StrideError;
use crate::infector::{InfectorPolicy, InformationPolicy, LogMode};
use crate::people::{BehaviourPolicy, BeliefPolicy};

fn default_num_workers() -> usize {
    1
}

fn default_start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2017, 1, 1).unwrap_or_default()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiseaseConfig {
    /// Intercept of the linear relation between R0 and the transmission rate
    pub b0: f64,
    /// Slope of the linear relation between R0 and the transmission rate
    pub b1: f64,
    #[serde(flatten)]
    pub durations: DiseaseDurations,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SimulationConfig {
    pub rng_seed: u64,
    pub num_days: u32,
    #[serde(default = "default_num_workers")]
    pub num_workers: usize,
    pub r0: f64,
    pub seeding_rate: f64,
    pub immunity_rate: f64,
    #[serde(default)]
    pub log_mode: LogMode,
    #[serde(default)]
    pub track_index_case: bool,
    #[serde(default)]
    pub information_policy: InformationPolicy,
    #[serde(default)]
    pub belief_policy: BeliefPolicy,
    #[serde(default)]
    pub behaviour_policy: BehaviourPolicy,
    #[serde(default)]
    pub days_off: DaysOff,
    #[serde(default = "default_start_date")]
    pub start_date: NaiveDate,
    #[serde(default)]
    pub holidays: Vec<NaiveDate>,
    #[serde(default)]
    pub school_holidays: Vec<NaiveDate>,
    #[serde(default)]
    pub num_participants_survey: usize,
    #[serde(default)]
    pub population_file: Option<PathBuf>,
    pub disease: DiseaseConfig,
    /// Mean contacts per day by cluster type and age. Types that are left out have no
    /// contacts.
    #[serde(default)]
    pub contact_matrix: FxHashMap<ClusterType, Vec<f64>>,
}

impl SimulationConfig {
    pub fn from_json(json: &str) -> Result<SimulationConfig, StrideError> {
        let config: SimulationConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<SimulationConfig, StrideError> {
        info!("Loading configuration from {}", path.display());
        let json = std::fs::read_to_string(path).map_err(|error| {
            StrideError::ConfigError(format!(
                "could not read configuration {}: {error}",
                path.display()
            ))
        })?;
        let mut config = SimulationConfig::from_json(&json)?;
        if let (Some(population_file), Some(dir)) = (&config.population_file, path.parent()) {
            if population_file.is_relative() {
                config.population_file = Some(dir.join(population_file));
            }
        }
        debug!("{config:?}");
        Ok(config)
    }

    /// Checks everything that can be checked without reading the population.
    pub fn validate(&self) -> Result<(), StrideError> {
        if self.num_workers == 0 {
            return Err(StrideError::ConfigError(
                "num_workers must be at least 1".to_string(),
            ));
        }
        for (name, rate) in [
            ("seeding_rate", self.seeding_rate),
            ("immunity_rate", self.immunity_rate),
        ] {
            if !(0.0..=1.0).contains(&rate) {
                return Err(StrideError::ConfigError(format!(
                    "{name} must be within [0, 1], got {rate}"
                )));
            }
        }
        if self.seeding_rate + self.immunity_rate > 1.0 {
            return Err(StrideError::ConfigError(format!(
                "seeding_rate + immunity_rate must not exceed 1, got {}",
                self.seeding_rate + self.immunity_rate
            )));
        }
        if self.log_mode == LogMode::Contacts && self.num_participants_survey == 0 {
            return Err(StrideError::ConfigError(
                "log_mode Contacts requires num_participants_survey > 0".to_string(),
            ));
        }
        self.disease_profile()?;
        self.contact_profiles()?;
        Ok(())
    }

    pub fn disease_profile(&self) -> Result<DiseaseProfile, StrideError> {
        DiseaseProfile::from_r0(self.r0, self.disease.b0, self.disease.b1)
    }

    pub fn contact_profiles(&self) -> Result<ContactProfiles, StrideError> {
        let mut profiles = FxHashMap::default();
        for (cluster_type, rates) in &self.contact_matrix {
            profiles.insert(*cluster_type, ContactProfile::new(rates.clone())?);
        }
        Ok(ContactProfiles::new(profiles))
    }

    pub fn infector_policy(&self) -> InfectorPolicy {
        InfectorPolicy {
            log_mode: self.log_mode,
            track_index_case: self.track_index_case,
            information_policy: self.information_policy,
        }
    }
}
