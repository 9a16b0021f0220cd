//! Mean number of contacts per day, by cluster type and age.
//!
//! The table is built once before the simulation starts and shared read-only by every
//! cluster through an `Arc`.
use log::trace;
use rustc_hash::FxHashMap;
use strum::EnumCount;

use crate::cluster::ClusterType;
use crate::error::StrideError;

/// Ages above this value share the contact rate of this age.
pub const MAXIMUM_AGE: usize = 80;

/// Maps an age in years onto a row of a contact profile.
#[inline]
pub fn effective_age(age: f64) -> usize {
    if age <= 0.0 || age.is_nan() {
        0
    } else {
        (age.floor() as usize).min(MAXIMUM_AGE)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ContactProfile {
    rates: Vec<f64>,
}

impl ContactProfile {
    /// Builds a profile from rates indexed by age. Ages past the end of `rates` use the
    /// last value, so a single entry gives an age-independent profile.
    pub fn new(rates: Vec<f64>) -> Result<ContactProfile, StrideError> {
        if rates.len() > MAXIMUM_AGE + 1 {
            return Err(StrideError::ConfigError(format!(
                "contact profile has {} ages, at most {} are supported",
                rates.len(),
                MAXIMUM_AGE + 1
            )));
        }
        if let Some(bad) = rates.iter().find(|r| !r.is_finite() || **r < 0.0) {
            return Err(StrideError::ConfigError(format!(
                "contact rates must be finite and non-negative, found {bad}"
            )));
        }
        Ok(ContactProfile { rates })
    }

    /// Mean number of contacts per day for someone of the given age.
    pub fn rate(&self, age: f64) -> f64 {
        match self.rates.len() {
            0 => 0.0,
            len => self.rates[effective_age(age).min(len - 1)],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ContactProfiles {
    profiles: [ContactProfile; ClusterType::COUNT],
}

impl ContactProfiles {
    /// Builds the table from per-type profiles. Cluster types without a profile have no
    /// contacts.
    pub fn new(mut profiles: FxHashMap<ClusterType, ContactProfile>) -> ContactProfiles {
        let profiles = ClusterType::ALL.map(|cluster_type| {
            let profile = profiles.remove(&cluster_type).unwrap_or_default();
            trace!(
                "contact profile for {} covers {} ages",
                cluster_type,
                profile.rates.len()
            );
            profile
        });
        ContactProfiles { profiles }
    }

    /// The same age-independent rate for every cluster type.
    pub fn uniform(rate: f64) -> Result<ContactProfiles, StrideError> {
        let mut profiles = FxHashMap::default();
        for cluster_type in ClusterType::ALL {
            profiles.insert(cluster_type, ContactProfile::new(vec![rate])?);
        }
        Ok(ContactProfiles::new(profiles))
    }

    pub fn get(&self, cluster_type: ClusterType) -> &ContactProfile {
        &self.profiles[cluster_type.index()]
    }

    pub fn rate(&self, cluster_type: ClusterType, age: f64) -> f64 {
        self.get(cluster_type).rate(age)
    }
}
