//! Disease parameters shared by every contact round, and the distributions the disease
//! timers of each individual are drawn from.
use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::StrideError;
use crate::health::Health;
use crate::random::{ContactDraws, RandomStream};

/// Read-only disease characteristics used by the contact engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiseaseProfile {
    transmission_rate: f64,
}

impl DiseaseProfile {
    pub fn new(transmission_rate: f64) -> Result<DiseaseProfile, StrideError> {
        if !transmission_rate.is_finite() || transmission_rate < 0.0 {
            return Err(StrideError::ConfigError(format!(
                "transmission rate must be finite and non-negative, got {transmission_rate}"
            )));
        }
        Ok(DiseaseProfile { transmission_rate })
    }

    /// Derives the transmission rate from the basic reproduction number through the linear
    /// relation `r0 = b0 + b1 * transmission_rate` fitted for the disease.
    pub fn from_r0(r0: f64, b0: f64, b1: f64) -> Result<DiseaseProfile, StrideError> {
        if b1 == 0.0 {
            return Err(StrideError::ConfigError(
                "disease coefficient b1 must not be zero".to_string(),
            ));
        }
        let transmission_rate = (r0 - b0) / b1;
        debug!("transmission rate {transmission_rate} for r0 {r0}");
        DiseaseProfile::new(transmission_rate)
    }

    pub fn transmission_rate(&self) -> f64 {
        self.transmission_rate
    }
}

/// A cumulative distribution over a number of days: entry `i` is the probability that the
/// duration is at most `i` days.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
pub struct DurationDistribution {
    cumulative: Vec<f64>,
}

impl DurationDistribution {
    pub fn new(cumulative: Vec<f64>) -> Result<DurationDistribution, StrideError> {
        if cumulative.is_empty() {
            return Err(StrideError::ConfigError(
                "duration distribution is empty".to_string(),
            ));
        }
        let mut previous = 0.0;
        for (day, &value) in cumulative.iter().enumerate() {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(StrideError::ConfigError(format!(
                    "duration distribution value {value} on day {day} is not a probability"
                )));
            }
            if value < previous {
                return Err(StrideError::ConfigError(format!(
                    "duration distribution decreases on day {day}"
                )));
            }
            previous = value;
        }
        Ok(DurationDistribution { cumulative })
    }

    /// The first day whose cumulative probability reaches `draw`, or the length of the
    /// distribution if none does.
    pub fn sample(&self, draw: f64) -> u32 {
        let day = self
            .cumulative
            .iter()
            .position(|&value| draw <= value)
            .unwrap_or(self.cumulative.len());
        u32::try_from(day).unwrap_or(u32::MAX)
    }
}

impl TryFrom<Vec<f64>> for DurationDistribution {
    type Error = StrideError;

    fn try_from(cumulative: Vec<f64>) -> Result<Self, Self::Error> {
        DurationDistribution::new(cumulative)
    }
}

impl From<DurationDistribution> for Vec<f64> {
    fn from(distribution: DurationDistribution) -> Self {
        distribution.cumulative
    }
}

/// The four timers of a disease, as configured.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiseaseDurations {
    pub start_infectiousness: DurationDistribution,
    pub start_symptomatic: DurationDistribution,
    pub time_infectious: DurationDistribution,
    pub time_symptomatic: DurationDistribution,
}

impl DiseaseDurations {
    /// Draws the timers of one individual, in a fixed order.
    pub fn sample_health(&self, rng: &mut RandomStream) -> Health {
        let start_infectiousness = self.start_infectiousness.sample(rng.next_double());
        let start_symptomatic = self.start_symptomatic.sample(rng.next_double());
        let time_infectious = self.time_infectious.sample(rng.next_double());
        let time_symptomatic = self.time_symptomatic.sample(rng.next_double());
        Health::new(
            start_infectiousness,
            start_symptomatic,
            time_infectious,
            time_symptomatic,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn transmission_rate_from_r0() {
        let profile = DiseaseProfile::from_r0(11.0, 1.0, 50.0).unwrap();
        assert_approx_eq!(profile.transmission_rate(), 0.2);
    }

    #[test]
    fn invalid_disease_coefficients() {
        assert!(DiseaseProfile::from_r0(2.0, 1.0, 0.0).is_err());
        assert!(DiseaseProfile::from_r0(0.5, 1.0, 2.0).is_err());
    }

    #[test]
    fn sample_picks_first_reached_day() {
        let distribution = DurationDistribution::new(vec![0.0, 0.25, 0.75, 1.0]).unwrap();
        assert_eq!(distribution.sample(0.0), 0);
        assert_eq!(distribution.sample(0.1), 1);
        assert_eq!(distribution.sample(0.25), 1);
        assert_eq!(distribution.sample(0.5), 2);
        assert_eq!(distribution.sample(0.99), 3);
    }

    #[test]
    fn sample_past_the_end_returns_length() {
        let distribution = DurationDistribution::new(vec![0.2, 0.5]).unwrap();
        assert_eq!(distribution.sample(0.9), 2);
    }

    #[test]
    fn malformed_distributions_are_rejected() {
        assert!(DurationDistribution::new(vec![]).is_err());
        assert!(DurationDistribution::new(vec![0.5, 0.2]).is_err());
        assert!(DurationDistribution::new(vec![0.5, 1.5]).is_err());
        assert!(DurationDistribution::new(vec![-0.1, 1.0]).is_err());
        assert!(DurationDistribution::new(vec![f64::NAN]).is_err());
    }

    #[test]
    fn distributions_deserialize_with_validation() {
        let ok: DurationDistribution = serde_json::from_str("[0.0, 0.5, 1.0]").unwrap();
        assert_eq!(ok.sample(0.4), 1);
        assert!(serde_json::from_str::<DurationDistribution>("[0.5, 0.1]").is_err());
    }

    #[test]
    fn sampled_health_uses_all_four_distributions() {
        let certain = |day: usize| {
            let mut cumulative = vec![0.0; day];
            cumulative.push(1.0);
            DurationDistribution::new(cumulative).unwrap()
        };
        let durations = DiseaseDurations {
            start_infectiousness: certain(2),
            start_symptomatic: certain(3),
            time_infectious: certain(4),
            time_symptomatic: certain(5),
        };
        let mut rng = RandomStream::new(1, 1, 0);
        let health = durations.sample_health(&mut rng);
        assert_eq!(health.start_infectiousness(), 2);
        assert_eq!(health.start_symptomatic(), 3);
        assert_eq!(health.end_infectiousness(), 6);
        assert_eq!(health.end_symptomatic(), 8);
    }
}
