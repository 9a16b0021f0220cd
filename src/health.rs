//! Disease progression of a single individual.
//!
//! A [`Health`] value starts out `Susceptible`. Once infected it is advanced one day at a
//! time with [`Health::update()`], which walks it through the exposed, infectious and
//! symptomatic stages according to four threshold days drawn when the population is built:
//!
//! ```text
//! Susceptible → Exposed → {Infectious | Symptomatic | InfectiousAndSymptomatic} → Recovered
//! ```
//!
//! Any state can be forced to `Immune` with [`Health::set_immune()`]. `Immune` is terminal.
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
pub enum HealthStatus {
    Susceptible,
    Exposed,
    Infectious,
    Symptomatic,
    InfectiousAndSymptomatic,
    Recovered,
    Immune,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Health {
    status: HealthStatus,
    disease_counter: u32,
    /// Days after infection to become infectious.
    start_infectiousness: u32,
    /// Days after infection to end the infectious state.
    end_infectiousness: u32,
    /// Days after infection to become symptomatic.
    start_symptomatic: u32,
    /// Days after infection to end the symptomatic state.
    end_symptomatic: u32,
}

impl Health {
    pub fn new(
        start_infectiousness: u32,
        start_symptomatic: u32,
        time_infectious: u32,
        time_symptomatic: u32,
    ) -> Health {
        Health {
            status: HealthStatus::Susceptible,
            disease_counter: 0,
            start_infectiousness,
            end_infectiousness: start_infectiousness + time_infectious,
            start_symptomatic,
            end_symptomatic: start_symptomatic + time_symptomatic,
        }
    }

    pub fn status(&self) -> HealthStatus {
        self.status
    }

    pub fn disease_counter(&self) -> u32 {
        self.disease_counter
    }

    pub fn start_infectiousness(&self) -> u32 {
        self.start_infectiousness
    }

    pub fn end_infectiousness(&self) -> u32 {
        self.end_infectiousness
    }

    pub fn start_symptomatic(&self) -> u32 {
        self.start_symptomatic
    }

    pub fn end_symptomatic(&self) -> u32 {
        self.end_symptomatic
    }

    pub fn is_susceptible(&self) -> bool {
        self.status == HealthStatus::Susceptible
    }

    pub fn is_exposed(&self) -> bool {
        self.status == HealthStatus::Exposed
    }

    pub fn is_infected(&self) -> bool {
        matches!(
            self.status,
            HealthStatus::Exposed
                | HealthStatus::Infectious
                | HealthStatus::Symptomatic
                | HealthStatus::InfectiousAndSymptomatic
        )
    }

    pub fn is_infectious(&self) -> bool {
        matches!(
            self.status,
            HealthStatus::Infectious | HealthStatus::InfectiousAndSymptomatic
        )
    }

    pub fn is_symptomatic(&self) -> bool {
        matches!(
            self.status,
            HealthStatus::Symptomatic | HealthStatus::InfectiousAndSymptomatic
        )
    }

    pub fn is_recovered(&self) -> bool {
        self.status == HealthStatus::Recovered
    }

    pub fn is_immune(&self) -> bool {
        self.status == HealthStatus::Immune
    }

    /// Forces the individual to `Immune` and clears all timers.
    pub fn set_immune(&mut self) {
        self.status = HealthStatus::Immune;
        self.start_infectiousness = 0;
        self.end_infectiousness = 0;
        self.start_symptomatic = 0;
        self.end_symptomatic = 0;
    }

    /// Starts an infection. Panics unless the individual is susceptible.
    pub fn start_infection(&mut self) {
        assert!(
            self.is_susceptible(),
            "start_infection requires a susceptible individual, found {}",
            self.status
        );
        self.status = HealthStatus::Exposed;
        self.disease_counter = 0;
    }

    /// Ends an infection. Panics unless the individual is infected.
    pub fn stop_infection(&mut self) {
        assert!(
            self.is_infected(),
            "stop_infection requires an infected individual, found {}",
            self.status
        );
        self.status = HealthStatus::Recovered;
    }

    /// Advances the disease by one day. At most one transition happens per call; when
    /// thresholds coincide the earliest-listed one wins.
    pub fn update(&mut self) {
        if !self.is_infected() {
            return;
        }

        self.disease_counter += 1;
        let counter = self.disease_counter;

        if counter == self.start_infectiousness {
            self.status = if self.status == HealthStatus::Symptomatic {
                HealthStatus::InfectiousAndSymptomatic
            } else {
                HealthStatus::Infectious
            };
        } else if counter == self.end_infectiousness {
            if self.status == HealthStatus::InfectiousAndSymptomatic {
                self.status = HealthStatus::Symptomatic;
            } else {
                self.stop_infection();
            }
        } else if counter == self.start_symptomatic {
            self.status = if self.status == HealthStatus::Infectious {
                HealthStatus::InfectiousAndSymptomatic
            } else {
                HealthStatus::Symptomatic
            };
        } else if counter == self.end_symptomatic {
            if self.status == HealthStatus::InfectiousAndSymptomatic {
                self.status = HealthStatus::Infectious;
            } else {
                self.stop_infection();
            }
        }
    }
}
