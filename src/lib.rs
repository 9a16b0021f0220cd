//! An individual-based simulator for the spread of infectious diseases
//!
//! Stride models a population of individuals who meet each other in social contact
//! clusters: households, schools, workplaces and two kinds of communities. Each simulated
//! day every person's disease advances by one day, and then every cluster runs one round of
//! contacts during which infectious members may infect susceptible ones.
//!
//! The main pieces are:
//! * [`health::Health`], the disease state machine of a single person.
//! * [`cluster::Cluster`], a group of people with a contact profile that is partitioned by
//!   health before each contact round.
//! * [`infector::Infector`], the contact engine. It evaluates one cluster and returns the
//!   resulting changes as a [`infector::ClusterOutcome`].
//! * [`scheduler::Scheduler`], which runs a round over all clusters of one type on a pool of
//!   workers, each with its own [`random::RandomStream`].
//! * [`simulator::Simulator`], the day loop, assembled from a
//!   [`config::SimulationConfig`] by a [`builder::SimulatorBuilder`].
//!
//! For a fixed seed and worker count every run produces identical results.
//!
//! A simulation is normally started from the command line with the `stride` binary, see
//! [`runner`].
pub mod builder;
pub mod calendar;
pub mod cluster;
pub mod config;
pub mod disease;
pub mod error;
pub mod execution_stats;
pub mod health;
pub mod infector;
pub mod log;
pub mod people;
pub mod population_loader;
pub mod prelude;
#[cfg(feature = "progress_bar")]
pub mod progress;
pub mod random;
pub mod report;
pub mod runner;
pub mod scheduler;
pub mod simulator;

pub use builder::SimulatorBuilder;
pub use config::SimulationConfig;
pub use error::StrideError;
pub use simulator::Simulator;

// Re-exports used by code built on top of the simulator.
pub use {chrono, csv, rand, serde_json};
